use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use search_crypto::errors::SearchCryptoError;
use search_crypto::gf2::{BitMatrix, BitVector};
use search_crypto::keypair::keys::PrivateKey;
use search_crypto::search::{
    EncryptedSearchBridgeKey, EncryptedSearchPrivateKey, EncryptedSearchSharingKey, SearchParams,
};

use std::sync::Once;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap();
        let fmt_layer = fmt::layer()
            .with_target(true)
            .with_line_number(false)
            .with_file(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    });
}

#[test]
fn showcase_query_hasher_and_bridge() -> Result<(), SearchCryptoError> {
    init_tracing();

    let mut rng = ChaCha20Rng::seed_from_u64(128);
    let params = SearchParams::default();
    let keypair = PrivateKey::generate(128, 64, &mut rng)?;
    let public_key = keypair.public_key();
    let search_key = EncryptedSearchPrivateKey::generate(params, &mut rng)?;
    let global_hash = params.random_global_hash(&mut rng);

    let pair = search_key.query_hasher_pair(&global_hash, &keypair)?;
    info!(
        left_monomials = pair.left.terms().monomial_count(),
        input_length = pair.left.input_length(),
        "query hasher pair ready"
    );

    let hash = search_key.hash("barbarian")?;
    let nonce = BitVector::random(64, &mut rng);
    let token = search_key.prepare_search_token(&public_key, "barbarian", &mut rng)?;
    let nonce_token = public_key.encrypt(&nonce, &mut rng)?;

    let (left, right) = pair.evaluate(&token, &nonce_token)?;
    let h = BitMatrix::square_from_vector(&global_hash.apply_halves(&hash, &nonce)?)?;

    // The key owner strips both squaring matrices.
    let squared = search_key.unblind(&left, &right)?;
    dbg!(&squared);
    assert_eq!(squared, h.multiply(&h)?);

    // A server holding only the bridge sees H · middle · H.
    let sharing_key = EncryptedSearchSharingKey::new(search_key.new_document_key(&mut rng)?)?;
    let bridge_key = EncryptedSearchBridgeKey::new(&search_key, &sharing_key)?;
    let expected = h.multiply(sharing_key.middle())?.multiply(&h)?;
    assert_eq!(bridge_key.evaluate(&left, &right)?, expected);
    assert_eq!(sharing_key.index_value(&h.to_vector())?, expected);

    Ok(())
}
