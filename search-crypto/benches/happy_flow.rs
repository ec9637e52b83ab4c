use criterion::{Criterion, black_box, criterion_group, criterion_main};
use search_crypto::gf2::BitVector;
use search_crypto::keypair::keys::PrivateKey;
use search_crypto::search::{
    EncryptedSearchBridgeKey, EncryptedSearchPrivateKey, EncryptedSearchSharingKey, SearchParams,
};

fn bench_happy_flow(c: &mut Criterion) {
    // one-time setup
    let mut rng = rand::rng();
    let params = SearchParams::default();
    let keypair = PrivateKey::try_with(&params, &mut rng).expect("make keypair");
    let public_key = keypair.public_key();
    let search_key = EncryptedSearchPrivateKey::generate(params, &mut rng).expect("make search key");
    let global_hash = params.random_global_hash(&mut rng);
    let pair = search_key
        .query_hasher_pair(&global_hash, &keypair)
        .expect("build hasher pair");
    let sharing_key = EncryptedSearchSharingKey::new(
        search_key.new_document_key(&mut rng).expect("document key"),
    )
    .expect("sharing key");
    let bridge_key = EncryptedSearchBridgeKey::new(&search_key, &sharing_key).expect("bridge key");

    let nonce = BitVector::random(params.search_hash_bits(), &mut rng);
    let nonce_token = public_key.encrypt(&nonce, &mut rng).expect("encrypt nonce");
    let indexed = global_hash
        .apply_halves(&search_key.hash("barbarian").expect("hash"), &nonce)
        .expect("global hash");
    let index_value = sharing_key.index_value(&indexed).expect("index value");

    c.bench_function("happy_flow", |b| {
        b.iter(|| {
            let token = search_key
                .prepare_search_token(&public_key, "barbarian", &mut rng)
                .expect("token");
            let (left, right) = pair.evaluate(&token, &nonce_token).expect("evaluate");
            black_box(bridge_key.matches(&left, &right, &index_value).expect("match"));
        })
    });

    c.bench_function("query_hasher_pair", |b| {
        b.iter(|| {
            black_box(
                search_key
                    .query_hasher_pair(black_box(&global_hash), &keypair)
                    .expect("build hasher pair"),
            );
        })
    });
}

criterion_group!(benches, bench_happy_flow);
criterion_main!(benches);
