use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use fake::Fake;
use fake::faker::lorem::en::Words;
use search_crypto::keypair::keys::{PrivateKey, PublicKey};
use search_crypto::search::{EncryptedSearchPrivateKey, HashAlgorithm, SearchParams};

fn setup(digest_bits: usize) -> (SearchParams, PrivateKey, PublicKey, EncryptedSearchPrivateKey) {
    let mut rng = rand::rng();
    let params =
        SearchParams::with_hash(HashAlgorithm::Blake3, digest_bits).expect("Failed to build SearchParams");
    let keypair = PrivateKey::try_with(&params, &mut rng).expect("Failed to create keypair");
    let public_key = keypair.public_key();
    let search_key =
        EncryptedSearchPrivateKey::generate(params, &mut rng).expect("Failed to create search key");
    (params, keypair, public_key, search_key)
}

fn make_terms(count: usize) -> Vec<String> {
    (0..count)
        .map(|_| {
            let words: Vec<String> = Words(1..3).fake();
            words.join(" ")
        })
        .collect()
}

fn bench_sizes(c: &mut Criterion) {
    // 16, 36 and 64 bit search hashes
    let sizes: [(usize, &str); 3] = [(32, "4x4"), (72, "6x6"), (128, "8x8")];
    let terms = make_terms(32);

    let mut group = c.benchmark_group("Search sizes");
    group.sample_size(10);

    for (digest_bits, label) in sizes {
        let (params, keypair, public_key, search_key) = setup(digest_bits);
        let mut rng = rand::rng();
        let global_hash = params.random_global_hash(&mut rng);

        group.bench_with_input(BenchmarkId::new("token", label), &terms, |b, terms| {
            b.iter(|| {
                for term in terms {
                    let _t = search_key
                        .prepare_search_token(black_box(&public_key), term, &mut rng)
                        .expect("token");
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("hasher_pair", label), &global_hash, |b, gh| {
            b.iter(|| {
                let _p = search_key
                    .query_hasher_pair(black_box(gh), &keypair)
                    .expect("hasher pair");
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sizes);
criterion_main!(benches);
