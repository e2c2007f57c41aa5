use criterion::{black_box, criterion_group, criterion_main, Criterion};
use vitatrack::services::tokens::{TokenIssuer, TokenKind, ACCESS_TOKEN_TTL_SECS};

fn benchmark_token_issuer(c: &mut Criterion) {
    let issuer = TokenIssuer::new(b"bench-signing-key-32-bytes-long!");
    let token = issuer
        .issue(TokenKind::Access, "01JBENCHUSER0000000000000", ACCESS_TOKEN_TTL_SECS)
        .expect("issue token");

    let mut group = c.benchmark_group("token_issuer");

    group.bench_function("issue_access_token", |b| {
        b.iter(|| {
            issuer
                .issue(
                    black_box(TokenKind::Access),
                    black_box("01JBENCHUSER0000000000000"),
                    black_box(ACCESS_TOKEN_TTL_SECS),
                )
                .unwrap()
        })
    });

    group.bench_function("verify_access_token", |b| {
        b.iter(|| issuer.verify(black_box(&token)).unwrap())
    });

    group.finish();
}

fn benchmark_password_hashing(c: &mut Criterion) {
    // Cost 10 is the production setting; this tracks how long a login's
    // verify step occupies a blocking-pool thread.
    let hash = bcrypt::hash("correct horse battery staple", 10).expect("hash");

    let mut group = c.benchmark_group("bcrypt");
    group.sample_size(10);

    group.bench_function("verify_cost_10", |b| {
        b.iter(|| bcrypt::verify(black_box("correct horse battery staple"), &hash).unwrap())
    });

    group.finish();
}

criterion_group!(benches, benchmark_token_issuer, benchmark_password_hashing);
criterion_main!(benches);
