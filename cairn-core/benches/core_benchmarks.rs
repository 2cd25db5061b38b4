//! Benchmarks for the pure-function primitives shared by the ranking
//! pipeline: cosine similarity (vector signal, entity resolution) and RRF
//! contribution (fusion).

use cairn_core::types::{cosine_similarity, rrf_contribution};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_cosine_similarity(c: &mut Criterion) {
    let a: Vec<f32> = (0..768).map(|i| (i as f32).sin()).collect();
    let b: Vec<f32> = (0..768).map(|i| (i as f32).cos()).collect();
    c.bench_function("cosine_similarity_768", |bencher| {
        bencher.iter(|| cosine_similarity(black_box(&a), black_box(&b)));
    });
}

fn bench_rrf_fusion(c: &mut Criterion) {
    c.bench_function("rrf_contribution_200_ranks", |bencher| {
        bencher.iter(|| {
            let mut total = 0.0_f64;
            for rank in 1..=200 {
                total += rrf_contribution(60.0, Some(rank), 0.60);
            }
            black_box(total)
        });
    });
}

criterion_group!(benches, bench_cosine_similarity, bench_rrf_fusion);
criterion_main!(benches);
