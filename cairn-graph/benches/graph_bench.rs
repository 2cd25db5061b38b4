//! Benchmarks for knowledge graph
//!
//! Deferred to Phase 13.13 (Performance Optimization) when full
//! memory+consolidation+context system exists for comprehensive benchmarking.

use criterion::{criterion_group, criterion_main, Criterion};

#[allow(clippy::missing_const_for_fn)] // Criterion requires specific signature
fn graph_benchmark(_c: &mut Criterion) {
    // Benchmarks deferred to Phase 13.13 (Task 13.2.3)
    // Will include: entity CRUD, relationship traversal, temporal queries, indexing
}

criterion_group!(benches, graph_benchmark);
criterion_main!(benches);
