//! Re-rank benchmarks
//!
//! Comparison building, CSV export and client-side sorting over result pages
//! of realistic size.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ragconsole::api::SearchResult;
use ragconsole::render::sort_results;
use ragconsole::rerank::RerankComparison;
use ragconsole::state::SortOption;

/// Synthetic result page; vector order is deliberately shuffled against final order
fn results(n: usize) -> Vec<SearchResult> {
    (0..n)
        .map(|i| {
            let final_score = 1.0 - i as f64 / n as f64;
            let mut result = SearchResult::new(format!("doc-{}", i), "def map(order)", final_score);
            result.title = Some(format!("Mapping \"{}\"", i));
            result.scores.vector = Some(((i * 7919) % n) as f64 / n as f64);
            if i % 3 == 0 {
                result.scores.cross_encoder = Some(final_score * 0.9);
            }
            result
        })
        .collect()
}

fn benchmark_comparison(c: &mut Criterion) {
    for n in [100, 1000] {
        let page = results(n);
        c.bench_function(&format!("rerank_comparison_{}", n), |b| {
            b.iter(|| RerankComparison::from_results(black_box(&page)));
        });
    }
}

fn benchmark_csv_export(c: &mut Criterion) {
    for n in [100, 1000] {
        let comparison = RerankComparison::from_results(&results(n));
        c.bench_function(&format!("rerank_csv_{}", n), |b| {
            b.iter(|| black_box(&comparison).to_csv());
        });
    }
}

fn benchmark_sort(c: &mut Criterion) {
    let page = results(1000);
    c.bench_function("sort_by_cross_encoder_1000", |b| {
        b.iter(|| sort_results(black_box(&page), SortOption::CrossEncoderScoreDesc));
    });
}

criterion_group!(
    benches,
    benchmark_comparison,
    benchmark_csv_export,
    benchmark_sort
);
criterion_main!(benches);
