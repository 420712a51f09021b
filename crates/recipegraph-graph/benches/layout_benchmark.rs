use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use recipegraph_graph::{ForceLayout, LayoutParams};

fn chain_edges(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|i| (i - 1, i)).collect()
}

fn bench_force_layout(c: &mut Criterion) {
    let layout = ForceLayout::new(LayoutParams::default());
    let mut group = c.benchmark_group("force_layout");

    for &nodes in &[10usize, 50, 200] {
        let edges = chain_edges(nodes);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, &n| {
            b.iter(|| layout.compute(black_box(n), black_box(&edges)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_force_layout);
criterion_main!(benches);
