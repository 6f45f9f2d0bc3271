use criterion::{criterion_group, criterion_main, Criterion};
use fse_rs::count;

fn criterion_benchmark(c: &mut Criterion) {
    let src = (0..40000).map(|_| rand::random::<u8>()).collect::<Vec<u8>>();

    c.bench_function("count_safe", |b| b.iter(|| count::count_safe(&src, 255).unwrap()));
    c.bench_function("count_fast", |b| b.iter(|| count::count_fast(&src, 255)));

    #[cfg(feature = "rayon")]
    c.bench_function("count_parallel", |b| {
        b.iter(|| count::count_parallel(&src, 255).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
