use criterion::{criterion_group, criterion_main, Criterion};
use fse_rs::count;
use fse_rs::normalization::normalize;

fn criterion_benchmark(c: &mut Criterion) {
    let src = vec![
        37, 65, 32, 65, 98, 100, 111, 117, 44, 32, 73, 46, 69, 46, 10, 37, 65, 32, 87, 111, 110,
        103, 44, 32, 75, 46, 89, 46, 10, 37, 68, 32, 49, 57, 56, 50, 10, 37, 84, 32, 65, 110, 97,
        108, 121, 115, 105, 115, 32, 111,
    ];
    let hist = count::count_safe(&src, 255).unwrap();

    c.bench_function("normalize table_log=8", |b| {
        b.iter(|| normalize(&hist.count, src.len(), 8).unwrap())
    });
    c.bench_function("normalize auto table_log", |b| {
        b.iter(|| normalize(&hist.count, src.len(), 0).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
