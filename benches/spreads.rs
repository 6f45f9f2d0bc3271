use criterion::{criterion_group, criterion_main, Criterion};
use fse_rs::spreads::spread;

fn criterion_benchmark(c: &mut Criterion) {
    let norm = vec![5i32, 5, 3, 3];
    c.bench_function("spread", |b| b.iter(|| spread(&norm, 4).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
