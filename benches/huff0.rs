use criterion::{criterion_group, criterion_main, Criterion};
use fse_rs::huff0::{build_ctable, build_dtable, decode, default_max_nb_bits, encode};

fn criterion_benchmark(c: &mut Criterion) {
    let src = (0..40000).map(|_| rand::random::<u8>() % 16).collect::<Vec<u8>>();
    let mut hist = vec![0usize; 256];
    for &b in &src {
        hist[b as usize] += 1;
    }
    let ct = build_ctable(&hist, default_max_nb_bits()).unwrap();
    let dt = build_dtable(&ct.tree);

    c.bench_function("huff0 encode", |b| b.iter(|| encode(&src, &ct).unwrap()));

    let encoded = encode(&src, &ct).unwrap();
    c.bench_function("huff0 decode", |b| b.iter(|| decode(&encoded, &dt, src.len()).unwrap()));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
