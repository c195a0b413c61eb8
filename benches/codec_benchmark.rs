use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lora_link::codec::{decode, encode, Mode};
use lora_link::sample::Sample;

fn sample() -> Sample {
    Sample::new(1_700_000_000.0, [0.01, -0.02, 1.0], [1.0, -1.0, 0.0], [0.0, 0.1, -0.1], 37.55, 127.01, 30.2)
}

fn bench_encode(c: &mut Criterion) {
    let s = sample();
    c.bench_function("encode raw", |b| b.iter(|| encode(black_box(&s), Mode::Raw).unwrap()));
    c.bench_function("encode zlib", |b| b.iter(|| encode(black_box(&s), Mode::Zlib).unwrap()));
}

fn bench_decode(c: &mut Criterion) {
    let s = sample();
    let raw = encode(&s, Mode::Raw).unwrap();
    let zlib = encode(&s, Mode::Zlib).unwrap();
    c.bench_function("decode raw", |b| b.iter(|| decode(black_box(&raw), Mode::Raw).unwrap()));
    c.bench_function("decode zlib", |b| b.iter(|| decode(black_box(&zlib), Mode::Zlib).unwrap()));
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
