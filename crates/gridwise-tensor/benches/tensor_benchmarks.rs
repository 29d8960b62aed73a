use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridwise_tensor::{shape::COLLAPSE, shape::INFER, Tensor};

fn benchmark_view(c: &mut Criterion) {
    let tensor = Tensor::from_shape_vec(100, 100, vec![1.0; 10000]).unwrap();

    c.bench_function("tensor view", |b| {
        b.iter(|| {
            let _view = black_box(&tensor).view();
        })
    });
}

fn benchmark_deep_copy(c: &mut Criterion) {
    let tensor = Tensor::from_shape_vec(100, 100, vec![1.0; 10000]).unwrap();

    c.bench_function("tensor deep_copy", |b| {
        b.iter(|| {
            let _copy = black_box(&tensor).deep_copy();
        })
    });
}

fn benchmark_reshape(c: &mut Criterion) {
    let tensor = Tensor::from_shape_vec(100, 100, vec![1.0; 10000]).unwrap();

    c.bench_function("reshape infer", |b| {
        b.iter(|| black_box(&tensor).reshape(black_box(50), INFER).unwrap())
    });

    c.bench_function("reshape collapse", |b| {
        b.iter(|| black_box(&tensor).reshape(INFER, black_box(COLLAPSE)).unwrap())
    });
}

fn benchmark_map(c: &mut Criterion) {
    let tensor = Tensor::from_shape_vec(100, 100, vec![1.0; 10000]).unwrap();

    c.bench_function("map", |b| {
        b.iter(|| black_box(&tensor).map(|v| v * 2.0 + 1.0))
    });
}

criterion_group!(
    benches,
    benchmark_view,
    benchmark_deep_copy,
    benchmark_reshape,
    benchmark_map
);
criterion_main!(benches);
