use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gridwise_tensor::{Axis, Real, Tensor};
use gridwise_tensor_ops::{arithmetic, linalg, reduce, NormOrd};
use rand::Rng;

fn random_tensor(rng: &mut impl Rng, rows: usize, cols: usize) -> Tensor {
    let data: Vec<Real> = (0..rows * cols).map(|_| rng.random::<Real>()).collect();
    Tensor::from_shape_vec(rows, cols, data).unwrap()
}

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    let mut rng = rand::rng();

    for size in [8, 128, 1024] {
        let t = random_tensor(&mut rng, size, size);
        let row: Vec<Real> = (0..size).map(|_| rng.random::<Real>()).collect();
        let other = random_tensor(&mut rng, size, size);

        group.bench_function(format!("row_{}x{}", size, size), |bencher| {
            bencher.iter(|| black_box(arithmetic::add(black_box(&t), &row).unwrap()))
        });

        group.bench_function(format!("tensor_{}x{}", size, size), |bencher| {
            bencher.iter(|| black_box(arithmetic::add(black_box(&t), &other).unwrap()))
        });
    }

    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");
    let mut rng = rand::rng();

    for size in [8, 128, 1024] {
        let t = random_tensor(&mut rng, size, size);

        for (name, axis) in [("flat", Axis::Flat), ("rows", Axis::Rows), ("cols", Axis::Cols)] {
            group.bench_function(format!("sum_{}_{}x{}", name, size, size), |bencher| {
                bencher.iter(|| black_box(reduce::sum(black_box(&t), axis, false).unwrap()))
            });
        }

        group.bench_function(format!("norm_l2_rows_{}x{}", size, size), |bencher| {
            bencher.iter(|| {
                black_box(linalg::norm(black_box(&t), NormOrd::L2, Axis::Rows, false).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_linalg(c: &mut Criterion) {
    let mut group = c.benchmark_group("linalg");
    let mut rng = rand::rng();

    for size in [8, 64, 256] {
        let a = random_tensor(&mut rng, size, size);
        let b = random_tensor(&mut rng, size, size);

        group.bench_function(format!("matmul_{}x{}", size, size), |bencher| {
            bencher.iter(|| black_box(linalg::matmul(black_box(&a), black_box(&b)).unwrap()))
        });

        group.bench_function(format!("transpose_{}x{}", size, size), |bencher| {
            bencher.iter(|| black_box(linalg::transpose(black_box(&a)).unwrap()))
        });

        group.bench_function(format!("qr_{}x{}", size, size), |bencher| {
            bencher.iter(|| black_box(linalg::qr_decompose(black_box(&a)).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add, bench_reduce, bench_linalg);
criterion_main!(benches);
