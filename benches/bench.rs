use std::hint::black_box;
use std::sync::LazyLock;

use gungraun::{library_benchmark, library_benchmark_group, main};
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use statrs::distribution::Normal;

const SEED: u64 = 123;
const DIMENSION: usize = 4;
static TINY: LazyLock<Vec<Vec<f64>>> = LazyLock::new(|| sample_data(20));
static SMALL: LazyLock<Vec<Vec<f64>>> = LazyLock::new(|| sample_data(100));
static MEDIUM: LazyLock<Vec<Vec<f64>>> = LazyLock::new(|| sample_data(500));
static LARGE: LazyLock<Vec<Vec<f64>>> = LazyLock::new(|| sample_data(2000));

fn sample_data(n: usize) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let dist = Normal::new(0.0, 1.0).unwrap();

    (0..n).map(|_| dist.sample_iter(&mut rng).take(DIMENSION).collect()).collect()
}

fn to_vec(data: &LazyLock<Vec<Vec<f64>>>) -> Vec<Vec<f64>> {
    (*data).clone()
}

fn to_matrix(data: &LazyLock<Vec<Vec<f64>>>) -> DMatrix<f64> {
    DMatrix::from_row_iterator(data.len(), DIMENSION, data.iter().flatten().copied())
}

fn setup() {
    let _ = TINY;
    let _ = SMALL;
    let _ = MEDIUM;
    let _ = LARGE;
}

#[library_benchmark(setup = to_vec)]
#[bench::tiny(&TINY)]
#[bench::small(&SMALL)]
#[bench::medium(&MEDIUM)]
#[bench::large(&LARGE)]
fn box_m_test(data: Vec<Vec<f64>>) {
    let groups: Vec<usize> = (0..data.len()).map(|i| i % 4).collect();
    let _ = black_box(ordistats::box_m_test(data, groups));
}

#[library_benchmark(setup = to_vec)]
#[bench::tiny(&TINY)]
#[bench::small(&SMALL)]
#[bench::medium(&MEDIUM)]
#[bench::large(&LARGE)]
fn mardia(data: Vec<Vec<f64>>) {
    let _ = black_box(ordistats::mardia(data, true));
}

#[library_benchmark(setup = to_matrix)]
#[bench::tiny(&TINY)]
#[bench::small(&SMALL)]
#[bench::medium(&MEDIUM)]
#[bench::large(&LARGE)]
fn wascores(scores: DMatrix<f64>) {
    let weights = scores.map(f64::abs);
    let _ = black_box(ordistats::ordination::wascores(&scores, &weights, true));
}

library_benchmark_group!(
    name = benches;
    setup = setup();
    benchmarks = box_m_test, mardia, wascores
);

main!(library_benchmark_groups = benches);
