use assert_float_eq::{assert_float_absolute_eq, assert_float_relative_eq};
use ordistats::{Error, box_m_test, mardia};
use rand::SeedableRng;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use statrs::distribution::{Normal, Uniform};

const SEED: u64 = 20_240_611;

/// Generates N observations of D-dimensional multivariate normal data (uncorrelated).
fn sample_mv_norm_data(rng: &mut StdRng, n: usize, d: usize) -> Vec<Vec<f64>> {
    let dist = Normal::new(0.0, 1.0).unwrap();

    (0..n).map(|_| dist.sample_iter(&mut *rng).take(d).collect()).collect()
}

/// Generates N observations of D-dimensional independent uniform data.
fn sample_mv_unif_data(rng: &mut StdRng, n: usize, d: usize) -> Vec<Vec<f64>> {
    let dist = Uniform::new(0.0, 1.0).unwrap();

    (0..n).map(|_| dist.sample_iter(&mut *rng).take(d).collect()).collect()
}

/// Applies `x -> x A + b` to every row.
fn affine(data: &[Vec<f64>], a: &[Vec<f64>], b: &[f64]) -> Vec<Vec<f64>> {
    data.iter()
        .map(|row| {
            (0..b.len())
                .map(|j| row.iter().zip(a).map(|(x, a_row)| x * a_row[j]).sum::<f64>() + b[j])
                .collect()
        })
        .collect()
}

#[test]
fn box_m_is_invariant_to_row_order() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let data = sample_mv_norm_data(&mut rng, 60, 3);
    let groups: Vec<usize> = (0..60).map(|i| i % 3).collect();

    let mut order: Vec<usize> = (0..60).collect();
    order.shuffle(&mut rng);
    let shuffled_data: Vec<Vec<f64>> = order.iter().map(|&i| data[i].clone()).collect();
    let shuffled_groups: Vec<usize> = order.iter().map(|&i| groups[i]).collect();

    let original = box_m_test(data, groups).unwrap();
    let shuffled = box_m_test(shuffled_data, shuffled_groups).unwrap();

    assert_float_relative_eq!(
        original.chi_squared.statistic,
        shuffled.chi_squared.statistic,
        1e-9
    );
    assert_float_relative_eq!(original.chi_squared.p_value, shuffled.chi_squared.p_value, 1e-9);

    for (label, cov) in &original.covariances {
        for (a, b) in cov.iter().zip(shuffled.covariances[label].iter()) {
            assert_float_absolute_eq!(*a, *b, 1e-12);
        }
    }
}

#[test]
fn mardia_is_invariant_to_row_order() {
    let mut rng = StdRng::seed_from_u64(SEED + 1);
    let mut data = sample_mv_norm_data(&mut rng, 80, 3);
    let original = mardia(data.clone(), true).unwrap();

    data.shuffle(&mut rng);
    let shuffled = mardia(data, true).unwrap();

    assert_float_relative_eq!(original.g1p, shuffled.g1p, 1e-9);
    assert_float_relative_eq!(original.g2p, shuffled.g2p, 1e-9);
    assert_float_relative_eq!(original.kurtosis.p_value, shuffled.kurtosis.p_value, 1e-9);
}

#[test]
fn mardia_is_affine_invariant() {
    let mut rng = StdRng::seed_from_u64(SEED + 2);
    let data = sample_mv_unif_data(&mut rng, 120, 3);
    let a = vec![vec![2.0, 0.3, -1.0], vec![0.5, -4.0, 0.2], vec![1.5, 1.0, 3.0]];
    let b = [10.0, -250.0, 0.01];

    for use_population_covariance in [true, false] {
        let original = mardia(data.clone(), use_population_covariance).unwrap();
        let transformed = mardia(affine(&data, &a, &b), use_population_covariance).unwrap();

        assert_float_relative_eq!(original.g1p, transformed.g1p, 1e-7);
        assert_float_relative_eq!(original.g2p, transformed.g2p, 1e-7);
        assert_float_relative_eq!(
            original.skewness.statistic,
            transformed.skewness.statistic,
            1e-7
        );
        assert_float_relative_eq!(
            original.kurtosis.statistic,
            transformed.kurtosis.statistic,
            1e-7
        );
    }
}

#[test]
fn box_m_rejects_differently_scaled_groups() {
    let mut rng = StdRng::seed_from_u64(SEED + 3);
    let narrow = sample_mv_norm_data(&mut rng, 50, 2);
    let wide: Vec<Vec<f64>> = sample_mv_norm_data(&mut rng, 50, 2)
        .into_iter()
        .map(|row| row.into_iter().map(|v| 4.0 * v).collect())
        .collect();
    let data: Vec<Vec<f64>> = narrow.into_iter().chain(wide).collect();
    let groups: Vec<u8> = (0..100).map(|i| u8::from(i >= 50)).collect();

    let result = box_m_test(data, groups).unwrap();

    assert!(result.chi_squared.p_value < 1e-6);
}

#[test]
fn box_m_calibration_under_equal_covariances() {
    let mut rng = StdRng::seed_from_u64(SEED + 4);
    let trials = 300;
    let groups: Vec<u8> = (0..100).map(|i| u8::from(i >= 50)).collect();

    let not_rejected = (0..trials)
        .filter(|_| {
            let data = sample_mv_norm_data(&mut rng, 100, 2);
            let result = box_m_test(data, groups.iter().copied()).unwrap();

            assert!(result.chi_squared.statistic.is_finite());
            result.chi_squared.p_value > 0.05
        })
        .count();

    assert!(not_rejected * 100 >= trials * 90, "only {not_rejected} of {trials} not rejected");
}

#[test]
fn mardia_calibration_under_normality() {
    let mut rng = StdRng::seed_from_u64(SEED + 5);
    let trials = 200;
    let mut skew_not_rejected = 0;
    let mut kurt_not_rejected = 0;

    for _ in 0..trials {
        let result = mardia(sample_mv_norm_data(&mut rng, 250, 3), true).unwrap();

        skew_not_rejected += usize::from(result.skewness.p_value > 0.05);
        kurt_not_rejected += usize::from(result.kurtosis.p_value > 0.05);
    }

    assert!(skew_not_rejected * 100 >= trials * 90, "skewness: {skew_not_rejected} of {trials}");
    assert!(kurt_not_rejected * 100 >= trials * 90, "kurtosis: {kurt_not_rejected} of {trials}");
}

#[test]
fn mardia_detects_skewed_data() {
    let mut rng = StdRng::seed_from_u64(SEED + 6);
    let skewed: Vec<Vec<f64>> = sample_mv_norm_data(&mut rng, 300, 2)
        .into_iter()
        .map(|row| row.into_iter().map(f64::exp).collect())
        .collect();

    let result = mardia(skewed, true).unwrap();

    assert!(result.skewness.p_value < 1e-6);
    assert!(result.kurtosis.p_value < 1e-6);
}

#[test]
fn small_groups_never_produce_nan() {
    let mut rng = StdRng::seed_from_u64(SEED + 7);

    for n_small in 2..=4 {
        let mut data = sample_mv_norm_data(&mut rng, 20, 4);
        data.truncate(16 + n_small);
        let groups: Vec<u8> = (0..data.len()).map(|i| u8::from(i >= 16)).collect();

        match box_m_test(data, groups) {
            Err(Error::SingularCovariance(group)) => assert_eq!(group, "group 1"),
            other => panic!("expected a singular covariance error, got {other:?}"),
        }
    }
}
