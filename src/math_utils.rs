/// Mathematical utility functions for lithology mixing
///
/// Weighted means used by the effective-medium mixing laws, piecewise linear
/// interpolation for tabulated properties, and the `assert_deviation!` test macro.
/// All weights are fractions (0..=1) summing to one, not percentages.

/// Assert that the deviation between two values is less than a threshold
///
/// This macro combines deviation calculation with assertion for cleaner test code.
/// It calculates the percentage deviation between `actual` and `expected`, then
/// asserts that this deviation is less than the specified `max_deviation`.
///
/// # Examples
/// See the test cases below for usage examples.
#[macro_export]
macro_rules! assert_deviation {
    ($actual:expr, $expected:expr, $max_deviation:expr) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.6}% >= {:.6}%\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, actual_val, expected_val
                );
            }
        }
    };
    ($actual:expr, $expected:expr, $max_deviation:expr, $($arg:tt)+) => {
        {
            let actual_val = $actual;
            let expected_val = $expected;
            let max_dev = $max_deviation;
            let actual_deviation = $crate::math_utils::deviation(actual_val, expected_val);

            if actual_deviation >= max_dev {
                panic!(
                    "assertion failed: deviation {:.6}% >= {:.6}%: {}\n  actual: {:?},\n  expected: {:?}",
                    actual_deviation, max_dev, format_args!($($arg)+), actual_val, expected_val
                );
            }
        }
    };
}

/// Linear interpolation between two values
///
/// # Examples
/// ```
/// use basin_lithology::math_utils::lerp;
///
/// assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
/// assert_eq!(lerp(100.0, 200.0, 0.25), 125.0);
/// ```
pub fn lerp(a: f64, b: f64, ratio: f64) -> f64 {
    a + (b - a) * ratio
}

/// Inverse linear interpolation - find the ratio for a given value
///
/// # Examples
/// ```
/// use basin_lithology::math_utils::inverse_lerp;
///
/// let ratio = inverse_lerp(100.0, 200.0, 150.0);
/// assert_eq!(ratio, 0.5);
/// ```
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if (b - a).abs() < f64::EPSILON {
        0.0 // Avoid division by zero
    } else {
        (value - a) / (b - a)
    }
}

/// Piecewise linear interpolation through `(xs, ys)`
///
/// `xs` must be increasing. Values outside the table are held constant at the
/// first or last point. An empty table yields 0.
pub fn interpolate_piecewise(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 || x <= xs[0] {
        return ys[0];
    }
    if x >= xs[n - 1] {
        return ys[n - 1];
    }

    // first index whose abscissa is above x; guaranteed in 1..n by the checks above
    let upper = xs[..n].partition_point(|&xi| xi <= x);
    let lower = upper - 1;
    lerp(ys[lower], ys[upper], inverse_lerp(xs[lower], xs[upper], x))
}

/// Weighted arithmetic mean `Σ w·v`
pub fn arithmetic_mean(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

/// Weighted geometric mean `Π v^w`
pub fn geometric_mean(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| v.powf(*w)).product()
}

/// Weighted harmonic mean `1 / Σ (w/v)`
///
/// Returns `None` when the denominator vanishes or any value is zero.
pub fn harmonic_mean(weights: &[f64], values: &[f64]) -> Option<f64> {
    let mut denominator = 0.0;
    for (w, v) in weights.iter().zip(values) {
        if *v == 0.0 {
            return None;
        }
        denominator += w / v;
    }
    (denominator != 0.0).then(|| 1.0 / denominator)
}

/// Weighted power (generalized) mean `(Σ w·v^p)^(1/p)`, geometric at `p == 0`
pub fn power_mean(weights: &[f64], values: &[f64], exponent: f64) -> f64 {
    if exponent == 0.0 {
        return geometric_mean(weights, values);
    }
    weights
        .iter()
        .zip(values)
        .map(|(w, v)| w * v.powf(exponent))
        .sum::<f64>()
        .powf(1.0 / exponent)
}

/// Cubic mean `(Σ w·v³)^(1/3)`, volume-additive averaging of a length
pub fn cubic_mean(weights: &[f64], values: &[f64]) -> f64 {
    arithmetic_mean(
        weights,
        &values.iter().map(|v| v.powi(3)).collect::<Vec<_>>(),
    )
    .cbrt()
}

/// Calculate the percentage deviation between two values
///
/// Returns the percentage difference of `actual` from `expected`.
///
/// # Examples
/// ```
/// use basin_lithology::math_utils::deviation;
///
/// assert_eq!(deviation(105.0, 100.0), 5.0);
/// assert_eq!(deviation(95.0, 100.0), 5.0);
/// ```
pub fn deviation(actual: f64, expected: f64) -> f64 {
    if expected.abs() < f64::EPSILON {
        // if expected is 0, return 0 only when actual is also 0
        if actual.abs() < f64::EPSILON {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        ((actual - expected).abs() / expected.abs()) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(100.0, 200.0, 0.25), 125.0);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(0.0, 10.0, 5.0), 0.5);
        assert_eq!(inverse_lerp(100.0, 200.0, 200.0), 1.0);
        assert_eq!(inverse_lerp(3.0, 3.0, 7.0), 0.0);
    }

    #[test]
    fn test_interpolate_piecewise() {
        let xs = [0.0, 100.0, 200.0];
        let ys = [2.0, 3.0, 5.0];

        assert_eq!(interpolate_piecewise(&xs, &ys, -50.0), 2.0);
        assert_eq!(interpolate_piecewise(&xs, &ys, 50.0), 2.5);
        assert_eq!(interpolate_piecewise(&xs, &ys, 100.0), 3.0);
        assert_eq!(interpolate_piecewise(&xs, &ys, 150.0), 4.0);
        assert_eq!(interpolate_piecewise(&xs, &ys, 900.0), 5.0);
        assert_eq!(interpolate_piecewise(&[], &[], 1.0), 0.0);
        assert_eq!(interpolate_piecewise(&[10.0], &[7.0], 1.0), 7.0);
    }

    #[test]
    fn test_means() {
        let w = [0.5, 0.5];
        let v = [1.0, 4.0];

        assert_abs_diff_eq!(arithmetic_mean(&w, &v), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(geometric_mean(&w, &v), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(harmonic_mean(&w, &v).unwrap(), 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(power_mean(&w, &v, 1.0), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(power_mean(&w, &v, 0.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(power_mean(&w, &v, -1.0), 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(cubic_mean(&w, &v), (32.5f64).cbrt(), epsilon = 1e-12);
        assert!(harmonic_mean(&w, &[0.0, 1.0]).is_none());
    }

    #[test]
    fn test_single_weight_is_identity() {
        let w = [1.0];
        let v = [3.7];

        assert_abs_diff_eq!(arithmetic_mean(&w, &v), 3.7, epsilon = 1e-12);
        assert_abs_diff_eq!(geometric_mean(&w, &v), 3.7, epsilon = 1e-12);
        assert_abs_diff_eq!(harmonic_mean(&w, &v).unwrap(), 3.7, epsilon = 1e-12);
        assert_abs_diff_eq!(cubic_mean(&w, &v), 3.7, epsilon = 1e-12);
    }

    #[test]
    fn test_deviation() {
        assert_eq!(deviation(105.0, 100.0), 5.0);
        assert_eq!(deviation(95.0, 100.0), 5.0);
        assert_eq!(deviation(0.0, 0.0), 0.0);
        assert_eq!(deviation(10.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn test_assert_deviation_macro() {
        assert_deviation!(105.0, 100.0, 10.0);
        assert_deviation!(2.0 * 52.5, 100.0, 10.0);
        assert_deviation!(1530.0, 1500.0, 5.0, "porosity should be within 5%");
    }

    #[test]
    #[should_panic(expected = "assertion failed: deviation")]
    fn test_assert_deviation_macro_fails() {
        assert_deviation!(120.0, 100.0, 10.0);
    }
}
