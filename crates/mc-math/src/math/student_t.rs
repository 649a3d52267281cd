//! Student-t tail probabilities and Welch's unequal-variance t-test.
//!
//! The two-sided tail uses the identity
//! `P(|T| > t) = I_{df/(df+t^2)}(df/2, 1/2)` on top of the regularized
//! incomplete beta function.

use serde::{Deserialize, Serialize};

use super::beta::beta_cdf;

/// Two-sided tail probability `P(|T| > |t|)` for Student-t with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> f64 {
    if t.is_nan() || df.is_nan() || df <= 0.0 {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    let x = df / (df + t * t);
    beta_cdf(x, 0.5 * df, 0.5)
}

/// Outcome of a two-sample Welch t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// t statistic (sample `a` minus sample `b`).
    pub statistic: f64,
    /// Welch–Satterthwaite degrees of freedom.
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

impl WelchTest {
    fn undefined() -> Self {
        WelchTest {
            statistic: f64::NAN,
            df: f64::NAN,
            p_value: f64::NAN,
        }
    }
}

/// Welch's t-test for a difference in means with unequal variances.
///
/// NaN cells propagate into a NaN result. Fewer than two samples on
/// either side yields an undefined (all-NaN) test. When both variances
/// are zero the degrees of freedom are undefined and taken as 1, so
/// equal means give a NaN p-value and different means give p = 0.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> WelchTest {
    if a.len() < 2 || b.len() < 2 {
        return WelchTest::undefined();
    }
    let (mean_a, var_a) = mean_var(a);
    let (mean_b, var_b) = mean_var(b);
    let na = a.len() as f64;
    let nb = b.len() as f64;

    let va = var_a / na;
    let vb = var_b / nb;
    let denom = (va + vb).sqrt();
    let statistic = (mean_a - mean_b) / denom;

    let mut df = (va + vb) * (va + vb) / (va * va / (na - 1.0) + vb * vb / (nb - 1.0));
    if df.is_nan() {
        df = 1.0;
    }

    WelchTest {
        statistic,
        df,
        p_value: student_t_two_sided(statistic, df),
    }
}

/// Mean and sample variance without NaN skipping.
fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (mean, ss / (n - 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn two_sided_known_value() {
        // P(|T| > 2) with 10 degrees of freedom.
        let p = student_t_two_sided(2.0, 10.0);
        assert!(approx_eq(p, 0.073_388, 1e-4), "p = {}", p);
    }

    #[test]
    fn cauchy_special_case() {
        // df = 1 is Cauchy: P(|T| > 1) = 0.5
        let p = student_t_two_sided(1.0, 1.0);
        assert!(approx_eq(p, 0.5, 1e-5), "p = {}", p);
    }

    #[test]
    fn zero_statistic_has_unit_p() {
        assert!(approx_eq(student_t_two_sided(0.0, 7.3), 1.0, 1e-12));
    }

    #[test]
    fn welch_known_example() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0];
        let test = welch_t_test(&a, &b);
        assert!(approx_eq(test.statistic, -1.897_366, 1e-5));
        assert!(approx_eq(test.df, 5.882_353, 1e-5));
        assert!(approx_eq(test.p_value, 0.107_531, 1e-4), "p = {}", test.p_value);
    }

    #[test]
    fn identical_samples_give_p_one() {
        let a = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0];
        let test = welch_t_test(&a, &a);
        assert!(approx_eq(test.p_value, 1.0, 1e-9));
    }

    #[test]
    fn too_few_samples_is_undefined() {
        let test = welch_t_test(&[1.0], &[1.0, 2.0, 3.0]);
        assert!(test.p_value.is_nan());
    }

    #[test]
    fn zero_variance_different_means_is_zero() {
        let test = welch_t_test(&[1.0, 1.0, 1.0], &[2.0, 2.0]);
        assert_eq!(test.p_value, 0.0);
    }

    #[test]
    fn zero_variance_equal_means_is_nan() {
        let test = welch_t_test(&[1.0, 1.0, 1.0], &[1.0, 1.0]);
        assert!(test.p_value.is_nan());
    }
}
