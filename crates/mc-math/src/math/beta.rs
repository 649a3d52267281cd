//! Regularized incomplete beta function.
//!
//! Evaluated with the modified Lentz continued fraction, switching to
//! `I_x(a, b) = 1 - I_{1-x}(b, a)` past the mean `(a + 1) / (a + b + 2)`
//! where the fraction would converge slowly.

use super::stable::log_beta;

const MAX_TERMS: usize = 200;
const TOLERANCE: f64 = 3.0e-7;
/// Floor keeping Lentz denominators away from zero.
const TINY: f64 = 1.0e-30;

/// Regularized incomplete beta function `I_x(a, b)`.
///
/// `x` outside `(0, 1)` clamps to 0 or 1; non-positive shapes give NaN.
pub fn beta_cdf(x: f64, a: f64, b: f64) -> f64 {
    if x.is_nan() || a.is_nan() || b.is_nan() || a <= 0.0 || b <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // x^a (1-x)^b / B(a, b), shared by both branches
    let front = (a * x.ln() + b * (1.0 - x).ln() - log_beta(a, b)).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * continued_fraction(a, b, x) / a
    } else {
        1.0 - front * continued_fraction(b, a, 1.0 - x) / b
    }
}

fn nonzero(v: f64) -> f64 {
    if v.abs() < TINY {
        TINY
    } else {
        v
    }
}

struct Lentz {
    c: f64,
    d: f64,
    value: f64,
}

impl Lentz {
    /// Fold in one partial numerator and return the applied factor.
    fn step(&mut self, numerator: f64) -> f64 {
        self.d = 1.0 / nonzero(1.0 + numerator * self.d);
        self.c = nonzero(1.0 + numerator / self.c);
        let factor = self.c * self.d;
        self.value *= factor;
        factor
    }
}

fn continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    let d = 1.0 / nonzero(1.0 - (a + b) * x / (a + 1.0));
    let mut lentz = Lentz { c: 1.0, d, value: d };

    for m in 1..=MAX_TERMS {
        let m = m as f64;
        let two_m = 2.0 * m;
        let even = m * (b - m) * x / ((a - 1.0 + two_m) * (a + two_m));
        lentz.step(even);
        let odd = -(a + m) * (a + b + m) * x / ((a + two_m) * (a + 1.0 + two_m));
        if (lentz.step(odd) - 1.0).abs() < TOLERANCE {
            break;
        }
    }
    lentz.value
}
