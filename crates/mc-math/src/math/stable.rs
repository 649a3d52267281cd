//! Log-domain special functions backing the incomplete beta integral.

use std::f64::consts::PI;

/// `ln(sqrt(2 pi))`
const LOG_SQRT_2PI: f64 = 0.918_938_533_204_672_8;
const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)]
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// `ln |Gamma(z)|` by the Lanczos series, reflected below 0.5.
///
/// Poles (zero and the negative integers) and `-inf` give NaN.
pub fn log_gamma(z: f64) -> f64 {
    match z {
        z if z.is_nan() || z == f64::NEG_INFINITY => f64::NAN,
        z if z == f64::INFINITY => f64::INFINITY,
        z if z <= 0.0 && z == z.trunc() => f64::NAN,
        z if z < 0.5 => {
            // Gamma(z) Gamma(1 - z) = pi / sin(pi z)
            let sin_pi = (PI * z).sin().abs();
            if sin_pi == 0.0 {
                f64::NAN
            } else {
                PI.ln() - sin_pi.ln() - log_gamma(1.0 - z)
            }
        }
        z => lanczos(z - 1.0),
    }
}

fn lanczos(w: f64) -> f64 {
    let series = LANCZOS_COEFFS[1..]
        .iter()
        .zip(1..)
        .fold(LANCZOS_COEFFS[0], |acc, (c, k)| acc + c / (w + k as f64));
    let t = w + LANCZOS_G + 0.5;
    LOG_SQRT_2PI + (w + 0.5) * t.ln() - t + series.ln()
}

/// log Beta(a, b) = log Gamma(a) + log Gamma(b) - log Gamma(a+b).
pub fn log_beta(a: f64, b: f64) -> f64 {
    log_gamma(a) + log_gamma(b) - log_gamma(a + b)
}
