//! Special-function approximations backing the significance and SRM tests.
//!
//! Everything here is a pure numeric primitive: no allocation, no logging,
//! bounded iteration.

use std::f64::consts::{FRAC_2_SQRT_PI, PI, SQRT_2};

/// Iteration cap for the incomplete gamma series and continued fraction.
pub const MAX_ITERATIONS: usize = 100;

/// A term whose relative contribution falls below this stops the expansion.
pub const CONVERGENCE_EPSILON: f64 = 1e-10;

/// Newton refinement steps applied on top of the closed-form inverse erf estimate.
pub const INVERSE_ERF_NEWTON_STEPS: usize = 2;

// Floor for continued-fraction denominators (Lentz's method).
const FPMIN: f64 = 1.0e-300;

// ── Standard Normal ─────────────────────────────────────────────────

const INV_SQRT_2PI: f64 = 0.3989422804014327;
const TAIL_P: f64 = 0.2316419;
const TAIL_B: [f64; 5] = [0.319381530, -0.356563782, 1.781477937, -1.821255978, 1.330274429];

/// P(Z > z) for z >= 0, Abramowitz & Stegun 26.2.17. Absolute error below 7.5e-8.
fn upper_tail(z: f64) -> f64 {
    let t = 1.0 / (1.0 + TAIL_P * z);
    let density = INV_SQRT_2PI * (-0.5 * z * z).exp();
    let series = TAIL_B.iter().rev().fold(0.0, |acc, &b| acc * t + b) * t;
    density * series
}

/// Standard normal CDF, P(Z <= x).
///
/// Negative arguments are reflected so that `normal_cdf(-x) == 1 - normal_cdf(x)`
/// holds up to floating-point rounding.
pub fn normal_cdf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= 0.0 {
        1.0 - upper_tail(x)
    } else {
        upper_tail(-x)
    }
}

/// Standard normal survival function, P(Z > z).
///
/// Computed directly from the tail polynomial, so small p-values keep their
/// precision instead of being lost in `1 - normal_cdf(z)`.
pub fn normal_sf(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    if z >= 0.0 {
        upper_tail(z)
    } else {
        1.0 - upper_tail(-z)
    }
}

fn erf(y: f64) -> f64 {
    2.0 * normal_cdf(y * SQRT_2) - 1.0
}

// ── Inverse Error Function ──────────────────────────────────────────

/// Approximate inverse error function for `x` in (-1, 1).
///
/// Starts from Winitzki's closed form (a = 0.147) and polishes it with
/// [`INVERSE_ERF_NEWTON_STEPS`] Newton iterations. Returns ±infinity for
/// |x| >= 1. Accuracy degrades as |x| approaches 1 because the forward erf is
/// itself only accurate to ~1.5e-7 absolute.
pub fn inverse_erf(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x >= 1.0 {
        return f64::INFINITY;
    }
    if x <= -1.0 {
        return f64::NEG_INFINITY;
    }
    if x == 0.0 {
        return 0.0;
    }

    const A: f64 = 0.147;
    let ln = (1.0 - x * x).ln();
    let t = 2.0 / (PI * A) + ln / 2.0;
    let mut y = ((t * t - ln / A).sqrt() - t).sqrt().copysign(x);

    for _ in 0..INVERSE_ERF_NEWTON_STEPS {
        let slope = FRAC_2_SQRT_PI * (-y * y).exp();
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        y -= (erf(y) - x) / slope;
    }

    y
}

// ── Gamma Family ────────────────────────────────────────────────────

const LANCZOS_G: f64 = 7.0;

#[allow(clippy::excessive_precision)]
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];

/// ln Γ(x), Lanczos with g = 7. Arguments below 0.5 go through Euler's
/// reflection Γ(x)Γ(1−x) = π / sin(πx).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        return (PI / (PI * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let base = z + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (k, &c)| acc + c / (z + k as f64));

    0.5 * (2.0 * PI).ln() + (z + 0.5) * base.ln() - base + series.ln()
}

/// Regularized lower incomplete gamma P(a, x) for a > 0, x >= 0.
///
/// Series expansion below `x = a + 1`, continued fraction above it. Both stop
/// after [`MAX_ITERATIONS`] or once a term contributes less than
/// [`CONVERGENCE_EPSILON`] relative to the running value. NaN for a <= 0.
pub fn lower_incomplete_gamma_regularized(a: f64, x: f64) -> f64 {
    if a.is_nan() || x.is_nan() || a <= 0.0 {
        return f64::NAN;
    }
    if x <= 0.0 {
        return 0.0;
    }
    if x.is_infinite() {
        return 1.0;
    }

    let log_prefactor = -x + a * x.ln() - ln_gamma(a);

    let p = if x < a + 1.0 {
        gamma_series(a, x) * log_prefactor.exp()
    } else {
        1.0 - gamma_continued_fraction(a, x) * log_prefactor.exp()
    };

    p.clamp(0.0, 1.0)
}

fn gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut term = 1.0 / a;
    let mut sum = term;

    for _ in 0..MAX_ITERATIONS {
        ap += 1.0;
        term *= x / ap;
        sum += term;
        if term.abs() < sum.abs() * CONVERGENCE_EPSILON {
            break;
        }
    }

    sum
}

fn gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;

    for i in 1..=MAX_ITERATIONS {
        let i_f = i as f64;
        let an = -i_f * (i_f - a);
        b += 2.0;
        d = an * d + b;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < CONVERGENCE_EPSILON {
            break;
        }
    }

    h
}

/// Chi-squared CDF with `df` degrees of freedom.
pub fn chi_squared_cdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    lower_incomplete_gamma_regularized(df / 2.0, x / 2.0)
}
