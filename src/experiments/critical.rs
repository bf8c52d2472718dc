//! Two-sided z critical values for confidence and power levels.

use std::f64::consts::SQRT_2;

use super::special::inverse_erf;

/// Returns the z value bounding the central `level` mass of the standard
/// normal, i.e. `Φ⁻¹((1 + level) / 2)`.
///
/// 0.90, 0.95 and 0.99 return their textbook constants verbatim; anything else
/// goes through [`inverse_erf`]. The same function serves confidence levels
/// (intervals) and power levels (sample size). Levels outside (0, 1) are the
/// caller's responsibility: 0 maps to 0 and 1 to infinity.
pub fn z_critical(level: f64) -> f64 {
    if level == 0.90 {
        1.645
    } else if level == 0.95 {
        1.96
    } else if level == 0.99 {
        2.576
    } else {
        -SQRT_2 * inverse_erf((1.0 - level) - 1.0)
    }
}

pub(crate) fn is_open_unit(level: f64) -> bool {
    level > 0.0 && level < 1.0
}
