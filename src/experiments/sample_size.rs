use serde::{Deserialize, Serialize};

use super::critical::{is_open_unit, z_critical};
use crate::error::{Result, StatsError};

pub const DEFAULT_POWER: f64 = 0.8;

/// Required per-arm size scaled to a whole experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSizePlan {
    pub per_arm: u64,
    pub total: u64,
    /// Days to reach `total` at the supplied daily participant rate.
    pub estimated_days: Option<f64>,
}

// ── Sample Size Estimator ───────────────────────────────────────────

/// Per-arm sample size needed to detect a relative lift of
/// `minimum_detectable_effect` over `baseline_conversion`.
///
/// Uses the pooled two-proportion formula
/// `n = 2·p̄(1−p̄)·(z_α + z_β)² / (p2 − p1)²` with `p2 = p1·(1 + MDE)` and both
/// critical values taken from [`z_critical`].
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] unless `0 < baseline_conversion < 1`,
/// `minimum_detectable_effect > 0`, `0 < confidence_level < 1`, `0 < power < 1`
/// and the implied treatment rate stays at or below 1, or when the resulting size
/// does not fit in a `u64`.
pub fn calculate_required_sample_size(
    baseline_conversion: f64,
    minimum_detectable_effect: f64,
    confidence_level: f64,
    power: f64,
) -> Result<u64> {
    if !is_open_unit(baseline_conversion) {
        return Err(StatsError::invalid(format!(
            "baselineConversion must be in (0, 1), got {}",
            baseline_conversion
        )));
    }
    if !(minimum_detectable_effect.is_finite() && minimum_detectable_effect > 0.0) {
        return Err(StatsError::invalid(format!(
            "minimumDetectableEffect must be positive, got {}",
            minimum_detectable_effect
        )));
    }
    if !is_open_unit(confidence_level) {
        return Err(StatsError::invalid(format!(
            "confidenceLevel must be in (0, 1), got {}",
            confidence_level
        )));
    }
    if !is_open_unit(power) {
        return Err(StatsError::invalid(format!(
            "power must be in (0, 1), got {}",
            power
        )));
    }

    let p1 = baseline_conversion;
    let p2 = baseline_conversion * (1.0 + minimum_detectable_effect);
    if p2 > 1.0 {
        return Err(StatsError::invalid(format!(
            "baselineConversion {} with minimumDetectableEffect {} implies a rate above 1",
            baseline_conversion, minimum_detectable_effect
        )));
    }

    let z_alpha = z_critical(confidence_level);
    let z_beta = z_critical(power);

    let p_bar = (p1 + p2) / 2.0;
    let n = 2.0 * p_bar * (1.0 - p_bar) * (z_alpha + z_beta).powi(2) / (p2 - p1).powi(2);
    let n = n.ceil();
    // u64::MAX as f64 rounds up to 2^64, so >= rejects everything that would saturate
    if !n.is_finite() || n >= u64::MAX as f64 {
        return Err(StatsError::invalid(format!(
            "required sample size for baselineConversion {} and minimumDetectableEffect {} \
             is not representable",
            baseline_conversion, minimum_detectable_effect
        )));
    }
    let per_arm = n as u64;

    tracing::debug!(
        baseline_conversion,
        minimum_detectable_effect,
        confidence_level,
        power,
        per_arm,
        "computed required sample size"
    );

    Ok(per_arm)
}

/// Scales [`calculate_required_sample_size`] to `variations` arms and, when a
/// positive `daily_participants` rate is known, estimates the run length.
///
/// # Errors
///
/// Propagates the estimator's validation and rejects fewer than two variations
/// or a total that does not fit in a `u64`.
pub fn plan_sample_size(
    baseline_conversion: f64,
    minimum_detectable_effect: f64,
    confidence_level: f64,
    power: f64,
    variations: usize,
    daily_participants: Option<f64>,
) -> Result<SampleSizePlan> {
    if variations < 2 {
        return Err(StatsError::invalid(format!(
            "an experiment needs at least 2 variations, got {}",
            variations
        )));
    }
    let per_arm = calculate_required_sample_size(
        baseline_conversion,
        minimum_detectable_effect,
        confidence_level,
        power,
    )?;
    let total = per_arm.checked_mul(variations as u64).ok_or_else(|| {
        StatsError::invalid(format!(
            "{} participants per arm across {} variations overflows u64",
            per_arm, variations
        ))
    })?;
    let estimated_days = daily_participants
        .filter(|rate| *rate > 0.0 && rate.is_finite())
        .map(|rate| total as f64 / rate);

    Ok(SampleSizePlan {
        per_arm,
        total,
        estimated_days,
    })
}
