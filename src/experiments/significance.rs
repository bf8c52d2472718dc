//! Two-proportion z-test between a control and one or more treatments.

use indexmap::IndexMap;

use super::critical::{is_open_unit, z_critical};
use super::special::normal_sf;
use crate::error::{Result, StatsError};
use crate::types::{SignificanceResult, VariationData};

pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

fn check_confidence_level(confidence_level: f64) -> Result<()> {
    if !is_open_unit(confidence_level) {
        return Err(StatsError::invalid(format!(
            "confidenceLevel must be in (0, 1), got {}",
            confidence_level
        )));
    }
    Ok(())
}

fn warn_if_overconverted(v: &VariationData) {
    if v.conversions > v.participants {
        tracing::warn!(
            variation = %v.variation_key,
            participants = v.participants,
            conversions = v.conversions,
            "conversions exceed participants; rate will exceed 1"
        );
    }
}

/// Pooled two-proportion z-test of `treatment` against `control`.
///
/// If either arm has no participants the neutral
/// [`SignificanceResult::no_evidence`] is returned; treat it as "no evidence",
/// not as a computed result. The confidence interval is the Wald interval of
/// the treatment rate, clamped to [0, 1]. Lift from a zero control rate is
/// reported as 0.
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] if `confidence_level` is not in (0, 1).
pub fn calculate_significance(
    control: &VariationData,
    treatment: &VariationData,
    confidence_level: f64,
) -> Result<SignificanceResult> {
    check_confidence_level(confidence_level)?;

    if control.participants == 0 || treatment.participants == 0 {
        tracing::debug!(
            control = %control.variation_key,
            treatment = %treatment.variation_key,
            "arm without participants, returning neutral result"
        );
        return Ok(SignificanceResult::no_evidence());
    }

    warn_if_overconverted(control);
    warn_if_overconverted(treatment);

    let n1 = control.participants as f64;
    let n2 = treatment.participants as f64;
    let p1 = control.conversions as f64 / n1;
    let p2 = treatment.conversions as f64 / n2;

    let pooled = (p1 * n1 + p2 * n2) / (n1 + n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    // se is NaN when pooled > 1 (over-converted input); treat like zero variance
    let z_score = if se > 0.0 { (p2 - p1) / se } else { 0.0 };

    let p_value = (2.0 * normal_sf(z_score.abs())).clamp(0.0, 1.0);

    let margin = z_critical(confidence_level) * (p2 * (1.0 - p2) / n2).max(0.0).sqrt();
    let low = (p2 - margin).clamp(0.0, 1.0);
    let high = (p2 + margin).clamp(0.0, 1.0);

    let relative_lift = if p1 > 0.0 {
        (p2 - p1) / p1
    } else {
        tracing::debug!(
            control = %control.variation_key,
            "zero control rate, relative lift undefined and reported as 0"
        );
        0.0
    };

    let is_significant = p_value < (1.0 - confidence_level);

    tracing::debug!(
        control = %control.variation_key,
        treatment = %treatment.variation_key,
        z_score,
        p_value,
        is_significant,
        "computed two-proportion z-test"
    );

    Ok(SignificanceResult {
        p_value,
        is_significant,
        z_score,
        confidence_interval: (low, high),
        relative_lift,
        control_conversion_rate: p1,
        treatment_conversion_rate: p2,
    })
}

/// Tests every treatment against the same control, each at the nominal
/// `confidence_level`.
///
/// No multiple-comparisons correction is applied here; see
/// [`crate::experiments::correction`] for caller-level adjustment. Results
/// keep the order of `treatments`, and a repeated variation key overwrites the
/// earlier entry.
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] if `confidence_level` is not in (0, 1).
pub fn calculate_multiple_significance(
    control: &VariationData,
    treatments: &[VariationData],
    confidence_level: f64,
) -> Result<IndexMap<String, SignificanceResult>> {
    check_confidence_level(confidence_level)?;

    let mut results = IndexMap::with_capacity(treatments.len());
    for treatment in treatments {
        let result = calculate_significance(control, treatment, confidence_level)?;
        results.insert(treatment.variation_key.clone(), result);
    }
    Ok(results)
}
