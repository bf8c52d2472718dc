//! One-call analysis of an experiment: SRM, per-treatment significance,
//! optional multiple-comparison correction, sample-size gate and a
//! human-readable recommendation.

use serde::{Deserialize, Serialize};

use super::config::AnalysisConfig;
use super::correction::{adjust_p_values, Correction};
use super::sample_size::calculate_required_sample_size;
use super::significance::calculate_multiple_significance;
use super::srm::{check_srm, srm_severity, SrmSeverity};
use crate::error::{Result, StatsError};
use crate::types::{SignificanceResult, SrmResult, VariationData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentComparison {
    pub variation_key: String,
    pub significance: SignificanceResult,
    /// Equal to `significance.p_value` when no correction is configured.
    pub adjusted_p_value: f64,
    pub is_significant_adjusted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentAnalysis {
    pub control_key: String,
    pub srm: SrmResult,
    pub srm_severity: SrmSeverity,
    pub correction: Correction,
    pub comparisons: Vec<TreatmentComparison>,
    /// `None` when no plan can be made from the observed control rate. A rate
    /// of 0 or 1 leaves the gate open; any other unplannable rate closes it.
    pub required_participants_per_arm: Option<u64>,
    pub sample_size_reached: bool,
    /// Only set once the sample-size gate is open and no SRM was found.
    pub winner: Option<String>,
    pub recommendation: String,
}

/// Analyses `control` against every treatment.
///
/// `expected_ratios` lists the designed traffic shares in the order
/// `[control, treatments...]`. Significance uses the configured correction
/// for `is_significant_adjusted` and for picking a winner; the raw per-pair
/// results are kept untouched in `significance`.
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] for an invalid config, an empty
/// treatment list, or expected ratios rejected by [`check_srm`].
pub fn analyze_experiment(
    config: &AnalysisConfig,
    control: &VariationData,
    treatments: &[VariationData],
    expected_ratios: &[f64],
) -> Result<ExperimentAnalysis> {
    config.validate()?;
    if treatments.is_empty() {
        return Err(StatsError::invalid("at least one treatment is required"));
    }

    let arms: Vec<VariationData> = std::iter::once(control)
        .chain(treatments)
        .cloned()
        .collect();
    let srm = check_srm(&arms, expected_ratios, config.srm_threshold)?;
    let severity = srm_severity(srm.p_value);

    let results = calculate_multiple_significance(control, treatments, config.confidence_level)?;
    let raw_p: Vec<f64> = results.values().map(|r| r.p_value).collect();
    let adjusted = adjust_p_values(&raw_p, config.correction);
    let alpha = 1.0 - config.confidence_level;

    let comparisons: Vec<TreatmentComparison> = results
        .into_iter()
        .zip(adjusted)
        .map(|((variation_key, significance), adjusted_p_value)| TreatmentComparison {
            variation_key,
            significance,
            adjusted_p_value,
            is_significant_adjusted: adjusted_p_value < alpha,
        })
        .collect();

    let baseline = control.conversion_rate();
    // Outside (0, 1) there is nothing to plan from and the gate stays open.
    // Inside it, a failed plan keeps the gate closed.
    let planned = if baseline > 0.0 && baseline < 1.0 {
        calculate_required_sample_size(
            baseline,
            config.minimum_detectable_effect,
            config.confidence_level,
            config.power,
        )
        .map(Some)
        .map_err(|e| {
            tracing::warn!(baseline, error = %e, "no sample size plan for observed baseline");
        })
    } else {
        Ok(None)
    };
    let (required_participants_per_arm, sample_size_reached) = match planned {
        Ok(Some(n)) => (Some(n), arms.iter().all(|a| a.participants >= n)),
        Ok(None) => (None, true),
        Err(()) => (None, false),
    };

    let winner = if sample_size_reached && !srm.has_mismatch {
        pick_winner(&control.variation_key, &comparisons)
    } else {
        None
    };

    let recommendation = if arms.iter().all(|a| a.participants == 0) {
        "No participants yet. Start collecting traffic before reading results.".to_string()
    } else if srm.has_mismatch {
        "Sample ratio mismatch detected: investigate assignment before declaring a winner."
            .to_string()
    } else if !sample_size_reached {
        match required_participants_per_arm {
            Some(needed) => format!(
                "Not enough data yet: {} participants per arm are needed to detect a {:.1}% lift.",
                needed,
                config.minimum_detectable_effect * 100.0
            ),
            None => format!(
                "Cannot size this experiment: a {:.1}% lift on the observed {:.2}% control rate \
                 has no valid sample size. Lower minimumDetectableEffect before reading results.",
                config.minimum_detectable_effect * 100.0,
                baseline * 100.0
            ),
        }
    } else if let Some(w) = &winner {
        format!("Statistically significant result: {} wins.", w)
    } else {
        "Not yet statistically significant. Consider continuing the experiment.".to_string()
    };

    tracing::debug!(
        control = %control.variation_key,
        treatments = comparisons.len(),
        srm_mismatch = srm.has_mismatch,
        winner = ?winner,
        "analyzed experiment"
    );

    Ok(ExperimentAnalysis {
        control_key: control.variation_key.clone(),
        srm,
        srm_severity: severity,
        correction: config.correction,
        comparisons,
        required_participants_per_arm,
        sample_size_reached,
        winner,
        recommendation,
    })
}

/// Best significantly-better treatment; the control when every significant
/// treatment lost; otherwise nobody.
fn pick_winner(control_key: &str, comparisons: &[TreatmentComparison]) -> Option<String> {
    let significant: Vec<&TreatmentComparison> = comparisons
        .iter()
        .filter(|c| c.is_significant_adjusted)
        .collect();

    let best = significant
        .iter()
        .filter(|c| {
            c.significance.treatment_conversion_rate > c.significance.control_conversion_rate
        })
        .max_by(|a, b| {
            a.significance
                .treatment_conversion_rate
                .total_cmp(&b.significance.treatment_conversion_rate)
        });

    match best {
        Some(c) => Some(c.variation_key.clone()),
        None if !significant.is_empty() => Some(control_key.to_string()),
        None => None,
    }
}
