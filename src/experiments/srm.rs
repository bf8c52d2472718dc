//! Sample ratio mismatch detection.
//!
//! A chi-squared goodness-of-fit test of observed participant counts against
//! the designed traffic split. A mismatch points at assignment or logging bugs,
//! so the default threshold (p < 0.01) is stricter than the usual 0.05.

use serde::{Deserialize, Serialize};

use super::critical::is_open_unit;
use super::special::chi_squared_cdf;
use crate::error::{Result, StatsError};
use crate::types::{SrmResult, VariationData};

pub const DEFAULT_SRM_THRESHOLD: f64 = 0.01;

/// Allowed deviation of `sum(expected_ratios)` from 1.
pub const RATIO_SUM_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SrmSeverity {
    None,
    Warning,
    Serious,
    Critical,
}

impl SrmSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SrmSeverity::None => "None",
            SrmSeverity::Warning => "Warning",
            SrmSeverity::Serious => "Serious",
            SrmSeverity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for SrmSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buckets an SRM p-value: >= 0.1 None, >= 0.01 Warning, >= 0.001 Serious,
/// otherwise Critical.
pub fn srm_severity(p_value: f64) -> SrmSeverity {
    if p_value >= 0.1 {
        SrmSeverity::None
    } else if p_value >= 0.01 {
        SrmSeverity::Warning
    } else if p_value >= 0.001 {
        SrmSeverity::Serious
    } else {
        SrmSeverity::Critical
    }
}

fn validate_inputs(
    variations: &[VariationData],
    expected_ratios: &[f64],
    threshold: f64,
) -> Result<()> {
    if variations.len() != expected_ratios.len() {
        return Err(StatsError::invalid(format!(
            "expected {} ratios for {} variations, got {}",
            variations.len(),
            variations.len(),
            expected_ratios.len()
        )));
    }
    if let Some(bad) = expected_ratios.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(StatsError::invalid(format!(
            "expected ratios must be finite and non-negative, got {}",
            bad
        )));
    }
    let sum: f64 = expected_ratios.iter().sum();
    if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
        return Err(StatsError::invalid(format!(
            "expected ratios must sum to 1 (±{}), got {}",
            RATIO_SUM_TOLERANCE, sum
        )));
    }
    if !is_open_unit(threshold) {
        return Err(StatsError::invalid(format!(
            "SRM threshold must be in (0, 1), got {}",
            threshold
        )));
    }
    Ok(())
}

/// Checks whether observed traffic deviates from `expected_ratios`.
///
/// `expected_ratios[i]` is the designed share of `variations[i]`. Variations
/// with a zero expected share are left out of the statistic; if such a
/// variation nonetheless received participants the result carries a warning.
/// With no participants at all, a neutral result with a warning is returned.
///
/// # Errors
///
/// Returns [`StatsError::InvalidArgument`] when the lengths differ, a ratio is
/// negative or non-finite, the ratios do not sum to 1 within
/// [`RATIO_SUM_TOLERANCE`], `threshold` is outside (0, 1), or the participant
/// counts do not sum within `u64`.
pub fn check_srm(
    variations: &[VariationData],
    expected_ratios: &[f64],
    threshold: f64,
) -> Result<SrmResult> {
    validate_inputs(variations, expected_ratios, threshold)?;

    let total = variations
        .iter()
        .try_fold(0u64, |acc, v| acc.checked_add(v.participants))
        .ok_or_else(|| StatsError::invalid("total participant count overflows u64"))?;
    if total == 0 {
        tracing::debug!(variations = variations.len(), "no participants for SRM check");
        return Ok(SrmResult {
            has_mismatch: false,
            p_value: 1.0,
            expected_ratios: expected_ratios.to_vec(),
            observed_ratios: vec![0.0; variations.len()],
            chi_squared: 0.0,
            warning: Some("No participants yet; there is no data to analyze for SRM.".to_string()),
        });
    }

    let total_f = total as f64;
    let observed_ratios: Vec<f64> = variations
        .iter()
        .map(|v| v.participants as f64 / total_f)
        .collect();

    let mut chi_squared = 0.0;
    let mut unexpected_traffic: Vec<&str> = Vec::new();
    for (v, &ratio) in variations.iter().zip(expected_ratios) {
        let expected = ratio * total_f;
        if expected > 0.0 {
            chi_squared += (v.participants as f64 - expected).powi(2) / expected;
        } else if v.participants > 0 {
            unexpected_traffic.push(&v.variation_key);
        }
    }

    let df = variations.len().saturating_sub(1);
    let p_value = if df == 0 {
        1.0
    } else {
        (1.0 - chi_squared_cdf(chi_squared, df as f64)).clamp(0.0, 1.0)
    };
    let has_mismatch = p_value < threshold;

    let mut warnings = Vec::new();
    if has_mismatch {
        tracing::warn!(
            chi_squared,
            p_value,
            severity = %srm_severity(p_value),
            "sample ratio mismatch detected"
        );
        warnings.push(format!(
            "Sample ratio mismatch detected (p = {:.6}, severity {}): the observed traffic split \
             deviates from the expected split. Investigate assignment and logging before trusting results.",
            p_value,
            srm_severity(p_value)
        ));
    }
    if !unexpected_traffic.is_empty() {
        tracing::warn!(
            variations = ?unexpected_traffic,
            "participants routed to variations with zero expected share"
        );
        warnings.push(format!(
            "Variations with a zero expected share received participants and were excluded \
             from the chi-squared statistic: {}.",
            unexpected_traffic.join(", ")
        ));
    }

    tracing::debug!(chi_squared, p_value, has_mismatch, "computed SRM check");

    Ok(SrmResult {
        has_mismatch,
        p_value,
        expected_ratios: expected_ratios.to_vec(),
        observed_ratios,
        chi_squared,
        warning: if warnings.is_empty() {
            None
        } else {
            Some(warnings.join(" "))
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arms(counts: &[u64]) -> Vec<VariationData> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &n)| VariationData::new(format!("v{}", i), n, 0))
            .collect()
    }

    // ── Detection ───────────────────────────────────────────────────

    #[test]
    fn srm_not_detected_for_perfect_50_50() {
        let r = check_srm(&arms(&[5000, 5000]), &[0.5, 0.5], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(!r.has_mismatch);
        assert_eq!(r.chi_squared, 0.0);
        assert!((r.p_value - 1.0).abs() < 1e-9, "p={}", r.p_value);
        assert!(r.warning.is_none());
    }

    #[test]
    fn srm_detected_for_60_40_split() {
        let r = check_srm(&arms(&[6000, 4000]), &[0.5, 0.5], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(r.has_mismatch);
        assert!((r.chi_squared - 400.0).abs() < 1e-9);
        assert!(r.p_value < 1e-6, "p={}", r.p_value);
        assert!(r.warning.as_deref().unwrap().contains("Sample ratio mismatch"));
    }

    #[test]
    fn srm_threshold_is_p_001_not_p_005() {
        // chi2 = 4.0, p ≈ 0.0455: flagged at 0.05, not at 0.01
        let r = check_srm(&arms(&[4900, 5100]), &[0.5, 0.5], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(!r.has_mismatch, "p={}", r.p_value);
        assert!((r.p_value - 0.0455).abs() < 1e-3, "p={}", r.p_value);
        let r = check_srm(&arms(&[4900, 5100]), &[0.5, 0.5], 0.05).unwrap();
        assert!(r.has_mismatch);
    }

    #[test]
    fn uneven_design_split_is_respected() {
        let r = check_srm(&arms(&[4000, 6000]), &[0.4, 0.6], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(!r.has_mismatch);
        assert!(r.chi_squared.abs() < 1e-9);
    }

    #[test]
    fn three_way_split_uses_two_degrees_of_freedom() {
        // chi2 = 8, df = 2 → p = exp(-4)
        let r = check_srm(&arms(&[2600, 2400, 5000]), &[0.25, 0.25, 0.5], DEFAULT_SRM_THRESHOLD)
            .unwrap();
        assert!((r.chi_squared - 8.0).abs() < 1e-9);
        assert!((r.p_value - (-4.0f64).exp()).abs() < 1e-8, "p={}", r.p_value);
        assert!(!r.has_mismatch);
    }

    #[test]
    fn observed_ratios_sum_to_one() {
        let r = check_srm(&arms(&[123, 456, 789]), &[0.3, 0.3, 0.4], DEFAULT_SRM_THRESHOLD).unwrap();
        let sum: f64 = r.observed_ratios.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "sum={}", sum);
        assert_eq!(r.expected_ratios, vec![0.3, 0.3, 0.4]);
    }

    // ── Degenerate inputs ───────────────────────────────────────────

    #[test]
    fn zero_participants_returns_neutral_result_with_warning() {
        let r = check_srm(&arms(&[0, 0, 0]), &[0.2, 0.3, 0.5], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(!r.has_mismatch);
        assert_eq!(r.p_value, 1.0);
        assert_eq!(r.chi_squared, 0.0);
        assert_eq!(r.observed_ratios, vec![0.0, 0.0, 0.0]);
        assert!(r.warning.is_some());
    }

    #[test]
    fn zero_expected_share_is_skipped_but_warned() {
        let r = check_srm(&arms(&[1000, 1000, 100]), &[0.5, 0.5, 0.0], DEFAULT_SRM_THRESHOLD)
            .unwrap();
        // 2100 total, 1050 expected per live arm
        let expected_chi = 2.0 * 50.0f64.powi(2) / 1050.0;
        assert!((r.chi_squared - expected_chi).abs() < 1e-9);
        assert!(!r.has_mismatch, "p={}", r.p_value);
        assert!(r.warning.as_deref().unwrap().contains("v2"));
    }

    #[test]
    fn single_variation_never_mismatches() {
        let r = check_srm(&arms(&[10_000]), &[1.0], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(!r.has_mismatch);
        assert_eq!(r.p_value, 1.0);
    }

    // ── Validation ──────────────────────────────────────────────────

    #[test]
    fn length_mismatch_is_rejected() {
        let err = check_srm(&arms(&[10, 10]), &[0.5, 0.25, 0.25], DEFAULT_SRM_THRESHOLD).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn ratios_must_sum_to_one() {
        assert!(check_srm(&arms(&[10, 10]), &[0.5, 0.6], DEFAULT_SRM_THRESHOLD).is_err());
        assert!(check_srm(&arms(&[10, 10]), &[0.5, 0.4985], DEFAULT_SRM_THRESHOLD).is_err());
        // within tolerance
        assert!(check_srm(&arms(&[10, 10]), &[0.5, 0.4995], DEFAULT_SRM_THRESHOLD).is_ok());
        assert!(check_srm(&arms(&[10, 10, 10]), &[0.3333, 0.3333, 0.3334], DEFAULT_SRM_THRESHOLD).is_ok());
    }

    #[test]
    fn negative_ratio_is_rejected() {
        let err = check_srm(&arms(&[10, 10]), &[1.5, -0.5], DEFAULT_SRM_THRESHOLD).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(check_srm(&[], &[], DEFAULT_SRM_THRESHOLD).is_err());
    }

    #[test]
    fn overflowing_participant_total_is_rejected() {
        let err = check_srm(&arms(&[u64::MAX, 1]), &[0.5, 0.5], DEFAULT_SRM_THRESHOLD)
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("overflows"));
    }

    #[test]
    fn largest_representable_total_is_accepted() {
        let r = check_srm(&arms(&[u64::MAX - 1, 1]), &[0.5, 0.5], DEFAULT_SRM_THRESHOLD).unwrap();
        assert!(r.has_mismatch);
        assert!((0.0..=1.0).contains(&r.p_value));
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert!(check_srm(&arms(&[10, 10]), &[0.5, 0.5], 0.0).is_err());
        assert!(check_srm(&arms(&[10, 10]), &[0.5, 0.5], 1.0).is_err());
    }

    // ── Severity ────────────────────────────────────────────────────

    #[test]
    fn severity_buckets() {
        assert_eq!(srm_severity(0.5), SrmSeverity::None);
        assert_eq!(srm_severity(0.1), SrmSeverity::None);
        assert_eq!(srm_severity(0.05), SrmSeverity::Warning);
        assert_eq!(srm_severity(0.01), SrmSeverity::Warning);
        assert_eq!(srm_severity(0.005), SrmSeverity::Serious);
        assert_eq!(srm_severity(0.001), SrmSeverity::Serious);
        assert_eq!(srm_severity(0.0009), SrmSeverity::Critical);
        assert_eq!(srm_severity(0.0), SrmSeverity::Critical);
    }

    #[test]
    fn severity_displays_and_serializes_by_name() {
        assert_eq!(SrmSeverity::Serious.to_string(), "Serious");
        assert_eq!(
            serde_json::to_string(&SrmSeverity::Critical).unwrap(),
            "\"Critical\""
        );
    }
}
