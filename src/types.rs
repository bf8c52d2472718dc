use serde::{Deserialize, Serialize};

/// Variation identifier, e.g. `"control"` or `"treatment-a"`.
pub type VariationKey = String;

/// Aggregated counts for one arm of an experiment.
///
/// Built by the caller from its own event store for each analysis request.
/// `conversions <= participants` is not enforced by the calculators; call
/// [`VariationData::validate`] when strict input is wanted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariationData {
    pub variation_key: VariationKey,
    pub participants: u64,
    pub conversions: u64,
}

impl VariationData {
    pub fn new(variation_key: impl Into<String>, participants: u64, conversions: u64) -> Self {
        Self {
            variation_key: variation_key.into(),
            participants,
            conversions,
        }
    }

    /// Conversion rate, or 0.0 when the arm has no participants.
    pub fn conversion_rate(&self) -> f64 {
        if self.participants == 0 {
            0.0
        } else {
            self.conversions as f64 / self.participants as f64
        }
    }

    /// Strict input check.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StatsError::InvalidArgument`] when `conversions`
    /// exceeds `participants`.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.conversions > self.participants {
            return Err(crate::StatsError::invalid(format!(
                "variation {}: conversions ({}) exceed participants ({})",
                self.variation_key, self.conversions, self.participants
            )));
        }
        Ok(())
    }
}

/// Per-metric aggregate supplied by the storage layer.
///
/// For binary metrics `count` is the number of converting units and
/// `sample_size` the number of exposed units. For continuous metrics `sum`
/// carries the total value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricAggregate {
    pub sum: f64,
    pub count: u64,
    pub sample_size: u64,
}

impl MetricAggregate {
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn to_variation_data(&self, variation_key: impl Into<String>) -> VariationData {
        VariationData::new(variation_key, self.sample_size, self.count)
    }
}

/// Outcome of a two-proportion z-test between a control and one treatment.
///
/// `confidence_interval` is the Wald interval for the treatment rate, clamped
/// to [0, 1]. It serializes as a two-element array `[low, high]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignificanceResult {
    pub p_value: f64,
    pub is_significant: bool,
    pub z_score: f64,
    pub confidence_interval: (f64, f64),
    pub relative_lift: f64,
    pub control_conversion_rate: f64,
    pub treatment_conversion_rate: f64,
}

impl SignificanceResult {
    /// Neutral result used when either arm has no participants.
    pub fn no_evidence() -> Self {
        Self {
            p_value: 1.0,
            is_significant: false,
            z_score: 0.0,
            confidence_interval: (0.0, 0.0),
            relative_lift: 0.0,
            control_conversion_rate: 0.0,
            treatment_conversion_rate: 0.0,
        }
    }
}

/// Outcome of a sample ratio mismatch check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrmResult {
    pub has_mismatch: bool,
    pub p_value: f64,
    pub expected_ratios: Vec<f64>,
    pub observed_ratios: Vec<f64>,
    pub chi_squared: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}
