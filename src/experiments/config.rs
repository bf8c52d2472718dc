use serde::{Deserialize, Serialize};

use super::correction::Correction;
use super::critical::is_open_unit;
use super::sample_size::DEFAULT_POWER;
use super::significance::DEFAULT_CONFIDENCE_LEVEL;
use super::srm::DEFAULT_SRM_THRESHOLD;
use crate::error::{Result, StatsError};

pub const DEFAULT_MINIMUM_DETECTABLE_EFFECT: f64 = 0.05;

fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

fn default_power() -> f64 {
    DEFAULT_POWER
}

fn default_minimum_detectable_effect() -> f64 {
    DEFAULT_MINIMUM_DETECTABLE_EFFECT
}

fn default_srm_threshold() -> f64 {
    DEFAULT_SRM_THRESHOLD
}

/// Design-time parameters for analysing one experiment.
///
/// Every field has a default, so `{}` is a valid configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisConfig {
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    #[serde(default = "default_power")]
    pub power: f64,
    /// Relative lift the experiment should be able to detect.
    #[serde(default = "default_minimum_detectable_effect")]
    pub minimum_detectable_effect: f64,
    #[serde(default = "default_srm_threshold")]
    pub srm_threshold: f64,
    #[serde(default)]
    pub correction: Correction,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            power: DEFAULT_POWER,
            minimum_detectable_effect: DEFAULT_MINIMUM_DETECTABLE_EFFECT,
            srm_threshold: DEFAULT_SRM_THRESHOLD,
            correction: Correction::None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !is_open_unit(self.confidence_level) {
            return Err(StatsError::invalid(
                "confidenceLevel must be in (0.0, 1.0) exclusive",
            ));
        }
        if !is_open_unit(self.power) {
            return Err(StatsError::invalid("power must be in (0.0, 1.0) exclusive"));
        }
        if !(self.minimum_detectable_effect.is_finite() && self.minimum_detectable_effect > 0.0) {
            return Err(StatsError::invalid(
                "minimumDetectableEffect must be a positive number",
            ));
        }
        if !is_open_unit(self.srm_threshold) {
            return Err(StatsError::invalid(
                "srmThreshold must be in (0.0, 1.0) exclusive",
            ));
        }
        Ok(())
    }

    /// Parses a JSON configuration and validates it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
