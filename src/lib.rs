//! Statistical inference for A/B experiments over aggregated counts.
//!
//! Given per-variation participant and conversion counts, `splitstat`
//! computes two-proportion z-tests with confidence intervals and relative
//! lift, sample ratio mismatch diagnostics, and required sample sizes.
//! Every entry point is a pure function; nothing is stored between calls.
//!
//! ```
//! use splitstat::{calculate_significance, VariationData};
//!
//! let control = VariationData::new("control", 1000, 100);
//! let treatment = VariationData::new("treatment", 1000, 120);
//! let result = calculate_significance(&control, &treatment, 0.95).unwrap();
//! assert!((result.relative_lift - 0.2).abs() < 1e-9);
//! ```

pub mod error;
pub mod experiments;
pub mod types;

pub use error::{Result, StatsError};
pub use experiments::analysis::{analyze_experiment, ExperimentAnalysis, TreatmentComparison};
pub use experiments::config::AnalysisConfig;
pub use experiments::correction::{adjust_p_values, Correction};
pub use experiments::critical::z_critical;
pub use experiments::sample_size::{
    calculate_required_sample_size, plan_sample_size, SampleSizePlan, DEFAULT_POWER,
};
pub use experiments::significance::{
    calculate_multiple_significance, calculate_significance, DEFAULT_CONFIDENCE_LEVEL,
};
pub use experiments::special::{
    chi_squared_cdf, inverse_erf, ln_gamma, lower_incomplete_gamma_regularized, normal_cdf,
    normal_sf, CONVERGENCE_EPSILON, MAX_ITERATIONS,
};
pub use experiments::srm::{check_srm, srm_severity, SrmSeverity, DEFAULT_SRM_THRESHOLD};
pub use types::{MetricAggregate, SignificanceResult, SrmResult, VariationData};
