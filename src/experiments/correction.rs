//! Multiple-comparison adjustment of p-values.
//!
//! Pairwise tests in [`super::significance`] are always reported at the
//! nominal level. Callers comparing several treatments at once can adjust the
//! resulting p-values here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Correction {
    #[default]
    None,
    /// Family-wise error control: `min(1, p·m)`.
    Bonferroni,
    /// False discovery rate control (step-up).
    BenjaminiHochberg,
}

/// Adjusts `p_values` for `p_values.len()` simultaneous comparisons.
///
/// The output is index-aligned with the input and clamped to [0, 1].
pub fn adjust_p_values(p_values: &[f64], correction: Correction) -> Vec<f64> {
    let m = p_values.len();
    match correction {
        Correction::None => p_values.iter().map(|p| p.clamp(0.0, 1.0)).collect(),
        Correction::Bonferroni => p_values
            .iter()
            .map(|p| (p * m as f64).clamp(0.0, 1.0))
            .collect(),
        Correction::BenjaminiHochberg => benjamini_hochberg(p_values),
    }
}

fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted = vec![0.0; m];
    let mut running_min = 1.0_f64;
    // Walk from the largest p-value down so adjusted values stay monotone.
    for (rank, &idx) in order.iter().enumerate().rev() {
        let scaled = p_values[idx] * m as f64 / (rank + 1) as f64;
        running_min = running_min.min(scaled);
        adjusted[idx] = running_min.clamp(0.0, 1.0);
    }
    adjusted
}
