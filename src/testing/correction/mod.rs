use anyhow::{Result, anyhow};
use std::cmp::Ordering;

/// Multiple testing correction applied to per-gene p-values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    None,
    Bonferroni,
    Holm,
    BenjaminiHochberg,
}

impl Correction {
    pub fn name(&self) -> &'static str {
        match self {
            Correction::None => "none",
            Correction::Bonferroni => "bonferroni",
            Correction::Holm => "holm",
            Correction::BenjaminiHochberg => "benjamini_hochberg",
        }
    }

    /// Adjust `p_values`, or return `None` for [`Correction::None`].
    pub fn apply(&self, p_values: &[f64]) -> Result<Option<Vec<f64>>> {
        match self {
            Correction::None => Ok(None),
            Correction::Bonferroni => bonferroni_correction(p_values).map(Some),
            Correction::Holm => holm_bonferroni_correction(p_values).map(Some),
            Correction::BenjaminiHochberg => benjamini_hochberg_correction(p_values).map(Some),
        }
    }
}

fn validate_p_values(p_values: &[f64]) -> Result<()> {
    if p_values.is_empty() {
        return Err(anyhow!("Empty p-value array"));
    }
    for (i, &p) in p_values.iter().enumerate() {
        if !(0.0..=1.0).contains(&p) {
            return Err(anyhow!("Invalid p-value at index {}: {}", i, p));
        }
    }
    Ok(())
}

fn sorted_ascending(p_values: &[f64]) -> Vec<(usize, f64)> {
    let mut indexed: Vec<(usize, f64)> =
        p_values.iter().enumerate().map(|(i, &p)| (i, p)).collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    indexed
}

/// Multiply each p-value by the number of tests, capped at 1.
pub fn bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len() as f64;
    Ok(p_values.iter().map(|&p| (p * n).min(1.0)).collect())
}

/// Holm's step-down procedure, controlling the family-wise error rate.
pub fn holm_bonferroni_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let indexed = sorted_ascending(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut running_max: f64 = 0.0;
    for (i, &(orig_idx, p_val)) in indexed.iter().enumerate() {
        let adjustment = (p_val * (n - i) as f64).min(1.0);
        running_max = running_max.max(adjustment);
        adjusted_p_values[orig_idx] = running_max;
    }
    Ok(adjusted_p_values)
}

/// Benjamini-Hochberg step-up procedure, controlling the false discovery rate.
pub fn benjamini_hochberg_correction(p_values: &[f64]) -> Result<Vec<f64>> {
    validate_p_values(p_values)?;
    let n = p_values.len();
    let indexed = sorted_ascending(p_values);

    let mut adjusted_p_values = vec![0.0; n];
    let mut current_min: f64 = 1.0;

    // largest p-value first
    for i in (0..n).rev() {
        let (orig_idx, p_val) = indexed[i];
        let rank = i + 1;
        let adjustment = (p_val * n as f64 / rank as f64).min(1.0);
        current_min = adjustment.min(current_min);
        adjusted_p_values[orig_idx] = current_min;
    }

    Ok(adjusted_p_values)
}
