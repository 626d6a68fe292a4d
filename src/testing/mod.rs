//! Hypothesis tests for departures from the Poisson model.
//!
//! The main entry point is [`dispersion::dispersion_test_matrix`], which runs an index of
//! dispersion test on every gene and corrects the p-values for multiple testing.

use std::collections::HashMap;

pub mod correction;
pub mod dispersion;

pub use correction::Correction;
pub use dispersion::{dispersion_test_matrix, index_of_dispersion_test};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alternative {
    TwoSided,
    /// Underdispersion: variance below the mean.
    Less,
    /// Overdispersion: variance above the mean.
    Greater,
}

#[derive(Debug, Clone)]
pub struct TestResult {
    /// The test statistic value
    pub statistic: f64,
    /// The p-value of the test
    pub p_value: f64,
    /// Degrees of freedom of the reference distribution
    pub degrees_of_freedom: Option<f64>,
    /// Effect size measurement (variance/mean ratio for dispersion tests)
    pub effect_size: Option<f64>,
}

impl TestResult {
    /// Create a new test result with minimal information
    pub fn new(statistic: f64, p_value: f64) -> Self {
        TestResult {
            statistic,
            p_value,
            degrees_of_freedom: None,
            effect_size: None,
        }
    }

    pub fn with_effect_size(mut self, effect_size: f64) -> Self {
        self.effect_size = Some(effect_size);
        self
    }

    pub fn with_degrees_of_freedom(mut self, df: f64) -> Self {
        self.degrees_of_freedom = Some(df);
        self
    }

    /// Check if the result is statistically significant at the given threshold
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

#[derive(Debug, Clone)]
pub struct MultipleTestResults {
    /// Test statistics for each gene
    pub statistics: Vec<f64>,
    /// Raw (unadjusted) p-values
    pub p_values: Vec<f64>,
    /// Adjusted p-values (after multiple testing correction)
    pub adjusted_p_values: Option<Vec<f64>>,
    /// Effect sizes (if calculated)
    pub effect_sizes: Option<Vec<f64>>,
    /// Global metadata about the test
    pub global_metadata: HashMap<String, String>,
}

impl MultipleTestResults {
    pub fn new(statistics: Vec<f64>, p_values: Vec<f64>) -> Self {
        MultipleTestResults {
            statistics,
            p_values,
            adjusted_p_values: None,
            effect_sizes: None,
            global_metadata: HashMap::new(),
        }
    }

    pub fn with_adjusted_p_values(mut self, adjusted_p_values: Vec<f64>) -> Self {
        self.adjusted_p_values = Some(adjusted_p_values);
        self
    }

    pub fn with_effect_sizes(mut self, effect_sizes: Vec<f64>) -> Self {
        self.effect_sizes = Some(effect_sizes);
        self
    }

    pub fn with_global_metadata(mut self, key: &str, value: &str) -> Self {
        self.global_metadata
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Indices of significant genes, using adjusted p-values when present
    pub fn significant_indices(&self, alpha: f64) -> Vec<usize> {
        self.reported_p_values()
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| if p < alpha { Some(i) } else { None })
            .collect()
    }

    pub fn num_significant(&self, alpha: f64) -> usize {
        self.significant_indices(alpha).len()
    }

    /// Top n genes by (adjusted) p-value
    pub fn top_features(&self, n: usize) -> Vec<usize> {
        let p_values = self.reported_p_values();
        let mut indices: Vec<usize> = (0..p_values.len()).collect();
        indices.sort_by(|&a, &b| {
            p_values[a]
                .partial_cmp(&p_values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        indices.truncate(n);
        indices
    }

    fn reported_p_values(&self) -> &[f64] {
        match &self.adjusted_p_values {
            Some(adj_p) => adj_p,
            None => &self.p_values,
        }
    }
}
