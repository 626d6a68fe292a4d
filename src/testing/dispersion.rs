//! Index of dispersion test against the Poisson model.
//!
//! For a Poisson gene observed in `n` cells, `D = (n - 1) * s^2 / mean` follows a chi-squared
//! distribution with `n - 1` degrees of freedom. Large values of `D` indicate overdispersion,
//! which is what cell-to-cell variation in sequencing depth produces.

use crate::matrix::ExpressionMatrix;
use crate::summary::{GeneSummary, SummaryStatistics};
use crate::testing::correction::Correction;
use crate::testing::{Alternative, MultipleTestResults, TestResult};
use log::debug;
use rayon::prelude::*;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Test one gene given its summary over `n_cells` cells.
///
/// Genes that were never observed carry no information about dispersion and get a statistic
/// of 0 and a p-value of 1.
pub fn index_of_dispersion_test(
    summary: &GeneSummary,
    n_cells: usize,
    alternative: Alternative,
) -> TestResult {
    if n_cells < 2 || summary.mean <= 0.0 {
        return TestResult::new(0.0, 1.0);
    }

    let df = (n_cells - 1) as f64;
    let ratio = summary.variance / summary.mean;
    let statistic = df * ratio;

    let p_value = match ChiSquared::new(df) {
        Ok(chi) => match alternative {
            Alternative::Greater => chi.sf(statistic),
            Alternative::Less => chi.cdf(statistic),
            Alternative::TwoSided => (2.0 * chi.sf(statistic).min(chi.cdf(statistic))).min(1.0),
        },
        Err(_) => 1.0,
    };

    TestResult::new(statistic, p_value.clamp(0.0, 1.0))
        .with_effect_size(ratio)
        .with_degrees_of_freedom(df)
}

/// Index of dispersion test for every gene of `matrix`, with multiple testing correction.
///
/// Effect sizes are the variance/mean ratios (0 for unobserved genes).
pub fn dispersion_test_matrix<M>(
    matrix: &M,
    alternative: Alternative,
    correction: Correction,
) -> anyhow::Result<MultipleTestResults>
where
    M: ExpressionMatrix + ?Sized,
{
    let n_cells = matrix.n_cells();
    let summaries = matrix.summarize()?;
    debug!(
        "Testing dispersion of {} genes over {} cells",
        summaries.len(),
        n_cells
    );

    let results: Vec<TestResult> = summaries
        .par_iter()
        .map(|summary| index_of_dispersion_test(summary, n_cells, alternative))
        .collect();

    let statistics: Vec<f64> = results.iter().map(|r| r.statistic).collect();
    let p_values: Vec<f64> = results.iter().map(|r| r.p_value).collect();
    let effect_sizes: Vec<f64> = results
        .iter()
        .map(|r| r.effect_size.unwrap_or(0.0))
        .collect();

    let mut output = MultipleTestResults::new(statistics, p_values)
        .with_effect_sizes(effect_sizes)
        .with_global_metadata("test_type", "index_of_dispersion")
        .with_global_metadata("correction", correction.name());

    if let Some(adjusted) = correction.apply(&output.p_values)? {
        output = output.with_adjusted_p_values(adjusted);
    }

    Ok(output)
}
