use crate::error::Result;
use crate::matrix::ExpressionMatrix;
use crate::normalization::{to_cpm, to_fraction, to_scaled_fraction};
use crate::summary::theoretical::fit_dispersion;
use crate::summary::{GeneSummary, SummaryStatistics, TheoreticalCurve};
use log::{debug, info};

/// Per-gene summaries of one matrix at every normalization level.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizationReport {
    pub raw: Vec<GeneSummary>,
    pub fraction: Vec<GeneSummary>,
    pub cpm: Vec<GeneSummary>,
    pub scaled: Vec<GeneSummary>,
    pub scale_factor: f64,
}

impl NormalizationReport {
    /// Negative binomial curve fitted to the raw counts, or `None` if nothing was observed.
    pub fn fitted_curve(&self) -> Option<TheoreticalCurve> {
        fit_dispersion(&self.raw).map(|phi| TheoreticalCurve::NegativeBinomial { phi })
    }

    /// Median variance/mean ratio of genes whose mean exceeds `min_mean` in each level,
    /// in the order raw, fraction, CPM, scaled.
    pub fn median_dispersion_ratios(&self, min_mean: f64) -> [Option<f64>; 4] {
        [&self.raw, &self.fraction, &self.cpm, &self.scaled]
            .map(|level| median_dispersion_ratio(level, min_mean))
    }
}

/// Summarize `matrix` as raw values, per-cell fractions, CPM and fractions scaled by
/// `scale_factor`. Works for simulated counts and for caller supplied matrices alike.
pub fn compare_normalizations<M>(matrix: &M, scale_factor: f64) -> Result<NormalizationReport>
where
    M: ExpressionMatrix + ?Sized,
{
    info!(
        "Summarizing {} genes x {} cells at four normalization levels",
        matrix.n_genes(),
        matrix.n_cells()
    );
    let raw = matrix.summarize()?;
    debug!("Raw summaries done");
    let fraction = to_fraction(matrix)?.summarize()?;
    let cpm = to_cpm(matrix)?.summarize()?;
    let scaled = to_scaled_fraction(matrix, scale_factor)?.summarize()?;
    debug!("Normalized summaries done (scale factor {})", scale_factor);

    Ok(NormalizationReport {
        raw,
        fraction,
        cpm,
        scaled,
        scale_factor,
    })
}

fn median_dispersion_ratio(summaries: &[GeneSummary], min_mean: f64) -> Option<f64> {
    let mut ratios: Vec<f64> = summaries
        .iter()
        .filter(|s| s.mean > min_mean)
        .filter_map(GeneSummary::dispersion_ratio)
        .collect();
    if ratios.is_empty() {
        return None;
    }
    ratios.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = ratios.len() / 2;
    if ratios.len() % 2 == 0 {
        Some((ratios[mid - 1] + ratios[mid]) / 2.0)
    } else {
        Some(ratios[mid])
    }
}
