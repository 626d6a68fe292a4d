//! Per-gene reductions across cells.
//!
//! Genes are processed in parallel, but the cells of one gene are always summed sequentially
//! in column order, so results are bit-for-bit reproducible regardless of thread count.

use crate::error::{Result, SimulationError};
use ndarray::ArrayView2;
use num_traits::AsPrimitive;
use rayon::prelude::*;

/// Mean and unbiased (n - 1) sample variance of every gene.
///
/// Uses two passes over each row, which avoids the cancellation of the sum-of-squares formula
/// for highly expressed genes.
///
/// # Errors
///
/// `DimensionMismatch` when the matrix has fewer than two cells.
pub fn mean_variance<A>(matrix: ArrayView2<'_, A>) -> Result<Vec<(f64, f64)>>
where
    A: AsPrimitive<f64> + Send + Sync,
{
    let n_cells = matrix.ncols();
    check_cells(n_cells)?;
    if n_cells < 2 {
        return Err(SimulationError::DimensionMismatch(
            "sample variance needs at least two cells".to_string(),
        ));
    }
    let n = n_cells as f64;

    let moments = (0..matrix.nrows())
        .into_par_iter()
        .map(|gene| {
            let row = matrix.row(gene);
            let mean = row.iter().map(|v| -> f64 { v.as_() }).sum::<f64>() / n;
            let sum_sq_dev: f64 = row
                .iter()
                .map(|v| {
                    let value: f64 = v.as_();
                    let dev = value - mean;
                    dev * dev
                })
                .sum();
            (mean, sum_sq_dev / (n - 1.0))
        })
        .collect();

    Ok(moments)
}

/// Fraction of cells in which each gene is exactly zero.
///
/// # Errors
///
/// `DimensionMismatch` when the matrix has no cells.
pub fn dropout_probability<A>(matrix: ArrayView2<'_, A>) -> Result<Vec<f64>>
where
    A: AsPrimitive<f64> + Send + Sync,
{
    let n_cells = matrix.ncols();
    check_cells(n_cells)?;
    let n = n_cells as f64;

    let dropout = (0..matrix.nrows())
        .into_par_iter()
        .map(|gene| {
            let zeros = matrix
                .row(gene)
                .iter()
                .filter(|v| -> bool {
                    let value: f64 = v.as_();
                    value == 0.0
                })
                .count();
            zeros as f64 / n
        })
        .collect();

    Ok(dropout)
}

fn check_cells(n_cells: usize) -> Result<()> {
    if n_cells == 0 {
        return Err(SimulationError::DimensionMismatch(
            "matrix has no cells".to_string(),
        ));
    }
    Ok(())
}
