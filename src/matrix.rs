//! Genes × cells containers shared by the simulation, normalization and summary layers.
//!
//! All matrices in this crate are laid out with genes on rows and cells on columns. Per-gene
//! statistics reduce along [`Axis(1)`](ndarray::Axis), per-cell normalization works on columns.

use crate::error::{Result, SimulationError};
use nalgebra_sparse::CsrMatrix;
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use num_traits::AsPrimitive;

/// Read access to a nonnegative genes × cells matrix.
///
/// Implemented for simulated [`CountMatrix`] values, normalized matrices, and plain dense
/// `ndarray` matrices supplied by callers (the real-data entry point).
pub trait ExpressionMatrix: Sync {
    type Elem: AsPrimitive<f64> + Send + Sync;

    fn expression(&self) -> ArrayView2<'_, Self::Elem>;

    fn n_genes(&self) -> usize {
        self.expression().nrows()
    }

    fn n_cells(&self) -> usize {
        self.expression().ncols()
    }
}

impl<A> ExpressionMatrix for Array2<A>
where
    A: AsPrimitive<f64> + Send + Sync,
{
    type Elem = A;

    fn expression(&self) -> ArrayView2<'_, A> {
        self.view()
    }
}

impl<A> ExpressionMatrix for ArrayView2<'_, A>
where
    A: AsPrimitive<f64> + Send + Sync,
{
    type Elem = A;

    fn expression(&self) -> ArrayView2<'_, A> {
        self.view()
    }
}

/// Integer counts, genes × cells. Column `j` is the count vector of cell `j`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMatrix {
    counts: Array2<u64>,
}

impl CountMatrix {
    pub fn from_array(counts: Array2<u64>) -> Self {
        CountMatrix { counts }
    }

    /// Assemble a matrix from per-cell count vectors, preserving their order.
    pub fn from_columns(n_genes: usize, columns: &[Vec<u64>]) -> Result<Self> {
        let mut counts = Array2::<u64>::zeros((n_genes, columns.len()));
        for (cell, column) in columns.iter().enumerate() {
            if column.len() != n_genes {
                return Err(SimulationError::DimensionMismatch(format!(
                    "cell {} has {} genes, expected {}",
                    cell,
                    column.len(),
                    n_genes
                )));
            }
            counts
                .column_mut(cell)
                .assign(&ArrayView1::from(column.as_slice()));
        }
        Ok(CountMatrix { counts })
    }

    pub fn view(&self) -> ArrayView2<'_, u64> {
        self.counts.view()
    }

    pub fn column(&self, cell: usize) -> ArrayView1<'_, u64> {
        self.counts.column(cell)
    }

    /// Total count of every cell, in column order.
    pub fn column_totals(&self) -> Vec<u64> {
        self.counts.sum_axis(Axis(0)).to_vec()
    }

    pub fn into_inner(self) -> Array2<u64> {
        self.counts
    }
}

impl ExpressionMatrix for CountMatrix {
    type Elem = u64;

    fn expression(&self) -> ArrayView2<'_, u64> {
        self.counts.view()
    }
}

/// Densify a cells × genes sparse matrix (the usual orientation of parsed single-cell data)
/// into the genes × cells layout used throughout this crate.
///
/// Entries must be finite and nonnegative.
pub fn csr_to_genes_by_cells(matrix: &CsrMatrix<f64>) -> Result<Array2<f64>> {
    let mut dense = Array2::<f64>::zeros((matrix.ncols(), matrix.nrows()));
    for (cell, gene, &value) in matrix.triplet_iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::InvalidParameters(format!(
                "entry for cell {} gene {} is {}, expected a finite nonnegative value",
                cell, gene, value
            )));
        }
        dense[[gene, cell]] = value;
    }
    Ok(dense)
}
