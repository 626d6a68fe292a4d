//! Per-cell normalization transforms.
//!
//! Every transform divides each cell's column by its total count and multiplies by a fixed
//! scale: 1 for fractions, one million for CPM, and a caller chosen factor for scaled
//! fractions. A cell with a total of zero is reported as
//! [`SimulationError::ZeroDepthCell`] instead of producing NaN columns.

use crate::error::{Result, SimulationError};
use crate::matrix::ExpressionMatrix;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView2, Axis};
use num_traits::AsPrimitive;
use rayon::prelude::*;

/// Scale of counts-per-million.
pub const CPM_SCALE: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    Fraction,
    CountsPerMillion,
    ScaledFraction(f64),
}

impl Normalization {
    pub fn scale(&self) -> f64 {
        match *self {
            Normalization::Fraction => 1.0,
            Normalization::CountsPerMillion => CPM_SCALE,
            Normalization::ScaledFraction(scale) => scale,
        }
    }
}

/// Real-valued genes × cells matrix derived from counts by one [`Normalization`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMatrix {
    values: Array2<f64>,
    normalization: Normalization,
}

impl NormalizedMatrix {
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    pub fn into_inner(self) -> Array2<f64> {
        self.values
    }
}

impl ExpressionMatrix for NormalizedMatrix {
    type Elem = f64;

    fn expression(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

pub fn to_fraction<M>(matrix: &M) -> Result<NormalizedMatrix>
where
    M: ExpressionMatrix + ?Sized,
{
    normalize(matrix, Normalization::Fraction)
}

pub fn to_cpm<M>(matrix: &M) -> Result<NormalizedMatrix>
where
    M: ExpressionMatrix + ?Sized,
{
    normalize(matrix, Normalization::CountsPerMillion)
}

pub fn to_scaled_fraction<M>(matrix: &M, scale_factor: f64) -> Result<NormalizedMatrix>
where
    M: ExpressionMatrix + ?Sized,
{
    if !scale_factor.is_finite() || scale_factor <= 0.0 {
        return Err(SimulationError::InvalidParameters(format!(
            "scale factor must be positive and finite, got {}",
            scale_factor
        )));
    }
    normalize(matrix, Normalization::ScaledFraction(scale_factor))
}

fn normalize<M>(matrix: &M, normalization: Normalization) -> Result<NormalizedMatrix>
where
    M: ExpressionMatrix + ?Sized,
{
    let view = matrix.expression();
    let totals = column_totals(view)?;
    if let Some(cell) = totals.iter().position(|&total| total == 0.0) {
        return Err(SimulationError::ZeroDepthCell { cell });
    }

    let scale = normalization.scale();
    let mut values: Array2<f64> = view.mapv(|v| v.as_());
    values
        .axis_iter_mut(Axis(1))
        .into_par_iter()
        .zip(totals.par_iter())
        .for_each(|(mut column, &total)| {
            // divide first so fraction * scale is reproduced exactly
            column.mapv_inplace(|v| (v / total) * scale);
        });

    Ok(NormalizedMatrix {
        values,
        normalization,
    })
}

/// Per-cell totals, summed in gene order. Rejects negative or non-finite entries.
fn column_totals<A>(view: ArrayView2<'_, A>) -> Result<Vec<f64>>
where
    A: AsPrimitive<f64> + Send + Sync,
{
    (0..view.ncols())
        .into_par_iter()
        .map(|cell| {
            let mut total = 0.0;
            for (gene, v) in view.column(cell).iter().enumerate() {
                let value: f64 = v.as_();
                if !value.is_finite() || value < 0.0 {
                    return Err(SimulationError::InvalidParameters(format!(
                        "entry for gene {} cell {} is {}, expected a finite nonnegative value",
                        gene, cell, value
                    )));
                }
                total += value;
            }
            Ok(total)
        })
        .collect()
}
