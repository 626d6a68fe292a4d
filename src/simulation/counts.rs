//! Multinomial count simulation.
//!
//! A cell's count vector is one multinomial draw with `round(depth)` trials over the gene
//! profile. The draw is carried out as a chain of conditional binomials: gene `g` receives
//! `Binomial(remaining_trials, w_g / remaining_mass)` molecules, and the last gene with
//! positive weight takes whatever is left. This keeps the column sum exact.

use crate::error::{Result, SimulationError};
use crate::matrix::CountMatrix;
use crate::random::RandomSource;
use crate::simulation::profile::validate_weights;
use log::debug;
use rand::Rng;
use rand_distr::{Binomial, Distribution};
use rayon::prelude::*;

/// Number of multinomial trials used for `depth`: nearest integer, halves away from zero.
///
/// Depth samplers emit real values and this is the only place they are rounded.
pub fn trials_for_depth(depth: f64) -> Result<u64> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(SimulationError::InvalidDepth { cell: None, depth });
    }
    let rounded = depth.round();
    // u64::MAX as f64 is 2^64, which does not fit
    if rounded < 1.0 || rounded >= u64::MAX as f64 {
        return Err(SimulationError::InvalidDepth { cell: None, depth });
    }
    Ok(rounded as u64)
}

/// Simulate the count vector of a single cell.
pub fn simulate_cell<R>(profile: &[f64], depth: f64, rng: &mut R) -> Result<Vec<u64>>
where
    R: Rng + ?Sized,
{
    validate_weights(profile)?;
    let trials = trials_for_depth(depth)?;
    draw_multinomial(profile, trials, rng)
}

/// Simulate one cell per depth, in parallel. Cell `i` draws from `source.stream(i)`, so the
/// result is identical to [`simulate_batch_sequential`] for the same inputs.
pub fn simulate_batch(
    profile: &[f64],
    depths: &[f64],
    source: &RandomSource,
) -> Result<CountMatrix> {
    validate_batch(profile, depths)?;
    simulate_range(profile, depths, 0, source, true)
}

pub fn simulate_batch_sequential(
    profile: &[f64],
    depths: &[f64],
    source: &RandomSource,
) -> Result<CountMatrix> {
    validate_batch(profile, depths)?;
    simulate_range(profile, depths, 0, source, false)
}

/// Simulate cells in chunks of at most `chunk_size` and pass each chunk to `sink` together
/// with the index of its first cell. Only one chunk is held in memory at a time.
///
/// Concatenating the chunks in order gives the same matrix as [`simulate_batch`].
pub fn simulate_batch_chunked<F>(
    profile: &[f64],
    depths: &[f64],
    source: &RandomSource,
    chunk_size: usize,
    mut sink: F,
) -> Result<()>
where
    F: FnMut(usize, CountMatrix) -> Result<()>,
{
    if chunk_size == 0 {
        return Err(SimulationError::InvalidParameters(
            "chunk size must be at least one cell".to_string(),
        ));
    }
    validate_batch(profile, depths)?;

    for (chunk_idx, chunk) in depths.chunks(chunk_size).enumerate() {
        let offset = chunk_idx * chunk_size;
        debug!(
            "Simulating cells {}..{} of {}",
            offset,
            offset + chunk.len(),
            depths.len()
        );
        let counts = simulate_range(profile, chunk, offset, source, true)?;
        sink(offset, counts)?;
    }
    Ok(())
}

fn validate_batch(profile: &[f64], depths: &[f64]) -> Result<()> {
    validate_weights(profile)?;
    if depths.is_empty() {
        return Err(SimulationError::InvalidParameters(
            "at least one depth is required".to_string(),
        ));
    }
    for (cell, &depth) in depths.iter().enumerate() {
        trials_for_depth(depth).map_err(|_| SimulationError::InvalidDepth {
            cell: Some(cell),
            depth,
        })?;
    }
    Ok(())
}

/// Inputs are already validated. `offset` is the global index of `depths[0]`.
fn simulate_range(
    profile: &[f64],
    depths: &[f64],
    offset: usize,
    source: &RandomSource,
    parallel: bool,
) -> Result<CountMatrix> {
    let simulate_one = |(local, &depth): (usize, &f64)| -> Result<Vec<u64>> {
        let mut rng = source.stream((offset + local) as u64);
        draw_multinomial(profile, trials_for_depth(depth)?, &mut rng)
    };

    let columns: Vec<Vec<u64>> = if parallel {
        depths
            .par_iter()
            .enumerate()
            .map(simulate_one)
            .collect::<Result<_>>()?
    } else {
        depths
            .iter()
            .enumerate()
            .map(simulate_one)
            .collect::<Result<_>>()?
    };

    CountMatrix::from_columns(profile.len(), &columns)
}

fn draw_multinomial<R>(weights: &[f64], trials: u64, rng: &mut R) -> Result<Vec<u64>>
where
    R: Rng + ?Sized,
{
    let mut counts = vec![0u64; weights.len()];
    let Some(last) = weights.iter().rposition(|&w| w > 0.0) else {
        return Err(SimulationError::InvalidProfile(
            "profile has no positive weight".to_string(),
        ));
    };

    let mut remaining_trials = trials;
    let mut remaining_mass: f64 = weights.iter().sum();

    for (gene, &weight) in weights.iter().enumerate().take(last) {
        if remaining_trials == 0 {
            break;
        }
        if weight == 0.0 {
            continue;
        }
        let p = if remaining_mass > 0.0 {
            (weight / remaining_mass).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let binomial = Binomial::new(remaining_trials, p).map_err(|e| {
            SimulationError::InvalidProfile(format!(
                "cannot draw gene {} with probability {}: {}",
                gene, p, e
            ))
        })?;
        let drawn = binomial.sample(rng);
        counts[gene] = drawn;
        remaining_trials -= drawn;
        remaining_mass -= weight;
    }
    counts[last] += remaining_trials;

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::ExpressionMatrix;

    #[test]
    fn rounding_policy() {
        assert_eq!(trials_for_depth(10.4).unwrap(), 10);
        assert_eq!(trials_for_depth(10.5).unwrap(), 11);
        assert_eq!(trials_for_depth(1e5).unwrap(), 100_000);
        assert!(matches!(
            trials_for_depth(0.4),
            Err(SimulationError::InvalidDepth { .. })
        ));
        assert!(matches!(
            trials_for_depth(0.0),
            Err(SimulationError::InvalidDepth { .. })
        ));
        assert!(matches!(
            trials_for_depth(f64::INFINITY),
            Err(SimulationError::InvalidDepth { .. })
        ));
        assert!(matches!(
            trials_for_depth(2f64.powi(64)),
            Err(SimulationError::InvalidDepth { .. })
        ));
        assert!(trials_for_depth(2f64.powi(63)).is_ok());
    }

    #[test]
    fn cell_sums_to_rounded_depth() {
        let mut rng = RandomSource::new(3).stream(0);
        let profile = [0.1, 0.2, 0.3, 0.4];
        for depth in [1.0, 7.6, 250.2, 12_345.5] {
            let counts = simulate_cell(&profile, depth, &mut rng).unwrap();
            assert_eq!(counts.iter().sum::<u64>(), depth.round() as u64);
        }
    }

    #[test]
    fn zero_weight_genes_stay_empty() {
        let mut rng = RandomSource::new(3).stream(0);
        let profile = [0.5, 0.0, 0.5, 0.0];
        let counts = simulate_cell(&profile, 10_000.0, &mut rng).unwrap();
        assert_eq!(counts[1], 0);
        assert_eq!(counts[3], 0);
        assert_eq!(counts[0] + counts[2], 10_000);
    }

    #[test]
    fn profile_not_summing_to_one_is_rejected() {
        let mut rng = RandomSource::new(3).stream(0);
        let err = simulate_cell(&[0.3, 0.3, 0.3], 100.0, &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidProfile(_)));

        let err = simulate_cell(&[1.2, -0.2], 100.0, &mut rng).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidProfile(_)));
    }

    #[test]
    fn batch_rejects_non_positive_depth() {
        let source = RandomSource::new(3);
        let err = simulate_batch(&[0.5, 0.5], &[10.0, -1.0], &source).unwrap_err();
        assert_eq!(
            err,
            SimulationError::InvalidDepth {
                cell: Some(1),
                depth: -1.0
            }
        );

        let depths = [10.0, 10.0, 10.0, 0.2];
        let result = simulate_batch_chunked(&[0.5, 0.5], &depths, &source, 2, |_, _| Ok(()));
        assert_eq!(
            result.unwrap_err(),
            SimulationError::InvalidDepth {
                cell: Some(3),
                depth: 0.2
            }
        );

        let mut rng = source.stream(0);
        assert_eq!(
            simulate_cell(&[0.5, 0.5], 0.0, &mut rng).unwrap_err(),
            SimulationError::InvalidDepth {
                cell: None,
                depth: 0.0
            }
        );
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let source = RandomSource::new(99);
        let profile = [0.05, 0.15, 0.3, 0.5];
        let depths: Vec<f64> = (1..=64).map(|i| 100.0 * i as f64).collect();

        let parallel = simulate_batch(&profile, &depths, &source).unwrap();
        let sequential = simulate_batch_sequential(&profile, &depths, &source).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.n_cells(), 64);
        assert_eq!(parallel.n_genes(), 4);
    }

    #[test]
    fn chunks_concatenate_to_full_batch() {
        let source = RandomSource::new(8);
        let profile = [0.25, 0.25, 0.5];
        let depths = vec![500.0; 10];
        let full = simulate_batch(&profile, &depths, &source).unwrap();

        let mut seen = Vec::new();
        simulate_batch_chunked(&profile, &depths, &source, 4, |offset, chunk| {
            for local in 0..chunk.n_cells() {
                assert_eq!(chunk.column(local), full.column(offset + local));
            }
            seen.push((offset, chunk.n_cells()));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 4), (4, 4), (8, 2)]);

        assert!(simulate_batch_chunked(&profile, &depths, &source, 0, |_, _| Ok(())).is_err());
    }
}
