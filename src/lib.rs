//! # single-depthsim
//!
//! Simulation of single-cell count data under constant and variable sequencing depth, part of
//! the single-rust ecosystem.
//!
//! This crate shows how cell-to-cell variation in sequencing depth turns an underlying Poisson
//! expression process into negative-binomial-like count data. It generates a fixed gene
//! abundance profile, samples a depth per cell, draws multinomial count vectors, and compares
//! per-gene means, variances and dropout probabilities across normalization schemes against
//! the closed-form Poisson expectation.
//!
//! ## Core Features
//!
//! - **Reproducible simulation**: per-cell random streams keyed by `(seed, cell index)`, so
//!   parallel and sequential runs give identical matrices
//! - **Normalization**: per-cell fractions, counts-per-million and arbitrarily scaled fractions
//! - **Summary statistics**: per-gene mean, unbiased variance and dropout probability for any
//!   genes × cells matrix, simulated or observed
//! - **Reference curves**: Poisson and negative binomial mean-variance and mean-dropout curves
//! - **Dispersion testing**: per-gene index of dispersion tests with multiple testing correction
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use single_depthsim::simulation::{simulate, DepthPolicy, SimulationConfig};
//! use single_depthsim::summary::compare_normalizations;
//!
//! let config = SimulationConfig::default()
//!     .with_depth_policy(DepthPolicy::Variable { low: 5_000.0, high: 100_000.0 });
//! let output = simulate(&config).unwrap();
//! let report = compare_normalizations(&output.counts, config.normalization_scale_factor).unwrap();
//! println!("{:?}", report.median_dispersion_ratios(10.0));
//! ```
//!
//! ## Module Organization
//!
//! - **[`simulation`]**: gene profiles, depth policies and multinomial count simulation
//! - **[`normalization`]**: fraction, CPM and scaled-fraction transforms
//! - **[`summary`]**: per-gene statistics, normalization reports and theoretical curves
//! - **[`testing`]**: dispersion tests and multiple testing correction
//! - **[`matrix`]**: the genes × cells containers shared by all of the above

pub mod error;
pub mod matrix;
pub mod normalization;
pub mod random;
pub mod simulation;
pub mod summary;
pub mod testing;

pub use error::{Result, SimulationError};
pub use matrix::{CountMatrix, ExpressionMatrix};
pub use random::RandomSource;
