// End-to-end checks: simulate, normalize, summarize, and compare against the Poisson model.

#[cfg(test)]
mod integration_tests {
    use single_depthsim::matrix::csr_to_genes_by_cells;
    use single_depthsim::simulation::{
        DepthPolicy, GeneProfile, SimulationConfig, simulate, simulate_batch,
        simulate_batch_chunked, simulate_batch_sequential,
    };
    use single_depthsim::summary::theoretical::fit_dispersion;
    use single_depthsim::summary::{GeneSummary, SummaryStatistics, compare_normalizations};
    use single_depthsim::testing::{Alternative, Correction, dispersion_test_matrix};
    use single_depthsim::{CountMatrix, ExpressionMatrix, RandomSource};

    const MIN_MEAN: f64 = 10.0;

    fn ratios_above(summaries: &[GeneSummary], min_mean: f64) -> Vec<f64> {
        summaries
            .iter()
            .filter(|s| s.mean > min_mean)
            .filter_map(GeneSummary::dispersion_ratio)
            .collect()
    }

    #[test]
    fn constant_depth_columns_sum_exactly() {
        let config = SimulationConfig::default()
            .with_genes(300)
            .with_cells(1000)
            .with_depth_policy(DepthPolicy::Constant { depth: 1e5 })
            .with_seed(3);
        let output = simulate(&config).unwrap();

        assert_eq!(output.counts.n_genes(), 300);
        assert_eq!(output.counts.n_cells(), 1000);
        assert!(output.counts.column_totals().iter().all(|&t| t == 100_000));
    }

    #[test]
    fn constant_depth_is_poisson_like() {
        for seed in [1u64, 2, 3] {
            let config = SimulationConfig::default()
                .with_depth_policy(DepthPolicy::Constant { depth: 1e5 })
                .with_seed(seed);
            let output = simulate(&config).unwrap();
            let summaries = output.counts.summarize().unwrap();
            let ratios = ratios_above(&summaries, MIN_MEAN);
            assert!(!ratios.is_empty());

            // sd of a variance/mean ratio over 1000 Poisson cells is about sqrt(2 / 999)
            for &ratio in &ratios {
                assert!(
                    (0.75..1.25).contains(&ratio),
                    "seed {}: ratio {} outside the Poisson band",
                    seed,
                    ratio
                );
            }
            let average = ratios.iter().sum::<f64>() / ratios.len() as f64;
            assert!((average - 1.0).abs() < 0.05, "average ratio {}", average);
        }
    }

    #[test]
    fn variable_depth_is_overdispersed() {
        let config = SimulationConfig::default()
            .with_depth_policy(DepthPolicy::Variable {
                low: 5_000.0,
                high: 100_000.0,
            })
            .with_seed(11);
        let output = simulate(&config).unwrap();
        let summaries = output.counts.summarize().unwrap();
        let ratios = ratios_above(&summaries, MIN_MEAN);
        assert!(!ratios.is_empty());
        let min_ratio = ratios.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(min_ratio > 1.5, "min ratio {}", min_ratio);

        let phi = fit_dispersion(&summaries).unwrap();
        println!("Fitted dispersion under variable depth: {}", phi);
        assert!(phi > 0.0);

        let tests = dispersion_test_matrix(
            &output.counts,
            Alternative::Greater,
            Correction::BenjaminiHochberg,
        )
        .unwrap();
        let expressed: Vec<usize> = summaries
            .iter()
            .enumerate()
            .filter(|(_, s)| s.mean > MIN_MEAN)
            .map(|(i, _)| i)
            .collect();
        let significant = tests.significant_indices(0.05);
        assert!(expressed.iter().all(|g| significant.contains(g)));
    }

    #[test]
    fn constant_depth_rarely_rejects_poisson() {
        let config = SimulationConfig::default().with_seed(21);
        let output = simulate(&config).unwrap();
        let tests = dispersion_test_matrix(
            &output.counts,
            Alternative::Greater,
            Correction::BenjaminiHochberg,
        )
        .unwrap();
        assert!(tests.num_significant(0.05) < 15);
    }

    #[test]
    fn sequential_parallel_and_chunked_runs_agree() {
        let source = RandomSource::new(77);
        let profile = GeneProfile::generate(120, 0.0, 2.0, &mut source.sequential()).unwrap();
        let depths: Vec<f64> = (0..257).map(|i| 1_000.0 + 13.7 * i as f64).collect();

        let parallel = simulate_batch(profile.weights(), &depths, &source).unwrap();
        let sequential = simulate_batch_sequential(profile.weights(), &depths, &source).unwrap();
        assert_eq!(parallel, sequential);

        let mut columns = Vec::new();
        simulate_batch_chunked(profile.weights(), &depths, &source, 50, |_, chunk| {
            for cell in 0..chunk.n_cells() {
                columns.push(chunk.column(cell).to_vec());
            }
            Ok(())
        })
        .unwrap();
        let chunked = CountMatrix::from_columns(profile.len(), &columns).unwrap();
        assert_eq!(parallel, chunked);

        assert_eq!(parallel.summarize().unwrap(), sequential.summarize().unwrap());
    }

    #[test]
    fn repeated_runs_are_identical() {
        let config = SimulationConfig::default()
            .with_genes(100)
            .with_cells(200)
            .with_depth_policy(DepthPolicy::Variable {
                low: 1_000.0,
                high: 20_000.0,
            });
        let first = simulate(&config).unwrap();
        let second = simulate(&config).unwrap();
        assert_eq!(first, second);

        let report_a = compare_normalizations(&first.counts, 3.5e4).unwrap();
        let report_b = compare_normalizations(&second.counts, 3.5e4).unwrap();
        assert_eq!(report_a, report_b);
    }

    #[test]
    fn normalization_report_for_simulated_counts() {
        let config = SimulationConfig::default()
            .with_depth_policy(DepthPolicy::Variable {
                low: 5_000.0,
                high: 100_000.0,
            })
            .with_seed(5);
        let output = simulate(&config).unwrap();
        let report =
            compare_normalizations(&output.counts, config.normalization_scale_factor).unwrap();

        let [raw, fraction, cpm, scaled] = report.median_dispersion_ratios(MIN_MEAN);
        println!(
            "Median variance/mean: raw {:?}, fraction {:?}, cpm {:?}, scaled {:?}",
            raw, fraction, cpm, scaled
        );
        assert!(raw.unwrap() > 1.5);
        // fractions never exceed one, so no gene passes the mean threshold
        assert!(fraction.is_none());
        // CPM inflates the variance/mean ratio far above Poisson
        assert!(cpm.unwrap() > 5.0);
        assert!(scaled.is_some());

        for summary in report.raw.iter().chain(&report.cpm) {
            assert!((0.0..=1.0).contains(&summary.dropout_probability));
        }
        assert!(report.fitted_curve().is_some());
    }

    #[test]
    fn real_data_entry_point() {
        use nalgebra_sparse::{CooMatrix, CsrMatrix};

        // 4 cells x 3 genes, already parsed by an external reader
        let mut coo = CooMatrix::new(4, 3);
        for (cell, gene, value) in [
            (0, 0, 3.0),
            (0, 2, 1.0),
            (1, 1, 5.0),
            (2, 0, 2.0),
            (2, 1, 2.0),
            (3, 2, 7.0),
        ] {
            coo.push(cell, gene, value);
        }
        let csr = CsrMatrix::from(&coo);
        let observed = csr_to_genes_by_cells(&csr).unwrap();
        assert_eq!(observed.dim(), (3, 4));

        let report = compare_normalizations(&observed, 100.0).unwrap();
        assert_eq!(report.raw.len(), 3);
        assert_eq!(report.raw[0].dropout_probability, 0.5);

        let profile = GeneProfile::from_matrix(&observed).unwrap();
        assert_eq!(profile.len(), 3);
    }
}
