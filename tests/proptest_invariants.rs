//! Property-based invariants of the discretization and transition statistics.

use km_langevin::binning::BinEdges;
use km_langevin::config::ChiSquareConfig;
use km_langevin::km_coefficients::extrapolate_to_zero;
use km_langevin::transition::transition_matrix_with_states;
use km_langevin::{chi_square_statistic, digitize, transition_matrix};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

const ROW_SUM_TOLERANCE: f64 = 1e-12;

fn labels_and_lag() -> impl Strategy<Value = (Vec<usize>, usize)> {
    prop::collection::vec(0usize..8, 2..200).prop_flat_map(|labels| {
        let len = labels.len();
        (Just(labels), 1..len)
    })
}

fn sorted_edges() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::btree_set(-1000i32..1000, 1..20)
        .prop_map(|set| set.into_iter().map(|v| v as f64 * 0.01).collect())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn transition_rows_sum_to_one_or_zero((labels, tau) in labels_and_lag()) {
        let matrix = transition_matrix(&labels, tau).unwrap();
        prop_assert_eq!(matrix.dim(), 1 + labels.iter().copied().max().unwrap());
        for (i, row) in matrix.rows().enumerate() {
            let sum: f64 = row.iter().sum();
            prop_assert!(
                sum.abs() < ROW_SUM_TOLERANCE || (sum - 1.0).abs() < ROW_SUM_TOLERANCE,
                "row {} sums to {}", i, sum
            );
            prop_assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn fixed_state_space_matches_realized_one((labels, tau) in labels_and_lag()) {
        let realized = transition_matrix(&labels, tau).unwrap();
        let padded = transition_matrix_with_states(&labels, tau, realized.dim() + 3).unwrap();
        for i in 0..padded.dim() {
            for j in 0..padded.dim() {
                prop_assert_eq!(padded.get(i, j), realized.get(i, j));
            }
        }
    }

    #[test]
    fn chi_square_is_nonnegative(
        values in prop::collection::vec(-10.0f64..10.0, 60..300),
        lam_bins in 1usize..=10,
        num_periods in 1usize..=5,
        tau in 1usize..=20,
    ) {
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        prop_assume!(min < max);

        let config = ChiSquareConfig { lam_bins, num_periods, tau };
        let q = chi_square_statistic(&values, &config).unwrap();
        prop_assert!(q.is_finite());
        prop_assert!(q >= 0.0);
    }

    #[test]
    fn digitize_counts_edges_at_or_below(
        edges in sorted_edges(),
        values in prop::collection::vec(-12.0f64..12.0, 1..100),
    ) {
        let bin_edges = BinEdges::new(edges.clone()).unwrap();
        let digitized = digitize(&values, &bin_edges).unwrap();
        prop_assert_eq!(digitized.len(), values.len());
        for (&value, &label) in values.iter().zip(digitized.labels()) {
            prop_assert_eq!(label, edges.iter().filter(|&&e| e <= value).count());
        }

        let mut ordered = values.clone();
        ordered.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let labels = digitize(&ordered, &bin_edges).unwrap();
        prop_assert!(labels.labels().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn extrapolation_of_exact_lines_returns_intercept(
        slope in -5.0f64..5.0,
        intercept in 0.5f64..5.0,
        first_lag in 1usize..50,
        count in 2usize..20,
    ) {
        let lags: Vec<f64> = (first_lag..first_lag + count).map(|tau| tau as f64).collect();
        // keep every value away from zero so no lag is dropped
        let values: Vec<f64> = lags.iter().map(|&tau| intercept + slope * tau / 1000.0).collect();
        let at_zero = extrapolate_to_zero(&lags, &values).unwrap();
        prop_assert!((at_zero - intercept).abs() < 1e-8, "{} vs {}", at_zero, intercept);
    }
}
