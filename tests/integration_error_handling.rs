//! Integration tests for error handling and invalid data scenarios
//!
//! These tests validate that every stage of the pipeline rejects invalid
//! input with the matching error variant instead of panicking or returning
//! meaningless estimates.

use km_langevin::config::{ChiSquareConfig, KmConfig, MarkovScaleConfig};
use km_langevin::{
    chi_square_statistic, estimate_km_coefficients, estimate_langevin_model, find_markov_scale,
    transition_matrix, EstimationConfig, KramersMoyalError, LangevinAnalyzer,
};

fn wavy_series(length: usize) -> Vec<f64> {
    (0..length)
        .map(|i| (i as f64 * 0.37).sin() + 0.5 * (i as f64 * 0.013).cos())
        .collect()
}

/// Test scenario: empty and non-finite series
#[test]
fn test_invalid_series_rejected() {
    let config = KmConfig {
        markov_lag: Some(1),
        ..KmConfig::default()
    };

    match estimate_km_coefficients(&[], &config) {
        Err(KramersMoyalError::InvalidInput { parameter, .. }) => assert_eq!(parameter, "series"),
        other => panic!("Expected InvalidInput for empty series, got {:?}", other),
    }

    let mut data = wavy_series(500);
    data[250] = f64::NAN;
    assert!(matches!(
        estimate_km_coefficients(&data, &config),
        Err(KramersMoyalError::NumericalError { .. })
    ));

    data[250] = f64::INFINITY;
    assert!(matches!(
        estimate_langevin_model(&data, &EstimationConfig::default()),
        Err(KramersMoyalError::NumericalError { .. })
    ));
}

/// Test scenario: constant series
///
/// A constant series has neither a state space for the Markov test nor a
/// non-empty trimmed binning range.
#[test]
fn test_constant_series_rejected() {
    let flat = vec![2.5; 1000];

    assert!(matches!(
        find_markov_scale(&flat, &MarkovScaleConfig::default()),
        Err(KramersMoyalError::InvalidInput { .. })
    ));

    let config = KmConfig {
        markov_lag: Some(1),
        ..KmConfig::default()
    };
    match estimate_km_coefficients(&flat, &config) {
        Err(KramersMoyalError::InvalidInput { parameter, .. }) => {
            assert_eq!(parameter, "bin_limits")
        }
        other => panic!("Expected InvalidInput for bin limits, got {:?}", other),
    }
}

/// Test scenario: Markov search parameters that cannot work
#[test]
fn test_markov_search_configuration_errors() {
    let data = wavy_series(2000);

    let too_short_window = MarkovScaleConfig {
        max_offset: 5,
        ..MarkovScaleConfig::default()
    };
    assert!(matches!(
        find_markov_scale(&data, &too_short_window),
        Err(KramersMoyalError::InvalidConfiguration { .. })
    ));

    // largest lag must be shorter than the series
    assert!(matches!(
        find_markov_scale(&data[..40], &MarkovScaleConfig::default()),
        Err(KramersMoyalError::InvalidInput { .. })
    ));

    // 50 edges give 51 states at most
    let too_many_states = ChiSquareConfig {
        lam_bins: 60,
        ..ChiSquareConfig::default()
    };
    match chi_square_statistic(&data, &too_many_states) {
        Err(KramersMoyalError::InvalidConfiguration { parameter, value, .. }) => {
            assert_eq!(parameter, "lam_bins");
            assert_eq!(value, 60.0);
        }
        other => panic!("Expected InvalidConfiguration, got {:?}", other),
    }

    let zero_periods = ChiSquareConfig {
        num_periods: 0,
        ..ChiSquareConfig::default()
    };
    assert!(chi_square_statistic(&data, &zero_periods).is_err());
}

/// Test scenario: lag window reaching past the end of the series
#[test]
fn test_markov_lag_longer_than_series() {
    let config = KmConfig {
        markov_lag: Some(10),
        ..KmConfig::default()
    };
    let result = estimate_km_coefficients(&wavy_series(15), &config);
    match result {
        Err(KramersMoyalError::InvalidInput { parameter, reason }) => {
            assert_eq!(parameter, "markov_lag");
            assert!(reason.contains("15"), "reason should name the length: {}", reason);
        }
        other => panic!("Expected InvalidInput, got {:?}", other),
    }

    // lag window end would overflow usize
    let huge = KmConfig {
        markov_lag: Some(usize::MAX / 2 + 1),
        ..KmConfig::default()
    };
    match estimate_km_coefficients(&wavy_series(100), &huge) {
        Err(KramersMoyalError::InvalidInput { parameter, .. }) => {
            assert_eq!(parameter, "markov_lag")
        }
        other => panic!("Expected InvalidInput for an oversized lag, got {:?}", other),
    }

    assert!(matches!(
        transition_matrix(&[0, 1, 0], 3),
        Err(KramersMoyalError::InvalidInput { .. })
    ));
    assert!(transition_matrix(&[0, 1, 0], 0).is_err());
}

/// Test scenario: invalid configuration values caught by the builder
#[test]
fn test_builder_validation() {
    assert!(matches!(
        EstimationConfig::builder().dt(0.0).build(),
        Err(KramersMoyalError::InvalidConfiguration { .. })
    ));
    assert!(EstimationConfig::builder().dt(f64::NAN).build().is_err());
    assert!(EstimationConfig::builder().num_bins(1).build().is_err());
    assert!(EstimationConfig::builder().markov_lag(0).build().is_err());

    // an invalid search is irrelevant once the lag is fixed
    let config = EstimationConfig::builder()
        .markov_search(MarkovScaleConfig {
            max_offset: 2,
            ..MarkovScaleConfig::default()
        })
        .markov_lag(3)
        .build();
    assert!(config.is_ok());
}

/// Test scenario: binning range that misses the data entirely
///
/// Every bin stays unvisited, so nothing is left to fit.
#[test]
fn test_no_visited_bins_fails_fit() {
    let config = EstimationConfig::builder()
        .bin_limits(100.0, 200.0)
        .markov_lag(1)
        .build()
        .unwrap();
    let result = estimate_langevin_model(&wavy_series(1000), &config);
    match result {
        Err(KramersMoyalError::InsufficientData { required, actual }) => {
            assert_eq!(required, 2);
            assert_eq!(actual, 0);
        }
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

/// Test scenario: analyzer lookups and invalid registrations
#[test]
fn test_analyzer_error_paths() {
    let mut analyzer = LangevinAnalyzer::new();
    assert!(analyzer.add_time_series("EMPTY".to_string(), vec![]).is_err());
    assert!(analyzer.series_names().is_empty());

    let error = analyzer.analyze_series("MISSING").unwrap_err();
    assert_eq!(
        error,
        KramersMoyalError::SeriesNotFound {
            name: "MISSING".to_string()
        }
    );
    assert!(error.to_string().contains("MISSING"));

    assert!(LangevinAnalyzer::with_config(
        EstimationConfig::builder().markov_lag(1).build().unwrap()
    )
    .is_ok());
    let mut bad = EstimationConfig::default();
    bad.km.dt = -0.1;
    assert!(LangevinAnalyzer::with_config(bad).is_err());
    assert!(analyzer.set_config(bad).is_err());
}
