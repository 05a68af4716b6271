//! # Langevin Model Analyzer
//!
//! [`LangevinAnalyzer`] runs the full pipeline on named series: Markov scale
//! detection, Kramers-Moyal estimation, polynomial fitting, and on request
//! regeneration of synthetic trajectories from the fitted model.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use km_langevin::{EstimationConfig, LangevinAnalyzer};
//! use km_langevin::errors::KramersMoyalError;
//!
//! # fn main() -> Result<(), KramersMoyalError> {
//! let config = EstimationConfig::builder().dt(0.1).num_bins(60).seed(7).build()?;
//! let mut analyzer = LangevinAnalyzer::with_config(config)?;
//!
//! let data: Vec<f64> = (0..20_000).map(|i| (i as f64 * 0.01).sin()).collect();
//! analyzer.add_time_series("probe".to_string(), data)?;
//! analyzer.analyze_all_series();
//!
//! let estimate = analyzer.get_analysis_results("probe")?;
//! println!("lambda = {}, D1 = {:?}", estimate.markov_lag, estimate.coefficients.drift);
//! let synthetic = analyzer.regenerate("probe", estimate.last_value)?;
//! # Ok(())
//! # }
//! ```

use crate::config::EstimationConfig;
use crate::errors::{validate_all_finite, validate_non_empty, KramersMoyalError, KmResult};
use crate::km_coefficients::estimate_km_coefficients;
use crate::polynomial::fit_km_coefficients;
use crate::regenerate::regenerate_series;
use crate::results::LangevinEstimate;
use std::collections::BTreeMap;

/// Maximum allowed time series size (10 million points)
const MAX_TIME_SERIES_SIZE: usize = 10_000_000;

/// Estimate, fit and package the Langevin model of one series.
pub fn estimate_langevin_model(series: &[f64], config: &EstimationConfig) -> KmResult<LangevinEstimate> {
    validate_non_empty(series, "series")?;
    validate_all_finite(series, "series")?;

    let profile = estimate_km_coefficients(series, &config.km)?;
    let coefficients = fit_km_coefficients(
        &profile.bin_centers,
        &profile.drift,
        &profile.diffusion,
        &config.fit,
    )?;
    log::info!(
        "Fitted Langevin model: lambda = {}, D1 = {:?}, D2 = {:?}",
        profile.markov_lag,
        coefficients.drift,
        coefficients.diffusion
    );

    Ok(LangevinEstimate {
        markov_lag: profile.markov_lag,
        profile,
        coefficients,
        series_len: series.len(),
        dt: config.km.dt,
        last_value: series[series.len() - 1],
    })
}

/// Named-series front end to the estimation pipeline.
#[derive(Debug, Clone, Default)]
pub struct LangevinAnalyzer {
    /// Raw series (deterministic ordering)
    time_series_data: BTreeMap<String, Vec<f64>>,
    /// Cached estimates, invalidated when a series or the configuration changes
    estimation_results: BTreeMap<String, LangevinEstimate>,
    config: EstimationConfig,
}

impl LangevinAnalyzer {
    /// Analyzer with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with a validated configuration.
    pub fn with_config(config: EstimationConfig) -> KmResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Current configuration.
    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Replace the configuration; cached estimates are discarded.
    pub fn set_config(&mut self, config: EstimationConfig) -> KmResult<()> {
        config.validate()?;
        self.config = config;
        self.estimation_results.clear();
        Ok(())
    }

    /// Fix the Markov lag (or restore the search with `None`); cached estimates are discarded.
    pub fn set_markov_lag(&mut self, lag: Option<usize>) -> KmResult<()> {
        let mut config = self.config;
        config.km.markov_lag = lag;
        self.set_config(config)
    }

    /// Set the regeneration seed.
    pub fn set_seed(&mut self, seed: u64) {
        self.config.regeneration.seed = Some(seed);
    }

    /// Add or replace a series.
    ///
    /// # Returns
    /// Ok(true) if a new series was inserted, Ok(false) if an existing series was replaced
    pub fn add_time_series(&mut self, name: String, data: Vec<f64>) -> KmResult<bool> {
        if data.len() > MAX_TIME_SERIES_SIZE {
            return Err(KramersMoyalError::invalid_input(
                "data",
                format!(
                    "{} points exceeds the maximum of {}",
                    data.len(),
                    MAX_TIME_SERIES_SIZE
                ),
            ));
        }
        validate_non_empty(&data, "data")?;
        validate_all_finite(&data, "data")?;

        self.estimation_results.remove(&name);
        let is_new = self.time_series_data.insert(name, data).is_none();
        Ok(is_new)
    }

    /// Remove a series and its estimate.
    ///
    /// # Returns
    /// true if the series existed
    pub fn remove_time_series(&mut self, name: &str) -> bool {
        self.estimation_results.remove(name);
        self.time_series_data.remove(name).is_some()
    }

    /// Registered series names, sorted.
    pub fn series_names(&self) -> Vec<&str> {
        self.time_series_data.keys().map(String::as_str).collect()
    }

    /// Analyze one series and cache the estimate.
    pub fn analyze_series(&mut self, name: &str) -> KmResult<&LangevinEstimate> {
        let data = self
            .time_series_data
            .get(name)
            .ok_or_else(|| KramersMoyalError::SeriesNotFound {
                name: name.to_string(),
            })?;
        let estimate = estimate_langevin_model(data, &self.config)?;
        self.estimation_results.insert(name.to_string(), estimate);
        self.get_analysis_results(name)
    }

    /// Analyze every registered series.
    ///
    /// Failures do not stop the batch; they are logged and returned by name.
    /// Series are independent, so with the `parallel` feature they run on rayon.
    pub fn analyze_all_series(&mut self) -> BTreeMap<String, KramersMoyalError> {
        let config = self.config;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<(String, KmResult<LangevinEstimate>)> = {
            use rayon::prelude::*;
            self.time_series_data
                .par_iter()
                .map(|(name, data)| (name.clone(), estimate_langevin_model(data, &config)))
                .collect()
        };

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<(String, KmResult<LangevinEstimate>)> = self
            .time_series_data
            .iter()
            .map(|(name, data)| (name.clone(), estimate_langevin_model(data, &config)))
            .collect();

        let mut failures = BTreeMap::new();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(estimate) => {
                    self.estimation_results.insert(name, estimate);
                }
                Err(e) => {
                    log::warn!("Analysis of series '{}' failed: {}", name, e);
                    failures.insert(name, e);
                }
            }
        }
        if !failures.is_empty() {
            log::warn!(
                "{} of {} series failed during batch analysis",
                failures.len(),
                self.time_series_data.len()
            );
        }
        failures
    }

    /// Cached estimate of a series.
    pub fn get_analysis_results(&self, name: &str) -> KmResult<&LangevinEstimate> {
        self.estimation_results
            .get(name)
            .ok_or_else(|| KramersMoyalError::SeriesNotFound {
                name: name.to_string(),
            })
    }

    /// Synthetic trajectory from the cached model of a series, starting at `x0`.
    ///
    /// Uses the regeneration settings of the current configuration.
    pub fn regenerate(&self, name: &str, x0: f64) -> KmResult<Vec<f64>> {
        let estimate = self.get_analysis_results(name)?;
        regenerate_series(x0, &estimate.coefficients, &self.config.regeneration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::FitCoefficients;

    fn ou_series(len: usize, seed: u64) -> Vec<f64> {
        let truth = FitCoefficients::new(vec![-1.0, 0.0], vec![0.0, 0.0, 0.5]).unwrap();
        regenerate_series(
            0.0,
            &truth,
            &crate::config::RegenerationConfig {
                length: len,
                dt: 0.1,
                seed: Some(seed),
            },
        )
        .unwrap()
    }

    fn fixed_lag_config() -> EstimationConfig {
        EstimationConfig::builder()
            .dt(0.1)
            .num_bins(30)
            .markov_lag(1)
            .seed(11)
            .regeneration_length(300)
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_and_replace_series() {
        let mut analyzer = LangevinAnalyzer::new();
        assert!(analyzer.add_time_series("a".to_string(), vec![1.0, 2.0]).unwrap());
        assert!(!analyzer.add_time_series("a".to_string(), vec![3.0, 4.0]).unwrap());
        assert_eq!(analyzer.series_names(), vec!["a"]);

        assert!(analyzer.add_time_series("b".to_string(), vec![]).is_err());
        assert!(analyzer
            .add_time_series("c".to_string(), vec![1.0, f64::NAN])
            .is_err());
        assert!(analyzer.remove_time_series("a"));
        assert!(!analyzer.remove_time_series("a"));
    }

    #[test]
    fn test_missing_series() {
        let mut analyzer = LangevinAnalyzer::new();
        assert!(matches!(
            analyzer.analyze_series("nope"),
            Err(KramersMoyalError::SeriesNotFound { .. })
        ));
        assert!(matches!(
            analyzer.get_analysis_results("nope"),
            Err(KramersMoyalError::SeriesNotFound { .. })
        ));
        assert!(analyzer.regenerate("nope", 0.0).is_err());
    }

    #[test]
    fn test_pipeline_and_regeneration() {
        let mut analyzer = LangevinAnalyzer::with_config(fixed_lag_config()).unwrap();
        analyzer
            .add_time_series("ou".to_string(), ou_series(20_000, 2))
            .unwrap();

        let estimate = analyzer.analyze_series("ou").unwrap();
        assert_eq!(estimate.markov_lag, 1);
        assert_eq!(estimate.coefficients.drift.len(), 2);
        assert_eq!(estimate.coefficients.diffusion.len(), 3);
        assert_eq!(estimate.profile.num_bins(), 29);
        assert!(estimate.coefficients.drift[0] < 0.0);

        let a = analyzer.regenerate("ou", 0.0).unwrap();
        let b = analyzer.regenerate("ou", 0.0).unwrap();
        assert_eq!(a.len(), 300);
        assert_eq!(a, b);
    }

    #[test]
    fn test_batch_collects_failures() {
        let mut analyzer = LangevinAnalyzer::with_config(fixed_lag_config()).unwrap();
        analyzer
            .add_time_series("good".to_string(), ou_series(5_000, 4))
            .unwrap();
        analyzer
            .add_time_series("flat".to_string(), vec![1.0; 100])
            .unwrap();

        let failures = analyzer.analyze_all_series();
        assert_eq!(failures.len(), 1);
        assert!(failures.contains_key("flat"));
        assert!(analyzer.get_analysis_results("good").is_ok());
    }

    #[test]
    fn test_config_change_clears_cache() {
        let mut analyzer = LangevinAnalyzer::with_config(fixed_lag_config()).unwrap();
        analyzer
            .add_time_series("ou".to_string(), ou_series(5_000, 8))
            .unwrap();
        analyzer.analyze_series("ou").unwrap();
        analyzer.set_markov_lag(Some(2)).unwrap();
        assert!(analyzer.get_analysis_results("ou").is_err());
        assert_eq!(analyzer.analyze_series("ou").unwrap().markov_lag, 2);
        assert!(analyzer.set_markov_lag(Some(0)).is_err());
    }
}
