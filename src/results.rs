//! # Estimation Results
//!
//! Value types produced by the [`crate::analyzer::LangevinAnalyzer`] pipeline.

use crate::km_coefficients::KmProfile;
use crate::polynomial::FitCoefficients;
use crate::regenerate::LangevinModel;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything estimated from one series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LangevinEstimate {
    /// Markov-Einstein scale in samples
    pub markov_lag: usize,
    /// Per-bin drift and diffusion
    pub profile: KmProfile,
    /// Polynomial fits of the profiles
    pub coefficients: FitCoefficients,
    /// Length of the analyzed series
    pub series_len: usize,
    /// Sampling interval of the analyzed series
    pub dt: f64,
    /// Last observed value, the natural starting point for regeneration
    pub last_value: f64,
}

impl LangevinEstimate {
    /// Model for evaluating or integrating the fitted dynamics.
    pub fn model(&self) -> LangevinModel {
        LangevinModel::new(self.coefficients.clone())
    }

    /// Markov-Einstein scale in time units.
    pub fn markov_time(&self) -> f64 {
        self.markov_lag as f64 * self.dt
    }
}
