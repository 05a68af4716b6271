//! # Estimation Configuration
//!
//! Parameter structures for each estimation stage, carrying the documented
//! defaults, plus an aggregate [`EstimationConfig`] used by the analyzer.

use crate::errors::{validate_positive, validate_step_size, KramersMoyalError, KmResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of leading lags skipped before searching for the chi-square minimum.
pub const MARKOV_SEARCH_OFFSET: usize = 5;

/// Consecutive non-improving lags after which the Markov search stops.
pub const MARKOV_SEARCH_PATIENCE: usize = 5;

/// Number of linearly spaced edges used to discretize a series for the
/// chi-square statistic, independent of `lam_bins`.
pub const MARKOV_BIN_EDGES: usize = 50;

/// Single-lag chi-square probe parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChiSquareConfig {
    /// Number of leading states compared between sub-interval and global matrices
    pub lam_bins: usize,
    /// Number of contiguous sub-intervals the series is split into
    pub num_periods: usize,
    /// Lag in samples
    pub tau: usize,
}

impl Default for ChiSquareConfig {
    fn default() -> Self {
        Self {
            lam_bins: 10,
            num_periods: 3,
            tau: 20,
        }
    }
}

impl ChiSquareConfig {
    /// Check field ranges.
    pub fn validate(&self) -> KmResult<()> {
        validate_positive(self.lam_bins, "lam_bins")?;
        validate_positive(self.num_periods, "num_periods")?;
        validate_positive(self.tau, "tau")
    }
}

/// Markov-Einstein scale search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkovScaleConfig {
    /// Number of leading states compared between sub-interval and global matrices
    pub lam_bins: usize,
    /// Number of contiguous sub-intervals the series is split into
    pub num_periods: usize,
    /// Largest lag evaluated
    pub max_offset: usize,
}

impl Default for MarkovScaleConfig {
    fn default() -> Self {
        Self {
            lam_bins: 10,
            num_periods: 10,
            max_offset: 50,
        }
    }
}

impl MarkovScaleConfig {
    /// Check field ranges.
    ///
    /// `max_offset` must exceed [`MARKOV_SEARCH_OFFSET`] so the minimum
    /// search has at least one candidate.
    pub fn validate(&self) -> KmResult<()> {
        validate_positive(self.lam_bins, "lam_bins")?;
        validate_positive(self.num_periods, "num_periods")?;
        validate_positive(self.max_offset, "max_offset")?;
        if self.max_offset <= MARKOV_SEARCH_OFFSET {
            return Err(KramersMoyalError::invalid_configuration(
                "max_offset",
                self.max_offset as f64,
                format!("> {}", MARKOV_SEARCH_OFFSET),
            ));
        }
        Ok(())
    }

    /// Single-lag probe settings sharing this search's binning parameters.
    pub fn probe(&self, tau: usize) -> ChiSquareConfig {
        ChiSquareConfig {
            lam_bins: self.lam_bins,
            num_periods: self.num_periods,
            tau,
        }
    }
}

/// Explicit lower and upper limits of the KM binning range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinLimits {
    /// First bin edge
    pub lower: f64,
    /// Last bin edge
    pub upper: f64,
}

impl BinLimits {
    /// Construct limits; validation happens when the edges are built.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }
}

/// Kramers-Moyal coefficient estimation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KmConfig {
    /// Sampling interval of the series
    pub dt: f64,
    /// Number of bin edges
    pub num_bins: usize,
    /// Binning range; `None` trims one standard deviation from each end of the data range
    pub bin_limits: Option<BinLimits>,
    /// Markov lag in samples; `None` derives it with `markov`
    pub markov_lag: Option<usize>,
    /// Search settings used when `markov_lag` is absent
    pub markov: MarkovScaleConfig,
}

impl Default for KmConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            num_bins: 200,
            bin_limits: None,
            markov_lag: None,
            markov: MarkovScaleConfig::default(),
        }
    }
}

impl KmConfig {
    /// Check field ranges.
    pub fn validate(&self) -> KmResult<()> {
        validate_step_size(self.dt, "dt")?;
        validate_positive(self.num_bins, "num_bins")?;
        if self.num_bins < 2 {
            return Err(KramersMoyalError::invalid_input(
                "num_bins",
                format!("need at least 2 bin edges, got {}", self.num_bins),
            ));
        }
        if let Some(lag) = self.markov_lag {
            validate_positive(lag, "markov_lag")?;
        } else {
            self.markov.validate()?;
        }
        Ok(())
    }
}

/// Polynomial orders for the drift and diffusion fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitConfig {
    /// Drift polynomial degree
    pub d1_order: usize,
    /// Diffusion polynomial degree
    pub d2_order: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            d1_order: 1,
            d2_order: 2,
        }
    }
}

/// Synthetic trajectory parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegenerationConfig {
    /// Number of generated samples
    pub length: usize,
    /// Integration step
    pub dt: f64,
    /// Noise seed; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            length: 2000,
            dt: 0.1,
            seed: None,
        }
    }
}

impl RegenerationConfig {
    /// Check field ranges.
    pub fn validate(&self) -> KmResult<()> {
        validate_step_size(self.dt, "dt")
    }
}

/// Settings for the full estimate-fit-regenerate pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EstimationConfig {
    /// Coefficient estimation
    pub km: KmConfig,
    /// Polynomial fitting
    pub fit: FitConfig,
    /// Trajectory regeneration
    pub regeneration: RegenerationConfig,
}

impl EstimationConfig {
    /// Documented defaults.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Coarser binning and a shorter Markov search for quick looks at short series.
    pub fn fast() -> Self {
        Self {
            km: KmConfig {
                num_bins: 40,
                markov: MarkovScaleConfig {
                    lam_bins: 10,
                    num_periods: 3,
                    max_offset: 20,
                },
                ..KmConfig::default()
            },
            ..Self::default()
        }
    }

    /// Start a builder from the standard defaults.
    pub fn builder() -> EstimationConfigBuilder {
        EstimationConfigBuilder::new()
    }

    /// Validate every stage.
    pub fn validate(&self) -> KmResult<()> {
        self.km.validate()?;
        self.regeneration.validate()
    }
}

/// Builder for [`EstimationConfig`].
#[derive(Debug, Clone, Default)]
pub struct EstimationConfigBuilder {
    config: EstimationConfig,
}

impl EstimationConfigBuilder {
    /// Builder seeded with the standard defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sampling interval, shared by estimation and regeneration.
    pub fn dt(mut self, dt: f64) -> Self {
        self.config.km.dt = dt;
        self.config.regeneration.dt = dt;
        self
    }

    /// Number of KM bin edges.
    pub fn num_bins(mut self, num_bins: usize) -> Self {
        self.config.km.num_bins = num_bins;
        self
    }

    /// Explicit binning range.
    pub fn bin_limits(mut self, lower: f64, upper: f64) -> Self {
        self.config.km.bin_limits = Some(BinLimits::new(lower, upper));
        self
    }

    /// Fixed Markov lag, skipping the search.
    pub fn markov_lag(mut self, lag: usize) -> Self {
        self.config.km.markov_lag = Some(lag);
        self
    }

    /// Markov search settings.
    pub fn markov_search(mut self, markov: MarkovScaleConfig) -> Self {
        self.config.km.markov = markov;
        self
    }

    /// Polynomial orders.
    pub fn orders(mut self, d1_order: usize, d2_order: usize) -> Self {
        self.config.fit = FitConfig { d1_order, d2_order };
        self
    }

    /// Regeneration noise seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.regeneration.seed = Some(seed);
        self
    }

    /// Regenerated series length.
    pub fn regeneration_length(mut self, length: usize) -> Self {
        self.config.regeneration.length = length;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> KmResult<EstimationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
