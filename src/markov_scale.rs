//! Markov-Einstein time scale detection.
//!
//! For each lag the series is split into contiguous sub-intervals and each
//! sub-interval's transition matrix is compared with the whole-series matrix
//! through a chi-square divergence `Q(tau)`. The divergence falls as the lag
//! grows past the memory of the process; the first local maximum of `ln Q`
//! after its initial dip marks the smallest lag at which the series behaves
//! as a Markov process.

use crate::binning::{digitize, BinEdges, DigitizedSeries};
use crate::config::{
    ChiSquareConfig, MarkovScaleConfig, MARKOV_BIN_EDGES, MARKOV_SEARCH_OFFSET,
    MARKOV_SEARCH_PATIENCE,
};
use crate::errors::{KramersMoyalError, KmResult};
use crate::math_utils::finite_range;
use crate::transition::{transition_matrix, transition_matrix_with_states, TransitionMatrix};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Chi-square divergence for consecutive lags starting at 1.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChiSquareProfile {
    q: Vec<f64>,
}

impl ChiSquareProfile {
    /// `Q` values; index `k` holds the lag `k + 1`.
    pub fn values(&self) -> &[f64] {
        &self.q
    }

    /// `Q` at a given lag, if evaluated.
    pub fn at_lag(&self, tau: usize) -> Option<f64> {
        tau.checked_sub(1).and_then(|k| self.q.get(k)).copied()
    }

    /// Lags covered by the profile.
    pub fn lags(&self) -> std::ops::RangeInclusive<usize> {
        1..=self.q.len()
    }

    /// Natural log of each `Q`; a zero divergence maps to negative infinity.
    pub fn log_values(&self) -> Vec<f64> {
        self.q.iter().map(|q| q.ln()).collect()
    }

    /// Number of lags evaluated.
    pub fn len(&self) -> usize {
        self.q.len()
    }

    /// True when no lag was evaluated.
    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}

/// Discretize a series onto [`MARKOV_BIN_EDGES`] edges spanning its range.
fn digitize_for_markov_test(series: &[f64]) -> KmResult<DigitizedSeries> {
    let (min, max) = finite_range(series)?;
    if min == max {
        return Err(KramersMoyalError::invalid_input(
            "series",
            "constant series has no state space to test",
        ));
    }
    let edges = BinEdges::linear(min, max, MARKOV_BIN_EDGES)?;
    digitize(series, &edges)
}

/// Divergence between sub-interval and global transition statistics at one lag.
fn chi_square_at_lag(
    digitized: &DigitizedSeries,
    lam_bins: usize,
    num_periods: usize,
    tau: usize,
) -> KmResult<f64> {
    let labels = digitized.labels();
    let global = transition_matrix(labels, tau)?;
    if lam_bins > global.dim() {
        return Err(KramersMoyalError::invalid_configuration(
            "lam_bins",
            lam_bins as f64,
            format!("<= transition matrix dimension {}", global.dim()),
        ));
    }

    let len = labels.len();
    let mut q = 0.0;
    for period in 0..num_periods {
        let start = period * len / num_periods;
        let end = (period + 1) * len / num_periods;
        let local = transition_matrix_with_states(&labels[start..end], tau, global.dim())?;
        q += divergence(&local, &global, lam_bins);
    }
    Ok(q)
}

fn divergence(local: &TransitionMatrix, global: &TransitionMatrix, lam_bins: usize) -> f64 {
    let mut q = 0.0;
    for j in 0..lam_bins {
        let weight = local.row_sum(j);
        for k in 0..lam_bins {
            let expected = global.get(j, k);
            if expected > 0.0 {
                let diff = local.get(j, k) - expected;
                q += weight * diff * diff / expected;
            }
        }
    }
    q
}

/// Chi-square statistic `Q` of a raw series at a single lag.
///
/// # Errors
/// `InvalidInput` for empty, constant or non-finite series, zero
/// parameters, or a lag not shorter than the series;
/// `InvalidConfiguration` when `lam_bins` exceeds the realized state count.
pub fn chi_square_statistic(series: &[f64], config: &ChiSquareConfig) -> KmResult<f64> {
    config.validate()?;
    let digitized = digitize_for_markov_test(series)?;
    chi_square_at_lag(&digitized, config.lam_bins, config.num_periods, config.tau)
}

/// `Q(tau)` for every lag in `1..=max_offset`.
///
/// The series is digitized once; per-lag evaluations are independent and run
/// on rayon when the `parallel` feature is enabled, collected in lag order.
pub fn chi_square_profile(series: &[f64], config: &MarkovScaleConfig) -> KmResult<ChiSquareProfile> {
    config.validate()?;
    if config.max_offset >= series.len() {
        return Err(KramersMoyalError::invalid_input(
            "max_offset",
            format!(
                "largest lag {} must be smaller than series length {}",
                config.max_offset,
                series.len()
            ),
        ));
    }
    let digitized = digitize_for_markov_test(series)?;

    let lag_q = |tau: usize| chi_square_at_lag(&digitized, config.lam_bins, config.num_periods, tau);

    #[cfg(feature = "parallel")]
    let q: KmResult<Vec<f64>> = {
        use rayon::prelude::*;
        (1..=config.max_offset).into_par_iter().map(lag_q).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let q: KmResult<Vec<f64>> = (1..=config.max_offset).map(lag_q).collect();

    Ok(ChiSquareProfile { q: q? })
}

/// First local maximum of a log-divergence profile, as a 1-based lag.
///
/// The scan starts at the smallest value among indices `>= 5`, then walks
/// forward keeping the position of the largest value seen; five consecutive
/// steps without a strictly larger value end the walk. A flat profile
/// therefore resolves to lag 6.
///
/// # Errors
/// `InvalidConfiguration` if the profile has no index `>= 5`.
pub fn locate_markov_boundary(log_q: &[f64]) -> KmResult<usize> {
    if log_q.len() <= MARKOV_SEARCH_OFFSET {
        return Err(KramersMoyalError::invalid_configuration(
            "max_offset",
            log_q.len() as f64,
            format!("> {}", MARKOV_SEARCH_OFFSET),
        ));
    }

    // first minimum wins on ties
    let smallest = log_q[MARKOV_SEARCH_OFFSET..]
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |(best, best_value), (i, &value)| {
            if value < best_value {
                (i, value)
            } else {
                (best, best_value)
            }
        })
        .0
        + MARKOV_SEARCH_OFFSET;

    let mut greatest = smallest;
    let mut stale = 0;
    for (i, &value) in log_q.iter().enumerate().skip(smallest) {
        if value > log_q[greatest] {
            greatest = i;
            stale = 0;
        } else {
            stale += 1;
        }
        if stale == MARKOV_SEARCH_PATIENCE {
            break;
        }
    }
    Ok(greatest + 1)
}

/// Smallest lag, in samples, at which the series satisfies the Markov property.
///
/// # Example
/// ```rust
/// use km_langevin::config::MarkovScaleConfig;
/// use km_langevin::markov_scale::find_markov_scale;
///
/// let series: Vec<f64> = (0..2000).map(|i| (i as f64 * 0.37).sin() + (i as f64 * 0.05).cos()).collect();
/// let lag = find_markov_scale(&series, &MarkovScaleConfig::default()).unwrap();
/// assert!(lag >= 6 && lag <= 50);
/// ```
pub fn find_markov_scale(series: &[f64], config: &MarkovScaleConfig) -> KmResult<usize> {
    let profile = chi_square_profile(series, config)?;
    let lag = locate_markov_boundary(&profile.log_values())?;
    log::debug!(
        "Markov scale {} selected from {} candidate lags",
        lag,
        profile.len()
    );
    Ok(lag)
}
