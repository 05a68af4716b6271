//! Kramers-Moyal drift and diffusion estimation.
//!
//! Conditional first and second moments of the increments are computed per
//! bin from the transition matrices at lags `λ, λ+1, …, 2λ−1`, where `λ` is
//! the Markov-Einstein scale. Each bin's moment-versus-lag relation is then
//! extrapolated linearly to zero lag:
//!
//! ```text
//! D1(x_i; τ) = Σ_j (x_j − x_i) · P(j | i; τ) / (τ·dt)
//! D2(x_i; τ) = Σ_j (x_j − x_i)² · P(j | i; τ) / (2·τ·dt)
//! D_k(x_i)   = lim_{τ→0} D_k(x_i; τ)
//! ```
//!
//! The state space uses `num_bins` edges: label 0 (below the first edge) is
//! dropped, labels `1..num_bins` are the reported bins, and the top label
//! (at or above the last edge) still counts as a destination state.

use crate::binning::{digitize, BinEdges};
use crate::config::{BinLimits, KmConfig};
use crate::errors::{validate_all_finite, validate_non_empty, KramersMoyalError, KmResult};
use crate::markov_scale::find_markov_scale;
use crate::math_utils::{finite_range, mean_spacing, population_std};
use crate::polynomial::polyfit;
use crate::transition::transition_matrix_with_states;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Per-bin KM estimates, raw and extrapolated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KmProfile {
    /// Bin centers, one per reported bin
    pub bin_centers: Vec<f64>,
    /// Drift extrapolated to zero lag
    pub drift: Vec<f64>,
    /// Diffusion extrapolated to zero lag
    pub diffusion: Vec<f64>,
    /// Lags (in samples) the raw moments were computed at
    pub lags: Vec<usize>,
    /// Raw drift, indexed `[lag][bin]`
    pub raw_drift: Vec<Vec<f64>>,
    /// Raw diffusion, indexed `[lag][bin]`
    pub raw_diffusion: Vec<Vec<f64>>,
    /// Markov lag used
    pub markov_lag: usize,
    /// Binning range used
    pub bin_limits: BinLimits,
}

impl KmProfile {
    /// Number of reported bins.
    pub fn num_bins(&self) -> usize {
        self.bin_centers.len()
    }

    /// Bins with a nonzero drift or diffusion estimate.
    pub fn visited_bins(&self) -> usize {
        self.drift
            .iter()
            .zip(&self.diffusion)
            .filter(|(d1, d2)| **d1 != 0.0 || **d2 != 0.0)
            .count()
    }
}

/// Data range trimmed by one population standard deviation at each end.
///
/// # Errors
/// `InvalidInput` when the trimmed range is empty, which happens for
/// constant or very short series.
pub fn default_bin_limits(series: &[f64]) -> KmResult<BinLimits> {
    let (min, max) = finite_range(series)?;
    let std = population_std(series)?;
    let limits = BinLimits::new(min + std, max - std);
    if limits.lower >= limits.upper {
        return Err(KramersMoyalError::invalid_input(
            "bin_limits",
            format!(
                "trimmed data range [{}, {}] is empty; pass explicit limits",
                limits.lower, limits.upper
            ),
        ));
    }
    Ok(limits)
}

/// Bin edges and centers (`edge + dx/2`) over the given limits.
fn build_grid(limits: &BinLimits, num_bins: usize) -> KmResult<(BinEdges, Vec<f64>)> {
    let edges = BinEdges::linear(limits.lower, limits.upper, num_bins)?;
    let half_width = mean_spacing(edges.as_slice()) / 2.0;
    let centers = edges.as_slice().iter().map(|&e| e + half_width).collect();
    Ok((edges, centers))
}

/// Outer difference `displacement[a][b] = centers[b] − centers[a]`.
fn displacement_matrix(centers: &[f64]) -> Vec<Vec<f64>> {
    centers
        .iter()
        .map(|&from| centers.iter().map(|&to| to - from).collect())
        .collect()
}

/// Raw first and second conditional moments for every reported bin at one lag.
fn conditional_moments(
    labels: &[usize],
    tau: usize,
    displacement: &[Vec<f64>],
    dt: f64,
) -> KmResult<(Vec<f64>, Vec<f64>)> {
    let num_edges = displacement.len();
    let matrix = transition_matrix_with_states(labels, tau, num_edges + 1)?;
    let scale = tau as f64 * dt;

    let mut first = Vec::with_capacity(num_edges - 1);
    let mut second = Vec::with_capacity(num_edges - 1);
    for (bin, shifts) in displacement.iter().take(num_edges - 1).enumerate() {
        // drop label 0: row/column `k + 1` of the matrix is bin `k`
        let row = &matrix.row(bin + 1)[1..];
        let (m1, m2) = shifts
            .iter()
            .zip(row)
            .fold((0.0, 0.0), |(m1, m2), (&shift, &p)| {
                (m1 + shift * p, m2 + shift * shift * p)
            });
        first.push(m1 / scale);
        second.push(m2 / (2.0 * scale));
    }
    Ok((first, second))
}

/// Linear fit of `values` against `lags` over the nonzero entries, evaluated at zero.
///
/// Returns 0.0 when every entry is zero (the bin was never visited). When
/// only one lag carries an estimate that value is returned unchanged instead
/// of fitting a line through a single point, whose intercept is undefined.
pub fn extrapolate_to_zero(lags: &[f64], values: &[f64]) -> KmResult<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = lags
        .iter()
        .zip(values)
        .filter(|(_, value)| **value != 0.0)
        .map(|(&lag, &value)| (lag, value))
        .unzip();

    match ys.len() {
        0 => Ok(0.0),
        1 => Ok(ys[0]),
        _ => {
            let coeffs = polyfit(&xs, &ys, 1)?;
            Ok(coeffs[1])
        }
    }
}

/// Estimate zero-lag drift and diffusion profiles of a series.
///
/// When `config.markov_lag` is absent the lag is found with
/// [`find_markov_scale`]; when `config.bin_limits` is absent the range is
/// [`default_bin_limits`]. The output has `num_bins − 1` bins.
///
/// # Errors
/// `InvalidInput` for empty series, bad limits, or a lag window reaching
/// past the series end; `NumericalError` for non-finite data.
///
/// # Example
/// ```rust
/// use km_langevin::config::KmConfig;
/// use km_langevin::km_coefficients::estimate_km_coefficients;
/// use km_langevin::regenerate::regenerate_series;
/// use km_langevin::polynomial::FitCoefficients;
/// use km_langevin::config::RegenerationConfig;
///
/// let model = FitCoefficients::new(vec![-1.0, 0.0], vec![0.0, 0.0, 0.5]).unwrap();
/// let series = regenerate_series(0.0, &model, &RegenerationConfig {
///     length: 20_000,
///     dt: 0.1,
///     seed: Some(3),
/// }).unwrap();
///
/// let config = KmConfig { num_bins: 30, markov_lag: Some(2), ..KmConfig::default() };
/// let profile = estimate_km_coefficients(&series, &config).unwrap();
/// assert_eq!(profile.bin_centers.len(), 29);
/// assert_eq!(profile.lags, vec![2, 3]);
/// ```
pub fn estimate_km_coefficients(series: &[f64], config: &KmConfig) -> KmResult<KmProfile> {
    validate_non_empty(series, "series")?;
    validate_all_finite(series, "series")?;
    config.validate()?;

    let markov_lag = match config.markov_lag {
        Some(lag) => lag,
        None => find_markov_scale(series, &config.markov)?,
    };
    let last_lag = markov_lag
        .checked_mul(2)
        .map(|window_end| window_end - 1)
        .filter(|&last| last < series.len())
        .ok_or_else(|| {
            KramersMoyalError::invalid_input(
                "markov_lag",
                format!(
                    "lag window of {} lags starting at {} must end before series length {}",
                    markov_lag,
                    markov_lag,
                    series.len()
                ),
            )
        })?;

    let bin_limits = match config.bin_limits {
        Some(limits) => limits,
        None => default_bin_limits(series)?,
    };
    let (edges, centers) = build_grid(&bin_limits, config.num_bins)?;
    log::debug!(
        "KM estimation: lag {}, {} edges over [{:.6}, {:.6}]",
        markov_lag,
        edges.len(),
        bin_limits.lower,
        bin_limits.upper
    );

    let digitized = digitize(series, &edges)?;
    let labels = digitized.labels();
    let displacement = displacement_matrix(&centers);
    let lags: Vec<usize> = (markov_lag..=last_lag).collect();

    let lag_moments = |&tau: &usize| conditional_moments(labels, tau, &displacement, config.dt);

    #[cfg(feature = "parallel")]
    let per_lag: Vec<(Vec<f64>, Vec<f64>)> = {
        use rayon::prelude::*;
        lags.par_iter().map(lag_moments).collect::<KmResult<_>>()?
    };

    #[cfg(not(feature = "parallel"))]
    let per_lag: Vec<(Vec<f64>, Vec<f64>)> = lags.iter().map(lag_moments).collect::<KmResult<_>>()?;

    let mut raw_drift = Vec::with_capacity(lags.len());
    let mut raw_diffusion = Vec::with_capacity(lags.len());
    for (first, second) in per_lag {
        raw_drift.push(first);
        raw_diffusion.push(second);
    }

    let lag_axis: Vec<f64> = lags.iter().map(|&tau| tau as f64).collect();
    let num_reported = centers.len() - 1;
    let mut drift = Vec::with_capacity(num_reported);
    let mut diffusion = Vec::with_capacity(num_reported);
    for bin in 0..num_reported {
        let d1: Vec<f64> = raw_drift.iter().map(|row| row[bin]).collect();
        let d2: Vec<f64> = raw_diffusion.iter().map(|row| row[bin]).collect();
        drift.push(extrapolate_to_zero(&lag_axis, &d1)?);
        diffusion.push(extrapolate_to_zero(&lag_axis, &d2)?);
    }

    let profile = KmProfile {
        bin_centers: centers[..num_reported].to_vec(),
        drift,
        diffusion,
        lags,
        raw_drift,
        raw_diffusion,
        markov_lag,
        bin_limits,
    };

    let visited = profile.visited_bins();
    if visited == 0 {
        log::warn!("KM estimation: no bin received any transitions; profiles are all zero");
    } else if visited < num_reported {
        log::debug!(
            "KM estimation: {} of {} bins unvisited, defaulted to 0.0",
            num_reported - visited,
            num_reported
        );
    }
    Ok(profile)
}
