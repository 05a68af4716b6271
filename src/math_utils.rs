//! Numerical helpers shared by the estimators.
//!
//! Grid construction, range and dispersion statistics, and tolerant float
//! comparisons.

use crate::errors::{validate_all_finite, validate_non_empty, KramersMoyalError, KmResult};
use statrs::statistics::Statistics;

/// Linearly spaced grid of `n` points from `start` to `stop` inclusive.
///
/// The last point is exactly `stop`. `n == 1` yields `[start]`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut grid: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            grid[n - 1] = stop;
            grid
        }
    }
}

/// Minimum and maximum of a non-empty, finite series.
pub fn finite_range(data: &[f64]) -> KmResult<(f64, f64)> {
    validate_non_empty(data, "series")?;
    validate_all_finite(data, "series")?;
    let (min, max) = data
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });
    Ok((min, max))
}

/// Population standard deviation (divisor `n`).
pub fn population_std(data: &[f64]) -> KmResult<f64> {
    validate_non_empty(data, "series")?;
    let std = Statistics::population_std_dev(data.iter());
    if !std.is_finite() {
        return Err(KramersMoyalError::NumericalError {
            reason: "standard deviation is not finite".to_string(),
            operation: Some("population_std".to_string()),
        });
    }
    Ok(std)
}

/// Mean spacing of a grid.
pub fn mean_spacing(grid: &[f64]) -> f64 {
    if grid.len() < 2 {
        return 0.0;
    }
    (grid[grid.len() - 1] - grid[0]) / (grid.len() - 1) as f64
}

/// Safe floating point operations.
pub mod float_ops {
    /// Approximate equality with an absolute-or-relative tolerance.
    pub fn approx_eq_eps(a: f64, b: f64, epsilon: f64) -> bool {
        let diff = (a - b).abs();
        diff <= epsilon || diff <= epsilon * a.abs().max(b.abs())
    }
}
