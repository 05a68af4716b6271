//! Least-squares polynomial fits of the Kramers-Moyal profiles.
//!
//! Coefficients are ordered from the highest power down to the constant
//! term. The Vandermonde system is column-scaled and solved by SVD, so
//! rank-deficient designs degrade to the minimum-norm solution rather than
//! failing outright.

use crate::config::FitConfig;
use crate::errors::{validate_all_finite, validate_data_length, KramersMoyalError, KmResult};
use nalgebra::{DMatrix, DVector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Singular values below this fraction of the largest are treated as zero.
const SVD_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Fitted drift and diffusion polynomials.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitCoefficients {
    /// D1 coefficients, length `d1_order + 1`, highest power first
    pub drift: Vec<f64>,
    /// D2 coefficients, length `d2_order + 1`, highest power first
    pub diffusion: Vec<f64>,
}

impl FitCoefficients {
    /// Wrap coefficient vectors, rejecting empty or non-finite ones.
    pub fn new(drift: Vec<f64>, diffusion: Vec<f64>) -> KmResult<Self> {
        if drift.is_empty() || diffusion.is_empty() {
            return Err(KramersMoyalError::invalid_input(
                "coefficients",
                "drift and diffusion need at least one coefficient each",
            ));
        }
        validate_all_finite(&drift, "drift coefficients")?;
        validate_all_finite(&diffusion, "diffusion coefficients")?;
        Ok(Self { drift, diffusion })
    }
}

/// Evaluate a polynomial (highest power first) with Horner's scheme.
///
/// ```rust
/// use km_langevin::polynomial::polyval;
///
/// assert_eq!(polyval(&[2.0, -1.0, 3.0], 2.0), 9.0);
/// assert_eq!(polyval(&[], 2.0), 0.0);
/// ```
pub fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().fold(0.0, |acc, &c| acc * x + c)
}

/// Least-squares polynomial of degree `order` through `(x, y)`.
///
/// # Errors
/// `InsufficientData` with fewer than `order + 1` points, `InvalidInput`
/// for mismatched lengths, `NumericalError` for non-finite data.
pub fn polyfit(x: &[f64], y: &[f64], order: usize) -> KmResult<Vec<f64>> {
    if x.len() != y.len() {
        return Err(KramersMoyalError::invalid_input(
            "y",
            format!("length {} does not match x length {}", y.len(), x.len()),
        ));
    }
    let n_coeffs = order + 1;
    validate_data_length(x, n_coeffs)?;
    validate_all_finite(x, "x")?;
    validate_all_finite(y, "y")?;

    let mut design = DMatrix::from_fn(x.len(), n_coeffs, |row, col| {
        x[row].powi((order - col) as i32)
    });

    let mut scales = Vec::with_capacity(n_coeffs);
    for mut column in design.column_iter_mut() {
        let norm = column.norm();
        let scale = if norm > 0.0 { norm } else { 1.0 };
        column /= scale;
        scales.push(scale);
    }

    let rhs = DVector::from_column_slice(y);
    let svd = design.svd(true, true);
    let cutoff = svd.singular_values.max() * SVD_RELATIVE_TOLERANCE;
    let solution = svd
        .solve(&rhs, cutoff)
        .map_err(|reason| KramersMoyalError::NumericalError {
            reason: reason.to_string(),
            operation: Some("polyfit".to_string()),
        })?;

    let coeffs: Vec<f64> = solution
        .iter()
        .zip(&scales)
        .map(|(c, scale)| c / scale)
        .collect();
    validate_all_finite(&coeffs, "polynomial coefficients")?;
    Ok(coeffs)
}

/// Fit over the points whose `y` is nonzero; zero marks "no estimate".
pub fn polyfit_nonzero(x: &[f64], y: &[f64], order: usize) -> KmResult<Vec<f64>> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(_, value)| **value != 0.0)
        .map(|(&xi, &yi)| (xi, yi))
        .unzip();
    polyfit(&xs, &ys, order)
}

/// Fit drift and diffusion polynomials to extrapolated KM profiles.
///
/// Bins with a zero estimate are excluded from the respective fit.
///
/// # Errors
/// `InsufficientData` when fewer than `order + 1` nonzero bins remain.
pub fn fit_km_coefficients(
    bin_centers: &[f64],
    drift: &[f64],
    diffusion: &[f64],
    config: &FitConfig,
) -> KmResult<FitCoefficients> {
    if drift.len() != bin_centers.len() || diffusion.len() != bin_centers.len() {
        return Err(KramersMoyalError::invalid_input(
            "profiles",
            format!(
                "drift ({}) and diffusion ({}) must align with {} bin centers",
                drift.len(),
                diffusion.len(),
                bin_centers.len()
            ),
        ));
    }
    let drift = polyfit_nonzero(bin_centers, drift, config.d1_order)?;
    let diffusion = polyfit_nonzero(bin_centers, diffusion, config.d2_order)?;
    Ok(FitCoefficients { drift, diffusion })
}
