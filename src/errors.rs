//! Error types and validation functions for Kramers-Moyal estimation.
//!
//! Malformed input or configuration is surfaced to the caller immediately.
//! Degenerate-but-expected numeric situations (empty transition rows, bins
//! that are never visited, negative fitted diffusion) are recovered locally
//! by the estimators and never show up here.

use thiserror::Error;

/// Error types for Kramers-Moyal estimation and regeneration.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum KramersMoyalError {
    /// Malformed input data or an out-of-range argument.
    #[error("Invalid input: {parameter}: {reason}")]
    InvalidInput {
        /// Name of the offending argument
        parameter: String,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration that breaks a precondition of the estimation algorithm.
    #[error("Invalid configuration: {parameter} = {value}, expected {constraint}")]
    InvalidConfiguration {
        /// Configuration field name
        parameter: String,
        /// Value that was supplied
        value: f64,
        /// Valid range or constraint description
        constraint: String,
    },

    /// Too few usable data points for the requested computation.
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData {
        /// Minimum required data points
        required: usize,
        /// Actual number of usable data points
        actual: usize,
    },

    /// Numerical computation error (non-finite data, failed decomposition).
    #[error("Numerical computation failed: {reason}")]
    NumericalError {
        /// Detailed reason for numerical failure
        reason: String,
        /// Operation that failed, if known
        operation: Option<String>,
    },

    /// Named series not registered with the analyzer.
    #[error("Time series not found: {name}")]
    SeriesNotFound {
        /// Name that was looked up
        name: String,
    },
}

/// Result type for Kramers-Moyal operations.
pub type KmResult<T> = Result<T, KramersMoyalError>;

impl KramersMoyalError {
    /// Shorthand for an [`KramersMoyalError::InvalidInput`] error.
    pub fn invalid_input(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for an [`KramersMoyalError::InvalidConfiguration`] error.
    pub fn invalid_configuration(parameter: &str, value: f64, constraint: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            value,
            constraint: constraint.into(),
        }
    }
}

/// Validates that data has at least `min_required` points.
///
/// # Example
/// ```rust
/// use km_langevin::errors::validate_data_length;
///
/// let data = vec![1.0, 2.0, 3.0];
/// assert!(validate_data_length(&data, 2).is_ok());
/// assert!(validate_data_length(&data, 5).is_err());
/// ```
pub fn validate_data_length(data: &[f64], min_required: usize) -> KmResult<()> {
    if data.len() < min_required {
        Err(KramersMoyalError::InsufficientData {
            required: min_required,
            actual: data.len(),
        })
    } else {
        Ok(())
    }
}

/// Validates that a series is non-empty.
pub fn validate_non_empty<T>(data: &[T], name: &str) -> KmResult<()> {
    if data.is_empty() {
        return Err(KramersMoyalError::invalid_input(name, "series is empty"));
    }
    Ok(())
}

/// Validates that all values in a slice are finite.
///
/// Returns on the first non-finite value, naming its index.
///
/// # Example
/// ```rust
/// use km_langevin::errors::validate_all_finite;
///
/// assert!(validate_all_finite(&[1.0, 2.0], "x").is_ok());
/// assert!(validate_all_finite(&[1.0, f64::NAN], "x").is_err());
/// ```
pub fn validate_all_finite(data: &[f64], name: &str) -> KmResult<()> {
    if let Some((i, value)) = data.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(KramersMoyalError::NumericalError {
            reason: format!("{} contains non-finite value at index {}: {}", name, i, value),
            operation: None,
        });
    }
    Ok(())
}

/// Validates that a sequence is strictly increasing and finite.
///
/// Used for bin edges; an empty or single-element sequence is accepted.
pub fn validate_strictly_increasing(values: &[f64], name: &str) -> KmResult<()> {
    validate_all_finite(values, name)?;
    if let Some(i) = values.windows(2).position(|w| w[1] <= w[0]) {
        return Err(KramersMoyalError::invalid_input(
            name,
            format!(
                "must be strictly increasing, but element {} ({}) >= element {} ({})",
                i,
                values[i],
                i + 1,
                values[i + 1]
            ),
        ));
    }
    Ok(())
}

/// Validates that a count-like argument is nonzero.
pub fn validate_positive(value: usize, name: &str) -> KmResult<()> {
    if value == 0 {
        return Err(KramersMoyalError::invalid_input(name, "must be positive"));
    }
    Ok(())
}

/// Validates that a step size is finite and strictly positive.
pub fn validate_step_size(dt: f64, name: &str) -> KmResult<()> {
    if !dt.is_finite() || dt <= 0.0 {
        return Err(KramersMoyalError::invalid_configuration(
            name,
            dt,
            "a finite value > 0",
        ));
    }
    Ok(())
}
