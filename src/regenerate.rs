//! Synthetic trajectories from fitted Langevin models.
//!
//! Integrates `dx = D1(x) dt + sqrt(2 D2(x)) dW` with the Euler–Maruyama
//! scheme:
//!
//! ```text
//! x_{t+1} = x_t + D1(x_t)·dt + sqrt(2·D2(x_t)·dt)·ξ_t,   ξ_t ~ N(0, 1)
//! ```
//!
//! A fitted diffusion polynomial can dip below zero near the edges of the
//! data range; its absolute value is used there.

use crate::config::RegenerationConfig;
use crate::errors::{validate_all_finite, validate_step_size, KramersMoyalError, KmResult};
use crate::noise::{NoiseBank, NoiseSource};
use crate::polynomial::{polyval, FitCoefficients};

/// Drift and diffusion polynomials evaluated at arbitrary states.
#[derive(Debug, Clone, PartialEq)]
pub struct LangevinModel {
    coefficients: FitCoefficients,
}

impl LangevinModel {
    /// Model from fitted coefficients.
    pub fn new(coefficients: FitCoefficients) -> Self {
        Self { coefficients }
    }

    /// Underlying coefficients.
    pub fn coefficients(&self) -> &FitCoefficients {
        &self.coefficients
    }

    /// D1 at `x`.
    pub fn drift(&self, x: f64) -> f64 {
        polyval(&self.coefficients.drift, x)
    }

    /// D2 at `x`, made nonnegative.
    pub fn diffusion(&self, x: f64) -> f64 {
        polyval(&self.coefficients.diffusion, x).abs()
    }

    /// One Euler–Maruyama step from `x` driven by the standard normal draw `xi`.
    pub fn step(&self, x: f64, dt: f64, xi: f64) -> f64 {
        x + self.drift(x) * dt + (2.0 * self.diffusion(x) * dt).sqrt() * xi
    }

    /// Trajectory driven by pre-drawn noise, one sample per draw.
    ///
    /// The initial value is not included in the output.
    pub fn integrate(&self, x0: f64, dt: f64, noise: &[f64]) -> Vec<f64> {
        let mut x = x0;
        let mut series = Vec::with_capacity(noise.len());
        for &xi in noise {
            x = self.step(x, dt, xi);
            series.push(x);
        }
        series
    }

    /// Advance every element of a field by one step, each with its own draw.
    ///
    /// # Errors
    /// `InvalidInput` if `noise` is shorter than `values`.
    pub fn advance_field(&self, values: &mut [f64], dt: f64, noise: &[f64]) -> KmResult<()> {
        if noise.len() < values.len() {
            return Err(KramersMoyalError::invalid_input(
                "noise",
                format!("{} draws for a field of {} values", noise.len(), values.len()),
            ));
        }
        for (x, &xi) in values.iter_mut().zip(noise) {
            *x = self.step(*x, dt, xi);
        }
        Ok(())
    }

    /// Advance a field `steps` times using cyclic rows of a noise bank,
    /// starting at bank row `first_step`.
    pub fn advance_field_with_bank(
        &self,
        values: &mut [f64],
        dt: f64,
        bank: &NoiseBank,
        first_step: usize,
        steps: usize,
    ) -> KmResult<()> {
        for t in first_step..first_step + steps {
            self.advance_field(values, dt, bank.row(t))?;
        }
        Ok(())
    }
}

fn validate_start(x0: f64) -> KmResult<()> {
    if !x0.is_finite() {
        return Err(KramersMoyalError::invalid_input(
            "x_0",
            format!("initial value must be finite, got {}", x0),
        ));
    }
    Ok(())
}

/// Generate `config.length` samples starting from `x0`.
///
/// With `config.seed` set the output is bit-for-bit reproducible.
///
/// # Example
/// ```rust
/// use km_langevin::config::RegenerationConfig;
/// use km_langevin::polynomial::FitCoefficients;
/// use km_langevin::regenerate::regenerate_series;
///
/// let coeffs = FitCoefficients::new(vec![-0.5, 0.0], vec![0.0, 0.0, 0.2]).unwrap();
/// let config = RegenerationConfig { seed: Some(1), ..RegenerationConfig::default() };
/// let a = regenerate_series(0.0, &coeffs, &config).unwrap();
/// let b = regenerate_series(0.0, &coeffs, &config).unwrap();
/// assert_eq!(a.len(), 2000);
/// assert_eq!(a, b);
/// ```
pub fn regenerate_series(
    x0: f64,
    coefficients: &FitCoefficients,
    config: &RegenerationConfig,
) -> KmResult<Vec<f64>> {
    config.validate()?;
    let mut source = NoiseSource::from_optional_seed(config.seed);
    regenerate_with_source(x0, coefficients, config.length, config.dt, &mut source)
}

/// Generate `length` samples drawing noise from `source`.
pub fn regenerate_with_source(
    x0: f64,
    coefficients: &FitCoefficients,
    length: usize,
    dt: f64,
    source: &mut NoiseSource,
) -> KmResult<Vec<f64>> {
    let noise = source.draws(length);
    regenerate_with_noise(x0, coefficients, dt, &noise)
}

/// Generate one sample per entry of a pre-drawn standard normal buffer.
pub fn regenerate_with_noise(
    x0: f64,
    coefficients: &FitCoefficients,
    dt: f64,
    noise: &[f64],
) -> KmResult<Vec<f64>> {
    validate_start(x0)?;
    validate_step_size(dt, "dt")?;
    validate_all_finite(noise, "noise")?;

    if polyval(&coefficients.diffusion, x0) < 0.0 {
        log::warn!(
            "Diffusion polynomial is negative at x_0 = {}; using its absolute value",
            x0
        );
    }

    let model = LangevinModel::new(coefficients.clone());
    let series = model.integrate(x0, dt, noise);
    if let Some(position) = series.iter().position(|x| !x.is_finite()) {
        return Err(KramersMoyalError::NumericalError {
            reason: format!("trajectory diverged at step {}", position),
            operation: Some("regenerate".to_string()),
        });
    }
    Ok(series)
}
