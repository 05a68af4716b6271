//! Empirical lagged transition matrices of digitized series.

use crate::errors::{validate_non_empty, validate_positive, KramersMoyalError, KmResult};
use crate::math_utils::float_ops::approx_eq_eps;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-normalized transition frequencies between discrete states.
///
/// Entry `(i, j)` is the fraction of visits to state `i` that were followed
/// by state `j` after the lag. Every row sums to one, or is identically zero
/// when state `i` never had a successor at that lag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionMatrix {
    dim: usize,
    data: Vec<f64>,
}

impl TransitionMatrix {
    /// All-zero matrix of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    /// Number of states (rows and columns).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Entry `(i, j)`; zero outside the matrix.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i < self.dim && j < self.dim {
            self.data[i * self.dim + j]
        } else {
            0.0
        }
    }

    /// Row `i` as a slice.
    ///
    /// # Panics
    /// If `i >= dim`; use [`TransitionMatrix::get`] for bounds-tolerant access.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Sum of row `i`; zero outside the matrix.
    pub fn row_sum(&self, i: usize) -> f64 {
        if i < self.dim {
            self.row(i).iter().sum()
        } else {
            0.0
        }
    }

    /// Iterator over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.dim.max(1)).take(self.dim)
    }

    /// Whether every row sums to one within `tol` or is identically zero.
    pub fn is_row_stochastic(&self, tol: f64) -> bool {
        self.rows().all(|row| {
            let sum: f64 = row.iter().sum();
            row.iter().all(|&p| p == 0.0) || approx_eq_eps(sum, 1.0, tol)
        })
    }

    /// Copy into nested rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

/// Transition matrix of `series` at lag `tau`, sized `1 + max(series)`.
///
/// # Errors
/// `InvalidInput` if the series is empty, `tau == 0`, or `tau >= series.len()`.
///
/// # Example
/// ```rust
/// use km_langevin::transition::transition_matrix;
///
/// let m = transition_matrix(&[0, 1, 2, 0, 1, 2, 0, 1, 2], 1).unwrap();
/// assert_eq!(m.row(0), &[0.0, 1.0, 0.0]);
/// assert_eq!(m.row(2), &[1.0, 0.0, 0.0]);
/// ```
pub fn transition_matrix(series: &[usize], tau: usize) -> KmResult<TransitionMatrix> {
    validate_non_empty(series, "series")?;
    validate_positive(tau, "tau")?;
    if tau >= series.len() {
        return Err(KramersMoyalError::invalid_input(
            "tau",
            format!("lag {} must be smaller than series length {}", tau, series.len()),
        ));
    }
    let n_states = 1 + series.iter().copied().max().unwrap_or(0);
    Ok(count_transitions(series, tau, n_states))
}

/// Transition matrix over a caller-fixed state space of `n_states` states.
///
/// Sub-intervals and fixed binnings need matrices that line up with a global
/// state space even when the window never reaches the highest states. A
/// window with no pair `(t, t + tau)` yields the zero matrix.
///
/// # Errors
/// `InvalidInput` if `tau == 0` or a label is `>= n_states`.
pub fn transition_matrix_with_states(
    series: &[usize],
    tau: usize,
    n_states: usize,
) -> KmResult<TransitionMatrix> {
    validate_positive(tau, "tau")?;
    if let Some(&label) = series.iter().find(|&&label| label >= n_states) {
        return Err(KramersMoyalError::invalid_input(
            "series",
            format!("label {} outside state space of size {}", label, n_states),
        ));
    }
    Ok(count_transitions(series, tau, n_states))
}

fn count_transitions(series: &[usize], tau: usize, n_states: usize) -> TransitionMatrix {
    let mut matrix = TransitionMatrix::zeros(n_states);
    if tau >= series.len() {
        return matrix;
    }

    for (&from, &to) in series.iter().zip(&series[tau..]) {
        matrix.data[from * n_states + to] += 1.0;
    }

    for row in matrix.data.chunks_mut(n_states.max(1)) {
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            row.iter_mut().for_each(|count| *count /= total);
        }
    }
    matrix
}
