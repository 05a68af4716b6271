//! State-space discretization.
//!
//! Maps a continuous series onto integer bin labels. With `N` edges the
//! labels run from `0` (below the first edge) to `N` (at or above the last
//! edge); a value equal to an edge belongs to the bin on its right.

use crate::errors::{validate_non_empty, validate_strictly_increasing, KramersMoyalError, KmResult};
use crate::math_utils::linspace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Strictly increasing, finite bin edges.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BinEdges {
    edges: Vec<f64>,
}

impl BinEdges {
    /// Wrap explicit edges after validating them.
    pub fn new(edges: Vec<f64>) -> KmResult<Self> {
        validate_non_empty(&edges, "bin_edges")?;
        validate_strictly_increasing(&edges, "bin_edges")?;
        Ok(Self { edges })
    }

    /// `n` equally spaced edges spanning `[lower, upper]`.
    pub fn linear(lower: f64, upper: f64, n: usize) -> KmResult<Self> {
        if n < 2 {
            return Err(KramersMoyalError::invalid_input(
                "num_edges",
                format!("need at least 2 edges, got {}", n),
            ));
        }
        if !(lower.is_finite() && upper.is_finite()) || lower >= upper {
            return Err(KramersMoyalError::invalid_input(
                "bin_limits",
                format!("need finite lower < upper, got [{}, {}]", lower, upper),
            ));
        }
        Self::new(linspace(lower, upper, n))
    }

    /// Edge values.
    pub fn as_slice(&self) -> &[f64] {
        &self.edges
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Always false; edges are validated non-empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of distinct labels a digitized series can carry (`len + 1`).
    pub fn num_states(&self) -> usize {
        self.edges.len() + 1
    }

    /// Label of a single value: the count of edges `<= value`.
    pub fn label(&self, value: f64) -> usize {
        self.edges.partition_point(|&edge| edge <= value)
    }
}

/// Series of bin labels aligned with its source series.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DigitizedSeries {
    labels: Vec<usize>,
}

impl DigitizedSeries {
    /// Labels in series order.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Series length.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always false; digitized series are validated non-empty.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Largest label present.
    pub fn max_label(&self) -> usize {
        self.labels.iter().copied().max().unwrap_or(0)
    }
}

/// Digitize a series against validated edges.
pub fn digitize(series: &[f64], edges: &BinEdges) -> KmResult<DigitizedSeries> {
    validate_non_empty(series, "series")?;
    let labels = series.iter().map(|&x| edges.label(x)).collect();
    Ok(DigitizedSeries { labels })
}

/// Digitize against raw edges, validating them first.
pub fn digitize_with_edges(series: &[f64], edges: &[f64]) -> KmResult<DigitizedSeries> {
    let edges = BinEdges::new(edges.to_vec())?;
    digitize(series, &edges)
}
