//! Core statistical operations and traits
//!
//! This module defines the fixed set of reductions the grouping engine can
//! dispatch to, and the dimension selection they apply over.

use crate::errors::{AssemblyError, Result};
use ndarray::ArrayD;
use std::str::FromStr;

/// Supported statistical reductions
///
/// NaN values are skipped. A lane with no valid values reduces to NaN,
/// except for `Sum` and `Count` which reduce to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Arithmetic mean
    Mean,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Population standard deviation
    Std,
    /// Population variance
    Var,
    /// Number of non-NaN values
    Count,
    /// Median value
    Median,
}

impl Reduction {
    pub const ALL: [Self; 8] = [
        Self::Mean,
        Self::Sum,
        Self::Min,
        Self::Max,
        Self::Std,
        Self::Var,
        Self::Count,
        Self::Median,
    ];

    /// Get the string representation of the reduction
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Std => "std",
            Self::Var => "var",
            Self::Count => "count",
            Self::Median => "median",
        }
    }

    /// Reduce a sequence of values to one value
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reduce_values<I>(self, values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        let mut valid: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        let count = valid.len();

        match self {
            Self::Count => count as f64,
            Self::Sum => valid.iter().sum(),
            _ if count == 0 => f64::NAN,
            Self::Mean => valid.iter().sum::<f64>() / count as f64,
            Self::Min => valid.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => valid.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Var => variance(&valid),
            Self::Std => variance(&valid).sqrt(),
            Self::Median => {
                valid.sort_by(f64::total_cmp);
                let mid = count / 2;
                if count % 2 == 0 {
                    (valid[mid - 1] + valid[mid]) / 2.0
                } else {
                    valid[mid]
                }
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn variance(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

impl FromStr for Reduction {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| AssemblyError::UnknownReduction(s.to_string()))
    }
}

/// Which dimensions a reduction collapses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReduceDims {
    /// Only the dimensions carrying grouping coordinates; every dimension
    /// when there is nothing to group by
    #[default]
    Grouped,
    /// Every dimension of the array
    All,
    /// The named dimensions, in addition to any grouped dimensions
    Dims(Vec<String>),
}

impl ReduceDims {
    /// Select the named dimensions
    pub fn dims<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Dims(names.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for ReduceDims {
    fn from(dim: &str) -> Self {
        Self::Dims(vec![dim.to_string()])
    }
}

/// Trait for types that can perform statistical reductions along axes
pub trait StatisticalReduction<T> {
    /// Perform a statistical reduction along the specified axis
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds for the array.
    fn reduce_along_axis(&self, axis: usize, operation: Reduction) -> Result<ArrayD<T>>;

    /// Perform a statistical reduction jointly over several axes
    ///
    /// # Errors
    ///
    /// Returns an error if any axis is out of bounds or repeated.
    fn reduce_axes(&self, axes: &[usize], operation: Reduction) -> Result<ArrayD<T>>;
}

impl StatisticalReduction<f64> for ArrayD<f64> {
    fn reduce_along_axis(&self, axis: usize, operation: Reduction) -> Result<ArrayD<f64>> {
        self.reduce_axes(&[axis], operation)
    }

    fn reduce_axes(&self, axes: &[usize], operation: Reduction) -> Result<ArrayD<f64>> {
        for (i, &axis) in axes.iter().enumerate() {
            if axis >= self.ndim() {
                return Err(AssemblyError::StatisticsError(format!(
                    "Axis {axis} is out of bounds for array with {} dimensions",
                    self.ndim()
                )));
            }
            if axes[..i].contains(&axis) {
                return Err(AssemblyError::StatisticsError(format!(
                    "Axis {axis} listed more than once"
                )));
            }
        }

        super::parallel::parallel_reduce_axes(self, axes, operation)
    }
}
