//! Parallel computation implementations for statistical reductions
//!
//! This module contains the actual parallel computation logic for reductions.

use super::operations::Reduction;
use crate::errors::Result;
use ndarray::{ArrayD, Axis, Zip};
use tracing::debug;

/// Reduces jointly over `axes` using parallel processing
///
/// The reduced axes are moved to the end and flattened into a single lane
/// per output element; lanes are then reduced across the rayon pool. The
/// output keeps the remaining axes in their original order.
///
/// Callers are expected to have validated `axes`.
///
/// # Errors
///
/// Returns an error if the permuted array cannot be reshaped.
pub fn parallel_reduce_axes(
    data: &ArrayD<f64>,
    axes: &[usize],
    operation: Reduction,
) -> Result<ArrayD<f64>> {
    let original_shape = data.shape();

    let kept: Vec<usize> = (0..data.ndim()).filter(|a| !axes.contains(a)).collect();
    let order: Vec<usize> = kept.iter().chain(axes).copied().collect();

    let mut lane_shape: Vec<usize> = kept.iter().map(|&a| original_shape[a]).collect();
    let lane_len: usize = axes.iter().map(|&a| original_shape[a]).product();
    lane_shape.push(lane_len);

    let output_size: usize = lane_shape[..kept.len()].iter().product();
    debug!(
        operation = operation.as_str(),
        lanes = output_size,
        lane_len,
        threads = rayon::current_num_threads(),
        "reducing lanes"
    );

    // Reduced axes last, then collapse them into one
    let flat = data
        .view()
        .permuted_axes(order)
        .as_standard_layout()
        .into_owned()
        .into_shape(lane_shape)?;

    let result = Zip::from(flat.lanes(Axis(kept.len())))
        .par_map_collect(|lane| operation.reduce_values(lane.iter().copied()));

    Ok(result)
}
