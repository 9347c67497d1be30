//! Statistical reductions over labeled array data
//!
//! # Organization
//!
//! This module is organized into submodules:
//! - [`operations`]: The reduction set, dimension selection and the reduction trait
//! - [`parallel`]: Parallel lane reductions backed by rayon

pub mod operations;
pub mod parallel;

// Re-export the main types and functions for convenience
pub use operations::{ReduceDims, Reduction, StatisticalReduction};
pub use parallel::parallel_reduce_axes;
