//! assemblies: multi-coordinate grouping for labeled N-dimensional arrays
//!
//! A labeled array carries named dimensions and named coordinates. Standard
//! grouping assumes one coordinate per dimension; this crate groups by several
//! coordinates at once, including coordinates that share a dimension, and
//! re-attaches exactly the right coordinates to every dimension afterwards.
//!
//! ## Key Features
//!
//! - **Composite keys**: coordinates on the same dimension partition it jointly
//! - **Grouped reductions**: mean, sum, min, max, std, var, count and median per partition
//! - **Grouped apply**: run a function on every partition slice, keeping the input layout
//! - **Remnant coordinates**: scalar coordinates survive every operation
//! - **Parallel Processing**: partitions and reduction lanes are evaluated with Rayon
//!
//! ## Module Organization
//!
//! - [`array`]: The labeled array, its builder and label/position selection
//! - [`coords`]: Coordinate labels and descriptors
//! - [`index`]: Coordinate-to-dimension resolution
//! - [`partition`]: Composite-key partitioning along a dimension
//! - [`groupby`]: Grouped reductions through [`MultiGroupBy`]
//! - [`apply`]: Per-partition function application
//! - [`statistics`]: Reductions and parallel lane computation
//! - [`parallel`]: Parallel processing configuration
//! - [`errors`]: Centralized error handling
//!
//! ## Usage Example
//!
//! ```rust
//! use assemblies::prelude::*;
//! use ndarray::array;
//!
//! let assembly = LabeledArray::builder(array![1, 2, 3, 4, 5, 6])
//!     .dims(["multi_dim"])
//!     .coord_on("a", "multi_dim", ["a", "a", "a", "a", "a", "a"])
//!     .coord_on("b", "multi_dim", ["a", "a", "a", "b", "b", "b"])
//!     .build()?;
//!
//! let grouped = assembly.multi_groupby(&["a", "b"])?.mean(ReduceDims::Grouped)?;
//! assert_eq!(grouped.data().as_slice(), Some(&[2.0, 5.0][..]));
//!
//! let centered = assembly.multi_dim_apply(
//!     &["b"],
//!     |x, _| Ok(x.data() - x.aggregate(Reduction::Mean)),
//!     &ApplyOptions::new(),
//! )?;
//! assert_eq!(centered.data().as_slice(), Some(&[-1.0, 0.0, 1.0, -1.0, 0.0, 1.0][..]));
//! # Ok::<(), assemblies::AssemblyError>(())
//! ```

pub mod apply;
pub mod array;
pub mod coords;
pub mod errors;
pub mod groupby;
pub mod index;
pub mod parallel;
pub mod partition;
pub mod statistics;

// Direct re-exports for the public API
pub use apply::ApplyOptions;
pub use array::{Attributes, LabeledArray, LabeledArrayBuilder, Numeric};
pub use coords::{labels, Coordinate, Label};
pub use errors::{AssemblyError, Result};
pub use groupby::MultiGroupBy;
pub use index::{CoordinateIndex, DimGroup};
pub use parallel::{get_parallel_info, ParallelConfig, ParallelInfo};
pub use partition::{partition, partition_group, CompositeKey, Partition};
pub use statistics::{ReduceDims, Reduction, StatisticalReduction};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::apply::ApplyOptions;
    pub use crate::array::LabeledArray;
    pub use crate::coords::{Coordinate, Label};
    pub use crate::errors::{AssemblyError, Result};
    pub use crate::groupby::MultiGroupBy;
    pub use crate::parallel::ParallelConfig;
    pub use crate::statistics::{ReduceDims, Reduction};
}
