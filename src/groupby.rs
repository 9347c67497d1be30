//! Multi-coordinate grouped reductions
//!
//! [`LabeledArray::multi_groupby`] partitions every dimension touched by the
//! grouping coordinates and returns a [`MultiGroupBy`] handle. Reducing through
//! the handle collapses each partition to one position, so every grouped
//! dimension is replaced by a partition axis of the same name, in
//! first-occurrence order of its keys.

use crate::array::LabeledArray;
use crate::coords::{Coordinate, Label};
use crate::errors::Result;
use crate::index::{CoordinateIndex, DimGroup};
use crate::partition::{combinations, partition_group, Partition};
use crate::statistics::{ReduceDims, Reduction, StatisticalReduction};
use ndarray::{ArrayD, Axis};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Grouping handle over a borrowed array
#[derive(Debug, Clone)]
pub struct MultiGroupBy<'a> {
    array: &'a LabeledArray,
    index: CoordinateIndex,
    partitions: Vec<Vec<Partition>>,
}

impl LabeledArray {
    /// Group by several coordinates at once
    ///
    /// Coordinates sharing a dimension form one composite key along it;
    /// coordinates on different dimensions partition each dimension
    /// independently.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoordinate` before any partitioning if a name is neither
    /// a coordinate nor a dimension of the array.
    pub fn multi_groupby<S: AsRef<str>>(&self, coord_names: &[S]) -> Result<MultiGroupBy<'_>> {
        let index = CoordinateIndex::resolve(self, coord_names)?;
        let partitions = index
            .groups()
            .iter()
            .map(|group| partition_group(self, group))
            .collect::<Result<Vec<_>>>()?;

        Ok(MultiGroupBy {
            array: self,
            index,
            partitions,
        })
    }
}

impl<'a> MultiGroupBy<'a> {
    /// The resolved dimension groups
    #[must_use]
    pub fn groups(&self) -> &[DimGroup] {
        self.index.groups()
    }

    /// Partitions of each grouped dimension
    pub fn partitions(&self) -> impl Iterator<Item = (&DimGroup, &[Partition])> {
        self.index
            .groups()
            .iter()
            .zip(self.partitions.iter().map(Vec::as_slice))
    }

    /// Reduce every partition with `operation`
    ///
    /// Grouped dimensions are always reduced within each partition. `dims`
    /// adds further dimensions that are reduced completely and dropped together
    /// with their coordinates.
    ///
    /// On a grouped dimension, a coordinate outside the grouping set survives
    /// only if it is constant within every partition; otherwise it is dropped
    /// with a warning.
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` for an unknown dimension in `dims`.
    pub fn reduce(&self, operation: Reduction, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        let array = self.array;
        let groups = self.index.groups();

        let extra: Vec<usize> = match dims.into() {
            ReduceDims::Grouped if self.index.is_empty() => (0..array.ndim()).collect(),
            ReduceDims::Grouped => Vec::new(),
            ReduceDims::All => (0..array.ndim()).collect(),
            ReduceDims::Dims(names) => names
                .iter()
                .map(|d| array.axis_of(d))
                .collect::<Result<Vec<_>>>()?,
        };

        let grouped_axes: Vec<usize> = groups.iter().map(|g| g.axis).collect();
        let mut reduced_axes = grouped_axes.clone();
        for axis in extra {
            if !reduced_axes.contains(&axis) {
                reduced_axes.push(axis);
            }
        }
        let kept_axes: Vec<usize> = (0..array.ndim())
            .filter(|a| !reduced_axes.contains(a))
            .collect();

        let counts: Vec<usize> = self.partitions.iter().map(Vec::len).collect();
        let combos = combinations(&counts);
        debug!(
            operation = operation.as_str(),
            groups = combos.len(),
            "reducing partitions"
        );

        let data = array.data();
        let blocks = combos
            .par_iter()
            .map(|combo| {
                let mut block: Option<ArrayD<f64>> = None;
                for ((group, partitions), &choice) in groups.iter().zip(&self.partitions).zip(combo)
                {
                    let source = block.as_ref().unwrap_or(data);
                    let next = source.select(Axis(group.axis), &partitions[choice].positions);
                    block = Some(next);
                }
                block
                    .unwrap_or_else(|| data.clone())
                    .reduce_axes(&reduced_axes, operation)
            })
            .collect::<Result<Vec<_>>>()?;

        // Partition axes first, then kept axes
        let mut shape = counts.clone();
        shape.extend(kept_axes.iter().map(|&a| array.shape()[a]));
        let mut out = ArrayD::<f64>::from_elem(shape, f64::NAN);
        for (combo, block) in combos.iter().zip(&blocks) {
            let mut view = out.view_mut();
            for &choice in combo {
                view = view.index_axis_move(Axis(0), choice);
            }
            view.assign(block);
        }

        // Back to the source axis order
        let mut dims = Vec::new();
        let mut order = Vec::new();
        for (axis, dim) in array.dims().iter().enumerate() {
            if let Some(i) = grouped_axes.iter().position(|&a| a == axis) {
                order.push(i);
            } else if let Some(i) = kept_axes.iter().position(|&a| a == axis) {
                order.push(grouped_axes.len() + i);
            } else {
                continue;
            }
            dims.push(dim.clone());
        }
        let out = out.permuted_axes(order).as_standard_layout().into_owned();

        let coords = self.collapse_coords(&reduced_axes);
        Ok(LabeledArray::from_parts(
            out,
            dims,
            coords,
            array.attrs().clone(),
        ))
    }

    fn collapse_coords(&self, reduced_axes: &[usize]) -> BTreeMap<String, Coordinate> {
        let mut coords = BTreeMap::new();
        for (name, coordinate) in self.array.coord_map() {
            let Some(dim) = coordinate.dim() else {
                coords.insert(name.clone(), coordinate.clone());
                continue;
            };
            let Coordinate::Indexed { labels, .. } = coordinate else {
                continue;
            };

            let grouped = self
                .partitions()
                .find(|(group, _)| group.dim == dim);
            if let Some((group, partitions)) = grouped {
                match per_partition_labels(labels, partitions) {
                    Some(labels) => {
                        coords.insert(
                            name.clone(),
                            Coordinate::Indexed {
                                dim: group.dim.clone(),
                                labels,
                            },
                        );
                    }
                    None => warn!(
                        coord = %name,
                        dim = %dim,
                        "coordinate varies within a group and was dropped"
                    ),
                }
            } else if self
                .array
                .axis_of(dim)
                .map_or(false, |axis| !reduced_axes.contains(&axis))
            {
                coords.insert(name.clone(), coordinate.clone());
            }
        }
        coords
    }

    /// Mean of every partition
    ///
    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn mean(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Mean, dims)
    }

    /// Sum of every partition
    ///
    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn sum(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Sum, dims)
    }

    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn min(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Min, dims)
    }

    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn max(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Max, dims)
    }

    /// Population standard deviation of every partition
    ///
    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn std(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Std, dims)
    }

    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn var(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Var, dims)
    }

    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn count(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Count, dims)
    }

    /// # Errors
    ///
    /// See [`reduce`](Self::reduce).
    pub fn median(&self, dims: impl Into<ReduceDims>) -> Result<LabeledArray> {
        self.reduce(Reduction::Median, dims)
    }
}

// One label per partition, or None if any partition holds more than one.
fn per_partition_labels(labels: &[Label], partitions: &[Partition]) -> Option<Vec<Label>> {
    partitions
        .iter()
        .map(|p| {
            let first = &labels[p.positions[0]];
            p.positions
                .iter()
                .all(|&i| labels[i] == *first)
                .then(|| first.clone())
        })
        .collect()
}
