//! Composite-key partitioning along a dimension
//!
//! Positions along a dimension are grouped by the tuple of coordinate labels
//! they carry. Partitions come out in first-occurrence order of their key and
//! each partition keeps its positions in ascending order.

use crate::array::LabeledArray;
use crate::coords::{Coordinate, Label};
use crate::errors::{AssemblyError, Result};
use crate::index::DimGroup;
use std::collections::HashMap;
use tracing::debug;

/// Tuple of coordinate labels read at one position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey(pub Vec<Label>);

impl CompositeKey {
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.0
    }
}

/// A key and the positions carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub key: CompositeKey,
    pub positions: Vec<usize>,
}

/// Partition the positions along `dim` by the labels of `coord_names`
///
/// Key elements follow the order of `coord_names`. Remnant coordinates are
/// accepted and contribute the same label at every position. With no
/// coordinate names every position shares the empty key.
///
/// # Errors
///
/// Returns `DimensionNotFound`, `UnknownCoordinate`, or `InvalidCoordinate`
/// when a coordinate is attached to a different dimension.
pub fn partition<S: AsRef<str>>(
    array: &LabeledArray,
    dim: &str,
    coord_names: &[S],
) -> Result<Vec<Partition>> {
    let size = array.dim_size(dim)?;

    let mut columns: Vec<&Coordinate> = Vec::with_capacity(coord_names.len());
    for name in coord_names.iter().map(AsRef::as_ref) {
        let coordinate = array.coord(name)?;
        if let Some(owner) = coordinate.dim() {
            if owner != dim {
                return Err(AssemblyError::InvalidCoordinate {
                    coord: name.to_string(),
                    message: format!("attached to dimension '{owner}', not '{dim}'"),
                });
            }
        }
        columns.push(coordinate);
    }

    let mut slots: HashMap<CompositeKey, usize> = HashMap::new();
    let mut partitions: Vec<Partition> = Vec::new();

    for position in 0..size {
        let key = CompositeKey(
            columns
                .iter()
                .filter_map(|c| c.label_at(position).cloned())
                .collect(),
        );
        match slots.get(&key) {
            Some(&slot) => partitions[slot].positions.push(position),
            None => {
                slots.insert(key.clone(), partitions.len());
                partitions.push(Partition {
                    key,
                    positions: vec![position],
                });
            }
        }
    }

    debug!(dim, partitions = partitions.len(), size, "partitioned dimension");
    Ok(partitions)
}

/// Partition along a resolved dimension group
///
/// A group flagged `by_position` gives every position its own partition,
/// keyed by the position itself.
///
/// # Errors
///
/// Propagates errors from [`partition`].
pub fn partition_group(array: &LabeledArray, group: &DimGroup) -> Result<Vec<Partition>> {
    if !group.by_position {
        return partition(array, &group.dim, &group.coords);
    }

    let size = array.dim_size(&group.dim)?;
    (0..size)
        .map(|position| {
            let label = i64::try_from(position).map_err(|_| AssemblyError::IndexOutOfBounds {
                dim: group.dim.clone(),
                position,
                size,
            })?;
            Ok(Partition {
                key: CompositeKey(vec![Label::Int(label)]),
                positions: vec![position],
            })
        })
        .collect()
}

/// Every combination of one index per entry of `counts`, last entry fastest
///
/// No entries yields the single empty combination.
pub(crate) fn combinations(counts: &[usize]) -> Vec<Vec<usize>> {
    if counts.contains(&0) {
        return Vec::new();
    }

    let total: usize = counts.iter().product();
    let mut result = Vec::with_capacity(total);
    let mut current = vec![0; counts.len()];
    for _ in 0..total {
        result.push(current.clone());
        for i in (0..counts.len()).rev() {
            current[i] += 1;
            if current[i] < counts[i] {
                break;
            }
            current[i] = 0;
        }
    }
    result
}
