//! Coordinate-to-dimension resolution
//!
//! Groups the requested coordinate names by the dimension they are attached
//! to. Each resulting [`DimGroup`] defines one composite key per position
//! along its dimension.

use crate::array::LabeledArray;
use crate::coords::Coordinate;
use crate::errors::{AssemblyError, Result};
use tracing::debug;

/// Requested coordinates that share one dimension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimGroup {
    /// Dimension name
    pub dim: String,
    /// Axis of the dimension in the source array
    pub axis: usize,
    /// Coordinate names, in the order the caller requested them
    pub coords: Vec<String>,
    /// Partition by position because the dimension has no coordinates
    pub by_position: bool,
}

/// Resolved grouping structure of an array for a set of coordinate names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinateIndex {
    groups: Vec<DimGroup>,
    remnants: Vec<String>,
}

impl CoordinateIndex {
    /// Resolve which dimension each requested coordinate lives on
    ///
    /// Groups come out in the array's axis order, so the order of
    /// `coord_names` across dimensions does not matter. Requested remnant
    /// coordinates are recorded but never partition anything. Repeated names
    /// are ignored.
    ///
    /// A name that is not a coordinate but is a dimension stands for every
    /// indexed coordinate on that dimension, in name order. A dimension
    /// without coordinates is grouped by position. A coordinate always takes
    /// precedence over a dimension of the same name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoordinate` for the first name that is neither a
    /// coordinate nor a dimension of `array`.
    pub fn resolve<S: AsRef<str>>(array: &LabeledArray, coord_names: &[S]) -> Result<Self> {
        let mut groups: Vec<DimGroup> = Vec::new();
        let mut remnants: Vec<String> = Vec::new();

        for name in coord_names.iter().map(AsRef::as_ref) {
            let coordinate = match array.coord(name) {
                Ok(coordinate) => coordinate,
                Err(err @ AssemblyError::UnknownCoordinate { .. }) => {
                    if array.axis_of(name).is_err() {
                        return Err(err);
                    }
                    let members = array.coords_on(name);
                    let group = group_entry(&mut groups, array, name)?;
                    if members.is_empty() {
                        group.by_position = true;
                    }
                    for member in members {
                        if !group.coords.iter().any(|c| c == member) {
                            group.coords.push(member.to_string());
                        }
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            match coordinate {
                Coordinate::Remnant(_) => {
                    if !remnants.iter().any(|r| r == name) {
                        remnants.push(name.to_string());
                    }
                }
                Coordinate::Indexed { dim, .. } => {
                    let group = group_entry(&mut groups, array, dim)?;
                    if !group.coords.iter().any(|c| c == name) {
                        group.coords.push(name.to_string());
                    }
                }
            }
        }

        groups.sort_by_key(|g| g.axis);
        debug!(
            groups = groups.len(),
            remnants = remnants.len(),
            "resolved grouping coordinates"
        );

        Ok(Self { groups, remnants })
    }

    /// One entry per dimension touched by the requested coordinates
    #[must_use]
    pub fn groups(&self) -> &[DimGroup] {
        &self.groups
    }

    /// Requested coordinates that are remnants
    #[must_use]
    pub fn remnants(&self) -> &[String] {
        &self.remnants
    }

    /// The group for a dimension, if any requested coordinate lives on it
    #[must_use]
    pub fn group_for(&self, dim: &str) -> Option<&DimGroup> {
        self.groups.iter().find(|g| g.dim == dim)
    }

    /// Names of the grouped dimensions, in axis order
    pub fn dims(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.dim.as_str())
    }

    /// True when no dimension is partitioned
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The group for `dim`, created empty on first use
fn group_entry<'g>(
    groups: &'g mut Vec<DimGroup>,
    array: &LabeledArray,
    dim: &str,
) -> Result<&'g mut DimGroup> {
    let slot = match groups.iter().position(|g| g.dim == dim) {
        Some(slot) => slot,
        None => {
            groups.push(DimGroup {
                dim: dim.to_string(),
                axis: array.axis_of(dim)?,
                coords: Vec::new(),
                by_position: false,
            });
            groups.len() - 1
        }
    };
    Ok(&mut groups[slot])
}
