//! Labeled N-dimensional arrays
//!
//! [`LabeledArray`] couples an `ndarray` buffer with named dimensions, named
//! coordinates and free-form attributes. Arrays are immutable once built;
//! every operation returns a fresh array.

use crate::coords::{Coordinate, Label};
use crate::errors::{AssemblyError, Result};
use crate::statistics::{ReduceDims, Reduction, StatisticalReduction};
use ndarray::{ArrayBase, ArrayD, Axis, Data, Dimension, ErrorKind, ShapeError};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// Free-form metadata attached to an array
pub type Attributes = HashMap<String, JsonValue>;

/// Element types accepted as array data, widened to `f64` on construction
///
/// 64-bit integers beyond 2^53 lose precision.
pub trait Numeric: Copy {
    fn to_f64(self) -> f64;
}

macro_rules! impl_numeric {
    ($($t:ty),*) => {
        $(
            impl Numeric for $t {
                #[allow(clippy::cast_precision_loss, clippy::cast_lossless, clippy::unnecessary_cast)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_numeric!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// An N-dimensional numeric array with named dimensions and coordinates
#[derive(Debug, Clone)]
pub struct LabeledArray {
    data: ArrayD<f64>,
    dims: Vec<String>,
    coords: BTreeMap<String, Coordinate>,
    attrs: Attributes,
}

#[derive(Debug, Clone)]
enum CoordSpec {
    /// Aligned to the dimension sharing the coordinate's name
    Aligned(Vec<Label>),
    On(String, Vec<Label>),
    Scalar(Label),
}

/// Builder validating coordinate and dimension consistency
#[derive(Debug, Clone)]
pub struct LabeledArrayBuilder {
    data: ArrayD<f64>,
    dims: Vec<String>,
    coords: Vec<(String, CoordSpec)>,
    attrs: Attributes,
}

impl LabeledArrayBuilder {
    /// Name the dimensions, in axis order
    #[must_use]
    pub fn dims<I, S>(mut self, dims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dims = dims.into_iter().map(Into::into).collect();
        self
    }

    /// Add a coordinate on the dimension with the same name
    #[must_use]
    pub fn coord<I, L>(mut self, name: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let labels = labels.into_iter().map(Into::into).collect();
        self.coords.push((name.to_string(), CoordSpec::Aligned(labels)));
        self
    }

    /// Add a coordinate on an explicitly named dimension
    #[must_use]
    pub fn coord_on<I, L>(mut self, name: &str, dim: &str, labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        let labels = labels.into_iter().map(Into::into).collect();
        self.coords
            .push((name.to_string(), CoordSpec::On(dim.to_string(), labels)));
        self
    }

    /// Add a remnant coordinate holding a single scalar label
    #[must_use]
    pub fn scalar_coord(mut self, name: &str, label: impl Into<Label>) -> Self {
        self.coords
            .push((name.to_string(), CoordSpec::Scalar(label.into())));
        self
    }

    /// Attach an attribute
    #[must_use]
    pub fn attr(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    /// Validate and build the array
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The number of dimension names differs from the data's rank, or a name repeats
    /// - A coordinate refers to a dimension that does not exist
    /// - A coordinate's label count differs from its dimension's size
    /// - A coordinate name is used twice
    /// - A coordinate is named after one dimension but attached to another
    pub fn build(self) -> Result<LabeledArray> {
        let unique_dims = self
            .dims
            .iter()
            .enumerate()
            .all(|(i, d)| !self.dims[..i].contains(d));
        if self.dims.len() != self.data.ndim() || !unique_dims {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape).into());
        }

        let mut coords = BTreeMap::new();
        for (name, spec) in self.coords {
            let coordinate = match spec {
                CoordSpec::Aligned(labels) => Coordinate::Indexed {
                    dim: name.clone(),
                    labels,
                },
                CoordSpec::On(dim, labels) => Coordinate::Indexed { dim, labels },
                CoordSpec::Scalar(label) => Coordinate::Remnant(label),
            };

            if let Coordinate::Indexed { dim, labels } = &coordinate {
                let axis = self
                    .dims
                    .iter()
                    .position(|d| d == dim)
                    .ok_or_else(|| AssemblyError::DimensionNotFound { dim: dim.clone() })?;
                if *dim != name && self.dims.contains(&name) {
                    return Err(AssemblyError::InvalidCoordinate {
                        message: format!("named after dimension '{name}' but attached to '{dim}'"),
                        coord: name,
                    });
                }
                let size = self.data.shape()[axis];
                if labels.len() != size {
                    return Err(AssemblyError::InvalidCoordinate {
                        coord: name,
                        message: format!(
                            "{} labels for dimension '{dim}' of size {size}",
                            labels.len()
                        ),
                    });
                }
            }

            if coords.contains_key(&name) {
                return Err(AssemblyError::InvalidCoordinate {
                    coord: name,
                    message: "defined more than once".to_string(),
                });
            }
            coords.insert(name, coordinate);
        }

        Ok(LabeledArray {
            data: self.data,
            dims: self.dims,
            coords,
            attrs: self.attrs,
        })
    }
}

impl LabeledArray {
    /// Start building an array from numeric data
    ///
    /// Any [`Numeric`] element type is accepted, so integer literals and
    /// `i64`/`u64` data work directly.
    pub fn builder<S, D, A>(data: ArrayBase<S, D>) -> LabeledArrayBuilder
    where
        S: Data<Elem = A>,
        D: Dimension,
        A: Numeric,
    {
        let data: ArrayD<f64> = data.mapv(Numeric::to_f64).into_dyn();
        LabeledArrayBuilder {
            data,
            dims: Vec::new(),
            coords: Vec::new(),
            attrs: Attributes::new(),
        }
    }

    /// Assemble an array from already consistent parts
    pub(crate) fn from_parts(
        data: ArrayD<f64>,
        dims: Vec<String>,
        coords: BTreeMap<String, Coordinate>,
        attrs: Attributes,
    ) -> Self {
        Self {
            data,
            dims,
            coords,
            attrs,
        }
    }

    #[must_use]
    pub const fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    #[must_use]
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    #[must_use]
    pub const fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Axis index of a named dimension
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` if the array has no such dimension.
    pub fn axis_of(&self, dim: &str) -> Result<usize> {
        self.dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| AssemblyError::DimensionNotFound {
                dim: dim.to_string(),
            })
    }

    /// Size of a named dimension
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` if the array has no such dimension.
    pub fn dim_size(&self, dim: &str) -> Result<usize> {
        Ok(self.shape()[self.axis_of(dim)?])
    }

    /// Look up a coordinate by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoordinate` if the array has no such coordinate.
    pub fn coord(&self, name: &str) -> Result<&Coordinate> {
        self.coords
            .get(name)
            .ok_or_else(|| AssemblyError::UnknownCoordinate {
                coord: name.to_string(),
            })
    }

    /// All coordinates, ordered by name
    pub fn coords(&self) -> impl Iterator<Item = (&str, &Coordinate)> {
        self.coords.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub(crate) const fn coord_map(&self) -> &BTreeMap<String, Coordinate> {
        &self.coords
    }

    /// Names of the coordinates attached to `dim`
    #[must_use]
    pub fn coords_on(&self, dim: &str) -> Vec<&str> {
        self.coords()
            .filter(|(_, c)| c.dim() == Some(dim))
            .map(|(name, _)| name)
            .collect()
    }

    /// Walk every coordinate as `(name, dimension, labels)`
    ///
    /// Remnant coordinates report no dimension and a single label.
    pub fn walk_coords(&self) -> impl Iterator<Item = (&str, Option<&str>, &[Label])> {
        self.coords().map(|(name, c)| match c {
            Coordinate::Indexed { dim, labels } => (name, Some(dim.as_str()), labels.as_slice()),
            Coordinate::Remnant(label) => (name, None, std::slice::from_ref(label)),
        })
    }

    /// Replace the data, keeping dimensions, coordinates and attributes
    ///
    /// # Errors
    ///
    /// Returns `IncompatibleShape` if `data` has a different shape.
    pub fn with_data(&self, data: ArrayD<f64>) -> Result<Self> {
        if data.shape() != self.shape() {
            return Err(AssemblyError::IncompatibleShape {
                expected: self.shape().to_vec(),
                found: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data,
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        })
    }

    /// Select the positions whose `coord` label equals `label`
    ///
    /// The dimension is kept, restricted to the matching positions. Selecting
    /// on a remnant coordinate returns the array unchanged when the label matches.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoordinate` for a missing coordinate and `LabelNotFound`
    /// when no position carries `label`.
    pub fn sel(&self, coord: &str, label: impl Into<Label>) -> Result<Self> {
        let label = label.into();
        let not_found = || AssemblyError::LabelNotFound {
            coord: coord.to_string(),
            label: label.to_string(),
        };

        match self.coord(coord)? {
            Coordinate::Remnant(value) if *value == label => Ok(self.clone()),
            Coordinate::Remnant(_) => Err(not_found()),
            Coordinate::Indexed { dim, labels } => {
                let positions: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| **l == label)
                    .map(|(i, _)| i)
                    .collect();
                if positions.is_empty() {
                    return Err(not_found());
                }
                self.isel(dim, &positions)
            }
        }
    }

    /// Select positions along a dimension, in the given order
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` or `IndexOutOfBounds`.
    pub fn isel(&self, dim: &str, positions: &[usize]) -> Result<Self> {
        let axis = self.axis_of(dim)?;
        let size = self.shape()[axis];
        if let Some(&position) = positions.iter().find(|&&p| p >= size) {
            return Err(AssemblyError::IndexOutOfBounds {
                dim: dim.to_string(),
                position,
                size,
            });
        }

        let coords = self
            .coords
            .iter()
            .map(|(name, c)| {
                let c = if c.dim() == Some(dim) {
                    c.take(positions)
                } else {
                    c.clone()
                };
                (name.clone(), c)
            })
            .collect();

        Ok(Self {
            data: self.data.select(Axis(axis), positions),
            dims: self.dims.clone(),
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Drop a size-1 dimension, turning its coordinates into remnants
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound`, or `IncompatibleShape` if the dimension is
    /// not of size 1.
    pub fn squeeze(&self, dim: &str) -> Result<Self> {
        let axis = self.axis_of(dim)?;
        let size = self.shape()[axis];
        if size != 1 {
            return Err(AssemblyError::IncompatibleShape {
                expected: vec![1],
                found: vec![size],
            });
        }

        let coords = self
            .coords
            .iter()
            .map(|(name, c)| {
                let c = match c {
                    Coordinate::Indexed { dim: d, labels } if d == dim => {
                        Coordinate::Remnant(labels[0].clone())
                    }
                    other => other.clone(),
                };
                (name.clone(), c)
            })
            .collect();

        Ok(Self {
            data: self.data.index_axis(Axis(axis), 0).to_owned(),
            dims: self.dims.iter().filter(|d| *d != dim).cloned().collect(),
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Reduce over whole dimensions, without grouping
    ///
    /// `ReduceDims::Grouped` has nothing to group by here and reduces every
    /// dimension, like `ReduceDims::All`. Coordinates on reduced dimensions are
    /// dropped; remnants survive.
    ///
    /// # Errors
    ///
    /// Returns `DimensionNotFound` for an unknown dimension name.
    pub fn reduce(&self, operation: Reduction, dims: impl Into<ReduceDims>) -> Result<Self> {
        let reduced: Vec<String> = match dims.into() {
            ReduceDims::Grouped | ReduceDims::All => self.dims.clone(),
            ReduceDims::Dims(names) => names,
        };
        let mut axes = Vec::with_capacity(reduced.len());
        for dim in &reduced {
            let axis = self.axis_of(dim)?;
            if !axes.contains(&axis) {
                axes.push(axis);
            }
        }

        let data = self.data.reduce_axes(&axes, operation)?;
        let coords = self
            .coords
            .iter()
            .filter(|(_, c)| c.dim().map_or(true, |d| !reduced.iter().any(|r| r == d)))
            .map(|(name, c)| (name.clone(), c.clone()))
            .collect();

        Ok(Self {
            data,
            dims: self.dims.iter().filter(|d| !reduced.contains(d)).cloned().collect(),
            coords,
            attrs: self.attrs.clone(),
        })
    }

    /// Aggregate every value into a single number
    #[must_use]
    pub fn aggregate(&self, operation: Reduction) -> f64 {
        operation.reduce_values(self.data.iter().copied())
    }

    /// Same dimensions, shape, values and coordinates; attributes ignored
    ///
    /// NaN values compare equal to NaN at the same position.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.dims == other.dims
            && self.shape() == other.shape()
            && self.coords == other.coords
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }

    /// Like [`equals`](Self::equals), additionally comparing attributes
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        self.equals(other) && self.attrs == other.attrs
    }
}
