//! Per-partition function application
//!
//! [`LabeledArray::multi_dim_apply`] runs a user function on every slice
//! formed by the Cartesian product of partitions across the grouped
//! dimensions, and writes each result back at the slice's original positions.
//! The output has exactly the input's shape, dimensions, coordinates and
//! attributes.

use crate::array::LabeledArray;
use crate::errors::{AssemblyError, Result};
use crate::index::CoordinateIndex;
use crate::partition::{combinations, partition_group};
use ndarray::{ArrayD, Dimension};
use rayon::prelude::*;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use tracing::debug;

/// Named options handed to every invocation of an applied function
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOptions {
    values: BTreeMap<String, JsonValue>,
}

impl ApplyOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(JsonValue::as_f64)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(JsonValue::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(JsonValue::as_bool)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl LabeledArray {
    /// Apply `f` to every partition slice and reassemble in original order
    ///
    /// Coordinates on the same dimension form composite keys; dimensions are
    /// partitioned independently and `f` sees one slice per combination of
    /// partitions. Its result must match or broadcast to the slice shape.
    /// Slices are evaluated in parallel; results are written back afterwards.
    ///
    /// # Errors
    ///
    /// Returns `UnknownCoordinate` before any work if a name is neither
    /// a coordinate nor a dimension, `IncompatibleShape` if a result does not fit its slice, and
    /// otherwise the first error returned by `f`.
    pub fn multi_dim_apply<S, F>(
        &self,
        coord_names: &[S],
        f: F,
        options: &ApplyOptions,
    ) -> Result<Self>
    where
        S: AsRef<str>,
        F: Fn(&Self, &ApplyOptions) -> Result<ArrayD<f64>> + Sync,
    {
        let index = CoordinateIndex::resolve(self, coord_names)?;
        let groups = index.groups();
        let partitions = groups
            .iter()
            .map(|group| partition_group(self, group))
            .collect::<Result<Vec<_>>>()?;

        let counts: Vec<usize> = partitions.iter().map(Vec::len).collect();
        let combos = combinations(&counts);
        debug!(slices = combos.len(), "applying function to partitions");

        let blocks = combos
            .par_iter()
            .map(|combo| -> Result<ArrayD<f64>> {
                let mut slice: Option<Self> = None;
                for ((group, parts), &choice) in groups.iter().zip(&partitions).zip(combo) {
                    let source = slice.as_ref().unwrap_or(self);
                    let next = source.isel(&group.dim, &parts[choice].positions)?;
                    slice = Some(next);
                }
                let slice = slice.unwrap_or_else(|| self.clone());

                let result = f(&slice, options)?;
                let block = result
                    .broadcast(slice.shape())
                    .ok_or_else(|| AssemblyError::IncompatibleShape {
                        expected: slice.shape().to_vec(),
                        found: result.shape().to_vec(),
                    })?
                    .to_owned();
                Ok(block)
            })
            .collect::<Result<Vec<_>>>()?;

        // Partitions are disjoint, so every position is written exactly once
        let mut out = ArrayD::<f64>::from_elem(self.shape(), f64::NAN);
        for (combo, block) in combos.iter().zip(&blocks) {
            for (idx, &value) in block.indexed_iter() {
                let mut target = idx.slice().to_vec();
                for ((group, parts), &choice) in groups.iter().zip(&partitions).zip(combo) {
                    target[group.axis] = parts[choice].positions[target[group.axis]];
                }
                out[target.as_slice()] = value;
            }
        }

        self.with_data(out)
    }
}
