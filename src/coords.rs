//! Coordinate labels and coordinate descriptors
//!
//! A coordinate is either attached to exactly one dimension, carrying one
//! [`Label`] per position, or is a remnant: a single scalar label that is not
//! tied to any dimension and broadcasts to every position.

use std::fmt;
use std::hash::{Hash, Hasher};

/// A single coordinate value
///
/// Labels compare by variant and value, so `Int(1)` never equals `Str("1")`
/// or `Float(1.0)`. Floats compare by bit pattern, which keeps labels usable
/// as hash keys.
#[derive(Debug, Clone)]
pub enum Label {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl Label {
    /// Get the string value if this is a string label
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer value if this is an integer label
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Int(v) => v.hash(state),
            Self::Float(v) => canonical_bits(*v).hash(state),
            Self::Str(s) => s.hash(state),
            Self::Bool(b) => b.hash(state),
        }
    }
}

// -0.0 and 0.0 are one label, as are all NaN payloads.
fn canonical_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Label {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Label {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Label {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// Convert any sequence of label-like values into labels
pub fn labels<I, L>(values: I) -> Vec<Label>
where
    I: IntoIterator<Item = L>,
    L: Into<Label>,
{
    values.into_iter().map(Into::into).collect()
}

/// How a coordinate is attached to the array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coordinate {
    /// One label per position along `dim`
    Indexed { dim: String, labels: Vec<Label> },
    /// Constant value not tied to any dimension
    Remnant(Label),
}

impl Coordinate {
    /// Dimension this coordinate is attached to, `None` for remnants
    #[must_use]
    pub fn dim(&self) -> Option<&str> {
        match self {
            Self::Indexed { dim, .. } => Some(dim),
            Self::Remnant(_) => None,
        }
    }

    /// Label at `position` along the owning dimension
    ///
    /// Remnant coordinates broadcast, so they answer for every position.
    #[must_use]
    pub fn label_at(&self, position: usize) -> Option<&Label> {
        match self {
            Self::Indexed { labels, .. } => labels.get(position),
            Self::Remnant(label) => Some(label),
        }
    }

    #[must_use]
    pub const fn is_remnant(&self) -> bool {
        matches!(self, Self::Remnant(_))
    }

    /// Restrict an indexed coordinate to the given positions, in that order
    pub(crate) fn take(&self, positions: &[usize]) -> Self {
        match self {
            Self::Indexed { dim, labels } => Self::Indexed {
                dim: dim.clone(),
                labels: positions.iter().map(|&p| labels[p].clone()).collect(),
            },
            Self::Remnant(label) => Self::Remnant(label.clone()),
        }
    }
}
