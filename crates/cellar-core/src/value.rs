//! Dynamically typed cell values.
//!
//! Source files carry no schema, so every cell starts life as printed text and
//! is converted into a [`Value`] once the type of its column is known.

use std::{fmt, num::ParseFloatError};

use serde::{Deserialize, Serialize};

use crate::ColumnType;

/// Markers read as a missing value rather than as text.
pub const NA_MARKERS: &[&str] = &[
  "", "#N/A", "#NA", "<NA>", "N/A", "NA", "NULL", "NaN", "-NaN", "nan", "-nan",
  "None", "n/a", "null",
];

/// Whether a raw field denotes a missing value.
pub fn is_na(raw: &str) -> bool { NA_MARKERS.contains(&raw.trim()) }

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  /// Numeric view of the value. Text is never parsed here; use
  /// [`Value::coerce_f64`] for that.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Integer(i) => Some(*i as f64),
      Self::Real(r) => Some(*r),
      Self::Null | Self::Text(_) => None,
    }
  }

  /// Numeric view that also parses printed numbers held as text.
  ///
  /// `Ok(None)` means the value is missing.
  pub fn coerce_f64(&self) -> Result<Option<f64>, ParseFloatError> {
    match self {
      Self::Null => Ok(None),
      Self::Text(s) if is_na(s) => Ok(None),
      Self::Text(s) => s.trim().parse::<f64>().map(Some),
      other => Ok(other.as_f64()),
    }
  }

  /// Convert the value into `ty`, or `None` if that would lose information.
  ///
  /// Integers widen to reals and anything renders to text; a real never
  /// narrows to an integer.
  pub fn conform(&self, ty: ColumnType) -> Option<Value> {
    match (self, ty) {
      (Self::Null, _) => Some(Self::Null),
      (Self::Integer(_), ColumnType::Integer)
      | (Self::Real(_), ColumnType::Real)
      | (Self::Text(_), ColumnType::Text) => Some(self.clone()),
      (Self::Integer(i), ColumnType::Real) => Some(Self::Real(*i as f64)),
      (Self::Integer(_) | Self::Real(_), ColumnType::Text) => {
        Some(Self::Text(self.to_string()))
      }
      (Self::Text(s), ColumnType::Integer | ColumnType::Real) => ty.parse(s),
      (Self::Real(_), ColumnType::Integer) => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Null => f.write_str("NULL"),
      Self::Integer(i) => write!(f, "{i}"),
      Self::Real(r) => write!(f, "{r}"),
      Self::Text(s) => f.write_str(s),
    }
  }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Integer(v) }
}

impl From<f64> for Value {
  fn from(v: f64) -> Self { Self::Real(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Text(v.to_owned()) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Text(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map(Into::into).unwrap_or(Self::Null) }
}
