//! Table schema metadata.
//!
//! Column names come from a source file's header row and column types are
//! inferred from the printed values. The resulting [`TableSchema`] travels
//! with every [`Batch`](crate::Batch) and is read back from the store for
//! existing tables, so later writes can be checked against it.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::value::{Value, is_na};

// ─── Column types ────────────────────────────────────────────────────────────

/// Storage class of a column. Rendered as the SQL type name.
///
/// Variants are ordered by how much they can hold: a column only ever widens
/// from `Integer` to `Real` to `Text`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ColumnType {
  Integer,
  Real,
  Text,
}

impl ColumnType {
  /// Pick the narrowest type able to hold every non-missing field.
  ///
  /// A column with no values at all is `Integer`, so whatever turns up later
  /// can widen it.
  pub fn infer<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
    let mut ty: Option<Self> = None;
    for raw in fields.into_iter().filter(|raw| !is_na(raw)) {
      let raw = raw.trim();
      let seen = if raw.parse::<i64>().is_ok() {
        Self::Integer
      } else if raw.parse::<f64>().is_ok() {
        Self::Real
      } else {
        return Self::Text;
      };
      ty = Some(match (ty, seen) {
        (Some(Self::Real), _) | (_, Self::Real) => Self::Real,
        _ => Self::Integer,
      });
    }
    ty.unwrap_or(Self::Integer)
  }

  /// Type of a single converted value; `None` for a missing one.
  pub fn of_value(value: &Value) -> Option<Self> {
    match value {
      Value::Null => None,
      Value::Integer(_) => Some(Self::Integer),
      Value::Real(_) => Some(Self::Real),
      Value::Text(_) => Some(Self::Text),
    }
  }

  /// Type of a column judged by values already converted, e.g. a computed
  /// result column. Null-only columns are `Integer`.
  pub fn of_values<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
    values
      .into_iter()
      .filter_map(Self::of_value)
      .fold(Self::Integer, Self::widen)
  }

  /// The narrower of two types widened to hold both.
  pub fn widen(self, other: Self) -> Self { self.max(other) }

  /// Parse a printed field as this type. `None` if the field does not fit.
  pub fn parse(self, raw: &str) -> Option<Value> {
    if is_na(raw) {
      return Some(Value::Null);
    }
    match self {
      Self::Integer => raw.trim().parse().ok().map(Value::Integer),
      Self::Real => raw.trim().parse().ok().map(Value::Real),
      Self::Text => Some(Value::Text(raw.to_owned())),
    }
  }
}

// ─── Columns and schemas ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
  pub name: String,
  pub ty:   ColumnType,
}

impl Column {
  pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
    Self { name: name.into(), ty }
  }
}

/// Ordered column set of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
  pub columns: Vec<Column>,
}

impl TableSchema {
  pub fn new(columns: Vec<Column>) -> Self { Self { columns } }

  /// Infer a schema from a header and a set of raw records.
  pub fn infer<R: AsRef<[String]>>(header: &[String], records: &[R]) -> Self {
    let columns = header
      .iter()
      .enumerate()
      .map(|(idx, name)| {
        let ty = ColumnType::infer(
          records
            .iter()
            .filter_map(|r| r.as_ref().get(idx))
            .map(String::as_str),
        );
        Column::new(name.clone(), ty)
      })
      .collect();
    Self { columns }
  }

  pub fn len(&self) -> usize { self.columns.len() }

  pub fn is_empty(&self) -> bool { self.columns.is_empty() }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|c| c.name.as_str())
  }

  /// Position of the named column.
  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.columns.iter().position(|c| c.name == name)
  }

  /// Whether `other` has the same column names in the same order.
  pub fn same_names(&self, other: &TableSchema) -> bool {
    self.names().eq(other.names())
  }
}
