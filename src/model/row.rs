//! A single record: an ordered column to value mapping tagged with its kind.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::any::Any;
use std::fmt;

use super::error::ModelError;
use super::kind::{Kind, RowKind};
use super::table::Table;
use super::value::Value;

/// One database record.
///
/// `columns` and `values` are kept parallel; together they form the ordered
/// column to value mapping of the record.
#[derive(Debug, Clone)]
pub struct Row {
  kind: &'static RowKind,
  columns: Vec<String>,
  values: Vec<Value>,
}

impl Row {
  /// Build a row of a concrete kind from positional values.
  pub fn new(kind: &'static RowKind, values: Vec<Value>) -> Result<Self, ModelError> {
    if kind.is_untyped() {
      return Err(ModelError::AbstractKind { kind: kind.name() });
    }
    let columns: Vec<String> = kind.columns().iter().map(|c| c.to_string()).collect();
    Self::checked(kind, columns, values)
  }

  /// Build a row without a predeclared schema.
  ///
  /// With `columns` absent, columns are named positionally: "1", "2", ...
  pub fn untyped(
    kind: &'static RowKind,
    values: Vec<Value>,
    columns: Option<Vec<String>>,
  ) -> Result<Self, ModelError> {
    let columns = columns.unwrap_or_else(|| (1..=values.len()).map(|i| i.to_string()).collect());
    Self::checked(kind, columns, values)
  }

  fn checked(
    kind: &'static RowKind,
    columns: Vec<String>,
    values: Vec<Value>,
  ) -> Result<Self, ModelError> {
    if columns.len() != values.len() {
      return Err(ModelError::ColumnCount {
        kind: kind.name(),
        expected: columns.len(),
        found: values.len(),
      });
    }
    Ok(Self {
      kind,
      columns,
      values,
    })
  }

  pub fn kind(&self) -> &'static RowKind {
    self.kind
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn values(&self) -> &[Value] {
    &self.values
  }

  pub fn get(&self, column: &str) -> Option<&Value> {
    self
      .columns
      .iter()
      .position(|c| c == column)
      .map(|i| &self.values[i])
  }

  pub fn len(&self) -> usize {
    self.columns.len()
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }

  /// Iterate `(column, value)` pairs in column order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
    self
      .columns
      .iter()
      .map(String::as_str)
      .zip(self.values.iter())
  }

  /// Append a column holding `default`. Existing columns are left alone.
  pub fn add_column(&mut self, name: &str, default: Value) {
    if self.columns.iter().any(|c| c == name) {
      return;
    }
    self.columns.push(name.to_string());
    self.values.push(default);
  }

  /// Drop a column and its value. Returns whether the column existed.
  pub fn remove_column(&mut self, name: &str) -> bool {
    match self.columns.iter().position(|c| c == name) {
      Some(i) => {
        self.columns.remove(i);
        self.values.remove(i);
        true
      }
      None => false,
    }
  }

  /// Compare against an arbitrary value.
  ///
  /// Rows compare with rows and tables; anything else is an error rather
  /// than a silent `false`.
  pub fn try_eq(&self, other: &dyn Any) -> Result<bool, ModelError> {
    if let Some(row) = other.downcast_ref::<Row>() {
      Ok(self == row)
    } else if let Some(table) = other.downcast_ref::<Table>() {
      Ok(self == table)
    } else {
      Err(ModelError::UnsupportedComparison { left: "row" })
    }
  }
}

impl PartialEq for Row {
  fn eq(&self, other: &Self) -> bool {
    self.columns == other.columns && self.values == other.values
  }
}

impl PartialEq<Table> for Row {
  fn eq(&self, other: &Table) -> bool {
    match other.rows() {
      [only] => self == only,
      _ => false,
    }
  }
}

impl fmt::Display for Row {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (column, value) in self.iter() {
      writeln!(f, "{}: {}", column, value)?;
    }
    Ok(())
  }
}

impl Serialize for Row {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.len()))?;
    for (column, value) in self.iter() {
      map.serialize_entry(column, value)?;
    }
    map.end()
  }
}

/// Anything a write operation can address: a single row or a table of rows.
pub trait Record {
  fn kind(&self) -> Kind;

  fn columns(&self) -> &[String];

  /// Contained rows. A row is its own single-element container.
  fn rows(&self) -> &[Row];

  fn add_column(&mut self, name: &str, default: Value);

  fn remove_column(&mut self, name: &str);
}

impl Record for Row {
  fn kind(&self) -> Kind {
    Kind::Row(self.kind)
  }

  fn columns(&self) -> &[String] {
    &self.columns
  }

  fn rows(&self) -> &[Row] {
    std::slice::from_ref(self)
  }

  fn add_column(&mut self, name: &str, default: Value) {
    Row::add_column(self, name, default);
  }

  fn remove_column(&mut self, name: &str) {
    Row::remove_column(self, name);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::kind::{TableKind, UNTYPED};

  static PAIR: RowKind = RowKind::new("pair", Some("pairs"), &["id", "name"]);
  static PAIRS: TableKind = TableKind::new("pairs", None, &PAIR);

  fn pair(id: i64, name: &str) -> Row {
    Row::new(&PAIR, vec![id.into(), name.into()]).unwrap()
  }

  fn positional(values: &[i64]) -> Row {
    Row::untyped(&UNTYPED, values.iter().map(|v| Value::from(*v)).collect(), None).unwrap()
  }

  #[test]
  fn test_equal_columns_and_values() {
    assert_eq!(pair(1, "a"), pair(1, "a"));
    assert_ne!(pair(1, "a"), pair(2, "a"));
    assert_eq!(positional(&[1, 4]), positional(&[1, 4]));
    assert_ne!(positional(&[1, 4]), positional(&[4, 1]));
    assert_ne!(positional(&[1, 4]), positional(&[1, 4, 5]));
  }

  #[test]
  fn test_column_order_matters() {
    let forward = Row::untyped(&UNTYPED, vec![1.into(), 4.into()], None).unwrap();
    let backward = Row::untyped(
      &UNTYPED,
      vec![1.into(), 4.into()],
      Some(vec!["2".into(), "1".into()]),
    )
    .unwrap();
    assert_ne!(forward, backward);
  }

  #[test]
  fn test_untyped_kind_cannot_build_positionally() {
    let err = Row::new(&UNTYPED, vec![1.into()]).unwrap_err();
    assert_eq!(err, ModelError::AbstractKind { kind: "untyped" });
  }

  #[test]
  fn test_value_count_must_match_columns() {
    let err = Row::new(&PAIR, vec![1.into()]).unwrap_err();
    assert!(matches!(
      err,
      ModelError::ColumnCount {
        expected: 2,
        found: 1,
        ..
      }
    ));
    assert!(Row::untyped(&UNTYPED, vec![1.into()], Some(vec![])).is_err());
  }

  #[test]
  fn test_positional_column_names() {
    let row = positional(&[7, 8]);
    assert_eq!(row.columns(), &["1".to_string(), "2".to_string()]);
    assert_eq!(row.get("2"), Some(&Value::Int(8)));
  }

  #[test]
  fn test_row_equals_single_row_table() {
    let one = Table::with_rows(&PAIRS, vec![pair(1, "a")]).unwrap();
    let two = Table::with_rows(&PAIRS, vec![pair(1, "a"), pair(1, "a")]).unwrap();
    assert!(pair(1, "a") == one);
    assert!(pair(1, "a") != two);
    assert!(pair(2, "a") != one);
  }

  #[test]
  fn test_try_eq_rejects_other_types() {
    let row = pair(1, "a");
    assert_eq!(row.try_eq(&pair(1, "a")), Ok(true));
    assert_eq!(row.try_eq(&pair(3, "a")), Ok(false));
    assert_eq!(
      row.try_eq(&1i32),
      Err(ModelError::UnsupportedComparison { left: "row" })
    );
  }

  #[test]
  fn test_add_and_remove_column() {
    let mut row = pair(1, "a");
    row.add_column("email", Value::Null);
    assert_eq!(row.columns().last().map(String::as_str), Some("email"));
    row.add_column("email", Value::from("ignored"));
    assert_eq!(row.len(), 3);

    assert!(row.remove_column("name"));
    assert!(!row.remove_column("name"));
    assert_eq!(row.columns(), &["id".to_string(), "email".to_string()]);
    assert_eq!(row.values(), &[Value::Int(1), Value::Null]);
  }

  #[test]
  fn test_display_lists_columns() {
    assert_eq!(pair(1, "a").to_string(), "id: 1\nname: a\n");
  }

  #[test]
  fn test_serializes_as_ordered_map() {
    let json = serde_json::to_string(&pair(1, "a")).unwrap();
    assert_eq!(json, r#"{"id":1,"name":"a"}"#);
  }
}
