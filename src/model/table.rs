//! An ordered collection of rows sharing one column sequence.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::any::Any;
use std::fmt;
use tracing::warn;

use super::error::ModelError;
use super::kind::{Kind, TableKind};
use super::row::{Record, Row};
use super::value::Value;

#[derive(Debug, Clone)]
pub struct Table {
  kind: &'static TableKind,
  columns: Vec<String>,
  rows: Vec<Row>,
}

impl Table {
  /// An empty table whose columns come from the declared row kind.
  pub fn new(kind: &'static TableKind) -> Self {
    Self {
      kind,
      columns: declared_columns(kind),
      rows: Vec::new(),
    }
  }

  /// A table seeded with `rows`.
  ///
  /// When the row kind declares no columns, the first row's columns become
  /// the table's. Every row must share that column sequence.
  pub fn with_rows(
    kind: &'static TableKind,
    rows: impl IntoIterator<Item = Row>,
  ) -> Result<Self, ModelError> {
    let mut table = Self::new(kind);
    for row in rows {
      table.add_row(row)?;
    }
    Ok(table)
  }

  pub fn kind(&self) -> &'static TableKind {
    self.kind
  }

  pub fn columns(&self) -> &[String] {
    &self.columns
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }

  pub fn into_rows(self) -> Vec<Row> {
    self.rows
  }

  pub fn len(&self) -> usize {
    self.rows.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Row> {
    self.rows.iter()
  }

  /// True when some stored row equals `row`.
  pub fn contains(&self, row: &Row) -> bool {
    self.rows.iter().any(|r| r == row)
  }

  /// Validate a row against this table without adding it.
  ///
  /// A row of a different kind is accepted with a warning; a different
  /// column sequence is rejected.
  pub fn check_row(&self, row: &Row) -> Result<(), ModelError> {
    if row.kind() != self.kind.row_kind() {
      warn!(
        table = self.kind.name(),
        expected = self.kind.row_kind().name(),
        found = row.kind().name(),
        "row is not of the table's row kind"
      );
    }

    if !row.is_empty() && !self.columns.is_empty() && row.columns() != self.columns.as_slice() {
      return Err(ModelError::HeterogeneousColumns {
        expected: self.columns.clone(),
        found: row.columns().to_vec(),
      });
    }
    Ok(())
  }

  pub fn add_row(&mut self, row: Row) -> Result<(), ModelError> {
    if self.columns.is_empty() {
      self.columns = row.columns().to_vec();
    }
    self.check_row(&row)?;
    self.rows.push(row);
    Ok(())
  }

  /// Add a column to every row and to the table itself.
  pub fn add_column(&mut self, name: &str, default: Value) {
    for row in &mut self.rows {
      row.add_column(name, default.clone());
    }
    if !self.columns.iter().any(|c| c == name) {
      self.columns.push(name.to_string());
    }
  }

  /// Remove a column from every row and from the table itself.
  pub fn remove_column(&mut self, name: &str) {
    for row in &mut self.rows {
      row.remove_column(name);
    }
    self.columns.retain(|c| c != name);
  }

  /// Compare against an arbitrary value; see [`Row::try_eq`].
  pub fn try_eq(&self, other: &dyn Any) -> Result<bool, ModelError> {
    if let Some(table) = other.downcast_ref::<Table>() {
      Ok(self == table)
    } else if let Some(row) = other.downcast_ref::<Row>() {
      Ok(self == row)
    } else {
      Err(ModelError::UnsupportedComparison { left: "table" })
    }
  }
}

fn declared_columns(kind: &'static TableKind) -> Vec<String> {
  kind
    .row_kind()
    .columns()
    .iter()
    .map(|c| c.to_string())
    .collect()
}

impl PartialEq for Table {
  fn eq(&self, other: &Self) -> bool {
    self.columns == other.columns && self.rows == other.rows
  }
}

impl PartialEq<Row> for Table {
  fn eq(&self, other: &Row) -> bool {
    other == self
  }
}

impl<'a> IntoIterator for &'a Table {
  type Item = &'a Row;
  type IntoIter = std::slice::Iter<'a, Row>;

  fn into_iter(self) -> Self::IntoIter {
    self.rows.iter()
  }
}

impl fmt::Display for Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for column in &self.columns {
      let cells: Vec<String> = self
        .rows
        .iter()
        .map(|row| row.get(column).map(ToString::to_string).unwrap_or_default())
        .collect();
      writeln!(f, "{}: {}", column, cells.join(","))?;
    }
    Ok(())
  }
}

impl Serialize for Table {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
    for row in &self.rows {
      seq.serialize_element(row)?;
    }
    seq.end()
  }
}

impl Record for Table {
  fn kind(&self) -> Kind {
    Kind::Table(self.kind)
  }

  fn columns(&self) -> &[String] {
    &self.columns
  }

  fn rows(&self) -> &[Row] {
    &self.rows
  }

  fn add_column(&mut self, name: &str, default: Value) {
    Table::add_column(self, name, default);
  }

  fn remove_column(&mut self, name: &str) {
    Table::remove_column(self, name);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::kind::{RowKind, UNTYPED};

  static CELL: RowKind = RowKind::untyped("cell", Some("cells"));
  static CELLS: TableKind = TableKind::new("cells", None, &CELL);
  static PAIR: RowKind = RowKind::new("pair", Some("pairs"), &["id", "name"]);
  static PAIRS: TableKind = TableKind::new("pairs", None, &PAIR);

  fn cells(values: &[i64]) -> Row {
    Row::untyped(&CELL, values.iter().map(|v| Value::from(*v)).collect(), None).unwrap()
  }

  fn table(rows: Vec<Row>) -> Table {
    Table::with_rows(&CELLS, rows).unwrap()
  }

  #[test]
  fn test_table_equality() {
    assert_eq!(table(vec![cells(&[1])]), table(vec![cells(&[1])]));
    assert_eq!(table(vec![cells(&[1, 2])]), table(vec![cells(&[1, 2])]));
    assert_ne!(table(vec![cells(&[1])]), table(vec![cells(&[1, 2])]));
    assert_eq!(
      table(vec![cells(&[1]), cells(&[1])]),
      table(vec![cells(&[1]), cells(&[1])])
    );
    assert_ne!(table(vec![cells(&[1])]), table(vec![cells(&[1]), cells(&[1])]));
  }

  #[test]
  fn test_reversed_columns_are_unequal() {
    let backward = Row::untyped(
      &CELL,
      vec![1.into(), 2.into()],
      Some(vec!["2".into(), "1".into()]),
    )
    .unwrap();
    assert_ne!(table(vec![cells(&[1, 2])]), table(vec![backward]));
  }

  #[test]
  fn test_table_equals_row() {
    assert!(table(vec![cells(&[1])]) == cells(&[1]));
    assert!(table(vec![cells(&[1]), cells(&[1])]) != cells(&[1]));
    assert!(table(vec![cells(&[1])]) != cells(&[2]));
    assert!(Table::new(&CELLS) != cells(&[1]));
  }

  #[test]
  fn test_try_eq_rejects_other_types() {
    let t = table(vec![cells(&[1])]);
    assert_eq!(t.try_eq(&cells(&[1])), Ok(true));
    assert_eq!(t.try_eq(&table(vec![cells(&[1])])), Ok(true));
    assert!(matches!(
      t.try_eq(&"1"),
      Err(ModelError::UnsupportedComparison { .. })
    ));
  }

  #[test]
  fn test_membership() {
    assert!(table(vec![cells(&[1])]).contains(&cells(&[1])));
    assert!(!table(vec![cells(&[2])]).contains(&cells(&[1])));
    assert!(table(vec![cells(&[2]), cells(&[1])]).contains(&cells(&[1])));
  }

  #[test]
  fn test_heterogeneous_columns_rejected() {
    let err = Table::with_rows(&CELLS, vec![cells(&[1]), cells(&[1, 2])]).unwrap_err();
    assert!(matches!(err, ModelError::HeterogeneousColumns { .. }));

    let mut t = table(vec![cells(&[1])]);
    assert!(t.add_row(cells(&[3, 4])).is_err());
    assert_eq!(t.len(), 1);
  }

  #[test]
  fn test_foreign_row_kind_is_accepted() {
    let stranger = Row::untyped(&UNTYPED, vec![5.into()], None).unwrap();
    let t = table(vec![cells(&[1]), stranger]);
    assert_eq!(t.len(), 2);
  }

  #[test]
  fn test_empty_table_takes_declared_columns() {
    let t = Table::new(&PAIRS);
    assert_eq!(t.columns(), &["id".to_string(), "name".to_string()]);
    assert!(t.is_empty());
  }

  #[test]
  fn test_column_mutation_applies_to_all_rows() {
    let a = Row::new(&PAIR, vec![1.into(), "a".into()]).unwrap();
    let b = Row::new(&PAIR, vec![2.into(), "b".into()]).unwrap();
    let mut t = Table::with_rows(&PAIRS, vec![a, b]).unwrap();

    t.add_column("score", Value::Int(0));
    assert_eq!(t.columns().len(), 3);
    assert!(t.iter().all(|r| r.get("score") == Some(&Value::Int(0))));

    t.remove_column("name");
    assert_eq!(t.columns(), &["id".to_string(), "score".to_string()]);
    assert!(t.iter().all(|r| r.get("name").is_none()));
  }

  #[test]
  fn test_display_joins_cells_per_column() {
    let a = Row::new(&PAIR, vec![1.into(), "a".into()]).unwrap();
    let b = Row::new(&PAIR, vec![2.into(), "b".into()]).unwrap();
    let t = Table::with_rows(&PAIRS, vec![a, b]).unwrap();
    assert_eq!(t.to_string(), "id: 1,2\nname: a,b\n");
  }
}
