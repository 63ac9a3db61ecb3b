//! In-memory entity model: values, kind declarations, rows and tables.

mod error;
mod filters;
mod kind;
mod row;
mod table;
mod value;

pub use error::ModelError;
pub use filters::Filters;
pub use kind::{Kind, RowKind, TableKind, UNTYPED};
pub use row::{Record, Row};
pub use table::Table;
pub use value::Value;

use serde::Serialize;

/// Result of a multi-row read.
///
/// `Table` when the rows fit the kind's container, otherwise the loose rows
/// that could be built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Items {
  Table(Table),
  Rows(Vec<Row>),
}

impl Items {
  pub fn rows(&self) -> &[Row] {
    match self {
      Items::Table(t) => t.rows(),
      Items::Rows(rows) => rows,
    }
  }

  pub fn len(&self) -> usize {
    self.rows().len()
  }

  pub fn is_empty(&self) -> bool {
    self.rows().is_empty()
  }

  pub fn into_rows(self) -> Vec<Row> {
    match self {
      Items::Table(t) => t.into_rows(),
      Items::Rows(rows) => rows,
    }
  }
}

impl Default for Items {
  fn default() -> Self {
    Items::Rows(Vec::new())
  }
}
