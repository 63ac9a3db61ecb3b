//! Record-kind declarations binding rows and tables to physical tables.
//!
//! Kinds are declared once as statics and referenced everywhere by
//! `&'static` pointers:
//!
//! ```ignore
//! static USER: RowKind = RowKind::new("user", Some("users"), &["id", "name"]);
//! static USERS: TableKind = TableKind::new("users", None, &USER);
//! ```
//!
//! Kind names must be unique within a process; they identify cache buckets.

use std::fmt;

/// Declaration of a concrete (or untyped) row kind.
#[derive(Debug)]
pub struct RowKind {
  name: &'static str,
  table: Option<&'static str>,
  columns: &'static [&'static str],
}

impl RowKind {
  /// Declare a row kind with a fixed column sequence.
  pub const fn new(
    name: &'static str,
    table: Option<&'static str>,
    columns: &'static [&'static str],
  ) -> Self {
    Self {
      name,
      table,
      columns,
    }
  }

  /// Declare a row kind with no column schema. Its rows take their columns
  /// from the caller or from the cursor's result description.
  pub const fn untyped(name: &'static str, table: Option<&'static str>) -> Self {
    Self {
      name,
      table,
      columns: &[],
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn table_name(&self) -> Option<&'static str> {
    self.table
  }

  pub fn columns(&self) -> &'static [&'static str] {
    self.columns
  }

  /// True when the kind declares no column schema.
  pub fn is_untyped(&self) -> bool {
    self.columns.is_empty()
  }
}

impl PartialEq for RowKind {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl Eq for RowKind {}

/// The built-in untyped row kind, bound to no table.
pub static UNTYPED: RowKind = RowKind::untyped("untyped", None);

/// Declaration of a table kind and the row kind it holds.
#[derive(Debug)]
pub struct TableKind {
  name: &'static str,
  table: Option<&'static str>,
  row_kind: &'static RowKind,
}

impl TableKind {
  pub const fn new(
    name: &'static str,
    table: Option<&'static str>,
    row_kind: &'static RowKind,
  ) -> Self {
    Self {
      name,
      table,
      row_kind,
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Physical table, falling back to the row kind's binding.
  pub fn table_name(&self) -> Option<&'static str> {
    self.table.or(self.row_kind.table_name())
  }

  pub fn row_kind(&self) -> &'static RowKind {
    self.row_kind
  }
}

impl PartialEq for TableKind {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl Eq for TableKind {}

/// Any declared record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Row(&'static RowKind),
  Table(&'static TableKind),
}

impl Kind {
  pub fn name(&self) -> &'static str {
    match self {
      Kind::Row(k) => k.name(),
      Kind::Table(k) => k.name(),
    }
  }

  pub fn table_name(&self) -> Option<&'static str> {
    match self {
      Kind::Row(k) => k.table_name(),
      Kind::Table(k) => k.table_name(),
    }
  }

  /// The canonical row kind: the kind itself, or the row kind a table holds.
  pub fn row_kind(&self) -> &'static RowKind {
    match self {
      Kind::Row(k) => k,
      Kind::Table(k) => k.row_kind(),
    }
  }

  pub fn columns(&self) -> &'static [&'static str] {
    self.row_kind().columns()
  }

  /// True when the kind is a table container.
  pub fn is_table(&self) -> bool {
    matches!(self, Kind::Table(_))
  }
}

impl From<&'static RowKind> for Kind {
  fn from(k: &'static RowKind) -> Self {
    Kind::Row(k)
  }
}

impl From<&'static TableKind> for Kind {
  fn from(k: &'static TableKind) -> Self {
    Kind::Table(k)
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Kind::Row(k) => write!(f, "row kind {}", k.name()),
      Kind::Table(k) => write!(f, "table kind {}", k.name()),
    }
  }
}
