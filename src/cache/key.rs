//! Cache keys for read operations.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::model::{Filters, Kind};

/// The read operation a cached result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadOp {
  Item,
  Items,
  LoadTable,
}

impl ReadOp {
  pub fn as_str(&self) -> &'static str {
    match self {
      ReadOp::Item => "get_item",
      ReadOp::Items => "get_items",
      ReadOp::LoadTable => "load_table",
    }
  }
}

/// Identifies one cached read: operation, canonical row kind, physical
/// table, and filters.
///
/// Filters compare structurally, so two different filter values never share
/// an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub op: ReadOp,
  pub kind: &'static str,
  pub table: Option<&'static str>,
  pub filters: Filters,
}

impl CacheKey {
  pub fn new(op: ReadOp, kind: Kind, filters: &Filters) -> Self {
    Self {
      op,
      kind: kind.row_kind().name(),
      table: kind.table_name(),
      filters: filters.clone(),
    }
  }

  /// Stable, fixed-length rendering of the key for log fields.
  pub fn digest(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.to_string().as_bytes());
    hex::encode(hasher.finalize())
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.op.as_str(), self.kind)?;
    if let Some(table) = self.table {
      write!(f, "@{}", table)?;
    }
    for (column, value) in self.filters.iter() {
      write!(f, ":{}={}", column, value.sql_literal())?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{RowKind, TableKind};

  static NOTE: RowKind = RowKind::new("note", Some("notes"), &["id", "body"]);
  static NOTES: TableKind = TableKind::new("notes", None, &NOTE);

  #[test]
  fn test_table_kind_keys_by_row_kind() {
    let filters = Filters::new().with("id", 1);
    let by_row = CacheKey::new(ReadOp::Item, Kind::from(&NOTE), &filters);
    let by_table = CacheKey::new(ReadOp::Item, Kind::from(&NOTES), &filters);
    assert_eq!(by_row, by_table);
  }

  #[test]
  fn test_display_and_digest() {
    let key = CacheKey::new(
      ReadOp::Items,
      Kind::from(&NOTE),
      &Filters::new().with("body", "hi").with("id", 2),
    );
    assert_eq!(key.to_string(), "get_items:note@notes:body='hi':id=2");
    assert_eq!(key.digest().len(), 64);
    assert_eq!(key.digest(), key.clone().digest());
  }
}
