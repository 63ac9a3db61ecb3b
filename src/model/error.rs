//! Errors raised by the in-memory entity model.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
  /// Rows cannot be built positionally from a kind without a column schema.
  #[error("row kind {kind} declares no columns and cannot be instantiated directly")]
  AbstractKind { kind: &'static str },

  #[error("row kind {kind} expects {expected} values, got {found}")]
  ColumnCount {
    kind: &'static str,
    expected: usize,
    found: usize,
  },

  #[error("columns must be the same for every row in a table: expected {expected:?}, found {found:?}")]
  HeterogeneousColumns {
    expected: Vec<String>,
    found: Vec<String>,
  },

  /// Equality against something that is neither a row nor a table.
  #[error("cannot compare a {left} with a value of another type")]
  UnsupportedComparison { left: &'static str },
}
