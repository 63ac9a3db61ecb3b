//! Error types for the database client.

use thiserror::Error;
use tokio_postgres::error::SqlState;

use crate::model::ModelError;

/// Alias for `Result<T, DbError>`.
pub type DbResult<T> = Result<T, DbError>;

/// Failures reported by the store or its connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
  /// Opening a connection failed.
  #[error("connection failed: {0}")]
  Connect(String),

  /// The connection dropped while a statement was in flight.
  #[error("connection lost: {0}")]
  ConnectionLost(String),

  /// The store rejected a statement.
  #[error("statement failed{}: {message}", code_suffix(.code))]
  Statement {
    code: Option<String>,
    message: String,
  },
}

fn code_suffix(code: &Option<String>) -> String {
  code
    .as_deref()
    .map(|c| format!(" [{}]", c))
    .unwrap_or_default()
}

impl From<tokio_postgres::Error> for StoreError {
  fn from(err: tokio_postgres::Error) -> Self {
    let code = err.code().cloned();
    if err.is_closed() || code.as_ref() == Some(&SqlState::CONNECTION_FAILURE) {
      return StoreError::ConnectionLost(err.to_string());
    }
    StoreError::Statement {
      code: code.map(|c| c.code().to_string()),
      message: err.to_string(),
    }
  }
}

/// Errors returned by [`GenericDatabase`](super::GenericDatabase) operations.
#[derive(Debug, Error)]
pub enum DbError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Model(#[from] ModelError),

  /// The addressed kind declares no physical table.
  #[error("{kind} is not bound to a physical table")]
  UnboundTable { kind: &'static str },

  /// A single-row operation received a container of several rows.
  #[error("{kind} holds {count} rows; expected exactly one")]
  MultipleRows { kind: &'static str, count: usize },

  /// The record has nothing to write.
  #[error("{kind} has no columns or rows to write")]
  EmptyRecord { kind: &'static str },
}
