//! Cursors: the live PostgreSQL cursor, the no-op fallback, and the
//! connector seam that produces them.

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, error};

use super::error::StoreError;
use super::DbConfig;
use crate::model::Value;

/// A raw result row: positional values.
pub type RawRow = Vec<Value>;

/// Cursor over one connection. Each `execute` replaces the buffered result;
/// fetches consume it.
#[async_trait]
pub trait Cursor: Send {
  async fn execute(&mut self, statement: &str) -> Result<(), StoreError>;

  fn fetch_one(&mut self) -> Option<RawRow>;

  fn fetch_many(&mut self, size: usize) -> Vec<RawRow>;

  fn fetch_all(&mut self) -> Vec<RawRow>;

  /// Column names of the last result.
  fn description(&self) -> Vec<String>;

  fn is_connected(&self) -> bool;
}

/// Stand-in cursor used whenever no live connection exists.
///
/// Every call succeeds and yields the empty outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct FallbackCursor;

#[async_trait]
impl Cursor for FallbackCursor {
  async fn execute(&mut self, _statement: &str) -> Result<(), StoreError> {
    Ok(())
  }

  fn fetch_one(&mut self) -> Option<RawRow> {
    None
  }

  fn fetch_many(&mut self, _size: usize) -> Vec<RawRow> {
    Vec::new()
  }

  fn fetch_all(&mut self) -> Vec<RawRow> {
    Vec::new()
  }

  fn description(&self) -> Vec<String> {
    Vec::new()
  }

  fn is_connected(&self) -> bool {
    false
  }
}

/// Live cursor over a `tokio_postgres` client.
///
/// The client is in autocommit mode: no transaction is ever opened.
pub struct PgCursor {
  client: Client,
  buffered: VecDeque<RawRow>,
  description: Vec<String>,
}

impl PgCursor {
  pub fn new(client: Client) -> Self {
    Self {
      client,
      buffered: VecDeque::new(),
      description: Vec::new(),
    }
  }
}

#[async_trait]
impl Cursor for PgCursor {
  async fn execute(&mut self, statement: &str) -> Result<(), StoreError> {
    self.buffered.clear();
    self.description.clear();

    // Preparing exposes column names and types even when no rows match. The
    // rows themselves come back in text format, so every type keeps its value.
    let prepared = self.client.prepare(statement).await?;
    let types: Vec<Type> = prepared.columns().iter().map(|c| c.type_().clone()).collect();
    self.description = prepared
      .columns()
      .iter()
      .map(|c| c.name().to_string())
      .collect();

    for message in self.client.simple_query(statement).await? {
      if let SimpleQueryMessage::Row(row) = message {
        let values = (0..row.len())
          .map(|i| decode_text(types.get(i).unwrap_or(&Type::TEXT), row.get(i)))
          .collect();
        self.buffered.push_back(values);
      }
    }
    Ok(())
  }

  fn fetch_one(&mut self) -> Option<RawRow> {
    self.buffered.pop_front()
  }

  fn fetch_many(&mut self, size: usize) -> Vec<RawRow> {
    let n = size.min(self.buffered.len());
    self.buffered.drain(..n).collect()
  }

  fn fetch_all(&mut self) -> Vec<RawRow> {
    self.buffered.drain(..).collect()
  }

  fn description(&self) -> Vec<String> {
    self.description.clone()
  }

  fn is_connected(&self) -> bool {
    !self.client.is_closed()
  }
}

/// Convert a text-format cell into a [`Value`].
///
/// Booleans, integers and floats become typed values. Everything else
/// (timestamps, numeric, uuid, json, bytea, ...) keeps PostgreSQL's text
/// rendering, which the store accepts back as a quoted literal.
fn decode_text(ty: &Type, text: Option<&str>) -> Value {
  let Some(text) = text else {
    return Value::Null;
  };

  let parsed = if *ty == Type::BOOL {
    match text {
      "t" => Some(Value::Bool(true)),
      "f" => Some(Value::Bool(false)),
      _ => None,
    }
  } else if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 || *ty == Type::OID {
    text.parse::<i64>().ok().map(Value::Int)
  } else if *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
    text.parse::<f64>().ok().map(Value::Float)
  } else {
    None
  };

  parsed.unwrap_or_else(|| {
    if *ty == Type::BOOL || *ty == Type::FLOAT4 || *ty == Type::FLOAT8 {
      debug!(ty = %ty, text, "unparsable cell kept as text");
    }
    Value::Text(text.to_string())
  })
}

/// Opens cursors for a configuration.
#[async_trait]
pub trait Connector: Send + Sync {
  async fn connect(&self, config: &DbConfig) -> Result<Box<dyn Cursor>, StoreError>;
}

/// Connects to PostgreSQL over TCP without TLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgConnector;

#[async_trait]
impl Connector for PgConnector {
  async fn connect(&self, config: &DbConfig) -> Result<Box<dyn Cursor>, StoreError> {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
      .port(config.port)
      .user(&config.user)
      .dbname(&config.dbname);
    if let Some(password) = &config.password {
      pg.password(password);
    }

    let (client, connection) = pg
      .connect(NoTls)
      .await
      .map_err(|e| StoreError::Connect(e.to_string()))?;

    // The connection object drives the socket until the client is dropped.
    tokio::spawn(async move {
      if let Err(e) = connection.await {
        error!(error = %e, "postgres connection closed with error");
      }
    });

    debug!(host = %config.host, port = config.port, dbname = %config.dbname, "connected");
    Ok(Box::new(PgCursor::new(client)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_fallback_cursor_is_total() {
    let mut cursor = FallbackCursor;
    assert!(cursor.execute("SELECT 1").await.is_ok());
    assert!(cursor.execute("not even sql").await.is_ok());
    assert_eq!(cursor.fetch_one(), None);
    assert!(cursor.fetch_many(10).is_empty());
    assert!(cursor.fetch_all().is_empty());
    assert!(cursor.description().is_empty());
    assert!(!cursor.is_connected());
  }

  #[test]
  fn test_decode_typed_cells() {
    assert_eq!(decode_text(&Type::BOOL, Some("t")), Value::Bool(true));
    assert_eq!(decode_text(&Type::BOOL, Some("f")), Value::Bool(false));
    assert_eq!(decode_text(&Type::INT4, Some("-7")), Value::Int(-7));
    assert_eq!(decode_text(&Type::INT8, Some("9000000000")), Value::Int(9_000_000_000));
    assert_eq!(decode_text(&Type::FLOAT8, Some("1.5")), Value::Float(1.5));
    assert!(matches!(
      decode_text(&Type::FLOAT8, Some("NaN")),
      Value::Float(f) if f.is_nan()
    ));
    assert_eq!(decode_text(&Type::TEXT, Some("keep")), Value::from("keep"));
    assert_eq!(decode_text(&Type::INT4, None), Value::Null);
  }

  #[test]
  fn test_other_types_keep_their_text() {
    assert_eq!(
      decode_text(&Type::TIMESTAMP, Some("2024-01-02 03:04:05")),
      Value::from("2024-01-02 03:04:05")
    );
    assert_eq!(decode_text(&Type::NUMERIC, Some("12.50")), Value::from("12.50"));
    assert_eq!(
      decode_text(&Type::UUID, Some("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")),
      Value::from("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11")
    );
    assert_eq!(decode_text(&Type::BYTEA, Some("\\x0102")), Value::from("\\x0102"));
    assert_eq!(decode_text(&Type::NUMERIC, None), Value::Null);
  }

  #[test]
  fn test_text_cells_round_trip_as_literals() {
    let created = decode_text(&Type::TIMESTAMP, Some("2024-01-02 03:04:05"));
    let amount = decode_text(&Type::NUMERIC, Some("12.50"));
    assert_eq!(created.sql_literal(), "'2024-01-02 03:04:05'");
    assert_eq!(amount.sql_literal(), "'12.50'");
  }

  #[tokio::test]
  async fn test_unreachable_server_fails_to_connect() {
    let config = DbConfig {
      host: "127.0.0.1".into(),
      port: 1,
      ..DbConfig::default()
    };
    let result = PgConnector.connect(&config).await;
    assert!(matches!(result, Err(StoreError::Connect(_))));
  }
}
