//! Generic PostgreSQL client mapping rows and tables to and from one schema.
//!
//! Reads are memoized in a [`QueryCache`]; every write first invalidates the
//! cached reads of the record's kind. Without a live connection the client
//! runs against a [`FallbackCursor`], so no operation fails for lack of a
//! connection: reads come back empty and writes do nothing.

pub mod cursor;
mod error;
pub mod statement;


pub use cursor::{Connector, Cursor, FallbackCursor, PgConnector, PgCursor, RawRow};
pub use error::{DbError, DbResult, StoreError};
pub use statement::{and_convert, Limit};

use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::cache::{CacheKey, QueryCache, ReadOp};
use crate::model::{
  Filters, Items, Kind, ModelError, Record, Row, RowKind, Table, TableKind, Value,
};

/// Connection parameters and target schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
  pub host: String,
  pub port: u16,
  pub user: String,
  pub password: Option<String>,
  pub dbname: String,
  pub schema: String,
}

impl Default for DbConfig {
  fn default() -> Self {
    Self {
      host: "localhost".to_string(),
      port: 5432,
      user: "postgres".to_string(),
      password: None,
      dbname: "postgres".to_string(),
      schema: "public".to_string(),
    }
  }
}

/// Target of table-level operations (`drop_table`, `drop_table_column`,
/// `add_table_column`): a declared kind or a bare table name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRef {
  Kind(Kind),
  Name(String),
}

impl From<Kind> for TableRef {
  fn from(kind: Kind) -> Self {
    TableRef::Kind(kind)
  }
}

impl From<&'static RowKind> for TableRef {
  fn from(kind: &'static RowKind) -> Self {
    TableRef::Kind(kind.into())
  }
}

impl From<&'static TableKind> for TableRef {
  fn from(kind: &'static TableKind) -> Self {
    TableRef::Kind(kind.into())
  }
}

impl From<&str> for TableRef {
  fn from(name: &str) -> Self {
    TableRef::Name(name.to_string())
  }
}

impl From<String> for TableRef {
  fn from(name: String) -> Self {
    TableRef::Name(name)
  }
}

/// Database client over one connection and one schema.
pub struct GenericDatabase {
  config: DbConfig,
  connector: Box<dyn Connector>,
  cursor: Box<dyn Cursor>,
  cache: Arc<QueryCache>,
}

impl GenericDatabase {
  /// A client that has not connected yet. It runs on the fallback cursor
  /// until [`cursor_gen`](Self::cursor_gen) succeeds.
  pub fn new(config: DbConfig) -> Self {
    Self::with_connector(config, PgConnector)
  }

  /// A client that opens its cursors through `connector`.
  pub fn with_connector(config: DbConfig, connector: impl Connector + 'static) -> Self {
    Self {
      config,
      connector: Box::new(connector),
      cursor: Box::new(FallbackCursor),
      cache: Arc::new(QueryCache::new()),
    }
  }

  /// Create a client and try to connect right away.
  pub async fn connect(config: DbConfig) -> Self {
    let mut db = Self::new(config);
    db.cursor_gen().await;
    db
  }

  /// Share `cache` with other clients, e.g. [`QueryCache::global`].
  pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
    self.cache = cache;
    self
  }

  pub fn config(&self) -> &DbConfig {
    &self.config
  }

  pub fn schema(&self) -> &str {
    &self.config.schema
  }

  pub fn cache(&self) -> &Arc<QueryCache> {
    &self.cache
  }

  /// Replace the current cursor with a fresh connection. On failure the
  /// error is logged and the fallback cursor takes over.
  pub async fn cursor_gen(&mut self) {
    match self.connector.connect(&self.config).await {
      Ok(cursor) => self.cursor = cursor,
      Err(e) => {
        error!(error = %e, host = %self.config.host, "could not open cursor; using fallback");
        self.cursor = Box::new(FallbackCursor);
      }
    }
  }

  pub fn is_connected(&self) -> bool {
    self.cursor.is_connected()
  }

  pub fn and_convert(&self, filters: &Filters) -> String {
    statement::and_convert(filters)
  }

  /// Run one statement.
  ///
  /// A lost connection is retried exactly once on a regenerated cursor.
  /// Other store errors are logged and returned.
  pub async fn execute(&mut self, statement: &str) -> DbResult<()> {
    debug!(statement, "execute");
    match self.cursor.execute(statement).await {
      Ok(()) => Ok(()),
      Err(StoreError::ConnectionLost(reason)) => {
        warn!(%reason, "connection lost; reconnecting once");
        self.cursor_gen().await;
        self.cursor.execute(statement).await.map_err(|e| {
          error!(error = %e, statement, "statement failed after reconnect");
          DbError::from(e)
        })
      }
      Err(e) => {
        error!(error = %e, statement, "statement failed");
        Err(e.into())
      }
    }
  }

  /// Build a row of `kind` from a raw result row.
  ///
  /// Concrete row kinds are filled positionally; untyped kinds take their
  /// columns from the cursor's result description.
  pub fn gen_row(&self, kind: Kind, values: RawRow) -> Result<Row, ModelError> {
    let row_kind = kind.row_kind();
    if !row_kind.is_untyped() {
      return Row::new(row_kind, values);
    }
    let description = self.cursor.description();
    let columns = (!description.is_empty()).then_some(description);
    Row::untyped(row_kind, values, columns)
  }

  fn table_of(kind: Kind) -> DbResult<&'static str> {
    kind
      .table_name()
      .ok_or(DbError::UnboundTable { kind: kind.name() })
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  /// Fetch the first row of `kind` matching `filters`, or `default`.
  pub async fn get_item(
    &mut self,
    kind: impl Into<Kind>,
    default: Option<Row>,
    filters: &Filters,
  ) -> DbResult<Option<Row>> {
    let kind = kind.into();
    let key = CacheKey::new(ReadOp::Item, kind, filters);
    if let Some(hit) = self.cache.get::<Row>(&key) {
      return Ok(Some(hit.value));
    }

    let table = Self::table_of(kind)?;
    self
      .execute(&statement::select(self.schema(), table, filters, true))
      .await?;

    let Some(raw) = self.cursor.fetch_one() else {
      return Ok(default);
    };
    let row = self.gen_row(kind, raw)?;
    self.cache.insert(&key, row.clone());
    Ok(Some(row))
  }

  /// Fetch every row of `kind` matching `filters`.
  ///
  /// Rows that cannot be built are logged and skipped. Table kinds get their
  /// rows wrapped in a [`Table`], falling back to loose rows when the rows
  /// do not fit one. Returns `default` when nothing matches.
  pub async fn get_items(
    &mut self,
    kind: impl Into<Kind>,
    default: Items,
    filters: &Filters,
  ) -> DbResult<Items> {
    let kind = kind.into();
    let key = CacheKey::new(ReadOp::Items, kind, filters);
    if let Some(hit) = self.cache.get::<Items>(&key) {
      if hit.value.is_empty() {
        return Ok(default);
      }
      // Row and table kinds share entries; reshape for the caller's kind.
      return Ok(Self::shape_items(kind, hit.value.into_rows()));
    }

    let table = Self::table_of(kind)?;
    self
      .execute(&statement::select(self.schema(), table, filters, false))
      .await?;

    let mut rows = Vec::new();
    for raw in self.cursor.fetch_all() {
      match self.gen_row(kind, raw) {
        Ok(row) => rows.push(row),
        Err(e) => error!(error = %e, kind = kind.name(), "skipping row"),
      }
    }
    if rows.is_empty() {
      // An empty answer from a live store is a result; from the fallback
      // cursor it is not.
      if self.is_connected() {
        self.cache.insert(&key, Items::Rows(Vec::new()));
      }
      return Ok(default);
    }

    let items = Self::shape_items(kind, rows);
    self.cache.insert(&key, items.clone());
    Ok(items)
  }

  fn shape_items(kind: Kind, rows: Vec<Row>) -> Items {
    match kind {
      Kind::Table(table_kind) => match Table::with_rows(table_kind, rows.iter().cloned()) {
        Ok(table) => Items::Table(table),
        Err(e) => {
          warn!(error = %e, kind = kind.name(), "rows do not fit the table; returning them loose");
          Items::Rows(rows)
        }
      },
      Kind::Row(_) => Items::Rows(rows),
    }
  }

  /// Load every row of the kind's table.
  pub async fn load_table(&mut self, kind: &'static TableKind) -> DbResult<Table> {
    let key = CacheKey::new(ReadOp::LoadTable, Kind::Table(kind), &Filters::new());
    if let Some(hit) = self.cache.get::<Table>(&key) {
      return Ok(hit.value);
    }

    let table_name = Self::table_of(Kind::Table(kind))?;
    self
      .execute(&statement::select(
        self.schema(),
        table_name,
        &Filters::new(),
        false,
      ))
      .await?;

    let mut table = Table::new(kind);
    for raw in self.cursor.fetch_all() {
      let row = self.gen_row(Kind::Table(kind), raw)?;
      table.add_row(row)?;
    }
    if self.is_connected() {
      self.cache.insert(&key, table.clone());
    }
    Ok(table)
  }

  // ==========================================================================
  // Writes
  // ==========================================================================

  /// `UPDATE ... SET` every column of `data` on the rows matching `filters`.
  pub async fn update_item(
    &mut self,
    data: &(impl Record + ?Sized),
    filters: &Filters,
  ) -> DbResult<()> {
    let kind = data.kind();
    self.cache.invalidate(kind);
    let table = Self::table_of(kind)?;
    let query = statement::update(self.schema(), table, data.rows(), filters)
      .ok_or(DbError::EmptyRecord { kind: kind.name() })?;
    self.execute(&query).await
  }

  /// Insert a single row. A container must hold exactly one row.
  pub async fn insert_item(&mut self, data: &(impl Record + ?Sized)) -> DbResult<()> {
    let kind = data.kind();
    self.cache.invalidate(kind);
    let table = Self::table_of(kind)?;

    let row = match data.rows() {
      [row] => row,
      [] => return Err(DbError::EmptyRecord { kind: kind.name() }),
      rows => {
        error!(
          kind = kind.name(),
          count = rows.len(),
          "insert_item expects one row"
        );
        return Err(DbError::MultipleRows {
          kind: kind.name(),
          count: rows.len(),
        });
      }
    };

    let query = statement::insert(self.schema(), table, row)
      .ok_or(DbError::EmptyRecord { kind: kind.name() })?;
    self.execute(&query).await
  }

  /// Insert every row of `data`, one statement per row.
  pub async fn insert_items(&mut self, data: &(impl Record + ?Sized)) -> DbResult<()> {
    let kind = data.kind();
    self.cache.invalidate(kind);
    let table = Self::table_of(kind)?;

    for row in data.rows() {
      let query = statement::insert(self.schema(), table, row)
        .ok_or(DbError::EmptyRecord { kind: kind.name() })?;
      self.execute(&query).await?;
    }
    Ok(())
  }

  /// Delete the rows of `kind` matching `filters`, at most `limit` of them.
  pub async fn remove_rows(
    &mut self,
    kind: impl Into<Kind>,
    limit: Option<Limit>,
    filters: &Filters,
  ) -> DbResult<()> {
    let kind = kind.into();
    self.cache.invalidate(kind);
    let table = Self::table_of(kind)?;
    let query = statement::delete(self.schema(), table, filters, limit);
    self.execute(&query).await
  }

  /// Invalidate the cached reads of `target` and resolve its table name.
  fn target_table(&self, target: TableRef) -> DbResult<String> {
    match target {
      TableRef::Kind(kind) => {
        self.cache.invalidate(kind);
        Ok(Self::table_of(kind)?.to_string())
      }
      TableRef::Name(name) => {
        self.cache.invalidate_table(&name);
        Ok(name)
      }
    }
  }

  /// Drop a physical table, by kind or by name.
  pub async fn drop_table(&mut self, target: impl Into<TableRef>) -> DbResult<()> {
    let table = self.target_table(target.into())?;
    let query = statement::drop_table(self.schema(), &table);
    self.execute(&query).await
  }

  /// Drop `column` from a physical table, by kind or by name. No in-memory
  /// record is touched; see [`remove_column`](Self::remove_column).
  pub async fn drop_table_column(
    &mut self,
    target: impl Into<TableRef>,
    column: &str,
  ) -> DbResult<()> {
    let table = self.target_table(target.into())?;
    let query = statement::drop_column(self.schema(), &table, column);
    self.execute(&query).await
  }

  /// Add `column` to a physical table, by kind or by name.
  pub async fn add_table_column(
    &mut self,
    target: impl Into<TableRef>,
    column: &str,
    column_type: &str,
    default: Option<&Value>,
  ) -> DbResult<()> {
    let table = self.target_table(target.into())?;
    let literal = default.map(Value::sql_literal);
    let query = statement::add_column(
      self.schema(),
      &table,
      column,
      column_type,
      literal.as_deref(),
    );
    self.execute(&query).await
  }

  /// Drop `column` from the store and from the in-memory record.
  pub async fn remove_column(
    &mut self,
    data: &mut (impl Record + ?Sized),
    column: &str,
  ) -> DbResult<()> {
    self.drop_table_column(data.kind(), column).await?;
    data.remove_column(column);
    Ok(())
  }

  /// Add `column` to the store and to the in-memory record.
  ///
  /// Existing rows in memory get `default`, or `Null` when absent.
  pub async fn add_column(
    &mut self,
    data: &mut (impl Record + ?Sized),
    column: &str,
    column_type: &str,
    default: Option<Value>,
  ) -> DbResult<()> {
    self
      .add_table_column(data.kind(), column, column_type, default.as_ref())
      .await?;
    data.add_column(column, default.unwrap_or(Value::Null));
    Ok(())
  }

  /// Create the record's table with `columns` (name, SQL type), then try to
  /// insert the record's rows. A failed insert is logged, not returned.
  pub async fn create_table(
    &mut self,
    data: &(impl Record + ?Sized),
    columns: &[(&str, &str)],
  ) -> DbResult<()> {
    let kind = data.kind();
    let table = Self::table_of(kind)?;
    let query = statement::create_table(self.schema(), table, columns);
    self.execute(&query).await?;

    if let Err(e) = self.insert_items(data).await {
      warn!(error = %e, table, "table created but initial rows were not inserted");
    }
    Ok(())
  }

  // ==========================================================================
  // Schema
  // ==========================================================================

  /// Names of the tables in the configured schema.
  pub async fn get_tables(&mut self) -> DbResult<Vec<String>> {
    let query = statement::list_tables(self.schema());
    self.execute(&query).await?;
    Ok(
      self
        .cursor
        .fetch_all()
        .into_iter()
        .filter_map(|raw| raw.into_iter().next())
        .map(|v| v.to_string())
        .collect(),
    )
  }

  /// Whether the configured schema exists. `None` without a live connection.
  pub async fn schema_exists(&mut self) -> DbResult<Option<bool>> {
    if !self.is_connected() {
      return Ok(None);
    }
    let query = statement::schema_exists(self.schema());
    self.execute(&query).await?;
    Ok(
      self
        .cursor
        .fetch_one()
        .and_then(|raw| raw.into_iter().next())
        .and_then(|v| v.as_bool()),
    )
  }

  pub async fn create_schema(&mut self) -> DbResult<()> {
    let query = statement::create_schema(self.schema());
    self.execute(&query).await
  }
}
