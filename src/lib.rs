//! Typed row and table records over a PostgreSQL schema, with a query-result
//! cache invalidated per record kind.
//!
//! ```ignore
//! static NOTE: RowKind = RowKind::new("note", Some("notes"), &["id", "body"]);
//!
//! let mut db = GenericDatabase::connect(DbConfig::default()).await;
//! let note = db.get_item(&NOTE, None, &Filters::new().with("id", 1)).await?;
//! ```

pub mod cache;
pub mod config;
pub mod db;
pub mod model;

pub use cache::QueryCache;
pub use db::{DbConfig, DbError, DbResult, GenericDatabase, Limit, TableRef};
pub use model::{Filters, Items, Kind, Record, Row, RowKind, Table, TableKind, Value};
