//! Core traits and types for the query cache.

use chrono::{DateTime, Utc};

use crate::model::{Items, Row, Table};

/// A cached read result.
#[derive(Debug, Clone)]
pub enum CachedValue {
  Row(Row),
  Items(Items),
  Table(Table),
}

/// Trait for read results that can be cached.
///
/// Each read operation caches exactly one result type; `from_cached`
/// returns `None` when an entry holds a different one.
pub trait Cacheable: Clone + Send + Sync + 'static {
  fn into_cached(self) -> CachedValue;

  fn from_cached(value: &CachedValue) -> Option<Self>;
}

impl Cacheable for Row {
  fn into_cached(self) -> CachedValue {
    CachedValue::Row(self)
  }

  fn from_cached(value: &CachedValue) -> Option<Self> {
    match value {
      CachedValue::Row(r) => Some(r.clone()),
      _ => None,
    }
  }
}

impl Cacheable for Items {
  fn into_cached(self) -> CachedValue {
    CachedValue::Items(self)
  }

  fn from_cached(value: &CachedValue) -> Option<Self> {
    match value {
      CachedValue::Items(i) => Some(i.clone()),
      _ => None,
    }
  }
}

impl Cacheable for Table {
  fn into_cached(self) -> CachedValue {
    CachedValue::Table(self)
  }

  fn from_cached(value: &CachedValue) -> Option<Self> {
    match value {
      CachedValue::Table(t) => Some(t.clone()),
      _ => None,
    }
  }
}

/// A single cached entry.
#[derive(Debug, Clone)]
pub struct CachedEntry<T> {
  /// The cached result
  pub value: T,
  /// When the result was cached
  pub cached_at: DateTime<Utc>,
}
