//! Process-wide memo table for read results, invalidated per record kind.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::debug;

use super::key::{CacheKey, ReadOp};
use super::traits::{CachedEntry, CachedValue, Cacheable};
use crate::model::{Filters, Kind};

/// Counters tracking cache effectiveness.
#[derive(Debug, Default)]
pub struct CacheStats {
  hits: AtomicU64,
  misses: AtomicU64,
  invalidations: AtomicU64,
}

impl CacheStats {
  pub fn hits(&self) -> u64 {
    self.hits.load(Ordering::Relaxed)
  }

  pub fn misses(&self) -> u64 {
    self.misses.load(Ordering::Relaxed)
  }

  pub fn invalidations(&self) -> u64 {
    self.invalidations.load(Ordering::Relaxed)
  }
}

impl fmt::Display for CacheStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "hits={} misses={} invalidations={}",
      self.hits(),
      self.misses(),
      self.invalidations()
    )
  }
}

/// Entry key within a kind bucket. Kinds sharing a row kind may be bound to
/// different physical tables, so the table is part of the key.
type EntryKey = (ReadOp, Option<&'static str>, Filters);

/// All cached reads of one canonical row kind.
#[derive(Debug, Default)]
struct KindBucket {
  entries: HashMap<EntryKey, CachedEntry<CachedValue>>,
}

impl KindBucket {
  fn touches(&self, table: &str) -> bool {
    self.entries.keys().any(|(_, t, _)| *t == Some(table))
  }
}

fn entry_key(key: &CacheKey) -> EntryKey {
  (key.op, key.table, key.filters.clone())
}

/// Cache of read results keyed by `(operation, row kind, filters)`.
///
/// The lock covers both the lookup-then-insert sequence and the invalidation
/// sweep, so one cache can be shared between clients and tasks.
#[derive(Debug, Default)]
pub struct QueryCache {
  buckets: Mutex<HashMap<&'static str, KindBucket>>,
  /// Entries older than this are treated as misses. `None` means entries
  /// live until invalidated.
  stale_time: Option<Duration>,
  stats: CacheStats,
}

static GLOBAL: OnceLock<Arc<QueryCache>> = OnceLock::new();

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide cache, for clients that should share one memo table.
  pub fn global() -> Arc<QueryCache> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(QueryCache::new())))
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = Some(stale_time);
    self
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, KindBucket>> {
    // A panic while holding the lock cannot leave a bucket half-written.
    self.buckets.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Look up a cached result. Counts a hit or a miss.
  pub fn get<T: Cacheable>(&self, key: &CacheKey) -> Option<CachedEntry<T>> {
    let buckets = self.lock();
    let found = buckets
      .get(key.kind)
      .and_then(|b| b.entries.get(&entry_key(key)))
      .filter(|entry| match self.stale_time {
        Some(stale) => Utc::now() - entry.cached_at <= stale,
        None => true,
      })
      .and_then(|entry| {
        T::from_cached(&entry.value).map(|value| CachedEntry {
          value,
          cached_at: entry.cached_at,
        })
      });

    match found {
      Some(entry) => {
        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, digest = %key.digest(), "cache hit");
        Some(entry)
      }
      None => {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "cache miss");
        None
      }
    }
  }

  /// Store a result, replacing any previous entry for the key.
  pub fn insert<T: Cacheable>(&self, key: &CacheKey, value: T) {
    let mut buckets = self.lock();
    buckets.entry(key.kind).or_default().entries.insert(
      entry_key(key),
      CachedEntry {
        value: value.into_cached(),
        cached_at: Utc::now(),
      },
    );
  }

  /// Drop every cached read of `kind`'s canonical row kind, across all read
  /// operations and filters.
  pub fn invalidate(&self, kind: Kind) {
    let name = kind.row_kind().name();
    if self.lock().remove(name).is_some() {
      self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
      debug!(kind = name, "cache invalidated");
    }
  }

  /// Drop every kind bucket holding reads of the physical table `table`.
  pub fn invalidate_table(&self, table: &str) {
    let mut buckets = self.lock();
    let before = buckets.len();
    buckets.retain(|_, bucket| !bucket.touches(table));
    let removed = before - buckets.len();
    if removed > 0 {
      self
        .stats
        .invalidations
        .fetch_add(removed as u64, Ordering::Relaxed);
      debug!(table, removed, "cache invalidated by table");
    }
  }

  pub fn clear(&self) {
    self.lock().clear();
  }

  /// Number of cached entries across all kinds.
  pub fn len(&self) -> usize {
    self.lock().values().map(|b| b.entries.len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn stats(&self) -> &CacheStats {
    &self.stats
  }
}
