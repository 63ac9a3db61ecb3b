//! Query-result cache with per-kind invalidation.
//!
//! Reads are memoized by `(operation, canonical row kind, filters)`. Any
//! write to a kind drops every cached read of that kind, whatever the
//! operation or filters; precision is traded for simplicity.

mod key;
mod layer;
mod traits;

pub use key::{CacheKey, ReadOp};
pub use layer::{CacheStats, QueryCache};
pub use traits::{CachedEntry, CachedValue, Cacheable};
