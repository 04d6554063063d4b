//! Content-addressed memo cache.
//!
//! Values are keyed by a [`Fingerprint`]: the blake3 hash of the bincode
//! encoding of whatever identifies them. Two keys that serialize to the
//! same bytes share an entry, so callers fingerprint everything that
//! influences the cached value and nothing else.
//!
//! ```
//! use normalize_ca_cache::{Fingerprint, MemoCache, MemoryCache};
//!
//! let cache = MemoryCache::new(16);
//! let key = Fingerprint::of(&("fn main() {}", "rust")).unwrap();
//! assert!(cache.get(&key).is_none());
//! cache.put(key, "fn main() {}\n".to_string());
//! assert_eq!(cache.get(&key).as_deref(), Some("fn main() {}\n"));
//! ```

mod fingerprint;
mod memory;

pub use fingerprint::{Fingerprint, FingerprintError};
pub use memory::{CacheStats, MemoryCache, NoCache};

/// Shared memo store.
///
/// Implementations must tolerate concurrent `get`/`put` from many callers.
/// A lost race is allowed to recompute: the last writer wins.
pub trait MemoCache: Send + Sync {
    fn get(&self, key: &Fingerprint) -> Option<String>;

    fn put(&self, key: Fingerprint, value: String);

    /// Hit/miss counters since construction or the last `clear`.
    fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    /// Drop every entry.
    fn clear(&self) {}
}
