//! A SQL-text-keyed, TTL-based cache of first-page query results.
//!
//! Advisory only: a miss never changes observable semantics (spec §3, §4.5). Entries
//! are evicted lazily, on lookup, rather than by a background sweep.

use crate::query::{ColumnMetadata, Row};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct CachedResult {
    pub columns: Vec<ColumnMetadata>,
    pub rows: Vec<Row>,
}

struct Entry {
    value: CachedResult,
    inserted_at: Instant,
}

/// Caches the first page of a successful `execute` keyed by the exact SQL text.
#[derive(Debug, Default)]
pub struct ResponseCache {
    ttl: Option<Duration>,
    entries: HashMap<String, Entry>,
}

impl std::fmt::Debug for Entry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Entry")
            .field("inserted_at", &self.inserted_at)
            .finish()
    }
}

impl ResponseCache {
    /// `ttl_ms == 0` disables the cache: `lookup` always misses and `insert` is a
    /// no-op, matching the `cacheTimeout` configuration default (spec §6).
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl: if ttl_ms == 0 {
                None
            } else {
                Some(Duration::from_millis(ttl_ms))
            },
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl.is_some()
    }

    /// Returns the cached result for `sql`, evicting it first if it has expired.
    pub(crate) fn lookup(&mut self, sql: &str) -> Option<CachedResult> {
        let ttl = self.ttl?;
        let expired = self
            .entries
            .get(sql)
            .is_some_and(|e| e.inserted_at.elapsed() >= ttl);
        if expired {
            self.entries.remove(sql);
            return None;
        }
        self.entries.get(sql).map(|e| e.value.clone())
    }

    /// Inserts the first page of a fresh execute. A no-op when the cache is disabled.
    pub(crate) fn insert(&mut self, sql: String, value: CachedResult) {
        if self.ttl.is_none() {
            return;
        }
        self.entries.insert(
            sql,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}
