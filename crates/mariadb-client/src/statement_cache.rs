//! Prepared statement caching with LRU eviction.
//!
//! Statements are cached by their SQL text. When the cache is full the least
//! recently used statement is evicted and handed back to the caller, which
//! must release it on the server with `COM_STMT_CLOSE`.
//!
//! A cache size of 0 disables caching: every lookup misses and every insert
//! returns the statement straight back for closing after use.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::config::DEFAULT_PREP_STMT_CACHE_SIZE;
use crate::transport::PreparedMeta;

/// A cached prepared statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatement {
    sql: String,
    meta: PreparedMeta,
}

impl PreparedStatement {
    /// Create a new prepared statement.
    pub fn new(sql: impl Into<String>, meta: PreparedMeta) -> Self {
        Self {
            sql: sql.into(),
            meta,
        }
    }

    /// Server-assigned statement id.
    #[must_use]
    pub fn statement_id(&self) -> u32 {
        self.meta.statement_id
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Prepare metadata.
    #[must_use]
    pub fn meta(&self) -> &PreparedMeta {
        &self.meta
    }
}

/// LRU cache for prepared statements.
pub struct StatementCache {
    cache: Option<LruCache<String, PreparedStatement>>,
    hits: u64,
    misses: u64,
}

impl StatementCache {
    /// Create a cache holding at most `max_size` statements.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(max_size).map(LruCache::new),
            hits: 0,
            misses: 0,
        }
    }

    /// Look up a statement by SQL text, updating the LRU order.
    pub fn get(&mut self, sql: &str) -> Option<&PreparedStatement> {
        match self.cache.as_mut().and_then(|cache| cache.get(sql)) {
            Some(stmt) => {
                self.hits += 1;
                tracing::trace!(sql = sql, id = stmt.statement_id(), "statement cache hit");
                Some(stmt)
            }
            None => {
                self.misses += 1;
                tracing::trace!(sql = sql, "statement cache miss");
                None
            }
        }
    }

    /// Peek at a statement without updating the LRU order.
    #[must_use]
    pub fn peek(&self, sql: &str) -> Option<&PreparedStatement> {
        self.cache.as_ref().and_then(|cache| cache.peek(sql))
    }

    /// Insert a statement.
    ///
    /// Returns the statement that must now be closed: the evicted one when
    /// the cache was full, or `stmt` itself when caching is disabled or the
    /// SQL is already cached.
    pub fn insert(&mut self, stmt: PreparedStatement) -> Option<PreparedStatement> {
        let Some(cache) = self.cache.as_mut() else {
            return Some(stmt);
        };
        if cache.contains(stmt.sql()) {
            return Some(stmt);
        }

        tracing::debug!(
            sql = stmt.sql(),
            id = stmt.statement_id(),
            "caching prepared statement"
        );
        let evicted = cache
            .push(stmt.sql.clone(), stmt)
            .map(|(_, evicted)| evicted);
        if let Some(evicted) = &evicted {
            tracing::debug!(
                sql = evicted.sql(),
                id = evicted.statement_id(),
                "evicting prepared statement"
            );
        }
        evicted
    }

    /// Remove a statement.
    pub fn remove(&mut self, sql: &str) -> Option<PreparedStatement> {
        self.cache.as_mut().and_then(|cache| cache.pop(sql))
    }

    /// Remove all statements, returning them for closing.
    pub fn clear(&mut self) -> Vec<PreparedStatement> {
        let mut statements = Vec::with_capacity(self.len());
        if let Some(cache) = self.cache.as_mut() {
            while let Some((_, stmt)) = cache.pop_lru() {
                statements.push(stmt);
            }
        }
        tracing::debug!(count = statements.len(), "cleared statement cache");
        statements
    }

    /// Number of cached statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    /// Whether no statement is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached statements.
    #[must_use]
    pub fn max_size(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.cap().get())
    }

    /// Whether caching is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    /// Number of cache hits.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of cache misses.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new(DEFAULT_PREP_STMT_CACHE_SIZE)
    }
}

impl std::fmt::Debug for StatementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stmt(id: u32, sql: &str) -> PreparedStatement {
        PreparedStatement::new(
            sql,
            PreparedMeta {
                statement_id: id,
                param_count: 0,
                fields: Vec::new(),
            },
        )
    }

    #[test]
    fn test_insert_and_get() {
        let mut cache = StatementCache::new(10);
        assert!(cache.insert(stmt(1, "SELECT 1")).is_none());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("SELECT 1").unwrap().statement_id(), 1);
        assert_eq!(cache.hits(), 1);
        assert!(cache.get("SELECT 2").is_none());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = StatementCache::new(2);
        cache.insert(stmt(1, "SELECT 1"));
        cache.insert(stmt(2, "SELECT 2"));

        cache.get("SELECT 1");
        let evicted = cache.insert(stmt(3, "SELECT 3")).unwrap();
        assert_eq!(evicted.statement_id(), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.peek("SELECT 1").is_some());
        assert!(cache.peek("SELECT 2").is_none());
    }

    #[test]
    fn test_duplicate_insert_returns_new_statement() {
        let mut cache = StatementCache::new(4);
        cache.insert(stmt(1, "SELECT 1"));
        let rejected = cache.insert(stmt(9, "SELECT 1")).unwrap();
        assert_eq!(rejected.statement_id(), 9);
        assert_eq!(cache.peek("SELECT 1").unwrap().statement_id(), 1);
    }

    #[test]
    fn test_disabled_cache() {
        let mut cache = StatementCache::new(0);
        assert!(!cache.is_enabled());
        assert_eq!(cache.insert(stmt(1, "SELECT 1")).unwrap().statement_id(), 1);
        assert!(cache.get("SELECT 1").is_none());
        assert!(cache.is_empty());
        assert_eq!(cache.max_size(), 0);
    }

    #[test]
    fn test_clear_and_remove() {
        let mut cache = StatementCache::new(10);
        cache.insert(stmt(1, "SELECT 1"));
        cache.insert(stmt(2, "SELECT 2"));
        assert_eq!(cache.remove("SELECT 1").unwrap().statement_id(), 1);

        let cleared = cache.clear();
        assert_eq!(cleared.len(), 1);
        assert!(cache.is_empty());
    }
}
