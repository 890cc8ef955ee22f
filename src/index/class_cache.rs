//! Class model caching with LRU eviction and modification-time invalidation
//!
//! Only top-level models are stored. Nested models live inside their parent and are
//! reached through it, so evicting a parent drops its nested classes with it.
//!
//! # Validity
//!
//! A cached entry is served when
//! - its fingerprint is [`Fingerprint::Unversioned`] (archive or synthetic text), or
//! - the query is for a nested name, which means the parent was already validated, or
//! - its stored modification time equals the current one of its backing file.
//!
//! Anything else is a stale entry: it is dropped and the caller re-extracts.

use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{CompletionError, Result};
use crate::models::{ClassModel, Fingerprint, SourceOrigin};

/// Cache statistics for diagnostics and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Entries found but dropped because their backing file changed
    pub stale: u64,
    pub current_size: usize,
    pub max_capacity: usize,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// How strictly a lookup checks the entry against its backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Compare the stored modification time with the file on disk
    Verify,
    /// The caller only wants a nested class of this entry
    Trusted,
}

/// Current fingerprint of a file on disk
pub fn file_fingerprint(path: &Path) -> Result<Fingerprint> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| CompletionError::io(path, e))?;
    Ok(Fingerprint::Modified(modified))
}

/// Class names are matched case-insensitively, like the locator does
fn cache_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Bounded, recency-ordered store of top-level class models keyed by class name
#[derive(Debug)]
pub struct ClassCache {
    cache: RwLock<LruCache<String, Arc<ClassModel>>>,
    stats: RwLock<CacheStats>,
}

impl ClassCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats {
                max_capacity: capacity.get(),
                ..Default::default()
            }),
        }
    }

    /// Returns a valid cached model, refreshing its recency
    pub fn get(&self, name: &str, freshness: Freshness) -> Option<Arc<ClassModel>> {
        let mut cache = self.cache.write();
        let mut stats = self.stats.write();

        let key = cache_key(name);
        let Some(model) = cache.get(&key).cloned() else {
            stats.misses += 1;
            trace!("Class cache miss: {}", name);
            return None;
        };

        if freshness == Freshness::Trusted || is_current(&model) {
            stats.hits += 1;
            trace!("Class cache hit: {}", name);
            return Some(model);
        }

        debug!("{}", CompletionError::StaleCache(name.to_string()));
        cache.pop(&key);
        stats.stale += 1;
        stats.misses += 1;
        stats.current_size = cache.len();
        None
    }

    /// Stores a top-level model, evicting the least recently used entry when full.
    /// Nested models are refused.
    pub fn insert(&self, model: Arc<ClassModel>) {
        if model.is_nested() {
            debug!("Refusing to cache nested class {}", model.name);
            return;
        }

        let mut cache = self.cache.write();
        let mut stats = self.stats.write();

        let key = cache_key(&model.name);
        if let Some((evicted, _)) = cache.push(key.clone(), model) {
            if evicted != key {
                stats.evictions += 1;
                debug!("Evicted {} from class cache", evicted);
            }
        }
        stats.current_size = cache.len();
    }

    /// Whether `name` is cached, without touching its recency
    pub fn contains(&self, name: &str) -> bool {
        self.cache.read().contains(&cache_key(name))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<ClassModel>> {
        let mut cache = self.cache.write();
        let removed = cache.pop(&cache_key(name));
        self.stats.write().current_size = cache.len();
        removed
    }

    pub fn clear(&self) {
        let mut cache = self.cache.write();
        cache.clear();
        self.stats.write().current_size = 0;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl Default for ClassCache {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

fn is_current(model: &ClassModel) -> bool {
    match (model.fingerprint, &model.origin) {
        (Fingerprint::Unversioned, _) => true,
        (Fingerprint::Modified(stored), SourceOrigin::File(path)) => {
            matches!(file_fingerprint(path), Ok(Fingerprint::Modified(now)) if now == stored)
        }
        // Versioned text with no file behind it cannot be re-checked
        (Fingerprint::Modified(_), _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::time::{Duration, SystemTime};

    fn synthetic(name: &str) -> Arc<ClassModel> {
        Arc::new(ClassModel::new(
            name,
            SourceOrigin::Archive {
                archive: "/jdk/src.zip".into(),
                entry: format!("java/util/{name}.java"),
            },
            Fingerprint::Unversioned,
        ))
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = ClassCache::with_capacity(4);
        assert!(cache.get("Foo", Freshness::Verify).is_none());
        cache.insert(synthetic("Foo"));
        assert!(cache.get("Foo", Freshness::Verify).is_some());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.current_size, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lru_eviction_respects_recency() {
        let cache = ClassCache::with_capacity(3);
        cache.insert(synthetic("A"));
        cache.insert(synthetic("B"));
        cache.insert(synthetic("C"));

        // Touching A makes B the least recently used
        assert!(cache.get("A", Freshness::Verify).is_some());
        cache.insert(synthetic("D"));

        assert!(cache.contains("A"));
        assert!(!cache.contains("B"));
        assert!(cache.contains("C"));
        assert!(cache.contains("D"));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_reinsert_is_not_an_eviction() {
        let cache = ClassCache::with_capacity(2);
        cache.insert(synthetic("A"));
        cache.insert(synthetic("A"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_lookup_ignores_case() {
        let cache = ClassCache::with_capacity(2);
        cache.insert(synthetic("ArrayList"));
        assert!(cache.get("arraylist", Freshness::Verify).is_some());
        assert!(cache.contains("ARRAYLIST"));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_nested_models_are_refused() {
        let cache = ClassCache::with_capacity(2);
        cache.insert(synthetic("Outer$Inner"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_stale_entry_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Foo.java");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "public class Foo {{}}").unwrap();

        let fingerprint = file_fingerprint(&path).unwrap();
        let model = Arc::new(ClassModel::new("Foo", SourceOrigin::File(path.clone()), fingerprint));

        let cache = ClassCache::with_capacity(2);
        cache.insert(model);
        assert!(cache.get("Foo", Freshness::Verify).is_some());

        let later = SystemTime::now() + Duration::from_secs(120);
        File::options().write(true).open(&path).unwrap().set_modified(later).unwrap();

        // Nested lookups trust the entry
        assert!(cache.get("Foo", Freshness::Trusted).is_some());
        assert!(cache.get("Foo", Freshness::Verify).is_none());
        assert!(!cache.contains("Foo"));
        assert_eq!(cache.stats().stale, 1);
    }

    #[test]
    fn test_missing_backing_file_is_stale() {
        let model = Arc::new(ClassModel::new(
            "Gone",
            SourceOrigin::File("/definitely/not/here/Gone.java".into()),
            Fingerprint::Modified(SystemTime::UNIX_EPOCH),
        ));
        let cache = ClassCache::default();
        cache.insert(model);
        assert!(cache.get("Gone", Freshness::Verify).is_none());
    }
}
