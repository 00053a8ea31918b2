use crate::error::{ContentError, Result};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// LRU cache of text content keyed by URL or path
pub struct ContentCache {
    entries: Mutex<LruCache<String, Arc<str>>>,
    retain: bool,
}

impl ContentCache {
    /// Create a cache holding at most `capacity` entries
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries to keep (0 to disable caching)
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(size)),
            retain: capacity > 0,
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Arc<str>>> {
        // Entries are plain values; a panic elsewhere cannot leave them half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up `key`, marking it as recently used
    pub fn get(&self, key: &str) -> Option<Arc<str>> {
        self.entries().get(key).cloned()
    }

    /// Store `content` under `key`; returns the shared value
    pub fn insert(&self, key: impl Into<String>, content: impl Into<Arc<str>>) -> Arc<str> {
        let content = content.into();
        if self.retain {
            self.entries().put(key.into(), Arc::clone(&content));
        }
        content
    }

    /// Return the cached value for `key` or load and store it
    ///
    /// Loader errors are passed through and nothing is cached.
    pub fn get_or_try_insert_with<F, E>(&self, key: &str, loader: F) -> std::result::Result<Arc<str>, E>
    where
        F: FnOnce() -> std::result::Result<String, E>,
    {
        if let Some(hit) = self.get(key) {
            debug!("Content cache hit: {}", key);
            return Ok(hit);
        }

        debug!("Content cache miss: {}", key);
        let content = loader()?;
        Ok(self.insert(key, content))
    }

    /// Read a UTF-8 file through the cache, keyed by its path
    pub fn load_file(&self, path: &Path) -> Result<Arc<str>> {
        let key = path.to_string_lossy().into_owned();
        self.get_or_try_insert_with(&key, || {
            let bytes = std::fs::read(path).map_err(|source| ContentError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            String::from_utf8(bytes).map_err(|_| ContentError::Invalid(key.clone()))
        })
    }

    /// Drop `key` so the next access fetches it again
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries().pop(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(64)
    }
}
