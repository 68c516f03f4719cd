//! Remote cache collaborator.
//!
//! A remote cache lets a fresh machine skip composite generation by restoring
//! a manifest and its composite files. Restore and publish are best-effort:
//! the preprocessor logs and ignores every remote failure.

use super::manifest::{Manifest, PrepMode};
use crate::error::{CoreError, CoreResult};

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A manifest plus the composite files it references, by file name.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub manifest: Manifest,
    pub files: BTreeMap<String, Vec<u8>>,
}

impl CacheEntry {
    /// Reads every composite referenced by `manifest` from `cache_dir`.
    pub fn collect(manifest: &Manifest, cache_dir: &Path) -> CoreResult<Self> {
        let mut files = BTreeMap::new();
        for entry in &manifest.entries {
            if let (PrepMode::Composite, Some(file)) = (entry.mode, &entry.out_file) {
                files.insert(file.clone(), std::fs::read(cache_dir.join(file))?);
            }
        }
        Ok(Self {
            manifest: manifest.clone(),
            files,
        })
    }

    /// Writes the composite files into `cache_dir`. The manifest itself is
    /// saved by the caller once the files are in place.
    pub fn write_files(&self, cache_dir: &Path) -> CoreResult<()> {
        for (name, bytes) in &self.files {
            if name.contains('/') || name.contains('\\') || name.starts_with('.') {
                return Err(CoreError::Cache(format!(
                    "refusing remote cache file name '{name}'"
                )));
            }
            let mut temp = crate::temp_files::create_temp_file(cache_dir, ".restore", "jpg")?;
            std::io::Write::write_all(temp.as_file_mut(), bytes)?;
            temp.persist(cache_dir.join(name)).map_err(|e| e.error)?;
        }
        Ok(())
    }
}

/// Remote store for cache entries, keyed by namespace and resolution.
pub trait RemoteCache: Send + Sync {
    fn restore(&self, key: &str) -> CoreResult<Option<CacheEntry>>;
    fn publish(&self, key: &str, entry: &CacheEntry) -> CoreResult<()>;
}

/// Remote cache key for a namespace and resolution.
pub fn remote_key(namespace: &str, width: u32, height: u32) -> String {
    format!("{namespace}/{width}x{height}")
}

/// Process-local `RemoteCache`.
#[derive(Debug, Default)]
pub struct InMemoryRemoteCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    restores: AtomicUsize,
    publishes: AtomicUsize,
}

impl InMemoryRemoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn restore_count(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    pub fn publish_count(&self) -> usize {
        self.publishes.load(Ordering::SeqCst)
    }
}

impl RemoteCache for InMemoryRemoteCache {
    fn restore(&self, key: &str) -> CoreResult<Option<CacheEntry>> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        let entries = self
            .entries
            .lock()
            .map_err(|_| CoreError::Cache("in-memory cache poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn publish(&self, key: &str, entry: &CacheEntry) -> CoreResult<()> {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CoreError::Cache("in-memory cache poisoned".to_string()))?;
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }
}
