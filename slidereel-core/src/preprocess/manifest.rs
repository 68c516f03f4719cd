//! On-disk record of preprocessing decisions for one target resolution.

use crate::error::CoreResult;
use crate::utils::sha256_hex;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Bumped whenever the manifest layout or composite look changes.
pub const MANIFEST_VERSION: u32 = 1;

/// How a source image is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrepMode {
    /// Source used as-is.
    Passthrough,
    /// Blurred-background composite generated for an undersized source.
    Composite,
}

/// Filesystem identity of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceIdentity {
    pub name: String,
    pub size: u64,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
}

impl SourceIdentity {
    /// Reads the identity of `path`. An unreadable source gets a zero
    /// size and mtime, so it is still tracked and retried when it changes.
    pub fn of(path: &Path) -> Self {
        let name = path.to_string_lossy().into_owned();
        match std::fs::metadata(path) {
            Ok(meta) => {
                let mtime = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                Self {
                    name,
                    size: meta.len(),
                    mtime,
                }
            }
            Err(e) => {
                log::warn!("Cannot stat source image {}: {}", path.display(), e);
                Self {
                    name,
                    size: 0,
                    mtime: 0,
                }
            }
        }
    }

    /// Composite file name for this source at `width`x`height`.
    pub fn composite_file_name(&self, width: u32, height: u32) -> String {
        let key = format!("{}|{}|{}", self.name, self.size, self.mtime);
        let digest = sha256_hex(key.as_bytes());
        format!("composite_{}_{width}x{height}.jpg", &digest[..16])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub source_name: String,
    pub source_size: u64,
    pub source_mtime: u64,
    pub mode: PrepMode,
    /// Composite file name inside the cache directory; `None` for passthrough.
    pub out_file: Option<String>,
}

impl ManifestEntry {
    pub fn matches(&self, identity: &SourceIdentity) -> bool {
        self.source_name == identity.name
            && self.source_size == identity.size
            && self.source_mtime == identity.mtime
    }

    /// Path the entry resolves to: the composite in `cache_dir` or the source.
    pub fn resolved_path(&self, cache_dir: &Path) -> PathBuf {
        match (&self.mode, &self.out_file) {
            (PrepMode::Composite, Some(file)) => cache_dir.join(file),
            _ => PathBuf::from(&self.source_name),
        }
    }

    /// True when the entry still describes `identity` and any composite it
    /// references exists and is non-empty.
    pub fn is_valid_for(&self, identity: &SourceIdentity, cache_dir: &Path) -> bool {
        if !self.matches(identity) {
            return false;
        }
        match self.mode {
            PrepMode::Passthrough => true,
            PrepMode::Composite => self
                .out_file
                .as_ref()
                .and_then(|file| std::fs::metadata(cache_dir.join(file)).ok())
                .is_some_and(|meta| meta.is_file() && meta.len() > 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub target_width: u32,
    pub target_height: u32,
    /// RFC 3339 timestamp of the pass that wrote the manifest.
    pub generated_at: String,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn new(target_width: u32, target_height: u32, entries: Vec<ManifestEntry>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            target_width,
            target_height,
            generated_at: chrono::Utc::now().to_rfc3339(),
            entries,
        }
    }

    /// Manifest file name for a namespace and resolution.
    pub fn file_name(namespace: &str, width: u32, height: u32) -> String {
        let namespace: String = namespace
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("manifest_{namespace}_{width}x{height}.json")
    }

    /// Reads a manifest. A missing or unparseable file yields `None`; a
    /// corrupted cache is regenerated, never reported as a failure.
    pub fn load(path: &Path) -> Option<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Cannot read manifest {}: {}", path.display(), e);
                }
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                log::warn!("Ignoring corrupted manifest {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes the manifest through a temporary file and a rename.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let mut temp = crate::temp_files::create_temp_file(dir, ".manifest", "json")?;
        serde_json::to_writer_pretty(temp.as_file_mut(), self)?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn entry_for(&self, source_name: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.source_name == source_name)
    }

    /// Whether the manifest covers every source in `required` for this
    /// resolution, with every entry still valid.
    pub fn is_valid_for(
        &self,
        required: &[SourceIdentity],
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> bool {
        if self.version != MANIFEST_VERSION
            || self.target_width != width
            || self.target_height != height
        {
            return false;
        }
        required.iter().all(|identity| {
            self.entry_for(&identity.name)
                .is_some_and(|entry| entry.is_valid_for(identity, cache_dir))
        })
    }

    /// Number of `required` sources with a valid entry.
    pub fn valid_entry_count(
        &self,
        required: &[SourceIdentity],
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> usize {
        if self.version != MANIFEST_VERSION
            || self.target_width != width
            || self.target_height != height
        {
            return 0;
        }
        required
            .iter()
            .filter(|identity| {
                self.entry_for(&identity.name)
                    .is_some_and(|entry| entry.is_valid_for(identity, cache_dir))
            })
            .count()
    }
}
