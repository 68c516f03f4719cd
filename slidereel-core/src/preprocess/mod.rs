// ============================================================================
// slidereel-core/src/preprocess/mod.rs
// ============================================================================
//
// IMAGE PREPROCESSOR: Normalizes a source pool for one target resolution
//
// Sources that already cover the target are used as-is (passthrough). Smaller
// sources get a blurred-background composite rendered once per (source
// identity, resolution) and cached next to a manifest. A valid manifest turns
// a repeat call into a pure lookup with zero image operations.
//
// Pass outline:
// 1. Take the manifest lock for (cache dir, namespace, resolution)
// 2. Return immediately when the manifest covers every source
// 3. Try a remote cache restore
// 4. Optionally serve a partially valid cache and finish in the background
// 5. Otherwise probe/composite what changed, reusing valid entries
// 6. Save the manifest and publish it to the remote cache in the background
//
// AI-ASSISTANT-INFO: Preprocessor, manifest cache and composite generation

pub mod composite;
pub mod lock;
pub mod manifest;
pub mod ops;
pub mod remote;

pub use manifest::{Manifest, ManifestEntry, PrepMode, SourceIdentity};
pub use ops::{FfmpegImageOps, ImageOps};
pub use remote::{CacheEntry, InMemoryRemoteCache, RemoteCache, remote_key};

use crate::config::{CompositeStyle, PreprocessConfig};
use crate::error::{CoreError, CoreResult};
use crate::temp_files::create_temp_file_path;
use lock::ManifestLock;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;

/// One source image as it should be fed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedImage {
    pub source: PathBuf,
    /// The composite in the cache directory, or the source itself.
    pub path: PathBuf,
    pub mode: PrepMode,
}

/// Counters for one `prepare` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrepareStats {
    pub probed: usize,
    pub composites_generated: usize,
    pub reused: usize,
    pub passthrough: usize,
    /// Composite renders that failed and fell back to passthrough.
    pub failed: usize,
    pub cache_hit: bool,
    pub remote_restored: bool,
    pub partial: bool,
}

impl PrepareStats {
    /// Probes plus composite renders, successful or not.
    pub fn image_operations(&self) -> usize {
        self.probed + self.composites_generated + self.failed
    }
}

/// Result of `Preprocessor::prepare`.
#[derive(Debug)]
pub struct PreparedPool {
    pub images: Vec<PreparedImage>,
    pub stats: PrepareStats,
    completion: Option<JoinHandle<CoreResult<PrepareStats>>>,
    publish: Option<JoinHandle<()>>,
}

impl PreparedPool {
    fn ready(images: Vec<PreparedImage>, stats: PrepareStats) -> Self {
        Self {
            images,
            stats,
            completion: None,
            publish: None,
        }
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|image| image.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Whether a background pass is still attached to this pool.
    pub fn has_pending_completion(&self) -> bool {
        self.completion.is_some()
    }

    /// Joins the background full pass started by the partial-cache fast path.
    /// Returns `None` when no background pass was started.
    pub fn wait_for_completion(&mut self) -> Option<CoreResult<PrepareStats>> {
        let handle = self.completion.take()?;
        Some(handle.join().unwrap_or_else(|_| {
            Err(CoreError::OperationFailed(
                "background preprocessing pass panicked".to_string(),
            ))
        }))
    }

    /// Joins the background remote publish, if one was started.
    pub fn wait_for_publish(&mut self) {
        if let Some(handle) = self.publish.take() {
            if handle.join().is_err() {
                warn!("Remote cache publish thread panicked");
            }
        }
    }
}

/// Outcome of processing one source that had no reusable entry.
enum Processed {
    Passthrough(ManifestEntry),
    Composite(ManifestEntry),
    /// Probe or composite failure. Recorded as passthrough against the
    /// source identity, so it is retried only once the source changes.
    Failed {
        entry: ManifestEntry,
        composite_attempted: bool,
    },
}

/// Prepares image pools against a cache directory.
pub struct Preprocessor<O: ImageOps + 'static> {
    ops: Arc<O>,
    style: CompositeStyle,
    settings: PreprocessConfig,
    remote: Option<Arc<dyn RemoteCache>>,
}

impl<O: ImageOps + 'static> Clone for Preprocessor<O> {
    fn clone(&self) -> Self {
        Self {
            ops: Arc::clone(&self.ops),
            style: self.style.clone(),
            settings: self.settings.clone(),
            remote: self.remote.clone(),
        }
    }
}

impl<O: ImageOps + 'static> Preprocessor<O> {
    pub fn new(ops: O, style: CompositeStyle, settings: PreprocessConfig) -> Self {
        Self {
            ops: Arc::new(ops),
            style,
            settings,
            remote: None,
        }
    }

    #[must_use]
    pub fn with_remote_cache(mut self, remote: Arc<dyn RemoteCache>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn ops(&self) -> &O {
        &self.ops
    }

    /// Prepares `images` for `width`x`height`, returning one entry per input in
    /// input order.
    pub fn prepare(
        &self,
        images: &[PathBuf],
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> CoreResult<PreparedPool> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidInput(format!(
                "target resolution must be non-zero, got {width}x{height}"
            )));
        }
        std::fs::create_dir_all(cache_dir)?;

        let namespace = self.settings.cache_namespace.as_str();
        let manifest_path = cache_dir.join(Manifest::file_name(namespace, width, height));
        let identities: Vec<SourceIdentity> =
            images.iter().map(|path| SourceIdentity::of(path)).collect();

        let lock = ManifestLock::acquire(cache_dir, namespace, width, height)?;
        let existing = Manifest::load(&manifest_path);

        if let Some(manifest) = &existing {
            if manifest.is_valid_for(&identities, width, height, cache_dir) {
                debug!(
                    "Manifest {} covers all {} images",
                    manifest_path.display(),
                    images.len()
                );
                let stats = PrepareStats {
                    cache_hit: true,
                    reused: images.len(),
                    ..PrepareStats::default()
                };
                return Ok(PreparedPool::ready(
                    resolve_from_manifest(manifest, images, cache_dir),
                    stats,
                ));
            }
        }

        if let Some(manifest) = self.restore_remote(&identities, width, height, cache_dir, &manifest_path) {
            info!("Restored preprocessing cache for {width}x{height} from remote");
            let stats = PrepareStats {
                cache_hit: true,
                remote_restored: true,
                reused: images.len(),
                ..PrepareStats::default()
            };
            return Ok(PreparedPool::ready(
                resolve_from_manifest(&manifest, images, cache_dir),
                stats,
            ));
        }

        if let (Some(minimum), Some(manifest)) =
            (self.settings.partial_cache_min_entries, &existing)
        {
            let valid = manifest.valid_entry_count(&identities, width, height, cache_dir);
            if valid > 0 && valid >= minimum {
                let pool = self.serve_partial(manifest, images, &identities, width, height, cache_dir, valid);
                drop(lock);
                return Ok(self.spawn_completion(pool, images, width, height, cache_dir));
            }
        }

        let (prepared, stats, manifest) =
            self.run_pass(images, &identities, width, height, cache_dir, existing.as_ref())?;
        manifest.save(&manifest_path)?;
        prune_replaced_composites(existing.as_ref(), &manifest, cache_dir);
        drop(lock);

        info!(
            "Prepared {} images for {}x{}: {} reused, {} composites, {} passthrough, {} failed",
            prepared.len(),
            width,
            height,
            stats.reused,
            stats.composites_generated,
            stats.passthrough,
            stats.failed
        );

        let mut pool = PreparedPool::ready(prepared, stats);
        pool.publish = self.spawn_publish(manifest, width, height, cache_dir);
        Ok(pool)
    }

    /// Valid cached entries plus raw originals for everything else.
    #[allow(clippy::too_many_arguments)]
    fn serve_partial(
        &self,
        manifest: &Manifest,
        images: &[PathBuf],
        identities: &[SourceIdentity],
        width: u32,
        height: u32,
        cache_dir: &Path,
        valid: usize,
    ) -> PreparedPool {
        info!(
            "Using {valid}/{} cached entries for {width}x{height}; completing the cache in the background",
            images.len()
        );
        let prepared = images
            .iter()
            .zip(identities)
            .map(|(source, identity)| {
                match manifest
                    .entry_for(&identity.name)
                    .filter(|entry| entry.is_valid_for(identity, cache_dir))
                {
                    Some(entry) => PreparedImage {
                        source: source.clone(),
                        path: entry.resolved_path(cache_dir),
                        mode: entry.mode,
                    },
                    None => passthrough_image(source),
                }
            })
            .collect();
        let stats = PrepareStats {
            partial: true,
            reused: valid,
            passthrough: images.len() - valid,
            ..PrepareStats::default()
        };
        PreparedPool::ready(prepared, stats)
    }

    fn spawn_completion(
        &self,
        mut pool: PreparedPool,
        images: &[PathBuf],
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> PreparedPool {
        let this = self.clone();
        let images = images.to_vec();
        let cache_dir = cache_dir.to_path_buf();
        pool.completion = Some(std::thread::spawn(move || {
            this.complete_in_background(&images, width, height, &cache_dir)
        }));
        pool
    }

    fn complete_in_background(
        &self,
        images: &[PathBuf],
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> CoreResult<PrepareStats> {
        let namespace = self.settings.cache_namespace.as_str();
        let manifest_path = cache_dir.join(Manifest::file_name(namespace, width, height));
        let identities: Vec<SourceIdentity> =
            images.iter().map(|path| SourceIdentity::of(path)).collect();

        let _lock = ManifestLock::acquire(cache_dir, namespace, width, height)?;
        let existing = Manifest::load(&manifest_path);
        let (_, stats, manifest) =
            self.run_pass(images, &identities, width, height, cache_dir, existing.as_ref())?;
        manifest.save(&manifest_path)?;
        prune_replaced_composites(existing.as_ref(), &manifest, cache_dir);
        debug!(
            "Background preprocessing for {width}x{height} finished: {} composites",
            stats.composites_generated
        );
        if let Some(remote) = &self.remote {
            publish_entry(remote.as_ref(), namespace, &manifest, width, height, cache_dir);
        }
        Ok(stats)
    }

    /// Full pass: reuse still-valid entries, process the rest.
    fn run_pass(
        &self,
        images: &[PathBuf],
        identities: &[SourceIdentity],
        width: u32,
        height: u32,
        cache_dir: &Path,
        previous: Option<&Manifest>,
    ) -> CoreResult<(Vec<PreparedImage>, PrepareStats, Manifest)> {
        let reusable: Vec<Option<ManifestEntry>> = identities
            .iter()
            .map(|identity| {
                previous
                    .filter(|m| {
                        m.version == manifest::MANIFEST_VERSION
                            && m.target_width == width
                            && m.target_height == height
                    })
                    .and_then(|m| m.entry_for(&identity.name))
                    .filter(|entry| entry.is_valid_for(identity, cache_dir))
                    .cloned()
            })
            .collect();

        let pending: Vec<usize> = (0..images.len())
            .filter(|&i| reusable[i].is_none())
            .collect();
        debug!(
            "{} of {} images need preprocessing for {width}x{height}",
            pending.len(),
            images.len()
        );

        let process =
            |&i: &usize| (i, self.process_one(&images[i], &identities[i], width, height, cache_dir));
        let processed: Vec<(usize, Processed)> = if self.settings.parallel {
            pending.par_iter().map(process).collect()
        } else {
            pending.iter().map(process).collect()
        };

        let mut stats = PrepareStats {
            reused: images.len() - pending.len(),
            ..PrepareStats::default()
        };
        let mut entries: Vec<Option<ManifestEntry>> = reusable;
        for (i, outcome) in processed {
            match outcome {
                Processed::Passthrough(entry) => {
                    stats.probed += 1;
                    stats.passthrough += 1;
                    entries[i] = Some(entry);
                }
                Processed::Composite(entry) => {
                    stats.probed += 1;
                    stats.composites_generated += 1;
                    entries[i] = Some(entry);
                }
                Processed::Failed {
                    entry,
                    composite_attempted,
                } => {
                    stats.probed += 1;
                    if composite_attempted {
                        stats.failed += 1;
                    }
                    stats.passthrough += 1;
                    entries[i] = Some(entry);
                }
            }
        }

        let prepared = images
            .iter()
            .zip(&entries)
            .map(|(source, entry)| match entry {
                Some(entry) => PreparedImage {
                    source: source.clone(),
                    path: entry.resolved_path(cache_dir),
                    mode: entry.mode,
                },
                None => passthrough_image(source),
            })
            .collect();

        let mut recorded: Vec<ManifestEntry> = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().flatten() {
            if !recorded.iter().any(|e| e.source_name == entry.source_name) {
                recorded.push(entry);
            }
        }
        Ok((prepared, stats, Manifest::new(width, height, recorded)))
    }

    fn process_one(
        &self,
        source: &Path,
        identity: &SourceIdentity,
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> Processed {
        let passthrough_entry = || ManifestEntry {
            source_name: identity.name.clone(),
            source_size: identity.size,
            source_mtime: identity.mtime,
            mode: PrepMode::Passthrough,
            out_file: None,
        };

        let (src_width, src_height) = match self.ops.probe_dimensions(source) {
            Ok(dimensions) => dimensions,
            Err(e) => {
                warn!(
                    "Cannot probe {}, using it as-is: {}",
                    source.display(),
                    e
                );
                return Processed::Failed {
                    entry: passthrough_entry(),
                    composite_attempted: false,
                };
            }
        };

        if src_width >= width && src_height >= height {
            debug!(
                "{} ({}x{}) covers {}x{}",
                source.display(),
                src_width,
                src_height,
                width,
                height
            );
            return Processed::Passthrough(passthrough_entry());
        }

        let file_name = identity.composite_file_name(width, height);
        match self.render_composite(source, &cache_dir.join(&file_name), width, height, cache_dir) {
            Ok(()) => {
                debug!(
                    "Composite for {} ({}x{}) written to {}",
                    source.display(),
                    src_width,
                    src_height,
                    file_name
                );
                Processed::Composite(ManifestEntry {
                    mode: PrepMode::Composite,
                    out_file: Some(file_name),
                    ..passthrough_entry()
                })
            }
            Err(e) => {
                warn!(
                    "Composite for {} failed, using it as-is: {}",
                    source.display(),
                    e
                );
                Processed::Failed {
                    entry: passthrough_entry(),
                    composite_attempted: true,
                }
            }
        }
    }

    /// Renders into a temporary file in the cache dir and renames it into
    /// place once it is known to be non-empty.
    fn render_composite(
        &self,
        source: &Path,
        target: &Path,
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> CoreResult<()> {
        let temp = create_temp_file_path(cache_dir, "composite", "jpg");
        let result = self
            .ops
            .render_composite(source, &temp, width, height, &self.style)
            .and_then(|()| {
                let size = std::fs::metadata(&temp).map(|m| m.len()).unwrap_or(0);
                if size == 0 {
                    return Err(CoreError::Cache(format!(
                        "composite for {} is empty",
                        source.display()
                    )));
                }
                std::fs::rename(&temp, target)?;
                Ok(())
            });
        if result.is_err() {
            let _ = std::fs::remove_file(&temp);
        }
        result
    }

    fn restore_remote(
        &self,
        identities: &[SourceIdentity],
        width: u32,
        height: u32,
        cache_dir: &Path,
        manifest_path: &Path,
    ) -> Option<Manifest> {
        let remote = self.remote.as_ref()?;
        let key = remote_key(&self.settings.cache_namespace, width, height);
        let entry = match remote.restore(&key) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                debug!("No remote cache entry for {key}");
                return None;
            }
            Err(e) => {
                warn!("Remote cache restore for {key} failed: {e}");
                return None;
            }
        };

        if !entry.manifest.is_valid_for(identities, width, height, cache_dir) {
            if let Err(e) = entry.write_files(cache_dir) {
                warn!("Cannot write remote cache files for {key}: {e}");
                return None;
            }
        }
        if !entry.manifest.is_valid_for(identities, width, height, cache_dir) {
            debug!("Remote cache entry for {key} does not cover the current pool");
            return None;
        }
        if let Err(e) = entry.manifest.save(manifest_path) {
            warn!("Cannot save restored manifest for {key}: {e}");
        }
        Some(entry.manifest)
    }

    fn spawn_publish(
        &self,
        manifest: Manifest,
        width: u32,
        height: u32,
        cache_dir: &Path,
    ) -> Option<JoinHandle<()>> {
        let remote = Arc::clone(self.remote.as_ref()?);
        let namespace = self.settings.cache_namespace.clone();
        let cache_dir = cache_dir.to_path_buf();
        Some(std::thread::spawn(move || {
            publish_entry(remote.as_ref(), &namespace, &manifest, width, height, &cache_dir);
        }))
    }
}

/// Collects and publishes a cache entry; failures are logged only.
fn publish_entry(
    remote: &dyn RemoteCache,
    namespace: &str,
    manifest: &Manifest,
    width: u32,
    height: u32,
    cache_dir: &Path,
) {
    let key = remote_key(namespace, width, height);
    let result =
        CacheEntry::collect(manifest, cache_dir).and_then(|entry| remote.publish(&key, &entry));
    match result {
        Ok(()) => debug!("Published preprocessing cache {key}"),
        Err(e) => warn!("Remote cache publish for {key} failed: {e}"),
    }
}

/// Deletes composites the previous manifest referenced and `current` no
/// longer does, such as the output for a source that has since changed.
fn prune_replaced_composites(previous: Option<&Manifest>, current: &Manifest, cache_dir: &Path) {
    let Some(previous) = previous else {
        return;
    };
    let still_used = |file: &str| {
        current
            .entries
            .iter()
            .any(|entry| entry.out_file.as_deref() == Some(file))
    };
    for file in previous.entries.iter().filter_map(|entry| entry.out_file.as_deref()) {
        if file.contains('/') || file.contains('\\') || file.starts_with('.') || still_used(file) {
            continue;
        }
        match std::fs::remove_file(cache_dir.join(file)) {
            Ok(()) => debug!("Removed replaced composite {file}"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Cannot remove replaced composite {file}: {e}"),
        }
    }
}

fn passthrough_image(source: &Path) -> PreparedImage {
    PreparedImage {
        source: source.to_path_buf(),
        path: source.to_path_buf(),
        mode: PrepMode::Passthrough,
    }
}

fn resolve_from_manifest(
    manifest: &Manifest,
    images: &[PathBuf],
    cache_dir: &Path,
) -> Vec<PreparedImage> {
    images
        .iter()
        .map(|source| {
            let name = source.to_string_lossy();
            match manifest.entry_for(&name) {
                Some(entry) => PreparedImage {
                    source: source.clone(),
                    path: entry.resolved_path(cache_dir),
                    mode: entry.mode,
                },
                None => passthrough_image(source),
            }
        })
        .collect()
}
