//! Single-writer lock per (cache directory, namespace, resolution).
//!
//! Two layers: an in-process registry of held keys (threads wait on a
//! condition variable) and a lock file created with `create_new` for
//! exclusion across processes. A held lock file has its mtime refreshed
//! periodically, so only a lock abandoned by a dead process ever looks
//! stale. Passes for different resolutions use different keys and never
//! wait on each other.

use crate::error::{CoreError, CoreResult};

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};

static HELD: Lazy<(Mutex<HashSet<String>>, Condvar)> =
    Lazy::new(|| (Mutex::new(HashSet::new()), Condvar::new()));

const FILE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Lock files older than this are assumed abandoned by a crashed process.
const STALE_LOCK_AGE: Duration = Duration::from_secs(15 * 60);

/// Upper bound on waiting for another process's lock file.
const FILE_WAIT_LIMIT: Duration = Duration::from_secs(20 * 60);

/// How often a held lock file is touched; well below `STALE_LOCK_AGE`.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Held lock; released on drop.
#[derive(Debug)]
pub struct ManifestLock {
    key: String,
    lock_file: PathBuf,
    file_held: bool,
    heartbeat: Option<(Sender<()>, JoinHandle<()>)>,
}

impl ManifestLock {
    /// Blocks until the lock for this cache slot is held.
    pub fn acquire(cache_dir: &Path, namespace: &str, width: u32, height: u32) -> CoreResult<Self> {
        Self::acquire_with_heartbeat(cache_dir, namespace, width, height, HEARTBEAT_INTERVAL)
    }

    fn acquire_with_heartbeat(
        cache_dir: &Path,
        namespace: &str,
        width: u32,
        height: u32,
        heartbeat: Duration,
    ) -> CoreResult<Self> {
        let key = format!("{}|{namespace}|{width}x{height}", cache_dir.display());
        let lock_file = cache_dir.join(format!(
            ".{}.lock",
            super::manifest::Manifest::file_name(namespace, width, height)
        ));

        {
            let (held, released) = &*HELD;
            let mut keys = held
                .lock()
                .map_err(|_| CoreError::Cache("manifest lock registry poisoned".to_string()))?;
            while keys.contains(&key) {
                keys = released
                    .wait(keys)
                    .map_err(|_| CoreError::Cache("manifest lock registry poisoned".to_string()))?;
            }
            keys.insert(key.clone());
        }

        let mut lock = Self {
            key,
            lock_file,
            file_held: false,
            heartbeat: None,
        };
        // On error `lock` drops and releases the in-process key.
        lock.acquire_file()?;
        lock.heartbeat = Some(spawn_heartbeat(lock.lock_file.clone(), heartbeat));
        Ok(lock)
    }

    fn acquire_file(&mut self) -> CoreResult<()> {
        let started = Instant::now();
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&self.lock_file)
            {
                Ok(_) => {
                    self.file_held = true;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if self.lock_file_is_stale() {
                        log::warn!("Removing stale manifest lock {}", self.lock_file.display());
                        let _ = std::fs::remove_file(&self.lock_file);
                        continue;
                    }
                    if started.elapsed() >= FILE_WAIT_LIMIT {
                        return Err(CoreError::Cache(format!(
                            "timed out waiting for manifest lock {}",
                            self.lock_file.display()
                        )));
                    }
                    std::thread::sleep(FILE_POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn lock_file_is_stale(&self) -> bool {
        std::fs::metadata(&self.lock_file)
            .and_then(|meta| meta.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .is_some_and(|age| age > STALE_LOCK_AGE)
    }
}

/// Touches `lock_file` every `interval` until the sender is dropped.
fn spawn_heartbeat(lock_file: PathBuf, interval: Duration) -> (Sender<()>, JoinHandle<()>) {
    let (stop, stopped) = mpsc::channel::<()>();
    let handle = std::thread::spawn(move || {
        while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
            let touched = OpenOptions::new()
                .write(true)
                .open(&lock_file)
                .and_then(|file| file.set_modified(SystemTime::now()));
            if let Err(e) = touched {
                log::debug!("Cannot refresh manifest lock {}: {}", lock_file.display(), e);
            }
        }
    });
    (stop, handle)
}

impl Drop for ManifestLock {
    fn drop(&mut self) {
        if let Some((stop, handle)) = self.heartbeat.take() {
            drop(stop);
            if handle.join().is_err() {
                log::warn!("Manifest lock heartbeat panicked");
            }
        }
        if self.file_held {
            if let Err(e) = std::fs::remove_file(&self.lock_file) {
                log::warn!(
                    "Failed to remove manifest lock {}: {}",
                    self.lock_file.display(),
                    e
                );
            }
        }
        let (held, released) = &*HELD;
        if let Ok(mut keys) = held.lock() {
            keys.remove(&self.key);
        }
        released.notify_all();
    }
}
