use std::{
    collections::VecDeque,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs,
    sync::{Mutex, RwLock},
};

/// Entries retained per stream; the oldest are evicted first.
pub const MAX_ENTRIES: usize = 100;

/// Bounded append-only history for one telemetry stream.
///
/// Both backends expose the same contract: `list` returns the full history
/// in insertion order, `append` pushes at the tail and evicts from the head
/// once the cap is exceeded. Only durability differs — the volatile backend
/// lives in process memory, the file backend reloads its JSON file on every
/// read and overwrites it whole on every write.
pub struct ReadingLog<T> {
    cap: usize,
    backend: Backend<T>,
}

enum Backend<T> {
    Volatile(RwLock<VecDeque<T>>),
    /// The mutex serializes the load-append-store cycle; without it two
    /// concurrent appends would each read the same pre-update array and the
    /// last full-file overwrite would drop the other's entry.
    File {
        path: PathBuf,
        write_guard: Mutex<()>,
    },
}

impl<T> ReadingLog<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn in_memory() -> Self {
        Self::volatile_with_cap(MAX_ENTRIES)
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::file_with_cap(path, MAX_ENTRIES)
    }

    fn volatile_with_cap(cap: usize) -> Self {
        Self {
            cap,
            backend: Backend::Volatile(RwLock::new(VecDeque::new())),
        }
    }

    fn file_with_cap(path: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            cap,
            backend: Backend::File {
                path: path.into(),
                write_guard: Mutex::new(()),
            },
        }
    }

    /// Full history, oldest first.
    pub async fn list(&self) -> Result<Vec<T>> {
        match &self.backend {
            Backend::Volatile(entries) => Ok(entries.read().await.iter().cloned().collect()),
            Backend::File { path, .. } => load_entries(path).await,
        }
    }

    /// Append one reading, evicting from the head past the cap.
    pub async fn append(&self, reading: T) -> Result<()> {
        match &self.backend {
            Backend::Volatile(entries) => {
                let mut entries = entries.write().await;
                entries.push_back(reading);
                while entries.len() > self.cap {
                    entries.pop_front();
                }
                Ok(())
            }
            Backend::File { path, write_guard } => {
                let _guard = write_guard.lock().await;
                let mut entries = load_entries(path).await?;
                entries.push(reading);
                if entries.len() > self.cap {
                    entries.drain(..entries.len() - self.cap);
                }
                store_entries(path, &entries).await
            }
        }
    }
}

/// Read one stream's history file.
///
/// A missing file and malformed content both read as an empty log; only a
/// real I/O failure propagates. The decode result is matched here so the
/// empty-log fallback is a visible policy, not a swallowed error.
async fn load_entries<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("read history file {}", path.display()));
        }
    };
    match serde_json::from_slice::<Vec<T>>(&raw) {
        Ok(entries) => Ok(entries),
        Err(e) => {
            tracing::warn!(
                file = %path.display(),
                error = %e,
                "malformed history file; treating as empty"
            );
            Ok(Vec::new())
        }
    }
}

/// Overwrite one stream's history file with the full array.
///
/// Writes a sibling temp file and renames it over the target, so a crash
/// mid-write leaves the previous complete array in place rather than a
/// truncated one.
async fn store_entries<T: Serialize>(path: &Path, entries: &[T]) -> Result<()> {
    let json = serde_json::to_vec_pretty(entries).context("encode history")?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)
        .await
        .with_context(|| format!("write history file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replace history file {}", path.display()))?;
    Ok(())
}

/// Create a stream's history file with an empty array if it does not exist
/// yet, creating parent directories as needed. Runs once at startup; a
/// failure here is fatal before the listener binds.
pub async fn ensure_history_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("create data directory {}", parent.display()))?;
    }
    match fs::metadata(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => fs::write(path, b"[]")
            .await
            .with_context(|| format!("create history file {}", path.display())),
        Err(e) => Err(e).with_context(|| format!("stat history file {}", path.display())),
    }
}
