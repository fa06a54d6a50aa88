//! File Store
//!
//! Atomic-swap snapshot writes over a canonical file and its backup.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::codec::encode_snapshot;
use crate::config::Config;
use crate::error::{PrefError, Result};
use crate::value::Value;

/// The canonical snapshot file plus its backup artifact
///
/// Holds no state besides the two paths. Callers serialize writes; the
/// flush coordinator guarantees a single writer at a time.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    backup: PathBuf,
}

impl FileStore {
    /// Create a store for the paths described by the config
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.path.clone(),
            backup: config.backup_path(),
        }
    }

    /// Create a store with an explicit backup path
    pub fn with_paths(path: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup: backup.into(),
        }
    }

    /// Write a full snapshot
    ///
    /// The snapshot is encoded before any file is touched, so an encoding
    /// failure leaves the disk as it was. Any I/O failure aborts the write;
    /// the next recovery pass repairs whatever state it left behind.
    pub fn write(&self, entries: &[(String, Value)]) -> Result<()> {
        if self.path == self.backup {
            return Err(PrefError::Storage(format!(
                "backup path collides with snapshot path {}",
                self.path.display()
            )));
        }
        if self.path.is_dir() {
            return Err(PrefError::Storage(format!(
                "snapshot path {} is a directory",
                self.path.display()
            )));
        }

        let bytes = encode_snapshot(entries)?;

        // Step 1: Drop a stale backup
        remove_if_present(&self.backup)?;

        // Step 2: Move the last good snapshot aside (commit point).
        // Before the first successful write there is nothing to preserve.
        let backed_up = if self.path.exists() {
            fs::rename(&self.path, &self.backup)?;
            true
        } else {
            tracing::debug!("No snapshot at {} yet, skipping backup", self.path.display());
            false
        };

        // Step 3: Fresh canonical file
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;

        // Step 4: Write and sync the whole snapshot
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        sync_parent_dir(&self.path);

        // Step 5: The backup is no longer needed. The unlink must reach the
        // disk before we report success, or recovery would roll back to it.
        if backed_up {
            fs::remove_file(&self.backup)?;
            mark_step("unlink_backup");
            sync_parent_dir(&self.path);
        }

        tracing::debug!(
            "Wrote {} entries ({} bytes) to {}",
            entries.len(),
            bytes.len(),
            self.path.display()
        );

        Ok(())
    }

    /// Get the canonical file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the backup artifact path
    pub fn backup_path(&self) -> &Path {
        &self.backup
    }
}

/// Delete a file, treating "already gone" as success
///
/// Fails only if the delete failed and the file is still there.
pub(super) fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) if path.exists() => Err(e),
        Err(_) => Ok(()),
    }
}

/// Make the renames durable across power loss (best effort)
fn sync_parent_dir(path: &Path) {
    #[cfg(unix)]
    {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if let Err(e) = File::open(parent).and_then(|dir| dir.sync_all()) {
            tracing::debug!("Directory sync of {} failed: {}", parent.display(), e);
        }
    }
    mark_step("dir_sync");
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

#[cfg(test)]
thread_local! {
    static STEPS: std::cell::RefCell<Vec<&'static str>> = std::cell::RefCell::new(Vec::new());
}

/// Record a durability step (test builds only)
fn mark_step(step: &'static str) {
    #[cfg(test)]
    STEPS.with(|steps| steps.borrow_mut().push(step));
    #[cfg(not(test))]
    let _ = step;
}
