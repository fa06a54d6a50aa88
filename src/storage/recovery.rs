//! Snapshot Recovery
//!
//! Repairs the canonical/backup file pair after a crash and decodes the
//! surviving snapshot.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use crate::codec::read_snapshot;
use crate::error::Result;
use crate::value::Value;

use super::file_store::{remove_if_present, FileStore};

/// Result of a recovery pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryResult {
    /// A backup was found (an earlier write was interrupted)
    pub backup_found: bool,

    /// The backup was moved back over the canonical path
    pub restored_from_backup: bool,

    /// No snapshot existed at all (fresh store)
    pub file_missing: bool,

    /// Number of entries decoded
    pub entries_loaded: usize,
}

impl FileStore {
    /// Recover the snapshot on startup
    ///
    /// This will:
    /// 1. If a backup exists, discard the canonical file and restore the backup
    /// 2. Decode the canonical file (absent file = empty store)
    ///
    /// If step 1 fails, whichever of the two files still decodes is used.
    pub fn recover(&self) -> Result<(Vec<(String, Value)>, RecoveryResult)> {
        let mut result = RecoveryResult::default();

        if self.backup_path().exists() {
            result.backup_found = true;

            match self.restore_backup() {
                Ok(()) => {
                    result.restored_from_backup = true;
                    tracing::info!(
                        "Restored {} from interrupted write",
                        self.path().display()
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not restore backup {}: {}",
                        self.backup_path().display(),
                        e
                    );
                    return self.recover_without_restore(result);
                }
            }
        }

        match decode_file(self.path())? {
            Some(entries) => {
                result.entries_loaded = entries.len();
                Ok((entries, result))
            }
            None => {
                result.file_missing = true;
                Ok((Vec::new(), result))
            }
        }
    }

    /// Report what recovery would find, without modifying any file
    pub fn verify(&self) -> Result<RecoveryResult> {
        let mut result = RecoveryResult {
            backup_found: self.backup_path().exists(),
            ..RecoveryResult::default()
        };

        // The backup is authoritative whenever it exists
        let source = if result.backup_found {
            self.backup_path()
        } else {
            self.path()
        };

        match decode_file(source)? {
            Some(entries) => result.entries_loaded = entries.len(),
            None => result.file_missing = true,
        }

        Ok(result)
    }

    /// Read and decode the canonical file without any repair
    pub fn read_entries(&self) -> Result<Vec<(String, Value)>> {
        Ok(decode_file(self.path())?.unwrap_or_default())
    }

    fn restore_backup(&self) -> io::Result<()> {
        // Missing, truncated, or complete-but-uncleaned: the backup wins in all cases
        remove_if_present(self.path())?;
        fs::rename(self.backup_path(), self.path())
    }

    /// Fallback when the backup could not be moved into place
    fn recover_without_restore(
        &self,
        mut result: RecoveryResult,
    ) -> Result<(Vec<(String, Value)>, RecoveryResult)> {
        for candidate in [self.backup_path(), self.path()] {
            match decode_file(candidate) {
                Ok(Some(entries)) => {
                    result.entries_loaded = entries.len();
                    return Ok((entries, result));
                }
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", candidate.display(), e);
                }
            }
        }

        result.file_missing = true;
        Ok((Vec::new(), result))
    }
}

/// Decode a snapshot file; `None` if it does not exist
fn decode_file(path: &Path) -> Result<Option<Vec<(String, Value)>>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut reader = BufReader::new(file);
    Ok(Some(read_snapshot(&mut reader)?))
}
