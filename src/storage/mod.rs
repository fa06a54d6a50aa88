//! Storage Module
//!
//! Durable snapshot file with an atomic-swap write and backup recovery.
//!
//! ## Responsibilities
//! - Persist a full snapshot so that a crash at any step loses nothing committed
//! - Repair the file pair on startup and decode the surviving snapshot
//!
//! ## Write Protocol
//! ```text
//!  1. delete {name}.bak            (if present)
//!  2. rename {name} → {name}.bak   (commit point)
//!  3. create empty {name}
//!  4. write + fsync snapshot into {name}, fsync the directory
//!  5. delete {name}.bak, fsync the directory again
//! ```
//!
//! The write reports success only after the step 5 unlink is durable; a
//! backup that survives a power loss would otherwise win over the new
//! snapshot at the next recovery.
//!
//! ## Recovery
//! A backup on disk means a write was interrupted after step 2: whatever is
//! at the canonical path is discarded and the backup is renamed back.

mod file_store;
mod recovery;

pub use file_store::FileStore;
pub use recovery::RecoveryResult;
