//! # PrefStore
//!
//! An embedded, crash-consistent preferences store with:
//! - A typed settings map (bool, string, i32, i64, f32, string set)
//! - Transactional editors with `commit` (durable) and `apply` (fire-and-forget)
//! - Write coalescing: a burst of commits collapses into few disk writes
//! - Atomic-swap snapshot files with backup-based crash recovery
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Preferences (engine)                       │
//! │         reads ──► load gate ──► MemTable + overlay          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Editor::commit / Editor::apply
//!                       ▼
//!               ┌───────────────┐
//!               │   MemTable    │  merge (exclusive, overlay published)
//!               └───────┬───────┘
//!                       │
//!                       ▼
//!             ┌───────────────────┐
//!             │ FlushCoordinator  │  pending counter + CAS loop
//!             └─────────┬─────────┘
//!                       │ one owner at a time
//!                       ▼
//!             ┌───────────────────┐
//!             │     FileStore     │  backup ─► rewrite ─► drop backup
//!             │     (codec)       │
//!             └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use prefstore::Preferences;
//!
//! # fn main() -> prefstore::Result<()> {
//! let prefs = Preferences::open_path("settings.prefs")?;
//!
//! let mut editor = prefs.edit();
//! editor.put_int("launch_count", 3).put_boolean("onboarded", true);
//! assert!(editor.commit());
//!
//! assert_eq!(prefs.get_int("launch_count", 0), 3);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod value;

pub mod codec;
pub mod storage;
pub mod memtable;
pub mod flush;
pub mod worker;
pub mod listener;
pub mod editor;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PrefError, Result};
pub use config::{Config, LoadMode};
pub use value::{Value, ValueKind};
pub use editor::Editor;
pub use engine::Preferences;
pub use listener::{ChangeListener, ListenerToken};
pub use worker::{Executor, InlineExecutor, WorkerPool};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of PrefStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
