//! MemTable Module
//!
//! The live, authoritative key-value table plus the in-flight overlay.
//!
//! ## Responsibilities
//! - Serve reads without taking the merge lock
//! - Apply a whole pending batch as one atomic step
//! - Produce consistent snapshots for the flush path
//!
//! ## Read Resolution
//! ```text
//! overlay present?
//!   ├── key in overlay as value      → value
//!   ├── key in overlay as delete     → absent
//!   ├── overlay clears the table     → absent
//!   └── otherwise                    → base table
//! overlay absent                     → base table
//! ```

mod batch;
mod table;

pub use batch::{Pending, PendingBatch, Resolution};
pub use table::MemTable;
