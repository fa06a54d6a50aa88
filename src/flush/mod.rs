//! Flush Module
//!
//! Coalesces bursts of flush requests into a bounded series of snapshot writes.
//!
//! ## Responsibilities
//! - Keep at most one snapshot write in progress
//! - Guarantee every merge that preceded a request reaches disk
//! - Let `commit()` callers wait for the write that carries their data
//!
//! ## Write Loop
//! ```text
//! loop {
//!     started = pending
//!     write snapshot
//!     if CAS(pending: started → 0) { done }
//!     // someone requested a flush during the write: write again
//! }
//! ```

mod coordinator;

pub use coordinator::FlushCoordinator;
