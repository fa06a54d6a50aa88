//! Codec Module
//!
//! Binary encoding of a full preferences snapshot.
//!
//! ## File Format (big-endian)
//! ```text
//! ┌──────────────────┬─────────────────────────────────────────┐
//! │ EntryCount (4)   │ Entry * EntryCount                      │
//! └──────────────────┴─────────────────────────────────────────┘
//!
//! Entry:
//! ┌──────────────┬──────────┬─────────────────────────────────┐
//! │ Key (UTF)    │ Tag (1)  │ Payload (depends on tag)        │
//! └──────────────┴──────────┴─────────────────────────────────┘
//!
//! UTF: Len (2, unsigned) + UTF-8 bytes
//! ```
//!
//! ### Type Tags
//! - 0x00: false          - Payload: none
//! - 0x01: true           - Payload: none
//! - 0x02: string         - Payload: UTF
//! - 0x03: int32          - Payload: 4 bytes
//! - 0x04: int64          - Payload: 8 bytes
//! - 0x05: float32        - Payload: 4 bytes (IEEE 754)
//! - 0x06: string set     - Payload: Size (4) + UTF * Size
//!
//! Any unknown tag fails the decode of the whole file.

mod tag;
mod snapshot;

pub use tag::TypeTag;
pub use snapshot::{
    decode_snapshot, encode_snapshot, read_snapshot, write_snapshot, MAX_UTF_LEN,
};
