//! Snapshot codec
//!
//! Encoding and decoding functions for the on-disk snapshot.

use std::collections::BTreeSet;
use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{PrefError, Result};
use crate::value::Value;

use super::TypeTag;

/// Longest string (in UTF-8 bytes) a 2-byte length prefix can describe
pub const MAX_UTF_LEN: usize = u16::MAX as usize;

// =============================================================================
// Encoding
// =============================================================================

/// Encode a snapshot to bytes
///
/// Format: entry_count (4) + entries
pub fn encode_snapshot(entries: &[(String, Value)]) -> Result<Bytes> {
    let count = i32::try_from(entries.len()).map_err(|_| {
        PrefError::Encode(format!("Too many entries: {}", entries.len()))
    })?;

    let mut buf = BytesMut::with_capacity(4 + entries.len() * 16);
    buf.put_i32(count);

    for (key, value) in entries {
        put_utf(&mut buf, key, key)?;
        buf.put_u8(TypeTag::of(value) as u8);

        match value {
            Value::Bool(_) => {}
            Value::String(s) => put_utf(&mut buf, s, key)?,
            Value::Int(v) => buf.put_i32(*v),
            Value::Long(v) => buf.put_i64(*v),
            Value::Float(v) => buf.put_f32(*v),
            Value::StringSet(set) => {
                let size = i32::try_from(set.len()).map_err(|_| {
                    PrefError::Encode(format!("String set too large for key {:?}", key))
                })?;
                buf.put_i32(size);
                for item in set {
                    put_utf(&mut buf, item, key)?;
                }
            }
        }
    }

    Ok(buf.freeze())
}

/// Append a length-prefixed UTF-8 string belonging to entry `key`
fn put_utf(buf: &mut BytesMut, s: &str, key: &str) -> Result<()> {
    let len = s.len();
    if len > MAX_UTF_LEN {
        return Err(PrefError::Encode(format!(
            "String too long for key {:?}: {} bytes (max {})",
            key, len, MAX_UTF_LEN
        )));
    }
    buf.put_u16(len as u16);
    buf.put_slice(s.as_bytes());
    Ok(())
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode a snapshot from bytes
///
/// Fails on truncated input, negative counts, invalid UTF-8 and unknown
/// tags. Bytes after the last declared entry are ignored with a warning.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Vec<(String, Value)>> {
    let mut buf = bytes;

    let count = get_count(&mut buf, "entry count")?;

    // Cap the preallocation; a corrupt count must not allocate gigabytes
    let mut entries = Vec::with_capacity(count.min(buf.remaining() / 3));
    for _ in 0..count {
        let key = get_utf(&mut buf)?;
        let value = get_value(&mut buf)?;
        entries.push((key, value));
    }

    if buf.has_remaining() {
        tracing::warn!(
            "Ignoring {} trailing bytes after {} entries",
            buf.remaining(),
            count
        );
    }

    Ok(entries)
}

/// Decode one tagged payload
fn get_value(buf: &mut &[u8]) -> Result<Value> {
    need(buf, 1, "type tag")?;
    let tag = TypeTag::try_from(buf.get_u8())?;

    let value = match tag {
        TypeTag::False => Value::Bool(false),
        TypeTag::True => Value::Bool(true),
        TypeTag::String => Value::String(get_utf(buf)?),
        TypeTag::Int => {
            need(buf, 4, "int32")?;
            Value::Int(buf.get_i32())
        }
        TypeTag::Long => {
            need(buf, 8, "int64")?;
            Value::Long(buf.get_i64())
        }
        TypeTag::Float => {
            need(buf, 4, "float32")?;
            Value::Float(buf.get_f32())
        }
        TypeTag::StringSet => {
            let size = get_count(buf, "string set size")?;
            let mut set = BTreeSet::new();
            for _ in 0..size {
                set.insert(get_utf(buf)?);
            }
            Value::StringSet(set)
        }
    };

    Ok(value)
}

/// Read a non-negative int32 count
fn get_count(buf: &mut &[u8], what: &str) -> Result<usize> {
    need(buf, 4, what)?;
    let count = buf.get_i32();
    usize::try_from(count)
        .map_err(|_| PrefError::Decode(format!("Negative {}: {}", what, count)))
}

/// Read a length-prefixed UTF-8 string
fn get_utf(buf: &mut &[u8]) -> Result<String> {
    need(buf, 2, "string length")?;
    let len = buf.get_u16() as usize;
    need(buf, len, "string bytes")?;

    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| PrefError::Decode(format!("Invalid UTF-8 string: {}", e)))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

/// Ensure at least `n` bytes remain before a fixed-size read
fn need(buf: &&[u8], n: usize, what: &str) -> Result<()> {
    if buf.remaining() < n {
        return Err(PrefError::Decode(format!(
            "Truncated {}: expected {} bytes, got {}",
            what,
            n,
            buf.remaining()
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Write a complete snapshot to a stream
pub fn write_snapshot<W: Write>(writer: &mut W, entries: &[(String, Value)]) -> Result<()> {
    let bytes = encode_snapshot(entries)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete snapshot from a stream (reads to EOF)
pub fn read_snapshot<R: Read>(reader: &mut R) -> Result<Vec<(String, Value)>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_snapshot(&bytes)
}
