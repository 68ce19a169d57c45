//! Container format encoder and decoder.
//!
//! The container is a flat, length-prefixed buffer. All integers are
//! little-endian and unsigned:
//!
//! ```text
//! magic "RUNPACK" (7) | total length (4) | entry count (4) | records...
//!
//! record: path length (2) | content length (4) | flag (1) | path | content
//! ```
//!
//! The total length field must equal the exact buffer length, so a buffer is
//! only ever valid as a whole. Decoding is strict and stops at the first
//! inconsistency; no partial result is returned.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;
use tracing::debug;

use crate::error::{PackError, Result};

use super::structures::*;

/// Encode entries into a container buffer.
///
/// Entries are written in iteration order.
///
/// # Errors
///
/// * [`PackError::PathTooLong`] if a path exceeds 65535 UTF-8 bytes
/// * [`PackError::ContentTooLarge`] if the combined content exceeds 2^32-1 bytes
/// * [`PackError::CorruptedData`] if the resulting buffer cannot be described
///   by the 32-bit total length field
pub fn serialize(entries: &EntryMap) -> Result<Vec<u8>> {
    // Validate and size everything before writing a single byte
    let mut content_total = 0u64;
    let mut buffer_len = HEADER_SIZE as u64;

    for entry in entries {
        let path_len = entry.path.len();
        if path_len > MAX_PATH_LEN {
            return Err(PackError::PathTooLong(path_len));
        }
        content_total = add_content_len(content_total, entry.content.len())?;
        buffer_len += (ENTRY_PREFIX_SIZE + path_len) as u64 + entry.content.len() as u64;
    }

    let total_length = encode_u32(buffer_len)?;
    let entry_count = encode_u32(entries.len() as u64)?;

    let mut buf = Vec::with_capacity(buffer_len as usize);
    buf.extend_from_slice(MAGIC);
    buf.write_u32::<LittleEndian>(total_length)?;
    buf.write_u32::<LittleEndian>(entry_count)?;

    for entry in entries {
        let content = entry.content.as_bytes();
        buf.write_u16::<LittleEndian>(entry.path.len() as u16)?;
        buf.write_u32::<LittleEndian>(encode_u32(content.len() as u64)?)?;
        buf.write_u8(if entry.is_binary() { FLAG_BINARY } else { FLAG_TEXT })?;
        buf.extend_from_slice(entry.path.as_bytes());
        buf.extend_from_slice(content);
    }

    debug_assert_eq!(buf.len() as u64, buffer_len);
    debug!(entries = entries.len(), bytes = buf.len(), "serialized container");

    Ok(buf)
}

/// Decode a container buffer back into entries.
///
/// # Errors
///
/// * [`PackError::InvalidHeader`] if the magic bytes are missing or wrong
/// * [`PackError::UnexpectedEnd`] if a length, count or record prefix is cut off
/// * [`PackError::CorruptedData`] if the total length disagrees with the buffer,
///   a flag is unknown, text is not UTF-8, or bytes trail the last record
/// * [`PackError::EntryExceedsBounds`] if a record's path and content overrun
///   the buffer
pub fn deserialize(data: &[u8]) -> Result<EntryMap> {
    if data.len() < MAGIC.len() || &data[..MAGIC.len()] != MAGIC {
        return Err(PackError::InvalidHeader);
    }

    let mut cursor = Cursor::new(data);
    cursor.set_position(MAGIC.len() as u64);

    let total_length = cursor.read_u32::<LittleEndian>()?;
    if total_length as u64 != data.len() as u64 {
        return Err(PackError::corrupted(format!(
            "declared length {} does not match buffer length {}",
            total_length,
            data.len()
        )));
    }

    let entry_count = cursor.read_u32::<LittleEndian>()?;

    // Every record needs at least its prefix, so a huge count cannot
    // make us over-allocate
    let capacity = (entry_count as u64).min(remaining(&cursor) / ENTRY_PREFIX_SIZE as u64);
    let mut entries = EntryMap::with_capacity(capacity as usize);

    for index in 0..entry_count {
        let entry = read_entry(&mut cursor)?;
        if entries.insert(entry.path.clone(), entry.content).is_some() {
            debug!(index, path = %entry.path, "duplicate path, later record wins");
        }
    }

    if remaining(&cursor) != 0 {
        return Err(PackError::corrupted(format!(
            "{} trailing bytes after last entry",
            remaining(&cursor)
        )));
    }

    debug!(entries = entries.len(), bytes = data.len(), "deserialized container");

    Ok(entries)
}

/// Read one entry record starting at the cursor position.
fn read_entry(cursor: &mut Cursor<&[u8]>) -> Result<Entry> {
    if remaining(cursor) < ENTRY_PREFIX_SIZE as u64 {
        return Err(PackError::UnexpectedEnd);
    }

    let path_len = cursor.read_u16::<LittleEndian>()? as u64;
    let content_len = cursor.read_u32::<LittleEndian>()? as u64;
    let flag = cursor.read_u8()?;

    if path_len + content_len > remaining(cursor) {
        return Err(PackError::EntryExceedsBounds);
    }

    let path_bytes = take(cursor, path_len);
    let content_bytes = take(cursor, content_len);

    let path = std::str::from_utf8(path_bytes)
        .map_err(|e| PackError::corrupted(format!("entry path is not valid UTF-8: {e}")))?
        .to_string();

    let content = match flag {
        FLAG_BINARY => Content::Binary(content_bytes.to_vec()),
        FLAG_TEXT => {
            let text = std::str::from_utf8(content_bytes).map_err(|e| {
                PackError::corrupted(format!("text entry {path:?} is not valid UTF-8: {e}"))
            })?;
            Content::Text(text.to_string())
        }
        other => {
            return Err(PackError::corrupted(format!(
                "unknown flag {other} on entry {path:?}"
            )));
        }
    };

    Ok(Entry { path, content })
}

/// Borrow the next `len` bytes and advance the cursor past them.
///
/// Callers must have checked that `len` bytes remain.
fn take<'a>(cursor: &mut Cursor<&'a [u8]>, len: u64) -> &'a [u8] {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start + len as usize;
    cursor.set_position(end as u64);
    &data[start..end]
}

fn remaining(cursor: &Cursor<&[u8]>) -> u64 {
    (cursor.get_ref().len() as u64).saturating_sub(cursor.position())
}

/// Add one entry's content length to the running total.
fn add_content_len(total: u64, len: usize) -> Result<u64> {
    let total = total + len as u64;
    if total > MAX_CONTENT_LEN {
        return Err(PackError::ContentTooLarge);
    }
    Ok(total)
}

/// Narrow a computed size to a 32-bit field.
///
/// A value that does not fit means a size was miscomputed upstream; it is
/// rejected instead of being truncated.
fn encode_u32(value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| PackError::corrupted(format!("value {value} does not fit a 32-bit field")))
}
