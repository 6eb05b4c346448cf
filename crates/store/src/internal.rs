//! Shared plumbing used by [`crate::add`] and [`crate::change`]: turning a
//! normalized key/value into wire bytes, running the allocator, and
//! wiring a fresh cell into the tree.

use crate::error::StoreError;
use anyhow::Result;
use container::{Container, CHECKSUMS_AND_DATA_BOUNDARY, FULL_CAPACITY};
use tree::Key;

/// Maps a normalized scalar to its wire type tag and byte payload.
pub(crate) fn scalar_type_and_bytes(value: &Key) -> (&'static str, Vec<u8>) {
    match value {
        Key::Int(n) => (codec::TYPE_INT, codec::pack_i32(*n).to_vec()),
        Key::Str(s) => (codec::TYPE_STRING, s.as_bytes().to_vec()),
    }
}

/// Builds the on-disk cell bytes for a "data" (int/string) value.
pub(crate) fn build_data_cell(key: &Key, value: &Key) -> Vec<u8> {
    let (key_type, key_bytes) = scalar_type_and_bytes(key);
    let (value_type, value_bytes) = scalar_type_and_bytes(value);
    codec::encode_cell(key_type, &key_bytes, value_type, &value_bytes)
}

/// Builds the on-disk cell bytes for a "file" value.
pub(crate) fn build_file_cell(key: &Key, file_bytes: &[u8]) -> Vec<u8> {
    let (key_type, key_bytes) = scalar_type_and_bytes(key);
    codec::encode_cell(key_type, &key_bytes, codec::TYPE_FILE, file_bytes)
}

/// Reserves `cell_len` bytes in the data region, returning the offset the
/// caller must write the cell at. Does **not** advance the free-pointer —
/// callers must call [`commit_allocation`] only after the cell bytes are
/// actually written, so a failed write never leaks a partially-claimed
/// offset into a future allocation.
pub(crate) fn reserve(container: &mut Container, display_path: &str, cell_len: u32) -> Result<u32> {
    if u64::from(cell_len) > FULL_CAPACITY - CHECKSUMS_AND_DATA_BOUNDARY {
        return Err(StoreError::PayloadTooBig.into());
    }
    let free = container.read_free_pointer()?;
    if u64::from(free) + u64::from(cell_len) >= FULL_CAPACITY {
        return Err(StoreError::OutOfMemory(display_path.to_string()).into());
    }
    Ok(free)
}

/// Writes `cell` at `offset`, advances the free-pointer past it, links
/// `slot` to `offset`, and refreshes the checksum for `slot`'s level.
pub(crate) fn commit_allocation(
    container: &mut Container,
    slot: u64,
    offset: u32,
    cell: &[u8],
) -> Result<()> {
    container.write_bytes_at(offset as u64, cell)?;
    container.write_free_pointer(offset + cell.len() as u32)?;
    container.write_link(slot, offset)?;
    checksum::refresh_level(container, tree::depth_of(slot))?;
    Ok(())
}
