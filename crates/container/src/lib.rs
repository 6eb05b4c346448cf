//! # Container — fixed on-disk image geometry
//!
//! Owns the raw byte layout of the container file: a free-pointer, a link
//! array (the index tree's backing store), a checksum array, and a data
//! region — three header regions plus data, all packed into exactly
//! [`FULL_CAPACITY`] bytes.
//!
//! ```text
//! [0, 4)                 free-pointer
//! [4, 1_048_576)          link array  (262,143 slots x 4 bytes)
//! [1_048_576, 1_048_648)  checksum array (18 slots x 4 bytes)
//! [1_048_648, 26_214_400) data region
//! ```
//!
//! This crate knows nothing about BST semantics or checksums — it is the
//! thinnest possible wrapper over `seek` + `read`/`write` on a single file
//! handle, in the spirit of the teacher's SSTable reader/writer modules
//! (`sstable::format`), which likewise isolate "where things live in the
//! file" from "what the bytes mean".

use anyhow::{Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Total size of a container file, in bytes. Exact, not tunable.
pub const FULL_CAPACITY: u64 = 26_214_400;
/// Byte offset where the link array begins (right after the free-pointer).
pub const LINKS_START: u64 = 4;
/// Byte offset where the link array ends and the checksum array begins.
pub const LINKS_AND_CHECKSUMS_BOUNDARY: u64 = 1_048_576;
/// Byte offset where the checksum array ends and the data region begins.
pub const CHECKSUMS_AND_DATA_BOUNDARY: u64 = 1_048_648;
/// Number of 4-byte link slots in the link array.
pub const LINK_SLOT_COUNT: u64 = (LINKS_AND_CHECKSUMS_BOUNDARY - LINKS_START) / 4;
/// Maximum valid index into the implicit-array BST.
pub const MAX_TREE_IND: u64 = 2u64.pow(18) - 2;
/// Maximum BST height (levels run `0..=MAX_TREE_HEIGHT`).
pub const MAX_TREE_HEIGHT: u32 = 17;
/// Number of checksum slots (one per level, `0..=MAX_TREE_HEIGHT`).
pub const CHECKSUM_SLOT_COUNT: u32 = MAX_TREE_HEIGHT + 1;

/// Byte offset of link slot `i` within the file.
#[must_use]
pub fn slot_offset(i: u64) -> u64 {
    LINKS_START + 4 * i
}

/// Byte offset of the checksum slot for level `h`.
#[must_use]
pub fn checksum_offset(h: u32) -> u64 {
    LINKS_AND_CHECKSUMS_BOUNDARY + 4 * (h as u64)
}

/// A single 26,214,400-byte container file, opened for random-access reads
/// and writes.
///
/// Every higher-level component (the index tree, the checksum layer, the
/// storage facade) goes through this handle rather than touching `File`
/// directly, so the on-disk layout stays centralized in one place.
pub struct Container {
    file: File,
}

impl Container {
    /// Creates a fresh, zero-initialized image at `path` and opens it.
    ///
    /// Writes the initial free-pointer ([`CHECKSUMS_AND_DATA_BOUNDARY`]) at
    /// offset 0, then zero-fills the remainder of the file up to
    /// [`FULL_CAPACITY`]. The file is fsynced before this returns so that a
    /// freshly-created image is durable.
    pub fn create_empty<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("creating container at {}", path.as_ref().display()))?;
        let mut container = Self { file };
        container.zero_fill()?;
        container.file.sync_all()?;
        Ok(container)
    }

    /// Opens an existing container file for random-access reads and writes.
    ///
    /// Does not validate the contents — callers (the storage facade) are
    /// responsible for running the validity gate before trusting the image.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("opening container at {}", path.as_ref().display()))?;
        Ok(Self { file })
    }

    /// Rewrites the header to the initial state (free-pointer reset, all
    /// links and checksums zeroed) without shrinking the file. Used by both
    /// `init` and `clear` at the facade level.
    pub fn zero_fill(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_u32::<BigEndian>(CHECKSUMS_AND_DATA_BOUNDARY as u32)?;

        // Zero the link array + checksum array + data region in bulk chunks
        // rather than one write() per 4-byte slot.
        const CHUNK: usize = 64 * 1024;
        let zeros = vec![0u8; CHUNK];
        let mut remaining = FULL_CAPACITY - 4;
        while remaining > 0 {
            let n = remaining.min(CHUNK as u64) as usize;
            self.file.write_all(&zeros[..n])?;
            remaining -= n as u64;
        }
        self.file.flush()?;
        Ok(())
    }

    /// Reads the free-pointer (offset 0..4).
    pub fn read_free_pointer(&mut self) -> Result<u32> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(self.file.read_u32::<BigEndian>()?)
    }

    /// Writes the free-pointer.
    pub fn write_free_pointer(&mut self, value: u32) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_u32::<BigEndian>(value)?;
        self.file.flush()?;
        Ok(())
    }

    /// Reads link slot `i`. Returns `0` for an empty slot.
    pub fn read_link(&mut self, i: u64) -> Result<u32> {
        self.read_u32_at(slot_offset(i))
    }

    /// Writes link slot `i`.
    pub fn write_link(&mut self, i: u64, value: u32) -> Result<()> {
        self.write_u32_at(slot_offset(i), value)
    }

    /// Reads the checksum slot for level `h`.
    pub fn read_checksum(&mut self, h: u32) -> Result<u32> {
        self.read_u32_at(checksum_offset(h))
    }

    /// Writes the checksum slot for level `h`.
    pub fn write_checksum(&mut self, h: u32, value: u32) -> Result<()> {
        self.write_u32_at(checksum_offset(h), value)
    }

    /// Reads a big-endian `u32` at an arbitrary byte offset.
    pub fn read_u32_at(&mut self, offset: u64) -> Result<u32> {
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(self.file.read_u32::<BigEndian>()?)
    }

    /// Writes a big-endian `u32` at an arbitrary byte offset.
    pub fn write_u32_at(&mut self, offset: u64, value: u32) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_u32::<BigEndian>(value)?;
        Ok(())
    }

    /// Reads exactly `len` bytes starting at `offset`.
    pub fn read_bytes_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Writes `bytes` starting at `offset`.
    pub fn write_bytes_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        Ok(())
    }

    /// Flushes any buffered writes to the OS. The container performs
    /// unbuffered direct I/O on every call, so this is mostly a formality,
    /// kept for symmetry with [`Container::create_empty`]'s `sync_all`.
    pub fn flush(&mut self) -> Result<()> {
        Ok(self.file.flush()?)
    }

    /// Returns the current length of the backing file in bytes.
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}

#[cfg(test)]
mod tests;
