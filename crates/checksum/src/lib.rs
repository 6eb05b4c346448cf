//! # Checksum — per-level tamper-evidence layer
//!
//! Every level of the index tree (levels `0..=17`, one level per BST depth)
//! carries a 4-byte integrity tag: the XOR, over every non-empty link slot
//! at that depth, of a checksum computed from the cell bytes that slot
//! points to. The tag is recomputed and compared on every read, and
//! refreshed on every write that touches a link at that level.
//!
//! This is deliberately *not* CRC32 (which the teacher uses elsewhere for
//! its WAL and SSTable records) — the on-disk contract here specifies a
//! different, bespoke algorithm: a XOR-of-signed-word-sums reduced modulo a
//! prime. See [`level_checksum`] for the exact definition, including the
//! ASCII `'0'` padding rule that must be reproduced byte-for-byte to
//! interoperate with other implementations of this format.

use anyhow::Result;
use container::Container;

/// The modulus applied once, at the very end, to each level's checksum.
pub const CHECKSUM_MODULUS: i64 = 1_000_000_007;

/// Returns the inclusive `(start, end)` range of BST slot indices at depth `h`.
///
/// Level `h` contains slots `2^h - 1 ..= 2^(h+1) - 2`, the standard
/// implicit-binary-heap level boundaries.
#[must_use]
pub fn level_range(h: u32) -> (u64, u64) {
    let start = 2u64.pow(h) - 1;
    let end = 2u64.pow(h + 1) - 2;
    (start, end)
}

/// Sums `floor(|bytes| / 4)` contiguous big-endian signed 32-bit words from
/// `bytes` with wrapping arithmetic, then folds in one more word formed from
/// any trailing `1..=3` bytes padded on the right with ASCII `'0'` (0x30, not
/// NUL) up to 4 bytes.
///
/// If `bytes` is shorter than 4 bytes, the main loop contributes nothing and
/// the entire input is treated as the trailing remainder: the single word
/// is `bytes` padded with `'0'` to 4 bytes.
#[must_use]
pub fn sum_of_i32_be_words(bytes: &[u8]) -> i32 {
    let len = bytes.len();
    let whole_words = len / 4;
    let mut sum: i32 = 0;

    for i in 0..whole_words {
        let word = &bytes[4 * i..4 * i + 4];
        let mut arr = [0u8; 4];
        arr.copy_from_slice(word);
        sum = sum.wrapping_add(i32::from_be_bytes(arr));
    }

    let remainder_len = len % 4;
    if remainder_len != 0 {
        let mut padded = [b'0'; 4];
        padded[..remainder_len].copy_from_slice(&bytes[4 * whole_words..]);
        sum = sum.wrapping_add(i32::from_be_bytes(padded));
    }

    sum
}

/// Computes the checksum of the cell stored at data-region offset `link`.
///
/// Reads `cell_len` from the first 4 bytes at `link`, then the full cell,
/// and folds it through [`sum_of_i32_be_words`].
fn cell_checksum(container: &mut Container, link: u32) -> Result<i32> {
    let cell_len = container.read_u32_at(link as u64)?;
    let cell_bytes = container.read_bytes_at(link as u64, cell_len as usize)?;
    Ok(sum_of_i32_be_words(&cell_bytes))
}

/// Computes the current checksum for level `h` by walking every slot at
/// that depth and XOR-ing in the checksum of every non-empty cell.
///
/// The result is reduced modulo [`CHECKSUM_MODULUS`] exactly once, after
/// the XOR accumulation.
pub fn level_checksum(container: &mut Container, h: u32) -> Result<u32> {
    let (start, end) = level_range(h);
    let mut checksum: i64 = 0;

    for i in start..=end {
        let link = container.read_link(i)?;
        if link == 0 {
            continue;
        }
        let word = cell_checksum(container, link)? as i64;
        checksum ^= word;
    }

    Ok((checksum.rem_euclid(CHECKSUM_MODULUS)) as u32)
}

/// Recomputes level `h`'s checksum and compares it against the stored
/// value. Returns `true` if they match (no tampering detected at this
/// level).
pub fn verify_level(container: &mut Container, h: u32) -> Result<bool> {
    let stored = container.read_checksum(h)?;
    let computed = level_checksum(container, h)?;
    Ok(stored == computed)
}

/// Recomputes level `h`'s checksum and writes it to the checksum array.
pub fn refresh_level(container: &mut Container, h: u32) -> Result<()> {
    let computed = level_checksum(container, h)?;
    container.write_checksum(h, computed)
}

/// Refreshes every level (`0..=MAX_TREE_HEIGHT`). Used after operations
/// (erase) whose link moves can ripple across multiple levels at once.
pub fn refresh_all_levels(container: &mut Container) -> Result<()> {
    for h in 0..=container::MAX_TREE_HEIGHT {
        refresh_level(container, h)?;
    }
    Ok(())
}

/// Verifies every level. Used by the validity gate.
pub fn verify_all_levels(container: &mut Container) -> Result<bool> {
    for h in 0..=container::MAX_TREE_HEIGHT {
        if !verify_level(container, h)? {
            return Ok(false);
        }
    }
    Ok(true)
}
