//! # Index tree — implicit array BST
//!
//! The tree has no heap-allocated nodes: it *is* the link array the
//! container exposes. Slot `0` is the root; the children of slot `i` are
//! `2i+1` and `2i+2`. A slot's value is either `0` (empty) or an offset of
//! a cell in the data region. Comparing two keys only ever requires
//! reading the cell a slot already points to, so this module is the one
//! place that couples the container's raw bytes to the codec's typed
//! fields.
//!
//! Every slot read along a traversal first checksum-verifies the level it
//! belongs to (see `checksum::verify_level`), so a tampered level is caught
//! at the earliest possible point rather than silently returning a wrong
//! answer.

use anyhow::{anyhow, Result};
use checksum::verify_level;
use codec::{decode_cell, decode_utf8, unpack_i32};
use container::{Container, MAX_TREE_IND};
use std::cmp::Ordering;

/// A normalized key: either a signed 32-bit integer or a UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Int(i32),
    Str(String),
}

impl Key {
    /// Orders keys per the on-disk contract: integers are always less than
    /// strings; within a type, natural ordering applies.
    fn compare(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::Int(a), Key::Int(b)) => a.cmp(b),
            (Key::Str(a), Key::Str(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Key::Int(_), Key::Str(_)) => Ordering::Less,
            (Key::Str(_), Key::Int(_)) => Ordering::Greater,
        }
    }
}

/// Depth of slot `i` in the implicit tree (root is depth 0).
#[must_use]
pub fn depth_of(i: u64) -> u32 {
    let mut idx = i;
    let mut d = 0u32;
    while idx != 0 {
        idx = (idx - 1) / 2;
        d += 1;
    }
    d
}

fn left_child(i: u64) -> u64 {
    2 * i + 1
}

fn right_child(i: u64) -> u64 {
    2 * i + 2
}

/// Reads the key stored in the cell at data-region offset `link`.
fn key_at_link(container: &mut Container, link: u32) -> Result<Key> {
    let cell_len = container.read_u32_at(link as u64)?;
    let bytes = container.read_bytes_at(link as u64, cell_len as usize)?;
    let decoded = decode_cell(&bytes)?;
    match decoded.key_type.as_str() {
        "int" => Ok(Key::Int(unpack_i32(&decoded.key_bytes)?)),
        "string" => Ok(Key::Str(decode_utf8(&decoded.key_bytes)?)),
        other => Err(anyhow!("unrecognized key type {other} in stored cell")),
    }
}

fn verify_slot_level(container: &mut Container, i: u64) -> Result<()> {
    let h = depth_of(i);
    if !verify_level(container, h)? {
        return Err(anyhow!("checksum mismatch at level {h}"));
    }
    Ok(())
}

/// Result of a tree walk: whether the key was found, and the slot index
/// that holds (or would hold) its link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateResult {
    pub found: bool,
    pub slot: u64,
}

/// Walks from the root comparing `key` against the cell at each occupied
/// slot, descending left on "less", right on "greater or equal", until an
/// empty slot, an exact match, or the end of the tree is reached.
///
/// Every level visited is checksum-verified before its link is trusted;
/// a verification failure surfaces as an error (callers treat this as
/// "not a data file").
pub fn locate(container: &mut Container, key: &Key) -> Result<LocateResult> {
    let mut i = 0u64;
    loop {
        if i > MAX_TREE_IND {
            return Ok(LocateResult { found: false, slot: i });
        }
        verify_slot_level(container, i)?;
        let link = container.read_link(i)?;
        if link == 0 {
            return Ok(LocateResult { found: false, slot: i });
        }
        let cur_key = key_at_link(container, link)?;
        match key.compare(&cur_key) {
            Ordering::Equal => return Ok(LocateResult { found: true, slot: i }),
            Ordering::Less => i = left_child(i),
            Ordering::Greater => i = right_child(i),
        }
    }
}

/// Walks from the root to find the slot where `key` should be linked.
///
/// Identical descent to [`locate`], except on an exact match (unreachable
/// in normal use, since the facade checks absence first) the walk
/// continues toward the right child rather than stopping. Fails with an
/// error if the walk runs past [`MAX_TREE_IND`] without finding an empty
/// slot (tree full).
pub fn probe_insert(container: &mut Container, key: &Key) -> Result<u64> {
    let mut i = 0u64;
    loop {
        if i > MAX_TREE_IND {
            return Err(anyhow!("tree is full"));
        }
        verify_slot_level(container, i)?;
        let link = container.read_link(i)?;
        if link == 0 {
            return Ok(i);
        }
        let cur_key = key_at_link(container, link)?;
        i = match key.compare(&cur_key) {
            Ordering::Less => left_child(i),
            _ => right_child(i),
        };
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

impl Direction {
    fn opposite(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn child_of(self, i: u64) -> u64 {
        match self {
            Direction::Left => left_child(i),
            Direction::Right => right_child(i),
        }
    }
}

/// Descends once in `direction` from `start`, then repeatedly in the
/// opposite direction as far as a non-empty link permits. Returns the
/// final (most extreme) slot index reached.
fn descend_extreme(container: &mut Container, start: u64, direction: Direction) -> Result<u64> {
    let mut last = direction.child_of(start);
    loop {
        let next = direction.opposite().child_of(last);
        if next > MAX_TREE_IND {
            break;
        }
        if container.read_link(next)? == 0 {
            break;
        }
        last = next;
    }
    Ok(last)
}

/// Clears the link at `slot`, then restores the BST invariant in-place by
/// repeatedly splicing in a neighbor from the richer subtree. No cell
/// bytes move; only link slots are rewritten.
///
/// Per the on-disk contract: prefer the right subtree's leftmost
/// descendant (in-order successor) as the donor; if the target has no
/// right subtree, use the left subtree's rightmost descendant
/// (in-order predecessor) instead.
pub fn erase(container: &mut Container, target: u64) -> Result<()> {
    let mut cur = target;
    loop {
        let right_link = if right_child(cur) <= MAX_TREE_IND {
            container.read_link(right_child(cur))?
        } else {
            0
        };
        let left_link = if left_child(cur) <= MAX_TREE_IND {
            container.read_link(left_child(cur))?
        } else {
            0
        };

        let direction = if right_link != 0 {
            Direction::Right
        } else if left_link != 0 {
            Direction::Left
        } else {
            container.write_link(cur, 0)?;
            break;
        };

        let donor = descend_extreme(container, cur, direction)?;
        let donor_value = container.read_link(donor)?;
        container.write_link(cur, donor_value)?;

        let donor_same_dir_child = direction.child_of(donor);
        let donor_has_same_dir_child =
            donor_same_dir_child <= MAX_TREE_IND && container.read_link(donor_same_dir_child)? != 0;

        if !donor_has_same_dir_child {
            container.write_link(donor, 0)?;
            break;
        }

        // The donor still has a subtree hanging off it in the direction we
        // just drained from; treat the donor as the new target and repeat.
        cur = donor;
    }
    Ok(())
}
