//! The validity gate (spec §4.7): every mutating/reading operation except
//! `init`/`clear`'s own rewrite first confirms the container is still a
//! well-formed data file.

use crate::{Store, StoreError};
use anyhow::Result;
use container::{Container, CHECKSUMS_AND_DATA_BOUNDARY, FULL_CAPACITY, LINK_SLOT_COUNT};

impl Store {
    /// Returns `true` iff: the free-pointer is at least
    /// [`CHECKSUMS_AND_DATA_BOUNDARY`], every non-zero link lies within
    /// the data region, and every level's checksum matches. Any I/O
    /// failure during the checks counts as invalid rather than propagating.
    #[must_use]
    pub fn check_validity_of_file(&mut self) -> bool {
        check_validity(&mut self.container)
    }
}

pub(crate) fn check_validity(container: &mut Container) -> bool {
    run_checks(container).unwrap_or(false)
}

fn run_checks(container: &mut Container) -> Result<bool> {
    let free = container.read_free_pointer()?;
    if u64::from(free) < CHECKSUMS_AND_DATA_BOUNDARY {
        return Ok(false);
    }

    for i in 0..LINK_SLOT_COUNT {
        let link = container.read_link(i)?;
        if link == 0 {
            continue;
        }
        let link = u64::from(link);
        if link < CHECKSUMS_AND_DATA_BOUNDARY || link >= FULL_CAPACITY {
            return Ok(false);
        }
    }

    checksum::verify_all_levels(container)
}

/// Runs the validity gate, translating failure into [`StoreError::NotADataFile`].
pub(crate) fn require_valid(store: &mut Store) -> Result<()> {
    if !check_validity(&mut store.container) {
        return Err(StoreError::NotADataFile(store.display_path()).into());
    }
    Ok(())
}
