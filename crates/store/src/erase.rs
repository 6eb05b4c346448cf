//! `erase`.

use crate::error::StoreError;
use crate::normalize::normalize;
use crate::{validate, Store};
use anyhow::Result;

impl Store {
    /// Removes `key`'s link from the tree, running the splice algorithm
    /// to keep the BST valid in place. Cell bytes are not reclaimed.
    /// Fails with [`StoreError::NoSuchKey`] if absent.
    pub fn erase(&mut self, key: &str) -> Result<()> {
        validate::require_valid(self)?;
        let normalized = normalize(key);
        let result = tree::locate(&mut self.container, &normalized)?;
        if !result.found {
            return Err(StoreError::NoSuchKey {
                file: self.display_path(),
                key: key.to_string(),
            }
            .into());
        }

        tree::erase(&mut self.container, result.slot)?;
        checksum::refresh_all_levels(&mut self.container)?;
        Ok(())
    }
}
