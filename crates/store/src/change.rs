//! `change`.

use crate::error::StoreError;
use crate::internal::{build_data_cell, build_file_cell};
use crate::normalize::normalize;
use crate::{validate, Store};
use anyhow::Result;

/// The kind of value `change` is given: `Data` re-normalizes the text
/// exactly like `add` does (which can turn a string-looking value into an
/// integer — preserved as the contract), `File` reads the named path's
/// bytes, mirroring `add_file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Data,
    File,
}

impl Store {
    /// Replaces the value stored under `key`. If the new cell is no
    /// larger than the old one it is overwritten in place (the allocator
    /// is append-only, so this is the only way to avoid consuming more
    /// data-region bytes); otherwise the key is erased and re-added,
    /// which does advance the free-pointer. Fails with
    /// [`StoreError::NoSuchKey`] if absent.
    pub fn change(&mut self, key: &str, kind: ValueKind, new_value: &str) -> Result<()> {
        validate::require_valid(self)?;
        let normalized_key = normalize(key);
        let result = tree::locate(&mut self.container, &normalized_key)?;
        if !result.found {
            return Err(StoreError::NoSuchKey {
                file: self.display_path(),
                key: key.to_string(),
            }
            .into());
        }
        let slot = result.slot;

        let new_cell = match kind {
            ValueKind::File => {
                let bytes = std::fs::read(new_value)
                    .map_err(|_| StoreError::FileMissing(new_value.to_string()))?;
                build_file_cell(&normalized_key, &bytes)
            }
            ValueKind::Data => {
                let normalized_value = normalize(new_value);
                build_data_cell(&normalized_key, &normalized_value)
            }
        };

        let link = self.container.read_link(slot)?;
        let old_cell_len = self.container.read_u32_at(link as u64)?;

        if new_cell.len() as u32 <= old_cell_len {
            self.container.write_bytes_at(link as u64, &new_cell)?;
            checksum::refresh_level(&mut self.container, tree::depth_of(slot))?;
            Ok(())
        } else {
            self.erase(key)?;
            match kind {
                ValueKind::File => self.add_file(key, new_value),
                ValueKind::Data => self.add(key, new_value),
            }
        }
    }
}

#[cfg(test)]
mod change_tests {
    use super::*;
    use crate::read::Value;
    use tempfile::tempdir;

    #[test]
    fn change_to_a_shorter_value_overwrites_in_place() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("a", "a longer original value").unwrap();
        let free_before = store.container.read_free_pointer().unwrap();

        store.change("a", ValueKind::Data, "short").unwrap();

        assert_eq!(store.get("a").unwrap(), Value::Str("short".to_string()));
        assert_eq!(store.container.read_free_pointer().unwrap(), free_before);
    }

    #[test]
    fn change_to_a_longer_value_advances_the_free_pointer() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("a", "short").unwrap();
        let free_before = store.container.read_free_pointer().unwrap();

        store.change("a", ValueKind::Data, "a much longer value than before").unwrap();

        assert_eq!(
            store.get("a").unwrap(),
            Value::Str("a much longer value than before".to_string())
        );
        assert!(store.container.read_free_pointer().unwrap() > free_before);
    }

    #[test]
    fn change_can_re_normalize_a_value_into_an_integer() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("a", "hello").unwrap();
        store.change("a", ValueKind::Data, "99").unwrap();
        assert_eq!(store.get("a").unwrap(), Value::Int(99));
    }

    #[test]
    fn change_missing_key_fails() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        let err = store.change("nope", ValueKind::Data, "x").unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::NoSuchKey { .. })));
    }

    #[test]
    fn change_to_file_reads_bytes_from_the_given_path() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("a", "x").unwrap();

        let src = dir.path().join("src.bin");
        std::fs::write(&src, b"\x09\x08\x07").unwrap();
        store.change("a", ValueKind::File, src.to_str().unwrap()).unwrap();

        assert_eq!(store.get("a").unwrap(), Value::File(vec![9, 8, 7]));
    }
}
