//! `add`, `add_file`, and the `add_package` batch-ingest path.

use crate::error::StoreError;
use crate::internal::{build_data_cell, build_file_cell, commit_allocation, reserve};
use crate::normalize::normalize;
use crate::{validate, Store};
use anyhow::Result;
use std::fs;
use std::path::Path;

impl Store {
    /// Adds a key/value pair. Both are normalized text; the stored types
    /// (int or string) follow from normalization. Fails with
    /// [`StoreError::UsedKey`] if the key is already present.
    pub fn add(&mut self, key: &str, value: &str) -> Result<()> {
        validate::require_valid(self)?;
        let normalized_key = normalize(key);
        let normalized_value = normalize(value);

        let slot = self.locate_for_insert(&normalized_key, key)?;
        let cell = build_data_cell(&normalized_key, &normalized_value);
        self.write_new_cell(slot, &cell)
    }

    /// Adds a key whose value is the raw contents of an external file.
    /// Fails with [`StoreError::FileMissing`] if `path` does not exist,
    /// or [`StoreError::UsedKey`] if the key is already present.
    pub fn add_file<P: AsRef<Path>>(&mut self, key: &str, path: P) -> Result<()> {
        validate::require_valid(self)?;
        let path = path.as_ref();
        if !path.is_file() {
            return Err(StoreError::FileMissing(path.display().to_string()).into());
        }

        let normalized_key = normalize(key);
        let slot = self.locate_for_insert(&normalized_key, key)?;

        let bytes = fs::read(path)?;
        let cell = build_file_cell(&normalized_key, &bytes);
        self.write_new_cell(slot, &cell)
    }

    /// Ingests a batch of `(kind, key, value_or_path)` triples, where
    /// `kind` is `"data"` or `"file"`. Each row dispatches to `add` or
    /// `add_file`; a row that fails invokes `on_row_error(index, row)`
    /// and ingestion continues — the batch itself never fails on a row's
    /// behalf.
    pub fn add_package<F>(&mut self, rows: &[(String, String, String)], mut on_row_error: F) -> Result<()>
    where
        F: FnMut(usize, &(String, String, String)),
    {
        validate::require_valid(self)?;
        for (index, row) in rows.iter().enumerate() {
            let (kind, key, value_or_path) = row;
            let result = if kind == "file" {
                self.add_file(key, value_or_path)
            } else {
                self.add(key, value_or_path)
            };
            if result.is_err() {
                on_row_error(index, row);
            }
        }
        Ok(())
    }

    /// Runs the tree walk for a new key, failing if it is already present
    /// or the tree is exhausted.
    fn locate_for_insert(&mut self, normalized_key: &tree::Key, display_key: &str) -> Result<u64> {
        let found = tree::locate(&mut self.container, normalized_key)?;
        if found.found {
            return Err(StoreError::UsedKey(display_key.to_string()).into());
        }
        match tree::probe_insert(&mut self.container, normalized_key) {
            Ok(slot) => Ok(slot),
            Err(_) => Err(StoreError::TreeFull(self.display_path()).into()),
        }
    }

    /// Reserves space, writes the cell, and wires it into the tree at `slot`.
    fn write_new_cell(&mut self, slot: u64, cell: &[u8]) -> Result<()> {
        let display_path = self.display_path();
        let offset = reserve(&mut self.container, &display_path, cell.len() as u32)?;
        commit_allocation(&mut self.container, slot, offset, cell)
    }
}

#[cfg(test)]
mod add_tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn add_then_contains_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("hello", "world").unwrap();
        assert!(store.contains("hello").unwrap());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("a", "1").unwrap();
        let err = store.add("a", "2").unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::UsedKey(_))));
    }

    #[test]
    fn add_normalizes_int_like_keys() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("1", "2").unwrap();
        // "1" and "'1'" normalize to different keys (int vs string).
        assert!(!store.contains("'1'").unwrap());
    }

    #[test]
    fn add_file_reads_external_file_bytes() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        let payload_path = dir.path().join("payload.bin");
        std::fs::write(&payload_path, b"\x00\x01binary-ish").unwrap();

        store.add_file("blob", &payload_path).unwrap();
        assert!(store.contains("blob").unwrap());
    }

    #[test]
    fn add_file_missing_source_fails() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        let err = store.add_file("blob", dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::FileMissing(_))));
    }

    #[test]
    fn add_package_skips_failing_rows_and_reports_them() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        store.add("dup", "1").unwrap();

        let rows = vec![
            ("data".to_string(), "a".to_string(), "1".to_string()),
            ("data".to_string(), "dup".to_string(), "2".to_string()),
            ("data".to_string(), "b".to_string(), "3".to_string()),
        ];
        let mut failed = Vec::new();
        store.add_package(&rows, |i, row| failed.push((i, row.1.clone()))).unwrap();

        assert_eq!(failed, vec![(1, "dup".to_string())]);
        assert!(store.contains("a").unwrap());
        assert!(store.contains("b").unwrap());
    }

    #[test]
    fn payload_exactly_at_capacity_succeeds_on_empty_store() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        // Residual capacity minus the fixed overhead of the cell's own
        // framing; build a value whose *cell* lands exactly at capacity.
        let residual = (container::FULL_CAPACITY - container::CHECKSUMS_AND_DATA_BOUNDARY) as usize;
        let overhead = crate::internal::build_data_cell(&tree::Key::Str("k".to_string()), &tree::Key::Str(String::new())).len();
        let value_len = residual - overhead;
        let value = "x".repeat(value_len);
        store.add("k", &value).unwrap();
    }

    #[test]
    fn payload_one_byte_over_capacity_fails() {
        let dir = tempdir().unwrap();
        let mut store = Store::init(dir.path().join("image.kvimg")).unwrap();
        let residual = (container::FULL_CAPACITY - container::CHECKSUMS_AND_DATA_BOUNDARY) as usize;
        let overhead = crate::internal::build_data_cell(&tree::Key::Str("k".to_string()), &tree::Key::Str(String::new())).len();
        let value = "x".repeat(residual - overhead + 1);
        let err = store.add("k", &value).unwrap_err();
        assert!(matches!(err.downcast_ref::<StoreError>(), Some(StoreError::PayloadTooBig)));
    }
}
