//! `get`, `get_file`, `contains`, and `get_all_keys`.

use crate::error::StoreError;
use crate::normalize::normalize;
use crate::{validate, Store};
use anyhow::Result;
use byteorder::{BigEndian, WriteBytesExt};
use std::fs;
use std::path::Path;
use tree::Key;

/// A value read back out of the store: an integer, a UTF-8 string, or an
/// opaque file payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i32),
    Str(String),
    File(Vec<u8>),
}

impl Value {
    /// Renders the value as the raw bytes `get_file` writes to disk:
    /// strings as their UTF-8 bytes, integers as 4-byte big-endian, file
    /// payloads verbatim.
    #[must_use]
    pub fn to_raw_bytes(&self) -> Vec<u8> {
        match self {
            Value::Int(n) => {
                let mut out = Vec::with_capacity(4);
                out.write_i32::<BigEndian>(*n).expect("Vec write is infallible");
                out
            }
            Value::Str(s) => s.as_bytes().to_vec(),
            Value::File(bytes) => bytes.clone(),
        }
    }
}

impl Store {
    /// Looks up `key`, normalizing it first. Fails with
    /// [`StoreError::NoSuchKey`] if absent.
    pub fn get(&mut self, key: &str) -> Result<Value> {
        validate::require_valid(self)?;
        let normalized = normalize(key);
        let slot = self.locate_or_no_such_key(&normalized, key)?;
        self.read_value_at_slot(slot)
    }

    /// Fetches the value for `key` and writes its raw byte representation
    /// to `out_path`.
    pub fn get_file<P: AsRef<Path>>(&mut self, key: &str, out_path: P) -> Result<()> {
        let value = self.get(key)?;
        fs::write(out_path, value.to_raw_bytes())?;
        Ok(())
    }

    /// Returns whether `key` (after normalization) is present.
    pub fn contains(&mut self, key: &str) -> Result<bool> {
        validate::require_valid(self)?;
        let normalized = normalize(key);
        Ok(tree::locate(&mut self.container, &normalized)?.found)
    }

    /// Returns every key currently present, via an iterative traversal of
    /// the link array. Every level visited is checksum-verified.
    pub fn get_all_keys(&mut self) -> Result<Vec<Key>> {
        validate::require_valid(self)?;
        let mut keys = Vec::new();
        let mut stack = vec![0u64];
        let mut visited = std::collections::HashSet::new();

        while let Some(&cur) = stack.last() {
            visited.insert(cur);
            if !checksum::verify_level(&mut self.container, tree::depth_of(cur))? {
                return Err(StoreError::NotADataFile(self.display_path()).into());
            }
            let link = self.container.read_link(cur)?;
            if link == 0 {
                stack.pop();
                continue;
            }

            let left = 2 * cur + 1;
            if left < container::MAX_TREE_IND && !visited.contains(&left) && self.container.read_link(left)? != 0 {
                stack.push(left);
                continue;
            }
            let right = 2 * cur + 2;
            if right < container::MAX_TREE_IND && !visited.contains(&right) && self.container.read_link(right)? != 0 {
                stack.push(right);
                continue;
            }

            stack.pop();
            keys.push(self.key_at_slot(cur)?);
        }

        Ok(keys)
    }

    fn locate_or_no_such_key(&mut self, normalized: &Key, display_key: &str) -> Result<u64> {
        let result = tree::locate(&mut self.container, normalized)?;
        if !result.found {
            return Err(StoreError::NoSuchKey {
                file: self.display_path(),
                key: display_key.to_string(),
            }
            .into());
        }
        Ok(result.slot)
    }

    fn key_at_slot(&mut self, slot: u64) -> Result<Key> {
        let link = self.container.read_link(slot)?;
        let cell_len = self.container.read_u32_at(link as u64)?;
        let bytes = self.container.read_bytes_at(link as u64, cell_len as usize)?;
        let decoded = codec::decode_cell(&bytes)?;
        decode_key(&decoded)
    }

    fn read_value_at_slot(&mut self, slot: u64) -> Result<Value> {
        let link = self.container.read_link(slot)?;
        let cell_len = self.container.read_u32_at(link as u64)?;
        let bytes = self.container.read_bytes_at(link as u64, cell_len as usize)?;
        let decoded = codec::decode_cell(&bytes)?;
        decode_value(&decoded)
    }
}

fn decode_key(decoded: &codec::DecodedCell) -> Result<Key> {
    match decoded.key_type.as_str() {
        "int" => Ok(Key::Int(codec::unpack_i32(&decoded.key_bytes)?)),
        _ => Ok(Key::Str(codec::decode_utf8(&decoded.key_bytes)?)),
    }
}

fn decode_value(decoded: &codec::DecodedCell) -> Result<Value> {
    match decoded.value_type.as_str() {
        "int" => Ok(Value::Int(codec::unpack_i32(&decoded.value_bytes)?)),
        "file" => Ok(Value::File(decoded.value_bytes.clone())),
        _ => Ok(Value::Str(codec::decode_utf8(&decoded.value_bytes)?)),
    }
}
