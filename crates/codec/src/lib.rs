//! # Codec — cell wire format
//!
//! Packs and unpacks the on-disk "cell" record: a length-prefixed,
//! big-endian encoding of one key/value pair.
//!
//! ```text
//! cell_len:u32
//!  key_type_len:u32,  key_type_bytes   ("int" | "string")
//!  key_len:u32,       key_bytes        (4 bytes if int; UTF-8 bytes if string)
//!  value_type_len:u32,value_type_bytes ("int" | "string" | "file")
//!  value_len:u32,     value_bytes
//! ```
//!
//! All integers are big-endian. `cell_len` is the total length in bytes,
//! including itself. This module knows nothing about key ordering, trees,
//! or checksums — it only round-trips bytes.

use anyhow::{bail, Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read, Write};

/// The `"int"` type tag used for both keys and values.
pub const TYPE_INT: &str = "int";
/// The `"string"` type tag used for both keys and values.
pub const TYPE_STRING: &str = "string";
/// The `"file"` type tag, valid only for values.
pub const TYPE_FILE: &str = "file";

/// A decoded cell: the four typed fields plus the total on-disk length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCell {
    /// Total length of the cell in bytes, including the `cell_len` field itself.
    pub cell_len: u32,
    /// `"int"` or `"string"`.
    pub key_type: String,
    /// Raw key bytes: 4-byte big-endian integer, or UTF-8 string bytes.
    pub key_bytes: Vec<u8>,
    /// `"int"`, `"string"`, or `"file"`.
    pub value_type: String,
    /// Raw value bytes: 4-byte big-endian integer, UTF-8 string bytes, or
    /// an opaque file payload.
    pub value_bytes: Vec<u8>,
}

/// Packs a big-endian `i32`.
#[must_use]
pub fn pack_i32(v: i32) -> [u8; 4] {
    v.to_be_bytes()
}

/// Unpacks a big-endian `i32` from an exactly-4-byte slice.
pub fn unpack_i32(bytes: &[u8]) -> Result<i32> {
    if bytes.len() != 4 {
        bail!("expected 4 bytes for i32, got {}", bytes.len());
    }
    let mut arr = [0u8; 4];
    arr.copy_from_slice(bytes);
    Ok(i32::from_be_bytes(arr))
}

/// Writes a length-prefixed byte string: `[len: u32 BE][bytes]`.
fn write_len_prefixed<W: Write>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_u32::<BigEndian>(bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(())
}

/// Encodes a cell from its four typed fields.
///
/// `key_bytes` must be 4 bytes when `key_type == "int"`; likewise for
/// `value_bytes` when `value_type == "int"`. The caller (the facade) is
/// responsible for producing correctly-shaped bytes — the codec does not
/// re-validate the type/length relationship on encode, only on decode.
pub fn encode_cell(key_type: &str, key_bytes: &[u8], value_type: &str, value_bytes: &[u8]) -> Vec<u8> {
    let key_type_bytes = key_type.as_bytes();
    let value_type_bytes = value_type.as_bytes();

    let body_len = 4 + key_type_bytes.len()
        + 4 + key_bytes.len()
        + 4 + value_type_bytes.len()
        + 4 + value_bytes.len();
    let cell_len = 4 + body_len;

    let mut out = Vec::with_capacity(cell_len);
    out.write_u32::<BigEndian>(cell_len as u32).expect("Vec write is infallible");
    write_len_prefixed(&mut out, key_type_bytes).expect("Vec write is infallible");
    write_len_prefixed(&mut out, key_bytes).expect("Vec write is infallible");
    write_len_prefixed(&mut out, value_type_bytes).expect("Vec write is infallible");
    write_len_prefixed(&mut out, value_bytes).expect("Vec write is infallible");
    out
}

/// Decodes a cell from the start of `bytes`.
///
/// `bytes` may contain trailing data past the cell (e.g. the remainder of
/// the data region) — only the first `cell_len` bytes, as declared by the
/// record itself, are consumed. Length fields are authoritative: the
/// decoder never reads past the declared length of a sub-field.
pub fn decode_cell(bytes: &[u8]) -> Result<DecodedCell> {
    let mut cur = Cursor::new(bytes);

    let cell_len = cur.read_u32::<BigEndian>().context("truncated cell_len")?;

    let key_type = read_len_prefixed_str(&mut cur).context("decoding key_type")?;
    let key_len = cur.read_u32::<BigEndian>().context("truncated key_len")?;
    let mut key_bytes = vec![0u8; key_len as usize];
    cur.read_exact(&mut key_bytes).context("truncated key bytes")?;
    if key_type == TYPE_INT && key_len != 4 {
        bail!("int key must be exactly 4 bytes, got {}", key_len);
    }

    let value_type = read_len_prefixed_str(&mut cur).context("decoding value_type")?;
    let value_len = cur.read_u32::<BigEndian>().context("truncated value_len")?;
    let mut value_bytes = vec![0u8; value_len as usize];
    cur.read_exact(&mut value_bytes).context("truncated value bytes")?;
    if value_type == TYPE_INT && value_len != 4 {
        bail!("int value must be exactly 4 bytes, got {}", value_len);
    }

    Ok(DecodedCell {
        cell_len,
        key_type,
        key_bytes,
        value_type,
        value_bytes,
    })
}

fn read_len_prefixed_str<R: Read>(r: &mut R) -> Result<String> {
    let len = r.read_u32::<BigEndian>().context("truncated type length")?;
    let mut bytes = vec![0u8; len as usize];
    r.read_exact(&mut bytes).context("truncated type bytes")?;
    String::from_utf8(bytes).context("type tag is not valid UTF-8")
}

/// Decodes a UTF-8 string payload, surfacing invalid UTF-8 as an error.
pub fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).context("string payload is not valid UTF-8")
}

#[cfg(test)]
mod tests;
