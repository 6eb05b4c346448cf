//! Domain error kinds surfaced by every public [`crate::Store`] operation.
//!
//! Each variant carries the offending path or key so callers (the CLI) can
//! render a diagnostic without re-deriving context. Integrity failures
//! (checksum mismatch, a link outside the data region, a corrupt
//! free-pointer) are all folded into [`StoreError::NotADataFile`] per the
//! propagation policy: the facade does not distinguish *why* a file failed
//! validation, only that it did.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file '{0}' is not a data file")]
    NotADataFile(String),

    #[error("data file '{0}' already exists")]
    DataFileAlreadyExists(String),

    #[error("file '{0}' doesn't exist")]
    FileMissing(String),

    #[error("the key {0} is already used")]
    UsedKey(String),

    #[error("the data file '{0}' is full")]
    TreeFull(String),

    #[error(
        "there is no memory for your data in data file '{0}' now.\nDelete something to add your data"
    )]
    OutOfMemory(String),

    #[error("the data is too big to store even in an empty data file")]
    PayloadTooBig,

    #[error("there is no data with the key {key} in data file '{file}'")]
    NoSuchKey { file: String, key: String },

    #[error("file '{0}' is not a valid csv file")]
    InvalidCsv(String),
}
