//! # Store — public facade over the container, index tree, and checksum layer
//!
//! This crate is the only thing an embedder or the CLI talks to. It
//! orchestrates [`codec`], [`container`], [`tree`], and [`checksum`]:
//! normalizing user-facing text, enforcing the validity gate, and mapping
//! internal failures onto the domain error kinds in [`error::StoreError`].
//!
//! ## Module responsibilities
//!
//! | Module | Purpose |
//! |---|---|
//! | [`lib`] | `Store` struct, `open`/`init`, accessors, `Debug` |
//! | [`normalize`] | text → typed key/value |
//! | [`add`] | `add`, `add_file`, `add_package` |
//! | [`read`] | `get`, `get_file`, `contains`, `get_all_keys` |
//! | [`erase`] | `erase` |
//! | [`change`] | `change` |
//! | [`validate`] | `check_validity_of_file`, the validity-gate helper |
//! | [`error`] | `StoreError` |
//!
//! The container is single-threaded and synchronous: no operation here
//! suspends, retries, or recovers on the caller's behalf except the
//! batch-ingest path, which routes per-row failures to a caller-supplied
//! callback.

mod add;
mod change;
mod erase;
pub mod error;
mod internal;
mod normalize;
mod read;
mod validate;

use anyhow::Result;
use container::Container;
use std::path::{Path, PathBuf};

pub use change::ValueKind;
pub use error::StoreError;
pub use normalize::Key;
pub use read::Value;

/// A single open container file plus the path it was opened from.
///
/// The path is kept around for diagnostics: error messages name the file.
pub struct Store {
    pub(crate) container: Container,
    pub(crate) path: PathBuf,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").field("path", &self.path).finish()
    }
}

impl Store {
    /// Creates a zero-initialized container at `path`, truncating and
    /// rewriting it from scratch if one is already there. Idempotent: two
    /// successive calls on the same path produce byte-identical files.
    pub fn init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let container = Container::create_empty(&path)?;
        Ok(Self { container, path })
    }

    /// Opens an existing container at `path` without validating it.
    ///
    /// Every operation except `init`/`clear` runs the validity gate
    /// itself before trusting the file, so `open` alone does not
    /// guarantee a usable store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(StoreError::FileMissing(display_path(&path)).into());
        }
        let container = Container::open(&path)?;
        Ok(Self { container, path })
    }

    /// Rewrites the header to the initial state without shrinking the
    /// file. Identical effect to `init` on an already-open container.
    pub fn clear(&mut self) -> Result<()> {
        validate::require_valid(self)?;
        self.container.zero_fill()?;
        Ok(())
    }

    /// Path this store was opened/initialized from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn display_path(&self) -> String {
        display_path(&self.path)
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
