//! The block store abstraction.
//!
//! This is the Rust rendering of the underlying block store this crate
//! consumes but never implements against real storage, collapsed to the
//! single synchronous interface this crate needs — grounded on the
//! teacher's `ReadableStorageTraits`/`WritableStorageTraits` split
//! (`storage/storage_sync.rs`), minus the byte-range/listing/erase methods
//! GEFF never uses.
//!
//! Concrete Zarr v2/N5 filesystem backings are out of scope for this crate;
//! callers bring their own [`BlockStore`] implementation. A
//! [`crate::block::MemoryStore`] test double ships for tests and examples.

use std::fmt;

use crate::element::ElementType;
use crate::error::GeffError;
use crate::value::Value;

/// An opaque compression handle, passed through to [`BlockStore::create_dataset`]
/// without inspection. The store, not this crate, is responsible for
/// actually compressing/decompressing block bytes.
#[derive(Clone, Debug, PartialEq)]
pub enum Compression {
    /// The default: Blosc, with store-defined parameters.
    Blosc(Value),
    /// No compression.
    Raw,
    /// Any other compressor, identified and configured by the store.
    Other(Value),
}

impl Default for Compression {
    fn default() -> Self {
        Compression::Blosc(Value::Null)
    }
}

/// The static attributes of a dataset: shape, block geometry, element type,
/// and compression handle.
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetAttributes {
    pub dimensions: Vec<u64>,
    pub block_size: Vec<u64>,
    pub element_type: ElementType,
    pub compression: Compression,
}

impl DatasetAttributes {
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }
}

/// A single block, as returned by [`BlockStore::read_block`] or accepted by
/// [`BlockStore::write_block`].
///
/// `data` is laid out in column-major order at `element_type`'s native
/// size, covering exactly `size` (which may be shorter than `block_size`
/// along any axis for a boundary block).
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub size: Vec<u64>,
    pub data: crate::element::Elements,
}

/// A path within a group, e.g. `"nodes/ids"`.
pub type StorePath<'a> = &'a str;

/// The block store trait this crate is generic over.
///
/// Implementations back a group in a Zarr v2 store, an N5 store, or
/// anything else with the same block-addressable shape. Every method takes
/// a path relative to the group root; implementations normalize path
/// separators to `/`, stripping any leading slash.
pub trait BlockStore {
    /// Does the group at `path` exist?
    fn group_exists(&self, path: StorePath) -> Result<bool, GeffError>;

    /// Does the dataset at `path` exist?
    fn dataset_exists(&self, path: StorePath) -> Result<bool, GeffError>;

    /// The raw attribute document at `path` (a group or dataset), as a
    /// typed [`Value`] tree. Returns `Value::Null` (not an error) if no
    /// attributes have been set.
    fn attributes(&self, path: StorePath) -> Result<Value, GeffError>;

    /// Fetch a single attribute by dotted `key` (e.g. `"geff/geff_version"`).
    /// Returns `None` if absent.
    fn get_attribute(&self, path: StorePath, key: &str) -> Result<Option<Value>, GeffError>;

    /// Set a single attribute by dotted `key`, merging into the existing
    /// attribute document.
    fn set_attribute(&self, path: StorePath, key: &str, value: Value) -> Result<(), GeffError>;

    /// The static attributes of an existing dataset.
    fn dataset_attributes(&self, path: StorePath) -> Result<DatasetAttributes, GeffError>;

    /// Create a dataset at `path` with the given attributes. Replaces any
    /// existing dataset at that path; datasets are never mutated in place.
    fn create_dataset(&self, path: StorePath, attrs: DatasetAttributes) -> Result<(), GeffError>;

    /// Read one block at grid coordinate `grid_coord`.
    fn read_block(&self, path: StorePath, attrs: &DatasetAttributes, grid_coord: &[u64]) -> Result<Block, GeffError>;

    /// Write one block at grid coordinate `grid_coord`.
    fn write_block(&self, path: StorePath, attrs: &DatasetAttributes, grid_coord: &[u64], block: Block) -> Result<(), GeffError>;
}

impl fmt::Debug for dyn BlockStore + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn BlockStore")
    }
}
