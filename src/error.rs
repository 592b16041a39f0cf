//! The crate's single error currency.
//!
//! Every public function in `geff` returns `Result<T, GeffError>`. Internal
//! modules are free to define narrower error types for their own concerns,
//! but they all convert into `GeffError` at the point they cross back into
//! a public API, keeping each concern's error variants local to its layer.

use std::fmt;

use thiserror::Error;

use crate::element::ElementType;

/// A grid coordinate identifying a single block within a dataset.
pub type BlockCoord = Vec<u64>;

/// Errors produced while reading or writing a GEFF group.
#[derive(Debug, Error)]
pub enum GeffError {
    /// The metadata document is present but lacks a version marker.
    #[error("metadata document at {0:?} has no geff_version")]
    MissingVersion(String),

    /// The version string parsed but its major.minor is not in the
    /// supported set.
    #[error("unsupported geff version {0:?}")]
    UnsupportedVersion(String),

    /// The version string does not parse as a GEFF version.
    #[error("malformed geff version {0:?}")]
    MalformedVersion(String),

    /// A required attribute is absent from the metadata document.
    #[error("missing required attribute {0:?}")]
    MissingRequiredAttribute(String),

    /// A required dataset is absent from the group.
    #[error("missing required dataset {0:?}")]
    MissingRequiredDataset(String),

    /// A column's length disagrees with the record count it must match.
    #[error("length mismatch at {path:?}: expected {expected}, got {actual}")]
    LengthMismatch {
        path: String,
        expected: u64,
        actual: u64,
    },

    /// A dataset's rank differs from what the caller expected.
    #[error("rank mismatch at {path:?}: expected {expected}, got {actual}")]
    RankMismatch {
        path: String,
        expected: usize,
        actual: usize,
    },

    /// An element-type coercion was requested that this crate does not
    /// define (e.g. `string -> i32`).
    #[error("type mismatch at {path:?}: cannot coerce {actual:?} to {requested:?}")]
    TypeMismatch {
        path: String,
        requested: ElementType,
        actual: ElementType,
    },

    /// The underlying block store failed while reading or writing a block.
    /// Not retried; surfaced as-is.
    #[error("block I/O error at {path:?}, block {block:?}")]
    BlockIOError {
        path: String,
        block: BlockCoord,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An axis is malformed: unknown name, type/name mismatch, or
    /// `min > max`.
    #[error("invalid axis: {0}")]
    InvalidAxis(String),

    /// An argument to a public operation violates a stated invariant (e.g.
    /// a color array whose length is not 4).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl GeffError {
    pub(crate) fn block_io(
        path: impl Into<String>,
        block: BlockCoord,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::BlockIOError {
            path: path.into(),
            block,
            cause: Box::new(cause),
        }
    }
}

/// A store error that carries a plain message, for stores (like
/// [`crate::block::MemoryStore`]) that have no richer error model of their
/// own.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(msg: impl fmt::Display) -> Self {
        Self(msg.to_string())
    }
}
