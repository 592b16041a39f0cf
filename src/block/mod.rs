//! The Block Codec: a generic dense ↔ chunked shuttle over a
//! block-addressable store, plus the flattened-view accessor used by
//! matrix-shaped node properties.

mod codec;
mod flattened;
mod geometry;
mod memory_store;
mod store;

pub use codec::{read_dataset, read_dataset_as, read_region, write_dataset};
pub use flattened::Flattened;
pub use geometry::{block_extent, block_start, grid_coords, grid_shape, intersect};
pub use memory_store::MemoryStore;
pub use store::{Block, BlockStore, Compression, DatasetAttributes, StorePath};
