//! `geff`: read and write cell-tracking graphs in the Graph Exchange File
//! Format.
//!
//! A GEFF group stores a directed or undirected graph as a set of
//! chunked arrays: one dataset per node/edge property, plus a metadata
//! document describing the format version, directedness, and optional
//! spatial/temporal axis calibration. This crate is generic over the
//! underlying chunked array store via [`BlockStore`]; it does not itself
//! talk to Zarr v2, N5, or any other on-disk format.
//!
//! ```
//! use geff::{read_graph, write_graph, Edge, Graph, MemoryStore, Node, WriteOptions};
//!
//! let store = MemoryStore::new();
//! let graph = Graph {
//!     directed: true,
//!     axes: None,
//!     nodes: vec![Node::new(0, 0, 0.0, 0.0, 0.0), Node::new(1, 1, 1.0, 1.0, 1.0)],
//!     edges: vec![Edge::new(0, 0, 1)],
//! };
//! write_graph(&store, &graph, &WriteOptions::default()).unwrap();
//! let back = read_graph(&store).unwrap();
//! assert_eq!(back.node_count(), 2);
//! ```

mod axis;
mod block;
mod edge;
mod element;
mod error;
mod graph;
mod metadata;
mod node;
mod value;
mod version;

pub use axis::{Axis, AxisType};
pub use block::{Block, BlockStore, Compression, DatasetAttributes, Flattened, MemoryStore};
pub use edge::{Edge, DEFAULT_DISTANCE, DEFAULT_SCORE};
pub use element::{coerce, ElementType, Elements};
pub use error::{BlockCoord, GeffError, StoreError};
pub use graph::{read_graph, read_metadata, write_graph, Graph, WriteOptions};
pub use metadata::Metadata;
pub use node::{
    Node, DEFAULT_COLOR, DEFAULT_COVARIANCE2D, DEFAULT_COVARIANCE3D, DEFAULT_RADIUS, DEFAULT_SEGMENT_ID,
};
pub use value::Value;
pub use version::{is_supported, major_minor, normalize, MajorMinor, DEFAULT_WRITE_VERSION};
