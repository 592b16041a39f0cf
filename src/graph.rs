//! The in-memory graph model and the read/write orchestrator that
//! sequences the metadata, node, and edge codecs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::block::{BlockStore, Compression};
use crate::edge::{self, Edge};
use crate::error::GeffError;
use crate::metadata::{self, Metadata};
use crate::node::{self, Node};
use crate::version;

/// A cell-tracking graph: directedness, optional axis calibration, and
/// the node/edge records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub directed: bool,
    pub axes: Option<Vec<Axis>>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn self_loop_count(&self) -> usize {
        self.edges.iter().filter(|edge| edge.is_self_loop()).count()
    }

    /// The number of edges whose source and target both reference a node
    /// actually present in [`Graph::nodes`].
    #[must_use]
    pub fn valid_edge_count(&self) -> usize {
        let ids: HashSet<i32> = self.nodes.iter().map(|node| node.id).collect();
        self.edges
            .iter()
            .filter(|edge| ids.contains(&edge.source_node_id) && ids.contains(&edge.target_node_id))
            .count()
    }
}

/// Options controlling how a graph is written. There is no global
/// configuration state; every call site passes its options explicitly.
#[derive(Clone, Debug, PartialEq)]
pub struct WriteOptions {
    /// Block size along the record axis of every dataset. Matrix-shaped
    /// properties keep their small axis whole and block only the record
    /// axis by this amount.
    pub chunk_size: u64,
    /// The `geff_version` string to write. Must parse to a supported
    /// major.minor.
    pub version: String,
    /// Passed through to every dataset's [`crate::block::BlockStore::create_dataset`]
    /// call, opaque to this crate.
    pub compression: Compression,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            version: version::DEFAULT_WRITE_VERSION.to_string(),
            compression: Compression::default(),
        }
    }
}

/// Read just the metadata document, without touching node/edge datasets.
///
/// # Errors
/// As [`metadata::read`].
pub fn read_metadata<S: BlockStore + ?Sized>(store: &S) -> Result<Metadata, GeffError> {
    metadata::read(store)
}

/// Read a full graph: metadata first (so an unsupported version fails
/// before any node or edge dataset is touched), then nodes, then edges.
///
/// # Errors
/// Propagates [`metadata::read`], [`node::read`], or [`edge::read`]
/// failures.
pub fn read_graph<S: BlockStore + ?Sized>(store: &S) -> Result<Graph, GeffError> {
    let metadata = metadata::read(store)?;
    let version = metadata.major_minor()?;
    log::info!("reading geff graph at version {:?}", metadata.geff_version);
    let nodes = node::read(store, version)?;
    let edges = edge::read(store)?;
    log::debug!("read {} node(s), {} edge(s)", nodes.len(), edges.len());
    Ok(Graph {
        directed: metadata.directed,
        axes: metadata.axes,
        nodes,
        edges,
    })
}

/// Write a full graph: nodes and edges first, metadata last.
///
/// Writing metadata last means a writer that fails partway through
/// leaves behind a group with no version marker, so a subsequent
/// [`read_graph`]/[`read_metadata`] reports [`GeffError::MissingVersion`]
/// rather than reading a half-written graph as if it were complete.
///
/// # Errors
/// Returns [`GeffError::MalformedVersion`]/[`GeffError::UnsupportedVersion`]
/// if `options.version` does not parse, before anything is written.
/// Otherwise propagates [`node::write`], [`edge::write`], or
/// [`metadata::write`] failures.
pub fn write_graph<S: BlockStore + ?Sized>(store: &S, graph: &Graph, options: &WriteOptions) -> Result<(), GeffError> {
    let major_minor = version::major_minor(&options.version)?;
    log::info!(
        "writing geff graph version {:?}: {} node(s), {} edge(s), chunk size {}",
        options.version,
        graph.nodes.len(),
        graph.edges.len(),
        options.chunk_size
    );

    node::write(store, &graph.nodes, options.chunk_size, options.compression.clone(), major_minor)?;
    edge::write(store, &graph.edges, options.chunk_size, options.compression.clone())?;

    let metadata = Metadata {
        geff_version: options.version.clone(),
        directed: graph.directed,
        axes: graph.axes.clone(),
    };
    log::debug!("writing metadata last to guard against partial writes");
    metadata::write(store, &metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisType;
    use crate::block::MemoryStore;

    fn sample_graph() -> Graph {
        let nodes = vec![Node::new(0, 0, 0.0, 0.0, 0.0), Node::new(1, 1, 1.0, 1.0, 1.0)];
        let edges = vec![Edge::new(0, 0, 1)];
        Graph {
            directed: true,
            axes: Some(vec![Axis::new("t", AxisType::Time, "seconds").unwrap()]),
            nodes,
            edges,
        }
    }

    #[test]
    fn round_trips_a_small_graph() {
        let store = MemoryStore::new();
        let graph = sample_graph();
        write_graph(&store, &graph, &WriteOptions::default()).unwrap();
        let back = read_graph(&store).unwrap();
        assert_eq!(back, graph);
        assert_eq!(back.node_count(), 2);
        assert_eq!(back.edge_count(), 1);
        assert_eq!(back.self_loop_count(), 0);
        assert_eq!(back.valid_edge_count(), 1);
    }

    #[test]
    fn self_loop_round_trips() {
        let store = MemoryStore::new();
        let mut graph = sample_graph();
        graph.edges.push(Edge::new(1, 1, 1));
        write_graph(&store, &graph, &WriteOptions::default()).unwrap();
        let back = read_graph(&store).unwrap();
        assert_eq!(back.self_loop_count(), 1);
        assert!(back.edges[1].is_self_loop());
    }

    #[test]
    fn dangling_edge_is_counted_but_not_valid() {
        let store = MemoryStore::new();
        let mut graph = sample_graph();
        graph.edges.push(Edge::new(2, 0, 999));
        write_graph(&store, &graph, &WriteOptions::default()).unwrap();
        let back = read_graph(&store).unwrap();
        assert_eq!(back.edge_count(), 2);
        assert_eq!(back.valid_edge_count(), 1);
    }

    #[test]
    fn unsupported_version_fails_before_writing_anything() {
        let store = MemoryStore::new();
        let graph = sample_graph();
        let options = WriteOptions {
            version: "1.0".to_string(),
            ..WriteOptions::default()
        };
        let err = write_graph(&store, &graph, &options).unwrap_err();
        assert!(matches!(err, GeffError::UnsupportedVersion(_)));
        assert!(!store.dataset_exists("nodes/ids").unwrap());
    }

    #[test]
    fn chunk_boundary_round_trips_fifteen_nodes() {
        let store = MemoryStore::new();
        let nodes: Vec<Node> = (0..15).map(|i| Node::new(i, i, f64::from(i), 0.0, 0.0)).collect();
        let graph = Graph {
            directed: false,
            axes: None,
            nodes,
            edges: vec![],
        };
        let options = WriteOptions {
            chunk_size: 4,
            ..WriteOptions::default()
        };
        write_graph(&store, &graph, &options).unwrap();
        let back = read_graph(&store).unwrap();
        assert_eq!(back.node_count(), 15);
        assert_eq!(back, graph);
    }
}
