//! The Edge Codec: projects edge records to/from
//! `edges/ids` + `edges/props/*/values`.
//!
//! An edge's id is never stored on disk; it is its position in
//! `edges/ids`, assigned sequentially on read.

use serde::{Deserialize, Serialize};

use crate::block::{read_dataset, read_dataset_as, write_dataset, BlockStore, Compression};
use crate::element::{ElementType, Elements};
use crate::error::GeffError;

pub const DEFAULT_SCORE: f64 = -1.0;
pub const DEFAULT_DISTANCE: f64 = -1.0;

/// A single edge record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Edge {
    pub id: i32,
    pub source_node_id: i32,
    pub target_node_id: i32,
    pub score: f64,
    pub distance: f64,
}

fn f64_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.source_node_id == other.source_node_id
            && self.target_node_id == other.target_node_id
            && f64_eq(self.score, other.score)
            && f64_eq(self.distance, other.distance)
    }
}

impl Edge {
    #[must_use]
    pub fn new(id: i32, source_node_id: i32, target_node_id: i32) -> Self {
        Self {
            id,
            source_node_id,
            target_node_id,
            score: DEFAULT_SCORE,
            distance: DEFAULT_DISTANCE,
        }
    }

    /// Whether this edge's endpoints are the same node.
    #[must_use]
    pub fn is_self_loop(&self) -> bool {
        self.source_node_id == self.target_node_id
    }
}

const IDS_PATH: &str = "edges/ids";
const SCORE_PATH: &str = "edges/props/score/values";
const DISTANCE_PATH: &str = "edges/props/distance/values";

fn check_length(path: &str, actual: u64, expected: u64) -> Result<(), GeffError> {
    if actual != expected {
        return Err(GeffError::LengthMismatch {
            path: path.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn read_optional_f64(store: &dyn BlockStore, path: &str, n: u64, default: f64) -> Result<Vec<f64>, GeffError> {
    if !store.dataset_exists(path)? {
        return Ok(vec![default; n as usize]);
    }
    let data = read_dataset_as(store, path, ElementType::F64)?.into_f64().unwrap();
    check_length(path, data.len() as u64, n)?;
    Ok(data)
}

/// Read the edges collection.
///
/// # Errors
/// - [`GeffError::MissingRequiredDataset`] if `edges/ids` is absent.
/// - [`GeffError::RankMismatch`] if `edges/ids` is not rank 2 with a
///   leading dimension of 2.
/// - [`GeffError::LengthMismatch`] if `score`/`distance` disagree with `E`.
pub fn read<S: BlockStore + ?Sized>(store: &S) -> Result<Vec<Edge>, GeffError> {
    if !store.dataset_exists(IDS_PATH)? {
        return Err(GeffError::MissingRequiredDataset(IDS_PATH.to_string()));
    }
    let attrs = store.dataset_attributes(IDS_PATH)?;
    if attrs.rank() != 2 || attrs.dimensions[0] != 2 {
        return Err(GeffError::RankMismatch {
            path: IDS_PATH.to_string(),
            expected: 2,
            actual: attrs.rank(),
        });
    }
    let e = attrs.dimensions[1];

    let (raw, _) = read_dataset(store, IDS_PATH)?;
    let raw = crate::element::coerce(&raw, ElementType::I32, IDS_PATH)?.into_i32().unwrap();

    let score = read_optional_f64(store, SCORE_PATH, e, DEFAULT_SCORE)?;
    let distance = read_optional_f64(store, DISTANCE_PATH, e, DEFAULT_DISTANCE)?;

    let mut edges = Vec::with_capacity(e as usize);
    for i in 0..e as usize {
        edges.push(Edge {
            id: i as i32,
            source_node_id: raw[2 * i],
            target_node_id: raw[2 * i + 1],
            score: score[i],
            distance: distance[i],
        });
    }
    Ok(edges)
}

/// Write the edges collection. Edge ids are not persisted; an edge's
/// position in `edges` determines its id on the next read.
pub fn write<S: BlockStore + ?Sized>(store: &S, edges: &[Edge], chunk_size: u64, compression: Compression) -> Result<(), GeffError> {
    let e = edges.len() as u64;

    let mut ids_buf = Vec::with_capacity(2 * e as usize);
    for edge in edges {
        ids_buf.push(edge.source_node_id);
        ids_buf.push(edge.target_node_id);
    }
    write_dataset(store, IDS_PATH, &[2, e], &[2, chunk_size], ElementType::I32, compression.clone(), &Elements::I32(ids_buf))?;
    write_dataset(
        store,
        SCORE_PATH,
        &[e],
        &[chunk_size],
        ElementType::F64,
        compression.clone(),
        &Elements::F64(edges.iter().map(|edge| edge.score).collect()),
    )?;
    write_dataset(
        store,
        DISTANCE_PATH,
        &[e],
        &[chunk_size],
        ElementType::F64,
        compression,
        &Elements::F64(edges.iter().map(|edge| edge.distance).collect()),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemoryStore;

    #[test]
    fn round_trips_assigning_sequential_ids() {
        let store = MemoryStore::new();
        let mut edges = vec![Edge::new(99, 0, 1), Edge::new(42, 1, 2)];
        edges[0].score = 0.9;
        edges[0].distance = 3.5;
        write(&store, &edges, 1000, Compression::default()).unwrap();
        let back = read(&store).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].id, 0);
        assert_eq!(back[1].id, 1);
        assert_eq!(back[0].source_node_id, 0);
        assert_eq!(back[0].target_node_id, 1);
        assert_eq!(back[0].score, 0.9);
        assert_eq!(back[0].distance, 3.5);
    }

    #[test]
    fn self_loop_is_detected() {
        let edge = Edge::new(0, 5, 5);
        assert!(edge.is_self_loop());
        let edge = Edge::new(0, 5, 6);
        assert!(!edge.is_self_loop());
    }

    #[test]
    fn missing_score_and_distance_default() {
        let store = MemoryStore::new();
        let edges = vec![Edge::new(0, 0, 1)];
        write(&store, &edges, 1000, Compression::default()).unwrap();
        let back = read(&store).unwrap();
        assert_eq!(back[0].score, DEFAULT_SCORE);
        assert_eq!(back[0].distance, DEFAULT_DISTANCE);
    }

    #[test]
    fn chunk_boundary_preserves_order() {
        let store = MemoryStore::new();
        let edges: Vec<Edge> = (0..15).map(|i| Edge::new(i, i, i + 1)).collect();
        write(&store, &edges, 4, Compression::default()).unwrap();
        let back = read(&store).unwrap();
        assert_eq!(back.len(), 15);
        for (i, edge) in back.iter().enumerate() {
            assert_eq!(edge.source_node_id, i as i32);
            assert_eq!(edge.target_node_id, i as i32 + 1);
        }
    }

    #[test]
    fn empty_edge_set_round_trips() {
        let store = MemoryStore::new();
        write(&store, &[], 1000, Compression::default()).unwrap();
        let back = read(&store).unwrap();
        assert!(back.is_empty());
    }
}
