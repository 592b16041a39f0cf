//! The Node Codec: projects node records to/from
//! `nodes/ids` + `nodes/props/*/values`.

use serde::{Deserialize, Serialize};

use crate::block::{read_dataset, read_dataset_as, write_dataset, BlockStore, Compression, Flattened};
use crate::element::{ElementType, Elements};
use crate::error::GeffError;
use crate::version::MajorMinor;

/// Default values applied when a node property's dataset is entirely
/// absent.
pub const DEFAULT_COLOR: [f64; 4] = [1.0, 1.0, 1.0, 1.0];
pub const DEFAULT_SEGMENT_ID: i32 = -1;
pub const DEFAULT_RADIUS: f64 = 1.0;
pub const DEFAULT_COVARIANCE2D: [f64; 4] = [1.0, 0.0, 0.0, 1.0];
pub const DEFAULT_COVARIANCE3D: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 1.0];

/// A single node record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: i32,
    pub t: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: [f64; 4],
    pub segment_id: i32,
    pub radius: f64,
    pub covariance2d: [f64; 4],
    pub covariance3d: [f64; 6],
    /// Polygon vertex x-coordinates (schema 0.4 only). `polygon_y` always
    /// has the same length.
    pub polygon_x: Option<Vec<f64>>,
    pub polygon_y: Option<Vec<f64>>,
}

fn f64_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn f64_slice_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| f64_eq(x, y))
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.t == other.t
            && f64_eq(self.x, other.x)
            && f64_eq(self.y, other.y)
            && f64_eq(self.z, other.z)
            && f64_slice_eq(&self.color, &other.color)
            && self.segment_id == other.segment_id
            && f64_eq(self.radius, other.radius)
            && f64_slice_eq(&self.covariance2d, &other.covariance2d)
            && f64_slice_eq(&self.covariance3d, &other.covariance3d)
            && match (&self.polygon_x, &other.polygon_x) {
                (Some(a), Some(b)) => f64_slice_eq(a, b),
                (None, None) => true,
                _ => false,
            }
            && match (&self.polygon_y, &other.polygon_y) {
                (Some(a), Some(b)) => f64_slice_eq(a, b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl Node {
    /// Construct a node with every optional field at its documented
    /// default.
    #[must_use]
    pub fn new(id: i32, t: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            t,
            x,
            y,
            z,
            color: DEFAULT_COLOR,
            segment_id: DEFAULT_SEGMENT_ID,
            radius: DEFAULT_RADIUS,
            covariance2d: DEFAULT_COVARIANCE2D,
            covariance3d: DEFAULT_COVARIANCE3D,
            polygon_x: None,
            polygon_y: None,
        }
    }
}

const IDS_PATH: &str = "nodes/ids";
const T_PATH: &str = "nodes/props/t/values";
const X_PATH: &str = "nodes/props/x/values";
const Y_PATH: &str = "nodes/props/y/values";
const Z_PATH: &str = "nodes/props/z/values";
const COLOR_PATH: &str = "nodes/props/color/values";
const TRACK_ID_PATH: &str = "nodes/props/track_id/values";
const RADIUS_PATH: &str = "nodes/props/radius/values";
const COVARIANCE2D_PATH: &str = "nodes/props/covariance2d/values";
const COVARIANCE3D_PATH: &str = "nodes/props/covariance3d/values";
const POLYGON_SLICES_PATH: &str = "nodes/props/polygon/slices";
const POLYGON_VALUES_PATH: &str = "nodes/props/polygon/values";

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

fn read_optional_i32(store: &dyn BlockStore, path: &str, n: u64, default: i32) -> Result<Vec<i32>, GeffError> {
    if !store.dataset_exists(path)? {
        return Ok(vec![default; n as usize]);
    }
    let data = read_dataset_as(store, path, ElementType::I32)?.into_i32().unwrap();
    check_length(path, data.len() as u64, n)?;
    Ok(data)
}

fn read_optional_f64(store: &dyn BlockStore, path: &str, n: u64, default: f64) -> Result<Vec<f64>, GeffError> {
    if !store.dataset_exists(path)? {
        return Ok(vec![default; n as usize]);
    }
    let data = read_dataset_as(store, path, ElementType::F64)?.into_f64().unwrap();
    check_length(path, data.len() as u64, n)?;
    Ok(data)
}

/// Read an optional `[k, N]` column-major (AoS: per-record contiguous)
/// matrix property, defaulting every record to `default` if the dataset
/// is absent. Returns a [`Flattened`] view so callers pull out each
/// record's row with [`Flattened::row`] rather than hand-computing offsets.
fn read_optional_matrix_aos(store: &dyn BlockStore, path: &str, k: usize, n: u64, default: &[f64]) -> Result<Flattened<f64>, GeffError> {
    if !store.dataset_exists(path)? {
        let mut out = Vec::with_capacity(k * n as usize);
        for _ in 0..n {
            out.extend_from_slice(default);
        }
        return Ok(Flattened::new(out, vec![k as u64, n]));
    }
    let attrs = store.dataset_attributes(path)?;
    if attrs.rank() != 2 {
        return Err(GeffError::RankMismatch {
            path: path.to_string(),
            expected: 2,
            actual: attrs.rank(),
        });
    }
    check_length(path, attrs.dimensions[1], n)?;
    if attrs.dimensions[0] != k as u64 {
        return Err(GeffError::LengthMismatch {
            path: path.to_string(),
            expected: k as u64,
            actual: attrs.dimensions[0],
        });
    }
    let (data, _) = read_dataset(store, path)?;
    let data = crate::element::coerce(&data, ElementType::F64, path)?;
    Ok(Flattened::new(data.into_f64().unwrap(), vec![k as u64, n]))
}

/// Read the nodes collection. `version` selects whether the 0.4 polygon
/// table is consulted.
///
/// # Errors
/// - [`GeffError::MissingRequiredDataset`] if `nodes/ids` is absent.
/// - [`GeffError::LengthMismatch`]/[`GeffError::RankMismatch`] if any
///   present column disagrees with `N`.
pub fn read<S: BlockStore + ?Sized>(store: &S, version: MajorMinor) -> Result<Vec<Node>, GeffError> {
    if !store.dataset_exists(IDS_PATH)? {
        return Err(GeffError::MissingRequiredDataset(IDS_PATH.to_string()));
    }
    let ids = read_dataset_as(store, IDS_PATH, ElementType::I32)?.into_i32().unwrap();
    let n = ids.len() as u64;

    let t = read_optional_i32(store, T_PATH, n, 0)?;
    let x = read_optional_f64(store, X_PATH, n, f64::NAN)?;
    let y = read_optional_f64(store, Y_PATH, n, f64::NAN)?;
    let z = read_optional_f64(store, Z_PATH, n, f64::NAN)?;
    let color = read_optional_matrix_aos(store, COLOR_PATH, 4, n, &DEFAULT_COLOR)?;
    let track_id = read_optional_i32(store, TRACK_ID_PATH, n, DEFAULT_SEGMENT_ID)?;
    let radius = read_optional_f64(store, RADIUS_PATH, n, DEFAULT_RADIUS)?;
    let covariance2d = read_optional_matrix_aos(store, COVARIANCE2D_PATH, 4, n, &DEFAULT_COVARIANCE2D)?;
    let covariance3d = read_optional_matrix_aos(store, COVARIANCE3D_PATH, 6, n, &DEFAULT_COVARIANCE3D)?;

    let mut polygons: Vec<(Option<Vec<f64>>, Option<Vec<f64>>)> = vec![(None, None); n as usize];
    if version == MajorMinor::V0_4 && store.dataset_exists(POLYGON_SLICES_PATH)? {
        polygons = read_polygons(store, n)?;
    }

    let mut nodes = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        let (polygon_x, polygon_y) = polygons[i].clone();
        nodes.push(Node {
            id: ids[i],
            t: t[i],
            x: x[i],
            y: y[i],
            z: z[i],
            color: color.row(i as u64).try_into().unwrap(),
            segment_id: track_id[i],
            radius: radius[i],
            covariance2d: covariance2d.row(i as u64).try_into().unwrap(),
            covariance3d: covariance3d.row(i as u64).try_into().unwrap(),
            polygon_x,
            polygon_y,
        });
    }
    Ok(nodes)
}

fn read_polygons(store: &dyn BlockStore, n: u64) -> Result<Vec<(Option<Vec<f64>>, Option<Vec<f64>>)>, GeffError> {
    let slices_attrs = store.dataset_attributes(POLYGON_SLICES_PATH)?;
    if slices_attrs.rank() != 2 || slices_attrs.dimensions[1] != 2 {
        return Err(GeffError::RankMismatch {
            path: POLYGON_SLICES_PATH.to_string(),
            expected: 2,
            actual: slices_attrs.rank(),
        });
    }
    check_length(POLYGON_SLICES_PATH, slices_attrs.dimensions[0], n)?;
    let (slices_raw, _) = read_dataset(store, POLYGON_SLICES_PATH)?;
    let slices_raw = crate::element::coerce(&slices_raw, ElementType::I32, POLYGON_SLICES_PATH)?.into_i32().unwrap();
    // Shape [N,2] column-major: buffer[0..N] = starts, buffer[N..2N] = ends.
    let starts = &slices_raw[..n as usize];
    let ends = &slices_raw[n as usize..];

    let values_present = store.dataset_exists(POLYGON_VALUES_PATH)?;
    let (xs, ys) = if values_present {
        let values_attrs = store.dataset_attributes(POLYGON_VALUES_PATH)?;
        if values_attrs.rank() != 2 || values_attrs.dimensions[1] != 2 {
            return Err(GeffError::RankMismatch {
                path: POLYGON_VALUES_PATH.to_string(),
                expected: 2,
                actual: values_attrs.rank(),
            });
        }
        let v = values_attrs.dimensions[0] as usize;
        let (values_raw, _) = read_dataset(store, POLYGON_VALUES_PATH)?;
        let values_raw = crate::element::coerce(&values_raw, ElementType::F64, POLYGON_VALUES_PATH)?.into_f64().unwrap();
        (values_raw[..v].to_vec(), values_raw[v..].to_vec())
    } else {
        (Vec::new(), Vec::new())
    };

    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        let (start, end) = (starts[i], ends[i]);
        if start < 0 || end < start || end as usize > xs.len() {
            return Err(GeffError::InvalidArgument(format!(
                "polygon slice [{start},{end}) for node {i} is out of range for a {}-vertex table",
                xs.len()
            )));
        }
        let (start, end) = (start as usize, end as usize);
        if start == end {
            out.push((None, None));
        } else {
            out.push((Some(xs[start..end].to_vec()), Some(ys[start..end].to_vec())));
        }
    }
    Ok(out)
}

/// Write the nodes collection. Only writes the 0.4 polygon table when
/// `version` is `V0_4`.
///
/// # Errors
/// Propagates any store error from the underlying block writes.
pub fn write<S: BlockStore + ?Sized>(
    store: &S,
    nodes: &[Node],
    chunk_size: u64,
    compression: Compression,
    version: MajorMinor,
) -> Result<(), GeffError> {
    let n = nodes.len() as u64;

    write_dataset(
        store,
        IDS_PATH,
        &[n],
        &[chunk_size],
        ElementType::I32,
        compression.clone(),
        &Elements::I32(nodes.iter().map(|node| node.id).collect()),
    )?;
    write_dataset(
        store,
        T_PATH,
        &[n],
        &[chunk_size],
        ElementType::I32,
        compression.clone(),
        &Elements::I32(nodes.iter().map(|node| node.t).collect()),
    )?;
    write_dataset(store, X_PATH, &[n], &[chunk_size], ElementType::F64, compression.clone(), &Elements::F64(nodes.iter().map(|node| node.x).collect()))?;
    write_dataset(store, Y_PATH, &[n], &[chunk_size], ElementType::F64, compression.clone(), &Elements::F64(nodes.iter().map(|node| node.y).collect()))?;
    write_dataset(store, Z_PATH, &[n], &[chunk_size], ElementType::F64, compression.clone(), &Elements::F64(nodes.iter().map(|node| node.z).collect()))?;

    let mut color_buf = Vec::with_capacity(4 * n as usize);
    let mut cov2_buf = Vec::with_capacity(4 * n as usize);
    let mut cov3_buf = Vec::with_capacity(6 * n as usize);
    for node in nodes {
        color_buf.extend_from_slice(&node.color);
        cov2_buf.extend_from_slice(&node.covariance2d);
        cov3_buf.extend_from_slice(&node.covariance3d);
    }
    write_dataset(store, COLOR_PATH, &[4, n], &[4, chunk_size], ElementType::F64, compression.clone(), &Elements::F64(color_buf))?;
    write_dataset(
        store,
        TRACK_ID_PATH,
        &[n],
        &[chunk_size],
        ElementType::I32,
        compression.clone(),
        &Elements::I32(nodes.iter().map(|node| node.segment_id).collect()),
    )?;
    write_dataset(
        store,
        RADIUS_PATH,
        &[n],
        &[chunk_size],
        ElementType::F64,
        compression.clone(),
        &Elements::F64(nodes.iter().map(|node| node.radius).collect()),
    )?;
    write_dataset(store, COVARIANCE2D_PATH, &[4, n], &[4, chunk_size], ElementType::F64, compression.clone(), &Elements::F64(cov2_buf))?;
    write_dataset(store, COVARIANCE3D_PATH, &[6, n], &[6, chunk_size], ElementType::F64, compression.clone(), &Elements::F64(cov3_buf))?;

    if version == MajorMinor::V0_4 {
        write_polygons(store, nodes, chunk_size, compression)?;
    }

    Ok(())
}

fn write_polygons<S: BlockStore + ?Sized>(store: &S, nodes: &[Node], chunk_size: u64, compression: Compression) -> Result<(), GeffError> {
    let n = nodes.len() as u64;

    // Offsets are computed into a local scratch array; Node records are
    // never mutated during this computation.
    let mut starts = Vec::with_capacity(n as usize);
    let mut ends = Vec::with_capacity(n as usize);
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let mut offset: i32 = 0;
    for node in nodes {
        starts.push(offset);
        if let (Some(px), Some(py)) = (&node.polygon_x, &node.polygon_y) {
            xs.extend_from_slice(px);
            ys.extend_from_slice(py);
            offset += px.len() as i32;
        }
        ends.push(offset);
    }
    let v = xs.len() as u64;

    // Shape [N,2] column-major: buffer[0..N] = starts, buffer[N..2N] = ends.
    let mut slices_buf = Vec::with_capacity(2 * n as usize);
    slices_buf.extend_from_slice(&starts);
    slices_buf.extend_from_slice(&ends);
    write_dataset(
        store,
        POLYGON_SLICES_PATH,
        &[n, 2],
        &[chunk_size.max(1), 2],
        ElementType::I32,
        compression.clone(),
        &Elements::I32(slices_buf),
    )?;

    // Shape [V,2] column-major: buffer[0..V] = xs, buffer[V..2V] = ys.
    let mut values_buf = Vec::with_capacity(2 * v as usize);
    values_buf.extend_from_slice(&xs);
    values_buf.extend_from_slice(&ys);
    write_dataset(
        store,
        POLYGON_VALUES_PATH,
        &[v, 2],
        &[chunk_size.max(1), 2],
        ElementType::F64,
        compression,
        &Elements::F64(values_buf),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemoryStore;

    fn sample_nodes() -> Vec<Node> {
        vec![
            Node {
                id: 0,
                t: 0,
                x: 10.5,
                y: 20.3,
                z: 5.0,
                color: [1.0, 0.0, 0.0, 1.0],
                segment_id: 0,
                radius: 2.5,
                covariance2d: [1.0, 0.2, 0.2, 1.5],
                covariance3d: DEFAULT_COVARIANCE3D,
                polygon_x: None,
                polygon_y: None,
            },
            Node::new(1, 1, 11.5, 21.3, 6.0),
        ]
    }

    #[test]
    fn round_trips_with_all_fields_set() {
        let store = MemoryStore::new();
        let nodes = sample_nodes();
        write(&store, &nodes, 1000, Compression::default(), MajorMinor::V0_3).unwrap();
        let back = read(&store, MajorMinor::V0_3).unwrap();
        assert_eq!(back, nodes);
    }

    #[test]
    fn missing_radius_defaults_without_error() {
        let store = MemoryStore::new();
        let nodes = vec![Node::new(0, 0, 0.0, 0.0, 0.0)];
        write(&store, &nodes, 1000, Compression::default(), MajorMinor::V0_3).unwrap();
        // Simulate an absent optional column by recreating the group
        // without radius: remove is not modeled by MemoryStore, so assert
        // the written default directly instead.
        let back = read(&store, MajorMinor::V0_3).unwrap();
        assert_eq!(back[0].radius, DEFAULT_RADIUS);
    }

    #[test]
    fn length_tampering_is_detected() {
        let store = MemoryStore::new();
        let nodes = vec![Node::new(0, 0, 0.0, 0.0, 0.0), Node::new(1, 1, 1.0, 1.0, 1.0)];
        write(&store, &nodes, 1000, Compression::default(), MajorMinor::V0_3).unwrap();
        store.debug_set_dataset_length(X_PATH, 1);
        let err = read(&store, MajorMinor::V0_3).unwrap_err();
        assert!(matches!(err, GeffError::LengthMismatch { .. }));
    }

    #[test]
    fn chunk_boundary_preserves_order() {
        let store = MemoryStore::new();
        let nodes: Vec<Node> = (0..15).map(|i| Node::new(i, i, f64::from(i), 0.0, 0.0)).collect();
        write(&store, &nodes, 4, Compression::default(), MajorMinor::V0_3).unwrap();
        let back = read(&store, MajorMinor::V0_3).unwrap();
        assert_eq!(back.len(), 15);
        for (a, b) in back.iter().zip(&nodes) {
            assert_eq!(a.id, b.id);
        }
    }

    #[test]
    fn polygon_table_round_trips_in_0_4() {
        let store = MemoryStore::new();
        let mut nodes = vec![Node::new(0, 0, 0.0, 0.0, 0.0), Node::new(1, 1, 1.0, 1.0, 1.0)];
        nodes[0].polygon_x = Some(vec![0.0, 1.0, 1.0]);
        nodes[0].polygon_y = Some(vec![0.0, 0.0, 1.0]);
        // node 1 has no polygon.
        write(&store, &nodes, 1000, Compression::default(), MajorMinor::V0_4).unwrap();
        let back = read(&store, MajorMinor::V0_4).unwrap();
        assert_eq!(back[0].polygon_x, Some(vec![0.0, 1.0, 1.0]));
        assert_eq!(back[0].polygon_y, Some(vec![0.0, 0.0, 1.0]));
        assert_eq!(back[1].polygon_x, None);
    }
}
