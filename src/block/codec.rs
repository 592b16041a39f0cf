//! The dense-buffer ↔ chunked-store shuttle.
//!
//! [`write_dataset`] splits a dense, column-major buffer into store blocks.
//! [`read_region`] (and [`read_dataset`], its whole-dataset specialization)
//! reconstructs a dense buffer from store blocks, intersecting each block's
//! covered interval with the requested region so that partial reads and
//! full reads share one code path.

use crate::element::{coerce, Elements, ElementType};
use crate::error::GeffError;

use super::geometry::{block_extent, block_start, column_major_strides, grid_coords, grid_shape, intersect};
use super::store::{Block, BlockStore, Compression, DatasetAttributes};

fn zero_elements(element_type: ElementType, len: usize) -> Elements {
    match element_type {
        ElementType::I8 => Elements::I8(vec![0; len]),
        ElementType::U8 => Elements::U8(vec![0; len]),
        ElementType::I16 => Elements::I16(vec![0; len]),
        ElementType::U16 => Elements::U16(vec![0; len]),
        ElementType::I32 => Elements::I32(vec![0; len]),
        ElementType::U32 => Elements::U32(vec![0; len]),
        ElementType::I64 => Elements::I64(vec![0; len]),
        ElementType::U64 => Elements::U64(vec![0; len]),
        ElementType::F32 => Elements::F32(vec![0.0; len]),
        ElementType::F64 => Elements::F64(vec![0.0; len]),
        ElementType::String => Elements::String(vec![String::new(); len]),
        ElementType::Object => Elements::Object(vec![crate::value::Value::Null; len]),
    }
}

/// Copy the `copy_shape` sub-rectangle of `src` (column-major per
/// `src_shape`, read starting at `src_offset`) into `dst` (column-major per
/// `dst_shape`, written starting at `dst_offset`). `src` and `dst` must
/// hold the same [`ElementType`].
fn copy_region(
    src: &Elements,
    src_shape: &[u64],
    src_offset: &[u64],
    dst: &mut Elements,
    dst_shape: &[u64],
    dst_offset: &[u64],
    copy_shape: &[u64],
) {
    debug_assert_eq!(src.element_type(), dst.element_type());
    let src_strides = column_major_strides(src_shape);
    let dst_strides = column_major_strides(dst_shape);

    macro_rules! run {
        ($src_vec:expr, $dst_vec:expr) => {{
            for idx in grid_coords(copy_shape) {
                let mut s = 0u64;
                let mut d = 0u64;
                for i in 0..idx.len() {
                    s += (src_offset[i] + idx[i]) * src_strides[i];
                    d += (dst_offset[i] + idx[i]) * dst_strides[i];
                }
                $dst_vec[d as usize] = $src_vec[s as usize].clone();
            }
        }};
    }

    match (src, dst) {
        (Elements::I8(s), Elements::I8(d)) => run!(s, d),
        (Elements::U8(s), Elements::U8(d)) => run!(s, d),
        (Elements::I16(s), Elements::I16(d)) => run!(s, d),
        (Elements::U16(s), Elements::U16(d)) => run!(s, d),
        (Elements::I32(s), Elements::I32(d)) => run!(s, d),
        (Elements::U32(s), Elements::U32(d)) => run!(s, d),
        (Elements::I64(s), Elements::I64(d)) => run!(s, d),
        (Elements::U64(s), Elements::U64(d)) => run!(s, d),
        (Elements::F32(s), Elements::F32(d)) => run!(s, d),
        (Elements::F64(s), Elements::F64(d)) => run!(s, d),
        (Elements::String(s), Elements::String(d)) => run!(s, d),
        (Elements::Object(s), Elements::Object(d)) => run!(s, d),
        _ => unreachable!("copy_region requires matching element types"),
    }
}

/// Write `data` (a dense, column-major buffer over `dimensions`) to `path`,
/// creating the dataset and splitting it into `block_size`-shaped store
/// blocks. `data` is coerced to `element_type` first if it does not already
/// hold that type.
pub fn write_dataset<S: BlockStore + ?Sized>(
    store: &S,
    path: &str,
    dimensions: &[u64],
    block_size: &[u64],
    element_type: ElementType,
    compression: Compression,
    data: &Elements,
) -> Result<(), GeffError> {
    let data = if data.element_type() == element_type {
        data.clone()
    } else {
        coerce(data, element_type, path)?
    };

    let expected_len: u64 = dimensions.iter().product();
    if data.len() as u64 != expected_len {
        return Err(GeffError::InvalidArgument(format!(
            "buffer for {path:?} has {} elements, expected {expected_len} for shape {dimensions:?}",
            data.len()
        )));
    }

    let attrs = DatasetAttributes {
        dimensions: dimensions.to_vec(),
        block_size: block_size.to_vec(),
        element_type,
        compression,
    };
    store.create_dataset(path, attrs.clone())?;

    let rank = dimensions.len();
    let grid = grid_shape(dimensions, block_size);
    let block_count: u64 = grid.iter().product();
    log::debug!("writing {path:?}: shape {dimensions:?}, block size {block_size:?}, {block_count} block(s)");
    for g in grid_coords(&grid) {
        let b_start = block_start(&g, block_size);
        let b_extent = block_extent(dimensions, block_size, &g);
        let n: u64 = b_extent.iter().product();
        let mut block_buf = zero_elements(element_type, n as usize);
        copy_region(&data, dimensions, &b_start, &mut block_buf, &b_extent, &vec![0u64; rank], &b_extent);
        store.write_block(
            path,
            &attrs,
            &g,
            Block {
                size: b_extent,
                data: block_buf,
            },
        )?;
    }
    Ok(())
}

/// Read the `region_extent`-shaped region of `path` starting at
/// `region_start`, assembling a dense, column-major buffer in the
/// dataset's on-disk element type.
///
/// # Errors
/// Returns [`GeffError::RankMismatch`] if `region_start`/`region_extent`
/// does not match the dataset's rank, or propagates a
/// [`GeffError::BlockIOError`] from the store.
pub fn read_region<S: BlockStore + ?Sized>(
    store: &S,
    path: &str,
    region_start: &[u64],
    region_extent: &[u64],
) -> Result<Elements, GeffError> {
    let attrs = store.dataset_attributes(path)?;
    if region_start.len() != attrs.rank() || region_extent.len() != attrs.rank() {
        return Err(GeffError::RankMismatch {
            path: path.to_string(),
            expected: attrs.rank(),
            actual: region_start.len(),
        });
    }

    let n: u64 = region_extent.iter().product();
    let mut dest = zero_elements(attrs.element_type, n as usize);

    log::debug!("reading {path:?}: region start {region_start:?}, extent {region_extent:?} of shape {:?}", attrs.dimensions);
    let grid = grid_shape(&attrs.dimensions, &attrs.block_size);
    for g in grid_coords(&grid) {
        let b_start = block_start(&g, &attrs.block_size);
        let b_extent = block_extent(&attrs.dimensions, &attrs.block_size, &g);
        let Some((ix_start, ix_extent)) = intersect(&b_start, &b_extent, region_start, region_extent) else {
            continue;
        };
        let block = store.read_block(path, &attrs, &g)?;
        let block_offset: Vec<u64> = ix_start.iter().zip(&b_start).map(|(a, b)| a - b).collect();
        let dest_offset: Vec<u64> = ix_start.iter().zip(region_start).map(|(a, b)| a - b).collect();
        copy_region(&block.data, &b_extent, &block_offset, &mut dest, region_extent, &dest_offset, &ix_extent);
    }
    Ok(dest)
}

/// Read the entire dataset at `path`.
pub fn read_dataset<S: BlockStore + ?Sized>(store: &S, path: &str) -> Result<(Elements, DatasetAttributes), GeffError> {
    let attrs = store.dataset_attributes(path)?;
    let zero = vec![0u64; attrs.rank()];
    let data = read_region(store, path, &zero, &attrs.dimensions)?;
    Ok((data, attrs))
}

/// Read the entire dataset at `path` and coerce it to `requested_type`.
pub fn read_dataset_as<S: BlockStore + ?Sized>(
    store: &S,
    path: &str,
    requested_type: ElementType,
) -> Result<Elements, GeffError> {
    let (data, _attrs) = read_dataset(store, path)?;
    if data.element_type() == requested_type {
        Ok(data)
    } else {
        coerce(&data, requested_type, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemoryStore;

    #[test]
    fn round_trips_1d_with_ragged_boundary() {
        let store = MemoryStore::new();
        let data = Elements::I32((0..15).collect());
        write_dataset(&store, "nodes/ids", &[15], &[4], ElementType::I32, Compression::default(), &data).unwrap();
        let (back, attrs) = read_dataset(&store, "nodes/ids").unwrap();
        assert_eq!(back.as_i32().unwrap(), (0..15).collect::<Vec<i32>>().as_slice());
        assert_eq!(attrs.dimensions, vec![15]);
    }

    #[test]
    fn chunk_size_does_not_affect_result() {
        let data = Elements::F64((0..37).map(f64::from).collect());
        for chunk in [1u64, 3, 7, 1000] {
            let store = MemoryStore::new();
            write_dataset(&store, "x", &[37], &[chunk], ElementType::F64, Compression::default(), &data).unwrap();
            let (back, _) = read_dataset(&store, "x").unwrap();
            assert_eq!(back, data, "mismatch at chunk size {chunk}");
        }
    }

    #[test]
    fn round_trips_2d_matrix_shaped_property() {
        let store = MemoryStore::new();
        // color: [4, N] column-major
        let n = 10u64;
        let data: Vec<f64> = (0..4 * n).map(|i| i as f64).collect();
        let data = Elements::F64(data);
        write_dataset(&store, "nodes/props/color/values", &[4, n], &[4, 4], ElementType::F64, Compression::default(), &data).unwrap();
        let (back, _) = read_dataset(&store, "nodes/props/color/values").unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn partial_read_returns_requested_subregion() {
        let store = MemoryStore::new();
        let data = Elements::I32((0..20).collect());
        write_dataset(&store, "x", &[20], &[6], ElementType::I32, Compression::default(), &data).unwrap();
        let region = read_region(&store, "x", &[5], &[4]).unwrap();
        assert_eq!(region.as_i32().unwrap(), &[5, 6, 7, 8]);
    }

    #[test]
    fn read_coerces_to_requested_type() {
        let store = MemoryStore::new();
        let data = Elements::I32((0..4).collect());
        write_dataset(&store, "x", &[4], &[2], ElementType::I32, Compression::default(), &data).unwrap();
        let coerced = read_dataset_as(&store, "x", ElementType::F64).unwrap();
        assert_eq!(coerced, Elements::F64(vec![0.0, 1.0, 2.0, 3.0]));
    }
}
