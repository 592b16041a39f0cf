//! Block grid geometry: addresses, extents, and interval intersection.
//!
//! Column-major conventions follow the same `unravel_index`/`ravel_indices`
//! shape used elsewhere in this crate, generalized here to ragged boundary
//! blocks.

use itertools::Itertools;

/// The shape of the block grid: `grid_shape[i] = ceil(dimensions[i] / block_size[i])`.
#[must_use]
pub fn grid_shape(dimensions: &[u64], block_size: &[u64]) -> Vec<u64> {
    dimensions
        .iter()
        .zip(block_size)
        .map(|(&d, &b)| d.div_ceil(b))
        .collect()
}

/// The absolute start offset of the block at `grid_coord`.
#[must_use]
pub fn block_start(grid_coord: &[u64], block_size: &[u64]) -> Vec<u64> {
    grid_coord
        .iter()
        .zip(block_size)
        .map(|(&g, &b)| g * b)
        .collect()
}

/// The extent (length along each axis) of the block at `grid_coord`. The
/// last block along an axis may be short; this returns the short extent,
/// not the padded `block_size`.
#[must_use]
pub fn block_extent(dimensions: &[u64], block_size: &[u64], grid_coord: &[u64]) -> Vec<u64> {
    let start = block_start(grid_coord, block_size);
    dimensions
        .iter()
        .zip(block_size)
        .zip(start)
        .map(|((&d, &b), s)| b.min(d - s))
        .collect()
}

/// Iterate every grid coordinate in `grid_shape`, in lexicographic order
/// (the first axis varies slowest) — the order blocks are written/read in.
/// Yields nothing if any axis has extent 0; yields one empty coordinate
/// for a rank-0 shape.
pub fn grid_coords(grid_shape: &[u64]) -> impl Iterator<Item = Vec<u64>> + '_ {
    grid_shape.iter().map(|&d| 0..d).multi_cartesian_product()
}

/// The intersection of two axis-aligned half-open hyperrectangles, each
/// given as `(start, extent)` per axis. Returns `None` if they do not
/// overlap on some axis; otherwise returns `(intersection_start,
/// intersection_extent)` in absolute coordinates.
#[must_use]
pub fn intersect(
    a_start: &[u64],
    a_extent: &[u64],
    b_start: &[u64],
    b_extent: &[u64],
) -> Option<(Vec<u64>, Vec<u64>)> {
    let rank = a_start.len();
    debug_assert_eq!(rank, b_start.len());
    let mut start = Vec::with_capacity(rank);
    let mut extent = Vec::with_capacity(rank);
    for i in 0..rank {
        let lo = a_start[i].max(b_start[i]);
        let hi = (a_start[i] + a_extent[i]).min(b_start[i] + b_extent[i]);
        if hi <= lo {
            return None;
        }
        start.push(lo);
        extent.push(hi - lo);
    }
    Some((start, extent))
}

/// Column-major strides for a shape: `strides[0] = 1`, `strides[i] =
/// strides[i-1] * shape[i-1]`.
#[must_use]
pub fn column_major_strides(shape: &[u64]) -> Vec<u64> {
    let mut strides = vec![1u64; shape.len()];
    for i in 1..shape.len() {
        strides[i] = strides[i - 1] * shape[i - 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_shape_covers_ragged_boundary() {
        assert_eq!(grid_shape(&[15], &[4]), vec![4]);
        assert_eq!(block_extent(&[15], &[4], &[0]), vec![4]);
        assert_eq!(block_extent(&[15], &[4], &[3]), vec![3]);
    }

    #[test]
    fn grid_coords_enumerate_lexicographically() {
        let coords: Vec<_> = grid_coords(&[2, 3]).collect();
        assert_eq!(
            coords,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2],
            ]
        );
    }

    #[test]
    fn blocks_tile_without_gaps_or_overlap() {
        let dims = [13u64];
        let block = [4u64];
        let shape = grid_shape(&dims, &block);
        let mut covered = vec![false; 13];
        for g in grid_coords(&shape) {
            let start = block_start(&g, &block)[0] as usize;
            let extent = block_extent(&dims, &block, &g)[0] as usize;
            for i in start..start + extent {
                assert!(!covered[i], "block {g:?} double-covers index {i}");
                covered[i] = true;
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn intersection_of_disjoint_is_none() {
        assert_eq!(intersect(&[0], &[2], &[5], &[2]), None);
        assert_eq!(
            intersect(&[0, 0], &[4, 4], &[2, 2], &[4, 4]),
            Some((vec![2, 2], vec![2, 2]))
        );
    }
}
