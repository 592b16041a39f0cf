//! An in-memory [`BlockStore`] test double, adapted from byte-range
//! storage to the block-level trait this crate defines. Real Zarr v2/N5
//! filesystem backings are out of scope for this crate; this store exists
//! for tests, examples, and callers who want a pure in-process graph.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{GeffError, StoreError};
use crate::value::Value;

use super::geometry::grid_shape;
use super::store::{Block, BlockStore, DatasetAttributes};

fn normalize_path(path: &str) -> String {
    path.trim_start_matches('/').trim_end_matches('/').to_string()
}

struct Dataset {
    attrs: DatasetAttributes,
    blocks: HashMap<Vec<u64>, Block>,
}

/// A pure in-memory store, guarded by a single mutex. Two simultaneous
/// operations on the same group are undefined behavior, so no finer-grained
/// locking is needed.
#[derive(Default)]
pub struct MemoryStore {
    attributes: Mutex<HashMap<String, Value>>,
    datasets: Mutex<HashMap<String, Dataset>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-only: corrupt a stored dataset by replacing its length-1
    /// dimension with `new_length`, without touching the underlying
    /// blocks. This simulates an externally truncated array, the way an
    /// operator might edit a real Zarr/N5 array's metadata out of band,
    /// and is used to exercise the length-mismatch detection path.
    pub fn debug_set_dataset_length(&self, path: &str, new_length: u64) {
        let path = normalize_path(path);
        let mut datasets = self.datasets.lock().unwrap();
        if let Some(dataset) = datasets.get_mut(&path) {
            dataset.attrs.dimensions[0] = new_length;
        }
    }
}

impl BlockStore for MemoryStore {
    fn group_exists(&self, path: &str) -> Result<bool, GeffError> {
        let path = normalize_path(path);
        let attrs = self.attributes.lock().unwrap();
        let datasets = self.datasets.lock().unwrap();
        Ok(attrs.contains_key(&path)
            || datasets.keys().any(|k| k == &path || k.starts_with(&format!("{path}/"))))
    }

    fn dataset_exists(&self, path: &str) -> Result<bool, GeffError> {
        let path = normalize_path(path);
        Ok(self.datasets.lock().unwrap().contains_key(&path))
    }

    fn attributes(&self, path: &str) -> Result<Value, GeffError> {
        let path = normalize_path(path);
        Ok(self
            .attributes
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .unwrap_or(Value::Null))
    }

    fn get_attribute(&self, path: &str, key: &str) -> Result<Option<Value>, GeffError> {
        let doc = self.attributes(path)?;
        let mut cur = &doc;
        for part in key.split('/') {
            match cur.get(part) {
                Some(v) => cur = v,
                None => return Ok(None),
            }
        }
        Ok(Some(cur.clone()))
    }

    fn set_attribute(&self, path: &str, key: &str, value: Value) -> Result<(), GeffError> {
        use std::collections::BTreeMap;

        let path = normalize_path(path);
        let mut attrs = self.attributes.lock().unwrap();
        let mut doc = attrs.get(&path).cloned().unwrap_or(Value::Map(BTreeMap::new()));

        let parts: Vec<&str> = key.split('/').collect();
        fn set_nested(doc: &mut Value, parts: &[&str], value: Value) {
            if !matches!(doc, Value::Map(_)) {
                *doc = Value::Map(std::collections::BTreeMap::new());
            }
            let Value::Map(map) = doc else { unreachable!() };
            if parts.len() == 1 {
                map.insert(parts[0].to_string(), value);
            } else {
                let child = map
                    .entry(parts[0].to_string())
                    .or_insert_with(|| Value::Map(std::collections::BTreeMap::new()));
                set_nested(child, &parts[1..], value);
            }
        }
        set_nested(&mut doc, &parts, value);
        attrs.insert(path, doc);
        Ok(())
    }

    fn dataset_attributes(&self, path: &str) -> Result<DatasetAttributes, GeffError> {
        let path = normalize_path(path);
        self.datasets
            .lock()
            .unwrap()
            .get(&path)
            .map(|d| d.attrs.clone())
            .ok_or_else(|| GeffError::MissingRequiredDataset(path.clone()))
    }

    fn create_dataset(&self, path: &str, attrs: DatasetAttributes) -> Result<(), GeffError> {
        let path = normalize_path(path);
        self.datasets.lock().unwrap().insert(
            path,
            Dataset {
                attrs,
                blocks: HashMap::new(),
            },
        );
        Ok(())
    }

    fn read_block(&self, path: &str, attrs: &DatasetAttributes, grid_coord: &[u64]) -> Result<Block, GeffError> {
        let norm = normalize_path(path);
        let datasets = self.datasets.lock().unwrap();
        let dataset = datasets
            .get(&norm)
            .ok_or_else(|| GeffError::MissingRequiredDataset(norm.clone()))?;
        // Guard against reading stale grid coordinates after a test-only
        // length truncation: the grid shape derived from the (possibly
        // shortened) current dimensions may no longer include this block.
        let grid = grid_shape(&dataset.attrs.dimensions, &attrs.block_size);
        if grid_coord.iter().zip(&grid).any(|(&g, &limit)| g >= limit) {
            return Err(GeffError::block_io(
                norm,
                grid_coord.to_vec(),
                StoreError::new("block coordinate is outside the current grid"),
            ));
        }
        dataset.blocks.get(grid_coord).cloned().ok_or_else(|| {
            GeffError::block_io(
                norm.clone(),
                grid_coord.to_vec(),
                StoreError::new(format!("block {grid_coord:?} has not been written at {norm:?}")),
            )
        })
    }

    fn write_block(&self, path: &str, _attrs: &DatasetAttributes, grid_coord: &[u64], block: Block) -> Result<(), GeffError> {
        let path = normalize_path(path);
        let mut datasets = self.datasets.lock().unwrap();
        let dataset = datasets
            .get_mut(&path)
            .ok_or_else(|| GeffError::MissingRequiredDataset(path.clone()))?;
        dataset.blocks.insert(grid_coord.to_vec(), block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;

    #[test]
    fn attributes_nest_through_slash_separated_keys() {
        let store = MemoryStore::new();
        store.set_attribute("", "geff/geff_version", Value::from("0.3.0")).unwrap();
        store.set_attribute("", "geff/directed", Value::from(true)).unwrap();
        assert_eq!(
            store.get_attribute("", "geff/geff_version").unwrap(),
            Some(Value::from("0.3.0"))
        );
        assert_eq!(store.get_attribute("", "geff/directed").unwrap(), Some(Value::from(true)));
        assert_eq!(store.get_attribute("", "geff/axes").unwrap(), None);
    }

    #[test]
    fn dataset_round_trips_attributes() {
        let store = MemoryStore::new();
        assert!(!store.dataset_exists("nodes/ids").unwrap());
        store
            .create_dataset(
                "nodes/ids",
                DatasetAttributes {
                    dimensions: vec![10],
                    block_size: vec![4],
                    element_type: ElementType::I32,
                    compression: Default::default(),
                },
            )
            .unwrap();
        assert!(store.dataset_exists("nodes/ids").unwrap());
        assert_eq!(store.dataset_attributes("nodes/ids").unwrap().dimensions, vec![10]);
    }
}
