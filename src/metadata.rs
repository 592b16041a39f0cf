//! The Metadata Codec: reads and writes the GEFF metadata attribute
//! document under the group's `geff` attribute key.

use serde::{Deserialize, Serialize};

use crate::axis::Axis;
use crate::block::BlockStore;
use crate::error::GeffError;
use crate::value::Value;
use crate::version::{self, MajorMinor};

/// The group's GEFF metadata: version, directedness, and optional axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub geff_version: String,
    pub directed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axes: Option<Vec<Axis>>,
}

impl Metadata {
    /// Parse this metadata's version and return its [`MajorMinor`].
    ///
    /// # Errors
    /// Returns [`GeffError::MalformedVersion`]/[`GeffError::UnsupportedVersion`]
    /// as [`version::major_minor`] does.
    pub fn major_minor(&self) -> Result<MajorMinor, GeffError> {
        version::major_minor(&self.geff_version)
    }

    /// Validate axis name/type conventions. `Axis::with_bounds` already
    /// rejects individual malformed axes; this additionally validates the
    /// collection as a whole (currently a no-op placeholder for future
    /// cross-axis checks, e.g. duplicate names; kept as an explicit step
    /// because the write path always validates before writing).
    pub fn validate(&self) -> Result<(), GeffError> {
        version::major_minor(&self.geff_version)?;
        Ok(())
    }
}

const ROOT: &str = "";

/// Read metadata from the group at the store root.
///
/// # Errors
/// - [`GeffError::MissingVersion`] if neither the 0.2+ nor the legacy 0.1
///   version marker is present.
/// - [`GeffError::UnsupportedVersion`]/[`GeffError::MalformedVersion`] per
///   the Version Gate.
/// - [`GeffError::MissingRequiredAttribute`] if `directed` is absent.
pub fn read<S: BlockStore + ?Sized>(store: &S) -> Result<Metadata, GeffError> {
    if let Some(version_value) = store.get_attribute(ROOT, "geff/geff_version")? {
        return read_current(store, version_value);
    }
    if let Some(version_value) = store.get_attribute(ROOT, "geff_version")? {
        log::debug!("falling back to legacy 0.1 flat attribute layout");
        return read_legacy_0_1(store, version_value);
    }
    Err(GeffError::MissingVersion(ROOT.to_string()))
}

fn read_current<S: BlockStore + ?Sized>(store: &S, version_value: Value) -> Result<Metadata, GeffError> {
    let geff_version = version_value
        .as_str()
        .ok_or_else(|| GeffError::MalformedVersion(format!("{version_value:?}")))?
        .to_string();
    if geff_version.is_empty() {
        return Err(GeffError::MissingVersion(ROOT.to_string()));
    }
    version::major_minor(&geff_version)?;

    let directed = store
        .get_attribute(ROOT, "geff/directed")?
        .and_then(|v| v.as_bool())
        .ok_or_else(|| GeffError::MissingRequiredAttribute("directed".to_string()))?;

    let axes = match store.get_attribute(ROOT, "geff/axes")? {
        None => None,
        Some(Value::Null) => None,
        Some(v) => {
            let list = v
                .as_list()
                .ok_or_else(|| GeffError::InvalidAxis("geff/axes is not a list".to_string()))?;
            Some(list.iter().map(Axis::from_value).collect::<Result<Vec<_>, _>>()?)
        }
    };

    Ok(Metadata {
        geff_version,
        directed,
        axes,
    })
}

/// Reconstruct metadata from the 0.1 legacy layout: flat root attributes
/// `geff_version`, `directed`, `roi_min`, `roi_max`, `axis_names`,
/// `axis_units`.
fn read_legacy_0_1<S: BlockStore + ?Sized>(store: &S, version_value: Value) -> Result<Metadata, GeffError> {
    let geff_version = version_value
        .as_str()
        .ok_or_else(|| GeffError::MalformedVersion(format!("{version_value:?}")))?
        .to_string();
    version::major_minor(&geff_version)?;

    let directed = store
        .get_attribute(ROOT, "directed")?
        .and_then(|v| v.as_bool())
        .ok_or_else(|| GeffError::MissingRequiredAttribute("directed".to_string()))?;

    let axis_names = list_of_strings(store, "axis_names")?;
    let axis_units = list_of_strings(store, "axis_units")?;
    let roi_min = list_of_f64(store, "roi_min")?;
    let roi_max = list_of_f64(store, "roi_max")?;

    let axes = if axis_names.is_empty() {
        None
    } else {
        let mut axes = Vec::with_capacity(axis_names.len());
        for (i, name) in axis_names.into_iter().enumerate() {
            let unit = axis_units.get(i).cloned().unwrap_or_default();
            let axis_type = crate::axis::axis_type_from_name(&name)?;
            let min = roi_min.get(i).copied();
            let max = roi_max.get(i).copied();
            axes.push(Axis::with_bounds(name, axis_type, unit, min, max)?);
        }
        Some(axes)
    };

    Ok(Metadata {
        geff_version,
        directed,
        axes,
    })
}

fn list_of_strings<S: BlockStore + ?Sized>(store: &S, key: &str) -> Result<Vec<String>, GeffError> {
    Ok(store
        .get_attribute(ROOT, key)?
        .and_then(|v| v.as_list().map(<[Value]>::to_vec))
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

fn list_of_f64<S: BlockStore + ?Sized>(store: &S, key: &str) -> Result<Vec<f64>, GeffError> {
    Ok(store
        .get_attribute(ROOT, key)?
        .and_then(|v| v.as_list().map(<[Value]>::to_vec))
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_f64)
        .collect())
}

/// Write metadata to the group at the store root, in the current (0.2+)
/// layout. Validates before writing.
///
/// # Errors
/// Propagates [`Metadata::validate`] failures and any store error.
pub fn write<S: BlockStore + ?Sized>(store: &S, metadata: &Metadata) -> Result<(), GeffError> {
    metadata.validate()?;
    store.set_attribute(ROOT, "geff/geff_version", Value::from(metadata.geff_version.as_str()))?;
    store.set_attribute(ROOT, "geff/directed", Value::from(metadata.directed))?;
    if let Some(axes) = &metadata.axes {
        if !axes.is_empty() {
            store.set_attribute(ROOT, "geff/axes", Value::List(axes.iter().map(Axis::to_value).collect()))?;
        }
    }
    Ok(())
}
