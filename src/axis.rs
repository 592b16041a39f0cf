//! The Axis Model: a structured description of a spatial/temporal axis.

use serde::{Deserialize, Serialize};

use crate::error::GeffError;
use crate::value::Value;

/// The conventional class of an axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisType {
    Time,
    Space,
}

impl AxisType {
    fn as_str(self) -> &'static str {
        match self {
            AxisType::Time => "time",
            AxisType::Space => "space",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "time" => Some(AxisType::Time),
            "space" => Some(AxisType::Space),
            _ => None,
        }
    }
}

/// The allowed axis names. `t` must be [`AxisType::Time`]; `x`/`y`/`z` must
/// be [`AxisType::Space`].
const ALLOWED_NAMES: [&str; 4] = ["t", "x", "y", "z"];

fn conventional_type(name: &str) -> Option<AxisType> {
    match name {
        "t" => Some(AxisType::Time),
        "x" | "y" | "z" => Some(AxisType::Space),
        _ => None,
    }
}

/// Classify an axis name's conventional type, for legacy 0.1 metadata,
/// which has no explicit `type` field to read.
///
/// # Errors
/// Returns [`GeffError::InvalidAxis`] if `name` is not one of `t`/`x`/`y`/`z`.
pub fn axis_type_from_name(name: &str) -> Result<AxisType, GeffError> {
    conventional_type(name).ok_or_else(|| GeffError::InvalidAxis(format!("unknown axis name {name:?}")))
}

/// A single spatial or temporal axis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    #[serde(rename = "type")]
    pub axis_type: AxisType,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Axis {
    /// Create a new axis without bounds.
    ///
    /// # Errors
    /// Returns [`GeffError::InvalidAxis`] if `name` is not one of
    /// `t`/`x`/`y`/`z`, or if `axis_type` does not match the name's
    /// conventional class.
    pub fn new(name: impl Into<String>, axis_type: AxisType, unit: impl Into<String>) -> Result<Self, GeffError> {
        Self::with_bounds(name, axis_type, unit, None, None)
    }

    /// Create a new axis with optional bounds.
    ///
    /// # Errors
    /// As [`Axis::new`], plus [`GeffError::InvalidAxis`] if both bounds are
    /// present and `min > max`.
    pub fn with_bounds(
        name: impl Into<String>,
        axis_type: AxisType,
        unit: impl Into<String>,
        min: Option<f64>,
        max: Option<f64>,
    ) -> Result<Self, GeffError> {
        let name = name.into();
        if !ALLOWED_NAMES.contains(&name.as_str()) {
            return Err(GeffError::InvalidAxis(format!(
                "unknown axis name {name:?}"
            )));
        }
        if let Some(expected) = conventional_type(&name) {
            if expected != axis_type {
                return Err(GeffError::InvalidAxis(format!(
                    "axis {name:?} must have type {:?}, got {axis_type:?}",
                    expected
                )));
            }
        }
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(GeffError::InvalidAxis(format!(
                    "axis {name:?} has min {min} > max {max}"
                )));
            }
        }
        Ok(Self {
            name,
            axis_type,
            unit: unit.into(),
            min,
            max,
        })
    }

    pub(crate) fn to_value(&self) -> Value {
        use std::collections::BTreeMap;
        let mut m = BTreeMap::new();
        m.insert("name".to_string(), Value::from(self.name.as_str()));
        m.insert("type".to_string(), Value::from(self.axis_type.as_str()));
        m.insert("unit".to_string(), Value::from(self.unit.as_str()));
        if let Some(min) = self.min {
            m.insert("min".to_string(), Value::from(min));
        }
        if let Some(max) = self.max {
            m.insert("max".to_string(), Value::from(max));
        }
        Value::Map(m)
    }

    pub(crate) fn from_value(v: &Value) -> Result<Self, GeffError> {
        let name = v
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| GeffError::InvalidAxis("axis missing name".to_string()))?
            .to_string();
        let type_str = v
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| GeffError::InvalidAxis(format!("axis {name:?} missing type")))?;
        let axis_type = AxisType::from_str(type_str)
            .ok_or_else(|| GeffError::InvalidAxis(format!("axis {name:?} has unknown type {type_str:?}")))?;
        let unit = v
            .get("unit")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let min = v.get("min").and_then(Value::as_f64);
        let max = v.get("max").and_then(Value::as_f64);
        Self::with_bounds(name, axis_type, unit, min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_bounds() {
        assert!(Axis::with_bounds("x", AxisType::Space, "micrometers", Some(5.0), Some(1.0)).is_err());
        assert!(Axis::with_bounds("x", AxisType::Space, "micrometers", Some(1.0), Some(5.0)).is_ok());
    }

    #[test]
    fn rejects_type_name_mismatch() {
        assert!(Axis::new("t", AxisType::Space, "seconds").is_err());
        assert!(Axis::new("x", AxisType::Time, "micrometers").is_err());
        assert!(Axis::new("t", AxisType::Time, "seconds").is_ok());
    }

    #[test]
    fn rejects_unknown_name() {
        assert!(Axis::new("w", AxisType::Space, "micrometers").is_err());
    }

    #[test]
    fn round_trips_through_value() {
        let axis = Axis::with_bounds("z", AxisType::Space, "micrometers", Some(0.0), Some(100.0)).unwrap();
        let value = axis.to_value();
        let back = Axis::from_value(&value).unwrap();
        assert_eq!(axis, back);
    }
}
