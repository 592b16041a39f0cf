//! Element types and the type-coercion dispatch table.
//!
//! Coercion is a small set of typed element-copy primitives selected at
//! dispatch time by a `(src_type, dst_type)` pair, not per-element virtual
//! calls. [`Elements`] is a buffer holding one primitive numeric type (or
//! strings/opaque JSON objects); [`coerce`] converts a buffer from one
//! [`ElementType`] to another using exactly that dispatch strategy.

use crate::error::GeffError;
use crate::value::Value;

/// The on-disk/in-memory element type of a dataset.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ElementType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    String,
    Object,
}

impl ElementType {
    /// The size in bytes of a single element of this type, for the numeric
    /// types. Returns `None` for `String`/`Object`, which are not fixed
    /// width.
    #[must_use]
    pub const fn size(self) -> Option<usize> {
        match self {
            ElementType::I8 | ElementType::U8 => Some(1),
            ElementType::I16 | ElementType::U16 => Some(2),
            ElementType::I32 | ElementType::U32 | ElementType::F32 => Some(4),
            ElementType::I64 | ElementType::U64 | ElementType::F64 => Some(8),
            ElementType::String | ElementType::Object => None,
        }
    }
}

/// A dense, typed, one-dimensional buffer of element values.
///
/// This is the payload type the block codec moves in and out of a dataset;
/// multi-dimensional structure is tracked separately by
/// [`crate::block::Flattened`].
#[derive(Clone, Debug, PartialEq)]
pub enum Elements {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    I64(Vec<i64>),
    U64(Vec<u64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    String(Vec<String>),
    Object(Vec<Value>),
}

impl Elements {
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            Elements::I8(_) => ElementType::I8,
            Elements::U8(_) => ElementType::U8,
            Elements::I16(_) => ElementType::I16,
            Elements::U16(_) => ElementType::U16,
            Elements::I32(_) => ElementType::I32,
            Elements::U32(_) => ElementType::U32,
            Elements::I64(_) => ElementType::I64,
            Elements::U64(_) => ElementType::U64,
            Elements::F32(_) => ElementType::F32,
            Elements::F64(_) => ElementType::F64,
            Elements::String(_) => ElementType::String,
            Elements::Object(_) => ElementType::Object,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Elements::I8(v) => v.len(),
            Elements::U8(v) => v.len(),
            Elements::I16(v) => v.len(),
            Elements::U16(v) => v.len(),
            Elements::I32(v) => v.len(),
            Elements::U32(v) => v.len(),
            Elements::I64(v) => v.len(),
            Elements::U64(v) => v.len(),
            Elements::F32(v) => v.len(),
            Elements::F64(v) => v.len(),
            Elements::String(v) => v.len(),
            Elements::Object(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            Elements::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match self {
            Elements::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_i32(self) -> Option<Vec<i32>> {
        match self {
            Elements::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_f64(self) -> Option<Vec<f64>> {
        match self {
            Elements::F64(v) => Some(v),
            _ => None,
        }
    }
}

/// Numeric-only view used by the coercion dispatch; strings/objects never
/// participate in numeric coercion.
macro_rules! numeric_variants {
    ($macro_name:ident) => {
        $macro_name!(I8 i8, U8 u8, I16 i16, U16 u16, I32 i32, U32 u32, I64 i64, U64 u64, F32 f32, F64 f64);
    };
}

/// Coerce `src` to `dst_type`.
///
/// - Numeric widening (e.g. `i32 -> f64`) is exact.
/// - Numeric narrowing (e.g. `f64 -> i32`) truncates; this crate uses Rust's
///   `as` cast, which saturates float-to-int conversions at the target
///   type's bounds rather than wrapping — the caller's contract is simply
///   that overflow is not reported as an error, and saturation is the
///   safe, defined behavior `as` gives us for that contract.
/// - Unsigned-to-signed of the same width reuses the bit pattern via `as`
///   (not a masking/abs operation); values are assumed non-negative so this
///   never surprises a caller who keeps that invariant.
/// - Anything touching `String`/`Object` on either side fails with
///   [`GeffError::TypeMismatch`], except the identity conversion.
///
/// # Errors
/// Returns [`GeffError::TypeMismatch`] for unsupported `(src, dst)` pairs.
pub fn coerce(src: &Elements, dst_type: ElementType, path: &str) -> Result<Elements, GeffError> {
    if src.element_type() == dst_type {
        return Ok(src.clone());
    }

    macro_rules! dispatch {
        ($($variant:ident $ty:ty),*) => {
            match (src, dst_type) {
                $(
                    (Elements::I8(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::U8(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::I16(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::U16(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::I32(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::U32(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::I64(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::U64(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::F32(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                    (Elements::F64(v), ElementType::$variant) => Ok(Elements::$variant(v.iter().map(|&x| x as $ty).collect())),
                )*
                _ => Err(GeffError::TypeMismatch {
                    path: path.to_string(),
                    requested: dst_type,
                    actual: src.element_type(),
                }),
            }
        };
    }

    numeric_variants!(dispatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_is_exact() {
        let src = Elements::I32(vec![1, -2, 3]);
        let dst = coerce(&src, ElementType::F64, "x").unwrap();
        assert_eq!(dst, Elements::F64(vec![1.0, -2.0, 3.0]));
    }

    #[test]
    fn narrowing_truncates() {
        let src = Elements::I64(vec![1_000_000_000_000]);
        let dst = coerce(&src, ElementType::I32, "x").unwrap();
        assert_eq!(dst, Elements::I32(vec![1_000_000_000_000i64 as i32]));
    }

    #[test]
    fn unsigned_to_signed_same_width() {
        let src = Elements::U32(vec![5]);
        let dst = coerce(&src, ElementType::I32, "x").unwrap();
        assert_eq!(dst, Elements::I32(vec![5]));
    }

    #[test]
    fn string_coercion_fails() {
        let src = Elements::String(vec!["5".to_string()]);
        let err = coerce(&src, ElementType::I32, "x").unwrap_err();
        assert!(matches!(err, GeffError::TypeMismatch { .. }));
    }

    #[test]
    fn identity_is_a_clone() {
        let src = Elements::F64(vec![1.0, 2.0]);
        let dst = coerce(&src, ElementType::F64, "x").unwrap();
        assert_eq!(src, dst);
    }
}
