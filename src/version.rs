//! The Version Gate: parses, validates, and compares GEFF version strings.
//!
//! Accepted grammar:
//!
//! ```text
//! version    := major "." minor ( "." patch )? ( "." identifier )? ( [+-] build )*
//! major      := "0"
//! minor      := "1" | "2" | "3" | "4"
//! patch      := digits
//! identifier := alnum+
//! build      := alnum ( "." alnum+ )*
//! ```
//!
//! Downstream codecs branch exclusively on [`major_minor`] — never on patch
//! or build metadata.

use crate::error::GeffError;

/// The supported major.minor combinations, as a 4-way enum so node/edge/
/// metadata codecs can match on it exhaustively.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MajorMinor {
    /// `0.1` — legacy layout (optional).
    V0_1,
    /// `0.2` — core.
    V0_2,
    /// `0.3` — core.
    V0_3,
    /// `0.4` — polygon extension (optional).
    V0_4,
}

impl MajorMinor {
    #[must_use]
    pub const fn as_tuple(self) -> (u32, u32) {
        match self {
            MajorMinor::V0_1 => (0, 1),
            MajorMinor::V0_2 => (0, 2),
            MajorMinor::V0_3 => (0, 3),
            MajorMinor::V0_4 => (0, 4),
        }
    }
}

/// The library's default version to use when writing a graph.
pub const DEFAULT_WRITE_VERSION: &str = "0.3.0";

fn is_alnum(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Validate the build-metadata suffix: zero or more `([+-] build)` groups,
/// where `build := alnum ("." alnum+)*`.
fn validate_build_suffix(mut s: &str) -> bool {
    while !s.is_empty() {
        let Some(rest) = s.strip_prefix(['+', '-']) else {
            return false;
        };
        // Consume one `build` group: alnum ("." alnum+)*, stopping at the
        // next +/- separator (if any).
        let end = rest
            .find(['+', '-'])
            .unwrap_or(rest.len());
        let group = &rest[..end];
        if group.is_empty() || !group.split('.').all(is_alnum) {
            return false;
        }
        s = &rest[end..];
    }
    true
}

/// Split a version string into its main dotted component and an optional
/// build-metadata suffix (everything from the first `+`/`-`).
fn split_build(s: &str) -> (&str, &str) {
    match s.find(['+', '-']) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

/// Parse a GEFF version string, returning its [`MajorMinor`].
///
/// # Errors
/// Returns [`GeffError::MalformedVersion`] if `v` does not match the
/// accepted grammar, or [`GeffError::UnsupportedVersion`] if it parses but
/// its major.minor is not in `{0.1, 0.2, 0.3, 0.4}`.
pub fn major_minor(v: &str) -> Result<MajorMinor, GeffError> {
    if v.is_empty() {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }

    let (main, build) = split_build(v);
    if !validate_build_suffix(build) {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }

    let parts: Vec<&str> = main.split('.').collect();
    if parts.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }
    if parts.len() > 4 {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }

    let major = parts[0];
    if !is_digits(major) {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }

    let minor_str = parts.get(1).ok_or_else(|| GeffError::MalformedVersion(v.to_string()))?;
    if !is_digits(minor_str) {
        return Err(GeffError::MalformedVersion(v.to_string()));
    }

    // The string is structurally a well-formed dotted version at this
    // point. A major other than 0 is a recognized-but-unsupported version,
    // not a parse failure — this crate has never shipped anything but the
    // 0.x series.
    if major != "0" {
        return Err(GeffError::UnsupportedVersion(v.to_string()));
    }

    if let Some(patch) = parts.get(2) {
        if !is_digits(patch) {
            return Err(GeffError::MalformedVersion(v.to_string()));
        }
    }
    if let Some(identifier) = parts.get(3) {
        if !is_alnum(identifier) {
            return Err(GeffError::MalformedVersion(v.to_string()));
        }
    }

    let minor: u32 = minor_str
        .parse()
        .map_err(|_| GeffError::MalformedVersion(v.to_string()))?;

    match minor {
        1 => Ok(MajorMinor::V0_1),
        2 => Ok(MajorMinor::V0_2),
        3 => Ok(MajorMinor::V0_3),
        4 => Ok(MajorMinor::V0_4),
        _ => Err(GeffError::UnsupportedVersion(v.to_string())),
    }
}

/// Returns `true` if `v` parses and its major.minor is supported.
#[must_use]
pub fn is_supported(v: &str) -> bool {
    major_minor(v).is_ok()
}

/// Strip only the build-metadata suffix (everything from the first
/// `+`/`-`), leaving major.minor.patch.identifier untouched.
#[must_use]
pub fn normalize(v: &str) -> &str {
    split_build(v).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_core_versions() {
        assert!(matches!(major_minor("0.2").unwrap(), MajorMinor::V0_2));
        assert!(matches!(major_minor("0.3.0").unwrap(), MajorMinor::V0_3));
        assert!(matches!(
            major_minor("0.2.2.dev20+g611e7a2.d20250719").unwrap(),
            MajorMinor::V0_2
        ));
        assert!(matches!(
            major_minor("0.3.0-alpha.1").unwrap(),
            MajorMinor::V0_3
        ));
    }

    #[test]
    fn accepts_optional_legacy_and_extension() {
        assert!(matches!(major_minor("0.1.0").unwrap(), MajorMinor::V0_1));
        assert!(matches!(major_minor("0.4.0").unwrap(), MajorMinor::V0_4));
    }

    #[test]
    fn rejects_unsupported_and_malformed() {
        assert!(major_minor("1.0").is_err());
        assert!(major_minor("invalid").is_err());
        assert!(major_minor("0.1..x").is_err());
        assert!(major_minor("").is_err());
        // A non-zero major is a structurally valid, simply-unsupported
        // version, not a parse failure.
        assert!(matches!(
            major_minor("1.0").unwrap_err(),
            GeffError::UnsupportedVersion(_)
        ));
        assert!(matches!(
            major_minor("invalid").unwrap_err(),
            GeffError::MalformedVersion(_)
        ));
        assert!(matches!(
            major_minor("0.9").unwrap_err(),
            GeffError::UnsupportedVersion(_)
        ));
    }

    #[test]
    fn idempotent_under_build_stripping() {
        let v = "0.2.2.dev20+g611e7a2.d20250719";
        assert_eq!(is_supported(v), is_supported(normalize(v)));
        assert_eq!(normalize(v), "0.2.2.dev20");
    }
}
