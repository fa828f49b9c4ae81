//! Coordinate reference system codes as they appear in capabilities
//! documents and context resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference systems the map client can draw natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lat/lon in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
    /// ETRS89 / UTM zone 32N
    Epsg25832,
    /// ETRS89 / UTM zone 33N
    Epsg25833,
    /// ETRS89 / LAEA Europe
    Epsg3035,
}

impl CrsCode {
    /// Parse a CRS string (SRS or CRS parameter form), case-insensitive.
    ///
    /// "CRS:84" is treated as EPSG:4326 and "EPSG:900913" as EPSG:3857.
    pub fn from_wms_string(s: &str) -> Result<Self, CrsParseError> {
        match normalize_crs(s).as_str() {
            "EPSG:4326" | "CRS:84" => Ok(CrsCode::Epsg4326),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:25832" => Ok(CrsCode::Epsg25832),
            "EPSG:25833" => Ok(CrsCode::Epsg25833),
            "EPSG:3035" => Ok(CrsCode::Epsg3035),
            _ => Err(CrsParseError::UnsupportedCrs(s.to_string())),
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            CrsCode::Epsg4326 => "EPSG:4326",
            CrsCode::Epsg3857 => "EPSG:3857",
            CrsCode::Epsg25832 => "EPSG:25832",
            CrsCode::Epsg25833 => "EPSG:25833",
            CrsCode::Epsg3035 => "EPSG:3035",
        };
        write!(f, "{}", code)
    }
}

/// Canonical spelling of a CRS identifier: trimmed and upper case.
///
/// Capabilities documents mix `epsg:4326` and `EPSG:4326`; comparisons
/// between resources go through this.
pub fn normalize_crs(s: &str) -> String {
    s.trim().to_uppercase()
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_wms_string("EPSG:4326").unwrap(),
            CrsCode::Epsg4326
        );
        assert_eq!(
            CrsCode::from_wms_string("epsg:25832").unwrap(),
            CrsCode::Epsg25832
        );
        assert_eq!(
            CrsCode::from_wms_string("CRS:84").unwrap(),
            CrsCode::Epsg4326
        );
        assert!(CrsCode::from_wms_string("EPSG:99999").is_err());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_crs(" epsg:3857 "), "EPSG:3857");
        assert_eq!(CrsCode::Epsg3035.to_string(), "EPSG:3035");
    }
}
