//! Common types shared by the OWS Context crates.

pub mod bbox;
pub mod crs;
pub mod error;

pub use bbox::BoundingBox;
pub use crs::{normalize_crs, CrsCode};
pub use error::{OwsError, OwsResult};
