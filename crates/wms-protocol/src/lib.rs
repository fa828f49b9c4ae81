//! OGC WMS protocol support for OWS Context tooling.
//!
//! Supports:
//! - Parsing WMS 1.1.1 and WMS 1.3.0 GetCapabilities documents
//! - Building and merging GetMap KVP request URLs

pub mod capabilities;
pub mod getmap;

pub use capabilities::{CapabilitiesError, CapabilityLayer, WmsCapabilities};
pub use getmap::{
    get_capabilities_url, get_map_url, get_param, merge_layer_params, set_param, GetMapKey,
};

/// Service type value used in KVP requests.
pub const SERVICE_WMS: &str = "WMS";

/// Version requested when nothing else is known.
pub const DEFAULT_VERSION: &str = "1.3.0";
