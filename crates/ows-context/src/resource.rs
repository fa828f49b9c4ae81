//! Context resources (GeoJSON features of an OWS Context document).

use chrono::{DateTime, Utc};
use ows_common::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::path::FolderPath;

/// OWS Context offering code for WMS layers.
pub const WMS_OFFERING_CODE: &str = "http://www.opengis.net/spec/owc-geojson/1.0/req/wms";

/// Opaque resource identifier, unique within a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for resources created in the client.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// GeoJSON geometry of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        /// Coordinates as [longitude, latitude].
        coordinates: [f64; 2],
    },

    LineString { coordinates: Vec<[f64; 2]> },

    /// First ring is exterior, the rest are holes.
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

impl Geometry {
    /// Polygon covering a bounding box.
    pub fn from_bbox(bbox: &BoundingBox) -> Self {
        Geometry::Polygon {
            coordinates: vec![bbox.to_polygon_ring()],
        }
    }
}

/// A request the client can issue for an offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Operation name, e.g. `GetMap`.
    pub code: String,
    pub method: String,
    pub href: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Operation {
    pub fn get(code: impl Into<String>, href: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            code: code.into(),
            method: "GET".to_string(),
            href: href.into(),
            mime_type: mime_type.map(str::to_string),
        }
    }
}

/// A service endpoint through which a resource can be displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

impl Offering {
    /// WMS offering with GetCapabilities and GetMap operations.
    pub fn wms(capabilities_href: &str, get_map_href: &str, format: &str) -> Self {
        Self {
            code: WMS_OFFERING_CODE.to_string(),
            operations: vec![
                Operation::get("GetCapabilities", capabilities_href, Some("text/xml")),
                Operation::get("GetMap", get_map_href, Some(format)),
            ],
            extension: Map::new(),
        }
    }

    pub fn operation(&self, code: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|op| op.code.eq_ignore_ascii_case(code))
    }
}

/// Properties of a resource. Keys the engine does not know are kept in
/// `extension` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProperties {
    pub folder: FolderPath,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offerings: Vec<Offering>,
    #[serde(rename = "minscaledenominator", default, skip_serializing_if = "Option::is_none")]
    pub min_scale_denominator: Option<f64>,
    #[serde(rename = "maxscaledenominator", default, skip_serializing_if = "Option::is_none")]
    pub max_scale_denominator: Option<f64>,
    /// Reference systems this resource can be drawn in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crs: Vec<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

impl ResourceProperties {
    pub fn new(folder: FolderPath, title: impl Into<String>) -> Self {
        Self {
            folder,
            title: title.into(),
            active: false,
            abstract_: None,
            updated: None,
            offerings: Vec::new(),
            min_scale_denominator: None,
            max_scale_denominator: None,
            crs: Vec::new(),
            extension: Map::new(),
        }
    }
}

/// One node of the layer tree. Its position is entirely encoded in
/// `properties.folder`; there are no child or parent references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Type identifier (always "Feature").
    #[serde(rename = "type")]
    pub type_: String,
    pub id: ResourceId,
    pub properties: ResourceProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Resource {
    /// New inactive root resource at `/0`. Insertion into a context assigns
    /// the real folder.
    pub fn new(id: ResourceId, title: impl Into<String>) -> Self {
        Self::with_folder(id, FolderPath::root(0), title)
    }

    pub fn with_folder(id: ResourceId, folder: FolderPath, title: impl Into<String>) -> Self {
        Self {
            type_: "Feature".to_string(),
            id,
            properties: ResourceProperties::new(folder, title),
            bbox: None,
            geometry: None,
        }
    }

    /// Set the bounding box and derive a polygon geometry from it.
    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.geometry = Some(Geometry::from_bbox(&bbox));
        self.bbox = Some(bbox);
        self
    }

    pub fn with_offering(mut self, offering: Offering) -> Self {
        self.properties.offerings.push(offering);
        self
    }

    pub fn with_crs<I, S>(mut self, crs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties.crs = crs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.properties.active = active;
        self
    }

    pub fn folder(&self) -> &FolderPath {
        &self.properties.folder
    }

    pub fn title(&self) -> &str {
        &self.properties.title
    }

    pub fn is_active(&self) -> bool {
        self.properties.active
    }

    pub fn depth(&self) -> usize {
        self.properties.folder.depth()
    }

    pub fn index(&self) -> usize {
        self.properties.folder.index()
    }

    /// `None` for roots; the super-root above them has no folder.
    pub fn parent_folder(&self) -> Option<FolderPath> {
        self.properties.folder.parent()
    }

    pub fn is_ancestor_of(&self, other: &Resource) -> bool {
        self.folder().is_ancestor_of(other.folder())
    }

    pub fn is_descendant_of(&self, other: &Resource) -> bool {
        self.folder().is_descendant_of(other.folder())
    }

    pub fn is_child_of(&self, other: &Resource) -> bool {
        self.is_descendant_of(other) && self.depth() == other.depth() + 1
    }

    pub fn is_parent_of(&self, other: &Resource) -> bool {
        other.is_child_of(self)
    }

    /// Same parent, not the same resource. Roots are never siblings.
    pub fn is_sibling_of(&self, other: &Resource) -> bool {
        self.id != other.id
            && self.depth() >= 1
            && other.depth() >= 1
            && self.parent_folder() == other.parent_folder()
    }

    pub fn wms_offering(&self) -> Option<&Offering> {
        self.properties
            .offerings
            .iter()
            .find(|o| o.code == WMS_OFFERING_CODE)
    }

    pub fn get_map_href(&self) -> Option<&str> {
        self.wms_offering()?
            .operation("GetMap")
            .map(|op| op.href.as_str())
    }

    pub fn get_capabilities_href(&self) -> Option<&str> {
        self.wms_offering()?
            .operation("GetCapabilities")
            .map(|op| op.href.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(id: &str, folder: &str) -> Resource {
        Resource::with_folder(ResourceId::new(id), folder.parse().unwrap(), id)
    }

    #[test]
    fn test_relationships() {
        let root = res("root", "/0");
        let a = res("a", "/0/0");
        let b = res("b", "/0/1");
        let a0 = res("a0", "/0/0/0");

        assert!(root.is_ancestor_of(&a0));
        assert!(a0.is_descendant_of(&root));
        assert!(a.is_parent_of(&a0));
        assert!(a0.is_child_of(&a));
        assert!(!a0.is_child_of(&root));
        assert!(a.is_sibling_of(&b));
        assert!(!a.is_sibling_of(&a));
        assert!(!a0.is_sibling_of(&b));
        assert_eq!(a0.parent_folder().unwrap().to_string(), "/0/0");
        assert!(root.parent_folder().is_none());
    }

    #[test]
    fn test_roots_are_not_siblings() {
        assert!(!res("x", "/0").is_sibling_of(&res("y", "/1")));
    }

    #[test]
    fn test_wms_offering_lookup() {
        let r = res("wald", "/0/1").with_offering(Offering::wms(
            "https://example.org/wms?SERVICE=WMS&REQUEST=GetCapabilities",
            "https://example.org/wms?SERVICE=WMS&REQUEST=GetMap&LAYERS=wald",
            "image/png",
        ));
        assert!(r.get_map_href().unwrap().contains("LAYERS=wald"));
        assert!(r.get_capabilities_href().unwrap().contains("GetCapabilities"));
        assert!(res("x", "/0").get_map_href().is_none());
    }

    #[test]
    fn test_feature_json_keeps_unknown_properties() {
        let json = r#"{
            "type": "Feature",
            "id": "wald",
            "properties": {
                "folder": "/0/1",
                "title": "Wald",
                "active": true,
                "opacity": 0.5
            },
            "bbox": [6.0, 49.0, 8.5, 51.0],
            "geometry": null
        }"#;
        let r: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(r.folder().to_string(), "/0/1");
        assert!(r.is_active());
        assert_eq!(r.properties.extension["opacity"], 0.5);

        let out = serde_json::to_value(&r).unwrap();
        assert_eq!(out["properties"]["opacity"], 0.5);
        assert_eq!(out["properties"]["folder"], "/0/1");
        assert_eq!(out["type"], "Feature");
    }

    #[test]
    fn test_with_bbox_sets_polygon() {
        let r = res("a", "/0").with_bbox(BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        match r.geometry {
            Some(Geometry::Polygon { ref coordinates }) => assert_eq!(coordinates[0].len(), 5),
            _ => panic!("expected polygon"),
        }
    }
}
