//! OWS Context GeoJSON encoding: the save/load format of a context.

use chrono::{DateTime, Utc};
use ows_common::BoundingBox;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::context::OwsContext;
use crate::error::{ContextResult, OwsContextError};
use crate::resource::Resource;

/// Conformance profile announced in saved documents.
pub const OWC_PROFILE: &str = "http://www.opengis.net/spec/owc-geojson/1.0/req/core";

/// Document-level metadata of a context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextProperties {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(flatten)]
    pub extension: Map<String, Value>,
}

/// A serialized context: a GeoJSON FeatureCollection whose features are the
/// resources in pre-order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwsContextDocument {
    pub id: String,

    /// Type identifier (always "FeatureCollection").
    #[serde(rename = "type")]
    pub type_: String,

    pub properties: ContextProperties,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,

    #[serde(default)]
    pub features: Vec<Resource>,
}

impl OwsContextDocument {
    pub fn from_json_str(json: &str) -> ContextResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string_pretty(&self) -> ContextResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl OwsContext {
    /// Load a context from its document. The feature order must already be
    /// a valid pre-order; it is checked, not repaired.
    pub fn from_document(document: OwsContextDocument) -> ContextResult<Self> {
        if document.type_ != "FeatureCollection" {
            return Err(OwsContextError::InvalidDocument(format!(
                "expected type FeatureCollection, got '{}'",
                document.type_
            )));
        }
        if let Some(feature) = document.features.iter().find(|f| f.type_ != "Feature") {
            return Err(OwsContextError::InvalidDocument(format!(
                "resource {} has type '{}', expected Feature",
                feature.id, feature.type_
            )));
        }

        let mut ctx = OwsContext::new(document.features)?;
        ctx.id = document.id;
        ctx.properties = document.properties;
        debug!(id = %ctx.id, resources = ctx.len(), "loaded context document");
        Ok(ctx)
    }

    pub fn to_document(&self) -> OwsContextDocument {
        let bbox = self
            .features
            .iter()
            .filter_map(|r| r.bbox)
            .reduce(|acc, b| acc.union(&b));

        let mut properties = self.properties.clone();
        properties
            .extension
            .entry("profile")
            .or_insert_with(|| Value::String(OWC_PROFILE.to_string()));

        OwsContextDocument {
            id: self.id.clone(),
            type_: "FeatureCollection".to_string(),
            properties,
            bbox,
            features: self.features.clone(),
        }
    }

    pub fn from_json_str(json: &str) -> ContextResult<Self> {
        Self::from_document(OwsContextDocument::from_json_str(json)?)
    }

    pub fn to_json_string_pretty(&self) -> ContextResult<String> {
        self.to_document().to_json_string_pretty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "id": "urn:uuid:karte-rp",
        "type": "FeatureCollection",
        "properties": { "title": "Karte RP", "lang": "de", "rights": "CC-BY" },
        "features": [
            { "type": "Feature", "id": "root", "geometry": null,
              "properties": { "folder": "/0", "title": "Karte RP" } },
            { "type": "Feature", "id": "wald", "geometry": null, "bbox": [6.0, 49.0, 7.0, 50.0],
              "properties": { "folder": "/0/0", "title": "Wald", "active": true, "crs": ["EPSG:4326"] } },
            { "type": "Feature", "id": "see", "geometry": null, "bbox": [7.0, 48.5, 8.0, 49.5],
              "properties": { "folder": "/0/1", "title": "See" } }
        ]
    }"#;

    #[test]
    fn test_load_document() {
        let ctx = OwsContext::from_json_str(DOC).unwrap();
        assert_eq!(ctx.id(), "urn:uuid:karte-rp");
        assert_eq!(ctx.properties().title, "Karte RP");
        assert_eq!(ctx.properties().extension["rights"], "CC-BY");
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.crs_intersection(), &["EPSG:4326".to_string()]);
    }

    #[test]
    fn test_save_document() {
        let ctx = OwsContext::from_json_str(DOC).unwrap();
        let doc = ctx.to_document();
        assert_eq!(doc.type_, "FeatureCollection");
        assert_eq!(doc.bbox, Some(BoundingBox::new(6.0, 48.5, 8.0, 50.0)));
        assert_eq!(doc.properties.extension["profile"], OWC_PROFILE);

        let reloaded = OwsContext::from_json_str(&ctx.to_json_string_pretty().unwrap()).unwrap();
        assert_eq!(reloaded.features(), ctx.features());
    }

    #[test]
    fn test_rejects_wrong_type() {
        let json = DOC.replacen("FeatureCollection", "Feature", 1);
        assert!(matches!(
            OwsContext::from_json_str(&json),
            Err(OwsContextError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_folder() {
        let json = DOC.replace("\"/0/1\"", "\"/0/x\"");
        assert!(matches!(
            OwsContext::from_json_str(&json),
            Err(OwsContextError::Json(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_order() {
        let json = DOC.replace("\"/0/1\"", "\"/0/2\"");
        assert!(matches!(
            OwsContext::from_json_str(&json),
            Err(OwsContextError::InvalidFolderStructure { index: 2, .. })
        ));
    }
}
