//! WMS GetCapabilities parsing.
//!
//! Streams the document with quick-xml and keeps only what a map context
//! needs: the layer tree, the GetMap endpoint and the reference systems each
//! layer can be drawn in. Layer inheritance rules from WMS 1.3.0 section 7.2.4.8
//! (CRS and styles are additive, the geographic bounding box is replaced)
//! are applied after parsing.

use ows_common::{normalize_crs, BoundingBox};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum CapabilitiesError {
    #[error("XML parsing error at position {position}: {source}")]
    Xml {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),

    #[error("Invalid number in <{element}>: {value}")]
    InvalidNumber { element: String, value: String },

    #[error("Service exception: {0}")]
    ServiceException(String),

    #[error("Document is not a WMS capabilities document (root element <{0}>)")]
    UnexpectedRoot(String),

    #[error("Capabilities document has no root layer")]
    MissingRootLayer,
}

impl From<CapabilitiesError> for ows_common::OwsError {
    fn from(err: CapabilitiesError) -> Self {
        match err {
            CapabilitiesError::ServiceException(message) => {
                ows_common::OwsError::ServiceUnavailable(message)
            }
            other => ows_common::OwsError::InvalidCapabilities(other.to_string()),
        }
    }
}

/// Parsed WMS service description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WmsCapabilities {
    /// Protocol version announced by the root element.
    pub version: String,
    pub service_title: Option<String>,
    pub service_abstract: Option<String>,
    pub get_capabilities_href: Option<String>,
    pub get_map_href: Option<String>,
    pub get_map_formats: Vec<String>,
    pub root_layer: CapabilityLayer,
}

/// One `<Layer>` element with its nested layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityLayer {
    /// Present only for layers that can be requested in GetMap.
    pub name: Option<String>,
    pub title: String,
    pub abstract_: Option<String>,
    pub crs: Vec<String>,
    pub geographic_bbox: Option<BoundingBox>,
    pub styles: Vec<String>,
    pub min_scale_denominator: Option<f64>,
    pub max_scale_denominator: Option<f64>,
    pub queryable: bool,
    pub layers: Vec<CapabilityLayer>,
}

impl CapabilityLayer {
    /// Number of layers in this subtree, including this one.
    pub fn layer_count(&self) -> usize {
        1 + self.layers.iter().map(|l| l.layer_count()).sum::<usize>()
    }

    /// Layers of this subtree in document order, with depth relative to
    /// this layer.
    pub fn iter_preorder(&self) -> Vec<(usize, &CapabilityLayer)> {
        let mut out = Vec::with_capacity(self.layer_count());
        let mut stack = vec![(0usize, self)];
        while let Some((depth, layer)) = stack.pop() {
            out.push((depth, layer));
            for child in layer.layers.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Find a named layer anywhere in this subtree.
    pub fn find(&self, name: &str) -> Option<&CapabilityLayer> {
        self.iter_preorder()
            .into_iter()
            .map(|(_, l)| l)
            .find(|l| l.name.as_deref() == Some(name))
    }

    fn inherit(&mut self, parent_crs: &[String], parent_bbox: Option<BoundingBox>, parent_styles: &[String]) {
        let mut crs = parent_crs.to_vec();
        for code in self.crs.drain(..) {
            if !crs.contains(&code) {
                crs.push(code);
            }
        }
        self.crs = crs;

        // own styles first, the first one is what GetMap requests
        for style in parent_styles {
            if !self.styles.contains(style) {
                self.styles.push(style.clone());
            }
        }

        if self.geographic_bbox.is_none() {
            self.geographic_bbox = parent_bbox;
        }

        let (crs, bbox, styles) = (self.crs.clone(), self.geographic_bbox, self.styles.clone());
        for child in &mut self.layers {
            child.inherit(&crs, bbox, &styles);
        }
    }
}

impl WmsCapabilities {
    /// Parse a GetCapabilities response body.
    #[instrument(skip_all, fields(len = xml.len()))]
    pub fn parse(xml: &str) -> Result<Self, CapabilitiesError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut parser = CapabilitiesParser::default();
        let mut buf = Vec::new();

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|source| CapabilitiesError::Xml {
                    position: reader.buffer_position(),
                    source,
                })?;
            match event {
                Event::Start(e) => {
                    let name = local_name(&e);
                    parser.open(&name, &e)?;
                    parser.path.push(name);
                    parser.text.clear();
                }
                Event::Empty(e) => {
                    let name = local_name(&e);
                    parser.open(&name, &e)?;
                    parser.path.push(name);
                    parser.text.clear();
                    parser.close()?;
                }
                Event::Text(t) => {
                    let text = t.unescape().map_err(|source| CapabilitiesError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    parser.text.push_str(&text);
                }
                Event::CData(t) => {
                    parser.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
                Event::End(_) => {
                    parser.close()?;
                    parser.text.clear();
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        parser.finish()
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, CapabilitiesError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| CapabilitiesError::InvalidAttribute(err.to_string()))?;
        let local = attr.key.local_name();
        if local.as_ref() == key.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| CapabilitiesError::InvalidAttribute(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn parse_number(element: &str, value: &str) -> Result<f64, CapabilitiesError> {
    value.trim().parse().map_err(|_| CapabilitiesError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    })
}

/// Partial `EX_GeographicBoundingBox` while its children are read.
#[derive(Debug, Default)]
struct PendingBbox {
    west: Option<f64>,
    east: Option<f64>,
    south: Option<f64>,
    north: Option<f64>,
}

#[derive(Debug, Default)]
struct CapabilitiesParser {
    path: Vec<String>,
    text: String,
    version: Option<String>,
    service_title: Option<String>,
    service_abstract: Option<String>,
    get_capabilities_href: Option<String>,
    get_map_href: Option<String>,
    get_map_formats: Vec<String>,
    layer_stack: Vec<CapabilityLayer>,
    root_layer: Option<CapabilityLayer>,
    pending_bbox: Option<PendingBbox>,
    exception: Option<String>,
}

impl CapabilitiesParser {
    fn parent(&self) -> Option<&str> {
        self.path.last().map(String::as_str)
    }

    fn within(&self, ancestor: &str) -> bool {
        self.path.iter().any(|p| p == ancestor)
    }

    fn open(&mut self, name: &str, e: &BytesStart<'_>) -> Result<(), CapabilitiesError> {
        if self.path.is_empty() {
            match name {
                "WMS_Capabilities" | "WMT_MS_Capabilities" => {
                    self.version = attribute(e, "version")?;
                }
                "ServiceExceptionReport" | "ExceptionReport" => {}
                other => return Err(CapabilitiesError::UnexpectedRoot(other.to_string())),
            }
            return Ok(());
        }

        match name {
            "Layer" => {
                let queryable = attribute(e, "queryable")?
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false);
                self.layer_stack.push(CapabilityLayer {
                    queryable,
                    ..Default::default()
                });
            }
            "EX_GeographicBoundingBox" if self.parent() == Some("Layer") => {
                self.pending_bbox = Some(PendingBbox::default());
            }
            "LatLonBoundingBox" if self.parent() == Some("Layer") => {
                let mut values = [0.0_f64; 4];
                for (slot, key) in values.iter_mut().zip(["minx", "miny", "maxx", "maxy"]) {
                    let raw = attribute(e, key)?.ok_or_else(|| {
                        CapabilitiesError::InvalidAttribute(format!(
                            "LatLonBoundingBox is missing '{}'",
                            key
                        ))
                    })?;
                    *slot = parse_number("LatLonBoundingBox", &raw)?;
                }
                if let Some(layer) = self.layer_stack.last_mut() {
                    layer.geographic_bbox = Some(values.into());
                }
            }
            "OnlineResource" if self.within("DCPType") && self.within("Get") => {
                let href = attribute(e, "href")?;
                if self.within("GetMap") {
                    self.get_map_href = href;
                } else if self.within("GetCapabilities") {
                    self.get_capabilities_href = href;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), CapabilitiesError> {
        let Some(name) = self.path.pop() else {
            return Ok(());
        };
        let text = self.text.trim().to_string();
        let parent = self.parent().map(str::to_string);

        match (name.as_str(), parent.as_deref()) {
            ("ServiceException" | "ExceptionText", _) => {
                self.exception = Some(text);
            }
            ("Title", Some("Service")) => self.service_title = Some(text),
            ("Abstract", Some("Service")) => self.service_abstract = Some(text),
            ("Format", Some("GetMap")) => self.get_map_formats.push(text),
            ("Layer", _) => {
                if let Some(layer) = self.layer_stack.pop() {
                    match self.layer_stack.last_mut() {
                        Some(parent_layer) => parent_layer.layers.push(layer),
                        None => {
                            if self.root_layer.is_none() {
                                self.root_layer = Some(layer);
                            } else {
                                debug!(title = %layer.title, "ignoring additional top-level layer");
                            }
                        }
                    }
                }
            }
            ("Name", Some("Layer")) => self.with_layer(|l| l.name = Some(text)),
            ("Title", Some("Layer")) => self.with_layer(|l| l.title = text),
            ("Abstract", Some("Layer")) => self.with_layer(|l| l.abstract_ = Some(text)),
            ("CRS" | "SRS", Some("Layer")) => {
                // WMS 1.1.1 allows several codes separated by whitespace
                let codes: Vec<String> = text.split_whitespace().map(normalize_crs).collect();
                self.with_layer(|l| {
                    for code in codes {
                        if !l.crs.contains(&code) {
                            l.crs.push(code);
                        }
                    }
                });
            }
            ("Name", Some("Style")) if self.within("Layer") => {
                self.with_layer(|l| l.styles.push(text));
            }
            ("MinScaleDenominator", Some("Layer")) => {
                let value = parse_number(&name, &text)?;
                self.with_layer(|l| l.min_scale_denominator = Some(value));
            }
            ("MaxScaleDenominator", Some("Layer")) => {
                let value = parse_number(&name, &text)?;
                self.with_layer(|l| l.max_scale_denominator = Some(value));
            }
            (
                "westBoundLongitude" | "eastBoundLongitude" | "southBoundLatitude"
                | "northBoundLatitude",
                Some("EX_GeographicBoundingBox"),
            ) => {
                let value = parse_number(&name, &text)?;
                if let Some(pending) = self.pending_bbox.as_mut() {
                    match name.as_str() {
                        "westBoundLongitude" => pending.west = Some(value),
                        "eastBoundLongitude" => pending.east = Some(value),
                        "southBoundLatitude" => pending.south = Some(value),
                        _ => pending.north = Some(value),
                    }
                }
            }
            ("EX_GeographicBoundingBox", _) => {
                if let Some(PendingBbox {
                    west: Some(w),
                    east: Some(e),
                    south: Some(s),
                    north: Some(n),
                }) = self.pending_bbox.take()
                {
                    self.with_layer(|l| l.geographic_bbox = Some(BoundingBox::new(w, s, e, n)));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn with_layer(&mut self, f: impl FnOnce(&mut CapabilityLayer)) {
        if let Some(layer) = self.layer_stack.last_mut() {
            f(layer);
        }
    }

    fn finish(self) -> Result<WmsCapabilities, CapabilitiesError> {
        if let Some(message) = self.exception {
            return Err(CapabilitiesError::ServiceException(message));
        }
        let mut root_layer = self.root_layer.ok_or(CapabilitiesError::MissingRootLayer)?;
        root_layer.inherit(&[], None, &[]);

        debug!(
            version = ?self.version,
            layers = root_layer.layer_count(),
            "parsed capabilities"
        );

        Ok(WmsCapabilities {
            version: self.version.unwrap_or_else(|| crate::DEFAULT_VERSION.to_string()),
            service_title: self.service_title,
            service_abstract: self.service_abstract,
            get_capabilities_href: self.get_capabilities_href,
            get_map_href: self.get_map_href,
            get_map_formats: self.get_map_formats,
            root_layer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WMS_130: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>Karte RP</Title>
    <Abstract>Landesdienst</Abstract>
  </Service>
  <Capability>
    <Request>
      <GetCapabilities>
        <Format>text/xml</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="https://example.org/wms?"/></Get></HTTP></DCPType>
      </GetCapabilities>
      <GetMap>
        <Format>image/png</Format>
        <Format>image/jpeg</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:href="https://example.org/wms?map=rp&amp;"/></Get></HTTP></DCPType>
      </GetMap>
    </Request>
    <Layer>
      <Title>Karte RP</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>epsg:25832</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>6.1</westBoundLongitude>
        <eastBoundLongitude>8.5</eastBoundLongitude>
        <southBoundLatitude>48.9</southBoundLatitude>
        <northBoundLatitude>50.9</northBoundLatitude>
      </EX_GeographicBoundingBox>
      <Layer queryable="1">
        <Name>wald</Name>
        <Title>Wald</Title>
        <CRS>EPSG:3857</CRS>
        <Style><Name>default</Name><Title>Default</Title></Style>
        <MaxScaleDenominator>500000</MaxScaleDenominator>
        <Layer>
          <Name>wald_0</Name>
          <Title>Wald 0</Title>
        </Layer>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

    #[test]
    fn test_parse_wms_130() {
        let caps = WmsCapabilities::parse(WMS_130).unwrap();
        assert_eq!(caps.version, "1.3.0");
        assert_eq!(caps.service_title.as_deref(), Some("Karte RP"));
        assert_eq!(caps.get_map_href.as_deref(), Some("https://example.org/wms?map=rp&"));
        assert_eq!(caps.get_capabilities_href.as_deref(), Some("https://example.org/wms?"));
        assert_eq!(caps.get_map_formats, vec!["image/png", "image/jpeg"]);

        let root = &caps.root_layer;
        assert_eq!(root.title, "Karte RP");
        assert!(root.name.is_none());
        assert_eq!(root.layer_count(), 3);

        let wald = root.find("wald").unwrap();
        assert!(wald.queryable);
        assert_eq!(wald.crs, vec!["EPSG:4326", "EPSG:25832", "EPSG:3857"]);
        assert_eq!(wald.max_scale_denominator, Some(500000.0));
        assert_eq!(wald.geographic_bbox, Some(BoundingBox::new(6.1, 48.9, 8.5, 50.9)));

        let wald_0 = root.find("wald_0").unwrap();
        assert_eq!(wald_0.styles, vec!["default"]);
        assert_eq!(wald_0.crs.len(), 3);
    }

    #[test]
    fn test_preorder_depths() {
        let caps = WmsCapabilities::parse(WMS_130).unwrap();
        let depths: Vec<(usize, &str)> = caps
            .root_layer
            .iter_preorder()
            .into_iter()
            .map(|(d, l)| (d, l.title.as_str()))
            .collect();
        assert_eq!(depths, vec![(0, "Karte RP"), (1, "Wald"), (2, "Wald 0")]);
    }

    #[test]
    fn test_service_exception() {
        let xml = r#"<ServiceExceptionReport version="1.3.0">
            <ServiceException code="InvalidFormat">Unknown request</ServiceException>
        </ServiceExceptionReport>"#;
        let err = WmsCapabilities::parse(xml).unwrap_err();
        assert!(matches!(err, CapabilitiesError::ServiceException(ref m) if m == "Unknown request"));
    }

    #[test]
    fn test_unexpected_root() {
        let err = WmsCapabilities::parse("<html><body/></html>").unwrap_err();
        assert!(matches!(err, CapabilitiesError::UnexpectedRoot(ref r) if r == "html"));
    }

    #[test]
    fn test_missing_layer() {
        let xml = r#"<WMS_Capabilities version="1.3.0"><Capability/></WMS_Capabilities>"#;
        assert!(matches!(
            WmsCapabilities::parse(xml),
            Err(CapabilitiesError::MissingRootLayer)
        ));
    }
    #[test]
    fn test_own_style_comes_before_inherited() {
        let xml = r#"<WMS_Capabilities version="1.3.0"><Capability>
            <Layer>
              <Title>Root</Title>
              <Style><Name>parentstyle</Name><Title>Parent</Title></Style>
              <Layer>
                <Name>child</Name>
                <Title>Child</Title>
                <Style><Name>ownstyle</Name><Title>Own</Title></Style>
              </Layer>
            </Layer>
        </Capability></WMS_Capabilities>"#;
        let caps = WmsCapabilities::parse(xml).unwrap();
        let child = caps.root_layer.find("child").unwrap();
        assert_eq!(child.styles, vec!["ownstyle", "parentstyle"]);
    }

    #[test]
    fn test_serialized_layer_tree() {
        let caps = WmsCapabilities::parse(WMS_130).unwrap();
        let value = serde_json::to_value(&caps).unwrap();
        assert_eq!(value["root_layer"]["title"], "Karte RP");
        assert_eq!(value["root_layer"]["layers"][0]["name"], "wald");
        assert_eq!(value["root_layer"]["layers"][0]["geographic_bbox"][0], 6.1);
    }

    #[test]
    fn test_into_ows_error() {
        let err: ows_common::OwsError = CapabilitiesError::ServiceException("down".into()).into();
        assert!(err.is_transient());
        let err: ows_common::OwsError = CapabilitiesError::MissingRootLayer.into();
        assert_eq!(err.exception_code(), "NoApplicableCode");
    }
}
