//! Common test fixtures for OWS Context tests.
//!
//! The "Karte RP" tree is a state-wide map with themed layer groups:
//!
//! ```text
//! /0        Karte RP
//! /0/0        Landesfläche      (Land 0 .. Land 3)
//! /0/1        Wald              (Wald 0 .. Wald 4)
//! /0/2        Sonderkultur      (Weinbau, Obstbau)
//! /0/3..18    Thema 3 .. Thema 18
//! /1        Hintergrundkarten (Luftbild, Topographie)
//! ```

use serde_json::{json, Value};

/// WMS serving the Landesfläche layers.
pub const LAND_WMS: &str = "https://geodienste.example.org/wms/landesflaeche";

/// WMS serving the Wald layers.
pub const WALD_WMS: &str = "https://geodienste.example.org/wms/wald";

/// WMS serving the background maps.
pub const BASEMAP_WMS: &str = "https://basemap.example.org/wms";

/// One resource of a fixture tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureEntry {
    pub id: &'static str,
    pub folder: &'static str,
    pub title: String,
    /// `(service, layer name)` for resources with a WMS offering.
    pub wms: Option<(&'static str, &'static str)>,
    pub crs: &'static [&'static str],
}

impl FixtureEntry {
    fn group(id: &'static str, folder: &'static str, title: impl Into<String>) -> Self {
        Self {
            id,
            folder,
            title: title.into(),
            wms: None,
            crs: &[],
        }
    }

    fn layer(
        id: &'static str,
        folder: &'static str,
        title: impl Into<String>,
        service: &'static str,
        crs: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            folder,
            title: title.into(),
            wms: Some((service, id)),
            crs,
        }
    }
}

const LAND_CRS: &[&str] = &["EPSG:25832", "EPSG:4326", "EPSG:3857"];
const WALD_CRS: &[&str] = &["EPSG:25832", "EPSG:4326"];
const BASEMAP_CRS: &[&str] = &["EPSG:3857", "EPSG:25832"];

const THEMA_IDS: [&str; 16] = [
    "thema-3", "thema-4", "thema-5", "thema-6", "thema-7", "thema-8", "thema-9", "thema-10",
    "thema-11", "thema-12", "thema-13", "thema-14", "thema-15", "thema-16", "thema-17",
    "thema-18",
];

const THEMA_FOLDERS: [&str; 16] = [
    "/0/3", "/0/4", "/0/5", "/0/6", "/0/7", "/0/8", "/0/9", "/0/10", "/0/11", "/0/12", "/0/13",
    "/0/14", "/0/15", "/0/16", "/0/17", "/0/18",
];

/// The Karte RP tree in pre-order.
pub fn karte_rp_entries() -> Vec<FixtureEntry> {
    let mut entries = vec![
        FixtureEntry::group("karte-rp", "/0", "Karte RP"),
        FixtureEntry::group("landesflaeche", "/0/0", "Landesfläche"),
        FixtureEntry::layer("land-0", "/0/0/0", "Land 0", LAND_WMS, LAND_CRS),
        FixtureEntry::layer("land-1", "/0/0/1", "Land 1", LAND_WMS, LAND_CRS),
        FixtureEntry::layer("land-2", "/0/0/2", "Land 2", LAND_WMS, LAND_CRS),
        FixtureEntry::layer("land-3", "/0/0/3", "Land 3", LAND_WMS, LAND_CRS),
        FixtureEntry::group("wald", "/0/1", "Wald"),
        FixtureEntry::layer("wald-0", "/0/1/0", "Wald 0", WALD_WMS, WALD_CRS),
        FixtureEntry::layer("wald-1", "/0/1/1", "Wald 1", WALD_WMS, WALD_CRS),
        FixtureEntry::layer("wald-2", "/0/1/2", "Wald 2", WALD_WMS, WALD_CRS),
        FixtureEntry::layer("wald-3", "/0/1/3", "Wald 3", WALD_WMS, WALD_CRS),
        FixtureEntry::layer("wald-4", "/0/1/4", "Wald 4", WALD_WMS, WALD_CRS),
        FixtureEntry::group("sonderkultur", "/0/2", "Sonderkultur"),
        FixtureEntry::group("weinbau", "/0/2/0", "Weinbau"),
        FixtureEntry::group("obstbau", "/0/2/1", "Obstbau"),
    ];

    for (n, (id, folder)) in THEMA_IDS.into_iter().zip(THEMA_FOLDERS).enumerate() {
        entries.push(FixtureEntry::group(id, folder, format!("Thema {}", n + 3)));
    }

    entries.extend([
        FixtureEntry::group("hintergrund", "/1", "Hintergrundkarten"),
        FixtureEntry::layer("luftbild", "/1/0", "Luftbild", BASEMAP_WMS, BASEMAP_CRS),
        FixtureEntry::layer("topographie", "/1/1", "Topographie", BASEMAP_WMS, BASEMAP_CRS),
    ]);
    entries
}

/// GetMap URL the way a client would store it in an offering.
pub fn get_map_href(service: &str, layer: &str) -> String {
    format!(
        "{}?SERVICE=WMS&VERSION=1.3.0&REQUEST=GetMap&LAYERS={}&STYLES=&FORMAT=image%2Fpng",
        service, layer
    )
}

/// GeoJSON feature for one fixture entry.
pub fn feature_json(entry: &FixtureEntry) -> Value {
    let mut properties = json!({
        "folder": entry.folder,
        "title": entry.title,
        "active": false,
    });
    if let Some((service, layer)) = entry.wms {
        properties["offerings"] = json!([{
            "code": "http://www.opengis.net/spec/owc-geojson/1.0/req/wms",
            "operations": [
                {
                    "code": "GetCapabilities",
                    "method": "GET",
                    "href": format!("{}?SERVICE=WMS&REQUEST=GetCapabilities", service),
                    "type": "text/xml"
                },
                {
                    "code": "GetMap",
                    "method": "GET",
                    "href": get_map_href(service, layer),
                    "type": "image/png"
                }
            ]
        }]);
    }
    if !entry.crs.is_empty() {
        properties["crs"] = json!(entry.crs);
    }

    json!({
        "type": "Feature",
        "id": entry.id,
        "geometry": null,
        "properties": properties,
    })
}

/// The Karte RP tree as an OWS Context GeoJSON document.
pub fn karte_rp_document() -> Value {
    let features: Vec<Value> = karte_rp_entries().iter().map(feature_json).collect();
    json!({
        "type": "FeatureCollection",
        "id": "urn:uuid:0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0",
        "properties": {
            "title": "Karte RP",
            "lang": "de",
            "updated": "2024-03-01T12:00:00Z"
        },
        "features": features,
    })
}

/// [`karte_rp_document`] serialized.
pub fn karte_rp_json() -> String {
    karte_rp_document().to_string()
}

/// WMS 1.3.0 capabilities with a nested layer tree.
///
/// Layer tree: Naturschutz (unnamed) > Schutzgebiete (named group with
/// `nsg` and `lsg`), Biotope.
pub const NATURSCHUTZ_CAPABILITIES_130: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities version="1.3.0" xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink">
  <Service>
    <Name>WMS</Name>
    <Title>Naturschutz RP</Title>
    <Abstract>Schutzgebiete und Biotope</Abstract>
  </Service>
  <Capability>
    <Request>
      <GetCapabilities>
        <Format>text/xml</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:type="simple" xlink:href="https://natur.example.org/wms?"/></Get></HTTP></DCPType>
      </GetCapabilities>
      <GetMap>
        <Format>image/png</Format>
        <Format>image/jpeg</Format>
        <DCPType><HTTP><Get><OnlineResource xlink:type="simple" xlink:href="https://natur.example.org/wms?"/></Get></HTTP></DCPType>
      </GetMap>
    </Request>
    <Layer>
      <Title>Naturschutz</Title>
      <CRS>EPSG:4326</CRS>
      <CRS>EPSG:25832</CRS>
      <EX_GeographicBoundingBox>
        <westBoundLongitude>6.1</westBoundLongitude>
        <eastBoundLongitude>8.5</eastBoundLongitude>
        <southBoundLatitude>48.9</southBoundLatitude>
        <northBoundLatitude>50.9</northBoundLatitude>
      </EX_GeographicBoundingBox>
      <Layer queryable="1">
        <Name>schutzgebiete</Name>
        <Title>Schutzgebiete</Title>
        <CRS>EPSG:3857</CRS>
        <Layer queryable="1">
          <Name>nsg</Name>
          <Title>Naturschutzgebiete</Title>
          <Style><Name>default</Name><Title>Standard</Title></Style>
        </Layer>
        <Layer queryable="1">
          <Name>lsg</Name>
          <Title>Landschaftsschutzgebiete</Title>
          <MaxScaleDenominator>250000</MaxScaleDenominator>
        </Layer>
      </Layer>
      <Layer>
        <Name>biotope</Name>
        <Title>Biotope</Title>
      </Layer>
    </Layer>
  </Capability>
</WMS_Capabilities>"#;

/// WMS 1.1.1 capabilities with a flat layer list.
pub const GEWAESSER_CAPABILITIES_111: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<WMT_MS_Capabilities version="1.1.1">
  <Service>
    <Name>OGC:WMS</Name>
    <Title>Gewässer</Title>
  </Service>
  <Capability>
    <Request>
      <GetMap>
        <Format>image/gif</Format>
        <DCPType><HTTP><Get><OnlineResource xmlns:xlink="http://www.w3.org/1999/xlink" xlink:href="https://wasser.example.org/cgi-bin/wms?map=gewaesser&amp;"/></Get></HTTP></DCPType>
      </GetMap>
    </Request>
    <Layer>
      <Title>Gewässer</Title>
      <SRS>EPSG:4326 EPSG:31466</SRS>
      <LatLonBoundingBox minx="6.0" miny="49.0" maxx="8.6" maxy="51.0"/>
      <Layer>
        <Name>fluesse</Name>
        <Title>Flüsse</Title>
      </Layer>
      <Layer>
        <Name>seen</Name>
        <Title>Seen</Title>
      </Layer>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

/// Exception report returned by a failing service.
pub const SERVICE_EXCEPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="InvalidParameterValue">Unknown map file</ServiceException>
</ServiceExceptionReport>"#;
