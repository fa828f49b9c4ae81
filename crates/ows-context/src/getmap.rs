//! Batching of GetMap requests for the active layers.
//!
//! Consecutive drawable resources that talk to the same endpoint (origin,
//! path, SERVICE and VERSION) are served by one GetMap request listing all
//! of their layers. Batches follow document order and never cross from one
//! root tree into the next.

use serde::Serialize;
use tracing::debug;
use url::Url;
use wms_protocol::{get_param, merge_layer_params, GetMapKey};

use crate::context::OwsContext;
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::ResourceId;

/// One GetMap request covering one or more layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetMapBatch {
    /// Root resource of the tree the batch belongs to.
    pub root: ResourceId,
    pub url: Url,
    pub layers: Vec<String>,
}

impl OwsContext {
    /// GetMap requests needed to draw the active resources.
    ///
    /// A resource contributes when it is active and has a GetMap operation.
    /// Its descendants are then skipped: a named WMS layer draws its
    /// sublayers itself.
    pub fn optimized_get_map_urls(&self) -> ContextResult<Vec<GetMapBatch>> {
        let mut batches: Vec<GetMapBatch> = Vec::new();
        let mut open: Option<(GetMapKey, GetMapBatch)> = None;
        let mut covered: Option<&FolderPath> = None;
        let mut root: Option<&ResourceId> = None;

        for resource in &self.features {
            if resource.depth() == 0 {
                root = Some(&resource.id);
                batches.extend(open.take().map(|(_, batch)| batch));
            }
            if covered.is_some_and(|c| c.is_ancestor_of(resource.folder())) {
                continue;
            }
            if !resource.is_active() {
                continue;
            }
            let Some(href) = resource.get_map_href() else {
                continue;
            };

            let url = Url::parse(href).map_err(|source| OwsContextError::InvalidUrl {
                href: href.to_string(),
                source,
            })?;
            covered = Some(resource.folder());

            let key = GetMapKey::from_url(&url);
            let layers: Vec<String> = get_param(&url, "LAYERS")
                .map(|v| v.split(',').filter(|l| !l.is_empty()).map(str::to_string).collect())
                .unwrap_or_default();

            match open.as_mut() {
                Some((open_key, batch)) if *open_key == key => {
                    merge_layer_params(&mut batch.url, &url);
                    batch.layers.extend(layers);
                }
                _ => {
                    batches.extend(open.take().map(|(_, batch)| batch));
                    let root = root.unwrap_or(&resource.id).clone();
                    open = Some((key, GetMapBatch { root, url, layers }));
                }
            }
        }
        batches.extend(open.map(|(_, batch)| batch));

        debug!(batches = batches.len(), "computed GetMap batches");
        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{Offering, Resource};

    fn layer(id: &str, folder: &str, base: &str, name: &str) -> Resource {
        let href = format!("{}?SERVICE=WMS&VERSION=1.3.0&REQUEST=GetMap&LAYERS={}", base, name);
        Resource::with_folder(ResourceId::new(id), folder.parse().unwrap(), id)
            .with_offering(Offering::wms(base, &href, "image/png"))
            .with_active(true)
    }

    fn folder(id: &str, path: &str) -> Resource {
        Resource::with_folder(ResourceId::new(id), path.parse().unwrap(), id).with_active(true)
    }

    #[test]
    fn test_merges_consecutive_same_endpoint() {
        let ctx = OwsContext::new(vec![
            folder("root", "/0"),
            layer("a", "/0/0", "https://a.example/wms", "a"),
            layer("b", "/0/1", "https://a.example/wms", "b"),
            layer("c", "/0/2", "https://c.example/wms", "c"),
            layer("d", "/0/3", "https://a.example/wms", "d"),
        ])
        .unwrap();

        let batches = ctx.optimized_get_map_urls().unwrap();
        let layers: Vec<Vec<String>> = batches.iter().map(|b| b.layers.clone()).collect();
        assert_eq!(layers, vec![vec!["a", "b"], vec!["c"], vec!["d"]]);
        assert_eq!(get_param(&batches[0].url, "LAYERS").as_deref(), Some("a,b"));
        assert!(batches.iter().all(|b| b.root.as_str() == "root"));
    }

    #[test]
    fn test_skips_inactive_and_covered() {
        let mut group = layer("g", "/0", "https://a.example/wms", "group");
        group.properties.active = true;
        let mut inactive = layer("x", "/1/0", "https://a.example/wms", "x");
        inactive.properties.active = false;

        let ctx = OwsContext::new(vec![
            group,
            layer("g0", "/0/0", "https://a.example/wms", "g0"),
            folder("other", "/1"),
            inactive,
            layer("y", "/1/1", "https://a.example/wms", "y"),
        ])
        .unwrap();

        let batches = ctx.optimized_get_map_urls().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].layers, vec!["group"]);
        assert_eq!(batches[1].layers, vec!["y"]);
        assert_eq!(batches[1].root.as_str(), "other");
    }

    #[test]
    fn test_version_change_starts_new_batch() {
        let mut old = layer("b", "/0/1", "https://a.example/wms", "b");
        old.properties.offerings[0].operations[1].href =
            "https://a.example/wms?SERVICE=WMS&VERSION=1.1.1&REQUEST=GetMap&LAYERS=b".to_string();
        let ctx = OwsContext::new(vec![
            folder("root", "/0"),
            layer("a", "/0/0", "https://a.example/wms", "a"),
            old,
        ])
        .unwrap();
        assert_eq!(ctx.optimized_get_map_urls().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_href() {
        let mut bad = layer("a", "/0", "https://a.example/wms", "a");
        bad.properties.offerings[0].operations[1].href = "not a url".to_string();
        let ctx = OwsContext::new(vec![bad]).unwrap();
        assert!(matches!(
            ctx.optimized_get_map_urls(),
            Err(OwsContextError::InvalidUrl { .. })
        ));
    }
}
