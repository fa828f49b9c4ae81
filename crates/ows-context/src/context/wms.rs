//! Building context subtrees from WMS capabilities.

use tracing::info;
use wms_protocol::{get_capabilities_url, get_map_url, WmsCapabilities};

use super::{update_folders, CapabilitiesEntry, OwsContext};
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::{Offering, Resource, ResourceId};

const PREFERRED_FORMAT: &str = "image/png";

/// One resource per capabilities layer, in document order, rooted at
/// `/{root_index}`.
///
/// Named layers get a WMS offering; unnamed grouping layers only carry
/// title, extent and reference systems.
pub fn resources_from_capabilities(
    href: &str,
    capabilities: &WmsCapabilities,
    root_index: usize,
) -> ContextResult<Vec<Resource>> {
    let get_map_base = capabilities.get_map_href.as_deref().unwrap_or(href);
    let capabilities_base = capabilities
        .get_capabilities_href
        .as_deref()
        .unwrap_or(href);
    let format = if capabilities
        .get_map_formats
        .iter()
        .any(|f| f == PREFERRED_FORMAT)
        || capabilities.get_map_formats.is_empty()
    {
        PREFERRED_FORMAT
    } else {
        capabilities.get_map_formats[0].as_str()
    };

    let capabilities_url = get_capabilities_url(capabilities_base, &capabilities.version)
        .map_err(|source| OwsContextError::InvalidUrl {
            href: capabilities_base.to_string(),
            source,
        })?;

    let mut resources = Vec::with_capacity(capabilities.root_layer.layer_count());
    for (depth, layer) in capabilities.root_layer.iter_preorder() {
        let title = if layer.title.is_empty() {
            layer.name.clone().unwrap_or_default()
        } else {
            layer.title.clone()
        };

        // placeholder folder of the right depth, renumbered below
        let folder = (0..depth).fold(FolderPath::root(0), |p, _| p.child(0));
        let mut resource = Resource::with_folder(ResourceId::generate(), folder, title)
            .with_crs(layer.crs.iter().cloned());
        resource.properties.abstract_ = layer.abstract_.clone();
        resource.properties.min_scale_denominator = layer.min_scale_denominator;
        resource.properties.max_scale_denominator = layer.max_scale_denominator;
        if let Some(bbox) = layer.geographic_bbox {
            resource = resource.with_bbox(bbox);
        }

        if let Some(name) = &layer.name {
            let style = layer.styles.first().map(String::as_str);
            let map_url = get_map_url(get_map_base, &capabilities.version, name, style, format)
                .map_err(|source| OwsContextError::InvalidUrl {
                    href: get_map_base.to_string(),
                    source,
                })?;
            resource = resource.with_offering(Offering::wms(
                capabilities_url.as_str(),
                map_url.as_str(),
                format,
            ));
        }

        resources.push(resource);
    }

    update_folders(&mut resources, None, root_index)?;
    Ok(resources)
}

impl OwsContext {
    /// Append the layer tree of a capabilities document as a new root.
    ///
    /// Appending the same `href` again adds another subtree and replaces the
    /// stored document.
    pub fn append_wms(
        &mut self,
        href: &str,
        capabilities: WmsCapabilities,
    ) -> ContextResult<Vec<ResourceId>> {
        let root_index = self.get_next_root_id();
        let resources = resources_from_capabilities(href, &capabilities, root_index)?;
        let ids: Vec<ResourceId> = resources.iter().map(|r| r.id.clone()).collect();

        let mut staged = self.features.clone();
        staged.extend(resources);
        self.commit(staged)?;

        let entry = self
            .capabilities_map
            .entry(href.to_string())
            .or_insert_with(|| CapabilitiesEntry {
                capabilities: capabilities.clone(),
                resources: Vec::new(),
            });
        entry.capabilities = capabilities;
        entry.resources.extend(ids.iter().cloned());
        self.refresh_crs_intersection();

        info!(href, root = root_index, layers = ids.len(), "appended WMS");
        Ok(ids)
    }
}
