//! Common helpers for ows-context integration tests.

#![allow(dead_code)]

use ows_context::{OwsContext, Resource, ResourceId};

/// The Karte RP fixture loaded through the document reader.
pub fn karte_rp() -> OwsContext {
    OwsContext::from_json_str(&test_utils::karte_rp_json()).expect("fixture is a valid context")
}

pub fn id(s: &str) -> ResourceId {
    ResourceId::new(s)
}

pub fn ids(ctx: &OwsContext) -> Vec<&str> {
    ctx.features().iter().map(|r| r.id.as_str()).collect()
}

pub fn titles<'a>(resources: impl IntoIterator<Item = &'a Resource>) -> Vec<&'a str> {
    resources.into_iter().map(Resource::title).collect()
}

/// Ids of `target` and its descendants in pre-order.
pub fn subtree_ids(ctx: &OwsContext, target: &ResourceId) -> Vec<String> {
    let resource = ctx.get(target).expect("resource exists");
    ctx.get_descendants_of(resource, true)
        .into_iter()
        .map(|r| r.id.as_str().to_string())
        .collect()
}
