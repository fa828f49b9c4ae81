//! The context container: a flat, pre-ordered list of resources.

mod mutation;
mod query;
mod validate;
mod wms;

use ows_common::{normalize_crs, CrsCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use wms_protocol::WmsCapabilities;

use crate::document::ContextProperties;
use crate::error::ContextResult;
use crate::resource::{Resource, ResourceId};

pub use mutation::update_folders;
pub use wms::resources_from_capabilities;

/// Where a moved or inserted resource lands relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Position {
    /// Immediately before the target, as its sibling.
    Left,
    /// Immediately after the target, as its sibling.
    Right,
    FirstChild,
    LastChild,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Position::Left => "left",
            Position::Right => "right",
            Position::FirstChild => "firstChild",
            Position::LastChild => "lastChild",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "left" => Ok(Position::Left),
            "right" => Ok(Position::Right),
            "firstchild" => Ok(Position::FirstChild),
            "lastchild" => Ok(Position::LastChild),
            _ => Err(format!(
                "unknown position '{}', expected left, right, first-child or last-child",
                s
            )),
        }
    }
}

/// Result of a move request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing changed: no target, source equals target, or the source
    /// already sits at the requested place.
    Unchanged,
    Moved {
        from: crate::path::FolderPath,
        to: crate::path::FolderPath,
    },
}

/// A capabilities document and the resources built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitiesEntry {
    pub capabilities: WmsCapabilities,
    pub resources: Vec<ResourceId>,
}

/// Ordered layer tree of an OWS Context.
///
/// Cloning is cheap enough to be the way to get a new handle after an edit
/// (see [`OwsContext::with_mutation`]); mutation methods themselves are
/// all-or-nothing and leave `self` untouched when they fail.
#[derive(Debug, Clone)]
pub struct OwsContext {
    pub(crate) id: String,
    pub(crate) properties: ContextProperties,
    pub(crate) features: Vec<Resource>,
    pub(crate) capabilities_map: HashMap<String, CapabilitiesEntry>,
    pub(crate) crs_intersection: Vec<String>,
}

impl OwsContext {
    /// Context with no resources.
    pub fn empty() -> Self {
        Self {
            id: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            properties: ContextProperties::default(),
            features: Vec::new(),
            capabilities_map: HashMap::new(),
            crs_intersection: Vec::new(),
        }
    }

    /// Context over resources that are already in pre-order.
    ///
    /// The order is checked, not repaired.
    pub fn new(features: Vec<Resource>) -> ContextResult<Self> {
        validate::validate_features(&features)?;
        let mut ctx = Self {
            features,
            ..Self::empty()
        };
        ctx.refresh_crs_intersection();
        Ok(ctx)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &ContextProperties {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut ContextProperties {
        &mut self.properties
    }

    /// Resources in pre-order.
    pub fn features(&self) -> &[Resource] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn capabilities_map(&self) -> &HashMap<String, CapabilitiesEntry> {
        &self.capabilities_map
    }

    /// Reference systems shared by every active resource that declares any.
    pub fn crs_intersection(&self) -> &[String] {
        &self.crs_intersection
    }

    /// First shared reference system the client can draw natively.
    pub fn preferred_crs(&self) -> Option<CrsCode> {
        self.crs_intersection
            .iter()
            .find_map(|code| CrsCode::from_wms_string(code).ok())
    }

    /// Copy-on-write edit: clone, apply `f`, return the new context.
    ///
    /// `self` is never modified, so the old and new handles can be told
    /// apart by callers that track changes by identity.
    pub fn with_mutation<F, R>(&self, f: F) -> ContextResult<(Self, R)>
    where
        F: FnOnce(&mut Self) -> ContextResult<R>,
    {
        let mut next = self.clone();
        let result = f(&mut next)?;
        Ok((next, result))
    }

    /// Sort staged resources into pre-order, validate and swap them in.
    pub(crate) fn commit(&mut self, mut staged: Vec<Resource>) -> ContextResult<()> {
        staged.sort_by(|a, b| a.folder().cmp(b.folder()));
        if let Err(err) = validate::validate_features(&staged) {
            warn!(error = %err, "edit rejected, context left unchanged");
            return Err(err);
        }
        self.features = staged;
        Ok(())
    }

    pub(crate) fn refresh_crs_intersection(&mut self) {
        self.crs_intersection = compute_crs_intersection(&self.features);
    }
}

fn compute_crs_intersection(features: &[Resource]) -> Vec<String> {
    let mut intersection: Option<Vec<String>> = None;

    for resource in features
        .iter()
        .filter(|r| r.is_active() && !r.properties.crs.is_empty())
    {
        let codes: Vec<String> = resource.properties.crs.iter().map(|c| normalize_crs(c)).collect();
        intersection = Some(match intersection {
            None => {
                let mut first: Vec<String> = Vec::with_capacity(codes.len());
                for code in codes {
                    if !first.contains(&code) {
                        first.push(code);
                    }
                }
                first
            }
            Some(acc) => acc.into_iter().filter(|c| codes.contains(c)).collect(),
        });
    }

    intersection.unwrap_or_default()
}
