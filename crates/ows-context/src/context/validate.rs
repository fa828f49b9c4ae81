//! Structural checks over the flat resource order.

use std::collections::HashSet;

use super::OwsContext;
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::Resource;

impl OwsContext {
    /// Check that the resource order is a gap-free pre-order traversal.
    ///
    /// Fails on the first offending resource with its index and the reason.
    pub fn validate_folder_structure(&self) -> ContextResult<()> {
        validate_features(&self.features)
    }
}

pub(crate) fn validate_features(features: &[Resource]) -> ContextResult<()> {
    let mut seen = HashSet::with_capacity(features.len());

    for (index, resource) in features.iter().enumerate() {
        if !seen.insert(&resource.id) {
            return Err(OwsContextError::DuplicateId(resource.id.clone()));
        }

        let folder = resource.folder();
        let reason = match index {
            0 if folder.segments() != [0] => Some("first resource must be /0".to_string()),
            0 => None,
            _ => successor_violation(features[index - 1].folder(), folder),
        };

        if let Some(reason) = reason {
            return Err(OwsContextError::InvalidFolderStructure {
                index,
                folder: folder.to_string(),
                reason,
            });
        }
    }
    Ok(())
}

/// Why `next` cannot directly follow `prev` in pre-order, if it cannot.
///
/// `next` must be the first child of `prev`, or the next sibling of `prev`
/// or of one of its ancestors.
fn successor_violation(prev: &FolderPath, next: &FolderPath) -> Option<String> {
    let p = prev.segments();
    let n = next.segments();

    if n.len() > p.len() + 1 {
        return Some(format!("skips a depth level after {}", prev));
    }

    if n.len() == p.len() + 1 {
        if n[..p.len()] != *p {
            return Some(format!("out of pre-order after {}", prev));
        }
        if n[p.len()] != 0 {
            return Some(format!("first child of {} must have index 0", prev));
        }
        return None;
    }

    let k = n.len() - 1;
    if n[..k] != p[..k] {
        return Some(format!("out of pre-order after {}", prev));
    }
    match n[k].cmp(&(p[k] + 1)) {
        std::cmp::Ordering::Equal => None,
        std::cmp::Ordering::Less => Some(format!("not after {} in sibling order", prev)),
        std::cmp::Ordering::Greater => Some(format!("sibling index gap after {}", prev)),
    }
}
