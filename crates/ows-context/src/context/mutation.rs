//! Structural edits: move, insert, remove, activate.
//!
//! Every structural edit works on a staged copy of the resource list and
//! only replaces the live list once the staged one passes validation.

use std::ops::Range;
use tracing::{debug, warn};

use super::{MoveOutcome, OwsContext, Position};
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::{Resource, ResourceId};

/// Rewrite the folders of a pre-ordered slice so that its first resource
/// becomes child number `start_index` of `new_parent` (a root when `None`).
///
/// The slice keeps its internal shape: further resources at the first
/// resource's depth take the following indices, deeper resources are
/// numbered from 0 under their new parent. Gaps in the old numbering are
/// closed, which makes `update_folders(all, None, 0)` a full re-compaction.
pub fn update_folders(
    subtree: &mut [Resource],
    new_parent: Option<&FolderPath>,
    start_index: usize,
) -> ContextResult<()> {
    let Some(first) = subtree.first() else {
        return Ok(());
    };
    let base = first.depth();

    // next free index per relative depth
    let mut counters: Vec<usize> = Vec::new();
    // assigned indices from the slice root down to the current resource
    let mut current: Vec<usize> = Vec::new();

    for (offset, resource) in subtree.iter_mut().enumerate() {
        let depth = resource.depth();
        if depth < base {
            return Err(OwsContextError::InvalidSubtree {
                offset,
                reason: format!("{} is above the first resource's depth", resource.folder()),
            });
        }
        let relative = depth - base;
        if relative > current.len() {
            return Err(OwsContextError::InvalidSubtree {
                offset,
                reason: format!("{} skips a depth level", resource.folder()),
            });
        }

        counters.truncate(relative + 1);
        current.truncate(relative);
        if counters.len() == relative {
            counters.push(if relative == 0 { start_index } else { 0 });
        }

        let index = counters[relative];
        counters[relative] += 1;
        current.push(index);

        resource.properties.folder = FolderPath::join(new_parent, &current).ok_or_else(|| {
            OwsContextError::InvalidSubtree {
                offset,
                reason: "empty folder path".to_string(),
            }
        })?;
    }
    Ok(())
}

/// Range of the subtree rooted at `pos` in a pre-ordered list.
fn subtree_range(features: &[Resource], pos: usize) -> Range<usize> {
    let root = features[pos].folder();
    let len = features[pos + 1..]
        .iter()
        .take_while(|r| root.is_ancestor_of(r.folder()))
        .count();
    pos..pos + 1 + len
}

/// Shift the sibling index at `parent`'s child depth for every resource at
/// or after `from_index` under `parent`, subtrees included.
fn shift_siblings(
    features: &mut [Resource],
    parent: Option<&FolderPath>,
    from_index: usize,
    delta: isize,
) {
    let depth = parent.map_or(0, |p| p.segments().len());
    for resource in features.iter_mut() {
        let folder = resource.folder();
        if folder.is_at_or_after(parent, from_index) {
            let shifted = folder
                .segment(depth)
                .unwrap_or(0)
                .saturating_add_signed(delta);
            resource.properties.folder = folder.with_segment(depth, shifted);
        }
    }
}

fn child_count(features: &[Resource], parent: &FolderPath) -> usize {
    features
        .iter()
        .filter(|r| r.depth() == parent.depth() + 1 && parent.is_ancestor_of(r.folder()))
        .count()
}

/// Parent and sibling index a resource placed at `position` relative to
/// `target` will occupy.
fn destination(
    features: &[Resource],
    target: &FolderPath,
    position: Position,
) -> (Option<FolderPath>, usize) {
    match position {
        Position::Left => (target.parent(), target.index()),
        Position::Right => (target.parent(), target.index() + 1),
        Position::FirstChild => (Some(target.clone()), 0),
        Position::LastChild => (Some(target.clone()), child_count(features, target)),
    }
}

impl OwsContext {
    /// Move the subtree of `source` next to or below `target`.
    ///
    /// A missing target, or a target equal to the source, leaves the
    /// context as it is. Moving a resource below one of its own
    /// descendants is rejected.
    pub fn move_feature(
        &mut self,
        source: &ResourceId,
        target: Option<&ResourceId>,
        position: Position,
    ) -> ContextResult<MoveOutcome> {
        let Some(target) = target else {
            debug!(source = %source, "move without target ignored");
            return Ok(MoveOutcome::Unchanged);
        };
        if source == target {
            debug!(source = %source, "move onto itself ignored");
            return Ok(MoveOutcome::Unchanged);
        }

        let src_pos = self
            .position(source)
            .ok_or_else(|| OwsContextError::ResourceNotFound(source.clone()))?;
        let target_resource = self.require(target)?;
        if target_resource.is_descendant_of(&self.features[src_pos]) {
            warn!(source = %source, target = %target, "refusing to move a resource below itself");
            return Err(OwsContextError::MoveIntoOwnSubtree {
                moved: source.clone(),
                target: target.clone(),
            });
        }

        let mut staged = self.features.clone();
        let range = subtree_range(&staged, src_pos);
        let mut subtree: Vec<Resource> = staged.drain(range).collect();
        let old_root = subtree[0].folder().clone();

        // close the gap the subtree leaves among its old siblings
        shift_siblings(
            &mut staged,
            old_root.parent().as_ref(),
            old_root.index() + 1,
            -1,
        );

        let target_folder = staged
            .iter()
            .find(|r| &r.id == target)
            .map(|r| r.folder().clone())
            .ok_or_else(|| OwsContextError::ResourceNotFound(target.clone()))?;
        let (new_parent, new_index) = destination(&staged, &target_folder, position);
        let new_root = FolderPath::under(new_parent.as_ref(), new_index);

        if new_root == old_root {
            debug!(source = %source, folder = %old_root, %position, "move to current position ignored");
            return Ok(MoveOutcome::Unchanged);
        }

        shift_siblings(&mut staged, new_parent.as_ref(), new_index, 1);
        update_folders(&mut subtree, new_parent.as_ref(), new_index)?;
        let moved = subtree.len();
        staged.extend(subtree);
        self.commit(staged)?;

        debug!(
            source = %source,
            target = %target,
            %position,
            from = %old_root,
            to = %new_root,
            moved,
            "moved resource"
        );
        Ok(MoveOutcome::Moved {
            from: old_root,
            to: new_root,
        })
    }

    /// Insert a single new resource relative to `target`, or as a new root
    /// after all existing roots when `target` is `None`.
    ///
    /// The folder stored in `resource` is ignored and replaced.
    pub fn insert_feature(
        &mut self,
        target: Option<&ResourceId>,
        mut resource: Resource,
        position: Position,
    ) -> ContextResult<ResourceId> {
        if self.get(&resource.id).is_some() {
            warn!(id = %resource.id, "refusing to insert a duplicate id");
            return Err(OwsContextError::DuplicateId(resource.id));
        }

        let (parent, index) = match target {
            Some(target) => {
                let target_folder = self.require(target)?.folder().clone();
                destination(&self.features, &target_folder, position)
            }
            None => (None, self.get_next_root_id()),
        };

        let mut staged = self.features.clone();
        shift_siblings(&mut staged, parent.as_ref(), index, 1);

        resource.properties.folder = FolderPath::under(parent.as_ref(), index);
        let at = staged.partition_point(|r| r.folder() < resource.folder());
        let id = resource.id.clone();
        debug!(id = %id, folder = %resource.folder(), at, "inserting resource");
        staged.insert(at, resource);

        self.commit(staged)?;
        self.refresh_crs_intersection();
        Ok(id)
    }

    /// Remove `target` with its whole subtree and re-compact all folders.
    ///
    /// Returns the removed resources in their former order.
    pub fn remove_feature(&mut self, target: &ResourceId) -> ContextResult<Vec<Resource>> {
        let pos = self
            .position(target)
            .ok_or_else(|| OwsContextError::ResourceNotFound(target.clone()))?;

        let mut staged = self.features.clone();
        let range = subtree_range(&staged, pos);
        let removed: Vec<Resource> = staged.drain(range).collect();
        update_folders(&mut staged, None, 0)?;
        self.commit(staged)?;

        self.capabilities_map.retain(|_, entry| {
            entry
                .resources
                .retain(|id| !removed.iter().any(|r| &r.id == id));
            !entry.resources.is_empty()
        });
        self.refresh_crs_intersection();

        debug!(target = %target, removed = removed.len(), "removed resource subtree");
        Ok(removed)
    }

    /// Set `active` on `target` and everything below it.
    ///
    /// Activating the last inactive child activates the parent as well
    /// (repeated upwards); deactivating clears every ancestor.
    pub fn activate_feature(&mut self, target: &ResourceId, active: bool) -> ContextResult<()> {
        let folder = self.require(target)?.folder().clone();
        let mut staged = self.features.clone();

        set_subtree_active(&mut staged, &folder, active);

        if active {
            let mut current = folder.clone();
            while let Some(parent) = current.parent() {
                let all_active = staged
                    .iter()
                    .filter(|r| r.depth() == current.depth() && parent.is_ancestor_of(r.folder()))
                    .all(|r| r.is_active());
                if !all_active {
                    break;
                }
                debug!(folder = %parent, "all children active, activating parent");
                set_subtree_active(&mut staged, &parent, true);
                current = parent;
            }
        } else {
            for resource in staged.iter_mut() {
                if resource.folder().is_ancestor_of(&folder) {
                    resource.properties.active = false;
                }
            }
        }

        self.features = staged;
        self.refresh_crs_intersection();
        debug!(target = %target, active, crs = ?self.crs_intersection, "activation changed");
        Ok(())
    }
}

fn set_subtree_active(features: &mut [Resource], root: &FolderPath, active: bool) {
    for resource in features.iter_mut() {
        if resource.folder().starts_with(root) {
            resource.properties.active = active;
        }
    }
}
