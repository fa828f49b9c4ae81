//! Read-only tree queries over the flat resource list.
//!
//! Queries take the target by reference and return references into the
//! context. The target does not need to be the context's own copy; only its
//! folder (and id, where self-exclusion matters) is consulted.

use super::OwsContext;
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::{Resource, ResourceId};

impl OwsContext {
    pub fn get(&self, id: &ResourceId) -> Option<&Resource> {
        self.features.iter().find(|r| &r.id == id)
    }

    /// Index of a resource in the flat order.
    pub fn position(&self, id: &ResourceId) -> Option<usize> {
        self.features.iter().position(|r| &r.id == id)
    }

    pub(crate) fn require(&self, id: &ResourceId) -> ContextResult<&Resource> {
        self.get(id)
            .ok_or_else(|| OwsContextError::ResourceNotFound(id.clone()))
    }

    pub fn get_by_folder(&self, folder: &FolderPath) -> Option<&Resource> {
        self.features.iter().find(|r| r.folder() == folder)
    }

    pub fn roots(&self) -> Vec<&Resource> {
        self.features.iter().filter(|r| r.depth() == 0).collect()
    }

    /// Index for a new root: one past the highest existing root index.
    pub fn get_next_root_id(&self) -> usize {
        self.features
            .iter()
            .filter(|r| r.depth() == 0)
            .map(|r| r.index() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn get_descendants_of<'a>(&'a self, target: &'a Resource, include_self: bool) -> Vec<&'a Resource> {
        let mut out = Vec::new();
        if include_self {
            out.push(target);
        }
        out.extend(self.features.iter().filter(|r| target.is_ancestor_of(r)));
        out
    }

    pub fn get_children_of(&self, target: &Resource) -> Vec<&Resource> {
        self.features
            .iter()
            .filter(|r| r.is_child_of(target))
            .collect()
    }

    /// Resources sharing the target's parent (other roots for a root).
    ///
    /// With `with_subtrees` the siblings' descendants are included too. When
    /// `include_self` is false the target and its own subtree are left out.
    pub fn get_siblings_of(
        &self,
        target: &Resource,
        include_self: bool,
        with_subtrees: bool,
    ) -> Vec<&Resource> {
        let parent = target.parent_folder();
        let child_depth = target.depth();

        self.features
            .iter()
            .filter(|r| match &parent {
                Some(p) => p.is_ancestor_of(r.folder()),
                None => true,
            })
            .filter(|r| with_subtrees || r.depth() == child_depth)
            .filter(|r| {
                include_self
                    || (r.id != target.id && !target.is_ancestor_of(r))
            })
            .collect()
    }

    /// Siblings after the target (the target itself too with
    /// `include_self`), optionally with their subtrees.
    pub fn get_right_siblings_of(
        &self,
        target: &Resource,
        include_self: bool,
        with_subtrees: bool,
    ) -> Vec<&Resource> {
        let depth = target.depth();
        let index = target.index();

        self.get_siblings_of(target, include_self, with_subtrees)
            .into_iter()
            .filter(|r| {
                let sibling_index = r.folder().segment(depth).unwrap_or(0);
                if include_self {
                    sibling_index >= index
                } else {
                    sibling_index > index
                }
            })
            .collect()
    }

    pub fn get_parent_of(&self, target: &Resource) -> Option<&Resource> {
        let parent = target.parent_folder()?;
        self.get_by_folder(&parent)
    }

    /// Ancestors from the root down to the direct parent.
    pub fn get_ancestors_of(&self, target: &Resource) -> Vec<&Resource> {
        self.features
            .iter()
            .filter(|r| r.is_ancestor_of(target))
            .collect()
    }

    pub fn get_first_child_of(&self, target: &Resource) -> Option<&Resource> {
        self.features.iter().find(|r| r.is_child_of(target))
    }

    pub fn get_last_child_of(&self, target: &Resource) -> Option<&Resource> {
        self.features.iter().rev().find(|r| r.is_child_of(target))
    }

    /// Position of the first child in the flat order.
    pub fn get_first_child_index_of(&self, target: &Resource) -> Option<usize> {
        self.features.iter().position(|r| r.is_child_of(target))
    }

    /// Position of the last child in the flat order.
    pub fn get_last_child_index_of(&self, target: &Resource) -> Option<usize> {
        self.features.iter().rposition(|r| r.is_child_of(target))
    }

    pub fn is_leaf_node(&self, target: &Resource) -> bool {
        !self.features.iter().any(|r| target.is_ancestor_of(r))
    }

    /// Tri-state checkbox helper: inactive, but something below is active.
    pub fn get_indeterminate_state_of(&self, target: &Resource) -> bool {
        !target.is_active()
            && self
                .features
                .iter()
                .any(|r| target.is_ancestor_of(r) && r.is_active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(folders: &[(&str, &str)]) -> OwsContext {
        OwsContext::new(
            folders
                .iter()
                .map(|(id, f)| Resource::with_folder(ResourceId::new(*id), f.parse().unwrap(), *id))
                .collect(),
        )
        .unwrap()
    }

    fn ids(resources: Vec<&Resource>) -> Vec<&str> {
        resources.into_iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> OwsContext {
        ctx(&[
            ("root", "/0"),
            ("a", "/0/0"),
            ("a0", "/0/0/0"),
            ("b", "/0/1"),
            ("b0", "/0/1/0"),
            ("b1", "/0/1/1"),
            ("c", "/0/2"),
            ("other", "/1"),
        ])
    }

    #[test]
    fn test_descendants() {
        let c = sample();
        let root = c.get(&"root".into()).unwrap();
        assert_eq!(ids(c.get_descendants_of(root, false)).len(), 6);
        let b = c.get(&"b".into()).unwrap();
        assert_eq!(ids(c.get_descendants_of(b, true)), vec!["b", "b0", "b1"]);
    }

    #[test]
    fn test_siblings() {
        let c = sample();
        let b = c.get(&"b".into()).unwrap();
        assert_eq!(ids(c.get_siblings_of(b, false, false)), vec!["a", "c"]);
        assert_eq!(ids(c.get_siblings_of(b, true, false)), vec!["a", "b", "c"]);
        assert_eq!(ids(c.get_siblings_of(b, false, true)), vec!["a", "a0", "c"]);
        assert_eq!(
            ids(c.get_siblings_of(b, true, true)),
            vec!["a", "a0", "b", "b0", "b1", "c"]
        );
    }

    #[test]
    fn test_root_siblings_are_roots() {
        let c = sample();
        let root = c.get(&"root".into()).unwrap();
        assert_eq!(ids(c.get_siblings_of(root, false, false)), vec!["other"]);
    }

    #[test]
    fn test_right_siblings() {
        let c = sample();
        let a = c.get(&"a".into()).unwrap();
        assert_eq!(ids(c.get_right_siblings_of(a, false, false)), vec!["b", "c"]);
        assert_eq!(
            ids(c.get_right_siblings_of(a, false, true)),
            vec!["b", "b0", "b1", "c"]
        );
        let b = c.get(&"b".into()).unwrap();
        assert_eq!(ids(c.get_right_siblings_of(b, true, false)), vec!["b", "c"]);
    }

    #[test]
    fn test_parent_ancestors_children() {
        let c = sample();
        let b1 = c.get(&"b1".into()).unwrap();
        assert_eq!(c.get_parent_of(b1).unwrap().id.as_str(), "b");
        assert_eq!(ids(c.get_ancestors_of(b1)), vec!["root", "b"]);

        let b = c.get(&"b".into()).unwrap();
        assert_eq!(c.get_first_child_of(b).unwrap().id.as_str(), "b0");
        assert_eq!(c.get_last_child_of(b).unwrap().id.as_str(), "b1");
        assert_eq!(c.get_first_child_index_of(b), Some(4));
        assert_eq!(c.get_last_child_index_of(b), Some(5));
        assert_eq!(ids(c.get_children_of(b)), vec!["b0", "b1"]);

        let root = c.get(&"root".into()).unwrap();
        assert!(c.get_parent_of(root).is_none());
    }

    #[test]
    fn test_leaf_and_roots() {
        let c = sample();
        assert!(c.is_leaf_node(c.get(&"c".into()).unwrap()));
        assert!(!c.is_leaf_node(c.get(&"a".into()).unwrap()));
        assert_eq!(ids(c.roots()), vec!["root", "other"]);
        assert_eq!(c.get_next_root_id(), 2);
        assert_eq!(OwsContext::empty().get_next_root_id(), 0);
    }

    #[test]
    fn test_indeterminate() {
        let mut c = sample();
        c.activate_feature(&"b0".into(), true).unwrap();
        let b = c.get(&"b".into()).unwrap();
        assert!(c.get_indeterminate_state_of(b));
        let a = c.get(&"a".into()).unwrap();
        assert!(!c.get_indeterminate_state_of(a));
    }
}
