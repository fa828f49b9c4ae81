//! Nested view of the flat resource list for tree widgets.

use serde::Serialize;

use crate::context::OwsContext;
use crate::error::{ContextResult, OwsContextError};
use crate::path::FolderPath;
use crate::resource::Resource;

/// A resource with its children, borrowed from the context.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<'a> {
    pub resource: &'a Resource,
    pub children: Vec<TreeNode<'a>>,
}

impl<'a> TreeNode<'a> {
    fn leaf(resource: &'a Resource) -> Self {
        Self {
            resource,
            children: Vec::new(),
        }
    }

    /// This node and its descendants in pre-order.
    pub fn flatten(&self) -> Vec<&'a Resource> {
        let mut out = vec![self.resource];
        for child in &self.children {
            out.extend(child.flatten());
        }
        out
    }

    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }
}

/// Build the forest described by the folders of `features`.
///
/// Every resource's parent must appear earlier in the list; a resource whose
/// parent has not been seen is an error, there is no best-effort recovery.
pub fn treeify(features: &[Resource]) -> ContextResult<Vec<TreeNode<'_>>> {
    let mut roots: Vec<TreeNode<'_>> = Vec::new();

    for (index, resource) in features.iter().enumerate() {
        let segments = resource.folder().segments();
        let mut level = &mut roots;

        for depth in 0..segments.len() - 1 {
            let prefix = &segments[..=depth];
            let pos = level
                .iter()
                .rposition(|n| n.resource.folder().segments() == prefix)
                .ok_or_else(|| OwsContextError::ParentNotFound {
                    index,
                    folder: resource.folder().to_string(),
                    parent: FolderPath::join(None, prefix)
                        .map(|p| p.to_string())
                        .unwrap_or_default(),
                })?;
            level = &mut level[pos].children;
        }

        level.push(TreeNode::leaf(resource));
    }

    Ok(roots)
}

/// Pre-order resources of a forest.
pub fn flatten_forest<'a>(forest: &[TreeNode<'a>]) -> Vec<&'a Resource> {
    forest.iter().flat_map(TreeNode::flatten).collect()
}

impl OwsContext {
    pub fn treeify(&self) -> ContextResult<Vec<TreeNode<'_>>> {
        treeify(&self.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceId;

    fn res(id: &str, folder: &str) -> Resource {
        Resource::with_folder(ResourceId::new(id), folder.parse().unwrap(), id)
    }

    #[test]
    fn test_treeify_nests_children() {
        let features = vec![
            res("r", "/0"),
            res("a", "/0/0"),
            res("a0", "/0/0/0"),
            res("b", "/0/1"),
            res("s", "/1"),
        ];
        let forest = treeify(&features).unwrap();
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].children.len(), 2);
        assert_eq!(forest[0].children[0].children[0].resource.id.as_str(), "a0");
        assert_eq!(forest[0].node_count(), 4);

        let flat: Vec<&str> = flatten_forest(&forest).iter().map(|r| r.id.as_str()).collect();
        assert_eq!(flat, vec!["r", "a", "a0", "b", "s"]);
    }

    #[test]
    fn test_treeify_missing_parent() {
        let features = vec![res("r", "/0"), res("x", "/0/3/0")];
        match treeify(&features) {
            Err(OwsContextError::ParentNotFound { index, parent, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(parent, "/0/3");
            }
            other => panic!("expected ParentNotFound, got {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_treeify_child_before_parent() {
        let features = vec![res("a", "/0/0"), res("r", "/0")];
        assert!(treeify(&features).is_err());
    }
}
