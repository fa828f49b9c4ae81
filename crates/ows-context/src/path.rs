//! Materialized folder paths.
//!
//! A folder path such as `/0/3/1` lists the sibling index of a resource at
//! every depth, from its root down to itself. Paths are never empty: the
//! implicit super-root above all root resources has no path and is
//! represented as `None` wherever a parent is optional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FolderPathError {
    #[error("Folder path is empty")]
    Empty,

    #[error("Folder path '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("Folder path '{path}' has an invalid segment '{segment}'")]
    InvalidSegment { path: String, segment: String },
}

/// Position of a resource in the layer tree.
///
/// Ordering is lexicographic over the numeric segments, so sorting paths
/// yields the pre-order traversal (a parent sorts before its children,
/// `/0/2` before `/0/10`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderPath(Vec<usize>);

impl FolderPath {
    /// Path of the root with the given index, `/{index}`.
    pub fn root(index: usize) -> Self {
        Self(vec![index])
    }

    /// Path of a node at `index` below `parent`, or a root when `parent` is
    /// `None`.
    pub fn under(parent: Option<&FolderPath>, index: usize) -> Self {
        match parent {
            Some(parent) => parent.child(index),
            None => Self::root(index),
        }
    }

    /// Build from raw segments; `None` when `segments` is empty.
    pub fn from_segments(segments: Vec<usize>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// Zero for roots.
    pub fn depth(&self) -> usize {
        self.0.len() - 1
    }

    /// Index among siblings (the last segment).
    pub fn index(&self) -> usize {
        self.0[self.0.len() - 1]
    }

    /// Sibling index of the ancestor (or self) at `depth`.
    pub fn segment(&self, depth: usize) -> Option<usize> {
        self.0.get(depth).copied()
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// `None` for roots.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.is_root() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Path of the root this path belongs to.
    pub fn root_path(&self) -> FolderPath {
        Self::root(self.0[0])
    }

    pub fn child(&self, index: usize) -> FolderPath {
        let mut segments = self.0.clone();
        segments.push(index);
        Self(segments)
    }

    /// Same parent, different sibling index.
    pub fn with_index(&self, index: usize) -> FolderPath {
        self.with_segment(self.depth(), index)
    }

    /// Copy with the segment at `depth` replaced. `depth` must be within
    /// the path.
    pub fn with_segment(&self, depth: usize, value: usize) -> FolderPath {
        let mut segments = self.0.clone();
        segments[depth] = value;
        Self(segments)
    }

    /// Append a relative path below `parent` (or at root level).
    ///
    /// `None` when both are empty, since there is no path for the
    /// super-root.
    pub fn join(parent: Option<&FolderPath>, relative: &[usize]) -> Option<FolderPath> {
        let mut segments = parent.map(|p| p.0.clone()).unwrap_or_default();
        segments.extend_from_slice(relative);
        Self::from_segments(segments)
    }

    /// True when `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FolderPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Strict ancestor test: `self` is a proper positional prefix of `other`.
    pub fn is_ancestor_of(&self, other: &FolderPath) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_descendant_of(&self, other: &FolderPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// Segments of `self` below `ancestor`, or `None` if `ancestor` is not
    /// a prefix.
    pub fn relative_to(&self, ancestor: &FolderPath) -> Option<&[usize]> {
        if self.starts_with(ancestor) {
            Some(&self.0[ancestor.0.len()..])
        } else {
            None
        }
    }

    /// True for paths strictly below `parent` (any root when `parent` is
    /// `None`) whose segment at the child depth is at least `from_index`.
    pub(crate) fn is_at_or_after(&self, parent: Option<&FolderPath>, from_index: usize) -> bool {
        let depth = parent.map_or(0, |p| p.0.len());
        let below = match parent {
            Some(p) => p.is_ancestor_of(self),
            None => true,
        };
        below && self.0[depth] >= from_index
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FolderPath {
    type Err = FolderPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FolderPathError::Empty);
        }
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| FolderPathError::MissingLeadingSlash(s.to_string()))?;

        let segments = rest
            .split('/')
            .map(|segment| {
                // usize parsing would accept "+1"
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(FolderPathError::InvalidSegment {
                        path: s.to_string(),
                        segment: segment.to_string(),
                    });
                }
                segment.parse().map_err(|_| FolderPathError::InvalidSegment {
                    path: s.to_string(),
                    segment: segment.to_string(),
                })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for FolderPath {
    type Error = FolderPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FolderPath> for String {
    fn from(path: FolderPath) -> Self {
        path.to_string()
    }
}

// ============================================================================
// String helpers
// ============================================================================

/// Parent of a path string; `None` for roots and malformed input.
pub fn parent_path(path: &str) -> Option<String> {
    path.parse::<FolderPath>()
        .ok()?
        .parent()
        .map(|p| p.to_string())
}

/// Sibling index encoded in the last segment.
pub fn folder_index(path: &str) -> Option<usize> {
    path.parse::<FolderPath>().ok().map(|p| p.index())
}

/// True iff `ancestor` is a strict positional prefix of `descendant`.
pub fn is_descendant(ancestor: &str, descendant: &str) -> bool {
    match (ancestor.parse::<FolderPath>(), descendant.parse::<FolderPath>()) {
        (Ok(a), Ok(d)) => a.is_ancestor_of(&d),
        _ => false,
    }
}

/// Segment count minus one.
pub fn depth(path: &str) -> Option<usize> {
    path.parse::<FolderPath>().ok().map(|p| p.depth())
}
