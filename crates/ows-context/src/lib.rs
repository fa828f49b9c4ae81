//! OWS Context layer tree.
//!
//! A context is a flat, ordered list of [`Resource`]s. Each resource carries a
//! materialized [`FolderPath`] (`/0/1/2`) that encodes its position in an
//! N-ary layer tree; the list order is always the pre-order traversal of
//! that tree. All structural edits (move, insert, remove) rewrite folder
//! paths and re-sort, and every edit is checked against the ordering rules
//! before it becomes visible:
//!
//! - the first resource is `/0`
//! - each resource is either the first child of its predecessor or the next
//!   sibling of its predecessor or of one of its predecessor's ancestors
//! - sibling indices are contiguous from 0
//!
//! # Example
//!
//! ```rust
//! use ows_context::{OwsContext, Position, Resource, ResourceId};
//!
//! let mut ctx = OwsContext::empty();
//! ctx.insert_feature(None, Resource::new(ResourceId::new("base"), "Basiskarte"), Position::LastChild)
//!     .unwrap();
//! ctx.insert_feature(
//!     Some(&ResourceId::new("base")),
//!     Resource::new(ResourceId::new("roads"), "Straßen"),
//!     Position::FirstChild,
//! )
//! .unwrap();
//!
//! assert_eq!(ctx.get(&ResourceId::new("roads")).unwrap().folder().to_string(), "/0/0");
//! ```

pub mod context;
pub mod document;
pub mod error;
pub mod getmap;
pub mod path;
pub mod resource;
pub mod shared;
pub mod tree;

pub use context::{update_folders, CapabilitiesEntry, MoveOutcome, OwsContext, Position};
pub use document::{ContextProperties, OwsContextDocument};
pub use error::{ContextResult, OwsContextError};
pub use getmap::GetMapBatch;
pub use path::{FolderPath, FolderPathError};
pub use resource::{Geometry, Offering, Operation, Resource, ResourceId, ResourceProperties};
pub use shared::{AppendOutcome, AppendTicket, SharedContext};
pub use tree::{flatten_forest, treeify, TreeNode};
