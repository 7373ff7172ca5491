//! Data Models
//!
//! This module contains the data structures managed by the content hierarchy:
//!
//! - `ContentNode` - one node of a collection's forest
//! - `CreateNodeParams` / `NodeUpdate` - mutation inputs
//! - `TreeNode` / `Breadcrumb` - read-side assemblies
//! - `slugify` - title to slug derivation

mod node;
pub mod slug;
mod tree;

pub use node::{ContentNode, CreateNodeParams, NodeStatus, NodeUpdate, ValidationError};
pub use slug::slugify;
pub use tree::{Breadcrumb, TreeNode};
