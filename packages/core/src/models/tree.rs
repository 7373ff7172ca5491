//! Read-side shapes assembled by the hierarchy: nested trees and breadcrumbs.

use crate::models::ContentNode;
use serde::{Deserialize, Serialize};

/// A node with its materialized children
///
/// `has_more_children` is set on nodes sitting at the depth ceiling that still
/// have unexplored children, so callers can tell "leaf" from "truncated".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    #[serde(flatten)]
    pub node: ContentNode,

    pub children: Vec<TreeNode>,

    pub has_more_children: bool,
}

impl TreeNode {
    /// Total number of nodes in this subtree, including self
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            count += 1;
            stack.extend(current.children.iter());
        }
        count
    }

    /// Find a node by id anywhere in this subtree
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(current) = stack.pop() {
            if current.node.id == id {
                return Some(current);
            }
            stack.extend(current.children.iter());
        }
        None
    }
}

/// One step of a root-first navigation path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&ContentNode> for Breadcrumb {
    fn from(node: &ContentNode) -> Self {
        Self {
            id: node.id.clone(),
            title: node.title.clone(),
            slug: node.slug.clone(),
        }
    }
}
