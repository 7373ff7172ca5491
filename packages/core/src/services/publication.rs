//! Publication filter
//!
//! Decides which nodes the public tree shows. The hierarchy never interprets
//! statuses itself; it asks the injected filter at every level of the tree, so
//! a hidden node hides its whole subtree.

use crate::models::{ContentNode, NodeStatus};
use std::collections::HashSet;
use std::fmt;

/// Visibility predicate applied while assembling public trees
pub trait PublicationFilter: Send + Sync + fmt::Debug {
    fn is_visible(&self, node: &ContentNode) -> bool;
}

/// Only `PUBLISHED` nodes are visible (the default)
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishedOnly;

impl PublicationFilter for PublishedOnly {
    fn is_visible(&self, node: &ContentNode) -> bool {
        node.status == NodeStatus::Published
    }
}

/// Everything is visible (editor views)
#[derive(Debug, Clone, Copy, Default)]
pub struct AllStatuses;

impl PublicationFilter for AllStatuses {
    fn is_visible(&self, _node: &ContentNode) -> bool {
        true
    }
}

/// Visible when the status is in an explicit allow-list
///
/// ```rust
/// use folio_core::models::NodeStatus;
/// use folio_core::services::StatusFilter;
///
/// // Preview: published pages plus what is queued to go live
/// let preview = StatusFilter::new([NodeStatus::Published, NodeStatus::Scheduled]);
/// assert!(preview.allows(NodeStatus::Scheduled));
/// assert!(!preview.allows(NodeStatus::Draft));
/// ```
#[derive(Debug, Clone)]
pub struct StatusFilter {
    allowed: HashSet<NodeStatus>,
}

impl StatusFilter {
    pub fn new(allowed: impl IntoIterator<Item = NodeStatus>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn allows(&self, status: NodeStatus) -> bool {
        self.allowed.contains(&status)
    }
}

impl PublicationFilter for StatusFilter {
    fn is_visible(&self, node: &ContentNode) -> bool {
        self.allows(node.status)
    }
}
