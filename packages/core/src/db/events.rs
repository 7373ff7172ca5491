//! Domain Events for the content hierarchy
//!
//! `HierarchyService` emits these after a mutation has committed. Subscribers
//! (search indexing, cache invalidation, notification fan-out) hang off the
//! broadcast channel without coupling to the store.
//!
//! # Event Flow
//!
//! 1. A mutation commits its store transaction
//! 2. The matching event is sent on the broadcast channel
//! 3. Every subscriber receives it asynchronously; lagging subscribers may
//!    miss events, which is acceptable for cache-style consumers

use crate::models::ContentNode;
use serde::{Deserialize, Serialize};

/// Events emitted by `HierarchyService`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HierarchyEvent {
    /// A new node was created
    #[serde(rename = "node:created")]
    NodeCreated { node: ContentNode },

    /// An existing node was updated (any field, including its parent)
    #[serde(rename = "node:updated")]
    NodeUpdated { node: ContentNode },

    /// A node changed parent; emitted in addition to `NodeUpdated`
    #[serde(rename = "node:moved", rename_all = "camelCase")]
    NodeMoved {
        node_id: String,
        old_parent_id: Option<String>,
        new_parent_id: Option<String>,
    },

    /// A node was deleted
    #[serde(rename = "node:deleted", rename_all = "camelCase")]
    NodeDeleted { id: String, collection_id: String },
}

impl HierarchyEvent {
    /// String form of the event type, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            HierarchyEvent::NodeCreated { .. } => "node:created",
            HierarchyEvent::NodeUpdated { .. } => "node:updated",
            HierarchyEvent::NodeMoved { .. } => "node:moved",
            HierarchyEvent::NodeDeleted { .. } => "node:deleted",
        }
    }

    /// Id of the node the event is about
    pub fn node_id(&self) -> &str {
        match self {
            HierarchyEvent::NodeCreated { node } | HierarchyEvent::NodeUpdated { node } => &node.id,
            HierarchyEvent::NodeMoved { node_id, .. } => node_id,
            HierarchyEvent::NodeDeleted { id, .. } => id,
        }
    }
}
