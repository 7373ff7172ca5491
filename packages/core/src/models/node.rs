//! Content Node Data Structures
//!
//! This module defines the `ContentNode` struct managed by the hierarchy,
//! together with the create/update parameter types used by `HierarchyService`.
//!
//! # Architecture
//!
//! - **Weak parent reference**: `parent_id` is a plain id; children are found by
//!   querying the store, never stored as an embedded collection
//! - **Derived slug**: regenerated only when the title changes
//! - **Opaque fields**: non-hierarchical content lives in `fields` (JSON object)
//!   and passes through untouched
//!
//! # Examples
//!
//! ```rust
//! use folio_core::models::{ContentNode, NodeStatus};
//! use serde_json::json;
//!
//! let root = ContentNode::new(
//!     "wiki".to_string(),
//!     "Setup Guide".to_string(),
//!     "setup-guide".to_string(),
//!     None,
//!     json!({}),
//! );
//! assert_eq!(root.status, NodeStatus::Draft);
//! assert!(root.is_root());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for node input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Title '{0}' does not produce a usable slug")]
    UnsluggableTitle(String),

    #[error("Invalid node status: {0}")]
    InvalidStatus(String),

    #[error("Fields must be a JSON object: {0}")]
    InvalidFields(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Nodes cannot be nested more than {0} levels deep")]
    DepthLimitExceeded(usize),
}

/// Publication status of a node
///
/// Orthogonal to tree position. `Scheduled` is a holding state before
/// `Published`; transitions are driven by callers, the hierarchy only reacts to
/// the first move into `Published` by stamping `published_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    Draft,
    Published,
    Archived,
    Scheduled,
}

impl NodeStatus {
    /// Storage representation (matches the serde form)
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Draft => "DRAFT",
            NodeStatus::Published => "PUBLISHED",
            NodeStatus::Archived => "ARCHIVED",
            NodeStatus::Scheduled => "SCHEDULED",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(NodeStatus::Draft),
            "PUBLISHED" => Ok(NodeStatus::Published),
            "ARCHIVED" => Ok(NodeStatus::Archived),
            "SCHEDULED" => Ok(NodeStatus::Scheduled),
            _ => Err(ValidationError::InvalidStatus(s.to_string())),
        }
    }
}

/// One addressable unit in a content hierarchy.
///
/// # Fields
///
/// - `id`: UUID assigned at creation, immutable
/// - `collection_id`: content collection the node belongs to, immutable
/// - `title`: display text and slug source
/// - `slug`: URL-safe identifier, unique within the collection
/// - `parent_id`: optional weak reference to the parent node (None = root)
/// - `status`: publication status
/// - `published_at`: set once, on the first transition into `Published`
/// - `fields`: JSON object with all non-hierarchical content
/// - `version`: optimistic concurrency counter, incremented on each update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub id: String,

    pub collection_id: String,

    pub title: String,

    pub slug: String,

    /// Parent node ID (weak reference, not ownership)
    pub parent_id: Option<String>,

    pub status: NodeStatus,

    pub published_at: Option<DateTime<Utc>>,

    /// Non-hierarchical content (body, excerpt, cover image...) as a JSON object
    #[serde(default = "empty_fields")]
    pub fields: serde_json::Value,

    #[serde(default = "default_version")]
    pub version: i64,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

fn default_version() -> i64 {
    1
}

fn empty_fields() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl ContentNode {
    /// Create a new draft node with an auto-generated UUID
    pub fn new(
        collection_id: String,
        title: String,
        slug: String,
        parent_id: Option<String>,
        fields: serde_json::Value,
    ) -> Self {
        Self::new_with_id(
            Uuid::new_v4().to_string(),
            collection_id,
            title,
            slug,
            parent_id,
            fields,
        )
    }

    /// Create a new draft node with an explicit ID (imports and fixtures)
    pub fn new_with_id(
        id: String,
        collection_id: String,
        title: String,
        slug: String,
        parent_id: Option<String>,
        fields: serde_json::Value,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            collection_id,
            title,
            slug,
            parent_id,
            status: NodeStatus::Draft,
            published_at: None,
            fields,
            version: 1,
            created_at: now,
            modified_at: now,
        }
    }

    /// A root has no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Apply a status change, stamping `published_at` on the first publish.
    ///
    /// Returns `true` if `published_at` was stamped by this call. Later
    /// demotions and re-promotions leave the original timestamp in place.
    pub fn apply_status(&mut self, status: NodeStatus, now: DateTime<Utc>) -> bool {
        self.status = status;
        if status == NodeStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now);
            return true;
        }
        false
    }

    /// Merge a JSON object into `fields`; `null` values remove keys.
    pub fn merge_fields(&mut self, patch: serde_json::Value) -> Result<(), ValidationError> {
        let patch = match patch {
            serde_json::Value::Object(map) => map,
            other => return Err(ValidationError::InvalidFields(other.to_string())),
        };

        if !self.fields.is_object() {
            self.fields = empty_fields();
        }

        if let Some(target) = self.fields.as_object_mut() {
            for (key, value) in patch {
                if value.is_null() {
                    target.remove(&key);
                } else {
                    target.insert(key, value);
                }
            }
        }

        Ok(())
    }
}

/// Parameters for creating a node
///
/// # Examples
///
/// ```rust
/// use folio_core::models::CreateNodeParams;
///
/// let params = CreateNodeParams::new("Installation").with_parent("parent-uuid");
/// assert_eq!(params.parent_id.as_deref(), Some("parent-uuid"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    pub title: String,

    #[serde(default)]
    pub parent_id: Option<String>,

    /// Initial status (defaults to `Draft`)
    #[serde(default)]
    pub status: Option<NodeStatus>,

    #[serde(default)]
    pub fields: Option<serde_json::Value>,
}

impl CreateNodeParams {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = Some(fields);
        self
    }
}

/// Custom deserializer for optional fields that accepts both plain values and nulls
///
/// Maps three input formats to the double-Option pattern:
/// - Missing field → None (don't update)
/// - null → Some(None) (set to NULL)
/// - "value" → Some(Some("value")) (set to value)
fn deserialize_optional_field<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?))
}

/// Partial node update for PATCH operations
///
/// Only provided fields change. `parent_id` uses the double-Option pattern:
///
/// - `None`: don't change the parent
/// - `Some(None)`: detach, the node becomes a root
/// - `Some(Some(id))`: re-parent under `id`
///
/// # Examples
///
/// ```rust
/// # use folio_core::models::{NodeStatus, NodeUpdate};
/// let update = NodeUpdate::new()
///     .with_title("Getting Started")
///     .with_status(NodeStatus::Published);
/// assert!(!update.is_empty());
///
/// let detach = NodeUpdate::new().with_parent(None);
/// assert_eq!(detach.parent_id, Some(None));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_field"
    )]
    pub parent_id: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NodeStatus>,

    /// Merged key-by-key into the stored fields; null values remove keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl NodeUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent_id = Some(parent_id.map(str::to_string));
        self
    }

    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_fields(mut self, fields: serde_json::Value) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Check if update contains any changes
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.parent_id.is_none()
            && self.status.is_none()
            && self.fields.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample() -> ContentNode {
        ContentNode::new(
            "wiki".to_string(),
            "Setup Guide".to_string(),
            "setup-guide".to_string(),
            None,
            json!({"body": "hello"}),
        )
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            NodeStatus::Draft,
            NodeStatus::Published,
            NodeStatus::Archived,
            NodeStatus::Scheduled,
        ] {
            assert_eq!(status.as_str().parse::<NodeStatus>().unwrap(), status);
        }
        assert!("LIVE".parse::<NodeStatus>().is_err());
        assert_eq!("published".parse::<NodeStatus>().unwrap(), NodeStatus::Published);
    }

    #[test]
    fn test_first_publish_stamps_once() {
        let mut node = sample();
        let first = Utc::now();

        assert!(node.apply_status(NodeStatus::Published, first));
        assert_eq!(node.published_at, Some(first));

        // Demote then re-promote: timestamp survives
        assert!(!node.apply_status(NodeStatus::Archived, first + Duration::hours(1)));
        assert!(!node.apply_status(NodeStatus::Published, first + Duration::hours(2)));
        assert_eq!(node.published_at, Some(first));
        assert_eq!(node.status, NodeStatus::Published);
    }

    #[test]
    fn test_scheduled_does_not_stamp() {
        let mut node = sample();
        assert!(!node.apply_status(NodeStatus::Scheduled, Utc::now()));
        assert!(node.published_at.is_none());
    }

    #[test]
    fn test_merge_fields_adds_replaces_and_removes() {
        let mut node = sample();
        node.merge_fields(json!({"excerpt": "short", "body": null}))
            .unwrap();

        assert_eq!(node.fields, json!({"excerpt": "short"}));
        assert!(node.merge_fields(json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_update_deserializes_double_option_parent() {
        let absent: NodeUpdate = serde_json::from_value(json!({"title": "x"})).unwrap();
        assert_eq!(absent.parent_id, None);

        let detach: NodeUpdate = serde_json::from_value(json!({"parentId": null})).unwrap();
        assert_eq!(detach.parent_id, Some(None));

        let reparent: NodeUpdate = serde_json::from_value(json!({"parentId": "p-1"})).unwrap();
        assert_eq!(reparent.parent_id, Some(Some("p-1".to_string())));
    }

    #[test]
    fn test_node_serializes_camel_case() {
        let node = sample();
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["collectionId"], "wiki");
        assert_eq!(value["status"], "DRAFT");
        assert!(value["parentId"].is_null());
        assert!(value.get("publishedAt").is_some());
    }
}
