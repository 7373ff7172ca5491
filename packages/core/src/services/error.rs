//! Service Layer Error Types
//!
//! This module defines the typed failures surfaced by `HierarchyService`.
//! None of them are retried inside the service: rule violations cannot be
//! fixed by retrying, and `StoreUnavailable` is for the caller to retry with
//! backoff.

use crate::models::ValidationError;
use thiserror::Error;

/// Coarse classification used by transports to pick a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidParent,
    SelfParent,
    CircularReference,
    SlugConflict,
    HasChildren,
    Validation,
    VersionConflict,
    CorruptHierarchy,
    StoreUnavailable,
}

/// Hierarchy operation errors
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Candidate parent does not exist (or lives in another collection)
    #[error("Invalid parent node: {parent_id}")]
    InvalidParent { parent_id: String },

    /// A node cannot be its own parent
    #[error("Node {node_id} cannot be its own parent")]
    SelfParent { node_id: String },

    /// Re-parenting would make the node its own ancestor
    #[error("Circular reference: moving {node_id} under {parent_id} would create a cycle")]
    CircularReference { node_id: String, parent_id: String },

    /// Derived slug already taken in the collection
    #[error("Slug '{slug}' is already used by node {existing_id} in collection {collection_id}")]
    SlugConflict {
        collection_id: String,
        slug: String,
        existing_id: String,
    },

    /// Deletion attempted on a node that still has children
    #[error("Node {node_id} has {child_count} child node(s); delete or move them first")]
    HasChildren { node_id: String, child_count: usize },

    /// Input validation failed
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Version conflict (optimistic concurrency control)
    #[error("Version conflict for node {node_id}: expected version {expected_version}, found {actual_version}")]
    VersionConflict {
        node_id: String,
        expected_version: i64,
        actual_version: i64,
    },

    /// Ancestor walk exceeded its step ceiling or hit a dangling parent
    #[error("Hierarchy corrupted above node {node_id}: {reason}")]
    CorruptHierarchy { node_id: String, reason: String },

    /// Node store failed or timed out
    #[error("Node store unavailable: {0}")]
    StoreUnavailable(String),
}

impl HierarchyError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create an invalid parent error
    pub fn invalid_parent(parent_id: impl Into<String>) -> Self {
        Self::InvalidParent {
            parent_id: parent_id.into(),
        }
    }

    /// Create a self-parent error
    pub fn self_parent(node_id: impl Into<String>) -> Self {
        Self::SelfParent {
            node_id: node_id.into(),
        }
    }

    /// Create a circular reference error
    pub fn circular_reference(node_id: impl Into<String>, parent_id: impl Into<String>) -> Self {
        Self::CircularReference {
            node_id: node_id.into(),
            parent_id: parent_id.into(),
        }
    }

    /// Create a slug conflict error
    pub fn slug_conflict(
        collection_id: impl Into<String>,
        slug: impl Into<String>,
        existing_id: impl Into<String>,
    ) -> Self {
        Self::SlugConflict {
            collection_id: collection_id.into(),
            slug: slug.into(),
            existing_id: existing_id.into(),
        }
    }

    /// Create a has-children error
    pub fn has_children(node_id: impl Into<String>, child_count: usize) -> Self {
        Self::HasChildren {
            node_id: node_id.into(),
            child_count,
        }
    }

    /// Create a version conflict error
    pub fn version_conflict(
        node_id: impl Into<String>,
        expected_version: i64,
        actual_version: i64,
    ) -> Self {
        Self::VersionConflict {
            node_id: node_id.into(),
            expected_version,
            actual_version,
        }
    }

    /// Create a corrupt hierarchy error
    pub fn corrupt_hierarchy(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptHierarchy {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a store failure, keeping the full context chain in the message
    pub fn store_unavailable(err: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{:#}", err))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NodeNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidParent { .. } => ErrorKind::InvalidParent,
            Self::SelfParent { .. } => ErrorKind::SelfParent,
            Self::CircularReference { .. } => ErrorKind::CircularReference,
            Self::SlugConflict { .. } => ErrorKind::SlugConflict,
            Self::HasChildren { .. } => ErrorKind::HasChildren,
            Self::ValidationFailed(_) => ErrorKind::Validation,
            Self::VersionConflict { .. } => ErrorKind::VersionConflict,
            Self::CorruptHierarchy { .. } => ErrorKind::CorruptHierarchy,
            Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_circular_reference_error() {
        let err = HierarchyError::circular_reference("a", "b");
        assert_eq!(err.kind(), ErrorKind::CircularReference);
        assert_eq!(
            format!("{}", err),
            "Circular reference: moving a under b would create a cycle"
        );
    }

    #[test]
    fn test_has_children_error() {
        let err = HierarchyError::has_children("a", 2);
        assert_eq!(err.kind(), ErrorKind::HasChildren);
        assert_eq!(
            format!("{}", err),
            "Node a has 2 child node(s); delete or move them first"
        );
    }

    #[test]
    fn test_store_unavailable_keeps_context_chain() {
        let inner: anyhow::Result<()> = Err(anyhow::anyhow!("disk I/O error"));
        let err = HierarchyError::store_unavailable(inner.context("Failed to insert node n-1").unwrap_err());

        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(
            format!("{}", err),
            "Node store unavailable: Failed to insert node n-1: disk I/O error"
        );
    }

    #[test]
    fn test_validation_error_converts() {
        let err: HierarchyError = ValidationError::MissingField("title".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
