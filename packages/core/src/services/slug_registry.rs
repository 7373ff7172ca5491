//! Slug Registry
//!
//! Confirms that a slug is free within a collection before the hierarchy
//! writes it. The check is a plain existence read inside the caller's
//! transaction; there is no auto-suffixing and no retry. On conflict the
//! caller has to pick another title.

use crate::db::NodeTransaction;
use crate::services::HierarchyError;

/// Collection-scoped slug uniqueness check
pub struct SlugRegistry;

impl SlugRegistry {
    /// Reserve `candidate` in `collection_id`, ignoring the node `exclude_id`
    /// (the node being renamed).
    ///
    /// Returns the slug on success. The slug is persisted by the caller's write
    /// in the same transaction.
    ///
    /// # Errors
    ///
    /// - `SlugConflict` if another node of the collection holds the slug
    /// - `StoreUnavailable` if the lookup fails
    pub async fn reserve(
        txn: &mut dyn NodeTransaction,
        collection_id: &str,
        candidate: &str,
        exclude_id: Option<&str>,
    ) -> Result<String, HierarchyError> {
        let holder = txn
            .find_by_slug(collection_id, candidate)
            .await
            .map_err(HierarchyError::store_unavailable)?;

        match holder {
            Some(existing) if Some(existing.id.as_str()) != exclude_id => {
                tracing::debug!(
                    "Slug '{}' in {} already held by {}",
                    candidate,
                    collection_id,
                    existing.id
                );
                Err(HierarchyError::slug_conflict(
                    collection_id,
                    candidate,
                    existing.id,
                ))
            }
            _ => Ok(candidate.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryStore, NodeStore};
    use crate::models::ContentNode;
    use serde_json::json;

    async fn store_with(slug: &str, collection: &str) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_raw(ContentNode::new_with_id(
                "holder".to_string(),
                collection.to_string(),
                "Holder".to_string(),
                slug.to_string(),
                None,
                json!({}),
            ))
            .await;
        store
    }

    #[tokio::test]
    async fn test_free_slug_is_reserved() {
        let store = store_with("setup-guide", "wiki").await;
        let mut txn = store.begin().await.unwrap();

        let slug = SlugRegistry::reserve(txn.as_mut(), "wiki", "faq", None)
            .await
            .unwrap();
        assert_eq!(slug, "faq");
    }

    #[tokio::test]
    async fn test_taken_slug_conflicts() {
        let store = store_with("setup-guide", "wiki").await;
        let mut txn = store.begin().await.unwrap();

        let err = SlugRegistry::reserve(txn.as_mut(), "wiki", "setup-guide", Some("other"))
            .await
            .unwrap_err();
        match err {
            HierarchyError::SlugConflict { existing_id, .. } => assert_eq!(existing_id, "holder"),
            other => panic!("expected SlugConflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_own_slug_is_not_a_conflict() {
        let store = store_with("setup-guide", "wiki").await;
        let mut txn = store.begin().await.unwrap();

        assert!(
            SlugRegistry::reserve(txn.as_mut(), "wiki", "setup-guide", Some("holder"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_slugs_are_scoped_per_collection() {
        let store = store_with("setup-guide", "blog").await;
        let mut txn = store.begin().await.unwrap();

        assert!(SlugRegistry::reserve(txn.as_mut(), "wiki", "setup-guide", None)
            .await
            .is_ok());
    }
}
