//! NodeStore Trait - Storage Abstraction Layer
//!
//! This module defines the `NodeStore` and `NodeTransaction` traits that
//! abstract persistence for content nodes. `HierarchyService` depends only on
//! these traits, so the same business rules run against the in-memory store
//! (tests, embedding) and the libsql store (durable deployments).
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async to support embedded and network backends
//! 2. **Point and range queries only**: by id, by parent id, by slug, roots
//! 3. **Error Handling**: Uses `anyhow::Result` for flexible error context; the
//!    service layer maps failures to `HierarchyError::StoreUnavailable`
//! 4. **Transactions**: every mutation of the hierarchy happens through a
//!    `NodeTransaction`, which must be serializable with respect to other
//!    transactions on the same store
//!
//! # Examples
//!
//! ```rust
//! use folio_core::db::{MemoryStore, NodeStore};
//! use folio_core::models::ContentNode;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let store = MemoryStore::new();
//!
//! let node = ContentNode::new(
//!     "wiki".to_string(),
//!     "Home".to_string(),
//!     "home".to_string(),
//!     None,
//!     json!({}),
//! );
//!
//! let mut txn = store.begin().await?;
//! txn.insert_node(&node).await?;
//! txn.commit().await?;
//!
//! assert!(store.get_node(&node.id).await?.is_some());
//! # Ok(())
//! # }
//! ```

use crate::models::ContentNode;
use anyhow::Result;
use async_trait::async_trait;

/// Read access and transaction entry point for node persistence
///
/// Reads outside a transaction may observe any committed state; they take no
/// hierarchy lock.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing behind `Arc`.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    /// - `Err(_)` if the store failed
    async fn get_node(&self, id: &str) -> Result<Option<ContentNode>>;

    /// Direct children of `parent_id`, ordered by title then id
    async fn get_children(&self, parent_id: &str) -> Result<Vec<ContentNode>>;

    /// Root nodes of a collection, ordered by title then id
    async fn get_roots(&self, collection_id: &str) -> Result<Vec<ContentNode>>;

    /// Node holding `slug` in `collection_id`, if any
    async fn find_by_slug(&self, collection_id: &str, slug: &str) -> Result<Option<ContentNode>>;

    /// Begin a serializable read-write transaction
    async fn begin(&self) -> Result<Box<dyn NodeTransaction>>;
}

/// A serializable unit of work against the store
///
/// Reads inside the transaction observe the transaction's own staged writes.
/// Dropping a transaction without calling `commit` discards its writes.
#[async_trait]
pub trait NodeTransaction: Send {
    async fn get_node(&mut self, id: &str) -> Result<Option<ContentNode>>;

    /// Direct children of `parent_id`, ordered by title then id
    async fn get_children(&mut self, parent_id: &str) -> Result<Vec<ContentNode>>;

    async fn count_children(&mut self, parent_id: &str) -> Result<usize>;

    async fn find_by_slug(&mut self, collection_id: &str, slug: &str)
        -> Result<Option<ContentNode>>;

    /// Insert a new record; fails if the id already exists
    async fn insert_node(&mut self, node: &ContentNode) -> Result<()>;

    /// Replace the stored record with `node` (matched by id); fails if absent
    async fn update_node(&mut self, node: &ContentNode) -> Result<()>;

    /// Remove a record; returns whether it existed
    async fn delete_node(&mut self, id: &str) -> Result<bool>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Ordering used by every `get_children` / `get_roots` implementation
pub fn sort_by_title(nodes: &mut [ContentNode]) {
    nodes.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
}
