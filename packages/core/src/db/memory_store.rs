//! MemoryStore - in-process NodeStore implementation
//!
//! Holds all records in a map behind a single async mutex. A transaction owns
//! that mutex for its whole lifetime, which makes transactions trivially
//! serializable; writes are staged in the transaction and applied on commit.
//!
//! Used by tests, benchmarks and the dev server's `FOLIO_IN_MEMORY` mode.

use crate::db::node_store::{sort_by_title, NodeStore, NodeTransaction};
use crate::models::ContentNode;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Records = BTreeMap<String, ContentNode>;

/// In-memory store; cheap to clone, clones share the same records
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Records>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Write a record directly, bypassing every hierarchy check.
    ///
    /// Only for seeding fixtures and simulating data damaged outside the
    /// normal write path.
    pub async fn put_raw(&self, node: ContentNode) {
        self.records.lock().await.insert(node.id.clone(), node);
    }
}

#[async_trait]
impl NodeStore for MemoryStore {
    async fn get_node(&self, id: &str) -> Result<Option<ContentNode>> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn get_children(&self, parent_id: &str) -> Result<Vec<ContentNode>> {
        let records = self.records.lock().await;
        let mut children: Vec<ContentNode> = records
            .values()
            .filter(|n| n.parent_id.as_deref() == Some(parent_id))
            .cloned()
            .collect();
        sort_by_title(&mut children);
        Ok(children)
    }

    async fn get_roots(&self, collection_id: &str) -> Result<Vec<ContentNode>> {
        let records = self.records.lock().await;
        let mut roots: Vec<ContentNode> = records
            .values()
            .filter(|n| n.collection_id == collection_id && n.parent_id.is_none())
            .cloned()
            .collect();
        sort_by_title(&mut roots);
        Ok(roots)
    }

    async fn find_by_slug(&self, collection_id: &str, slug: &str) -> Result<Option<ContentNode>> {
        let records = self.records.lock().await;
        Ok(records
            .values()
            .find(|n| n.collection_id == collection_id && n.slug == slug)
            .cloned())
    }

    async fn begin(&self) -> Result<Box<dyn NodeTransaction>> {
        let guard = self.records.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            records: guard,
            staged: HashMap::new(),
        }))
    }
}

/// Transaction over `MemoryStore`
///
/// `staged` maps id → new record, or `None` for a pending delete.
struct MemoryTransaction {
    records: OwnedMutexGuard<Records>,
    staged: HashMap<String, Option<ContentNode>>,
}

impl MemoryTransaction {
    /// Current view of one record, staged writes first
    fn view(&self, id: &str) -> Option<&ContentNode> {
        match self.staged.get(id) {
            Some(staged) => staged.as_ref(),
            None => self.records.get(id),
        }
    }

    /// Current view of every record matching `pred`
    fn view_matching<F>(&self, pred: F) -> Vec<ContentNode>
    where
        F: Fn(&ContentNode) -> bool,
    {
        let committed = self
            .records
            .values()
            .filter(|n| !self.staged.contains_key(&n.id));
        let staged = self.staged.values().flatten();

        committed.chain(staged).filter(|n| pred(n)).cloned().collect()
    }
}

#[async_trait]
impl NodeTransaction for MemoryTransaction {
    async fn get_node(&mut self, id: &str) -> Result<Option<ContentNode>> {
        Ok(self.view(id).cloned())
    }

    async fn get_children(&mut self, parent_id: &str) -> Result<Vec<ContentNode>> {
        let mut children = self.view_matching(|n| n.parent_id.as_deref() == Some(parent_id));
        sort_by_title(&mut children);
        Ok(children)
    }

    async fn count_children(&mut self, parent_id: &str) -> Result<usize> {
        Ok(self
            .view_matching(|n| n.parent_id.as_deref() == Some(parent_id))
            .len())
    }

    async fn find_by_slug(
        &mut self,
        collection_id: &str,
        slug: &str,
    ) -> Result<Option<ContentNode>> {
        Ok(self
            .view_matching(|n| n.collection_id == collection_id && n.slug == slug)
            .into_iter()
            .next())
    }

    async fn insert_node(&mut self, node: &ContentNode) -> Result<()> {
        if self.view(&node.id).is_some() {
            bail!("Node {} already exists", node.id);
        }
        self.staged.insert(node.id.clone(), Some(node.clone()));
        Ok(())
    }

    async fn update_node(&mut self, node: &ContentNode) -> Result<()> {
        if self.view(&node.id).is_none() {
            bail!("Node {} not found for update", node.id);
        }
        self.staged.insert(node.id.clone(), Some(node.clone()));
        Ok(())
    }

    async fn delete_node(&mut self, id: &str) -> Result<bool> {
        let existed = self.view(id).is_some();
        if existed {
            self.staged.insert(id.to_string(), None);
        }
        Ok(existed)
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        for (id, record) in staged {
            match record {
                Some(node) => {
                    self.records.insert(id, node);
                }
                None => {
                    self.records.remove(&id);
                }
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
