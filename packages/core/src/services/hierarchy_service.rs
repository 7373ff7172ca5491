//! Hierarchy Service - tree-shaped content operations
//!
//! This module is the single entry point for every read and write of the
//! content tree:
//!
//! - Mutations (create, update, move, delete) with slug, parent and cycle checks
//! - Navigation reads (children, breadcrumbs, bounded trees)
//! - Domain events broadcast after each committed mutation
//!
//! # Write Path
//!
//! Every mutation takes its collection's write lock, opens one store
//! transaction, re-reads what it needs, runs all checks and writes inside that
//! transaction, then commits. Checks therefore always see the state they are
//! about to modify, and concurrent re-parentings in one collection serialize.
//!
//! # Read Path
//!
//! Reads take no lock and see committed state only. Trees are assembled
//! breadth-first from an explicit work list and bounded by a depth ceiling,
//! so stack use does not grow with tree depth.

use crate::config::HierarchyConfig;
use crate::db::{HierarchyEvent, NodeStore, NodeTransaction};
use crate::models::{
    slugify, Breadcrumb, ContentNode, CreateNodeParams, NodeStatus, NodeUpdate, TreeNode,
    ValidationError,
};
use crate::services::ancestry::{
    chain_depth, walk_to_root, would_cycle, StoreLookup, TxnLookup, WalkOutcome, WalkStep,
};
use crate::services::collection_locks::CollectionLocks;
use crate::services::error::HierarchyError;
use crate::services::publication::{AllStatuses, PublicationFilter, PublishedOnly};
use crate::services::slug_registry::SlugRegistry;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;

/// Result of applying a `NodeUpdate` inside a transaction
struct AppliedUpdate {
    node: ContentNode,
    changed: bool,
    moved_from: Option<Option<String>>,
}

/// One slot of the breadth-first tree arena
struct TreeSlot {
    node: ContentNode,
    depth: usize,
    children: Vec<usize>,
    has_more_children: bool,
}

/// Core service for hierarchy operations
///
/// Cheap to clone; clones share the store, the locks and the event channel.
///
/// # Examples
///
/// ```rust
/// use folio_core::db::MemoryStore;
/// use folio_core::models::{CreateNodeParams, NodeStatus};
/// use folio_core::services::HierarchyService;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let service = HierarchyService::new(Arc::new(MemoryStore::new()));
///
/// let docs = service
///     .create_node("wiki", CreateNodeParams::new("Docs").with_status(NodeStatus::Published))
///     .await?;
/// let install = service
///     .create_node("wiki", CreateNodeParams::new("Installation").with_parent(docs.id.clone()))
///     .await?;
///
/// let trail = service.get_breadcrumbs(&install.id).await?;
/// assert_eq!(trail.len(), 2);
/// assert_eq!(trail[0].slug, "docs");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HierarchyService {
    store: Arc<dyn NodeStore>,
    filter: Arc<dyn PublicationFilter>,
    locks: CollectionLocks,
    config: HierarchyConfig,
    event_tx: broadcast::Sender<HierarchyEvent>,
}

impl HierarchyService {
    /// Create a service with the default configuration and the
    /// published-only filter
    pub fn new(store: Arc<dyn NodeStore>) -> Self {
        let config = HierarchyConfig::default();
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Self {
            store,
            filter: Arc::new(PublishedOnly),
            locks: CollectionLocks::new(),
            config,
            event_tx,
        }
    }

    /// Create a service with an explicit configuration
    ///
    /// # Errors
    ///
    /// `ValidationFailed` if the configuration is inconsistent
    pub fn with_config(
        store: Arc<dyn NodeStore>,
        config: HierarchyConfig,
    ) -> Result<Self, HierarchyError> {
        config.validate()?;
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            store,
            filter: Arc::new(PublishedOnly),
            locks: CollectionLocks::new(),
            config,
            event_tx,
        })
    }

    /// Replace the filter used by `get_tree` and `get_visible_children`
    pub fn with_publication_filter(mut self, filter: Arc<dyn PublicationFilter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn config(&self) -> &HierarchyConfig {
        &self.config
    }

    /// Get access to the underlying store
    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Subscribe to events emitted after committed mutations
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<HierarchyEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores send errors: having no subscribers is normal
    fn emit_event(&self, event: HierarchyEvent) {
        let _ = self.event_tx.send(event);
    }

    async fn begin(&self) -> Result<Box<dyn NodeTransaction>, HierarchyError> {
        self.store
            .begin()
            .await
            .map_err(HierarchyError::store_unavailable)
    }

    /// Commit on success, roll back on failure
    async fn finish<T>(
        txn: Box<dyn NodeTransaction>,
        result: Result<T, HierarchyError>,
    ) -> Result<T, HierarchyError> {
        match result {
            Ok(value) => {
                txn.commit()
                    .await
                    .map_err(HierarchyError::store_unavailable)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!("Rollback failed after '{}': {:#}", err, rollback_err);
                }
                Err(err)
            }
        }
    }

    /// Create a node in `collection_id`
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the title is blank, yields no slug, or `fields`
    ///   is not a JSON object
    /// - `SlugConflict` if the derived slug is taken in the collection
    /// - `InvalidParent` if the parent does not exist in the collection
    /// - `ValidationFailed` if the node would sit deeper than
    ///   `max_ancestor_steps` levels
    /// - `StoreUnavailable` on store failure
    #[instrument(skip(self, params), fields(title = %params.title))]
    pub async fn create_node(
        &self,
        collection_id: &str,
        params: CreateNodeParams,
    ) -> Result<ContentNode, HierarchyError> {
        if collection_id.trim().is_empty() {
            return Err(ValidationError::MissingField("collection_id".to_string()).into());
        }
        let title = validate_title(&params.title)?;
        let slug = slugify(&title)?;
        let fields = match params.fields {
            Some(value) if value.is_object() => value,
            Some(other) => return Err(ValidationError::InvalidFields(other.to_string()).into()),
            None => serde_json::json!({}),
        };

        let mut node = ContentNode::new(
            collection_id.to_string(),
            title,
            slug,
            params.parent_id,
            fields,
        );
        if let Some(status) = params.status {
            node.apply_status(status, node.created_at);
        }

        let _guard = self.locks.acquire(collection_id).await;
        let mut txn = self.begin().await?;
        let result = self.insert_checked(txn.as_mut(), node).await;
        let node = Self::finish(txn, result).await?;

        tracing::info!(
            "Created node {} ('{}') in {} under {:?}",
            node.id,
            node.slug,
            node.collection_id,
            node.parent_id
        );
        self.emit_event(HierarchyEvent::NodeCreated { node: node.clone() });

        Ok(node)
    }

    async fn insert_checked(
        &self,
        txn: &mut dyn NodeTransaction,
        node: ContentNode,
    ) -> Result<ContentNode, HierarchyError> {
        SlugRegistry::reserve(txn, &node.collection_id, &node.slug, None).await?;

        if let Some(parent_id) = &node.parent_id {
            Self::require_parent(txn, parent_id, &node.collection_id).await?;

            let max_depth = self.config.max_ancestor_steps;
            let parent_depth = chain_depth(&mut TxnLookup(&mut *txn), parent_id, max_depth).await?;
            if parent_depth >= max_depth {
                return Err(ValidationError::DepthLimitExceeded(max_depth).into());
            }
        }

        txn.insert_node(&node)
            .await
            .map_err(HierarchyError::store_unavailable)?;

        Ok(node)
    }

    /// Moving `node_id` under `parent_id` must keep every node of its subtree
    /// within `max_ancestor_steps` levels.
    ///
    /// Scans the subtree level by level, never past the levels still free
    /// below the new parent.
    async fn require_depth_room(
        &self,
        txn: &mut dyn NodeTransaction,
        node_id: &str,
        parent_id: &str,
    ) -> Result<(), HierarchyError> {
        let max_depth = self.config.max_ancestor_steps;
        let parent_depth = chain_depth(&mut TxnLookup(&mut *txn), parent_id, max_depth).await?;
        let free_levels = max_depth.saturating_sub(parent_depth);

        let mut level = vec![node_id.to_string()];
        let mut height = 0;
        while !level.is_empty() {
            height += 1;
            if height > free_levels {
                tracing::debug!(
                    "Moving {} under {} (depth {}) exceeds {} levels",
                    node_id,
                    parent_id,
                    parent_depth,
                    max_depth
                );
                return Err(ValidationError::DepthLimitExceeded(max_depth).into());
            }

            let mut next = Vec::new();
            for id in &level {
                let children = txn
                    .get_children(id)
                    .await
                    .map_err(HierarchyError::store_unavailable)?;
                next.extend(children.into_iter().map(|child| child.id));
            }
            level = next;
        }

        Ok(())
    }

    /// The parent must exist and belong to the same collection
    async fn require_parent(
        txn: &mut dyn NodeTransaction,
        parent_id: &str,
        collection_id: &str,
    ) -> Result<ContentNode, HierarchyError> {
        match txn
            .get_node(parent_id)
            .await
            .map_err(HierarchyError::store_unavailable)?
        {
            Some(parent) if parent.collection_id == collection_id => Ok(parent),
            Some(parent) => {
                tracing::debug!(
                    "Parent {} lives in {}, not {}",
                    parent_id,
                    parent.collection_id,
                    collection_id
                );
                Err(HierarchyError::invalid_parent(parent_id))
            }
            None => Err(HierarchyError::invalid_parent(parent_id)),
        }
    }

    /// Update a node's title, parent, status and/or fields in one transaction
    ///
    /// Fields that are `None` in `update` stay unchanged. An update that
    /// changes nothing returns the stored node without writing.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `SelfParent` if the new parent is the node itself
    /// - `InvalidParent` if the new parent does not exist in the collection
    /// - `CircularReference` if the new parent is a descendant of the node
    /// - `SlugConflict` if the new title's slug is taken
    /// - `ValidationFailed` for a blank title, non-object `fields`, or a move
    ///   that would nest the subtree deeper than `max_ancestor_steps` levels
    /// - `StoreUnavailable` on store failure
    #[instrument(skip(self, update))]
    pub async fn update_node(
        &self,
        node_id: &str,
        update: NodeUpdate,
    ) -> Result<ContentNode, HierarchyError> {
        self.apply_update(node_id, update, None).await
    }

    /// `update_node` that first checks the stored version
    ///
    /// # Errors
    ///
    /// `VersionConflict` if the node's version is not `expected_version`, plus
    /// everything `update_node` returns
    #[instrument(skip(self, update))]
    pub async fn update_node_with_version_check(
        &self,
        node_id: &str,
        expected_version: i64,
        update: NodeUpdate,
    ) -> Result<ContentNode, HierarchyError> {
        self.apply_update(node_id, update, Some(expected_version))
            .await
    }

    /// Re-parent a node; `None` makes it a root
    #[instrument(skip(self))]
    pub async fn move_node(
        &self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<ContentNode, HierarchyError> {
        self.apply_update(node_id, NodeUpdate::new().with_parent(new_parent_id), None)
            .await
    }

    async fn apply_update(
        &self,
        node_id: &str,
        update: NodeUpdate,
        expected_version: Option<i64>,
    ) -> Result<ContentNode, HierarchyError> {
        let current = self
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        // Rejected before any ancestor read
        if let Some(Some(parent_id)) = &update.parent_id {
            if parent_id == node_id {
                return Err(HierarchyError::self_parent(node_id));
            }
        }
        let title = update.title.as_deref().map(validate_title).transpose()?;

        let _guard = self.locks.acquire(&current.collection_id).await;
        let mut txn = self.begin().await?;
        let result = self
            .update_checked(txn.as_mut(), node_id, title, update, expected_version)
            .await;
        let applied = Self::finish(txn, result).await?;

        if !applied.changed {
            tracing::debug!("Update of {} changed nothing", node_id);
            return Ok(applied.node);
        }

        tracing::info!(
            "Updated node {} to version {}",
            applied.node.id,
            applied.node.version
        );
        self.emit_event(HierarchyEvent::NodeUpdated {
            node: applied.node.clone(),
        });
        if let Some(old_parent_id) = applied.moved_from {
            tracing::info!(
                "Moved node {} from {:?} to {:?}",
                applied.node.id,
                old_parent_id,
                applied.node.parent_id
            );
            self.emit_event(HierarchyEvent::NodeMoved {
                node_id: applied.node.id.clone(),
                old_parent_id,
                new_parent_id: applied.node.parent_id.clone(),
            });
        }

        Ok(applied.node)
    }

    async fn update_checked(
        &self,
        txn: &mut dyn NodeTransaction,
        node_id: &str,
        title: Option<String>,
        update: NodeUpdate,
        expected_version: Option<i64>,
    ) -> Result<AppliedUpdate, HierarchyError> {
        // Re-read under the lock; the node may have gone since the first read
        let mut node = txn
            .get_node(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        if let Some(expected) = expected_version {
            if node.version != expected {
                return Err(HierarchyError::version_conflict(
                    node_id,
                    expected,
                    node.version,
                ));
            }
        }

        let mut changed = false;

        if let Some(title) = title {
            if title != node.title {
                let slug = slugify(&title)?;
                if slug != node.slug {
                    node.slug =
                        SlugRegistry::reserve(txn, &node.collection_id, &slug, Some(node_id))
                            .await?;
                }
                node.title = title;
                changed = true;
            }
        }

        let mut moved_from = None;
        if let Some(new_parent_id) = update.parent_id {
            if new_parent_id != node.parent_id {
                if let Some(parent_id) = &new_parent_id {
                    Self::require_parent(txn, parent_id, &node.collection_id).await?;

                    let cycle = would_cycle(
                        &mut TxnLookup(&mut *txn),
                        node_id,
                        parent_id,
                        self.config.max_ancestor_steps,
                    )
                    .await?;
                    if cycle {
                        return Err(HierarchyError::circular_reference(node_id, parent_id));
                    }

                    self.require_depth_room(txn, node_id, parent_id).await?;
                }

                moved_from = Some(node.parent_id.clone());
                node.parent_id = new_parent_id;
                changed = true;
            }
        }

        let now = Utc::now();

        if let Some(status) = update.status {
            let needs_stamp = status == NodeStatus::Published && node.published_at.is_none();
            if status != node.status || needs_stamp {
                node.apply_status(status, now);
                changed = true;
            }
        }

        if let Some(patch) = update.fields {
            let before = node.fields.clone();
            node.merge_fields(patch)?;
            changed |= node.fields != before;
        }

        if changed {
            node.version += 1;
            node.modified_at = now;
            txn.update_node(&node)
                .await
                .map_err(HierarchyError::store_unavailable)?;
        }

        Ok(AppliedUpdate {
            node,
            changed,
            moved_from,
        })
    }

    /// Delete a childless node
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `HasChildren` if any node still names it as parent
    /// - `StoreUnavailable` on store failure
    #[instrument(skip(self))]
    pub async fn delete_node(&self, node_id: &str) -> Result<(), HierarchyError> {
        let current = self
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        let _guard = self.locks.acquire(&current.collection_id).await;
        let mut txn = self.begin().await?;
        let result = Self::delete_checked(txn.as_mut(), node_id).await;
        let deleted = Self::finish(txn, result).await?;

        tracing::info!("Deleted node {} from {}", deleted.id, deleted.collection_id);
        self.emit_event(HierarchyEvent::NodeDeleted {
            id: deleted.id,
            collection_id: deleted.collection_id,
        });

        Ok(())
    }

    async fn delete_checked(
        txn: &mut dyn NodeTransaction,
        node_id: &str,
    ) -> Result<ContentNode, HierarchyError> {
        let node = txn
            .get_node(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;

        let child_count = txn
            .count_children(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)?;
        if child_count > 0 {
            return Err(HierarchyError::has_children(node_id, child_count));
        }

        let existed = txn
            .delete_node(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)?;
        if !existed {
            return Err(HierarchyError::node_not_found(node_id));
        }

        Ok(node)
    }

    /// Get a node by ID
    pub async fn get_node(&self, node_id: &str) -> Result<Option<ContentNode>, HierarchyError> {
        self.store
            .get_node(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)
    }

    /// Direct children ordered by title (ties by id), regardless of status
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if `node_id` does not exist
    pub async fn get_children(&self, node_id: &str) -> Result<Vec<ContentNode>, HierarchyError> {
        if self.get_node(node_id).await?.is_none() {
            return Err(HierarchyError::node_not_found(node_id));
        }

        let children = self
            .store
            .get_children(node_id)
            .await
            .map_err(HierarchyError::store_unavailable)?;
        tracing::debug!("Node {} has {} children", node_id, children.len());

        Ok(children)
    }

    /// `get_children` restricted to what the publication filter shows
    pub async fn get_visible_children(
        &self,
        node_id: &str,
    ) -> Result<Vec<ContentNode>, HierarchyError> {
        let mut children = self.get_children(node_id).await?;
        children.retain(|child| self.filter.is_visible(child));
        Ok(children)
    }

    /// Root-first path to a node; the last element is the node itself
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node does not exist
    /// - `CorruptHierarchy` if an ancestor is missing or the walk exceeds
    ///   `max_ancestor_steps`
    pub async fn get_breadcrumbs(&self, node_id: &str) -> Result<Vec<Breadcrumb>, HierarchyError> {
        let mut trail = Vec::new();

        let outcome = walk_to_root(
            &mut StoreLookup(self.store.as_ref()),
            node_id,
            self.config.max_ancestor_steps,
            |node| {
                trail.push(Breadcrumb::from(node));
                WalkStep::Continue
            },
        )
        .await?;

        match outcome {
            WalkOutcome::Dangling { steps: 0, .. } => Err(HierarchyError::node_not_found(node_id)),
            WalkOutcome::Dangling { missing_id, .. } => Err(HierarchyError::corrupt_hierarchy(
                node_id,
                format!("ancestor {} does not exist", missing_id),
            )),
            WalkOutcome::ReachedRoot { .. } | WalkOutcome::Stopped { .. } => {
                trail.reverse();
                Ok(trail)
            }
        }
    }

    /// Public tree of a collection, filtered by the service's publication filter
    ///
    /// `max_depth` defaults to the configured default depth and is clamped to
    /// `max_tree_depth`. Depth 0 returns the visible roots only.
    ///
    /// `has_more_children` counts visible children only: a node at the depth
    /// ceiling whose children are all hidden by the filter is not flagged.
    pub async fn get_tree(
        &self,
        collection_id: &str,
        max_depth: Option<usize>,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        self.get_tree_with_filter(collection_id, max_depth, self.filter.as_ref())
            .await
    }

    /// `get_tree` with an explicit filter
    pub async fn get_tree_with_filter(
        &self,
        collection_id: &str,
        max_depth: Option<usize>,
        filter: &dyn PublicationFilter,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        let depth = self.config.tree_depth(max_depth);

        let mut roots = self
            .store
            .get_roots(collection_id)
            .await
            .map_err(HierarchyError::store_unavailable)?;
        roots.retain(|root| filter.is_visible(root));

        let forest = self.assemble(roots, depth, filter).await?;
        tracing::debug!(
            "Assembled tree for {} with {} roots (depth {})",
            collection_id,
            forest.len(),
            depth
        );

        Ok(forest)
    }

    /// Bounded tree rooted at one node, every status included
    ///
    /// # Errors
    ///
    /// `NodeNotFound` if the node does not exist
    pub async fn get_subtree(
        &self,
        node_id: &str,
        max_depth: Option<usize>,
    ) -> Result<TreeNode, HierarchyError> {
        let node = self
            .get_node(node_id)
            .await?
            .ok_or_else(|| HierarchyError::node_not_found(node_id))?;
        let depth = self.config.tree_depth(max_depth);

        self.assemble(vec![node], depth, &AllStatuses)
            .await?
            .pop()
            .ok_or_else(|| HierarchyError::node_not_found(node_id))
    }

    /// Breadth-first expansion into an arena, then bottom-up assembly.
    ///
    /// Nodes at `max_depth` are not expanded; they only learn whether they
    /// have visible children.
    async fn assemble(
        &self,
        roots: Vec<ContentNode>,
        max_depth: usize,
        filter: &dyn PublicationFilter,
    ) -> Result<Vec<TreeNode>, HierarchyError> {
        let root_count = roots.len();
        let mut arena: Vec<TreeSlot> = roots
            .into_iter()
            .map(|node| TreeSlot {
                node,
                depth: 0,
                children: Vec::new(),
                has_more_children: false,
            })
            .collect();
        let mut queue: VecDeque<usize> = (0..root_count).collect();

        while let Some(index) = queue.pop_front() {
            let mut children = self
                .store
                .get_children(&arena[index].node.id)
                .await
                .map_err(HierarchyError::store_unavailable)?;
            children.retain(|child| filter.is_visible(child));

            if children.is_empty() {
                continue;
            }
            if arena[index].depth >= max_depth {
                arena[index].has_more_children = true;
                continue;
            }

            let depth = arena[index].depth + 1;
            for child in children {
                let child_index = arena.len();
                arena.push(TreeSlot {
                    node: child,
                    depth,
                    children: Vec::new(),
                    has_more_children: false,
                });
                arena[index].children.push(child_index);
                queue.push_back(child_index);
            }
        }

        // Children always sit at higher indices than their parent
        let mut built: Vec<Option<TreeNode>> = Vec::with_capacity(arena.len());
        built.resize_with(arena.len(), || None);

        for (index, slot) in arena.into_iter().enumerate().rev() {
            let children = slot
                .children
                .iter()
                .filter_map(|&child_index| built[child_index].take())
                .collect();
            built[index] = Some(TreeNode {
                node: slot.node,
                children,
                has_more_children: slot.has_more_children,
            });
        }

        Ok(built.into_iter().take(root_count).flatten().collect())
    }
}

/// Trimmed, non-empty title
fn validate_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField("title".to_string()));
    }
    Ok(trimmed.to_string())
}
