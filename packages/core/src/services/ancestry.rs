//! Ancestor walks
//!
//! One upward traversal primitive, `walk_to_root`, shared by the cycle guard
//! (equality test per step) and breadcrumb assembly (accumulation per step),
//! so both always agree on traversal semantics.
//!
//! Each step is one point lookup. The walk has no fan-out, so its cost is the
//! length of the parent chain, capped by `max_steps`. Writes never build a
//! chain longer than the cap, so exceeding it means the data was damaged
//! outside the normal write path.

use crate::db::{NodeStore, NodeTransaction};
use crate::models::ContentNode;
use crate::services::HierarchyError;
use anyhow::Result;
use async_trait::async_trait;

/// Point lookup used by the walk; implemented over plain store reads and
/// over an open transaction.
#[async_trait]
pub trait NodeLookup: Send {
    async fn lookup(&mut self, id: &str) -> Result<Option<ContentNode>>;
}

/// Lookup through committed store state (no transaction)
pub struct StoreLookup<'a>(pub &'a dyn NodeStore);

#[async_trait]
impl NodeLookup for StoreLookup<'_> {
    async fn lookup(&mut self, id: &str) -> Result<Option<ContentNode>> {
        self.0.get_node(id).await
    }
}

/// Lookup inside an open transaction, seeing its staged writes
pub struct TxnLookup<'a>(pub &'a mut dyn NodeTransaction);

#[async_trait]
impl NodeLookup for TxnLookup<'_> {
    async fn lookup(&mut self, id: &str) -> Result<Option<ContentNode>> {
        self.0.get_node(id).await
    }
}

/// Visitor verdict for one step of the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkStep {
    Continue,
    Stop,
}

/// How a walk ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// Reached a node without parent after visiting `steps` nodes
    ReachedRoot { steps: usize },

    /// The visitor stopped the walk at node `at`
    Stopped { at: String, steps: usize },

    /// `missing_id` did not resolve; with `steps == 0` the start node itself is missing
    Dangling { missing_id: String, steps: usize },
}

/// Walk from `start_id` up through `parent_id` links, calling `visit` on every
/// node, the start node included.
///
/// # Errors
///
/// - `CorruptHierarchy` if more than `max_steps` nodes would be visited
/// - `StoreUnavailable` if a lookup fails
pub async fn walk_to_root<L, V>(
    lookup: &mut L,
    start_id: &str,
    max_steps: usize,
    mut visit: V,
) -> Result<WalkOutcome, HierarchyError>
where
    L: NodeLookup,
    V: FnMut(&ContentNode) -> WalkStep + Send,
{
    let mut current = Some(start_id.to_string());
    let mut steps = 0;

    while let Some(id) = current {
        if steps >= max_steps {
            tracing::warn!(
                "Ancestor walk from {} exceeded {} steps; parent chain is corrupted",
                start_id,
                max_steps
            );
            return Err(HierarchyError::corrupt_hierarchy(
                start_id,
                format!("ancestor walk exceeded {} steps", max_steps),
            ));
        }

        let node = match lookup
            .lookup(&id)
            .await
            .map_err(HierarchyError::store_unavailable)?
        {
            Some(node) => node,
            None => {
                return Ok(WalkOutcome::Dangling {
                    missing_id: id,
                    steps,
                })
            }
        };
        steps += 1;

        if visit(&node) == WalkStep::Stop {
            return Ok(WalkOutcome::Stopped { at: node.id, steps });
        }

        current = node.parent_id;
    }

    Ok(WalkOutcome::ReachedRoot { steps })
}

/// Cycle guard: would making `candidate_parent_id` the parent of `node_id`
/// make `node_id` its own ancestor?
///
/// Walks upward from the candidate parent and answers `true` as soon as the
/// walk reaches `node_id`. A candidate equal to `node_id` trivially answers
/// `true`; callers reject that case as a self-parent error before calling.
///
/// Must be evaluated inside the transaction that writes the new parent pointer.
pub async fn would_cycle<L>(
    lookup: &mut L,
    node_id: &str,
    candidate_parent_id: &str,
    max_steps: usize,
) -> Result<bool, HierarchyError>
where
    L: NodeLookup,
{
    let outcome = walk_to_root(lookup, candidate_parent_id, max_steps, |ancestor| {
        if ancestor.id == node_id {
            WalkStep::Stop
        } else {
            WalkStep::Continue
        }
    })
    .await?;

    tracing::debug!(
        "Cycle check {} -> {}: {:?}",
        node_id,
        candidate_parent_id,
        outcome
    );

    Ok(matches!(outcome, WalkOutcome::Stopped { .. }))
}

/// Number of nodes on the path from `start_id` to its root, start included.
///
/// A missing ancestor ends the path, as it does for the cycle guard; a missing
/// start node has depth 0.
///
/// # Errors
///
/// `CorruptHierarchy` if the path is longer than `max_steps`
pub async fn chain_depth<L>(
    lookup: &mut L,
    start_id: &str,
    max_steps: usize,
) -> Result<usize, HierarchyError>
where
    L: NodeLookup,
{
    let outcome = walk_to_root(lookup, start_id, max_steps, |_| WalkStep::Continue).await?;

    Ok(match outcome {
        WalkOutcome::ReachedRoot { steps }
        | WalkOutcome::Stopped { steps, .. }
        | WalkOutcome::Dangling { steps, .. } => steps,
    })
}
