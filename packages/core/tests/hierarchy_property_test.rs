//! Randomized Hierarchy Tests
//!
//! Drives seeded random sequences of create/rename/move/delete operations and
//! checks after every step that:
//!
//! - no node is its own ancestor (breadcrumbs terminate, start at a root and
//!   end at the node)
//! - no two nodes of a collection share a slug
//! - no node references a missing parent
//!
//! Rejected operations are expected; they must leave the invariants intact.

#[cfg(test)]
mod property_tests {
    use folio_core::db::{MemoryStore, NodeStore};
    use folio_core::models::{CreateNodeParams, NodeUpdate};
    use folio_core::services::{ErrorKind, HierarchyService};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;
    use std::sync::Arc;

    const TITLES: &[&str] = &[
        "Home", "Guide", "Setup", "FAQ", "API", "Install", "Usage", "Notes", "Intro", "Misc",
    ];

    async fn assert_invariants(service: &HierarchyService, store: &MemoryStore, ids: &[String]) {
        let mut slugs = HashSet::new();

        for id in ids {
            let node = store.get_node(id).await.unwrap().unwrap();
            assert!(
                slugs.insert((node.collection_id.clone(), node.slug.clone())),
                "duplicate slug {}",
                node.slug
            );

            if let Some(parent_id) = &node.parent_id {
                assert!(store.get_node(parent_id).await.unwrap().is_some());
            }

            let trail = service.get_breadcrumbs(id).await.unwrap();
            assert_eq!(trail.last().map(|c| c.id.as_str()), Some(id.as_str()));
            let first = store.get_node(&trail[0].id).await.unwrap().unwrap();
            assert!(first.parent_id.is_none());

            let unique: HashSet<&str> = trail.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(unique.len(), trail.len(), "node repeated in path of {}", id);
        }
    }

    async fn run_sequence(seed: u64, steps: usize) {
        let store = MemoryStore::new();
        let service = HierarchyService::new(Arc::new(store.clone()));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ids: Vec<String> = Vec::new();

        for step in 0..steps {
            let op = if ids.is_empty() { 0 } else { rng.random_range(0..4) };

            match op {
                0 => {
                    let title = format!(
                        "{} {}",
                        TITLES[rng.random_range(0..TITLES.len())],
                        rng.random_range(0..6)
                    );
                    let parent = if !ids.is_empty() && rng.random_bool(0.7) {
                        Some(ids[rng.random_range(0..ids.len())].clone())
                    } else {
                        None
                    };
                    let mut params = CreateNodeParams::new(title);
                    params.parent_id = parent;

                    match service.create_node("wiki", params).await {
                        Ok(node) => ids.push(node.id),
                        Err(err) => assert_eq!(err.kind(), ErrorKind::SlugConflict),
                    }
                }
                1 => {
                    let id = &ids[rng.random_range(0..ids.len())];
                    let parent = if rng.random_bool(0.85) {
                        Some(ids[rng.random_range(0..ids.len())].clone())
                    } else {
                        None
                    };

                    if let Err(err) = service.move_node(id, parent.as_deref()).await {
                        assert!(
                            matches!(
                                err.kind(),
                                ErrorKind::CircularReference | ErrorKind::SelfParent
                            ),
                            "step {}: unexpected {:?}",
                            step,
                            err
                        );
                    }
                }
                2 => {
                    let id = &ids[rng.random_range(0..ids.len())];
                    let title = format!(
                        "{} {}",
                        TITLES[rng.random_range(0..TITLES.len())],
                        rng.random_range(0..6)
                    );

                    if let Err(err) = service
                        .update_node(id, NodeUpdate::new().with_title(title))
                        .await
                    {
                        assert_eq!(err.kind(), ErrorKind::SlugConflict);
                    }
                }
                _ => {
                    let index = rng.random_range(0..ids.len());
                    let has_children = !store.get_children(&ids[index]).await.unwrap().is_empty();

                    match service.delete_node(&ids[index]).await {
                        Ok(()) => {
                            assert!(!has_children);
                            ids.swap_remove(index);
                        }
                        Err(err) => {
                            assert!(has_children);
                            assert_eq!(err.kind(), ErrorKind::HasChildren);
                        }
                    }
                }
            }

            assert_invariants(&service, &store, &ids).await;
        }

        assert_eq!(store.len().await, ids.len());
    }

    #[tokio::test]
    async fn test_random_sequences_keep_invariants() {
        for seed in 0..20 {
            run_sequence(seed, 150).await;
        }
    }

    #[tokio::test]
    async fn test_long_sequence_keeps_invariants() {
        run_sequence(0x5eed, 500).await;
    }
}
