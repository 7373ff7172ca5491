//! Per-collection write locks
//!
//! Every hierarchy mutation holds its collection's lock from the first check
//! to the commit. Collections never share parents, so mutations in different
//! collections proceed in parallel. Reads never take these locks.
//!
//! Entries live only while some task holds or waits for the lock; the last
//! guard to drop removes its collection from the registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Registry of one async mutex per collection id
#[derive(Debug, Clone, Default)]
pub struct CollectionLocks {
    locks: LockMap,
}

/// Held write lock for one collection; released on drop
#[derive(Debug)]
pub struct CollectionGuard {
    locks: LockMap,
    collection_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the collection's write lock
    pub async fn acquire(&self, collection_id: &str) -> CollectionGuard {
        // Cloned under the registry lock, so a releasing guard sees this waiter
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks
                .entry(collection_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        CollectionGuard {
            locks: Arc::clone(&self.locks),
            collection_id: collection_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Number of collections currently locked or awaited
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for CollectionGuard {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        self.guard.take();

        let unused = locks
            .get(&self.collection_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if unused {
            locks.remove(&self.collection_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_collection_is_exclusive() {
        let locks = CollectionLocks::new();
        let guard = locks.acquire("wiki").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("wiki").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        waiting.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_collections_do_not_block() {
        let locks = CollectionLocks::new();
        let _wiki = locks.acquire("wiki").await;

        let _blog = tokio::time::timeout(Duration::from_millis(200), locks.acquire("blog"))
            .await
            .expect("blog lock must not wait on wiki");
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn test_released_collections_leave_the_registry() {
        let locks = CollectionLocks::new();
        for i in 0..100 {
            let _guard = locks.acquire(&format!("collection-{}", i)).await;
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_a_waiter_remains() {
        let locks = CollectionLocks::new();
        let guard = locks.acquire("wiki").await;

        let contender = locks.clone();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire("wiki").await;
            let _ = rx.await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(guard);
        tokio::time::sleep(Duration::from_millis(20)).await;

        // The waiter now holds the lock; a newcomer must queue behind it
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), locks.acquire("wiki")).await;
        assert!(blocked.is_err());
        assert_eq!(locks.len(), 1);

        tx.send(()).unwrap();
        waiting.await.unwrap();
        assert!(locks.is_empty());
    }
}
