//! Per-listing write locks
//!
//! Update and delete of one listing run one at a time so the image
//! reconcile step never interleaves. Entries are pruned when the last
//! holder lets go.

use std::sync::Arc;

use dashmap::DashMap;
use shamba_types::ListingId;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct ListingLocks {
    inner: Arc<DashMap<ListingId, Arc<Mutex<()>>>>,
}

impl ListingLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one listing
    pub async fn lock(&self, id: ListingId) -> ListingGuard {
        let mutex = self.inner.entry(id).or_default().clone();
        let guard = mutex.lock_owned().await;
        ListingGuard {
            id,
            locks: self.clone(),
            _guard: guard,
        }
    }

    /// Listings with a live lock entry
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Held for the duration of a listing mutation
pub struct ListingGuard {
    id: ListingId,
    locks: ListingLocks,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for ListingGuard {
    fn drop(&mut self) {
        // One reference in the map, one in our guard; more means waiters
        self.locks
            .inner
            .remove_if(&self.id, |_, mutex| Arc::strong_count(mutex) <= 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_pruned_after_release() {
        let locks = ListingLocks::new();
        let id = ListingId::new();
        {
            let _guard = locks.lock(id).await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_same_listing_serialized() {
        let locks = ListingLocks::new();
        let id = ListingId::new();
        let guard = locks.lock(id).await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_listings_independent() {
        let locks = ListingLocks::new();
        let _a = locks.lock(ListingId::new()).await;
        let _b = locks.lock(ListingId::new()).await;
        assert_eq!(locks.len(), 2);
    }
}
