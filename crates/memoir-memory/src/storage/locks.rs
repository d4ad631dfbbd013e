//! Per-user async locks

use crate::memory::UserId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user, created on first use
///
/// Used to serialize read-modify-write of single-row records and, at the
/// controller level, whole turns of the same user. Different users never
/// contend.
#[derive(Debug, Default, Clone)]
pub struct UserLocks {
    locks: Arc<DashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and hold the lock of `user_id`
    pub async fn lock(&self, user_id: UserId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard guard is released before awaiting
        let lock = self
            .locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        lock.lock_owned().await
    }

    /// Number of users that have been locked at least once
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Whether no user has been locked yet
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
