//! # Comparison Locks
//!
//! One async mutex per `(store_id, comp_date)`. A reconciliation run holds
//! its key's lock from the first read to the audit write, so two runs for
//! the same key never interleave their replace steps. Runs for different
//! keys don't contend.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockKey = (String, NaiveDate);

/// Keyed lock table. Clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct ComparisonLocks {
    inner: Arc<Mutex<HashMap<LockKey, Arc<AsyncMutex<()>>>>>,
}

impl ComparisonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the lock of `(store_id, comp_date)`.
    pub async fn lock(&self, store_id: &str, comp_date: NaiveDate) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut table = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            // Entries only the table references are idle.
            table.retain(|_, m| Arc::strong_count(m) > 1);

            table
                .entry((store_id.to_string(), comp_date))
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        mutex.lock_owned().await
    }

    /// Number of keys currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .map(|table| table.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = ComparisonLocks::new();
        let guard = locks.lock("s1", date(1)).await;

        let contender = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = contender.lock("s1", date(1)).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = ComparisonLocks::new();
        let _a = locks.lock("s1", date(1)).await;
        let _b = locks.lock("s1", date(2)).await;
        let _c = locks.lock("s2", date(1)).await;

        assert_eq!(locks.tracked(), 3);
    }

    #[tokio::test]
    async fn test_idle_keys_are_pruned() {
        let locks = ComparisonLocks::new();
        drop(locks.lock("s1", date(1)).await);
        drop(locks.lock("s1", date(2)).await);

        let _held = locks.lock("s1", date(3)).await;
        assert_eq!(locks.tracked(), 1);
    }
}
