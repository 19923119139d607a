//! Max occupancy count shared by all clients.

use tokio::sync::{Mutex, MutexGuard};

/// Max count used when nothing else is configured.
pub const DEFAULT_MAX_COUNT: u32 = 5;

/// Outcome of applying a new max count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxUpdate {
    /// Max count before the update.
    pub previous: u32,
    /// Max count after the update.
    pub current: u32,
}

impl MaxUpdate {
    /// Signed difference between the new and the old max.
    #[must_use]
    pub fn delta(&self) -> i64 {
        i64::from(self.current) - i64::from(self.previous)
    }

    /// Number of extra entries to let through, only when the max grew.
    #[must_use]
    pub fn door_openings(&self) -> Option<u32> {
        self.current
            .checked_sub(self.previous)
            .filter(|&added| added > 0)
    }
}

/// The process-wide max occupancy count.
///
/// Not persisted: a fresh state starts from the configured initial value.
#[derive(Debug)]
pub struct OccupancyState {
    max_count: Mutex<u32>,
}

impl Default for OccupancyState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COUNT)
    }
}

impl OccupancyState {
    /// Create a new state with the given initial max count.
    #[must_use]
    pub fn new(initial: u32) -> Self {
        Self {
            max_count: Mutex::new(initial),
        }
    }

    /// Current max count.
    pub async fn current(&self) -> u32 {
        *self.max_count.lock().await
    }

    /// Take exclusive access to the count.
    ///
    /// Hold the guard for as long as the read-modify-write and anything that
    /// depends on its result must appear atomic to other clients.
    pub async fn lock(&self) -> OccupancyGuard<'_> {
        OccupancyGuard {
            max_count: self.max_count.lock().await,
        }
    }
}

/// Exclusive handle on the max count.
pub struct OccupancyGuard<'a> {
    max_count: MutexGuard<'a, u32>,
}

impl OccupancyGuard<'_> {
    /// Current max count.
    #[must_use]
    pub fn current(&self) -> u32 {
        *self.max_count
    }

    /// Replace the max count, even when it is unchanged.
    pub fn apply(&mut self, new_max: u32) -> MaxUpdate {
        let previous = std::mem::replace(&mut *self.max_count, new_max);
        MaxUpdate {
            previous,
            current: new_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_door_openings_only_on_increase() {
        let grow = MaxUpdate { previous: 5, current: 8 };
        assert_eq!(grow.delta(), 3);
        assert_eq!(grow.door_openings(), Some(3));

        let same = MaxUpdate { previous: 8, current: 8 };
        assert_eq!(same.delta(), 0);
        assert_eq!(same.door_openings(), None);

        let shrink = MaxUpdate { previous: 8, current: 5 };
        assert_eq!(shrink.delta(), -3);
        assert_eq!(shrink.door_openings(), None);
    }

    #[tokio::test]
    async fn test_default_and_apply() {
        let state = OccupancyState::default();
        assert_eq!(state.current().await, DEFAULT_MAX_COUNT);

        let update = state.lock().await.apply(9);
        assert_eq!(update, MaxUpdate { previous: 5, current: 9 });
        assert_eq!(state.current().await, 9);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_see_consistent_deltas() {
        let state = Arc::new(OccupancyState::new(1));

        let handles: Vec<_> = (2..=50u32)
            .map(|n| {
                let state = Arc::clone(&state);
                tokio::spawn(async move { state.lock().await.apply(n) })
            })
            .collect();

        let mut updates = Vec::new();
        for handle in handles {
            updates.push(handle.await.unwrap());
        }

        // Every update must chain off another update's result (or the initial
        // value), so no value is ever observed as `previous` twice.
        let mut previous: Vec<u32> = updates.iter().map(|u| u.previous).collect();
        previous.sort_unstable();
        previous.dedup();
        assert_eq!(previous.len(), updates.len());

        let last = state.current().await;
        assert!(updates.iter().any(|u| u.current == last));
    }
}
