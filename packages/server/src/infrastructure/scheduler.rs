//! Transition scheduler: cancelable delayed room transitions.
//!
//! Every pending transition is a spawned tokio task keyed by
//! `(GameId, TimerKey)`. Scheduling under an existing key aborts the previous
//! task, so at most one timer per key is ever pending.
//!
//! A task removes its own entry before running its action. Aborting happens
//! only while a task is still sleeping; an action that is already running
//! (possibly waiting for a room lock) is never torn in half. Actions must
//! therefore re-validate the room when they get the lock.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio::{sync::Mutex, task::AbortHandle};

use crate::domain::{GameId, TimerKey};

type TimerMap = HashMap<(GameId, TimerKey), PendingTimer>;

struct PendingTimer {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Default)]
pub struct TransitionScheduler {
    timers: Arc<Mutex<TimerMap>>,
    generation: AtomicU64,
}

impl TransitionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay`, replacing any timer pending under the same key.
    pub async fn schedule<F>(&self, game_id: &GameId, key: TimerKey, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let slot = (game_id.clone(), key);

        // Hold the map lock across spawn so the task cannot look for its
        // entry before it exists.
        let mut timers = self.timers.lock().await;

        let task_timers = Arc::clone(&self.timers);
        let task_slot = slot.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = task_timers.lock().await;
                match timers.get(&task_slot) {
                    Some(pending) if pending.generation == generation => {
                        timers.remove(&task_slot);
                    }
                    // Superseded between waking up and getting the lock.
                    _ => return,
                }
            }
            tracing::debug!(
                "Timer '{}' fired for game '{}'",
                task_slot.1,
                task_slot.0
            );
            action.await;
        });

        if let Some(previous) = timers.insert(
            slot,
            PendingTimer {
                generation,
                handle: task.abort_handle(),
            },
        ) {
            previous.handle.abort();
            tracing::debug!("Timer '{}' for game '{}' replaced", key, game_id);
        } else {
            tracing::debug!(
                "Timer '{}' scheduled for game '{}' in {:?}",
                key,
                game_id,
                delay
            );
        }
    }

    /// Cancel one pending timer. Returns whether one was pending.
    pub async fn cancel(&self, game_id: &GameId, key: TimerKey) -> bool {
        let mut timers = self.timers.lock().await;
        match timers.remove(&(game_id.clone(), key)) {
            Some(pending) => {
                pending.handle.abort();
                tracing::debug!("Timer '{}' for game '{}' cancelled", key, game_id);
                true
            }
            None => false,
        }
    }

    /// Cancel every pending timer of a room. Returns how many were pending.
    pub async fn cancel_all(&self, game_id: &GameId) -> usize {
        let mut timers = self.timers.lock().await;
        let keys: Vec<(GameId, TimerKey)> = timers
            .keys()
            .filter(|(id, _)| id == game_id)
            .cloned()
            .collect();
        for key in &keys {
            if let Some(pending) = timers.remove(key) {
                pending.handle.abort();
            }
        }
        if !keys.is_empty() {
            tracing::debug!("Cancelled {} timer(s) for game '{}'", keys.len(), game_id);
        }
        keys.len()
    }

    /// Number of timers pending for a room.
    pub async fn pending(&self, game_id: &GameId) -> usize {
        let timers = self.timers.lock().await;
        timers.keys().filter(|(id, _)| id == game_id).count()
    }

    pub async fn is_pending(&self, game_id: &GameId, key: TimerKey) -> bool {
        let timers = self.timers.lock().await;
        timers.contains_key(&(game_id.clone(), key))
    }
}
