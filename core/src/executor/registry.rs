//! Per-attempt cancellation handles keyed by task id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

#[derive(Debug)]
struct Handle {
    attempt: u64,
    token: CancellationToken,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_attempt: u64,
    handles: HashMap<String, Handle>,
}

/// Maps running task ids to their cancellation handles.
///
/// Cheap to clone; clones share the same map. The lock is never held across
/// an await point.
#[derive(Debug, Clone, Default)]
pub struct CancellationRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a fresh handle for one execution attempt of `task_id`.
    ///
    /// The handle is removed when the returned guard drops. A stale guard from
    /// an earlier attempt never removes a newer attempt's handle.
    pub fn register(&self, task_id: &str) -> Registration {
        let token = CancellationToken::new();
        let mut inner = self.lock();
        inner.next_attempt += 1;
        let attempt = inner.next_attempt;
        let previous = inner.handles.insert(
            task_id.to_string(),
            Handle {
                attempt,
                token: token.clone(),
            },
        );
        drop(inner);

        if previous.is_some() {
            tracing::warn!(
                target: "taskdeck.registry",
                task_id = %task_id,
                attempt,
                "task registered while a previous attempt was still active"
            );
        }

        Registration {
            registry: self.clone(),
            task_id: task_id.to_string(),
            attempt,
            token,
        }
    }

    /// Request a cooperative stop. Returns `false` when no attempt is active.
    pub fn pause_task(&self, task_id: &str) -> bool {
        let inner = self.lock();
        match inner.handles.get(task_id) {
            Some(handle) => {
                handle.token.cancel();
                tracing::debug!(target: "taskdeck.registry", task_id = %task_id, "pause requested");
                true
            }
            None => false,
        }
    }

    pub fn is_task_running(&self, task_id: &str) -> bool {
        self.lock().handles.contains_key(task_id)
    }

    /// Cancel and forget every handle. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Handle> = {
            let mut inner = self.lock();
            inner.handles.drain().map(|(_, h)| h).collect()
        };
        for handle in &drained {
            handle.token.cancel();
        }
        if !drained.is_empty() {
            tracing::info!(target: "taskdeck.registry", cancelled = drained.len(), "cancelled all running tasks");
        }
        drained.len()
    }

    pub fn active_count(&self) -> usize {
        self.lock().handles.len()
    }

    pub fn running_task_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().handles.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn deregister(&self, task_id: &str, attempt: u64) {
        let mut inner = self.lock();
        if inner
            .handles
            .get(task_id)
            .is_some_and(|h| h.attempt == attempt)
        {
            inner.handles.remove(task_id);
        }
    }
}

/// Live registration for one execution attempt.
#[derive(Debug)]
pub struct Registration {
    registry: CancellationRegistry,
    task_id: String,
    attempt: u64,
    token: CancellationToken,
}

impl Registration {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.deregister(&self.task_id, self.attempt);
    }
}
