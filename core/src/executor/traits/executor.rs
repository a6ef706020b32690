use async_trait::async_trait;

use super::observer::TaskObserver;
use crate::task::Task;

/// Drives one task to a terminal or paused state.
///
/// Never fails: every fault is folded into the returned snapshot, which is
/// the same value last passed to `observer.on_update`.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(&self, task: Task, observer: &dyn TaskObserver) -> Task;
}
