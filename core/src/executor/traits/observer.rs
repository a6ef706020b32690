use crate::task::Task;

/// Receives task snapshots from a driver.
///
/// `on_update` fires on every state change of one execution attempt;
/// `on_complete` fires exactly once when the attempt ends `completed` or
/// `failed` and never for a paused attempt. The snapshot is borrowed for the
/// duration of the call, so retaining it means cloning it; the driver's own
/// copy can never be observed mid-mutation.
pub trait TaskObserver: Send + Sync {
    fn on_update(&self, task: &Task);

    fn on_complete(&self, _task: &Task) {}
}

/// An observer that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TaskObserver for NoopObserver {
    fn on_update(&self, _task: &Task) {}
}

impl<T: TaskObserver + ?Sized> TaskObserver for std::sync::Arc<T> {
    fn on_update(&self, task: &Task) {
        (**self).on_update(task)
    }

    fn on_complete(&self, task: &Task) {
        (**self).on_complete(task)
    }
}
