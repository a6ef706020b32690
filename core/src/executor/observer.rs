use std::sync::Arc;

use tokio::sync::mpsc;

use super::traits::TaskObserver;
use crate::task::Task;

/// Adapts a pair of closures.
pub struct FnObserver<U, C> {
    on_update: U,
    on_complete: C,
}

impl<U> FnObserver<U, fn(&Task)>
where
    U: Fn(&Task) + Send + Sync,
{
    pub fn updates(on_update: U) -> Self {
        Self {
            on_update,
            on_complete: |_| {},
        }
    }
}

impl<U, C> FnObserver<U, C>
where
    U: Fn(&Task) + Send + Sync,
    C: Fn(&Task) + Send + Sync,
{
    pub fn new(on_update: U, on_complete: C) -> Self {
        Self {
            on_update,
            on_complete,
        }
    }
}

impl<U, C> TaskObserver for FnObserver<U, C>
where
    U: Fn(&Task) + Send + Sync,
    C: Fn(&Task) + Send + Sync,
{
    fn on_update(&self, task: &Task) {
        (self.on_update)(task)
    }

    fn on_complete(&self, task: &Task) {
        (self.on_complete)(task)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Updated(Task),
    Completed(Task),
}

impl TaskEvent {
    pub fn task(&self) -> &Task {
        match self {
            Self::Updated(t) | Self::Completed(t) => t,
        }
    }
}

/// Forwards owned snapshots over an unbounded channel.
///
/// Sends after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<TaskEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TaskEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl TaskObserver for ChannelObserver {
    fn on_update(&self, task: &Task) {
        let _ = self.tx.send(TaskEvent::Updated(task.clone()));
    }

    fn on_complete(&self, task: &Task) {
        let _ = self.tx.send(TaskEvent::Completed(task.clone()));
    }
}

/// Delivers every event to each child in order.
#[derive(Default, Clone)]
pub struct FanoutObserver {
    children: Vec<Arc<dyn TaskObserver>>,
}

impl FanoutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.children.push(observer);
        self
    }

    pub fn push(&mut self, observer: Arc<dyn TaskObserver>) {
        self.children.push(observer);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl TaskObserver for FanoutObserver {
    fn on_update(&self, task: &Task) {
        for child in &self.children {
            child.on_update(task);
        }
    }

    fn on_complete(&self, task: &Task) {
        for child in &self.children {
            child.on_complete(task);
        }
    }
}
