use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use super::traits::{TaskExecutor, TaskObserver};
use crate::task::Task;

/// Run `tasks` through `executor` with at most `concurrency` attempts in flight.
///
/// Workers pull from a FIFO queue and only take the next task once their
/// current one resolves. Returns final snapshots in input order.
pub async fn run_batch<E>(
    executor: &E,
    tasks: Vec<Task>,
    observer: &dyn TaskObserver,
    concurrency: usize,
) -> Vec<Task>
where
    E: TaskExecutor + ?Sized,
{
    let total = tasks.len();
    if total == 0 {
        return Vec::new();
    }

    let workers = concurrency.max(1).min(total);
    let queue: Mutex<VecDeque<(usize, Task)>> = Mutex::new(tasks.into_iter().enumerate().collect());

    tracing::debug!(target: "taskdeck.scheduler", stage = "batch.start", total, workers);

    let mut futs: FuturesUnordered<_> = (0..workers)
        .map(|worker| run_worker(worker, executor, &queue, observer))
        .collect();

    let mut results: Vec<Option<Task>> = vec![None; total];
    while let Some(done) = futs.next().await {
        for (idx, task) in done {
            results[idx] = Some(task);
        }
    }

    tracing::debug!(target: "taskdeck.scheduler", stage = "batch.end", total);
    results.into_iter().flatten().collect()
}

async fn run_worker<E>(
    worker: usize,
    executor: &E,
    queue: &Mutex<VecDeque<(usize, Task)>>,
    observer: &dyn TaskObserver,
) -> Vec<(usize, Task)>
where
    E: TaskExecutor + ?Sized,
{
    let mut finished = Vec::new();
    loop {
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some((idx, task)) = next else {
            break;
        };
        tracing::trace!(target: "taskdeck.scheduler", worker, task_id = %task.id, "worker picked task");
        let done = executor.execute(task, observer).await;
        finished.push((idx, done));
    }
    finished
}
