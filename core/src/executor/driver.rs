//! Simulated execution driver.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::FutureExt;
use tokio::time::Instant;

use super::registry::CancellationRegistry;
use super::stats::format_duration;
use super::traits::{RandomSource, Sleeper, TaskExecutor, TaskObserver, ThreadRandom, TokioSleeper};
use crate::config::ExecutionConfig;
use crate::error::ExecutorError;
use crate::task::{Task, TaskStatus};

pub const SIMULATED_STEP_ERROR: &str = "Simulated processing error";

const COMPLETION_OUTPUTS: [&str; 5] = [
    "Analysis completed successfully. Found 3 key insights and 5 recommendations.",
    "Research concluded with 12 relevant sources identified and synthesized.",
    "Document processed. Extracted 1,247 data points across 15 categories.",
    "Task completed. Results have been compiled and are ready for review.",
    "Processing finished. Generated comprehensive report with actionable insights.",
];

/// Step latency and failure injection for the simulated driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationPolicy {
    pub min_step_delay: Duration,
    pub max_step_delay: Duration,
    /// Probability in `[0, 1]` that a step fails after its delay.
    pub failure_rate: f64,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        Self {
            min_step_delay: Duration::from_millis(1000),
            max_step_delay: Duration::from_millis(3000),
            failure_rate: 0.05,
        }
    }
}

impl From<&ExecutionConfig> for SimulationPolicy {
    fn from(cfg: &ExecutionConfig) -> Self {
        Self {
            min_step_delay: Duration::from_millis(cfg.min_step_delay_ms),
            max_step_delay: Duration::from_millis(cfg.max_step_delay_ms.max(cfg.min_step_delay_ms)),
            failure_rate: cfg.failure_rate.clamp(0.0, 1.0),
        }
    }
}

impl SimulationPolicy {
    /// Uniform in `[min, max)` for a draw in `[0, 1)`.
    pub fn step_delay(&self, draw: f64) -> Duration {
        let span = self.max_step_delay.saturating_sub(self.min_step_delay);
        self.min_step_delay + span.mul_f64(draw.clamp(0.0, 1.0))
    }

    pub fn is_failure(&self, draw: f64) -> bool {
        draw < self.failure_rate
    }
}

/// Advances a task through its steps with simulated latency.
///
/// Each step draws twice from the random source: once for the delay, once
/// for the failure check. Reaching the end of the step list draws once more
/// to pick the completion message.
pub struct SimulatedDriver {
    registry: CancellationRegistry,
    policy: SimulationPolicy,
    sleeper: Arc<dyn Sleeper>,
    random: Arc<dyn RandomSource>,
}

impl SimulatedDriver {
    pub fn new(registry: CancellationRegistry) -> Self {
        Self {
            registry,
            policy: SimulationPolicy::default(),
            sleeper: Arc::new(TokioSleeper),
            random: Arc::new(ThreadRandom),
        }
    }

    pub fn with_policy(mut self, policy: SimulationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn registry(&self) -> &CancellationRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &SimulationPolicy {
        &self.policy
    }

    /// Run one attempt. Resolves when the task completes, fails or pauses.
    ///
    /// Steps already `completed` are skipped, so re-invoking on a paused task
    /// resumes at its first unfinished step.
    pub async fn execute(&self, task: Task, observer: &dyn TaskObserver) -> Task {
        let registration = self.registry.register(&task.id);
        let started = Instant::now();
        let mut current = task;

        tracing::debug!(
            target: "taskdeck.executor",
            stage = "execute.start",
            task_id = %current.id,
            steps = current.steps.len()
        );

        let outcome = AssertUnwindSafe(self.drive(
            &mut current,
            registration.token(),
            observer,
            started,
        ))
        .catch_unwind()
        .await;

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => Some(ExecutorError::from_panic(payload)),
        };

        if let Some(err) = error {
            if current.status.is_terminal() || current.status == TaskStatus::Paused {
                tracing::error!(
                    target: "taskdeck.executor",
                    task_id = %current.id,
                    error = %err,
                    "error after task reached {}", current.status
                );
            } else {
                tracing::error!(target: "taskdeck.executor", task_id = %current.id, error = %err, "task execution aborted");
                current.status = TaskStatus::Failed;
                current.error = Some(err.to_string());
                finish(&mut current, started);
            }
        }

        // Final snapshot and on_complete, each guarded on its own.
        notify_guarded(&current, "on_update", || observer.on_update(&current));
        if current.status.is_terminal() {
            notify_guarded(&current, "on_complete", || observer.on_complete(&current));
        }

        drop(registration);
        tracing::debug!(
            target: "taskdeck.executor",
            stage = "execute.end",
            task_id = %current.id,
            status = %current.status,
            progress = current.progress
        );
        current
    }

    /// Advance `task` until it completes, fails or pauses. The final
    /// snapshot is left for the caller to emit.
    async fn drive(
        &self,
        task: &mut Task,
        cancel: &tokio_util::sync::CancellationToken,
        observer: &dyn TaskObserver,
        started: Instant,
    ) -> Result<(), ExecutorError> {
        task.status = TaskStatus::Running;
        task.error = None;
        task.output = None;
        task.completed_at = None;
        task.duration = None;
        if task.started_at.is_none() {
            task.started_at = Some(Utc::now());
        }
        observer.on_update(task);

        let total = task.steps.len();
        for i in 0..total {
            if task.steps[i].status == TaskStatus::Completed {
                continue;
            }

            if cancel.is_cancelled() {
                return pause(task, i);
            }

            task.set_step_status(i, TaskStatus::Running)?;
            let step = &mut task.steps[i];
            step.started_at = Some(Utc::now());
            step.completed_at = None;
            step.error = None;
            let progress = ((i as f64 / total as f64) * 100.0).round() as u8;
            task.progress = task.progress.max(progress);
            observer.on_update(task);

            let delay = self.policy.step_delay(self.random.next_f64());
            tracing::trace!(target: "taskdeck.executor", task_id = %task.id, step = i, delay_ms = delay.as_millis() as u64);
            self.sleeper.sleep(delay).await;

            if cancel.is_cancelled() {
                return pause(task, i);
            }

            if self.policy.is_failure(self.random.next_f64()) {
                task.set_step_status(i, TaskStatus::Failed)?;
                let step = &mut task.steps[i];
                step.completed_at = Some(Utc::now());
                step.error = Some(SIMULATED_STEP_ERROR.to_string());
                task.error = Some(format!(
                    "Step \"{}\" failed: {}",
                    step.name, SIMULATED_STEP_ERROR
                ));
                task.status = TaskStatus::Failed;
                finish(task, started);
                tracing::info!(target: "taskdeck.executor", task_id = %task.id, step = i, "task failed");
                return Ok(());
            }

            task.set_step_status(i, TaskStatus::Completed)?;
            let step = &mut task.steps[i];
            step.completed_at = Some(Utc::now());
            step.output = Some(format!("Step {} completed successfully", i + 1));
            if task
                .steps
                .get(i + 1)
                .is_some_and(|next| next.status == TaskStatus::Idle)
            {
                task.set_step_status(i + 1, TaskStatus::Queued)?;
            }
            observer.on_update(task);
        }

        let pick = (self.random.next_f64() * COMPLETION_OUTPUTS.len() as f64) as usize;
        task.status = TaskStatus::Completed;
        task.progress = 100;
        task.output = Some(COMPLETION_OUTPUTS[pick.min(COMPLETION_OUTPUTS.len() - 1)].to_string());
        finish(task, started);
        tracing::info!(target: "taskdeck.executor", task_id = %task.id, duration = ?task.duration, "task completed");
        Ok(())
    }
}

#[async_trait]
impl TaskExecutor for SimulatedDriver {
    async fn execute(&self, task: Task, observer: &dyn TaskObserver) -> Task {
        SimulatedDriver::execute(self, task, observer).await
    }
}

fn pause(task: &mut Task, index: usize) -> Result<(), ExecutorError> {
    task.set_step_status(index, TaskStatus::Idle)?;
    task.status = TaskStatus::Paused;
    tracing::info!(target: "taskdeck.executor", task_id = %task.id, step = index, "task paused");
    Ok(())
}

/// Run one observer callback, logging a panic instead of unwinding.
pub(crate) fn notify_guarded(task: &Task, callback: &'static str, f: impl FnOnce()) {
    if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(f)) {
        let err = ExecutorError::from_panic(payload);
        tracing::error!(
            target: "taskdeck.executor",
            task_id = %task.id,
            callback,
            error = %err,
            "observer panicked"
        );
    }
}

pub(crate) fn finish(task: &mut Task, started: Instant) {
    task.completed_at = Some(Utc::now());
    task.duration = Some(format_duration(started.elapsed()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::traits::{InstantSleeper, ScriptedRandom};
    use crate::task::{create_task, Agent, AgentType};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<Task>>,
        completes: Mutex<Vec<Task>>,
    }

    impl TaskObserver for Recorder {
        fn on_update(&self, task: &Task) {
            self.updates.lock().unwrap().push(task.clone());
        }

        fn on_complete(&self, task: &Task) {
            self.completes.lock().unwrap().push(task.clone());
        }
    }

    fn task(name: &str) -> Task {
        let agent = Agent::new("A", AgentType::Analyst);
        create_task(name, "", &agent, None)
    }

    fn driver(random: ScriptedRandom) -> SimulatedDriver {
        SimulatedDriver::new(CancellationRegistry::new())
            .with_sleeper(Arc::new(InstantSleeper))
            .with_random(Arc::new(random))
    }

    #[test]
    fn test_policy_delay_bounds() {
        let policy = SimulationPolicy::default();
        assert_eq!(policy.step_delay(0.0), Duration::from_millis(1000));
        assert_eq!(policy.step_delay(0.5), Duration::from_millis(2000));
        assert!(policy.step_delay(0.999) < Duration::from_millis(3000));
        assert!(policy.is_failure(0.049));
        assert!(!policy.is_failure(0.05));
    }

    #[test]
    fn test_policy_from_config_orders_bounds() {
        let cfg = ExecutionConfig {
            min_step_delay_ms: 500,
            max_step_delay_ms: 100,
            failure_rate: 2.0,
            ..ExecutionConfig::default()
        };
        let policy = SimulationPolicy::from(&cfg);
        assert_eq!(policy.max_step_delay, Duration::from_millis(500));
        assert_eq!(policy.failure_rate, 1.0);
    }

    #[tokio::test]
    async fn test_success_path() {
        let rec = Recorder::default();
        let out = driver(ScriptedRandom::constant(0.5))
            .execute(task("Random Task"), &rec)
            .await;

        assert_eq!(out.status, TaskStatus::Completed);
        assert_eq!(out.progress, 100);
        assert!(out.steps.iter().all(|s| s.status == TaskStatus::Completed));
        assert_eq!(out.steps[2].output.as_deref(), Some("Step 3 completed successfully"));
        assert_eq!(out.output.as_deref(), Some(COMPLETION_OUTPUTS[2]));
        assert!(out.duration.is_some());

        let completes = rec.completes.lock().unwrap();
        assert_eq!(completes.len(), 1);
        assert_eq!(rec.updates.lock().unwrap().last(), Some(&out));
    }

    #[tokio::test]
    async fn test_failure_at_second_step() {
        // step 0: delay, pass; step 1: delay, fail
        let random = ScriptedRandom::new([0.5, 0.9, 0.5, 0.01], 0.5);
        let rec = Recorder::default();
        let out = driver(random).execute(task("Random Task"), &rec).await;

        assert_eq!(out.status, TaskStatus::Failed);
        assert_eq!(out.steps[0].status, TaskStatus::Completed);
        assert_eq!(out.steps[1].status, TaskStatus::Failed);
        assert_eq!(out.steps[1].error.as_deref(), Some(SIMULATED_STEP_ERROR));
        assert_eq!(
            out.error.as_deref(),
            Some("Step \"Processing\" failed: Simulated processing error")
        );
        assert_eq!(out.progress, 20);
        assert!(out.completed_at.is_some());
        assert_eq!(rec.completes.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_step_task_completes() {
        let mut t = task("x");
        t.steps.clear();
        let out = driver(ScriptedRandom::constant(0.0))
            .execute(t, &Recorder::default())
            .await;
        assert_eq!(out.status, TaskStatus::Completed);
        assert_eq!(out.progress, 100);
    }

    #[tokio::test]
    async fn test_observer_panic_is_recorded_as_failure() {
        use std::sync::atomic::{AtomicBool, Ordering};

        #[derive(Default)]
        struct Exploding {
            fired: AtomicBool,
        }
        impl TaskObserver for Exploding {
            fn on_update(&self, task: &Task) {
                if task.running_step().is_some() && !self.fired.swap(true, Ordering::SeqCst) {
                    panic!("observer exploded");
                }
            }
        }

        let d = driver(ScriptedRandom::constant(0.5));
        let out = d.execute(task("x"), &Exploding::default()).await;
        assert_eq!(out.status, TaskStatus::Failed);
        assert!(out.error.as_deref().unwrap_or_default().contains("observer exploded"));
        assert!(!d.registry().is_task_running(&out.id));
    }

    #[tokio::test]
    async fn test_panic_on_terminal_update_still_completes() {
        #[derive(Default)]
        struct FailsOnCompletedSnapshot {
            completes: Mutex<Vec<TaskStatus>>,
        }
        impl TaskObserver for FailsOnCompletedSnapshot {
            fn on_update(&self, task: &Task) {
                if task.status == TaskStatus::Completed {
                    panic!("renderer crashed");
                }
            }
            fn on_complete(&self, task: &Task) {
                self.completes.lock().unwrap().push(task.status);
            }
        }

        let obs = FailsOnCompletedSnapshot::default();
        let d = driver(ScriptedRandom::constant(0.5));
        let out = d.execute(task("Random Task"), &obs).await;

        assert_eq!(out.status, TaskStatus::Completed);
        assert_eq!(*obs.completes.lock().unwrap(), vec![TaskStatus::Completed]);
        assert!(!d.registry().is_task_running(&out.id));
    }

    #[tokio::test]
    async fn test_observer_panicking_everywhere_never_escapes() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        #[derive(Default)]
        struct AlwaysPanics {
            completes: AtomicUsize,
        }
        impl TaskObserver for AlwaysPanics {
            fn on_update(&self, _task: &Task) {
                panic!("update failed");
            }
            fn on_complete(&self, _task: &Task) {
                self.completes.fetch_add(1, Ordering::SeqCst);
                panic!("complete failed");
            }
        }

        let obs = AlwaysPanics::default();
        let out = driver(ScriptedRandom::constant(0.5))
            .execute(task("x"), &obs)
            .await;

        assert_eq!(out.status, TaskStatus::Failed);
        assert!(out.error.as_deref().unwrap_or_default().contains("update failed"));
        assert_eq!(obs.completes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_step_state_fails_task() {
        let mut t = task("x");
        t.steps[0].status = TaskStatus::Paused;
        let rec = Recorder::default();
        let out = driver(ScriptedRandom::constant(0.5)).execute(t, &rec).await;
        assert_eq!(out.status, TaskStatus::Failed);
        assert!(out.error.unwrap().contains("invalid step transition"));
        assert_eq!(rec.completes.lock().unwrap().len(), 1);
    }
}
