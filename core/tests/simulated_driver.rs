mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    agent, assert_no_updates_after_terminal, assert_progress_monotonic,
    assert_single_running_step, status_sequence, Event, Recorder,
};
use pretty_assertions::assert_eq;
use taskdeck_core::api::{
    create_task, CancellationRegistry, FanoutObserver, FnObserver, InstantSleeper, ScriptedRandom,
    SimulatedDriver, SimulationPolicy, Task, TaskObserver, TaskStatus, TokioSleeper,
};

fn driver(registry: &CancellationRegistry, random: ScriptedRandom) -> SimulatedDriver {
    SimulatedDriver::new(registry.clone())
        .with_sleeper(Arc::new(TokioSleeper))
        .with_random(Arc::new(random))
}

#[tokio::test(start_paused = true)]
async fn completed_run_has_monotonic_progress_ending_at_100() {
    let registry = CancellationRegistry::new();
    let rec = Recorder::default();
    let task = create_task("Quarterly Financial Analysis", "Q3 books", &agent(), None);

    let out = driver(&registry, ScriptedRandom::constant(0.5))
        .execute(task, &rec)
        .await;

    let updates = rec.updates();
    assert_progress_monotonic(&updates);
    assert_single_running_step(&updates);
    assert_eq!(updates.last().map(|t| t.progress), Some(100));
    assert_eq!(out.status, TaskStatus::Completed);
    assert_eq!(
        status_sequence(&updates),
        vec![TaskStatus::Running, TaskStatus::Completed]
    );

    // Progress while running follows round(i / total * 100).
    let step_starts: Vec<u8> = updates
        .iter()
        .filter(|t| t.status == TaskStatus::Running && t.running_step().is_some())
        .map(|t| t.progress)
        .collect();
    assert_eq!(step_starts, vec![0, 20, 40, 60, 80]);
}

#[tokio::test(start_paused = true)]
async fn steps_move_idle_queued_running_completed() {
    let registry = CancellationRegistry::new();
    let rec = Recorder::default();
    let task = create_task("Random Task", "", &agent(), None);

    driver(&registry, ScriptedRandom::constant(0.5))
        .execute(task, &rec)
        .await;

    for step in 0..5 {
        let mut seen: Vec<TaskStatus> = Vec::new();
        for t in rec.updates() {
            let s = t.steps[step].status;
            if seen.last() != Some(&s) {
                seen.push(s);
            }
        }
        let expected = if step == 0 {
            vec![TaskStatus::Queued, TaskStatus::Running, TaskStatus::Completed]
        } else {
            vec![
                TaskStatus::Idle,
                TaskStatus::Queued,
                TaskStatus::Running,
                TaskStatus::Completed,
            ]
        };
        assert_eq!(seen, expected, "step {}", step);
    }
}

#[tokio::test(start_paused = true)]
async fn step_delay_stays_within_policy_bounds() {
    let registry = CancellationRegistry::new();
    let task = create_task("Random Task", "", &agent(), None);
    let started = tokio::time::Instant::now();

    // A draw of 0.0 picks the minimum delay; with the default rate it would
    // also trip the failure check.
    let out = driver(&registry, ScriptedRandom::constant(0.0))
        .with_policy(SimulationPolicy {
            failure_rate: 0.0,
            ..SimulationPolicy::default()
        })
        .execute(task, &Recorder::default())
        .await;

    assert_eq!(out.status, TaskStatus::Completed);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(5000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(5050), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn failure_is_terminal_and_reported_once() {
    let registry = CancellationRegistry::new();
    let rec = Recorder::default();
    let task = create_task("Research competitors", "", &agent(), None);
    let task_id = task.id.clone();

    // step 0 ok, step 1 ok, step 2 fails
    let random = ScriptedRandom::new([0.5, 0.5, 0.5, 0.5, 0.5, 0.01], 0.5);
    let out = driver(&registry, random).execute(task, &rec).await;

    assert_eq!(out.status, TaskStatus::Failed);
    assert_eq!(
        out.error.as_deref(),
        Some("Step \"Cross-referencing data\" failed: Simulated processing error")
    );
    assert_eq!(out.steps[2].status, TaskStatus::Failed);
    assert!(out.steps[3..].iter().all(|s| s.status == TaskStatus::Idle));
    assert!(out.duration.is_some());

    let events = rec.events();
    assert!(matches!(events.last(), Some(Event::Complete(_))));
    assert_eq!(rec.completes().len(), 1);
    assert_no_updates_after_terminal(&rec.updates());
    assert!(!registry.is_task_running(&task_id));
}

#[tokio::test(start_paused = true)]
async fn pause_unknown_task_is_noop() {
    let registry = CancellationRegistry::new();
    assert!(!registry.pause_task("does-not-exist"));
    assert_eq!(registry.active_count(), 0);
}

/// Pauses the task as soon as the given step starts running.
fn pause_at_step(registry: &CancellationRegistry, step: usize) -> Arc<dyn TaskObserver> {
    let registry = registry.clone();
    Arc::new(FnObserver::updates(move |t: &Task| {
        if t.running_step() == Some(step) {
            registry.pause_task(&t.id);
        }
    }))
}

#[tokio::test(start_paused = true)]
async fn pause_then_resume_skips_completed_steps() {
    let registry = CancellationRegistry::new();
    let rec = Arc::new(Recorder::default());
    let drv = driver(&registry, ScriptedRandom::constant(0.5));
    let task = create_task("Process invoices", "", &agent(), None);
    let task_id = task.id.clone();

    let pausing = FanoutObserver::new()
        .with(rec.clone())
        .with(pause_at_step(&registry, 2));
    let paused = drv.execute(task, &pausing).await;

    assert_eq!(paused.status, TaskStatus::Paused);
    assert_eq!(paused.steps[0].status, TaskStatus::Completed);
    assert_eq!(paused.steps[1].status, TaskStatus::Completed);
    assert_eq!(paused.steps[2].status, TaskStatus::Idle);
    assert!(rec.completes().is_empty(), "pause must not call on_complete");
    assert!(!registry.is_task_running(&task_id));
    assert!(paused.duration.is_none());

    let first_started = paused.steps[0].started_at;
    rec.clear();

    let resumed = drv.execute(paused, rec.as_ref()).await;
    assert_eq!(resumed.status, TaskStatus::Completed);
    assert_eq!(resumed.steps[0].started_at, first_started);

    let updates = rec.updates();
    assert!(updates
        .iter()
        .all(|t| t.steps[0].status == TaskStatus::Completed
            && t.steps[1].status == TaskStatus::Completed));
    let first_running = updates.iter().find_map(|t| t.running_step());
    assert_eq!(first_running, Some(2));
    assert_eq!(rec.completes().len(), 1);
    assert_progress_monotonic(&updates);
}

#[tokio::test(start_paused = true)]
async fn cancel_all_pauses_in_flight_tasks() {
    let registry = CancellationRegistry::new();
    let drv = Arc::new(driver(&registry, ScriptedRandom::constant(0.5)));
    let task = create_task("Random Task", "", &agent(), None);
    let task_id = task.id.clone();

    let handle = {
        let drv = drv.clone();
        tokio::spawn(async move { drv.execute(task, &Recorder::default()).await })
    };

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(registry.is_task_running(&task_id));
    assert_eq!(registry.cancel_all(), 1);
    assert!(!registry.is_task_running(&task_id));

    let out = handle.await.unwrap();
    assert_eq!(out.status, TaskStatus::Paused);
    assert_eq!(out.steps[0].status, TaskStatus::Idle);
}

#[tokio::test]
async fn instant_sleeper_runs_without_waiting() {
    let registry = CancellationRegistry::new();
    let out = SimulatedDriver::new(registry.clone())
        .with_sleeper(Arc::new(InstantSleeper))
        .with_random(Arc::new(ScriptedRandom::constant(0.9)))
        .execute(create_task("x", "", &agent(), None), &Recorder::default())
        .await;
    assert_eq!(out.status, TaskStatus::Completed);
    assert_eq!(out.output.as_deref().map(|s| !s.is_empty()), Some(true));
}
