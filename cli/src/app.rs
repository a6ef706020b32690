use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use taskdeck_core::api::{
    classify, create_ai_task, create_task, generate_ai_steps, generate_steps, quick_action,
    run_batch, stats, Agent, AgentType, AiTaskConfig, AiTaskRunner, AppConfig, BoardEvent,
    CancellationRegistry, CliError, ConfigError, ExecutionConfig, FanoutObserver,
    ProgressMonitor, Task, TaskBoard, TaskExecutor, TaskObserver, TaskStatus, TaskType,
    WorkflowRecord,
};
use taskdeck_plugins::factory;

use crate::commands::cli::{AiArgs, BatchArgs, RunArgs, SimulationArgs, StatsArgs, StepsArgs};
use crate::snapshots::load_latest_snapshots;
use crate::task_file::TaskFile;

/// Exit code for a single finished task: 0 completed, 1 failed, 130 paused.
pub fn exit_code_for_task(task: &Task) -> i32 {
    match task.status {
        TaskStatus::Completed => 0,
        TaskStatus::Paused => 130,
        _ => 1,
    }
}

fn exit_code_for_batch(tasks: &[Task]) -> i32 {
    if tasks.iter().any(|t| t.status == TaskStatus::Paused) {
        130
    } else if tasks.iter().all(|t| t.status == TaskStatus::Completed) {
        0
    } else {
        1
    }
}

/// Apply command-line simulation overrides on top of the configured values.
pub fn apply_simulation(
    base: &ExecutionConfig,
    overrides: &SimulationArgs,
) -> Result<ExecutionConfig, ConfigError> {
    let mut cfg = base.clone();
    if let Some(rate) = overrides.failure_rate {
        cfg.failure_rate = rate;
    }
    if let Some(min) = overrides.min_delay_ms {
        cfg.min_step_delay_ms = min;
    }
    if let Some(max) = overrides.max_delay_ms {
        cfg.max_step_delay_ms = max;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn spawn_interrupt_handler(registry: CancellationRegistry) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let paused = registry.cancel_all();
            tracing::warn!(
                target: "taskdeck.cli",
                paused,
                "interrupt received; pausing in-flight tasks"
            );
        }
    });
}

fn progress_enabled(cfg: &AppConfig, no_progress: bool) -> bool {
    cfg.output.format != "jsonl"
        && cfg.output.progress_bar
        && !no_progress
        && atty::is(atty::Stream::Stderr)
}

/// Fan-out of the progress monitor and the configured renderer. The monitor
/// is returned as well so the caller can finish its overall bar.
fn build_observer(
    cfg: &AppConfig,
    total: usize,
    no_progress: bool,
) -> (FanoutObserver, Arc<ProgressMonitor>) {
    let bars = progress_enabled(cfg, no_progress);
    let renderer: Arc<dyn TaskObserver> =
        Arc::from(factory::build_renderer(&cfg.output, bars));
    let progress = Arc::new(if cfg.output.ascii_only {
        ProgressMonitor::ascii(total, bars)
    } else {
        ProgressMonitor::new(total, bars)
    });
    let observer = FanoutObserver::new()
        .with(progress.clone())
        .with(renderer);
    (observer, progress)
}

fn finish_progress(progress: &ProgressMonitor, exit_code: i32) {
    if exit_code == 130 {
        progress.set_message("Interrupted");
    }
    progress.finish(exit_code == 0);
}

pub async fn run_single(
    args: RunArgs,
    cfg: &AppConfig,
    no_progress: bool,
) -> Result<i32, CliError> {
    let exec = apply_simulation(&cfg.execution, &args.simulation)?;
    let registry = CancellationRegistry::new();
    spawn_interrupt_handler(registry.clone());

    let driver = factory::build_simulated_driver(&exec, registry);
    let agent = Agent::new(args.agent.agent_name, AgentType::from(args.agent.agent_type));
    let task = create_task(args.name, args.description, &agent, args.input);
    tracing::info!(
        target: "taskdeck.cli",
        task_id = %task.id,
        steps = task.steps.len(),
        "running task"
    );

    let (observer, progress) = build_observer(cfg, 1, no_progress);
    let result = driver.execute(task, &observer).await;
    let code = exit_code_for_task(&result);
    finish_progress(&progress, code);
    Ok(code)
}

pub async fn run_batch_file(
    args: BatchArgs,
    cfg: &AppConfig,
    no_progress: bool,
) -> Result<i32, CliError> {
    let exec = apply_simulation(&cfg.execution, &args.simulation)?;
    let file = TaskFile::load(&args.file)?;
    let (agents, tasks) = file.build()?;
    let concurrency = exec.effective_concurrency(args.concurrency.or(file.concurrency));

    let board = TaskBoard::new();
    let mut events = board.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                BoardEvent::TaskStatusChanged {
                    task_id,
                    old_status,
                    new_status,
                    ..
                } => {
                    tracing::debug!(target: "taskdeck.cli", %task_id, %old_status, %new_status, "task status changed");
                }
                BoardEvent::AgentCountersChanged { .. } => {
                    tracing::trace!(target: "taskdeck.cli", ?event, "agent counters changed");
                }
                _ => {}
            }
        }
    });

    for agent in agents {
        board.add_agent(agent);
    }
    for task in &tasks {
        board.add_task(task.clone());
    }

    let registry = CancellationRegistry::new();
    spawn_interrupt_handler(registry.clone());
    let driver = factory::build_simulated_driver(&exec, registry);

    let (observer, progress) = build_observer(cfg, tasks.len(), no_progress);
    let observer = observer.with(Arc::new(board.clone()));
    tracing::info!(
        target: "taskdeck.cli",
        workflow = %file.name,
        tasks = tasks.len(),
        concurrency,
        "starting batch"
    );

    let started_at = Utc::now();
    let clock = Instant::now();
    let finished = run_batch(&driver, tasks, &observer, concurrency).await;
    let code = exit_code_for_batch(&finished);
    finish_progress(&progress, code);

    let record = WorkflowRecord::from_batch(
        file.name.clone(),
        file.description.clone(),
        &finished,
        started_at,
        clock.elapsed(),
    );
    print_workflow_summary(&record, &board, cfg);
    board.record_workflow(record);

    Ok(code)
}

fn print_workflow_summary(record: &WorkflowRecord, board: &TaskBoard, cfg: &AppConfig) {
    if cfg.output.format == "jsonl" {
        let value = serde_json::json!({
            "v": 1,
            "event_type": "workflow.end",
            "ts": chrono::Local::now().to_rfc3339(),
            "workflow": record,
            "agents": board.agents(),
        });
        println!("{}", value);
        return;
    }

    let s = &record.summary;
    println!(
        "WORKFLOW {} {:?} ({}, success rate {}%, duration {})",
        record.name,
        record.status,
        record.result.as_deref().unwrap_or("-"),
        s.success_rate,
        record.duration.as_deref().unwrap_or("-")
    );
    for agent in board.agents() {
        println!(
            "  agent {} ({}): completed {}, failed {}, efficiency {}%",
            agent.name,
            agent.agent_type.as_str(),
            agent.tasks_completed,
            agent.tasks_failed,
            agent.efficiency
        );
    }
}

pub fn build_ai_config(args: &AiArgs) -> AiTaskConfig {
    let task_type = TaskType::from(args.task_type);
    let mut config = AiTaskConfig::new(task_type);
    config.document_content = args.text.clone();
    config.document_path = args.file.clone();
    config.question = if task_type == TaskType::Chat {
        args.message.clone()
    } else {
        args.question.clone()
    };
    config.extraction_type = args.extraction_type.clone();
    config.report_type = args.report_type.clone();
    config.research_topic = args.topic.clone();
    config
}

pub async fn run_ai(args: AiArgs, cfg: &AppConfig, no_progress: bool) -> Result<i32, CliError> {
    let driver = Arc::new(factory::build_ai_driver(cfg)?);
    let agent = Agent::new(args.agent.agent_name.clone(), AgentType::from(args.agent.agent_type));
    let config = build_ai_config(&args);
    let task_type = config.task_type;

    let name = args.name.clone().unwrap_or_else(|| {
        quick_action(task_type)
            .map(|a| a.name.to_string())
            .unwrap_or_else(|| format!("AI {}", task_type.as_str()))
    });
    let task = create_ai_task(name, "", &agent, task_type, None);

    let runner = AiTaskRunner::new(driver, config, agent);
    let (observer, progress) = build_observer(cfg, 1, no_progress);
    let result = runner.execute(task, &observer).await;
    let code = exit_code_for_task(&result);
    finish_progress(&progress, code);

    if cfg.output.format != "jsonl" {
        if let Some(output) = &result.output {
            println!("\n{}", output);
        }
    }
    Ok(code)
}

pub fn print_steps(args: &StepsArgs) {
    let steps = match (args.ai_type, args.name.as_deref()) {
        (Some(kind), _) => generate_ai_steps(TaskType::from(kind)),
        (None, Some(name)) => {
            let category = classify(name);
            println!("category: {:?}", category);
            generate_steps(name)
        }
        (None, None) => Vec::new(),
    };
    for (idx, step) in steps.iter().enumerate() {
        println!("{}. {} [{}]", idx + 1, step.name, step.status);
    }
}

pub fn print_stats(args: &StatsArgs) -> Result<i32, CliError> {
    let tasks = load_latest_snapshots(&args.events)?;
    let summary = stats(&tasks);

    if args.json {
        let value = serde_json::to_string_pretty(&summary)
            .map_err(|e| CliError::Command(e.to_string()))?;
        println!("{}", value);
    } else {
        println!("total:        {}", summary.total);
        println!("completed:    {}", summary.completed);
        println!("failed:       {}", summary.failed);
        println!("running:      {}", summary.running);
        println!("queued:       {}", summary.queued);
        println!("paused:       {}", summary.paused);
        println!("success rate: {}%", summary.success_rate);
    }
    Ok(0)
}
