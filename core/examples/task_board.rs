//! Drive a few simulated tasks through the task board and watch its events.
//!
//! Run with `cargo run -p taskdeck-core --example task_board`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use taskdeck_core::api::{
    create_task, run_batch, Agent, AgentType, BoardEvent, CancellationRegistry, FanoutObserver,
    SimulatedDriver, SimulationPolicy, TaskBoard,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let board = TaskBoard::new();
    let mut events = board.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                BoardEvent::TaskStatusChanged {
                    task_id,
                    old_status,
                    new_status,
                    ..
                } => println!("task {task_id}: {old_status} -> {new_status}"),
                BoardEvent::AgentCountersChanged {
                    agent_id,
                    tasks_running,
                    efficiency,
                    ..
                } => println!("agent {agent_id}: running {tasks_running}, efficiency {efficiency}%"),
                _ => {}
            }
        }
    });

    let ledger = Agent::new("Ledger", AgentType::Accountant);
    let scout = Agent::new("Scout", AgentType::Researcher);
    let tasks = vec![
        create_task("Analyze vendor invoices", "", &ledger, None),
        create_task("Research new suppliers", "", &scout, None),
        create_task("Process expense reports", "", &ledger, None),
    ];
    board.add_agent(ledger);
    board.add_agent(scout);
    for task in &tasks {
        board.add_task(task.clone());
    }

    let registry = CancellationRegistry::new();
    let driver = SimulatedDriver::new(registry.clone()).with_policy(SimulationPolicy {
        min_step_delay: Duration::from_millis(50),
        max_step_delay: Duration::from_millis(150),
        failure_rate: 0.1,
    });

    // Pause whatever is still running after half a second.
    let pause_target = tasks[2].id.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        if registry.pause_task(&pause_target) {
            println!("paused {pause_target}");
        }
    });

    let observer = FanoutObserver::new().with(Arc::new(board.clone()));
    let finished = run_batch(&driver, tasks, &observer, 2).await;

    for task in &finished {
        println!(
            "{:<28} {:<9} {:>3}% {}",
            task.name,
            task.status.as_str(),
            task.progress,
            task.duration.as_deref().unwrap_or("-")
        );
    }
    println!("{:?}", board.stats());
    Ok(())
}
