use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::types::{BoardEvent, WorkflowRecord};
use crate::executor::{stats, success_rate, TaskObserver, TaskStats};
use crate::task::{Agent, AgentStatus, Task, TaskStatus};

/// In-memory application state: agents, latest task snapshots and batch
/// history.
///
/// Feeding snapshots through [`TaskBoard::apply_snapshot`] (or using the
/// board as a [`TaskObserver`]) keeps each agent's counters in line with its
/// tasks' status transitions.
#[derive(Clone)]
pub struct TaskBoard {
    inner: Arc<BoardInner>,
}

struct BoardInner {
    state: RwLock<BoardState>,
    event_tx: broadcast::Sender<BoardEvent>,
}

#[derive(Default)]
struct BoardState {
    agents: HashMap<String, Agent>,
    tasks: HashMap<String, Task>,
    /// Insertion order of `tasks`.
    order: Vec<String>,
    workflows: Vec<WorkflowRecord>,
}

impl TaskBoard {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1000);
        Self {
            inner: Arc::new(BoardInner {
                state: RwLock::new(BoardState::default()),
                event_tx,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BoardEvent> {
        self.inner.event_tx.subscribe()
    }

    fn emit(&self, event: BoardEvent) {
        let _ = self.inner.event_tx.send(event);
    }

    fn read(&self) -> RwLockReadGuard<'_, BoardState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BoardState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_agent(&self, agent: Agent) -> String {
        let agent_id = agent.id.clone();
        self.write().agents.insert(agent_id.clone(), agent);
        self.emit(BoardEvent::AgentAdded {
            agent_id: agent_id.clone(),
            timestamp: Utc::now(),
        });
        agent_id
    }

    pub fn remove_agent(&self, agent_id: &str) -> Option<Agent> {
        let removed = self.write().agents.remove(agent_id);
        if removed.is_some() {
            self.emit(BoardEvent::AgentRemoved {
                agent_id: agent_id.to_string(),
                timestamp: Utc::now(),
            });
        }
        removed
    }

    pub fn agent(&self, agent_id: &str) -> Option<Agent> {
        self.read().agents.get(agent_id).cloned()
    }

    pub fn find_agent_by_name(&self, name: &str) -> Option<Agent> {
        self.read()
            .agents
            .values()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    /// All agents, oldest first.
    pub fn agents(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self.read().agents.values().cloned().collect();
        agents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        agents
    }

    /// Insert or replace the stored snapshot for `task.id`.
    pub fn apply_snapshot(&self, task: &Task) {
        let now = Utc::now();
        let mut events = Vec::new();

        {
            let mut state = self.write();
            let previous = state
                .tasks
                .get(&task.id)
                .map(|t| (t.status, t.progress));

            match previous {
                None => {
                    state.order.push(task.id.clone());
                    events.push(BoardEvent::TaskAdded {
                        task_id: task.id.clone(),
                        agent_id: task.agent_id.clone(),
                        timestamp: now,
                    });
                }
                Some((old_status, _)) if old_status != task.status => {
                    events.push(BoardEvent::TaskStatusChanged {
                        task_id: task.id.clone(),
                        old_status,
                        new_status: task.status,
                        timestamp: now,
                    });
                }
                Some((_, old_progress)) if old_progress != task.progress => {
                    events.push(BoardEvent::TaskProgress {
                        task_id: task.id.clone(),
                        progress: task.progress,
                        timestamp: now,
                    });
                }
                Some(_) => {}
            }

            let old_status = previous.map(|(s, _)| s);
            if let Some(agent) = state.agents.get_mut(&task.agent_id) {
                if reconcile_agent(agent, old_status, task.status, now) {
                    events.push(counters_event(agent, now));
                }
            }

            state.tasks.insert(task.id.clone(), task.clone());
        }

        for event in events {
            self.emit(event);
        }
    }

    pub fn add_task(&self, task: Task) {
        self.apply_snapshot(&task);
    }

    pub fn task(&self, task_id: &str) -> Option<Task> {
        self.read().tasks.get(task_id).cloned()
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        let state = self.read();
        state
            .order
            .iter()
            .filter_map(|id| state.tasks.get(id).cloned())
            .collect()
    }

    pub fn tasks_for_agent(&self, agent_id: &str) -> Vec<Task> {
        self.tasks()
            .into_iter()
            .filter(|t| t.agent_id == agent_id)
            .collect()
    }

    pub fn remove_task(&self, task_id: &str) -> Option<Task> {
        let removed = {
            let mut state = self.write();
            let removed = state.tasks.remove(task_id);
            if removed.is_some() {
                state.order.retain(|id| id != task_id);
            }
            removed
        };
        if removed.is_some() {
            self.emit(BoardEvent::TaskRemoved {
                task_id: task_id.to_string(),
                timestamp: Utc::now(),
            });
        }
        removed
    }

    pub fn stats(&self) -> TaskStats {
        let state = self.read();
        stats(state.tasks.values())
    }

    pub fn record_workflow(&self, record: WorkflowRecord) {
        let event = BoardEvent::WorkflowRecorded {
            workflow_id: record.id.clone(),
            status: record.status,
            timestamp: Utc::now(),
        };
        self.write().workflows.push(record);
        self.emit(event);
    }

    /// Batch history, oldest first.
    pub fn workflows(&self) -> Vec<WorkflowRecord> {
        self.read().workflows.clone()
    }

    /// Drop finished tasks, keeping the `keep_recent` most recently finished.
    pub fn cleanup_finished_tasks(&self, keep_recent: usize) -> usize {
        let removed: Vec<String> = {
            let mut state = self.write();
            let mut finished: Vec<(String, DateTime<Utc>)> = state
                .tasks
                .values()
                .filter(|t| t.status.is_terminal())
                .map(|t| (t.id.clone(), t.completed_at.unwrap_or(t.created_at)))
                .collect();
            finished.sort_by(|a, b| b.1.cmp(&a.1));

            let to_remove: Vec<String> = finished
                .into_iter()
                .skip(keep_recent)
                .map(|(id, _)| id)
                .collect();
            for id in &to_remove {
                state.tasks.remove(id);
            }
            state.order.retain(|id| !to_remove.contains(id));
            to_remove
        };

        let now = Utc::now();
        for task_id in &removed {
            self.emit(BoardEvent::TaskRemoved {
                task_id: task_id.clone(),
                timestamp: now,
            });
        }
        removed.len()
    }
}

impl Default for TaskBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskObserver for TaskBoard {
    fn on_update(&self, task: &Task) {
        self.apply_snapshot(task);
    }
}

/// Update agent counters for one task status transition. Returns whether
/// anything changed.
fn reconcile_agent(
    agent: &mut Agent,
    old: Option<TaskStatus>,
    new: TaskStatus,
    now: DateTime<Utc>,
) -> bool {
    let was_running = old == Some(TaskStatus::Running);
    let is_running = new == TaskStatus::Running;

    match (was_running, is_running) {
        (false, true) => {
            agent.tasks_running += 1;
        }
        (true, false) => {
            agent.tasks_running = agent.tasks_running.saturating_sub(1);
            match new {
                TaskStatus::Completed => agent.tasks_completed += 1,
                TaskStatus::Failed => agent.tasks_failed += 1,
                _ => {}
            }
            agent.efficiency = agent_efficiency(agent);
        }
        _ => return false,
    }

    agent.status = if agent.tasks_running > 0 {
        AgentStatus::Busy
    } else {
        AgentStatus::Idle
    };
    agent.last_active_at = now;
    true
}

fn agent_efficiency(agent: &Agent) -> u32 {
    if agent.tasks_completed + agent.tasks_failed == 0 {
        100
    } else {
        success_rate(
            agent.tasks_completed as usize,
            agent.tasks_failed as usize,
        )
    }
}

fn counters_event(agent: &Agent, now: DateTime<Utc>) -> BoardEvent {
    BoardEvent::AgentCountersChanged {
        agent_id: agent.id.clone(),
        tasks_running: agent.tasks_running,
        tasks_completed: agent.tasks_completed,
        tasks_failed: agent.tasks_failed,
        efficiency: agent.efficiency,
        timestamp: now,
    }
}
