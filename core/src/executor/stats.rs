use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskStatus};

/// Counts by status plus the success percentage over finished tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub running: usize,
    pub queued: usize,
    pub paused: usize,
    pub success_rate: u32,
}

pub fn stats<'a, I>(tasks: I) -> TaskStats
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut out = TaskStats::default();
    for task in tasks {
        out.total += 1;
        match task.status {
            TaskStatus::Completed => out.completed += 1,
            TaskStatus::Failed => out.failed += 1,
            TaskStatus::Running => out.running += 1,
            TaskStatus::Queued => out.queued += 1,
            TaskStatus::Paused => out.paused += 1,
            TaskStatus::Idle => {}
        }
    }
    out.success_rate = success_rate(out.completed, out.failed);
    out
}

/// `round(completed / (completed + failed) * 100)`, with an empty denominator
/// treated as 1 so nothing finished reports 0.
pub fn success_rate(completed: usize, failed: usize) -> u32 {
    let finished = match completed + failed {
        0 => 1,
        n => n,
    };
    ((completed as f64 / finished as f64) * 100.0).round() as u32
}

/// `"Xh Ym"`, `"Xm Ys"` or `"Xs"`; sub-second remainders are dropped.
pub fn format_duration(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
