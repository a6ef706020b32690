use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::traits::TaskObserver;
use crate::task::{Task, TaskStatus};

/// Terminal progress bars: one overall bar plus one bar per task.
///
/// Usable directly as a [`TaskObserver`]; task bars are created lazily on the
/// first snapshot seen for a task id.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Mutex<HashMap<String, ProgressBar>>,
    enabled: bool,
    ascii: bool,
}

impl ProgressMonitor {
    /// `enabled = false` yields a monitor that draws nothing (e.g. JSONL output).
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        Self::build(total_tasks, enabled, false)
    }

    pub fn ascii(total_tasks: usize, enabled: bool) -> Self {
        Self::build(total_tasks, enabled, true)
    }

    fn build(total_tasks: usize, enabled: bool, ascii: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
                overall: ProgressBar::hidden(),
                task_bars: Mutex::new(HashMap::new()),
                enabled: false,
                ascii,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        let chars = if ascii { "#>-" } else { "█▓▒░  " };
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars(chars),
        );
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: Mutex::new(HashMap::new()),
            enabled: true,
            ascii,
        }
    }

    fn bars(&self) -> MutexGuard<'_, HashMap<String, ProgressBar>> {
        self.task_bars.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn task_bar(&self, bars: &mut HashMap<String, ProgressBar>, task: &Task) -> ProgressBar {
        bars.entry(task.id.clone())
            .or_insert_with(|| {
                let bar = self.multi.add(ProgressBar::new(100));
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("  {spinner:.green} {bar:20.green/white} {pos:>3}% {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars(if self.ascii { "=> " } else { "━╸ " }),
                );
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            })
            .clone()
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = match (success, self.ascii) {
            (true, true) => "[ok] All tasks finished",
            (true, false) => "✅ All tasks finished",
            (false, true) => "[x] Some tasks failed",
            (false, false) => "❌ Some tasks failed",
        };
        self.overall.finish_with_message(msg);
    }

    /// Whether the overall bar has been finished or cleared.
    pub fn is_finished(&self) -> bool {
        self.overall.is_finished()
    }

    pub fn clear(&self) {
        if self.enabled {
            self.overall.finish_and_clear();
        }
    }

    fn step_label(task: &Task) -> String {
        let total = task.steps.len();
        match task.running_step() {
            Some(i) => format!("{} [{}/{}: {}]", task.name, i + 1, total, task.steps[i].name),
            None => format!("{} [{}]", task.name, task.status),
        }
    }
}

impl TaskObserver for ProgressMonitor {
    fn on_update(&self, task: &Task) {
        if !self.enabled {
            return;
        }
        let mut bars = self.bars();
        let bar = self.task_bar(&mut bars, task);
        bar.set_position(u64::from(task.progress));
        bar.set_message(Self::step_label(task));

        if task.status == TaskStatus::Paused {
            let icon = if self.ascii { "[paused]" } else { "⏸" };
            bar.abandon_with_message(format!("{} {}", icon, task.name));
            bars.remove(&task.id);
            self.overall.inc(1);
        }
    }

    fn on_complete(&self, task: &Task) {
        if !self.enabled {
            return;
        }
        if let Some(bar) = self.bars().remove(&task.id) {
            let success = task.status == TaskStatus::Completed;
            let icon = match (success, self.ascii) {
                (true, true) => "[ok]",
                (true, false) => "✅",
                (false, true) => "[x]",
                (false, false) => "❌",
            };
            let duration = task.duration.as_deref().unwrap_or("-");
            bar.finish_with_message(format!("{} {} ({})", icon, task.name, duration));
        }
        self.overall.inc(1);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.bars().drain() {
            bar.finish_and_clear();
        }
    }
}
