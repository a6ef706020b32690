use taskdeck_core::api::{Task, TaskObserver, TaskStatus};

/// Line-oriented human output, one line per snapshot.
pub struct TextRenderer {
    ascii_only: bool,
    show_updates: bool,
}

impl TextRenderer {
    pub fn new(ascii_only: bool) -> Self {
        Self {
            ascii_only,
            show_updates: true,
        }
    }

    /// Print only the final line of each task (progress bars cover the rest).
    pub fn completions_only(mut self) -> Self {
        self.show_updates = false;
        self
    }

    fn format_update(&self, task: &Task) -> String {
        let total = task.steps.len();
        match task.status {
            TaskStatus::Paused => format!(
                "TASK PAUSED {} (task {}, {}%)",
                task.name, task.id, task.progress
            ),
            _ => match task.running_step() {
                Some(idx) => format!(
                    "STEP {}/{} {} (task {}, {}%)",
                    idx + 1,
                    total,
                    task.steps[idx].name,
                    task.id,
                    task.progress
                ),
                None => format!(
                    "TASK {} {} (task {}, {}%)",
                    task.status.as_str().to_uppercase(),
                    task.name,
                    task.id,
                    task.progress
                ),
            },
        }
    }

    fn format_complete(&self, task: &Task) -> String {
        let status = match (task.status == TaskStatus::Completed, self.ascii_only) {
            (true, true) => "OK",
            (true, false) => "✓ SUCCESS",
            (false, true) => "FAIL",
            (false, false) => "✗ FAILED",
        };
        let mut line = format!(
            "TASK END {} (task {}, status {}, steps {}/{}, duration {})",
            task.name,
            task.id,
            status,
            task.completed_step_count(),
            task.steps.len(),
            task.duration.as_deref().unwrap_or("-")
        );
        if let Some(err) = &task.error {
            line.push_str(&format!("\n  error: {}", err));
        }
        if let Some(out) = &task.output {
            line.push_str(&format!("\n  output: {}", out));
        }
        line
    }
}

impl TaskObserver for TextRenderer {
    fn on_update(&self, task: &Task) {
        if self.show_updates {
            println!("{}", self.format_update(task));
        }
    }

    fn on_complete(&self, task: &Task) {
        println!("{}", self.format_complete(task));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::api::{create_task, Agent, AgentType};

    fn task() -> Task {
        let agent = Agent::new("Ledger", AgentType::Accountant);
        create_task("Analyze invoices", "", &agent, None)
    }

    #[test]
    fn test_update_names_running_step() {
        let renderer = TextRenderer::new(true);
        let mut t = task();
        t.status = TaskStatus::Running;
        t.set_step_status(0, TaskStatus::Running).unwrap();
        t.progress = 0;
        let line = renderer.format_update(&t);
        assert_eq!(line, format!("STEP 1/5 Parsing input data (task {}, 0%)", t.id));
    }

    #[test]
    fn test_complete_ascii_failure_includes_error() {
        let renderer = TextRenderer::new(true);
        let mut t = task();
        t.status = TaskStatus::Failed;
        t.error = Some("Step \"Running analysis\" failed".to_string());
        let line = renderer.format_complete(&t);
        assert!(line.starts_with("TASK END Analyze invoices"));
        assert!(line.contains("status FAIL,"));
        assert!(line.contains("duration -"));
        assert!(line.contains("error: Step"));
    }
}
