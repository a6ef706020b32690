use std::io::Write;
use std::sync::{Mutex, PoisonError};

use chrono::Local;
use serde_json::{json, Value};
use taskdeck_core::api::{Task, TaskObserver};

pub const EVENT_TASK_UPDATE: &str = "task.update";
pub const EVENT_TASK_COMPLETE: &str = "task.complete";

/// One JSON object per snapshot. The output doubles as the input of
/// `taskdeck stats`.
pub struct JsonlRenderer {
    pretty_print: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl JsonlRenderer {
    pub fn new(pretty_print: bool) -> Self {
        Self::with_writer(pretty_print, Box::new(std::io::stdout()))
    }

    pub fn with_writer(pretty_print: bool, sink: Box<dyn Write + Send>) -> Self {
        Self {
            pretty_print,
            sink: Mutex::new(sink),
        }
    }

    fn event_to_json(&self, event_type: &str, task: &Task) -> Value {
        json!({
            "v": 1,
            "event_type": event_type,
            "ts": Local::now().to_rfc3339(),
            "task_id": task.id,
            "progress": task.progress,
            "task": task,
        })
    }

    fn emit(&self, event_type: &str, task: &Task) {
        let value = self.event_to_json(event_type, task);
        let line = if self.pretty_print {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
        .unwrap_or_else(|_| "{}".into());

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
            tracing::warn!(target: "taskdeck.output", error = %err, "failed to write jsonl event");
        }
    }
}

impl TaskObserver for JsonlRenderer {
    fn on_update(&self, task: &Task) {
        self.emit(EVENT_TASK_UPDATE, task);
    }

    fn on_complete(&self, task: &Task) {
        self.emit(EVENT_TASK_COMPLETE, task);
    }
}
