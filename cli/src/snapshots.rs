//! Reading task snapshots back from a JSONL event stream.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde_json::Value;
use taskdeck_core::api::Task;

/// Latest snapshot of every task in the stream, in first-seen order.
///
/// Lines that are not JSON objects with a `task` field are skipped.
pub fn latest_snapshots<R: BufRead>(reader: R) -> std::io::Result<Vec<Task>> {
    let mut order: Vec<String> = Vec::new();
    let mut latest: HashMap<String, Task> = HashMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let task = serde_json::from_str::<Value>(trimmed)
            .ok()
            .and_then(|mut v| v.get_mut("task").map(Value::take))
            .and_then(|t| serde_json::from_value::<Task>(t).ok());
        let Some(task) = task else {
            tracing::debug!(target: "taskdeck.stats", line = idx + 1, "skipping non-task line");
            continue;
        };
        if !latest.contains_key(&task.id) {
            order.push(task.id.clone());
        }
        latest.insert(task.id.clone(), task);
    }

    Ok(order
        .into_iter()
        .filter_map(|id| latest.remove(&id))
        .collect())
}

pub fn load_latest_snapshots(path: &Path) -> std::io::Result<Vec<Task>> {
    let file = std::fs::File::open(path)?;
    latest_snapshots(std::io::BufReader::new(file))
}
