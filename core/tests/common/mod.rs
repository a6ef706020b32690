#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskdeck_core::api::{
    Agent, AgentType, ContentGenerator, ExtractError, GenerationError, GenerationRequest,
    ProcessedDocument, Sleeper, Task, TaskObserver, TaskStatus, TextExtractor,
};

pub fn agent() -> Agent {
    Agent::new("Ledger", AgentType::Accountant)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Update(Task),
    Complete(Task),
}

/// Records every callback in order.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<Task> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Update(t) => Some(t),
                Event::Complete(_) => None,
            })
            .collect()
    }

    pub fn updates_for(&self, task_id: &str) -> Vec<Task> {
        self.updates()
            .into_iter()
            .filter(|t| t.id == task_id)
            .collect()
    }

    pub fn completes(&self) -> Vec<Task> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Complete(t) => Some(t),
                Event::Update(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl TaskObserver for Recorder {
    fn on_update(&self, task: &Task) {
        self.events.lock().unwrap().push(Event::Update(task.clone()));
    }

    fn on_complete(&self, task: &Task) {
        self.events.lock().unwrap().push(Event::Complete(task.clone()));
    }
}

/// Sleeps on the tokio clock and tracks how many sleeps overlap.
#[derive(Default)]
pub struct CountingSleeper {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl CountingSleeper {
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sleeper for CountingSleeper {
    async fn sleep(&self, duration: Duration) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(duration).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Generator returning a canned result and remembering requests.
pub struct FakeGenerator {
    result: Result<String, GenerationError>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl FakeGenerator {
    pub fn ok(output: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(output.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn err(error: GenerationError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ContentGenerator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        tokio::task::yield_now().await;
        self.result.clone()
    }
}

/// Extractor serving fixed text for any path.
pub struct FakeExtractor {
    pub content: String,
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, path: &Path) -> Result<ProcessedDocument, ExtractError> {
        if path.as_os_str().is_empty() {
            return Err(ExtractError::NotFound("empty path".into()));
        }
        Ok(ProcessedDocument {
            word_count: self.content.split_whitespace().count(),
            content: self.content.clone(),
            ..ProcessedDocument::default()
        })
    }
}

pub fn assert_progress_monotonic(updates: &[Task]) {
    for pair in updates.windows(2) {
        assert!(
            pair[1].progress >= pair[0].progress,
            "progress went from {} to {}",
            pair[0].progress,
            pair[1].progress
        );
    }
}

pub fn assert_single_running_step(updates: &[Task]) {
    for t in updates {
        assert!(
            t.running_step_count() <= 1,
            "{} running steps in one snapshot",
            t.running_step_count()
        );
    }
}

pub fn assert_no_updates_after_terminal(updates: &[Task]) {
    if let Some(pos) = updates.iter().position(|t| t.status.is_terminal()) {
        assert_eq!(pos, updates.len() - 1, "updates emitted after terminal state");
    }
}

pub fn status_sequence(updates: &[Task]) -> Vec<TaskStatus> {
    let mut out: Vec<TaskStatus> = Vec::new();
    for t in updates {
        if out.last() != Some(&t.status) {
            out.push(t.status);
        }
    }
    out
}
