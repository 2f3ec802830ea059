use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::encode::runner::ProcessSlot;

/// Snapshot of a batch run, served to front ends. Append-only log lines,
/// monotonic progress counters.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub run_id: String,
    pub is_running: bool,
    pub current_task: Option<String>,
    pub completed_count: usize,
    pub total_count: usize,
    pub logs: Vec<String>,
    pub is_done: bool,
    pub last_error: Option<String>,
    pub stop_requested: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            is_running: false,
            current_task: None,
            completed_count: 0,
            total_count: 0,
            logs: Vec::new(),
            is_done: false,
            last_error: None,
            stop_requested: false,
            started_at: None,
            finished_at: None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Failed(String),
}

/// Shared mutable run state: the snapshot behind a mutex, the stop flag, and
/// the slot holding the in-flight ffmpeg child.
pub struct JobTracker {
    state: Mutex<JobState>,
    stop_flag: AtomicBool,
    process: ProcessSlot,
}

impl JobTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JobState::default()),
            stop_flag: AtomicBool::new(false),
            process: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        // A poisoned lock just means a holder panicked; the state is still
        // usable for reporting.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begin a fresh run: new run id, cleared logs and counters, stop flag
    /// lowered.
    pub fn reset(&self, total: usize) {
        self.stop_flag.store(false, Ordering::SeqCst);
        let mut state = self.lock();
        *state = JobState {
            run_id: Uuid::new_v4().to_string(),
            is_running: true,
            total_count: total,
            started_at: Some(Utc::now()),
            ..JobState::default()
        };
    }

    pub fn log(&self, line: impl Into<String>) {
        self.lock().logs.push(line.into());
    }

    pub fn set_current(&self, task: Option<String>) {
        self.lock().current_task = task;
    }

    /// Bump the completed counter, never past the total.
    pub fn advance(&self) {
        let mut state = self.lock();
        if state.completed_count < state.total_count {
            state.completed_count += 1;
        }
    }

    pub fn progress(&self) -> (usize, usize) {
        let state = self.lock();
        (state.completed_count, state.total_count)
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_running
    }

    pub fn request_stop(&self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        self.lock().stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::SeqCst)
    }

    /// Record an error without a run having started.
    pub fn record_error(&self, message: impl Into<String>) {
        self.lock().last_error = Some(message.into());
    }

    /// Mark the run terminal. Running is always cleared, whatever the
    /// outcome.
    pub fn finish(&self, outcome: RunOutcome) {
        let mut state = self.lock();
        state.is_running = false;
        state.current_task = None;
        state.finished_at = Some(Utc::now());
        match outcome {
            RunOutcome::Completed => {
                state.is_done = true;
            }
            RunOutcome::Stopped => {
                state.last_error = Some("Processing stopped by user".to_string());
            }
            RunOutcome::Failed(message) => {
                state.last_error = Some(message);
            }
        }
    }

    pub fn snapshot(&self) -> JobState {
        let mut snapshot = self.lock().clone();
        snapshot.stop_requested = self.stop_requested();
        snapshot
    }

    pub fn process_slot(&self) -> &ProcessSlot {
        &self.process
    }
}

impl Default for JobTracker {
    fn default() -> Self {
        Self::new()
    }
}
