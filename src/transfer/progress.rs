//! Progress tracking for one transfer attempt.
//!
//! This module provides the `ProgressTracker`, which folds normalized bridge
//! events into a current-step pointer and an ordered, timestamped log of
//! human-readable messages. The log is purely observational: nothing reads
//! it to make control-flow decisions. It is append-only for the duration of
//! one attempt and cleared on reset.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::transfer::events::{NormalizedEvent, StepState, TransferStep};

/// One timestamped line of the transfer log.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

/// Tracks the current step and log for a single transfer attempt.
///
/// The tracker records which (step, state) observations it has seen so that
/// repeated identical events append nothing: replaying the same event
/// sequence after a reset reproduces the same log.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    /// The step the transfer is currently in, or `None` before start.
    current: Option<TransferStep>,
    /// Last recorded state per step, for duplicate suppression.
    observed: HashMap<TransferStep, StepState>,
    /// Ordered log of everything that happened this attempt.
    logs: Vec<LogEntry>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the log and step pointer. Called exactly once per new attempt,
    /// before any event is processed.
    pub fn reset(&mut self) {
        self.current = None;
        self.observed.clear();
        self.logs.clear();
    }

    /// The step the transfer is currently in.
    pub fn current_step(&self) -> Option<TransferStep> {
        self.current
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Append a literal message, for milestones not tied to a protocol event.
    pub fn add_log(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.logs.push(LogEntry {
            at: Utc::now(),
            message,
        });
    }

    /// Move the step pointer without logging a transition. Used by the
    /// orchestrator for the initial step and the terminal pseudo-steps.
    pub fn set_step(&mut self, step: TransferStep) {
        self.current = Some(step);
    }

    /// Record a normalized event, appending a log line when it changes the
    /// tracked state. Returns whether anything was recorded. Idempotent for
    /// repeated identical events.
    pub fn handle_event(&mut self, event: &NormalizedEvent) -> bool {
        let repeat = self.observed.get(&event.step) == Some(&event.state)
            && self.current == Some(event.step);
        if repeat {
            return false;
        }

        self.observed.insert(event.step, event.state);
        self.current = Some(event.step);
        self.add_log(transition_message(event));
        true
    }
}

fn transition_message(event: &NormalizedEvent) -> String {
    match (&event.state, &event.detail) {
        (StepState::Error, Some(detail)) => {
            format!("{} step failed: {}", event.step.label(), detail)
        }
        _ => format!("{} step is now {}", event.step.label(), event.state.as_str()),
    }
}
