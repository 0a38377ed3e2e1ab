//! Progress reporting for batch runs.
//!
//! The driver emits fire-and-forget notifications; nothing it does depends on
//! what a sink does with them.

use std::sync::{Arc, Mutex};

use tracing::{error, info};

pub trait ProgressSink: Send {
    /// `index` is zero-based; `total` counts every candidate of the run.
    fn report_progress(&mut self, index: usize, total: usize);
    fn report_done(&mut self, summary: &str);
    fn report_error(&mut self, message: &str);
}

/// Logs every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report_progress(&mut self, index: usize, total: usize) {
        info!(index, total, "Processing {}/{}", index, total);
    }

    fn report_done(&mut self, summary: &str) { info!("{}", summary); }

    fn report_error(&mut self, message: &str) { error!("{}", message); }
}

/// A notification as recorded by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Progress { index: usize, total: usize },
    Done(String),
    Error(String),
}

/// Keeps every notification; clones share one log.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() { events.push(event); }
    }
}

impl ProgressSink for RecordingProgress {
    fn report_progress(&mut self, index: usize, total: usize) { self.push(ProgressEvent::Progress { index, total }); }
    fn report_done(&mut self, summary: &str) { self.push(ProgressEvent::Done(summary.to_string())); }
    fn report_error(&mut self, message: &str) { self.push(ProgressEvent::Error(message.to_string())); }
}
