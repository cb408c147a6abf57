//! Per-scenario report: a tree of named steps with labelled attachments,
//! finished into a [`TestResult`] and handed to a [`ReportSink`].
//!
//! Attachments always land on the innermost open step, or on the result
//! itself when no step is open.

mod attach;
mod models;
mod writer;

pub use attach::attach_response;
pub use models::{Attachment, AttachmentKind, Label, Status, StepRecord, TestResult};
pub use writer::{NullSink, ReportSink, ResultsDirectory};

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AssertionFailure, HarnessError, ParseError, TransportError};

/// How a step ended when its body returned this error.
pub trait ReportStatus {
    fn report_status(&self) -> Status;
}

impl ReportStatus for AssertionFailure {
    fn report_status(&self) -> Status {
        Status::Failed
    }
}

impl ReportStatus for ParseError {
    fn report_status(&self) -> Status {
        Status::Failed
    }
}

impl ReportStatus for TransportError {
    fn report_status(&self) -> Status {
        Status::Broken
    }
}

impl ReportStatus for HarnessError {
    fn report_status(&self) -> Status {
        if self.is_failure() {
            Status::Failed
        } else {
            Status::Broken
        }
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Default)]
struct ReportState {
    labels: Vec<Label>,
    steps: Vec<StepRecord>,
    attachments: Vec<Attachment>,
    open: Vec<StepRecord>,
}

#[derive(Debug)]
pub struct Report {
    uuid: String,
    name: String,
    full_name: String,
    start: i64,
    state: Mutex<ReportState>,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            uuid: Uuid::new_v4().to_string(),
            full_name: name.clone(),
            name,
            start: now_millis(),
            state: Mutex::new(ReportState::default()),
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = full_name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> MutexGuard<'_, ReportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn label(&self, name: impl Into<String>, value: impl Into<String>) {
        self.state().labels.push(Label {
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn attach(&self, label: impl Into<String>, content: impl Into<String>, kind: AttachmentKind) {
        let attachment = Attachment {
            label: label.into(),
            content: content.into(),
            kind,
        };
        debug!(
            report = %self.name,
            label = %attachment.label,
            bytes = attachment.content.len(),
            "attachment recorded"
        );

        let mut state = self.state();
        match state.open.last_mut() {
            Some(step) => step.attachments.push(attachment),
            None => state.attachments.push(attachment),
        }
    }

    pub fn step<T, E, F>(&self, title: impl Into<String>, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: ReportStatus,
    {
        self.open_step(title.into());
        let result = body();
        self.close_step(status_of(&result));
        result
    }

    pub async fn step_async<T, E, F>(&self, title: impl Into<String>, body: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: ReportStatus,
    {
        self.open_step(title.into());
        let result = body.await;
        self.close_step(status_of(&result));
        result
    }

    fn open_step(&self, title: String) {
        debug!(report = %self.name, step = %title, "step started");
        self.state().open.push(StepRecord::started(title, now_millis()));
    }

    fn close_step(&self, status: Status) {
        let mut state = self.state();
        let Some(mut step) = state.open.pop() else {
            return;
        };
        step.status = status;
        step.stop = now_millis();
        match state.open.last_mut() {
            Some(parent) => parent.steps.push(step),
            None => state.steps.push(step),
        }
    }

    /// Closes the report. Steps still open at this point are recorded as
    /// broken.
    pub fn finish(self, status: Status, message: Option<String>) -> TestResult {
        let stop = now_millis();
        let mut state = self.state.into_inner().unwrap_or_else(PoisonError::into_inner);

        while let Some(mut step) = state.open.pop() {
            step.status = Status::Broken;
            step.stop = stop;
            match state.open.last_mut() {
                Some(parent) => parent.steps.push(step),
                None => state.steps.push(step),
            }
        }

        TestResult {
            uuid: self.uuid,
            name: self.name,
            full_name: self.full_name,
            status,
            message,
            labels: state.labels,
            start: self.start,
            stop,
            steps: state.steps,
            attachments: state.attachments,
        }
    }
}

fn status_of<T, E: ReportStatus>(result: &Result<T, E>) -> Status {
    match result {
        Ok(_) => Status::Passed,
        Err(err) => err.report_status(),
    }
}
