use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{config::EnvironmentConfig, error::ReportError};

use super::models::{Attachment, Label, Status, StepRecord, TestResult};

/// Write-only destination for finished results.
pub trait ReportSink {
    fn publish(&self, result: &TestResult) -> Result<(), ReportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ReportSink for NullSink {
    fn publish(&self, _result: &TestResult) -> Result<(), ReportError> {
        Ok(())
    }
}

/// Allure results directory: one `<uuid>-result.json` per scenario plus one
/// file per attachment.
#[derive(Debug, Clone)]
pub struct ResultsDirectory {
    dir: PathBuf,
}

impl ResultsDirectory {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ReportError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write_environment(&self, env: &EnvironmentConfig) -> Result<PathBuf, ReportError> {
        let contents = format!(
            "env={}\nbase_url={}\ntimeout_secs={}\nretries={}\nretry_backoff_secs={}\n",
            env.name,
            env.base_url,
            env.timeout.as_secs_f64(),
            env.retries,
            env.retry_backoff.as_secs_f64(),
        );
        let path = self.dir.join("environment.properties");
        write_file(&path, contents.as_bytes())?;
        Ok(path)
    }

    fn write_attachments(
        &self,
        attachments: &[Attachment],
    ) -> Result<Vec<AllureAttachment>, ReportError> {
        attachments
            .iter()
            .map(|attachment| {
                let source = format!("{}-attachment{}", Uuid::new_v4(), attachment.kind.extension());
                write_file(&self.dir.join(&source), attachment.content.as_bytes())?;
                Ok(AllureAttachment {
                    name: attachment.label.clone(),
                    source,
                    mime: attachment.kind.mime(),
                })
            })
            .collect()
    }

    fn convert_step(&self, step: &StepRecord) -> Result<AllureStep, ReportError> {
        Ok(AllureStep {
            name: step.title.clone(),
            status: step.status,
            stage: "finished",
            start: step.start,
            stop: step.stop,
            attachments: self.write_attachments(&step.attachments)?,
            steps: step
                .steps
                .iter()
                .map(|child| self.convert_step(child))
                .collect::<Result<_, _>>()?,
        })
    }
}

impl ReportSink for ResultsDirectory {
    fn publish(&self, result: &TestResult) -> Result<(), ReportError> {
        let document = AllureResult {
            uuid: &result.uuid,
            history_id: &result.full_name,
            name: &result.name,
            full_name: &result.full_name,
            status: result.status,
            status_details: result.message.as_deref().map(|message| StatusDetails { message }),
            stage: "finished",
            start: result.start,
            stop: result.stop,
            labels: &result.labels,
            steps: result
                .steps
                .iter()
                .map(|step| self.convert_step(step))
                .collect::<Result<_, _>>()?,
            attachments: self.write_attachments(&result.attachments)?,
        };

        let json = serde_json::to_vec_pretty(&document)
            .map_err(|source| ReportError::Serialize { source })?;
        let path = self.dir.join(format!("{}-result.json", result.uuid));
        write_file(&path, &json)?;
        debug!(path = %path.display(), status = result.status.as_str(), "result written");
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    fs::write(path, bytes).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllureResult<'a> {
    uuid: &'a str,
    history_id: &'a str,
    name: &'a str,
    full_name: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_details: Option<StatusDetails<'a>>,
    stage: &'static str,
    start: i64,
    stop: i64,
    labels: &'a [Label],
    steps: Vec<AllureStep>,
    attachments: Vec<AllureAttachment>,
}

#[derive(Serialize)]
struct StatusDetails<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct AllureStep {
    name: String,
    status: Status,
    stage: &'static str,
    start: i64,
    stop: i64,
    attachments: Vec<AllureAttachment>,
    steps: Vec<AllureStep>,
}

#[derive(Serialize)]
struct AllureAttachment {
    name: String,
    source: String,
    #[serde(rename = "type")]
    mime: &'static str,
}
