use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse settings '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("No environments defined in '{path}'.")]
    NoEnvironments { path: PathBuf },
    #[error("Invalid --env '{requested}'. Use one of: {}", .valid.join(", "))]
    UnknownEnvironment {
        requested: String,
        valid: Vec<String>,
    },
    #[error("Invalid base_url '{url}' for environment '{env}': {source}")]
    InvalidBaseUrl {
        env: String,
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid setting '{field}' for environment '{env}': {reason}")]
    InvalidValue {
        env: String,
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid HTTP method '{method}'.")]
    InvalidMethod { method: String },
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("Failed to encode request body: {source}")]
    EncodeBody {
        #[source]
        source: serde_json::Error,
    },
    #[error("{method} {url} failed after {attempts} attempt(s): {source}")]
    Request {
        method: String,
        url: String,
        attempts: u32,
        #[source]
        source: reqwest_middleware::Error,
    },
    #[error("Failed to read response body from {url}: {source}")]
    ReadBody {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// An expectation mismatch raised by a check in the assertion library.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailure {
    pub message: String,
}

impl AssertionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
#[error("Response body is not valid JSON ({source}). Body: {preview}")]
pub struct ParseError {
    pub preview: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Fixture file not found: '{path}'")]
    NotFound { path: PathBuf },
    #[error("Failed to read fixture '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV fixture '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Malformed JSON fixture '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to create report directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write report file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize test result: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl HarnessError {
    /// Expectation mismatches count as test failures; everything else means
    /// the scenario could not run to completion.
    pub fn is_failure(&self) -> bool {
        matches!(self, HarnessError::Assertion(_) | HarnessError::Parse(_))
    }
}

pub type HarnessResult<T> = Result<T, HarnessError>;
