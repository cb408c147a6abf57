use std::time::Duration;

use reqwest::header::HeaderMap;
use serde_json::Value;

use crate::error::ParseError;

/// Header list that keeps wire order and looks names up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        Self(
            map.iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct RequestSummary {
    pub method: String,
    pub url: String,
    pub headers: Headers,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub request: RequestSummary,
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub elapsed: Duration,
}

impl ApiResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type")
    }

    pub fn json(&self) -> Result<Value, ParseError> {
        serde_json::from_slice(&self.body).map_err(|source| ParseError {
            preview: self.preview(300),
            source,
        })
    }

    /// The first `limit` characters of the body, or hex for binary payloads.
    pub fn preview(&self, limit: usize) -> String {
        create_preview(&self.body, limit)
    }
}

fn create_preview(bytes: &[u8], limit: usize) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => truncate_chars(text, limit),
        Err(_) => {
            let slice = if bytes.len() > limit {
                &bytes[..limit]
            } else {
                bytes
            };
            hex::encode(slice)
        }
    }
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
