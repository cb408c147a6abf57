mod response;
mod retry;

pub use response::{ApiResponse, Headers, RequestSummary};
pub use retry::{RetryPolicy, TransportOnly, MAX_BACKOFF};

#[cfg(test)]
pub(crate) use response::test_support;
pub(crate) use response::truncate_chars;

use std::time::{Duration, Instant};

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::Value;
use tracing::{debug, info};
use url::form_urlencoded;

use crate::{config::EnvironmentConfig, error::TransportError};

pub const DEFAULT_ACCEPT: &str = "application/json, */*;q=0.5";
pub const DEFAULT_USER_AGENT: &str = "AE-API-Automation/1.0";

/// Joins a relative API path onto a base URL with exactly one slash between
/// them.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub json: Option<Value>,
    pub form: Option<Vec<(String, String)>>,
    pub body: Option<String>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, value: Value) -> Self {
        self.json = Some(value);
        self
    }

    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.form = Some(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn body(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// HTTP client bound to one environment. Build it once per run and share it
/// by reference; it holds no mutable state after construction.
#[derive(Clone)]
pub struct ApiClient {
    inner: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(env: &EnvironmentConfig) -> Result<Self, TransportError> {
        Self::with_policy(env, RetryPolicy::from_environment(env))
    }

    pub fn with_policy(env: &EnvironmentConfig, retry: RetryPolicy) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(env.timeout)
            .build()
            .map_err(|source| TransportError::BuildClient { source })?;

        let inner = ClientBuilder::new(http).with(retry.middleware()).build();

        let mut default_headers = vec![
            ("Accept".to_string(), DEFAULT_ACCEPT.to_string()),
            ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
        ];
        merge_headers(&mut default_headers, &env.headers);

        debug!(
            base_url = %env.base_url,
            timeout_ms = env.timeout.as_millis() as u64,
            attempts = retry.max_attempts,
            "api client ready"
        );

        Ok(Self {
            inner,
            base_url: env.base_url.trim_end_matches('/').to_string(),
            timeout: env.timeout,
            default_headers,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, TransportError> {
        self.request("GET", path, options).await
    }

    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, TransportError> {
        self.request("POST", path, options).await
    }

    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, TransportError> {
        self.request("PUT", path, options).await
    }

    pub async fn delete(&self, path: &str, options: RequestOptions) -> Result<ApiResponse, TransportError> {
        self.request("DELETE", path, options).await
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, TransportError> {
        let method_name = method.trim().to_ascii_uppercase();
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| {
            TransportError::InvalidMethod {
                method: method.to_string(),
            }
        })?;

        let url = with_query(self.url(path), &options.query);

        let mut headers = self.default_headers.clone();
        merge_headers(&mut headers, &options.headers);
        let (body, content_type) = encode_body(&options)?;
        if let Some(content_type) = content_type {
            if !headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("content-type"))
            {
                headers.push(("Content-Type".to_string(), content_type.to_string()));
            }
        }

        let mut request_builder = self
            .inner
            .request(method.clone(), &url)
            .headers(header_map(&headers)?);
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        debug!(method = %method, url = %url, "sending request");
        let start = Instant::now();
        let response = request_builder
            .send()
            .await
            .map_err(|source| TransportError::Request {
                method: method.to_string(),
                url: url.clone(),
                attempts: self.retry.attempts_for(&source),
                source,
            })?;

        let status = response.status().as_u16();
        let response_headers = Headers::from(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|source| TransportError::ReadBody {
                url: url.clone(),
                source,
            })?
            .to_vec();
        let elapsed = start.elapsed();

        info!(
            method = %method,
            url = %url,
            status,
            elapsed_ms = elapsed.as_millis() as u64,
            "response received"
        );

        Ok(ApiResponse {
            request: RequestSummary {
                method: method.to_string(),
                url,
                headers: Headers::new(headers),
            },
            status,
            headers: response_headers,
            body,
            elapsed,
        })
    }
}

/// Later entries replace earlier ones with the same (case-insensitive) name.
fn merge_headers(target: &mut Vec<(String, String)>, extra: &[(String, String)]) {
    for (name, value) in extra {
        target.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        target.push((name.clone(), value.clone()));
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap, TransportError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|err| TransportError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|err| TransportError::InvalidHeader {
                name: name.clone(),
                reason: err.to_string(),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}

fn encode_body(
    options: &RequestOptions,
) -> Result<(Option<Vec<u8>>, Option<&'static str>), TransportError> {
    if let Some(value) = &options.json {
        let bytes =
            serde_json::to_vec(value).map_err(|source| TransportError::EncodeBody { source })?;
        return Ok((Some(bytes), Some("application/json")));
    }
    if let Some(pairs) = &options.form {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        return Ok((
            Some(encoded.into_bytes()),
            Some("application/x-www-form-urlencoded"),
        ));
    }
    Ok((options.body.clone().map(String::into_bytes), None))
}

fn with_query(url: String, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url;
    }
    let encoded = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(query)
        .finish();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{encoded}")
}
