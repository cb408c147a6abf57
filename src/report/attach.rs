use crate::client::ApiResponse;

use super::{AttachmentKind, Report};

/// Records the request line, the request headers and the response body of
/// `response` under `label`. Formatting problems degrade to plain text.
pub fn attach_response(report: &Report, response: &ApiResponse, label: &str) {
    report.attach(
        format!("{label}-request"),
        format!("{} {}", response.request.method, response.request.url),
        AttachmentKind::Text,
    );

    let headers = response
        .request
        .headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n");
    report.attach(
        format!("{label}-request-headers"),
        headers,
        AttachmentKind::Text,
    );

    let (body, kind) = format_body(response);
    report.attach(format!("{label}-response-body"), body, kind);
}

// The demo API labels its JSON payloads as text/html.
fn format_body(response: &ApiResponse) -> (String, AttachmentKind) {
    let content_type = response
        .content_type()
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.contains("application/json") || content_type.contains("text/html") {
        if let Some(pretty) = response
            .json()
            .ok()
            .and_then(|value| serde_json::to_string_pretty(&value).ok())
        {
            return (pretty, AttachmentKind::Json);
        }
    }

    (response.text(), AttachmentKind::Text)
}
