//! Response checks. Each one opens its own report step, records what it
//! looked at, and returns a typed failure instead of panicking.

mod schema;

pub use schema::assert_schema;

use serde_json::Value;

use crate::{
    client::{truncate_chars, ApiResponse},
    error::{AssertionFailure, ParseError},
    report::{AttachmentKind, Report},
};

const BODY_PREVIEW_CHARS: usize = 300;
const JSON_PREVIEW_CHARS: usize = 500;

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AssertionFailure> {
    if condition {
        Ok(())
    } else {
        Err(AssertionFailure::new(message))
    }
}

pub fn assert_status(
    report: &Report,
    response: &ApiResponse,
    expected: u16,
) -> Result<(), AssertionFailure> {
    report.step(format!("Assert status code == {expected}"), || {
        let actual = response.status;
        if actual == expected {
            return Ok(());
        }
        report.attach("failure-response-body", response.text(), AttachmentKind::Text);
        Err(AssertionFailure::new(format!(
            "Expected status {expected}, but got {actual}. Body: {}",
            response.preview(BODY_PREVIEW_CHARS)
        )))
    })
}

pub fn assert_header(
    report: &Report,
    response: &ApiResponse,
    name: &str,
    expected_contains: Option<&str>,
) -> Result<(), AssertionFailure> {
    let value = report.step(format!("Assert header '{name}' exists"), || {
        response
            .headers
            .get(name)
            .ok_or_else(|| AssertionFailure::new(format!("Missing header: {name}")))
    })?;

    let Some(expected) = expected_contains.filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    report.step(
        format!("Assert header '{name}' contains '{expected}'"),
        || {
            report.attach(format!("{name}-value"), value, AttachmentKind::Text);
            ensure(
                value.contains(expected),
                format!(
                    "Header {name} does not contain expected value: '{expected}' (actual: '{value}')"
                ),
            )
        },
    )
}

/// Parses the body as JSON. Calling it again on the same response yields the
/// same value or the same failure.
pub fn assert_json(report: &Report, response: &ApiResponse) -> Result<Value, ParseError> {
    report.step("Assert response is valid JSON", || {
        report.attach("raw-response-body", response.text(), AttachmentKind::Text);
        match response.json() {
            Ok(parsed) => {
                report.attach(
                    "parsed-json-preview",
                    truncate_chars(&parsed.to_string(), JSON_PREVIEW_CHARS),
                    AttachmentKind::Json,
                );
                Ok(parsed)
            }
            Err(err) => {
                report.attach("parsed-json-preview", err.to_string(), AttachmentKind::Text);
                Err(err)
            }
        }
    })
}

pub fn assert_in_body(
    report: &Report,
    response: &ApiResponse,
    expected: &str,
) -> Result<(), AssertionFailure> {
    report.step(format!("Assert body contains: '{expected}'"), || {
        let text = response.text();
        let found = text.contains(expected);
        report.attach("full-body-preview", text, AttachmentKind::Text);
        ensure(found, format!("Response body does not contain: {expected}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::response;
    use crate::report::Status;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_passes_only_on_exact_match() {
        let report = Report::new("status");
        let ok = response(200, &[], "{}");
        assert!(assert_status(&report, &ok, 200).is_ok());

        let not_found = response(404, &[], r#"{"responseCode": 404, "message": "missing"}"#);
        let err = assert_status(&report, &not_found, 200).unwrap_err();
        assert!(err.message.contains("Expected status 200"));
        assert!(err.message.contains("got 404"));
        assert!(err.message.contains("\"message\": \"missing\""));

        let result = report.finish(Status::Failed, None);
        let failed = &result.steps[1];
        assert_eq!(failed.title, "Assert status code == 200");
        assert_eq!(failed.status, Status::Failed);
        assert!(failed.attachment("failure-response-body").is_some());
        assert!(result.steps[0].attachments.is_empty());
    }

    #[test]
    fn status_failure_truncates_long_bodies() {
        let report = Report::new("status");
        let body = "x".repeat(1000);
        let resp = response(500, &[], &body);
        let err = assert_status(&report, &resp, 200).unwrap_err();
        assert!(err.message.ends_with(&"x".repeat(300)));
        assert!(!err.message.contains(&"x".repeat(301)));
    }

    #[test]
    fn header_messages_distinguish_missing_and_mismatch() {
        let report = Report::new("headers");

        let missing = response(200, &[], "{}");
        let err = assert_header(&report, &missing, "Content-Type", Some("text/html")).unwrap_err();
        assert_eq!(err.message, "Missing header: Content-Type");

        let json = response(200, &[("content-type", "application/json")], "{}");
        let err = assert_header(&report, &json, "Content-Type", Some("text/html")).unwrap_err();
        assert!(err
            .message
            .starts_with("Header Content-Type does not contain expected value: 'text/html'"));
        assert!(err.message.contains("application/json"));

        let html = response(200, &[("content-type", "text/html; charset=utf-8")], "{}");
        assert!(assert_header(&report, &html, "Content-Type", Some("text/html")).is_ok());
        assert!(assert_header(&report, &html, "content-type", None).is_ok());

        let result = report.finish(Status::Failed, None);
        let contains = result
            .find_step("Assert header 'Content-Type' contains 'text/html'")
            .unwrap();
        assert_eq!(
            contains.attachment("Content-Type-value").map(|a| a.content.as_str()),
            Some("application/json")
        );
    }

    #[test]
    fn json_is_idempotent() {
        let report = Report::new("json");
        let resp = response(200, &[], r#"{"products":[{"id":1,"name":"Blue Top"}]}"#);
        let first = assert_json(&report, &resp).unwrap();
        let second = assert_json(&report, &resp).unwrap();
        assert_eq!(first, second);

        let html = response(200, &[], "<html></html>");
        assert!(assert_json(&report, &html).is_err());
        assert!(assert_json(&report, &html).is_err());

        let result = report.finish(Status::Failed, None);
        assert_eq!(result.steps.len(), 4);
        for step in &result.steps {
            assert!(step.attachment("raw-response-body").is_some());
            assert!(step.attachment("parsed-json-preview").is_some());
        }
        assert_eq!(
            result.steps[0]
                .attachment("parsed-json-preview")
                .map(|a| a.kind),
            Some(AttachmentKind::Json)
        );
        assert_eq!(result.steps[3].status, Status::Failed);
    }

    #[test]
    fn in_body_attaches_either_way() {
        let report = Report::new("body");
        let resp = response(200, &[], r#"{"brands":[{"brand":"Polo"}]}"#);
        assert!(assert_in_body(&report, &resp, "Polo").is_ok());
        let err = assert_in_body(&report, &resp, "Levi").unwrap_err();
        assert_eq!(err.message, "Response body does not contain: Levi");

        let result = report.finish(Status::Failed, None);
        assert!(result
            .steps
            .iter()
            .all(|s| s.attachment("full-body-preview").is_some()));
    }

    #[test]
    fn ensure_maps_to_failure() {
        assert!(ensure(true, "unused").is_ok());
        assert_eq!(
            ensure(false, "No products found").unwrap_err().message,
            "No products found"
        );
    }
}
