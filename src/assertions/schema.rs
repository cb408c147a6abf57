use jsonschema::JSONSchema;
use serde_json::Value;

use crate::{error::AssertionFailure, report::Report};

/// Validates `instance` against a JSON Schema and reports the first
/// violation. A schema that does not compile is a failure too.
pub fn assert_schema(
    report: &Report,
    instance: &Value,
    schema: &Value,
) -> Result<(), AssertionFailure> {
    report.step("Validate JSON schema", || {
        let compiled = JSONSchema::compile(schema)
            .map_err(|err| AssertionFailure::new(format!("Invalid JSON schema: {err}")))?;

        let outcome = compiled.validate(instance).map_err(|mut errors| {
            match errors.next() {
                Some(err) => {
                    let path = err.instance_path.to_string();
                    let location = if path.is_empty() { "/".to_string() } else { path };
                    AssertionFailure::new(format!(
                        "Schema validation failed at '{location}': {err}"
                    ))
                }
                None => AssertionFailure::new("Schema validation failed"),
            }
        });
        outcome
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Status;
    use serde_json::json;

    fn product_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string"},
                "price": {"type": "string"},
                "category": {
                    "type": "object",
                    "properties": {
                        "usertype": {
                            "type": "object",
                            "properties": {"usertype": {"type": "string"}},
                            "required": ["usertype"]
                        },
                        "category": {"type": "string"}
                    },
                    "required": ["usertype", "category"]
                }
            },
            "required": ["id", "name", "price", "category"]
        })
    }

    #[test]
    fn accepts_conforming_instance() {
        let report = Report::new("schema");
        let product = json!({
            "id": 1,
            "name": "Blue Top",
            "price": "Rs. 500",
            "category": {"usertype": {"usertype": "Women"}, "category": "Tops"}
        });
        assert!(assert_schema(&report, &product, &product_schema()).is_ok());
        let result = report.finish(Status::Passed, None);
        assert_eq!(result.steps[0].title, "Validate JSON schema");
        assert_eq!(result.steps[0].status, Status::Passed);
    }

    #[test]
    fn reports_first_violation_with_path() {
        let report = Report::new("schema");
        let product = json!({
            "id": "1",
            "name": "Blue Top",
            "price": "Rs. 500",
            "category": {"usertype": {"usertype": "Women"}, "category": "Tops"}
        });
        let err = assert_schema(&report, &product, &product_schema()).unwrap_err();
        assert!(err.message.contains("'/id'"), "{}", err.message);
    }

    #[test]
    fn missing_required_field_fails() {
        let report = Report::new("schema");
        let err = assert_schema(&report, &json!({"id": 1}), &product_schema()).unwrap_err();
        assert!(err.message.starts_with("Schema validation failed"));
    }

    #[test]
    fn invalid_schema_is_a_failure() {
        let report = Report::new("schema");
        let err = assert_schema(&report, &json!({}), &json!({"type": 12})).unwrap_err();
        assert!(err.message.starts_with("Invalid JSON schema"));
    }
}
