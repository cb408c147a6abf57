use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};

use crate::{
    assertions::{assert_header, assert_in_body, assert_json, assert_schema, assert_status, ensure},
    client::{ApiClient, ApiResponse, RequestOptions},
    error::{AssertionFailure, HarnessError, HarnessResult},
    fixtures::SearchCase,
    report::{attach_response, AttachmentKind, Report},
};

/// Keys under which the categories endpoint may return its list.
pub const CATEGORY_KEYS: [&str; 2] = ["categories", "category_list"];

const PREVIEW_ITEMS: usize = 3;
const HTML_CONTENT_TYPE: &str = "text/html";

static PRODUCT_SCHEMA: Lazy<Value> = Lazy::new(|| {
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
});

/// Schema of one entry of the `products` array.
pub fn product_schema() -> &'static Value {
    &PRODUCT_SCHEMA
}

async fn send(
    client: &ApiClient,
    report: &Report,
    title: String,
    method: &str,
    endpoint: &str,
    options: RequestOptions,
    label: &str,
) -> HarnessResult<ApiResponse> {
    report
        .step_async(title, async {
            let response = client.request(method, endpoint, options).await?;
            attach_response(report, &response, label);
            Ok::<_, HarnessError>(response)
        })
        .await
}

fn as_object<'a>(data: &'a Value) -> Result<&'a Map<String, Value>, AssertionFailure> {
    data.as_object()
        .ok_or_else(|| AssertionFailure::new("Response is not a JSON object"))
}

fn preview(items: &[Value]) -> String {
    let head = &items[..items.len().min(PREVIEW_ITEMS)];
    serde_json::to_string(head).unwrap_or_default()
}

fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn status_and_html(report: &Report, response: &ApiResponse, expected: u16) -> HarnessResult<()> {
    report.step("Validate response status and headers", || -> HarnessResult<()> {
        assert_status(report, response, expected)?;
        assert_header(report, response, "Content-Type", Some(HTML_CONTENT_TYPE))?;
        Ok(())
    })
}

pub(super) async fn brands_list(client: &ApiClient, report: &Report) -> HarnessResult<()> {
    let response = send(
        client,
        report,
        "Send GET request to /brandsList".to_string(),
        "GET",
        "brandsList",
        RequestOptions::new(),
        "brandsList",
    )
    .await?;

    report.step("Validate response status code", || {
        assert_status(report, &response, 200)
    })?;
    report.step("Check known brand in response body (e.g., Polo)", || {
        assert_in_body(report, &response, "Polo")
    })?;
    Ok(())
}

pub(super) async fn categories(client: &ApiClient, report: &Report) -> HarnessResult<()> {
    let response = send(
        client,
        report,
        "Send GET request to /categories".to_string(),
        "GET",
        "categories",
        RequestOptions::new(),
        "categories",
    )
    .await?;

    status_and_html(report, &response, 200)?;

    report.step("Validate response body", || -> HarnessResult<()> {
        let data = assert_json(report, &response)?;
        let object = as_object(&data)?;
        let key = CATEGORY_KEYS
            .iter()
            .find(|key| object.contains_key(**key))
            .ok_or_else(|| AssertionFailure::new("No category key found in response"))?;
        let categories = object[*key]
            .as_array()
            .ok_or_else(|| AssertionFailure::new("Categories is not a list"))?;
        ensure(!categories.is_empty(), "No categories found")?;

        report.attach("categories-preview", preview(categories), AttachmentKind::Text);
        Ok(())
    })
}

pub(super) async fn products_list(client: &ApiClient, report: &Report) -> HarnessResult<()> {
    let response = report
        .step_async("Send GET request to /productsList", async {
            let response = client.get("productsList", RequestOptions::new()).await?;
            attach_response(report, &response, "productsList");
            report.attach(
                "response-time",
                format!("{:.3} seconds", response.elapsed.as_secs_f64()),
                AttachmentKind::Text,
            );
            Ok::<_, HarnessError>(response)
        })
        .await?;

    status_and_html(report, &response, 200)?;

    report.step("Validate response body", || -> HarnessResult<()> {
        let data = assert_json(report, &response)?;
        let object = as_object(&data)?;
        let products = object
            .get("products")
            .ok_or_else(|| AssertionFailure::new("Key 'products' missing in response"))?
            .as_array()
            .ok_or_else(|| AssertionFailure::new("Products is not a list"))?;
        ensure(!products.is_empty(), "No products returned")?;

        report.attach("products-preview", preview(products), AttachmentKind::Text);
        Ok(())
    })
}

pub(super) async fn single_product(client: &ApiClient, report: &Report) -> HarnessResult<()> {
    const PRODUCT_ID: &str = "1";

    let response = send(
        client,
        report,
        "Send GET request to /productsList".to_string(),
        "GET",
        "productsList",
        RequestOptions::new(),
        "productsList",
    )
    .await?;

    report.step("Validate response status code is 200", || {
        assert_status(report, &response, 200)
    })?;

    let target = report.step(
        "Filter product by ID and assert details",
        || -> HarnessResult<Value> {
            let data = assert_json(report, &response)?;
            let target = data
                .get("products")
                .and_then(Value::as_array)
                .and_then(|products| {
                    products
                        .iter()
                        .find(|p| p.get("id").map(id_text).as_deref() == Some(PRODUCT_ID))
                })
                .cloned()
                .ok_or_else(|| {
                    AssertionFailure::new(format!("Product with ID={PRODUCT_ID} not found"))
                })?;

            let name = target
                .get("name")
                .ok_or_else(|| AssertionFailure::new("Product name missing"))?
                .as_str()
                .ok_or_else(|| AssertionFailure::new("Product name should be string"))?;
            ensure(!name.is_empty(), "Product name is empty")?;
            Ok(target)
        },
    )?;

    assert_schema(report, &target, product_schema())?;
    Ok(())
}

pub(super) async fn search_product(
    client: &ApiClient,
    report: &Report,
    case: &SearchCase,
) -> HarnessResult<()> {
    let response = send(
        client,
        report,
        format!("Send POST request to /searchProduct - {}", case.name),
        "POST",
        "searchProduct",
        RequestOptions::new().form(case.form_fields()),
        &format!("searchProduct-{}", case.name),
    )
    .await?;

    status_and_html(report, &response, case.expected_status)?;

    if case.expected_status != 200 {
        return Ok(());
    }

    report.step("Validate response body", || -> HarnessResult<()> {
        let data = assert_json(report, &response)?;
        let non_empty = match &data {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::String(s) => !s.is_empty(),
            _ => false,
        };
        ensure(non_empty, "No products found in response")?;

        report.attach("matched-products", data.to_string(), AttachmentKind::Text);
        Ok(())
    })
}
