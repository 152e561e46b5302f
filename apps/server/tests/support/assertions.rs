use anyhow::Context as _;
use axum::http::StatusCode;
use serde_json::Value;

/// Assert status code matches expected
pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(
        actual, expected,
        "{context}: expected status {expected}, got {actual}"
    );
}

/// Assert the body is an error envelope with `code`, and return the error object.
pub fn assert_error_code<'a>(body: &'a Value, code: &str) -> anyhow::Result<&'a Value> {
    assert_eq!(body["success"], Value::Bool(false), "expected success=false");
    let error = body.get("error").context("error object")?;
    assert_eq!(
        error.get("code").and_then(Value::as_str),
        Some(code),
        "unexpected error: {error}"
    );
    Ok(error)
}

/// `data` of a list envelope, checking `count` against its length.
pub fn list_data(body: &Value) -> anyhow::Result<&Vec<Value>> {
    assert_eq!(body["success"], Value::Bool(true), "expected success=true");
    let data = body
        .get("data")
        .and_then(Value::as_array)
        .context("data is array")?;
    assert_eq!(
        body["count"].as_u64(),
        Some(data.len() as u64),
        "count must equal the page length"
    );
    Ok(data)
}

/// One field of every record, in order.
pub fn field_values(body: &Value, field: &str) -> anyhow::Result<Vec<Value>> {
    Ok(list_data(body)?
        .iter()
        .map(|record| record.get(field).cloned().unwrap_or(Value::Null))
        .collect())
}
