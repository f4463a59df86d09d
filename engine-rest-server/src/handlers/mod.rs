//! Route handlers, one module per resource family.

pub mod case_execution;
pub mod history;
pub mod variable_instance;

use axum::body::{Body, Bytes};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use engine_rest_core::query::QueryParameters;
use engine_rest_core::value::{binary_payload, BinaryAccessError, TypedValue};
use engine_rest_core::RestError;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Switch shared by every endpoint that returns variable values.
pub const DESERIALIZE_VALUES: &str = "deserializeValues";

const OCTET_STREAM: &str = "application/octet-stream";

pub type QueryPairs = Vec<(String, String)>;

pub(crate) fn query_params(pairs: QueryPairs) -> Result<QueryParameters, AppError> {
    Ok(QueryParameters::from_query_pairs(pairs)?)
}

/// Parameters of a `POST` query: filters from the JSON body, paging from the
/// query string when given there.
pub(crate) fn body_params(pairs: QueryPairs, body: &Bytes) -> Result<QueryParameters, AppError> {
    let from_query = query_params(pairs)?;
    let from_body = QueryParameters::from_json_body(parse_json_or_null(body)?)?;
    Ok(from_body.with_paging_from(&from_query))
}

/// Deserialize a request body; an empty body reads as JSON `null`.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_value(parse_json_or_null(body)?)
        .map_err(|e| AppError::invalid_request(format!("Invalid request body: {}", e)))
}

fn parse_json_or_null(body: &Bytes) -> Result<serde_json::Value, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_request(format!("Invalid request body: {}", e)))
}

/// Stream a variable's binary content. `None` means the variable is missing.
pub(crate) fn binary_response(
    value: Option<&TypedValue>,
    not_found: impl FnOnce() -> RestError,
    not_binary: impl FnOnce() -> RestError,
) -> Result<Response, AppError> {
    let content_type = match value {
        Some(TypedValue::Object(object)) => object
            .serialization_data_format
            .clone()
            .unwrap_or_else(|| OCTET_STREAM.to_string()),
        _ => OCTET_STREAM.to_string(),
    };

    let payload = binary_payload(value).map_err(|e| match e {
        BinaryAccessError::NotFound => not_found(),
        BinaryAccessError::NotBinary => not_binary(),
    })?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        Body::from(payload),
    )
        .into_response())
}
