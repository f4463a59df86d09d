//! Case execution handlers. `:scope` is `variables` (visible from the
//! execution) or `localVariables` (the execution only).
//!
//! POST   /case-execution/:id/manual-start         - start, with variable changes
//! POST   /case-execution/:id/disable              - disable, with variable changes
//! POST   /case-execution/:id/reenable             - re-enable, with variable changes
//! POST   /case-execution/:id/complete             - complete, with variable changes
//! GET    /case-execution/:id/:scope               - all variables
//! POST   /case-execution/:id/:scope               - modifications and deletions
//! GET    /case-execution/:id/:scope/:name         - one variable
//! PUT    /case-execution/:id/:scope/:name         - set one variable
//! DELETE /case-execution/:id/:scope/:name         - remove one variable
//! GET    /case-execution/:id/:scope/:name/data    - binary content
//! POST   /case-execution/:id/:scope/:name/data    - binary upload (multipart)

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use engine_rest_core::engine::{CaseTransition, VariableScope};
use engine_rest_core::value::{EncodeOptions, TypedValue, ValueError, VariableValueDto};
use engine_rest_core::{EngineErrorKind, RestError};

use super::{binary_response, parse_body, query_params, QueryPairs, DESERIALIZE_VALUES};
use crate::dto::{CaseExecutionTriggerDto, PatchVariablesDto};
use crate::error::AppError;
use crate::state::AppState;

const DATA_PART: &str = "data";
const TYPE_PART: &str = "type";

fn scope_of(segment: &str) -> Result<VariableScope, AppError> {
    match segment {
        "variables" => Ok(VariableScope::Global),
        "localVariables" => Ok(VariableScope::Local),
        other => Err(AppError(RestError::NotFound(format!(
            "No case execution resource '{}'",
            other
        )))),
    }
}

// ── Lifecycle ────────────────────────────────────────────────

/// POST /case-execution/:id/manual-start
pub async fn manual_start(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    trigger(&state, &id, &body, CaseTransition::ManualStart).await
}

/// POST /case-execution/:id/disable
pub async fn disable(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    trigger(&state, &id, &body, CaseTransition::Disable).await
}

/// POST /case-execution/:id/reenable
pub async fn reenable(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    trigger(&state, &id, &body, CaseTransition::Reenable).await
}

/// POST /case-execution/:id/complete
pub async fn complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    trigger(&state, &id, &body, CaseTransition::Complete).await
}

fn transition_failure(id: &str, transition: CaseTransition) -> String {
    match transition {
        CaseTransition::ManualStart => {
            format!("Cannot start case execution with id '{}' manually.", id)
        }
        CaseTransition::Disable => format!("Cannot disable case execution with id '{}'.", id),
        CaseTransition::Reenable => format!("Cannot re-enable case execution with id '{}'.", id),
        CaseTransition::Complete => format!("Cannot complete case execution with id '{}'.", id),
    }
}

/// Decode the body, queue deletions then variables on one command, and end
/// it with `transition`. Engine failures other than authorization are bad
/// requests.
async fn trigger(
    state: &AppState,
    id: &str,
    body: &Bytes,
    transition: CaseTransition,
) -> Result<StatusCode, AppError> {
    let failed = transition_failure(id, transition);
    let dto: Option<CaseExecutionTriggerDto> = parse_body(body)?;
    let dto = dto.unwrap_or_default();

    let mut variables = Vec::new();
    for (name, variable) in dto.variables.unwrap_or_default() {
        let value = state.codec.decode(&variable.value).map_err(|e| {
            AppError::invalid_request(format!("{} {}", failed, e.describe_for(&name)))
        })?;
        variables.push((name, value, scope_flag(variable.local)));
    }

    let mut command = state.engine.with_case_execution(id);
    for deletion in dto.deletions.unwrap_or_default() {
        command.remove_variable(&deletion.name, scope_flag(deletion.local));
    }
    for (name, value, scope) in variables {
        command.set_variable(&name, value, scope);
    }

    command.trigger(transition).await.map_err(|e| match e.kind {
        EngineErrorKind::Authorization => AppError::from(e.with_context(&failed)),
        _ => AppError::invalid_request(format!("{} {}", failed, e.message)),
    })?;

    tracing::debug!(
        case_execution = %id,
        transition = transition.name(),
        "case execution transitioned"
    );
    Ok(StatusCode::NO_CONTENT)
}

fn scope_flag(local: bool) -> VariableScope {
    if local {
        VariableScope::Local
    } else {
        VariableScope::Global
    }
}

// ── Variables ────────────────────────────────────────────────

/// GET /case-execution/:id/:scope
pub async fn get_variables(
    State(state): State<AppState>,
    Path((id, scope)): Path<(String, String)>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<BTreeMap<String, VariableValueDto>>, AppError> {
    let scope = scope_of(&scope)?;
    let deserialize = query_params(pairs)?.bool_param(DESERIALIZE_VALUES, true)?;

    let variables = state.engine.case_execution_variables(&id, scope).await?;

    let options = EncodeOptions::default().with_deserialization(deserialize);
    Ok(Json(
        variables
            .iter()
            .map(|(name, value)| (name.clone(), state.codec.encode(value, options)))
            .collect(),
    ))
}

/// POST /case-execution/:id/:scope
pub async fn modify_variables(
    State(state): State<AppState>,
    Path((id, scope)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let scope = scope_of(&scope)?;
    let patch: Option<PatchVariablesDto> = parse_body(&body)?;
    let patch = patch.unwrap_or_default();
    let failed =
        |detail: String| format!("Cannot modify variables for case execution {}: {}", id, detail);

    let modifications = match &patch.modifications {
        Some(dtos) => Some(
            decode_all(&state, dtos)
                .map_err(|(name, err)| AppError::invalid_request(failed(err.describe_for(&name))))?,
        ),
        None => None,
    };

    let mut command = state.engine.with_case_execution(&id);
    if let Some(deletions) = &patch.deletions {
        command.remove_variables(deletions, scope);
    }
    if let Some(modifications) = modifications {
        command.set_variables(modifications, scope);
    }
    command
        .execute()
        .await
        .map_err(|e| e.with_context(format!("Cannot modify variables for case execution {}", id)))?;

    tracing::debug!(case_execution = %id, ?scope, "modified case execution variables");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /case-execution/:id/:scope/:name
pub async fn get_variable(
    State(state): State<AppState>,
    Path((id, scope, name)): Path<(String, String, String)>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<VariableValueDto>, AppError> {
    let scope = scope_of(&scope)?;
    let deserialize = query_params(pairs)?.bool_param(DESERIALIZE_VALUES, true)?;

    let value = fetch_variable(&state, &id, &name, scope)
        .await?
        .ok_or_else(|| RestError::NotFound(missing_variable(&name)))?;

    let options = EncodeOptions::default().with_deserialization(deserialize);
    Ok(Json(state.codec.encode(&value, options)))
}

/// PUT /case-execution/:id/:scope/:name
pub async fn put_variable(
    State(state): State<AppState>,
    Path((id, scope, name)): Path<(String, String, String)>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let scope = scope_of(&scope)?;
    let dto: Option<VariableValueDto> = parse_body(&body)?;
    let value = state
        .codec
        .decode(&dto.unwrap_or_default())
        .map_err(|e| {
            AppError::invalid_request(format!(
                "Cannot put case execution variable {}",
                e.describe_for(&name)
            ))
        })?;

    set_variable(&state, &id, &name, value, scope).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /case-execution/:id/:scope/:name
pub async fn delete_variable(
    State(state): State<AppState>,
    Path((id, scope, name)): Path<(String, String, String)>,
) -> Result<StatusCode, AppError> {
    let scope = scope_of(&scope)?;

    let mut command = state.engine.with_case_execution(&id);
    command.remove_variable(&name, scope);
    command
        .execute()
        .await
        .map_err(|e| e.with_context(format!("Cannot delete case execution variable {}", name)))?;

    tracing::debug!(case_execution = %id, variable = %name, ?scope, "removed variable");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /case-execution/:id/:scope/:name/data
pub async fn get_variable_data(
    State(state): State<AppState>,
    Path((id, scope, name)): Path<(String, String, String)>,
) -> Result<Response, AppError> {
    let scope = scope_of(&scope)?;
    let value = fetch_variable(&state, &id, &name, scope).await?;

    binary_response(
        value.as_ref(),
        || RestError::NotFound(missing_variable(&name)),
        || {
            RestError::NotBinary(format!(
                "Value of variable {} of case execution {} is not a binary value.",
                name, id
            ))
        },
    )
}

/// POST /case-execution/:id/:scope/:name/data
///
/// Part `data` alone stores a byte array. With a `type` part the payload is a
/// serialized object of that type, in the format named by the `data` part's
/// content type.
pub async fn post_variable_data(
    State(state): State<AppState>,
    Path((id, scope, name)): Path<(String, String, String)>,
    mut multipart: Multipart,
) -> Result<StatusCode, AppError> {
    let scope = scope_of(&scope)?;

    let mut data: Option<(Vec<u8>, Option<String>)> = None;
    let mut object_type: Option<String> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let part = field.name().map(str::to_string);
        match part.as_deref() {
            Some(DATA_PART) => {
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                data = Some((bytes.to_vec(), content_type));
            }
            Some(TYPE_PART) => {
                object_type = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (payload, content_type) = data.ok_or_else(|| {
        AppError::invalid_request(format!("Missing multipart part '{}'", DATA_PART))
    })?;

    let value = state
        .codec
        .decode_binary(payload, object_type.as_deref(), content_type.as_deref())
        .map_err(|e| match e {
            ValueError::UnrecognizedDataFormat(format) => AppError::invalid_request(format!(
                "Unrecognized content type for serialized type: {}",
                format
            )),
            other => AppError::invalid_request(format!(
                "Cannot put case execution variable {}",
                other.describe_for(&name)
            )),
        })?;

    set_variable(&state, &id, &name, value, scope).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Helpers ──────────────────────────────────────────────────

fn missing_variable(name: &str) -> String {
    format!(
        "case execution variable with name {} does not exist or is null",
        name
    )
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::invalid_request(format!("Invalid multipart body: {}", err))
}

/// Decode every modification; the first failure is returned with the name of
/// the variable it belongs to.
fn decode_all(
    state: &AppState,
    dtos: &BTreeMap<String, VariableValueDto>,
) -> Result<BTreeMap<String, TypedValue>, (String, ValueError)> {
    dtos.iter()
        .map(|(name, dto)| {
            state
                .codec
                .decode(dto)
                .map(|value| (name.clone(), value))
                .map_err(|err| (name.clone(), err))
        })
        .collect()
}

async fn fetch_variable(
    state: &AppState,
    id: &str,
    name: &str,
    scope: VariableScope,
) -> Result<Option<TypedValue>, AppError> {
    let value = state
        .engine
        .case_execution_variable(id, name, scope)
        .await
        .map_err(|e| e.with_context(format!("Cannot get case execution variable {}", name)))?;
    Ok(value)
}

async fn set_variable(
    state: &AppState,
    id: &str,
    name: &str,
    value: TypedValue,
    scope: VariableScope,
) -> Result<(), AppError> {
    let mut command = state.engine.with_case_execution(id);
    command.set_variable(name, value, scope);
    command
        .execute()
        .await
        .map_err(|e| e.with_context(format!("Cannot put case execution variable {}", name)))?;

    tracing::debug!(case_execution = %id, variable = %name, ?scope, "set variable");
    Ok(())
}
