//! Runtime variable instance handlers.
//!
//! GET  /variable-instance            - list (query-string filters)
//! POST /variable-instance            - list (JSON body filters)
//! GET  /variable-instance/count      - count (query-string filters)
//! POST /variable-instance/count      - count (JSON body filters)
//! GET  /variable-instance/:id        - single instance
//! GET  /variable-instance/:id/data   - binary content

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use engine_rest_core::engine::{Query as _, VariableInstanceQuery};
use engine_rest_core::query::QueryParameters;
use engine_rest_core::value::EncodeOptions;
use engine_rest_core::RestError;

use super::{binary_response, body_params, query_params, QueryPairs, DESERIALIZE_VALUES};
use crate::dto::{CountResultDto, VariableInstanceDto};
use crate::error::AppError;
use crate::state::AppState;

/// GET /variable-instance
pub async fn list(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<VariableInstanceDto>>, AppError> {
    let params = query_params(pairs)?;
    query_instances(&state, &params, &params).await
}

/// POST /variable-instance
pub async fn list_post(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    body: Bytes,
) -> Result<Json<Vec<VariableInstanceDto>>, AppError> {
    let switches = query_params(pairs.clone())?;
    let params = body_params(pairs, &body)?;
    query_instances(&state, &params, &switches).await
}

/// GET /variable-instance/count
pub async fn count(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<CountResultDto>, AppError> {
    count_instances(&state, &query_params(pairs)?).await
}

/// POST /variable-instance/count
pub async fn count_post(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    body: Bytes,
) -> Result<Json<CountResultDto>, AppError> {
    count_instances(&state, &body_params(pairs, &body)?).await
}

/// GET /variable-instance/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<VariableInstanceDto>, AppError> {
    let deserialize = query_params(pairs)?.bool_param(DESERIALIZE_VALUES, true)?;

    let mut query = state.engine.create_variable_instance_query();
    query.variable_id(&id);
    query.disable_binary_fetching();
    if !deserialize {
        query.disable_custom_object_deserialization();
    }

    let instance = query
        .single_result()
        .await?
        .ok_or_else(|| RestError::NotFound(does_not_exist(&id)))?;

    let options = EncodeOptions::default()
        .without_binary_fetching()
        .with_deserialization(deserialize);
    Ok(Json(VariableInstanceDto::from_instance(
        &instance,
        &state.codec,
        options,
    )))
}

/// GET /variable-instance/:id/data
pub async fn get_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let mut query = state.engine.create_variable_instance_query();
    query.variable_id(&id);
    query.disable_custom_object_deserialization();

    let instance = query.single_result().await?;
    binary_response(
        instance.as_ref().map(|i| &i.value),
        || RestError::NotFound(does_not_exist(&id)),
        || RestError::NotBinary(not_binary(&id)),
    )
}

pub(crate) fn does_not_exist(id: &str) -> String {
    format!("Variable instance with Id '{}' does not exist.", id)
}

pub(crate) fn not_binary(id: &str) -> String {
    format!("Variable instance with Id '{}' is not a binary variable", id)
}

async fn query_instances(
    state: &AppState,
    params: &QueryParameters,
    switches: &QueryParameters,
) -> Result<Json<Vec<VariableInstanceDto>>, AppError> {
    let deserialize = switches.bool_param(DESERIALIZE_VALUES, true)?;

    let mut query = state.engine.create_variable_instance_query();
    query.disable_binary_fetching();
    if !deserialize {
        query.disable_custom_object_deserialization();
    }

    let rows = state
        .specs
        .variable_instances
        .list(query.as_mut(), params)
        .await?;

    let options = EncodeOptions::default()
        .without_binary_fetching()
        .with_deserialization(deserialize);
    Ok(Json(
        rows.iter()
            .map(|row| VariableInstanceDto::from_instance(row, &state.codec, options))
            .collect(),
    ))
}

async fn count_instances(
    state: &AppState,
    params: &QueryParameters,
) -> Result<Json<CountResultDto>, AppError> {
    let mut query = state.engine.create_variable_instance_query();
    let count = state
        .specs
        .variable_instances
        .count(query.as_mut(), params)
        .await?;
    Ok(Json(CountResultDto { count }))
}
