//! History handlers.
//!
//! GET  /history/variable-instance                  - list (query-string filters)
//! POST /history/variable-instance                  - list (JSON body filters)
//! GET  /history/variable-instance/count            - count
//! POST /history/variable-instance/count            - count (JSON body filters)
//! GET  /history/variable-instance/:id              - single instance
//! GET  /history/variable-instance/:id/data         - binary content
//! GET  /history/identity-link-log                  - list
//! GET  /history/identity-link-log/count            - count
//! GET  /history/process-definition/cleanable-process-instance-report        - report
//! GET  /history/process-definition/cleanable-process-instance-report/count  - count

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use engine_rest_core::engine::{HistoricVariableInstanceQuery, Query as _};
use engine_rest_core::query::QueryParameters;
use engine_rest_core::value::EncodeOptions;
use engine_rest_core::RestError;

use super::variable_instance::{does_not_exist, not_binary};
use super::{binary_response, body_params, query_params, QueryPairs, DESERIALIZE_VALUES};
use crate::dto::{
    CleanableProcessInstanceReportResultDto, CountResultDto, HistoricIdentityLinkLogDto,
    HistoricVariableInstanceDto,
};
use crate::error::AppError;
use crate::state::AppState;

// ── Historic variable instances ──────────────────────────────

/// GET /history/variable-instance
pub async fn list_variable_instances(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<HistoricVariableInstanceDto>>, AppError> {
    let params = query_params(pairs)?;
    query_variable_instances(&state, &params, &params).await
}

/// POST /history/variable-instance
pub async fn list_variable_instances_post(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    body: Bytes,
) -> Result<Json<Vec<HistoricVariableInstanceDto>>, AppError> {
    let switches = query_params(pairs.clone())?;
    let params = body_params(pairs, &body)?;
    query_variable_instances(&state, &params, &switches).await
}

/// GET /history/variable-instance/count
pub async fn count_variable_instances(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<CountResultDto>, AppError> {
    count_historic_variables(&state, &query_params(pairs)?).await
}

/// POST /history/variable-instance/count
pub async fn count_variable_instances_post(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
    body: Bytes,
) -> Result<Json<CountResultDto>, AppError> {
    count_historic_variables(&state, &body_params(pairs, &body)?).await
}

/// GET /history/variable-instance/:id
pub async fn get_variable_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<HistoricVariableInstanceDto>, AppError> {
    let deserialize = query_params(pairs)?.bool_param(DESERIALIZE_VALUES, true)?;

    let mut query = state.engine.create_historic_variable_instance_query();
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
    Ok(Json(HistoricVariableInstanceDto::from_instance(
        &instance,
        &state.codec,
        options,
    )))
}

/// GET /history/variable-instance/:id/data
pub async fn get_variable_instance_data(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let mut query = state.engine.create_historic_variable_instance_query();
    query.variable_id(&id);
    query.disable_custom_object_deserialization();

    let instance = query.single_result().await?;
    binary_response(
        instance.as_ref().map(|i| &i.value),
        || RestError::NotFound(does_not_exist(&id)),
        || RestError::NotBinary(not_binary(&id)),
    )
}

async fn query_variable_instances(
    state: &AppState,
    params: &QueryParameters,
    switches: &QueryParameters,
) -> Result<Json<Vec<HistoricVariableInstanceDto>>, AppError> {
    let deserialize = switches.bool_param(DESERIALIZE_VALUES, true)?;

    let mut query = state.engine.create_historic_variable_instance_query();
    query.disable_binary_fetching();
    if !deserialize {
        query.disable_custom_object_deserialization();
    }

    let rows = state
        .specs
        .historic_variable_instances
        .list(query.as_mut(), params)
        .await?;

    let options = EncodeOptions::default()
        .without_binary_fetching()
        .with_deserialization(deserialize);
    Ok(Json(
        rows.iter()
            .map(|row| HistoricVariableInstanceDto::from_instance(row, &state.codec, options))
            .collect(),
    ))
}

async fn count_historic_variables(
    state: &AppState,
    params: &QueryParameters,
) -> Result<Json<CountResultDto>, AppError> {
    let mut query = state.engine.create_historic_variable_instance_query();
    let count = state
        .specs
        .historic_variable_instances
        .count(query.as_mut(), params)
        .await?;
    Ok(Json(CountResultDto { count }))
}

// ── Identity link log ────────────────────────────────────────

/// GET /history/identity-link-log
pub async fn list_identity_link_logs(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<HistoricIdentityLinkLogDto>>, AppError> {
    let params = query_params(pairs)?;
    let mut query = state.engine.create_historic_identity_link_log_query();
    let rows = state
        .specs
        .identity_link_logs
        .list(query.as_mut(), &params)
        .await?;
    Ok(Json(rows.iter().map(HistoricIdentityLinkLogDto::from).collect()))
}

/// GET /history/identity-link-log/count
pub async fn count_identity_link_logs(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<CountResultDto>, AppError> {
    let params = query_params(pairs)?;
    let mut query = state.engine.create_historic_identity_link_log_query();
    let count = state
        .specs
        .identity_link_logs
        .count(query.as_mut(), &params)
        .await?;
    Ok(Json(CountResultDto { count }))
}

// ── Cleanable process instance report ────────────────────────

/// GET /history/process-definition/cleanable-process-instance-report
pub async fn cleanable_report(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<Vec<CleanableProcessInstanceReportResultDto>>, AppError> {
    let params = query_params(pairs)?;
    let mut report = state.engine.create_cleanable_historic_process_instance_report();
    let rows = state
        .specs
        .cleanable_reports
        .list(report.as_mut(), &params)
        .await?;
    Ok(Json(
        rows.iter()
            .map(CleanableProcessInstanceReportResultDto::from)
            .collect(),
    ))
}

/// GET /history/process-definition/cleanable-process-instance-report/count
pub async fn cleanable_report_count(
    State(state): State<AppState>,
    Query(pairs): Query<QueryPairs>,
) -> Result<Json<CountResultDto>, AppError> {
    let params = query_params(pairs)?;
    let mut report = state.engine.create_cleanable_historic_process_instance_report();
    let count = state
        .specs
        .cleanable_reports
        .count(report.as_mut(), &params)
        .await?;
    Ok(Json(CountResultDto { count }))
}
