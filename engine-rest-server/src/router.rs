//! Router construction for the engine REST server.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{case_execution, history, variable_instance};
use crate::state::AppState;

/// Build the full axum router, mounted under `config.base_path`.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let routes = Router::new()
        .merge(variable_instance_routes())
        .merge(history_routes())
        .merge(case_execution_routes())
        .with_state(state);

    let app = if config.base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&config.base_path, routes)
    };

    app.layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Runtime variable instances
// ============================================================================

fn variable_instance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/variable-instance",
            get(variable_instance::list).post(variable_instance::list_post),
        )
        .route(
            "/variable-instance/count",
            get(variable_instance::count).post(variable_instance::count_post),
        )
        .route("/variable-instance/:id", get(variable_instance::get))
        .route(
            "/variable-instance/:id/data",
            get(variable_instance::get_data),
        )
}

// ============================================================================
// History
// ============================================================================

fn history_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/history/variable-instance",
            get(history::list_variable_instances).post(history::list_variable_instances_post),
        )
        .route(
            "/history/variable-instance/count",
            get(history::count_variable_instances).post(history::count_variable_instances_post),
        )
        .route(
            "/history/variable-instance/:id",
            get(history::get_variable_instance),
        )
        .route(
            "/history/variable-instance/:id/data",
            get(history::get_variable_instance_data),
        )
        .route(
            "/history/identity-link-log",
            get(history::list_identity_link_logs),
        )
        .route(
            "/history/identity-link-log/count",
            get(history::count_identity_link_logs),
        )
        .route(
            "/history/process-definition/cleanable-process-instance-report",
            get(history::cleanable_report),
        )
        .route(
            "/history/process-definition/cleanable-process-instance-report/count",
            get(history::cleanable_report_count),
        )
}

// ============================================================================
// Case executions: lifecycle and variables
// ============================================================================

fn case_execution_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/case-execution/:id/manual-start",
            post(case_execution::manual_start),
        )
        .route("/case-execution/:id/disable", post(case_execution::disable))
        .route("/case-execution/:id/reenable", post(case_execution::reenable))
        .route("/case-execution/:id/complete", post(case_execution::complete))
        .route(
            "/case-execution/:id/:scope",
            get(case_execution::get_variables).post(case_execution::modify_variables),
        )
        .route(
            "/case-execution/:id/:scope/:name",
            get(case_execution::get_variable)
                .put(case_execution::put_variable)
                .delete(case_execution::delete_variable),
        )
        .route(
            "/case-execution/:id/:scope/:name/data",
            get(case_execution::get_variable_data).post(case_execution::post_variable_data),
        )
}
