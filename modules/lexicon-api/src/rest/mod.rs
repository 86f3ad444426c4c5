use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use lexicon_charts::{Report, ReportError, LKPP_DATASET};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::db::cases::{is_valid_id, CaseDetail};
use crate::AppState;

const REPORT_SCHEMA_HEADER: &str = "x-report-schema";

#[derive(Serialize)]
struct Envelope<T> {
    data: T,
}

pub fn build_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    let cors = if allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let v1 = Router::new()
        .route("/chart", get(api_chart))
        .route("/lkpp-chart", get(api_lkpp_chart))
        .route("/chart/dataset/{marker}", get(api_dataset_chart))
        .route("/detail/{id}", get(api_case_detail));

    Router::new()
        .nest("/v1/beneficiary-ownership", v1)
        .route("/health", get(health))
        .with_state(state)
        .layer(cors)
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

// --- Helpers ---

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn report_response(result: Result<Report, ReportError>) -> Response {
    match result {
        Ok(report) => (
            [(REPORT_SCHEMA_HEADER, HeaderValue::from(report.schema_version()))],
            Json(Envelope { data: report }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to compute chart report");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

// --- Handlers ---

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn api_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    report_response(state.charts.general_report().await)
}

pub async fn api_lkpp_chart(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    report_response(state.charts.dataset_report(LKPP_DATASET).await)
}

pub async fn api_dataset_chart(
    State(state): State<Arc<AppState>>,
    Path(marker): Path<String>,
) -> impl IntoResponse {
    report_response(state.charts.dataset_report(&marker).await)
}

pub async fn api_case_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if !is_valid_id(&id) {
        return error_response(StatusCode::BAD_REQUEST, "invalid id");
    }

    match state.cases.find_by_id(&id).await {
        Ok(Some(record)) => {
            info!(id = %id, "Case detail found");
            Json(Envelope {
                data: CaseDetail::from_record(record, &state.base_url),
            })
            .into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "data not found"),
        Err(e) => {
            warn!(error = %e, id = %id, "Failed to load case detail");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
