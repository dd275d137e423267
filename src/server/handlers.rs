use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::maps::{ExpandError, ExpandErrorBody, Language, SearchError, SearchErrorBody};

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> Response {
    let body = ApiErrorBody {
        error: msg.into(),
        code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

fn expand_status(e: &ExpandError) -> StatusCode {
    match e {
        ExpandError::EmptyInput | ExpandError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        ExpandError::Unresolved(_) => StatusCode::BAD_GATEWAY,
    }
}

fn search_status(e: &SearchError) -> StatusCode {
    match e {
        SearchError::Unavailable => StatusCode::NOT_IMPLEMENTED,
        SearchError::EmptyQuery => StatusCode::BAD_REQUEST,
        SearchError::Exhausted { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

// ─── GET /health ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub time: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        time: Utc::now().to_rfc3339(),
    })
}

// ─── GET /api/expand ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ExpandQuery {
    pub url: Option<String>,
    pub lang: Option<String>,
}

pub async fn expand(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpandQuery>,
) -> Response {
    let start = Instant::now();

    let lang = match params.lang.as_deref() {
        Some(code) => match code.parse::<Language>() {
            Ok(lang) => lang,
            Err(e) => return api_error(StatusCode::BAD_REQUEST, e),
        },
        None => Language::default(),
    };
    let url = params.url.unwrap_or_default();

    let task_state = Arc::clone(&state);
    let task_url = url.clone();
    let result =
        match tokio::task::spawn_blocking(move || task_state.resolver.expand(&task_url, &lang)).await {
            Ok(result) => result,
            Err(e) => return api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

    let (status, response) = match &result {
        Ok(expansion) => (StatusCode::OK, Json(expansion).into_response()),
        Err(e) => {
            let status = expand_status(e);
            (status, (status, Json(ExpandErrorBody::from(e))).into_response())
        }
    };

    info!(
        url = %url,
        status = status.as_u16(),
        stage = result.as_ref().map(|x| x.stage()).unwrap_or("error"),
        elapsed_ms = elapsed_ms(start),
        "GET /api/expand"
    );
    response
}

// ─── GET /api/search ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Response {
    let start = Instant::now();
    let query = params.q.unwrap_or_default();

    let task_state = Arc::clone(&state);
    let task_query = query.clone();
    let result = match tokio::task::spawn_blocking(move || task_state.resolver.search(&task_query)).await {
        Ok(result) => result,
        Err(e) => return api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let (status, response) = match &result {
        Ok(hits) => (StatusCode::OK, Json(hits).into_response()),
        Err(e) => {
            let status = search_status(e);
            (status, (status, Json(SearchErrorBody::from(e))).into_response())
        }
    };

    info!(
        query = %query,
        status = status.as_u16(),
        hits = result.as_ref().map(|h| h.len()).unwrap_or(0),
        elapsed_ms = elapsed_ms(start),
        "GET /api/search"
    );
    response
}
