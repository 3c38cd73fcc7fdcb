use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use shared::{
    domain::{Candidate, CandidateForm, CandidateId},
    error::{ApiError, ErrorCode},
    protocol::{Analytics, UpdateStatusRequest, ACCESS_KEY_HEADER},
};
use storage::Storage;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod app_state;
mod config;

use api::{analytics_route, candidate_route, candidates_route, ApiContext};
use app_state::AppState;
use config::{load_settings, prepare_database_url};

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext {
            store: Arc::new(storage),
        },
        access_key: settings.access_key,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, "candidate store listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            candidates_route(),
            get(http_list_candidates).post(http_create_candidate),
        )
        .route(
            candidate_route(),
            patch(http_update_status).delete(http_delete_candidate),
        )
        .route(analytics_route(), get(http_analytics))
        .layer(from_fn_with_state(state.clone(), require_access_key))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn require_access_key(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, HttpError> {
    if presented_key(&headers) == Some(state.access_key.as_str()) {
        return Ok(next.run(request).await);
    }
    warn!(path = %request.uri().path(), "request rejected: missing or invalid access key");
    Err((
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new(
            ErrorCode::Unauthorized,
            "missing or invalid access key",
        )),
    ))
}

fn presented_key(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(ACCESS_KEY_HEADER) {
        return value.to_str().ok();
    }
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state
        .api
        .store
        .health_check()
        .await
        .map_err(|e| http_error(e.into()))?;
    Ok("ok")
}

async fn http_list_candidates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Candidate>>, HttpError> {
    api::list_candidates(&state.api)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn http_create_candidate(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CandidateForm>,
) -> Result<(StatusCode, Json<Candidate>), HttpError> {
    let created = api::create_candidate(&state.api, form)
        .await
        .map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_update_status(
    State(state): State<Arc<AppState>>,
    Path(candidate_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Candidate>, HttpError> {
    api::update_candidate_status(&state.api, CandidateId(candidate_id), req.status)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn http_delete_candidate(
    State(state): State<Arc<AppState>>,
    Path(candidate_id): Path<String>,
) -> Result<StatusCode, HttpError> {
    api::delete_candidate(&state.api, CandidateId(candidate_id))
        .await
        .map_err(http_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_analytics(State(state): State<Arc<AppState>>) -> Result<Json<Analytics>, HttpError> {
    api::analytics(&state.api)
        .await
        .map(Json)
        .map_err(http_error)
}

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
