use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, patch},
    Json, Router,
};
use shared::error::ErrorCode;
use storage::MemoryStore;
use tokio::net::TcpListener;

const KEY: &str = "client-test-key";

type Reply<T> = Result<T, (axum::http::StatusCode, Json<ApiError>)>;

#[derive(Clone)]
struct FakeService {
    store: Arc<MemoryStore>,
}

fn reject(err: StoreError) -> (axum::http::StatusCode, Json<ApiError>) {
    let status = match err {
        StoreError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
        StoreError::Rejected(_) => axum::http::StatusCode::UNPROCESSABLE_ENTITY,
        StoreError::Unavailable(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err.into()))
}

fn guard(headers: &HeaderMap) -> Reply<()> {
    if headers.get(ACCESS_KEY_HEADER).and_then(|v| v.to_str().ok()) == Some(KEY) {
        return Ok(());
    }
    Err((
        axum::http::StatusCode::UNAUTHORIZED,
        Json(ApiError::new(ErrorCode::Unauthorized, "bad key")),
    ))
}

async fn list(State(svc): State<FakeService>, headers: HeaderMap) -> Reply<Json<Vec<Candidate>>> {
    guard(&headers)?;
    svc.store.list().await.map(Json).map_err(reject)
}

async fn create(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(candidate): Json<NewCandidate>,
) -> Reply<(axum::http::StatusCode, Json<Candidate>)> {
    guard(&headers)?;
    if candidate.role == "Forbidden" {
        return Err(reject(StoreError::Rejected("role is not open".into())));
    }
    let created = svc.store.create(candidate).await.map_err(reject)?;
    Ok((axum::http::StatusCode::CREATED, Json(created)))
}

async fn update(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Reply<Json<Candidate>> {
    guard(&headers)?;
    svc.store
        .update_status(&CandidateId(id), req.status)
        .await
        .map(Json)
        .map_err(reject)
}

async fn remove(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply<axum::http::StatusCode> {
    guard(&headers)?;
    svc.store.delete(&CandidateId(id)).await.map_err(reject)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn spawn_service() -> Url {
    let app = Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/candidates", get(list).post(create))
        .route("/candidates/:candidate_id", patch(update).delete(remove))
        .with_state(FakeService {
            store: Arc::new(MemoryStore::new()),
        });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}/")).expect("url")
}

fn client(store_url: Url, access_key: &str) -> HttpCandidateStore {
    HttpCandidateStore::new(&ClientConfig {
        store_url,
        access_key: access_key.to_string(),
    })
}

fn new_candidate(name: &str, role: &str) -> NewCandidate {
    NewCandidate {
        name: name.to_string(),
        role: role.to_string(),
        experience: 3.0,
        resume_link: None,
        status: CandidateStatus::Applied,
    }
}

#[tokio::test]
async fn round_trips_through_rest_service() {
    let store = client(spawn_service().await, KEY);
    store.health_check().await.expect("health");

    let ann = store
        .create(new_candidate("Ann", "Engineer"))
        .await
        .expect("create");
    let ben = store
        .create(new_candidate("Ben", "Designer"))
        .await
        .expect("create");

    let listed = store.list().await.expect("list");
    assert_eq!(listed.len(), 2);

    let moved = store
        .update_status(&ann.id, CandidateStatus::Interview)
        .await
        .expect("update");
    assert_eq!(moved.status, CandidateStatus::Interview);
    assert_eq!(moved.id, ann.id);

    store.delete(&ben.id).await.expect("delete");
    let remaining = store.list().await.expect("list");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, ann.id);
}

#[tokio::test]
async fn unknown_candidate_maps_to_not_found() {
    let store = client(spawn_service().await, KEY);
    let ghost = CandidateId::from("ghost");

    let err = store
        .update_status(&ghost, CandidateStatus::Offer)
        .await
        .expect_err("should fail");
    assert_eq!(err, StoreError::NotFound(ghost.clone()));

    let err = store.delete(&ghost).await.expect_err("should fail");
    assert_eq!(err, StoreError::NotFound(ghost));
}

#[tokio::test]
async fn refused_input_maps_to_rejected_with_service_message() {
    let store = client(spawn_service().await, KEY);
    let err = store
        .create(new_candidate("Ann", "Forbidden"))
        .await
        .expect_err("should fail");
    assert!(matches!(err, StoreError::Rejected(ref message) if message.contains("role is not open")));
}

#[tokio::test]
async fn wrong_access_key_is_unavailable() {
    let store = client(spawn_service().await, "wrong");
    let err = store.list().await.expect_err("should fail");
    assert!(matches!(err, StoreError::Unavailable(ref message) if message.contains("401")));
}

#[tokio::test]
async fn unreachable_service_is_unavailable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = client(Url::parse(&format!("http://{addr}")).expect("url"), KEY);
    let err = store.health_check().await.expect_err("should fail");
    assert!(matches!(err, StoreError::Unavailable(_)));
}
