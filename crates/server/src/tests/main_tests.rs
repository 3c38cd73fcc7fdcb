use super::*;
use axum::{body, body::Body, http::Request as HttpRequest};
use shared::domain::CandidateStatus;
use tower::ServiceExt;

const KEY: &str = "test-access-key";

async fn test_app() -> Router {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    build_router(Arc::new(AppState {
        api: ApiContext {
            store: Arc::new(storage),
        },
        access_key: KEY.to_string(),
    }))
}

async fn json_body<T: serde::de::DeserializeOwned>(response: Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn create_request(name: &str, role: &str) -> HttpRequest<Body> {
    HttpRequest::post("/candidates")
        .header(ACCESS_KEY_HEADER, KEY)
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "name": name,
                "role": role,
                "experience": 4,
                "resume_link": "",
            })
            .to_string(),
        ))
        .expect("request")
}

#[tokio::test]
async fn healthz_is_open_and_reports_ok() {
    let app = test_app().await;
    let request = HttpRequest::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn candidate_routes_require_access_key() {
    let app = test_app().await;

    let missing = HttpRequest::get("/candidates")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(missing).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let wrong = HttpRequest::get("/candidates")
        .header(ACCESS_KEY_HEADER, "nope")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(wrong).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bearer = HttpRequest::get("/candidates")
        .header("authorization", format!("Bearer {KEY}"))
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(bearer).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_list_move_and_delete_round_trip() {
    let app = test_app().await;

    let response = app
        .clone()
        .oneshot(create_request("Ann", "Engineer"))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::CREATED);
    let ann: Candidate = json_body(response).await;
    assert_eq!(ann.status, CandidateStatus::Applied);
    assert_eq!(ann.resume_link, None);

    let response = app
        .clone()
        .oneshot(create_request("Ben", "Designer"))
        .await
        .expect("create");
    let ben: Candidate = json_body(response).await;

    let list = HttpRequest::get("/candidates")
        .header(ACCESS_KEY_HEADER, KEY)
        .body(Body::empty())
        .expect("request");
    let listed: Vec<Candidate> = json_body(app.clone().oneshot(list).await.expect("list")).await;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, ben.id);

    let patch = HttpRequest::patch(format!("/candidates/{}", ann.id))
        .header(ACCESS_KEY_HEADER, KEY)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status":"offer"}"#))
        .expect("request");
    let response = app.clone().oneshot(patch).await.expect("patch");
    assert_eq!(response.status(), StatusCode::OK);
    let moved: Candidate = json_body(response).await;
    assert_eq!(moved.status, CandidateStatus::Offer);
    assert!(moved.updated_at > ann.updated_at);

    let delete = HttpRequest::delete(format!("/candidates/{}", ben.id))
        .header(ACCESS_KEY_HEADER, KEY)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(delete).await.expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let analytics = HttpRequest::get("/analytics")
        .header(ACCESS_KEY_HEADER, KEY)
        .body(Body::empty())
        .expect("request");
    let summary: Analytics = json_body(app.oneshot(analytics).await.expect("analytics")).await;
    assert_eq!(summary.total_candidates, 1);
    assert_eq!(summary.offers(), 1);
    assert_eq!(summary.conversion_rate(), 100);
}

#[tokio::test]
async fn unknown_candidate_maps_to_not_found() {
    let app = test_app().await;

    let delete = HttpRequest::delete("/candidates/missing")
        .header(ACCESS_KEY_HEADER, KEY)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(delete).await.expect("delete");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::NotFound);

    let patch = HttpRequest::patch("/candidates/missing")
        .header(ACCESS_KEY_HEADER, KEY)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"status":"interview"}"#))
        .expect("request");
    let response = app.oneshot(patch).await.expect("patch");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_form_is_unprocessable() {
    let app = test_app().await;
    let response = app
        .oneshot(create_request("A", "Engineer"))
        .await
        .expect("create");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let err: ApiError = json_body(response).await;
    assert_eq!(err.code, ErrorCode::Validation);
}
