//! Router and shared handler state

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use reviewer_core::{Error, PrRepo, PrUsecase, TeamRepo, TeamUsecase, UserRepo, UserUsecase};
use tower::timeout::error::Elapsed;
use tower::timeout::TimeoutLayer;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::handlers;

/// Use cases shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub teams: TeamUsecase,
    pub users: UserUsecase,
    pub prs: PrUsecase,
}

impl AppState {
    /// Wire the use cases on top of a set of repositories
    pub fn new(teams: Arc<dyn TeamRepo>, users: Arc<dyn UserRepo>, prs: Arc<dyn PrRepo>) -> Self {
        Self {
            teams: TeamUsecase::new(teams),
            users: UserUsecase::new(users.clone(), prs.clone()),
            prs: PrUsecase::new(users, prs),
        }
    }

    /// Use a single store for every repository
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TeamRepo + UserRepo + PrRepo + 'static,
    {
        Self::new(store.clone(), store.clone(), store)
    }
}

/// Build the service router.
///
/// Every request is traced and bounded by `request_timeout`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let routes = Router::new()
        .route("/team/add", post(handlers::add_team))
        .route("/team/get", get(handlers::get_team))
        .route("/users/setIsActive", post(handlers::set_is_active))
        .route("/users/getReview", get(handlers::get_review))
        .route("/pullRequest/create", post(handlers::create_pr))
        .route("/pullRequest/merge", post(handlers::merge_pr))
        .route("/pullRequest/reassign", post(handlers::reassign))
        .route("/stats", get(handlers::stats))
        .with_state(state);

    with_request_timeout(routes, request_timeout).layer(TraceLayer::new_for_http())
}

/// Answer with a `TIMEOUT` error once a request runs longer than `timeout`
pub fn with_request_timeout(app: Router, timeout: Duration) -> Router {
    app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(middleware_failed))
            .layer(TimeoutLayer::new(timeout)),
    )
}

async fn middleware_failed(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::Timeout
    } else {
        ApiError::Service(Error::Storage(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use reviewer_core::MemoryStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        router(
            AppState::from_store(Arc::new(MemoryStore::new())),
            Duration::from_secs(5),
        )
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    async fn get_path(app: &Router, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        send(app, req).await
    }

    async fn seed_backend(app: &Router) {
        let (status, _) = post_json(
            app,
            "/team/add",
            json!({
                "team_name": "backend",
                "members": [
                    {"user_id": "u1", "username": "Alice", "is_active": true},
                    {"user_id": "u2", "username": "Bob", "is_active": true},
                    {"user_id": "u3", "username": "Carol", "is_active": true},
                    {"user_id": "u4", "username": "Dave", "is_active": false}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_add_and_get_team() {
        let app = app();

        let (status, body) = post_json(
            &app,
            "/team/add",
            json!({
                "team_name": "core",
                "members": [
                    {"user_id": "u2", "username": "Bob", "is_active": false},
                    {"user_id": "u1", "username": "Alice", "is_active": true}
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["team"]["team_name"], "core");
        assert_eq!(body["team"]["members"][0]["user_id"], "u1");

        let (status, body) = get_path(&app, "/team/get?team_name=core").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["members"].as_array().unwrap().len(), 2);
        assert_eq!(body["members"][1]["is_active"], false);
    }

    #[tokio::test]
    async fn test_duplicate_team() {
        let app = app();
        let team = json!({"team_name": "core", "members": []});

        post_json(&app, "/team/add", team.clone()).await;
        let (status, body) = post_json(&app, "/team/add", team).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "TEAMEXISTS");
    }

    #[tokio::test]
    async fn test_missing_team() {
        let app = app();
        let (status, body) = get_path(&app, "/team/get?team_name=ghost").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOTFOUND");
        assert_eq!(body["error"]["message"], "resource not found");
    }

    #[tokio::test]
    async fn test_set_is_active() {
        let app = app();
        seed_backend(&app).await;

        let (status, body) = post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "u2", "is_active": false}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["team_name"], "backend");
        assert_eq!(body["user"]["is_active"], false);

        let (status, body) = post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "ghost", "is_active": true}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOTFOUND");
    }

    #[tokio::test]
    async fn test_pull_request_flow() {
        let app = app();
        seed_backend(&app).await;

        let (status, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "Add search", "author_id": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let pr = &body["pr"];
        assert_eq!(pr["status"], "OPEN");
        assert!(pr["merged_at"].is_null());
        assert!(pr["created_at"].is_string());
        let reviewers: Vec<String> = serde_json::from_value(pr["assigned_reviewers"].clone()).unwrap();
        assert_eq!(reviewers.len(), 2);
        assert!(!reviewers.contains(&"u1".to_string()));
        assert!(!reviewers.contains(&"u4".to_string()));

        let (status, body) = get_path(&app, &format!("/users/getReview?user_id={}", reviewers[0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pull_requests"][0]["pull_request_id"], "pr-1");

        // u2 and u3 are both reviewers and u4 is inactive, so there is nobody left
        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": reviewers[0]}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NOCANDIDATE");

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "NOTASSIGNED");

        let (status, body) =
            post_json(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pr"]["status"], "MERGED");
        let merged_at = body["pr"]["merged_at"].clone();
        assert!(merged_at.is_string());

        let (status, body) =
            post_json(&app, "/pullRequest/merge", json!({"pull_request_id": "pr-1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pr"]["merged_at"], merged_at);

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": reviewers[0]}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PRMERGED");

        let (status, body) = get_path(&app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"open": 0, "merged": 1}));
    }

    #[tokio::test]
    async fn test_reassign_picks_free_teammate() {
        let app = app();
        seed_backend(&app).await;
        post_json(
            &app,
            "/users/setIsActive",
            json!({"user_id": "u4", "is_active": true}),
        )
        .await;

        let (_, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "x", "author_id": "u1"}),
        )
        .await;
        let reviewers: Vec<String> =
            serde_json::from_value(body["pr"]["assigned_reviewers"].clone()).unwrap();

        let (status, body) = post_json(
            &app,
            "/pullRequest/reassign",
            json!({"pull_request_id": "pr-1", "old_user_id": reviewers[0]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let replaced_by = body["replaced_by"].as_str().unwrap();
        assert_ne!(replaced_by, "u1");
        assert!(!reviewers.iter().any(|r| r == replaced_by));

        let now: Vec<String> = serde_json::from_value(body["pr"]["assigned_reviewers"].clone()).unwrap();
        assert_eq!(now.len(), 2);
        assert!(!now.contains(&reviewers[0]));
        assert!(now.contains(&replaced_by.to_string()));
    }

    #[tokio::test]
    async fn test_create_pr_errors() {
        let app = app();
        seed_backend(&app).await;

        let (status, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": "pr-1", "pull_request_name": "x", "author_id": "ghost"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOTFOUND");

        let req = json!({"pull_request_id": "pr-1", "pull_request_name": "x", "author_id": "u1"});
        post_json(&app, "/pullRequest/create", req.clone()).await;
        let (status, body) = post_json(&app, "/pullRequest/create", req).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "PREXISTS");
    }

    #[tokio::test]
    async fn test_unknown_reviewer_has_no_reviews() {
        let app = app();
        let (status, body) = get_path(&app, "/users/getReview?user_id=nobody").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_id"], "nobody");
        assert_eq!(body["pull_requests"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_requests() {
        let app = app();

        let req = Request::builder()
            .method("POST")
            .uri("/pullRequest/merge")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");

        let (status, body) = get_path(&app, "/team/get").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_error_body() {
        let slow = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "done"
            }),
        );
        let app = with_request_timeout(slow, Duration::from_millis(50));

        let (status, body) = get_path(&app, "/slow").await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"]["code"], "TIMEOUT");
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let app = app();
        let (status, body) = get_path(&app, "/stats").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"open": 0, "merged": 0}));
    }
}
