use std::time::Duration;

use axum::{
    http::{header, Method, StatusCode},
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{
    handlers::{
        health::{healthz, livez, readyz},
        subscriptions::{ping, stats, subscribe, unsubscribe},
    },
    state::AppState,
};

/// Create the application router with all routes and middleware.
pub fn create_app(state: AppState) -> Router {
    // CORS configuration so the website can call the API from the browser
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(ping))
        .route("/subscribe", put(subscribe))
        .route("/unsubscribe", get(unsubscribe))
        .route("/stats", get(stats))
        .route("/livez", get(livez))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(10),
        ))
        .with_state(state)
}

#[cfg(all(test, feature = "memory"))]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;
    use uuid::Uuid;

    use newsletter_core::subscription;

    use crate::challenge::{ChallengeError, ChallengeVerifier};

    /// Verifier that answers every token with the same score.
    struct FixedScoreVerifier(f32);

    #[async_trait]
    impl ChallengeVerifier for FixedScoreVerifier {
        async fn verify(&self, _token: &str) -> Result<f32, ChallengeError> {
            Ok(self.0)
        }
    }

    fn subscribe_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri("/subscribe")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // ==================== Ping Tests ====================

    #[tokio::test]
    async fn test_ping() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["message"], "pong");
    }

    // ==================== Subscribe Tests ====================

    #[tokio::test]
    async fn test_subscribe_stores_subscription() {
        let state = AppState::default();
        let app = create_app(state.clone());

        let response = app
            .oneshot(subscribe_request(json!({
                "emailAddress": "reader@example.com",
                "recaptchaChallengeToken": "token"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let stored = subscription::find(state.store.as_ref(), "reader@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.email_address, "reader@example.com");
        assert!(!stored.is_confirmed);

        let count = subscription::count(state.store.as_ref()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_subscribe_twice_returns_ok() {
        let state = AppState::default();
        let app = create_app(state.clone());

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(subscribe_request(json!({
                    "emailAddress": "reader@example.com",
                    "recaptchaChallengeToken": "token"
                })))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
        }

        let count = subscription::count(state.store.as_ref()).await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_invalid_email() {
        let state = AppState::default();
        let app = create_app(state.clone());

        let response = app
            .oneshot(subscribe_request(json!({
                "emailAddress": "not-an-email",
                "recaptchaChallengeToken": "token"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let count = subscription::count(state.store.as_ref()).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_subscribe_rejects_empty_token() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(subscribe_request(json!({
                "emailAddress": "reader@example.com",
                "recaptchaChallengeToken": ""
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_subscribe_drops_low_scores() {
        let state = AppState::with_verifier(Arc::new(FixedScoreVerifier(0.1)));
        let app = create_app(state.clone());

        let response = app
            .oneshot(subscribe_request(json!({
                "emailAddress": "bot@example.com",
                "recaptchaChallengeToken": "token"
            })))
            .await
            .unwrap();

        // The caller cannot tell a dropped request from a stored one.
        assert_eq!(response.status(), StatusCode::OK);

        let stored = subscription::find(state.store.as_ref(), "bot@example.com")
            .await
            .unwrap();
        assert!(stored.is_none());
    }

    // ==================== Unsubscribe Tests ====================

    #[tokio::test]
    async fn test_unsubscribe_removes_subscription() {
        let state = AppState::default();
        let app = create_app(state.clone());

        let created = subscription::create(state.store.as_ref(), "reader@example.com")
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/unsubscribe?id={}&emailAddress=reader@example.com",
                        created.id
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("successfully unsubscribed"));

        let stored = subscription::find(state.store.as_ref(), "reader@example.com")
            .await
            .unwrap();
        assert!(stored.is_none());

        let count = subscription::count(state.store.as_ref()).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_subscription_still_succeeds() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/unsubscribe?id={}&emailAddress=gone@example.com",
                        Uuid::new_v4()
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = body_string(response).await;
        assert!(html.contains("successfully unsubscribed"));
    }

    #[tokio::test]
    async fn test_unsubscribe_requires_matching_id() {
        let state = AppState::default();
        let app = create_app(state.clone());

        subscription::create(state.store.as_ref(), "reader@example.com")
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!(
                        "/unsubscribe?id={}&emailAddress=reader@example.com",
                        Uuid::new_v4()
                    ))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        // The id did not match, so the subscription is untouched.
        let stored = subscription::find(state.store.as_ref(), "reader@example.com")
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_unsubscribe_missing_id() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/unsubscribe?emailAddress=reader@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_string(response).await;
        assert!(html.contains("required query parameter id is missing"));
    }

    #[tokio::test]
    async fn test_unsubscribe_missing_email() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/unsubscribe?id={}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let html = body_string(response).await;
        assert!(html.contains("required query parameter emailAddress is missing"));
    }

    #[tokio::test]
    async fn test_unsubscribe_rejects_malformed_id() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/unsubscribe?id=not-a-uuid&emailAddress=reader@example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ==================== Stats Tests ====================

    #[tokio::test]
    async fn test_stats_counts_subscriptions() {
        let state = AppState::default();
        let app = create_app(state.clone());

        subscription::create(state.store.as_ref(), "first@example.com")
            .await
            .unwrap();
        subscription::create(state.store.as_ref(), "second@example.com")
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["subscriptions"], 2);
    }

    // ==================== Health Tests ====================

    #[tokio::test]
    async fn test_livez() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/livez")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readyz_reports_ready() {
        let state = AppState::default();
        let app = create_app(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/readyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["ready"], true);
        assert_eq!(json["subscriptions"], 0);
    }
}
