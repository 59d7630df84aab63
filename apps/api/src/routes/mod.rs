pub mod health;

use anyhow::{Context, Result};
use axum::{http::HeaderValue, routing::get, Router};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::candidates::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/all-candidates",
            get(handlers::handle_all_candidates),
        )
        .with_state(state)
}

/// CORS for the configured browser origins. A lone `*` allows any origin,
/// without credentials.
pub fn build_cors(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::db::testing::StaticRowFetcher;
    use crate::db::RowFetcher;
    use crate::models::candidate::RawRow;

    fn app(fetcher: StaticRowFetcher) -> Router {
        let config = Config::from_lookup(|_| None).unwrap();
        let fetcher: Arc<dyn RowFetcher> = Arc::new(fetcher);
        build_router(AppState { fetcher, config })
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn sample_row() -> RawRow {
        match json!({
            "user_id": 1,
            "name": "Ana",
            "skills": "[\"Go\",\"Rust\"]",
            "availability": "88",
            "grade": "L4",
            "email": "a@x.com"
        }) {
            Value::Object(map) => RawRow::from(map),
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_root_health_check() {
        let (status, body) = get_json(app(StaticRowFetcher::failing()), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "service": "Smart-Assign API (DB)"}));
    }

    #[tokio::test]
    async fn test_all_candidates_returns_canonical_records() {
        let (status, body) = get_json(
            app(StaticRowFetcher::with_rows(vec![sample_row()])),
            "/api/all-candidates",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "user_id": 1,
                "full_name": "Ana",
                "user_name": "Ana",
                "email": "a@x.com",
                "department": "L4",
                "country": null,
                "latest_cv_title": null,
                "skills": "Go, Rust",
                "availability": 88,
                "clearance": null
            }])
        );
    }

    #[tokio::test]
    async fn test_all_candidates_rejects_negative_limit() {
        let (status, body) = get_json(
            app(StaticRowFetcher::with_rows(Vec::new())),
            "/api/all-candidates?limit=-1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_all_candidates_database_failure_is_server_error() {
        let (status, body) =
            get_json(app(StaticRowFetcher::failing()), "/api/all-candidates").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    }

    #[test]
    fn test_cors_accepts_configured_origins() {
        assert!(build_cors(&["http://localhost:4200".to_string()]).is_ok());
        assert!(build_cors(&["*".to_string()]).is_ok());
        assert!(build_cors(&["bad\norigin".to_string()]).is_err());
    }
}
