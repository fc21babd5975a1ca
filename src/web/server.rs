use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::{api, AppState};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Front-end page
        .route("/", get(api::index))
        // API endpoints
        .route("/predict", post(api::predict))
        .route("/api/health", get(api::health_check))
        .layer(cors)
        .with_state(state)
}

/// Serve until the process is stopped. Call only once the predictor is ready.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let host = state.config.host.clone();
    let port = state.config.port;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("House price service listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::ml::{FileModelStore, Predictor, TrainingSource};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn ready_state(dir: &TempDir) -> AppState {
        let store = FileModelStore::new(dir.path().join("model.json"));
        let mut predictor = Predictor::new(Box::new(store), TrainingSource::Bundled);
        predictor.bootstrap().unwrap();
        AppState::new(predictor, ServiceConfig::default())
    }

    fn unloaded_state(dir: &TempDir) -> AppState {
        let store = FileModelStore::new(dir.path().join("model.json"));
        let predictor = Predictor::new(Box::new(store), TrainingSource::Bundled);
        AppState::new(predictor, ServiceConfig::default())
    }

    async fn post_predict(app: Router, body: impl Into<Body>) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(body.into())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn house() -> Value {
        json!({
            "square_feet": 2000,
            "bedrooms": 3,
            "bathrooms": 2,
            "age_years": 10,
            "garage_spaces": 2,
            "location_score": 7
        })
    }

    #[tokio::test]
    async fn test_predict_success() {
        let dir = TempDir::new().unwrap();
        let app = router(ready_state(&dir));

        let (status, body) = post_predict(app, house().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        let price = body["predicted_price"].as_f64().unwrap();
        assert!(price > 0.0);
        assert_eq!((price * 100.0).round() / 100.0, price);
        assert_eq!(body["metadata"], house());
    }

    #[tokio::test]
    async fn test_predict_square_feet_below_minimum() {
        let dir = TempDir::new().unwrap();
        let mut payload = house();
        payload["square_feet"] = json!(100);

        let (status, body) = post_predict(router(ready_state(&dir)), payload.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({
            "success": false,
            "error": "Square footage must be between 500 and 10,000"
        }));
    }

    #[tokio::test]
    async fn test_predict_rejects_each_field_outside_range() {
        let dir = TempDir::new().unwrap();
        let app = router(ready_state(&dir));
        let cases = [
            ("square_feet", json!(499), json!(10001), "Square footage must be between 500 and 10,000"),
            ("bedrooms", json!(0), json!(11), "Bedrooms must be between 1 and 10"),
            ("bathrooms", json!(0), json!(9), "Bathrooms must be between 1 and 8"),
            ("age_years", json!(-1), json!(101), "Age must be between 0 and 100 years"),
            ("garage_spaces", json!(-1), json!(5), "Garage spaces must be between 0 and 4"),
            ("location_score", json!(0), json!(11), "Location score must be between 1 and 10"),
        ];

        for (field, below, above, message) in cases {
            for bad in [below, above] {
                let mut payload = house();
                payload[field] = bad.clone();

                let (status, body) = post_predict(app.clone(), payload.to_string()).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "{} = {}", field, bad);
                assert_eq!(body, json!({ "success": false, "error": message }));
            }
        }
    }

    #[tokio::test]
    async fn test_predict_missing_field() {
        let dir = TempDir::new().unwrap();
        let mut payload = house();
        payload.as_object_mut().unwrap().remove("bedrooms");

        let (status, body) = post_predict(router(ready_state(&dir)), payload.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input format"));
    }

    #[tokio::test]
    async fn test_predict_malformed_json() {
        let dir = TempDir::new().unwrap();
        let (status, body) = post_predict(router(ready_state(&dir)), "{\"square_feet\": ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input format"));
    }

    #[tokio::test]
    async fn test_predict_without_model_is_opaque_500() {
        let dir = TempDir::new().unwrap();
        let (status, body) = post_predict(router(unloaded_state(&dir)), house().to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({
            "success": false,
            "error": "An internal server error occurred"
        }));
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let dir = TempDir::new().unwrap();
        let response = router(ready_state(&dir))
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["model"]["status"], json!("ready"));
        assert!(body["model"]["samples"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_index_page() {
        let dir = TempDir::new().unwrap();
        let response = router(unloaded_state(&dir))
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("House Price Estimator"));
    }
}
