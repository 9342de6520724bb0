//! Axum router configuration with middleware.
//!
//! Middleware: CORS (configured origins), request tracing.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health))
        // Catalog
        .route(
            "/cars",
            get(handlers::car::list_cars).post(handlers::car::create_car),
        )
        .route("/cars/compare", post(handlers::car::compare_cars))
        .route(
            "/cars/{id}",
            get(handlers::car::get_car)
                .put(handlers::car::update_car)
                .delete(handlers::car::delete_car),
        )
        // Chat
        .route("/chat", post(handlers::chat::chat))
        .route("/chat/health", get(handlers::health::chat_health))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use caradvisor_core::llm::box_provider::BoxLlmProvider;
    use caradvisor_core::llm::provider::LlmProvider;
    use caradvisor_infra::catalog::CatalogStore;
    use caradvisor_types::config::{AppConfig, DatabaseSection};
    use caradvisor_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

    /// Replays canned completions in order.
    struct CannedLlm(Mutex<VecDeque<String>>);

    impl LlmProvider for CannedLlm {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let content = self.0.lock().unwrap().pop_front().ok_or(LlmError::Provider {
                message: "no canned reply left".to_string(),
            })?;
            Ok(CompletionResponse {
                id: "canned".to_string(),
                content,
                model: request.model.clone(),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    async fn make_app(replies: &[&str]) -> (tempfile::TempDir, Router) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            database: DatabaseSection {
                url: format!("sqlite://{}?mode=rwc", dir.path().join("cars.db").display()),
                ..Default::default()
            },
            ..Default::default()
        };
        let store = CatalogStore::connect(&config.database).await.unwrap();
        let llm = CannedLlm(Mutex::new(replies.iter().map(|r| r.to_string()).collect()));
        let state = AppState::new(&config, store, BoxLlmProvider::new(llm));
        (dir, build_router(state, &config.server.cors_origins))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn new_car(brand: &str, color: &str, price: f64, fuel: &str) -> Value {
        json!({
            "brand": brand,
            "model": "Test",
            "year": 2022,
            "price": price,
            "fuel_type": fuel,
            "transmission": "manual",
            "seats": 5,
            "doors": 5,
            "color": color,
        })
    }

    async fn create(app: &Router, car: Value) -> String {
        let resp = app.clone().oneshot(json_request("POST", "/cars", car)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (_dir, app) = make_app(&[]).await;

        let resp = app.clone().oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");

        let resp = app.clone().oneshot(get("/health")).await.unwrap();
        let health = body_json(resp).await;
        assert_eq!(health["status"], "ok");
        assert_eq!(health["database"], "connected");

        let resp = app.oneshot(get("/chat/health")).await.unwrap();
        assert_eq!(body_json(resp).await["service"], "chat");
    }

    #[tokio::test]
    async fn test_car_crud_lifecycle() {
        let (_dir, app) = make_app(&[]).await;
        let id = create(&app, new_car("Renault", "red", 15_000.0, "petrol")).await;

        let resp = app.clone().oneshot(get(&format!("/cars/{id}"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let car = body_json(resp).await;
        assert_eq!(car["data"]["brand"], "Renault");
        assert_eq!(car["data"]["price"], 15_000.0);
        assert!(car["meta"]["request_id"].is_string());

        let resp = app
            .clone()
            .oneshot(json_request("PUT", &format!("/cars/{id}"), json!({"price": 14_000})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["data"]["price"], 14_000.0);

        let resp = app
            .clone()
            .oneshot(Request::delete(format!("/cars/{id}")).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get(&format!("/cars/{id}"))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(resp).await["errors"][0]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_get_with_invalid_id_is_not_found() {
        let (_dir, app) = make_app(&[]).await;
        let resp = app.oneshot(get("/cars/not-a-uuid")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_with_query_filters() {
        let (_dir, app) = make_app(&[]).await;
        create(&app, new_car("Renault", "red", 15_000.0, "petrol")).await;
        create(&app, new_car("Tesla", "red", 42_000.0, "electric")).await;
        create(&app, new_car("Peugeot", "blue", 18_000.0, "diesel")).await;

        let resp = app.clone().oneshot(get("/cars")).await.unwrap();
        assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 3);

        let resp = app
            .clone()
            .oneshot(get("/cars?max_price=20000&brand=renault"))
            .await
            .unwrap();
        let cars = body_json(resp).await;
        assert_eq!(cars["data"].as_array().unwrap().len(), 1);
        assert_eq!(cars["data"][0]["brand"], "Renault");

        let resp = app.oneshot(get("/cars?fuel_type=steam")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_rejects_non_finite_and_negative_prices() {
        let (_dir, app) = make_app(&[]).await;
        create(&app, new_car("Renault", "red", 15_000.0, "petrol")).await;

        for uri in [
            "/cars?min_price=NaN",
            "/cars?max_price=inf&min_price=-inf",
            "/cars?max_price=-5",
            "/cars?min_seats=12",
        ] {
            let resp = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_payloads() {
        let (_dir, app) = make_app(&[]).await;

        let resp = app
            .clone()
            .oneshot(json_request("POST", "/cars", new_car("Fiat", "red", -5.0, "petrol")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(json_request("POST", "/cars", json!({"brand": "Fiat"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_compare_cars() {
        let (_dir, app) = make_app(&[]).await;
        let a = create(&app, new_car("Renault", "red", 15_000.0, "petrol")).await;
        let b = create(&app, new_car("Tesla", "white", 42_000.0, "electric")).await;

        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/cars/compare",
                json!({"car_ids": [a, b], "priority_columns": ["price", "fuel_type"]}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let comparison = body_json(resp).await;
        assert_eq!(comparison["data"]["comparison_count"], 2);
        assert_eq!(comparison["data"]["table"][0]["column"], "price");

        let resp = app
            .oneshot(json_request("POST", "/cars/compare", json!({"car_ids": [a]})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_red_car_under_budget() {
        let (_dir, app) = make_app(&[
            r#"{"color": "red", "max_price": 20000}"#,
            "I found one red car under 20,000 euros: the Renault Test.",
        ])
        .await;
        create(&app, new_car("Renault", "red", 15_000.0, "petrol")).await;
        create(&app, new_car("Tesla", "red", 42_000.0, "electric")).await;
        create(&app, new_car("Peugeot", "blue", 18_000.0, "diesel")).await;

        let resp = app
            .oneshot(json_request(
                "POST",
                "/chat",
                json!({"message": "I want a red car under 20000"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let reply = body_json(resp).await;
        let data = &reply["data"];
        assert_eq!(data["cars_found"], 1);
        assert_eq!(data["cars"][0]["brand"], "Renault");
        assert_eq!(data["degraded"], false);
        assert_eq!(data["history"].as_array().unwrap().len(), 1);
        assert_eq!(data["history"][0]["user"], "I want a red car under 20000");
    }

    #[tokio::test]
    async fn test_chat_manual_filter_wins() {
        let (_dir, app) = make_app(&[r#"{"fuel_type": "diesel"}"#, "Here are the electric cars."]).await;
        create(&app, new_car("Tesla", "red", 42_000.0, "electric")).await;
        create(&app, new_car("Peugeot", "blue", 18_000.0, "diesel")).await;

        let resp = app
            .oneshot(json_request(
                "POST",
                "/chat",
                json!({"message": "a diesel please", "active_filters": {"fuel_type": "electric"}}),
            ))
            .await
            .unwrap();
        let data = body_json(resp).await["data"].clone();
        assert_eq!(data["filters_applied"]["fuel_type"], "electric");
        assert_eq!(data["cars"][0]["brand"], "Tesla");
    }

    #[tokio::test]
    async fn test_chat_extraction_failure_is_bad_gateway() {
        let (_dir, app) = make_app(&[]).await;
        let resp = app
            .oneshot(json_request("POST", "/chat", json!({"message": "anything electric?"})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await["errors"][0]["code"], "EXTERNAL_SERVICE_ERROR");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message() {
        let (_dir, app) = make_app(&[]).await;
        let resp = app
            .oneshot(json_request("POST", "/chat", json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
