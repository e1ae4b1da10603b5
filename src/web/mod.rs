pub mod error;
pub mod routes;
pub mod views;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::{AppState, health_handler, index_handler, report_api_handler, report_page_handler, usage_handler};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(index_handler))
        .route("/report", post(report_page_handler))
        .route("/api/report", post(report_api_handler))
        .route("/api/usage", get(usage_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let app = router(state);

    let address = format!("{host}:{port}");
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!("Server running on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::emissions::tests::FakeApi;
    use crate::footprint::usage::{MemoryUsageStore, UsageStore, today};
    use crate::report::tests::{FakeLlm, service};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app(api: FakeApi, llm: FakeLlm, usage: Arc<MemoryUsageStore>) -> Router {
        let state = AppState {
            service: service(api, Arc::new(llm), usage),
        };
        router(Arc::new(state))
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/report")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let app = app(FakeApi::ok(0.4), FakeLlm::replying("tip"), Arc::default());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("<form method=\"post\" action=\"/report\">"));
        assert!(page.contains("Enter details in the form"));
    }

    #[tokio::test]
    async fn test_form_submission_renders_report() {
        let usage = Arc::new(MemoryUsageStore::new());
        let app = app(FakeApi::ok(0.4), FakeLlm::replying("Take the train & save."), usage.clone());

        let response = app
            .oneshot(form_request(
                "nickname=Kai&region=Oslo&family_size=2&energy_kwh=250&renewable_ratio=40\
                 &water_liters=5000&commute_km=100&transport_mode=bus&weekly_waste_kg=3\
                 &recycle=plastic&recycle=glass",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(page.contains("Carbon Footprint Breakdown"));
        assert!(page.contains("100.00 kg"));
        assert!(page.contains("12.00 kg"));
        assert!(page.contains("Take the train &amp; save."));
        assert_eq!(usage.today_count(today()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_is_rejected() {
        let app = app(FakeApi::ok(0.4), FakeLlm::replying("tip"), Arc::default());

        let response = app.oneshot(form_request("nickname=Kai&commute_km=-5")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let page = body_text(response).await;
        assert!(page.contains("commute_km must not be negative"));
        assert!(page.contains("value=\"Kai\""));
    }

    #[tokio::test]
    async fn test_json_api() {
        let app = app(FakeApi::failing(), FakeLlm::failing(), Arc::default());

        let request = Request::builder()
            .method("POST")
            .uri("/api/report")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "nickname": "Kai", "energy_kwh": 10.0, "transport_mode": "train" }).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let report: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(report["breakdown"]["energy_kg"], 5.0);
        assert_eq!(report["breakdown"]["source"], "api_unavailable");
        assert_eq!(report["input"]["region"], "an unspecified region");
        assert!(report["tips"].is_null());
        assert!(report["tips_error"].as_str().unwrap().starts_with("Error generating tips"));
    }

    #[tokio::test]
    async fn test_json_api_validation() {
        let app = app(FakeApi::ok(0.4), FakeLlm::replying("tip"), Arc::default());

        let request = Request::builder()
            .method("POST")
            .uri("/api/report")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "family_size": 0 }).to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Invalid input: family_size must be at least 1");
    }

    #[tokio::test]
    async fn test_json_api_rejects_mistyped_body() {
        let cases = [
            json!({ "renewable_ratio": 300 }).to_string(),
            json!({ "family_size": -1 }).to_string(),
            "{ not json".to_string(),
        ];
        for body in cases {
            let app = app(FakeApi::ok(0.4), FakeLlm::replying("tip"), Arc::default());
            let request = Request::builder()
                .method("POST")
                .uri("/api/report")
                .header("content-type", "application/json")
                .body(Body::from(body.clone()))
                .unwrap();
            let response = app.oneshot(request).await.unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
            let error: Value = serde_json::from_str(&body_text(response).await).unwrap();
            assert!(
                error["error"].as_str().unwrap().starts_with("Invalid request body"),
                "{body}: {error}"
            );
        }
    }

    #[tokio::test]
    async fn test_usage_endpoint() {
        let usage = Arc::new(MemoryUsageStore::new());
        usage.try_reserve(today(), 3).await.unwrap();
        let app = app(FakeApi::ok(0.4), FakeLlm::replying("tip"), usage);

        let response = app
            .oneshot(Request::builder().uri("/api/usage").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["count"], 1);
        assert_eq!(body["limit"], 3);
        assert_eq!(body["remaining"], 2);
        assert_eq!(body["store"], "memory");
    }
}
