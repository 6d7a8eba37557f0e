#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use packing_report_api::{app_router, config::AppConfig, db, events, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // One pooled connection keeps the in-memory database alive for the whole test.
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.db_idle_timeout_secs = 3_600;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_sender, event_rx) = events::channel(256);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(Arc::new(pool), cfg, Some(Arc::new(event_sender)));
        let router = app_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn create_client(&self, name: &str) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/api/v1/clients",
                Some(json!({ "name": name, "address": format!("{} Mill Road, Surat", name) })),
            )
            .await;
        assert_eq!(response.status(), 201, "client {} should be created", name);
        response_json(response).await["data"]["id"]
            .as_i64()
            .expect("client id")
    }

    pub async fn create_quality(&self, name: &str, denier: i32) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/api/v1/qualities",
                Some(json!({
                    "name": name,
                    "denier": denier,
                    "blend": "2000",
                    "shadeNumber": "S001"
                })),
            )
            .await;
        assert_eq!(response.status(), 201, "quality {} should be created", name);
        response_json(response).await["data"]["id"]
            .as_i64()
            .expect("quality id")
    }

    /// Creates a report and returns the `data` member of the response.
    pub async fn create_report(&self, payload: Value) -> Value {
        let response = self
            .request(Method::POST, "/api/v1/reports", Some(payload))
            .await;
        let status = response.status();
        let body = response_json(response).await;
        assert_eq!(status, 201, "report should be created: {}", body);
        body["data"].clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

pub async fn response_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Reads a decimal that the API serializes as a string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {}", value))
        .parse()
        .expect("decimal")
}

/// Report header with the given items as `(bagNo, gross, tare)`.
pub fn report_payload(client_id: i64, report_date: &str, items: &[(i32, &str, &str)]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|(bag_no, gross, tare)| {
            json!({
                "bagNo": bag_no,
                "grossWeight": gross,
                "tareWeight": tare,
                "cones": 12
            })
        })
        .collect();

    json!({
        "report": {
            "clientId": client_id,
            "reportDate": report_date,
            "qualityName": "Rct 277",
            "denier": 200,
            "blend": "2000",
            "lotNumber": 7,
            "shadeNumber": "S001"
        },
        "items": items
    })
}
