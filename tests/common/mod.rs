#![allow(dead_code)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use kit_ledger::config::AppState;

/// Router completo sobre o store em memória, exercitado sem abrir socket.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::in_memory();
        let router = kit_ledger::app(state.clone(), Duration::from_secs(30));
        Self { router, state }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Cria um produto e devolve o id.
    pub async fn seed_product(&self, name: &str, is_kit: bool, stock: i32) -> String {
        let category = if is_kit { "Kit Terminado" } else { "Insumo" };
        let (status, body) = self
            .post(
                "/api/products",
                json!({
                    "name": name,
                    "category": category,
                    "unit_of_measure": "Pieza",
                    "stock": stock,
                    "is_kit": is_kit,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed product failed: {body}");
        body["id"].as_str().expect("product id").to_string()
    }

    pub async fn seed_component(&self, kit_id: &str, component_id: &str, quantity_required: f64) {
        let (status, body) = self
            .post(
                &format!("/api/products/{kit_id}/components"),
                json!({
                    "component_product_id": component_id,
                    "quantity_required": quantity_required,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed component failed: {body}");
    }

    pub async fn seed_order(&self, kit_id: &str, quantity_requested: i32) -> String {
        let (status, body) = self
            .post(
                "/api/production-orders",
                json!({ "product_id": kit_id, "quantity_requested": quantity_requested }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "seed order failed: {body}");
        body["id"].as_str().expect("order id").to_string()
    }

    pub async fn stock_of(&self, product_id: &str) -> i64 {
        let (status, body) = self.get(&format!("/api/products/{product_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["stock"].as_i64().expect("stock")
    }

    pub async fn order_movement_count(&self, order_id: &str) -> usize {
        let (status, body) = self.get(&format!("/api/production-orders/{order_id}/movements")).await;
        assert_eq!(status, StatusCode::OK);
        body.as_array().expect("movements array").len()
    }

    pub async fn assert_ledger_in_sync(&self, product_id: &str) {
        let (status, body) = self.get(&format!("/api/products/{product_id}/ledger-balance")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["in_sync"], json!(true), "ledger drift: {body}");
    }
}
