// src/lib.rs

use std::time::Duration;

use axum::{
    http::StatusCode,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod services;

use crate::config::AppState;

/// Monta o router completo. O timeout derruba o future do handler, e com ele
/// a transação aberta (rollback).
pub fn app(app_state: AppState, request_timeout: Duration) -> Router {
    let product_routes = Router::new()
        .route("/"
               ,post(handlers::products::create_product)
               .get(handlers::products::list_products)
        )
        .route("/{id}"
               ,get(handlers::products::get_product)
               .put(handlers::products::update_product)
               .delete(handlers::products::delete_product)
        )
        .route("/{id}/ledger-balance"
               ,get(handlers::products::ledger_balance)
        )
        .route("/{id}/components"
               ,get(handlers::kit_components::list_components)
               .post(handlers::kit_components::add_component)
        );

    let component_routes = Router::new()
        .route("/{id}"
               ,put(handlers::kit_components::update_component)
               .delete(handlers::kit_components::remove_component)
        );

    let movement_routes = Router::new()
        .route("/"
               ,get(handlers::movements::list_movements)
               .post(handlers::movements::record_movement)
        );

    let order_routes = Router::new()
        .route("/"
               ,post(handlers::production_orders::create_order)
               .get(handlers::production_orders::list_orders)
        )
        .route("/financials"
               ,get(handlers::production_orders::financials)
        )
        .route("/{id}"
               ,get(handlers::production_orders::get_order)
        )
        .route("/{id}/movements"
               ,get(handlers::production_orders::order_movements)
        )
        .route("/{id}/status"
               ,patch(handlers::production_orders::update_status)
        )
        .route("/{id}/add-progress"
               ,post(handlers::production_orders::add_progress)
        )
        .route("/{id}/deliver"
               ,post(handlers::production_orders::deliver)
        );

    let public_routes = Router::new()
        .route("/inventory", get(handlers::public::inventory))
        .route("/sales-history", get(handlers::public::sales_history));

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .nest("/api/products", product_routes)
        .nest("/api/components", component_routes)
        .nest("/api/inventory-movements", movement_routes)
        .nest("/api/production-orders", order_routes)
        .nest("/api/public", public_routes)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
