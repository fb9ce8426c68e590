// src/docs.rs

use axum::Json;
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Produtos ---
        handlers::products::create_product,
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,
        handlers::products::delete_product,
        handlers::products::ledger_balance,

        // --- Kits ---
        handlers::kit_components::list_components,
        handlers::kit_components::add_component,
        handlers::kit_components::update_component,
        handlers::kit_components::remove_component,

        // --- Movimentações ---
        handlers::movements::list_movements,
        handlers::movements::record_movement,

        // --- Produção ---
        handlers::production_orders::create_order,
        handlers::production_orders::list_orders,
        handlers::production_orders::financials,
        handlers::production_orders::get_order,
        handlers::production_orders::order_movements,
        handlers::production_orders::update_status,
        handlers::production_orders::add_progress,
        handlers::production_orders::deliver,

        // --- Público ---
        handlers::public::inventory,
        handlers::public::sales_history,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::catalog::ProductCategory,
            models::catalog::UnitOfMeasure,
            models::catalog::Product,
            models::catalog::LedgerBalance,

            // --- Kits ---
            models::kit::KitComponent,
            models::kit::KitComponentDetail,

            // --- Livro-razão ---
            models::ledger::MovementType,
            models::ledger::ReferenceKind,
            models::ledger::MovementReference,
            models::ledger::InventoryMovement,
            models::ledger::MovementDetail,
            models::ledger::DailySales,
            models::ledger::PublicSaleEntry,

            // --- Produção ---
            models::production::OrderStatus,
            models::production::ProductionOrder,
            models::production::ProductionOrderDetail,
            models::production::ActiveOrderSummary,
            models::production::PublicInventoryEntry,

            // --- Payloads ---
            handlers::products::ProductPayload,
            handlers::kit_components::AddComponentPayload,
            handlers::kit_components::UpdateComponentPayload,
            handlers::movements::ManualMovementPayload,
            handlers::production_orders::CreateOrderPayload,
            handlers::production_orders::UpdateStatusPayload,
            handlers::production_orders::AddProgressPayload,
            handlers::production_orders::DeliverPayload,
        )
    ),
    tags(
        (name = "Produtos", description = "Catálogo de produtos e kits"),
        (name = "Kits", description = "Receitas: componentes de cada kit"),
        (name = "Movimentações", description = "Livro-razão de estoque"),
        (name = "Produção", description = "Ordens de produção e entregas"),
        (name = "Público", description = "Consultas sem preços"),
        (name = "Sistema", description = "Saúde do serviço")
    )
)]
pub struct ApiDoc;

// GET /api-docs/openapi.json
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
