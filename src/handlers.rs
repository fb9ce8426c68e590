pub mod kit_components;
pub mod movements;
pub mod production_orders;
pub mod products;
pub mod public;

// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Sistema",
    responses((status = 200, description = "Serviço no ar", body = String))
)]
pub async fn health() -> &'static str {
    "OK"
}
