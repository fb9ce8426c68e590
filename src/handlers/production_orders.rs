// src/handlers/production_orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{error::AppError, query::empty_as_none},
    config::AppState,
    models::{
        ledger::{DailySales, DateRange, InventoryMovement},
        production::{NewOrder, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDetail},
    },
};

// ---
// Validação Customizada
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payloads
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateOrderPayload {
    #[validate(required(message = "O campo 'product_id' é obrigatório."))]
    pub product_id: Option<Uuid>,

    #[validate(range(min = 1, message = "A quantidade deve ser no mínimo 1."))]
    #[schema(example = 3)]
    pub quantity_requested: i32,

    pub due_date: Option<NaiveDate>,

    #[validate(length(max = 1000, message = "As notas devem ter no máximo 1000 caracteres."))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusPayload {
    /// `En Progreso`/`InProgress` ou `Cancelado`/`Cancelled`.
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddProgressPayload {
    #[validate(range(min = 1, message = "A quantidade deve ser no mínimo 1."))]
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeliverPayload {
    pub delivery_date: NaiveDate,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "50.00")]
    pub unit_price: Decimal,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FinancialsQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_start: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_end: Option<NaiveDate>,
}

// POST /api/production-orders
#[utoipa::path(
    post,
    path = "/api/production-orders",
    tag = "Produção",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Ordem criada como 'Pendiente'", body = ProductionOrder),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "Dados inválidos ou produto não é kit")
    )
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::field("product_id", "O campo é obrigatório."))?;
    let order = app_state
        .production_service
        .create(NewOrder {
            product_id,
            quantity_requested: payload.quantity_requested,
            due_date: payload.due_date,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/production-orders
#[utoipa::path(
    get,
    path = "/api/production-orders",
    tag = "Produção",
    params(OrderQuery),
    responses(
        (status = 200, description = "Ordens por data de entrega (sem data por último)", body = Vec<ProductionOrderDetail>)
    )
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = OrderFilter {
        statuses: query.status.into_iter().collect(),
        product_id: query.product_id,
    };
    let orders = app_state.production_service.list(filter).await?;
    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/production-orders/financials
#[utoipa::path(
    get,
    path = "/api/production-orders/financials",
    tag = "Produção",
    params(FinancialsQuery),
    responses(
        (status = 200, description = "Vendas por dia (UTC)", body = Vec<DailySales>),
        (status = 422, description = "Intervalo de datas inválido")
    )
)]
pub async fn financials(
    State(app_state): State<AppState>,
    Query(query): Query<FinancialsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let range = DateRange {
        start: query.date_start,
        end: query.date_end,
    };
    let sales = app_state.ledger_service.daily_sales(range).await?;
    Ok((StatusCode::OK, Json(sales)))
}

// GET /api/production-orders/{id}
#[utoipa::path(
    get,
    path = "/api/production-orders/{id}",
    tag = "Produção",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, body = ProductionOrderDetail),
        (status = 404, description = "Ordem não encontrada")
    )
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.production_service.get(id).await?;
    Ok((StatusCode::OK, Json(order)))
}

// GET /api/production-orders/{id}/movements
#[utoipa::path(
    get,
    path = "/api/production-orders/{id}/movements",
    tag = "Produção",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    responses(
        (status = 200, description = "Lançamentos gerados pela ordem", body = Vec<InventoryMovement>),
        (status = 404, description = "Ordem não encontrada")
    )
)]
pub async fn order_movements(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state.ledger_service.movements_for_order(id).await?;
    Ok((StatusCode::OK, Json(movements)))
}

// PATCH /api/production-orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/production-orders/{id}/status",
    tag = "Produção",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, body = ProductionOrder),
        (status = 404, description = "Ordem não encontrada"),
        (status = 422, description = "Status inválido ou ordem encerrada")
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state
        .production_service
        .update_status(id, payload.status)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// POST /api/production-orders/{id}/add-progress
#[utoipa::path(
    post,
    path = "/api/production-orders/{id}/add-progress",
    tag = "Produção",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = AddProgressPayload,
    responses(
        (status = 200, description = "Progresso registrado", body = ProductionOrder),
        (status = 404, description = "Ordem não encontrada"),
        (status = 422, description = "Quantidade inválida, kit sem receita, estoque insuficiente ou ordem encerrada")
    )
)]
pub async fn add_progress(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddProgressPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .production_service
        .add_progress(id, payload.quantity)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}

// POST /api/production-orders/{id}/deliver
#[utoipa::path(
    post,
    path = "/api/production-orders/{id}/deliver",
    tag = "Produção",
    params(("id" = Uuid, Path, description = "ID da ordem")),
    request_body = DeliverPayload,
    responses(
        (status = 200, description = "Ordem entregue e concluída", body = ProductionOrder),
        (status = 404, description = "Ordem não encontrada"),
        (status = 422, description = "Nada produzido, ordem encerrada ou estoque do kit insuficiente")
    )
)]
pub async fn deliver(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeliverPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state
        .production_service
        .deliver(id, payload.delivery_date, payload.unit_price)
        .await?;
    Ok((StatusCode::OK, Json(order)))
}
