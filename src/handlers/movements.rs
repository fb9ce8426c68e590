// src/handlers/movements.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
        query::{empty_as_none, parsed_or_none},
    },
    config::AppState,
    models::ledger::{DateRange, InventoryMovement, ManualMovement, MovementDetail, MovementFilter, MovementType},
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementQuery {
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub movement_type: Option<MovementType>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub product_id: Option<Uuid>,
    /// Primeiro dia (UTC, inclusivo).
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_start: Option<NaiveDate>,
    /// Último dia (UTC, inclusivo).
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<u32>,
}

// ---
// Payload: lançamento manual
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ManualMovementPayload {
    #[validate(required(message = "O campo 'product_id' é obrigatório."))]
    pub product_id: Option<Uuid>,

    #[serde(rename = "type")]
    pub movement_type: MovementType,

    #[schema(example = 10)]
    pub quantity: i32,

    pub unit_price: Option<Decimal>,
    pub total_price: Option<Decimal>,

    #[validate(length(max = 1000, message = "As notas devem ter no máximo 1000 caracteres."))]
    pub notes: Option<String>,
}

// GET /api/inventory-movements
#[utoipa::path(
    get,
    path = "/api/inventory-movements",
    tag = "Movimentações",
    params(MovementQuery),
    responses(
        (status = 200, description = "Histórico paginado (50 por página), mais recentes primeiro", body = Page<MovementDetail>),
        (status = 422, description = "Filtro inválido")
    )
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Query(query): Query<MovementQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = MovementFilter {
        movement_type: query.movement_type,
        product_id: query.product_id,
        range: DateRange {
            start: query.date_start,
            end: query.date_end,
        },
    };
    let page = app_state
        .ledger_service
        .list_movements(filter, PageRequest::new(query.page))
        .await?;
    Ok((StatusCode::OK, Json(page)))
}

// POST /api/inventory-movements
#[utoipa::path(
    post,
    path = "/api/inventory-movements",
    tag = "Movimentações",
    request_body = ManualMovementPayload,
    responses(
        (status = 201, description = "Movimentação registrada", body = InventoryMovement),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "Sinal/tipo inválido ou estoque insuficiente")
    )
)]
pub async fn record_movement(
    State(app_state): State<AppState>,
    Json(payload): Json<ManualMovementPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::field("product_id", "O campo é obrigatório."))?;
    let movement = app_state
        .ledger_service
        .record_manual_movement(ManualMovement {
            product_id,
            movement_type: payload.movement_type,
            quantity: payload.quantity,
            unit_price: payload.unit_price,
            total_price: payload.total_price,
            notes: payload.notes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}
