// src/handlers/kit_components.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::kit::{KitComponent, KitComponentDetail},
};

// ---
// Payloads
// ---
// `quantity_required` (> 0, até 2 casas) é conferido no serviço, junto com as
// regras do kit.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddComponentPayload {
    #[validate(required(message = "O campo 'component_product_id' é obrigatório."))]
    pub component_product_id: Option<Uuid>,

    #[schema(example = "2.00")]
    pub quantity_required: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateComponentPayload {
    #[schema(example = "1.50")]
    pub quantity_required: Decimal,
}

// GET /api/products/{id}/components
#[utoipa::path(
    get,
    path = "/api/products/{id}/components",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    responses(
        (status = 200, description = "Receita do kit", body = Vec<KitComponentDetail>),
        (status = 404, description = "Kit não encontrado"),
        (status = 422, description = "O produto não é um kit")
    )
)]
pub async fn list_components(
    State(app_state): State<AppState>,
    Path(kit_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let components = app_state.kit_service.list(kit_id).await?;
    Ok((StatusCode::OK, Json(components)))
}

// POST /api/products/{id}/components
#[utoipa::path(
    post,
    path = "/api/products/{id}/components",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID do kit")),
    request_body = AddComponentPayload,
    responses(
        (status = 201, description = "Componente adicionado", body = KitComponent),
        (status = 404, description = "Kit ou componente não encontrado"),
        (status = 422, description = "Par duplicado, produto não é kit ou quantidade inválida")
    )
)]
pub async fn add_component(
    State(app_state): State<AppState>,
    Path(kit_id): Path<Uuid>,
    Json(payload): Json<AddComponentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let component_id = payload
        .component_product_id
        .ok_or_else(|| AppError::field("component_product_id", "O campo é obrigatório."))?;
    let component = app_state
        .kit_service
        .add(kit_id, component_id, payload.quantity_required)
        .await?;

    Ok((StatusCode::CREATED, Json(component)))
}

// PUT /api/components/{id}
#[utoipa::path(
    put,
    path = "/api/components/{id}",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID da linha da receita")),
    request_body = UpdateComponentPayload,
    responses(
        (status = 200, description = "Quantidade atualizada", body = KitComponent),
        (status = 404, description = "Componente não encontrado"),
        (status = 422, description = "Quantidade inválida")
    )
)]
pub async fn update_component(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateComponentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let component = app_state
        .kit_service
        .update(id, payload.quantity_required)
        .await?;
    Ok((StatusCode::OK, Json(component)))
}

// DELETE /api/components/{id}
#[utoipa::path(
    delete,
    path = "/api/components/{id}",
    tag = "Kits",
    params(("id" = Uuid, Path, description = "ID da linha da receita")),
    responses(
        (status = 204, description = "Componente removido"),
        (status = 404, description = "Componente não encontrado")
    )
)]
pub async fn remove_component(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.kit_service.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
