// src/handlers/public.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
        query::{empty_as_none, parsed_or_none},
    },
    config::AppState,
    models::{
        ledger::{DateRange, PublicSaleEntry},
        production::PublicInventoryEntry,
    },
};

// Consultas somente leitura, sem preços.

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesHistoryQuery {
    /// Primeiro dia (UTC, inclusivo).
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_start: Option<NaiveDate>,
    /// Último dia (UTC, inclusivo).
    #[serde(default, deserialize_with = "empty_as_none")]
    pub date_end: Option<NaiveDate>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<u32>,
}

// GET /api/public/inventory
#[utoipa::path(
    get,
    path = "/api/public/inventory",
    tag = "Público",
    responses(
        (status = 200, description = "Estoque de cada produto com as ordens abertas", body = Vec<PublicInventoryEntry>)
    )
)]
pub async fn inventory(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let entries = app_state.production_service.public_inventory().await?;
    Ok((StatusCode::OK, Json(entries)))
}

// GET /api/public/sales-history
#[utoipa::path(
    get,
    path = "/api/public/sales-history",
    tag = "Público",
    params(SalesHistoryQuery),
    responses(
        (status = 200, description = "Vendas registradas, mais recentes primeiro", body = Page<PublicSaleEntry>),
        (status = 422, description = "Intervalo de datas inválido")
    )
)]
pub async fn sales_history(
    State(app_state): State<AppState>,
    Query(query): Query<SalesHistoryQuery>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state
        .ledger_service
        .public_sales_history(
            DateRange {
                start: query.date_start,
                end: query.date_end,
            },
            PageRequest::new(query.page),
        )
        .await?;
    Ok((StatusCode::OK, Json(history)))
}
