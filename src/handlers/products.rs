// src/handlers/products.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        query::{empty_as_none, parsed_or_none},
    },
    config::AppState,
    models::catalog::{
        LedgerBalance, NewProduct, Product, ProductCategory, ProductChanges, ProductFilter, UnitOfMeasure,
    },
};

// ---
// Payload: Create/Update Product
// ---
// O mesmo corpo serve para criação e edição; na edição, `stock` é o valor
// desejado e a diferença vira um ajuste no livro-razão.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ProductPayload {
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório (máx. 255 caracteres)."))]
    #[schema(example = "Kit Spa Pies")]
    pub name: String,

    #[validate(length(max = 100, message = "O SKU deve ter no máximo 100 caracteres."))]
    pub sku: Option<String>,

    pub description: Option<String>,

    pub category: ProductCategory,

    #[serde(default)]
    pub unit_of_measure: UnitOfMeasure,

    #[validate(range(min = 0, message = "O estoque não pode ser negativo."))]
    #[serde(default)]
    pub stock: i32,

    #[serde(default)]
    pub is_kit: bool,
}

impl ProductPayload {
    // SKU em branco = sem SKU (a UNIQUE só vale para valores presentes)
    fn normalized_sku(&self) -> Option<String> {
        self.sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn into_new_product(self) -> (NewProduct, i32) {
        let sku = self.normalized_sku();
        let new = NewProduct {
            name: self.name.trim().to_string(),
            sku,
            description: self.description,
            category: self.category,
            unit_of_measure: self.unit_of_measure,
            is_kit: self.is_kit,
        };
        (new, self.stock)
    }

    fn into_changes(self) -> (ProductChanges, i32) {
        let (new, stock) = self.into_new_product();
        let changes = ProductChanges {
            name: new.name,
            sku: new.sku,
            description: new.description,
            category: new.category,
            unit_of_measure: new.unit_of_measure,
            is_kit: new.is_kit,
        };
        (changes, stock)
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Filtra kits (`true`) ou itens simples (`false`).
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub is_kit: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<ProductCategory>,
}

// POST /api/products
#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Produtos",
    request_body = ProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 422, description = "Dados inválidos ou SKU duplicado")
    )
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (new, stock) = payload.into_new_product();
    let product = app_state.catalog_service.create(new, stock).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Produtos",
    params(ProductQuery),
    responses(
        (status = 200, description = "Produtos ordenados por nome", body = Vec<Product>)
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = ProductFilter {
        is_kit: query.is_kit,
        category: query.category,
    };
    let products = app_state.catalog_service.list(filter).await?;
    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

// PUT /api/products/{id}
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado"),
        (status = 422, description = "Dados inválidos ou estoque insuficiente para a redução")
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let (changes, stock) = payload.into_changes();
    let product = app_state.catalog_service.update(id, changes, stock).await?;

    Ok((StatusCode::OK, Json(product)))
}

// DELETE /api/products/{id}
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto excluído"),
        (status = 404, description = "Produto não encontrado"),
        (status = 409, description = "Produto com movimentações ou ordens")
    )
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/products/{id}/ledger-balance
#[utoipa::path(
    get,
    path = "/api/products/{id}/ledger-balance",
    tag = "Produtos",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Estoque vs. soma do livro-razão", body = LedgerBalance),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn ledger_balance(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let balance = app_state.catalog_service.ledger_balance(id).await?;
    Ok((StatusCode::OK, Json(balance)))
}
