// src/models/kit.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::UnitOfMeasure;

// Uma linha da receita: quanto de um componente vai em UMA unidade do kit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct KitComponent {
    pub id: Uuid,
    pub kit_product_id: Uuid,
    pub component_product_id: Uuid,
    #[schema(example = "2.00")]
    pub quantity_required: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Componente com os dados do produto consumido (para listagem e para o
/// cálculo de consumo da produção).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct KitComponentDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub component: KitComponent,
    pub component_name: String,
    pub component_sku: Option<String>,
    pub component_unit: UnitOfMeasure,
    pub component_stock: i32,
}
