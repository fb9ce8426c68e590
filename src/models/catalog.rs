// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_category")]
pub enum ProductCategory {
    Material,
    Insumo,
    Empaque,
    #[sqlx(rename = "Kit Terminado")]
    #[serde(rename = "Kit Terminado")]
    KitTerminado,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "unit_of_measure")]
pub enum UnitOfMeasure {
    #[default]
    Pieza,
    Mililitro,
    Gramo,
    Kit,
    Kilogramo,
    Metro,
    Rollo,
    Litro,
}

// --- Produto do catálogo ---
// `stock` é um cache materializado: só muda junto com uma linha do livro-razão.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Bálsamo Pédico 30g")]
    pub name: String,
    #[schema(example = "BAL-030")]
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub unit_of_measure: UnitOfMeasure,
    pub is_kit: bool,
    #[schema(example = 10)]
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dados de criação. O estoque inicial não entra aqui: ele é lançado
/// no livro-razão logo após o INSERT.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub unit_of_measure: UnitOfMeasure,
    pub is_kit: bool,
}

/// Campos editáveis sem efeito em estoque.
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub name: String,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub category: ProductCategory,
    pub unit_of_measure: UnitOfMeasure,
    pub is_kit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub is_kit: Option<bool>,
    pub category: Option<ProductCategory>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.is_kit.is_none_or(|k| product.is_kit == k)
            && self.category.is_none_or(|c| product.category == c)
    }
}

/// Quantas linhas de histórico apontam para um produto.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductReferences {
    pub movements: i64,
    pub production_orders: i64,
}

// Diagnóstico de divergência entre o cache `stock` e a soma do livro-razão
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerBalance {
    pub product_id: Uuid,
    pub stock: i32,
    pub ledger_total: i64,
    pub in_sync: bool,
}
