// src/db/catalog_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{NewProduct, Product, ProductChanges, ProductFilter, ProductReferences},
};

// ---
// Catálogo de produtos (Postgres)
// ---
// Todas as funções aceitam um `Executor` genérico para rodarem dentro da
// transação aberta pelo `PgStore`.

fn map_sku_violation(e: sqlx::Error, sku: Option<&str>) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Duplicate(format!(
                "Já existe um produto com o SKU '{}'.",
                sku.unwrap_or_default()
            ));
        }
    }
    e.into()
}

#[derive(Clone, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_product<'e, E>(&self, executor: E, new: &NewProduct) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (id, name, sku, description, category, unit_of_measure, is_kit, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.sku)
        .bind(&new.description)
        .bind(new.category)
        .bind(new.unit_of_measure)
        .bind(new.is_kit)
        .fetch_one(executor)
        .await
        .map_err(|e| map_sku_violation(e, new.sku.as_deref()))
    }

    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        changes: &ProductChanges,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $2, sku = $3, description = $4, category = $5,
                unit_of_measure = $6, is_kit = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.sku)
        .bind(&changes.description)
        .bind(changes.category)
        .bind(changes.unit_of_measure)
        .bind(changes.is_kit)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_sku_violation(e, changes.sku.as_deref()))?
        .ok_or_else(|| AppError::not_found("Produto", id))
    }

    pub async fn delete_product<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // kit_components sai em cascata (FK ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Produto", id));
        }
        Ok(())
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    pub async fn lock_products<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Ordem fixa de aquisição dos locks: id crescente.
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn list_products<'e, E>(&self, executor: E, filter: &ProductFilter) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE ($1::boolean IS NULL OR is_kit = $1)
              AND ($2::product_category IS NULL OR category = $2)
            ORDER BY name ASC
            "#,
        )
        .bind(filter.is_kit)
        .bind(filter.category)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn count_product_references<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<ProductReferences, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (movements, production_orders): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM inventory_movements WHERE product_id = $1),
                (SELECT COUNT(*) FROM production_orders WHERE product_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;

        Ok(ProductReferences { movements, production_orders })
    }

    pub async fn adjust_stock<'e, E>(&self, executor: E, id: Uuid, delta: i32) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Incremento relativo; o CHECK (stock >= 0) da tabela é a última barreira.
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = stock + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Produto", id))
    }
}
