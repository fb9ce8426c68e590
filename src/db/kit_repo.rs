// src/db/kit_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::kit::{KitComponent, KitComponentDetail},
};

#[derive(Clone, Default)]
pub struct KitRepository;

impl KitRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn list_components<'e, E>(&self, executor: E, kit_id: Uuid) -> Result<Vec<KitComponentDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let components = sqlx::query_as::<_, KitComponentDetail>(
            r#"
            SELECT
                kc.id, kc.kit_product_id, kc.component_product_id, kc.quantity_required,
                kc.created_at, kc.updated_at,
                p.name AS component_name,
                p.sku AS component_sku,
                p.unit_of_measure AS component_unit,
                p.stock AS component_stock
            FROM kit_components kc
            JOIN products p ON p.id = kc.component_product_id
            WHERE kc.kit_product_id = $1
            ORDER BY kc.component_product_id
            "#,
        )
        .bind(kit_id)
        .fetch_all(executor)
        .await?;
        Ok(components)
    }

    pub async fn find_component<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<KitComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, KitComponent>("SELECT * FROM kit_components WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(component)
    }

    pub async fn find_component_pair<'e, E>(
        &self,
        executor: E,
        kit_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<KitComponent>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let component = sqlx::query_as::<_, KitComponent>(
            "SELECT * FROM kit_components WHERE kit_product_id = $1 AND component_product_id = $2",
        )
        .bind(kit_id)
        .bind(component_id)
        .fetch_optional(executor)
        .await?;
        Ok(component)
    }

    pub async fn insert_component<'e, E>(
        &self,
        executor: E,
        kit_id: Uuid,
        component_id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, KitComponent>(
            r#"
            INSERT INTO kit_components (id, kit_product_id, component_product_id, quantity_required)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(kit_id)
        .bind(component_id)
        .bind(quantity_required)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            // Corrida entre a checagem do par e o INSERT: a UNIQUE decide.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Duplicate("Este componente já existe no kit.".to_string());
                }
            }
            e.into()
        })
    }

    pub async fn update_component_quantity<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, KitComponent>(
            r#"
            UPDATE kit_components
            SET quantity_required = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity_required)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Componente", id))
    }

    pub async fn delete_component<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM kit_components WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Componente", id));
        }
        Ok(())
    }
}
