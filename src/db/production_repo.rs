// src/db/production_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::production::{NewOrder, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDetail},
};

#[derive(Clone, Default)]
pub struct ProductionRepository;

impl ProductionRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn next_order_sequence<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Sequência dedicada: monotônica mesmo com INSERTs concorrentes.
        let next: i64 = sqlx::query_scalar("SELECT nextval('production_order_number_seq')")
            .fetch_one(executor)
            .await?;
        Ok(next)
    }

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        new: &NewOrder,
        order_number: &str,
    ) -> Result<ProductionOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProductionOrder>(
            r#"
            INSERT INTO production_orders (
                id, product_id, order_number, quantity_requested, quantity_produced,
                status, due_date, notes
            )
            VALUES ($1, $2, $3, $4, 0, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.product_id)
        .bind(order_number)
        .bind(new.quantity_requested)
        .bind(OrderStatus::Pending)
        .bind(new.due_date)
        .bind(&new.notes)
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::Duplicate(format!("Número de ordem '{}' já existe.", order_number));
                }
            }
            e.into()
        })
    }

    pub async fn find_order<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ProductionOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ProductionOrder>("SELECT * FROM production_orders WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn lock_order<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<ProductionOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, ProductionOrder>(
            "SELECT * FROM production_orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    pub async fn list_orders<'e, E>(&self, executor: E, filter: &OrderFilter) -> Result<Vec<ProductionOrderDetail>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Rótulos em texto: evita depender do tipo array do enum no Postgres.
        let statuses: Option<Vec<&str>> = if filter.statuses.is_empty() {
            None
        } else {
            Some(filter.statuses.iter().map(|s| s.label()).collect())
        };

        let orders = sqlx::query_as::<_, ProductionOrderDetail>(
            r#"
            SELECT o.*, p.name AS product_name
            FROM production_orders o
            JOIN products p ON p.id = o.product_id
            WHERE ($1::text[] IS NULL OR o.status::text = ANY($1))
              AND ($2::uuid IS NULL OR o.product_id = $2)
            ORDER BY o.due_date DESC NULLS LAST, o.created_at DESC
            "#,
        )
        .bind(statuses)
        .bind(filter.product_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn save_order_state<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity_produced: i32,
        status: OrderStatus,
    ) -> Result<ProductionOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, ProductionOrder>(
            r#"
            UPDATE production_orders
            SET quantity_produced = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity_produced)
        .bind(status)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::not_found("Ordem de produção", id))
    }
}
