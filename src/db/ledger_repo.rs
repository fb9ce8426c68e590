// src/db/ledger_repo.rs

use chrono::Utc;
use sqlx::{Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    models::ledger::{
        DailySales, DateRange, InventoryMovement, MovementDetail, MovementFilter, MovementReference,
        NewMovement,
    },
};

// Os dois SELECTs (página + total) compartilham o mesmo WHERE.
const MOVEMENT_FILTER: &str = r#"
    ($1::movement_type IS NULL OR m.type = $1)
    AND ($2::uuid IS NULL OR m.product_id = $2)
    AND ($3::timestamptz IS NULL OR m.created_at >= $3)
    AND ($4::timestamptz IS NULL OR m.created_at < $4)
"#;

#[derive(Clone, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    pub fn new() -> Self {
        Self
    }

    /// Registra uma movimentação no livro-razão (auditoria). Só INSERT.
    pub async fn append_movement<'e, E>(&self, executor: E, movement: &NewMovement) -> Result<InventoryMovement, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_as::<_, InventoryMovement>(
            r#"
            INSERT INTO inventory_movements (
                id, product_id, quantity, type, unit_price, total_price,
                reference_type, reference_id, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(movement.product_id)
        .bind(movement.quantity)
        .bind(movement.movement_type)
        .bind(movement.unit_price)
        .bind(movement.total_price)
        .bind(movement.reference.map(|r| r.kind.as_str()))
        .bind(movement.reference.map(|r| r.id))
        .bind(&movement.notes)
        .bind(movement.occurred_at.unwrap_or_else(Utc::now))
        .fetch_one(executor)
        .await?;

        Ok(inserted)
    }

    pub async fn list_movements(
        &self,
        conn: &mut PgConnection,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<Page<MovementDetail>, AppError> {
        let from = filter.range.from_instant();
        let until = filter.range.until_instant();

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM inventory_movements m WHERE {}",
            MOVEMENT_FILTER
        ))
        .bind(filter.movement_type)
        .bind(filter.product_id)
        .bind(from)
        .bind(until)
        .fetch_one(&mut *conn)
        .await?;

        let rows = sqlx::query_as::<_, MovementDetail>(&format!(
            r#"
            SELECT m.*, p.name AS product_name
            FROM inventory_movements m
            JOIN products p ON p.id = m.product_id
            WHERE {}
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $5 OFFSET $6
            "#,
            MOVEMENT_FILTER
        ))
        .bind(filter.movement_type)
        .bind(filter.product_id)
        .bind(from)
        .bind(until)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        Ok(Page::new(rows, page, total))
    }

    pub async fn movements_by_reference<'e, E>(
        &self,
        executor: E,
        reference: &MovementReference,
    ) -> Result<Vec<InventoryMovement>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT * FROM inventory_movements
            WHERE reference_type = $1 AND reference_id = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(reference.kind.as_str())
        .bind(reference.id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    /// Vendas (`Venta`) somadas por dia UTC, em ordem crescente.
    pub async fn daily_sales<'e, E>(&self, executor: E, range: &DateRange) -> Result<Vec<DailySales>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT
                (created_at AT TIME ZONE 'UTC')::date AS date,
                COALESCE(SUM(total_price), 0) AS total
            FROM inventory_movements
            WHERE type = 'Venta'
              AND ($1::timestamptz IS NULL OR created_at >= $1)
              AND ($2::timestamptz IS NULL OR created_at < $2)
            GROUP BY 1
            ORDER BY 1 ASC
            "#,
        )
        .bind(range.from_instant())
        .bind(range.until_instant())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn ledger_total<'e, E>(&self, executor: E, product_id: Uuid) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::bigint FROM inventory_movements WHERE product_id = $1",
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(total)
    }
}
