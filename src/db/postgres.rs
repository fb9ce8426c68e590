// src/db/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{
    catalog_repo::CatalogRepository,
    kit_repo::KitRepository,
    ledger_repo::LedgerRepository,
    production_repo::ProductionRepository,
    store::{CatalogStore, InventoryStore, KitStore, LedgerStore, ProductionStore, StoreTx},
};
use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    models::{
        catalog::{NewProduct, Product, ProductChanges, ProductFilter, ProductReferences},
        kit::{KitComponent, KitComponentDetail},
        ledger::{
            DailySales, DateRange, InventoryMovement, MovementDetail, MovementFilter,
            MovementReference, NewMovement,
        },
        production::{NewOrder, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDetail},
    },
};

// Um repositório por agregado; cada transação recebe uma cópia.
#[derive(Clone, Default)]
struct Repositories {
    catalog: CatalogRepository,
    kit: KitRepository,
    ledger: LedgerRepository,
    production: ProductionRepository,
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    repos: Repositories,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            repos: Repositories {
                catalog: CatalogRepository::new(),
                kit: KitRepository::new(),
                ledger: LedgerRepository::new(),
                production: ProductionRepository::new(),
            },
        }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        // READ COMMITTED (padrão do Postgres) + locks explícitos de linha.
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx {
            tx,
            repos: self.repos.clone(),
        }))
    }
}

/// Transação Postgres. O drop sem `commit` faz ROLLBACK.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    repos: Repositories,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgTx {
    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, AppError> {
        self.repos.catalog.insert_product(&mut *self.tx, new).await
    }

    async fn update_product(&mut self, id: Uuid, changes: &ProductChanges) -> Result<Product, AppError> {
        self.repos.catalog.update_product(&mut *self.tx, id, changes).await
    }

    async fn delete_product(&mut self, id: Uuid) -> Result<(), AppError> {
        self.repos.catalog.delete_product(&mut *self.tx, id).await
    }

    async fn find_product(&mut self, id: Uuid) -> Result<Option<Product>, AppError> {
        self.repos.catalog.find_product(&mut *self.tx, id).await
    }

    async fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        self.repos.catalog.lock_products(&mut *self.tx, ids).await
    }

    async fn list_products(&mut self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.repos.catalog.list_products(&mut *self.tx, filter).await
    }

    async fn count_product_references(&mut self, id: Uuid) -> Result<ProductReferences, AppError> {
        self.repos.catalog.count_product_references(&mut *self.tx, id).await
    }

    async fn adjust_stock(&mut self, id: Uuid, delta: i32) -> Result<Product, AppError> {
        self.repos.catalog.adjust_stock(&mut *self.tx, id, delta).await
    }
}

#[async_trait]
impl KitStore for PgTx {
    async fn list_components(&mut self, kit_id: Uuid) -> Result<Vec<KitComponentDetail>, AppError> {
        self.repos.kit.list_components(&mut *self.tx, kit_id).await
    }

    async fn find_component(&mut self, id: Uuid) -> Result<Option<KitComponent>, AppError> {
        self.repos.kit.find_component(&mut *self.tx, id).await
    }

    async fn find_component_pair(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<KitComponent>, AppError> {
        self.repos.kit.find_component_pair(&mut *self.tx, kit_id, component_id).await
    }

    async fn insert_component(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError> {
        self.repos.kit.insert_component(&mut *self.tx, kit_id, component_id, quantity_required).await
    }

    async fn update_component_quantity(
        &mut self,
        id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError> {
        self.repos.kit.update_component_quantity(&mut *self.tx, id, quantity_required).await
    }

    async fn delete_component(&mut self, id: Uuid) -> Result<(), AppError> {
        self.repos.kit.delete_component(&mut *self.tx, id).await
    }
}

#[async_trait]
impl LedgerStore for PgTx {
    async fn append_movement(&mut self, movement: &NewMovement) -> Result<InventoryMovement, AppError> {
        self.repos.ledger.append_movement(&mut *self.tx, movement).await
    }

    async fn list_movements(
        &mut self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<Page<MovementDetail>, AppError> {
        self.repos.ledger.list_movements(&mut *self.tx, filter, page).await
    }

    async fn movements_by_reference(
        &mut self,
        reference: &MovementReference,
    ) -> Result<Vec<InventoryMovement>, AppError> {
        self.repos.ledger.movements_by_reference(&mut *self.tx, reference).await
    }

    async fn daily_sales(&mut self, range: &DateRange) -> Result<Vec<DailySales>, AppError> {
        self.repos.ledger.daily_sales(&mut *self.tx, range).await
    }

    async fn ledger_total(&mut self, product_id: Uuid) -> Result<i64, AppError> {
        self.repos.ledger.ledger_total(&mut *self.tx, product_id).await
    }
}

#[async_trait]
impl ProductionStore for PgTx {
    async fn next_order_sequence(&mut self) -> Result<i64, AppError> {
        self.repos.production.next_order_sequence(&mut *self.tx).await
    }

    async fn insert_order(&mut self, new: &NewOrder, order_number: &str) -> Result<ProductionOrder, AppError> {
        self.repos.production.insert_order(&mut *self.tx, new, order_number).await
    }

    async fn find_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError> {
        self.repos.production.find_order(&mut *self.tx, id).await
    }

    async fn lock_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError> {
        self.repos.production.lock_order(&mut *self.tx, id).await
    }

    async fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<ProductionOrderDetail>, AppError> {
        self.repos.production.list_orders(&mut *self.tx, filter).await
    }

    async fn save_order_state(
        &mut self,
        id: Uuid,
        quantity_produced: i32,
        status: OrderStatus,
    ) -> Result<ProductionOrder, AppError> {
        self.repos.production.save_order_state(&mut *self.tx, id, quantity_produced, status).await
    }
}
