// src/db/store.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

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

// ---
// Portas de persistência
// ---
// Toda operação do núcleo abre UMA transação (`InventoryStore::begin`) e passa
// o `&mut dyn StoreTx` adiante. Sem `commit`, o drop da transação desfaz tudo.

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError>;
}

#[async_trait]
pub trait StoreTx: CatalogStore + KitStore + LedgerStore + ProductionStore + Send {
    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

#[async_trait]
pub trait CatalogStore: Send {
    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, AppError>;

    async fn update_product(&mut self, id: Uuid, changes: &ProductChanges) -> Result<Product, AppError>;

    async fn delete_product(&mut self, id: Uuid) -> Result<(), AppError>;

    async fn find_product(&mut self, id: Uuid) -> Result<Option<Product>, AppError>;

    /// `SELECT … FOR UPDATE` em ordem crescente de id (evita deadlock).
    async fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<Product>, AppError>;

    async fn list_products(&mut self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;

    async fn count_product_references(&mut self, id: Uuid) -> Result<ProductReferences, AppError>;

    /// Ajuste relativo e atômico do cache de estoque. Nunca sobrescreve.
    async fn adjust_stock(&mut self, id: Uuid, delta: i32) -> Result<Product, AppError>;
}

#[async_trait]
pub trait KitStore: Send {
    async fn list_components(&mut self, kit_id: Uuid) -> Result<Vec<KitComponentDetail>, AppError>;

    async fn find_component(&mut self, id: Uuid) -> Result<Option<KitComponent>, AppError>;

    async fn find_component_pair(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<KitComponent>, AppError>;

    async fn insert_component(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError>;

    async fn update_component_quantity(
        &mut self,
        id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError>;

    async fn delete_component(&mut self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait LedgerStore: Send {
    /// Apenas INSERT: o livro-razão não tem update nem delete.
    async fn append_movement(&mut self, movement: &NewMovement) -> Result<InventoryMovement, AppError>;

    async fn list_movements(
        &mut self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<Page<MovementDetail>, AppError>;

    async fn movements_by_reference(
        &mut self,
        reference: &MovementReference,
    ) -> Result<Vec<InventoryMovement>, AppError>;

    async fn daily_sales(&mut self, range: &DateRange) -> Result<Vec<DailySales>, AppError>;

    /// Soma de todas as quantidades lançadas para o produto.
    async fn ledger_total(&mut self, product_id: Uuid) -> Result<i64, AppError>;
}

#[async_trait]
pub trait ProductionStore: Send {
    /// Próximo valor do contador monotônico de números de ordem.
    async fn next_order_sequence(&mut self) -> Result<i64, AppError>;

    async fn insert_order(&mut self, new: &NewOrder, order_number: &str) -> Result<ProductionOrder, AppError>;

    async fn find_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError>;

    /// `SELECT … FOR UPDATE` na linha da ordem.
    async fn lock_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError>;

    async fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<ProductionOrderDetail>, AppError>;

    async fn save_order_state(
        &mut self,
        id: Uuid,
        quantity_produced: i32,
        status: OrderStatus,
    ) -> Result<ProductionOrder, AppError>;
}
