// src/db/memory.rs

use std::{
    cmp::Reverse,
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::store::{CatalogStore, InventoryStore, KitStore, LedgerStore, ProductionStore, StoreTx};
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
            MovementReference, MovementType, NewMovement,
        },
        production::{NewOrder, OrderFilter, OrderStatus, ProductionOrder, ProductionOrderDetail},
    },
};

// ---
// Store em memória
// ---
// Mesmas portas do Postgres. Uma transação segura o mutex do estado inteiro
// do `begin` até o `commit`/drop e trabalha numa cópia; só o `commit` publica
// a cópia. Isso serializa todas as transações (mais forte que lock de linha).

#[derive(Debug, Clone, Default)]
struct MemoryState {
    products: BTreeMap<Uuid, Product>,
    components: BTreeMap<Uuid, KitComponent>,
    movements: Vec<InventoryMovement>,
    orders: BTreeMap<Uuid, ProductionOrder>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
    // Como a sequence do Postgres: não volta atrás em rollback.
    order_sequence: Arc<AtomicI64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            work,
            order_sequence: self.order_sequence.clone(),
        }))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
    order_sequence: Arc<AtomicI64>,
}

impl MemoryTx {
    fn product(&self, id: Uuid) -> Result<&Product, AppError> {
        self.work.products.get(&id).ok_or_else(|| AppError::not_found("Produto", id))
    }

    fn sku_taken(&self, sku: Option<&str>, except: Option<Uuid>) -> bool {
        let Some(sku) = sku else { return false };
        self.work
            .products
            .values()
            .any(|p| p.sku.as_deref() == Some(sku) && Some(p.id) != except)
    }

    fn duplicate_sku(sku: Option<&str>) -> AppError {
        AppError::Duplicate(format!("Já existe um produto com o SKU '{}'.", sku.unwrap_or_default()))
    }

    fn product_name(&self, id: Uuid) -> String {
        self.work.products.get(&id).map(|p| p.name.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MemoryTx { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryTx {
    async fn insert_product(&mut self, new: &NewProduct) -> Result<Product, AppError> {
        if self.sku_taken(new.sku.as_deref(), None) {
            return Err(Self::duplicate_sku(new.sku.as_deref()));
        }
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            sku: new.sku.clone(),
            description: new.description.clone(),
            category: new.category,
            unit_of_measure: new.unit_of_measure,
            is_kit: new.is_kit,
            stock: 0,
            created_at: now,
            updated_at: now,
        };
        self.work.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&mut self, id: Uuid, changes: &ProductChanges) -> Result<Product, AppError> {
        if self.sku_taken(changes.sku.as_deref(), Some(id)) {
            return Err(Self::duplicate_sku(changes.sku.as_deref()));
        }
        let product = self
            .work
            .products
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Produto", id))?;
        product.name = changes.name.clone();
        product.sku = changes.sku.clone();
        product.description = changes.description.clone();
        product.category = changes.category;
        product.unit_of_measure = changes.unit_of_measure;
        product.is_kit = changes.is_kit;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&mut self, id: Uuid) -> Result<(), AppError> {
        // FKs sem cascata em movimentos e ordens
        let referenced = self.work.movements.iter().any(|m| m.product_id == id)
            || self.work.orders.values().any(|o| o.product_id == id);
        if referenced {
            return Err(anyhow!("violação de chave estrangeira ao excluir produto {}", id).into());
        }
        if self.work.products.remove(&id).is_none() {
            return Err(AppError::not_found("Produto", id));
        }
        self.work
            .components
            .retain(|_, c| c.kit_product_id != id && c.component_product_id != id);
        Ok(())
    }

    async fn find_product(&mut self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.work.products.get(&id).cloned())
    }

    async fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = ids
            .iter()
            .filter_map(|id| self.work.products.get(id).cloned())
            .collect();
        products.sort_by_key(|p| p.id);
        products.dedup_by_key(|p| p.id);
        Ok(products)
    }

    async fn list_products(&mut self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut products: Vec<Product> = self
            .work
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn count_product_references(&mut self, id: Uuid) -> Result<ProductReferences, AppError> {
        let movements = self.work.movements.iter().filter(|m| m.product_id == id).count();
        let production_orders = self.work.orders.values().filter(|o| o.product_id == id).count();
        Ok(ProductReferences {
            movements: movements as i64,
            production_orders: production_orders as i64,
        })
    }

    async fn adjust_stock(&mut self, id: Uuid, delta: i32) -> Result<Product, AppError> {
        let product = self
            .work
            .products
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Produto", id))?;
        let stock = product
            .stock
            .checked_add(delta)
            .ok_or_else(|| anyhow!("estoque fora do intervalo para o produto {}", id))?;
        // Equivalente ao CHECK (stock >= 0)
        if stock < 0 {
            return Err(anyhow!("CHECK stock >= 0 violado para o produto {}", id).into());
        }
        product.stock = stock;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl KitStore for MemoryTx {
    async fn list_components(&mut self, kit_id: Uuid) -> Result<Vec<KitComponentDetail>, AppError> {
        let mut details = Vec::new();
        for component in self.work.components.values().filter(|c| c.kit_product_id == kit_id) {
            let product = self.product(component.component_product_id)?;
            details.push(KitComponentDetail {
                component: component.clone(),
                component_name: product.name.clone(),
                component_sku: product.sku.clone(),
                component_unit: product.unit_of_measure,
                component_stock: product.stock,
            });
        }
        details.sort_by_key(|d| d.component.component_product_id);
        Ok(details)
    }

    async fn find_component(&mut self, id: Uuid) -> Result<Option<KitComponent>, AppError> {
        Ok(self.work.components.get(&id).cloned())
    }

    async fn find_component_pair(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
    ) -> Result<Option<KitComponent>, AppError> {
        Ok(self
            .work
            .components
            .values()
            .find(|c| c.kit_product_id == kit_id && c.component_product_id == component_id)
            .cloned())
    }

    async fn insert_component(
        &mut self,
        kit_id: Uuid,
        component_id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError> {
        if self.find_component_pair(kit_id, component_id).await?.is_some() {
            return Err(AppError::Duplicate("Este componente já existe no kit.".to_string()));
        }
        self.product(kit_id)?;
        self.product(component_id)?;

        let now = Utc::now();
        let component = KitComponent {
            id: Uuid::new_v4(),
            kit_product_id: kit_id,
            component_product_id: component_id,
            quantity_required,
            created_at: now,
            updated_at: now,
        };
        self.work.components.insert(component.id, component.clone());
        Ok(component)
    }

    async fn update_component_quantity(
        &mut self,
        id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError> {
        let component = self
            .work
            .components
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Componente", id))?;
        component.quantity_required = quantity_required;
        component.updated_at = Utc::now();
        Ok(component.clone())
    }

    async fn delete_component(&mut self, id: Uuid) -> Result<(), AppError> {
        self.work
            .components
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Componente", id))
    }
}

#[async_trait]
impl LedgerStore for MemoryTx {
    async fn append_movement(&mut self, movement: &NewMovement) -> Result<InventoryMovement, AppError> {
        // Equivalente ao CHECK (quantity <> 0) + FK de produto
        if movement.quantity == 0 {
            return Err(anyhow!("CHECK quantity <> 0 violado").into());
        }
        self.product(movement.product_id)?;

        let row = InventoryMovement {
            id: Uuid::new_v4(),
            product_id: movement.product_id,
            quantity: movement.quantity,
            movement_type: movement.movement_type,
            unit_price: movement.unit_price,
            total_price: movement.total_price,
            reference: movement.reference,
            notes: movement.notes.clone(),
            created_at: movement.occurred_at.unwrap_or_else(Utc::now),
        };
        self.work.movements.push(row.clone());
        Ok(row)
    }

    async fn list_movements(
        &mut self,
        filter: &MovementFilter,
        page: PageRequest,
    ) -> Result<Page<MovementDetail>, AppError> {
        let mut matching: Vec<&InventoryMovement> =
            self.work.movements.iter().filter(|m| filter.matches(m)).collect();
        matching.sort_by_key(|m| Reverse((m.created_at, m.id)));

        let total = matching.len() as i64;
        let data = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .map(|m| MovementDetail {
                movement: m.clone(),
                product_name: self.product_name(m.product_id),
            })
            .collect();
        Ok(Page::new(data, page, total))
    }

    async fn movements_by_reference(
        &mut self,
        reference: &MovementReference,
    ) -> Result<Vec<InventoryMovement>, AppError> {
        let mut movements: Vec<InventoryMovement> = self
            .work
            .movements
            .iter()
            .filter(|m| m.reference.as_ref() == Some(reference))
            .cloned()
            .collect();
        movements.sort_by_key(|m| (m.created_at, m.id));
        Ok(movements)
    }

    async fn daily_sales(&mut self, range: &DateRange) -> Result<Vec<DailySales>, AppError> {
        let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for movement in self.work.movements.iter().filter(|m| {
            m.movement_type == MovementType::Sale && range.contains(m.created_at)
        }) {
            *totals.entry(movement.created_at.date_naive()).or_default() +=
                movement.total_price.unwrap_or_default();
        }
        Ok(totals
            .into_iter()
            .map(|(date, total)| DailySales { date, total })
            .collect())
    }

    async fn ledger_total(&mut self, product_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .work
            .movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .map(|m| i64::from(m.quantity))
            .sum())
    }
}

#[async_trait]
impl ProductionStore for MemoryTx {
    async fn next_order_sequence(&mut self) -> Result<i64, AppError> {
        Ok(self.order_sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_order(&mut self, new: &NewOrder, order_number: &str) -> Result<ProductionOrder, AppError> {
        if self.work.orders.values().any(|o| o.order_number == order_number) {
            return Err(AppError::Duplicate(format!("Número de ordem '{}' já existe.", order_number)));
        }
        self.product(new.product_id)?;

        let now = Utc::now();
        let order = ProductionOrder {
            id: Uuid::new_v4(),
            product_id: new.product_id,
            order_number: order_number.to_string(),
            quantity_requested: new.quantity_requested,
            quantity_produced: 0,
            status: OrderStatus::Pending,
            due_date: new.due_date,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.work.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn find_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn lock_order(&mut self, id: Uuid) -> Result<Option<ProductionOrder>, AppError> {
        Ok(self.work.orders.get(&id).cloned())
    }

    async fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<ProductionOrderDetail>, AppError> {
        let names: HashMap<Uuid, String> = self
            .work
            .products
            .values()
            .map(|p| (p.id, p.name.clone()))
            .collect();

        let mut orders: Vec<ProductionOrderDetail> = self
            .work
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .map(|o| ProductionOrderDetail {
                order: o.clone(),
                product_name: names.get(&o.product_id).cloned().unwrap_or_default(),
            })
            .collect();
        // due_date DESC NULLS LAST, created_at DESC
        orders.sort_by_key(|d| (d.order.due_date.is_none(), Reverse(d.order.due_date), Reverse(d.order.created_at)));
        Ok(orders)
    }

    async fn save_order_state(
        &mut self,
        id: Uuid,
        quantity_produced: i32,
        status: OrderStatus,
    ) -> Result<ProductionOrder, AppError> {
        let order = self
            .work
            .orders
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Ordem de produção", id))?;
        // Equivalente ao CHECK 0 <= produzido <= solicitado
        if quantity_produced < 0 || quantity_produced > order.quantity_requested {
            return Err(anyhow!("CHECK quantity_produced violado na ordem {}", id).into());
        }
        order.quantity_produced = quantity_produced;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}
