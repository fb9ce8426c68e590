// src/services/production_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::ledger_service::post_movement;
use crate::{
    common::error::AppError,
    db::{InventoryStore, StoreTx},
    models::{
        ledger::{start_of_day, MovementReference, MovementType, NewMovement},
        production::{
            component_requirement, format_order_number, ActiveOrderSummary, NewOrder, OrderFilter,
            OrderStatus, ProductionOrder, ProductionOrderDetail, PublicInventoryEntry,
        },
    },
};

// Consumo calculado de um componente para um lançamento de progresso.
struct Requirement {
    product_id: Uuid,
    quantity: i32,
}

async fn lock_order(tx: &mut dyn StoreTx, order_id: Uuid) -> Result<ProductionOrder, AppError> {
    tx.lock_order(order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Ordem de produção", order_id))
}

#[derive(Clone)]
pub struct ProductionService {
    store: Arc<dyn InventoryStore>,
    order_prefix: String,
}

impl ProductionService {
    pub fn new(store: Arc<dyn InventoryStore>, order_prefix: impl Into<String>) -> Self {
        Self {
            store,
            order_prefix: order_prefix.into(),
        }
    }

    // --- CREATE ORDER ---
    pub async fn create(&self, new: NewOrder) -> Result<ProductionOrder, AppError> {
        if new.quantity_requested < 1 {
            return Err(AppError::field("quantity_requested", "A quantidade deve ser no mínimo 1."));
        }

        let mut tx = self.store.begin().await?;
        let product = tx
            .find_product(new.product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto", new.product_id))?;
        if !product.is_kit {
            return Err(AppError::field("product_id", "O produto selecionado não é um kit."));
        }

        let sequence = tx.next_order_sequence().await?;
        let order_number = format_order_number(&self.order_prefix, sequence);
        let order = tx.insert_order(&new, &order_number).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            product_id = %order.product_id,
            quantity_requested = order.quantity_requested,
            "Ordem de produção criada"
        );
        Ok(order)
    }

    // --- ADD PROGRESS ---
    // Tudo ou nada: a ordem é travada primeiro, depois todos os produtos
    // (componentes + kit) em ordem crescente de id; o estoque de cada
    // componente é conferido antes de qualquer escrita.
    pub async fn add_progress(&self, order_id: Uuid, quantity: i32) -> Result<ProductionOrder, AppError> {
        if quantity < 1 {
            return Err(AppError::field("quantity", "A quantidade deve ser no mínimo 1."));
        }

        let mut tx = self.store.begin().await?;
        let order = lock_order(tx.as_mut(), order_id).await?;

        let next_status = order.status.after_progress()?;
        if quantity > order.remaining() {
            return Err(AppError::field(
                "quantity",
                format!(
                    "A quantidade excede o solicitado. Restam {} unidades a produzir.",
                    order.remaining()
                ),
            ));
        }

        let components = tx.list_components(order.product_id).await?;
        if components.is_empty() {
            tracing::warn!(order_id = %order.id, product_id = %order.product_id, "Kit sem componentes");
            return Err(AppError::Configuration(
                "O kit não possui componentes definidos. Configure a receita antes de produzir.".to_string(),
            ));
        }

        let mut requirements = Vec::with_capacity(components.len());
        for detail in &components {
            let required = component_requirement(
                detail.component.quantity_required,
                order.quantity_produced,
                quantity,
            )?;
            if required > 0 {
                requirements.push(Requirement {
                    product_id: detail.component.component_product_id,
                    quantity: required,
                });
            }
        }
        requirements.sort_by_key(|r| r.product_id);

        let mut ids: Vec<Uuid> = requirements.iter().map(|r| r.product_id).collect();
        ids.push(order.product_id);
        let locked: HashMap<Uuid, _> = tx
            .lock_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        for requirement in &requirements {
            let product = locked
                .get(&requirement.product_id)
                .ok_or_else(|| AppError::not_found("Produto", requirement.product_id))?;
            if product.stock < requirement.quantity {
                tracing::warn!(
                    order_id = %order.id,
                    component_id = %product.id,
                    required = requirement.quantity,
                    available = product.stock,
                    "Progresso recusado: estoque insuficiente"
                );
                return Err(AppError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name.clone(),
                    required: i64::from(requirement.quantity),
                    available: i64::from(product.stock),
                });
            }
        }

        let reference = MovementReference::production_order(order.id);
        for requirement in &requirements {
            let consumption = NewMovement::new(
                requirement.product_id,
                -requirement.quantity,
                MovementType::ProductionConsumption,
            )
            .referencing(reference)
            .with_notes(format!("Consumo para a ordem {}", order.order_number));
            post_movement(tx.as_mut(), consumption).await?;
        }

        let produced = order.quantity_produced + quantity;
        let updated = tx.save_order_state(order.id, produced, next_status).await?;

        let entry = NewMovement::new(order.product_id, quantity, MovementType::ProductionEntry)
            .referencing(reference)
            .with_notes(format!("Produção da ordem {}", order.order_number));
        post_movement(tx.as_mut(), entry).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %updated.id,
            quantity,
            quantity_produced = updated.quantity_produced,
            components = requirements.len(),
            status = updated.status.label(),
            "Progresso de produção registrado"
        );
        Ok(updated)
    }

    // --- DELIVER ---
    pub async fn deliver(
        &self,
        order_id: Uuid,
        delivery_date: NaiveDate,
        unit_price: Decimal,
    ) -> Result<ProductionOrder, AppError> {
        if unit_price.is_sign_negative() {
            return Err(AppError::field("unit_price", "O preço unitário não pode ser negativo."));
        }

        let mut tx = self.store.begin().await?;
        let order = lock_order(tx.as_mut(), order_id).await?;

        order.status.ensure_open()?;
        if order.quantity_produced == 0 {
            return Err(AppError::field(
                "quantity_produced",
                "Nenhuma unidade foi produzida; não há o que entregar.",
            ));
        }
        let next_status = order.status.transition_to(OrderStatus::Completed)?;

        let total_price = Decimal::from(order.quantity_produced) * unit_price;
        let sale = NewMovement::new(order.product_id, -order.quantity_produced, MovementType::Sale)
            .priced(unit_price, total_price)
            .referencing(MovementReference::production_order(order.id))
            .with_notes(format!("Entrega da ordem {}", order.order_number))
            .at(start_of_day(delivery_date));
        post_movement(tx.as_mut(), sale).await?;

        let updated = tx
            .save_order_state(order.id, order.quantity_produced, next_status)
            .await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %updated.id,
            quantity = updated.quantity_produced,
            %total_price,
            %delivery_date,
            "Ordem entregue"
        );
        Ok(updated)
    }

    // --- UPDATE STATUS ---
    // Troca manual, sem efeito em estoque.
    pub async fn update_status(&self, order_id: Uuid, target: OrderStatus) -> Result<ProductionOrder, AppError> {
        if !target.is_manual_target() {
            return Err(AppError::field(
                "status",
                "O status deve ser 'En Progreso' ou 'Cancelado'.",
            ));
        }

        let mut tx = self.store.begin().await?;
        let order = lock_order(tx.as_mut(), order_id).await?;
        let next_status = order.status.transition_to(target)?;

        if next_status == order.status {
            return Ok(order);
        }

        let updated = tx
            .save_order_state(order.id, order.quantity_produced, next_status)
            .await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %updated.id,
            from = order.status.label(),
            to = updated.status.label(),
            "Status da ordem alterado"
        );
        Ok(updated)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<ProductionOrderDetail, AppError> {
        let mut tx = self.store.begin().await?;
        let order = tx
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Ordem de produção", order_id))?;
        let product_name = tx
            .find_product(order.product_id)
            .await?
            .map(|p| p.name)
            .unwrap_or_default();
        tx.commit().await?;
        Ok(ProductionOrderDetail { order, product_name })
    }

    pub async fn list(&self, filter: OrderFilter) -> Result<Vec<ProductionOrderDetail>, AppError> {
        let mut tx = self.store.begin().await?;
        let orders = tx.list_orders(&filter).await?;
        tx.commit().await?;
        Ok(orders)
    }

    /// Todos os produtos com as ordens ainda abertas de cada um.
    pub async fn public_inventory(&self) -> Result<Vec<PublicInventoryEntry>, AppError> {
        let mut tx = self.store.begin().await?;
        let products = tx.list_products(&Default::default()).await?;
        let active = tx
            .list_orders(&OrderFilter {
                statuses: OrderStatus::ACTIVE.to_vec(),
                product_id: None,
            })
            .await?;
        tx.commit().await?;

        let mut by_product: HashMap<Uuid, Vec<ActiveOrderSummary>> = HashMap::new();
        for detail in active {
            let order = detail.order;
            by_product.entry(order.product_id).or_default().push(ActiveOrderSummary {
                id: order.id,
                quantity_requested: order.quantity_requested,
                quantity_produced: order.quantity_produced,
                status: order.status,
            });
        }

        Ok(products
            .into_iter()
            .map(|p| PublicInventoryEntry {
                active_orders: by_product.remove(&p.id).unwrap_or_default(),
                id: p.id,
                name: p.name,
                stock: p.stock,
                category: p.category,
            })
            .collect())
    }
}
