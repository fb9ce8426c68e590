// src/services/kit_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryStore, StoreTx},
    models::{
        catalog::Product,
        kit::{KitComponent, KitComponentDetail},
    },
};

fn validate_quantity_required(quantity: Decimal) -> Result<(), AppError> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::field("quantity_required", "A quantidade deve ser maior que zero."));
    }
    if quantity.normalize().scale() > 2 {
        return Err(AppError::field("quantity_required", "Use no máximo duas casas decimais."));
    }
    // NUMERIC(10,2)
    if quantity >= Decimal::from(100_000_000) {
        return Err(AppError::field("quantity_required", "Quantidade acima do limite suportado."));
    }
    Ok(())
}

async fn load_kit(tx: &mut dyn StoreTx, kit_id: Uuid) -> Result<Product, AppError> {
    let kit = tx
        .find_product(kit_id)
        .await?
        .ok_or_else(|| AppError::not_found("Produto", kit_id))?;
    if !kit.is_kit {
        return Err(AppError::InvalidState(format!("O produto '{}' não é um kit.", kit.name)));
    }
    Ok(kit)
}

#[derive(Clone)]
pub struct KitService {
    store: Arc<dyn InventoryStore>,
}

impl KitService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, kit_id: Uuid) -> Result<Vec<KitComponentDetail>, AppError> {
        let mut tx = self.store.begin().await?;
        load_kit(tx.as_mut(), kit_id).await?;
        let components = tx.list_components(kit_id).await?;
        tx.commit().await?;
        Ok(components)
    }

    pub async fn add(
        &self,
        kit_id: Uuid,
        component_id: Uuid,
        quantity_required: Decimal,
    ) -> Result<KitComponent, AppError> {
        validate_quantity_required(quantity_required)?;

        let mut tx = self.store.begin().await?;
        load_kit(tx.as_mut(), kit_id).await?;

        if component_id == kit_id {
            return Err(AppError::field(
                "component_product_id",
                "Um kit não pode ser componente de si mesmo.",
            ));
        }
        if tx.find_product(component_id).await?.is_none() {
            return Err(AppError::not_found("Produto", component_id));
        }
        if tx.find_component_pair(kit_id, component_id).await?.is_some() {
            return Err(AppError::Duplicate("Este componente já existe no kit.".to_string()));
        }

        let component = tx.insert_component(kit_id, component_id, quantity_required).await?;
        tx.commit().await?;

        tracing::info!(
            kit_id = %kit_id,
            component_id = %component_id,
            %quantity_required,
            "Componente adicionado ao kit"
        );
        Ok(component)
    }

    pub async fn update(&self, id: Uuid, quantity_required: Decimal) -> Result<KitComponent, AppError> {
        validate_quantity_required(quantity_required)?;

        let mut tx = self.store.begin().await?;
        let component = tx.update_component_quantity(id, quantity_required).await?;
        tx.commit().await?;

        tracing::info!(component_row = %id, %quantity_required, "Quantidade do componente atualizada");
        Ok(component)
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        tx.delete_component(id).await?;
        tx.commit().await?;

        tracing::info!(component_row = %id, "Componente removido do kit");
        Ok(())
    }
}
