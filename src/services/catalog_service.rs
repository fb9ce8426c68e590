// src/services/catalog_service.rs

use std::sync::Arc;

use uuid::Uuid;

use super::ledger_service::post_movement;
use crate::{
    common::error::AppError,
    db::InventoryStore,
    models::{
        catalog::{LedgerBalance, NewProduct, Product, ProductChanges, ProductFilter},
        ledger::{MovementType, NewMovement},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn InventoryStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    // --- CREATE PRODUCT ---
    // O estoque inicial entra como `Ajuste` para que a soma do livro-razão
    // bata com `stock` desde a primeira linha.
    pub async fn create(&self, new: NewProduct, initial_stock: i32) -> Result<Product, AppError> {
        if initial_stock < 0 {
            return Err(AppError::field("stock", "O estoque não pode ser negativo."));
        }

        let mut tx = self.store.begin().await?;
        let mut product = tx.insert_product(&new).await?;

        if initial_stock > 0 {
            let movement = NewMovement::new(product.id, initial_stock, MovementType::Adjustment)
                .with_notes("Estoque inicial");
            let (_, updated) = post_movement(tx.as_mut(), movement).await?;
            product = updated;
        }

        tx.commit().await?;

        tracing::info!(product_id = %product.id, stock = product.stock, "Produto criado");
        Ok(product)
    }

    // --- UPDATE PRODUCT ---
    // Um `stock` diferente do atual vira um `Ajuste` com a diferença.
    pub async fn update(&self, id: Uuid, changes: ProductChanges, stock: i32) -> Result<Product, AppError> {
        if stock < 0 {
            return Err(AppError::field("stock", "O estoque não pode ser negativo."));
        }

        let mut tx = self.store.begin().await?;
        let current = tx
            .lock_products(&[id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("Produto", id))?;

        let mut product = tx.update_product(id, &changes).await?;

        let delta = stock - current.stock;
        if delta != 0 {
            let movement = NewMovement::new(id, delta, MovementType::Adjustment)
                .with_notes("Ajuste de estoque na edição do produto");
            let (_, updated) = post_movement(tx.as_mut(), movement).await?;
            product = updated;
        }

        tx.commit().await?;

        tracing::info!(product_id = %id, delta, stock = product.stock, "Produto atualizado");
        Ok(product)
    }

    // --- DELETE PRODUCT ---
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.store.begin().await?;
        if tx.lock_products(&[id]).await?.is_empty() {
            return Err(AppError::not_found("Produto", id));
        }

        let references = tx.count_product_references(id).await?;
        if references.movements > 0 || references.production_orders > 0 {
            tracing::warn!(
                product_id = %id,
                movements = references.movements,
                production_orders = references.production_orders,
                "Exclusão bloqueada por histórico"
            );
            return Err(AppError::Conflict(format!(
                "O produto possui {} movimentações e {} ordens de produção e não pode ser excluído.",
                references.movements, references.production_orders
            )));
        }

        tx.delete_product(id).await?;
        tx.commit().await?;

        tracing::info!(product_id = %id, "Produto excluído");
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Product, AppError> {
        let mut tx = self.store.begin().await?;
        let product = tx.find_product(id).await?;
        tx.commit().await?;
        product.ok_or_else(|| AppError::not_found("Produto", id))
    }

    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut tx = self.store.begin().await?;
        let products = tx.list_products(&filter).await?;
        tx.commit().await?;
        Ok(products)
    }

    /// Compara o cache `stock` com a soma do livro-razão.
    pub async fn ledger_balance(&self, id: Uuid) -> Result<LedgerBalance, AppError> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .find_product(id)
            .await?
            .ok_or_else(|| AppError::not_found("Produto", id))?;
        let ledger_total = tx.ledger_total(id).await?;
        tx.commit().await?;

        let in_sync = i64::from(product.stock) == ledger_total;
        if !in_sync {
            tracing::warn!(product_id = %id, stock = product.stock, ledger_total, "Estoque divergente do livro-razão");
        }
        Ok(LedgerBalance {
            product_id: id,
            stock: product.stock,
            ledger_total,
            in_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::catalog::{ProductCategory, UnitOfMeasure},
    };

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryStore::new()))
    }

    fn new_product(name: &str, sku: Option<&str>) -> NewProduct {
        NewProduct {
            name: name.into(),
            sku: sku.map(Into::into),
            description: None,
            category: ProductCategory::Material,
            unit_of_measure: UnitOfMeasure::Pieza,
            is_kit: false,
        }
    }

    fn changes_from(p: &Product) -> ProductChanges {
        ProductChanges {
            name: p.name.clone(),
            sku: p.sku.clone(),
            description: p.description.clone(),
            category: p.category,
            unit_of_measure: p.unit_of_measure,
            is_kit: p.is_kit,
        }
    }

    #[tokio::test]
    async fn initial_stock_is_backed_by_the_ledger() {
        let svc = service();
        let p = svc.create(new_product("Frasco", None), 8).await.unwrap();
        assert_eq!(p.stock, 8);

        let balance = svc.ledger_balance(p.id).await.unwrap();
        assert_eq!(balance.ledger_total, 8);
        assert!(balance.in_sync);
    }

    #[tokio::test]
    async fn duplicate_sku_is_rejected() {
        let svc = service();
        svc.create(new_product("A", Some("SKU-1")), 0).await.unwrap();
        let err = svc.create(new_product("B", Some("SKU-1")), 0).await.unwrap_err();
        assert!(matches!(err, AppError::Duplicate(_)));
    }

    #[tokio::test]
    async fn stock_edit_posts_the_difference() {
        let svc = service();
        let p = svc.create(new_product("Tapa", None), 10).await.unwrap();

        let mut changes = changes_from(&p);
        changes.name = "Tapa rosca".into();
        let updated = svc.update(p.id, changes.clone(), 4).await.unwrap();
        assert_eq!(updated.stock, 4);
        assert_eq!(updated.name, "Tapa rosca");

        let balance = svc.ledger_balance(p.id).await.unwrap();
        assert_eq!(balance.ledger_total, 4);

        assert!(matches!(
            svc.update(p.id, changes, -1).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_blocked_by_ledger_history() {
        let svc = service();
        let with_history = svc.create(new_product("Etiqueta", None), 2).await.unwrap();
        let clean = svc.create(new_product("Caja", None), 0).await.unwrap();

        assert!(matches!(svc.delete(with_history.id).await, Err(AppError::Conflict(_))));
        assert!(svc.get(with_history.id).await.is_ok());

        svc.delete(clean.id).await.unwrap();
        assert!(matches!(svc.get(clean.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name_and_filtered() {
        let svc = service();
        svc.create(new_product("Zeta", None), 0).await.unwrap();
        svc.create(new_product("Alfa", None), 0).await.unwrap();

        let names: Vec<String> = svc
            .list(ProductFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);

        let kits = svc
            .list(ProductFilter { is_kit: Some(true), category: None })
            .await
            .unwrap();
        assert!(kits.is_empty());
    }
}
