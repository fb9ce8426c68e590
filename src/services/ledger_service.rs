// src/services/ledger_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{Page, PageRequest},
    },
    db::{InventoryStore, StoreTx},
    models::{
        catalog::Product,
        ledger::{
            DailySales, DateRange, InventoryMovement, ManualMovement, MovementDetail, MovementFilter,
            MovementReference, MovementType, NewMovement, PublicSaleEntry,
        },
    },
};

// ---
// Porta do livro-razão
// ---
// Único caminho que altera `products.stock`: trava a linha do produto, confere
// o saldo, grava a movimentação e aplica o delta, tudo na transação recebida.
pub async fn post_movement(
    tx: &mut dyn StoreTx,
    movement: NewMovement,
) -> Result<(InventoryMovement, Product), AppError> {
    if movement.quantity == 0 {
        return Err(AppError::field("quantity", "A quantidade não pode ser zero."));
    }

    let product = tx
        .lock_products(&[movement.product_id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("Produto", movement.product_id))?;

    let available = i64::from(product.stock);
    if available + i64::from(movement.quantity) < 0 {
        tracing::warn!(
            product_id = %product.id,
            available,
            quantity = movement.quantity,
            "Lançamento recusado: estoque insuficiente"
        );
        return Err(AppError::InsufficientStock {
            product_id: product.id,
            product_name: product.name,
            required: -i64::from(movement.quantity),
            available,
        });
    }

    let row = tx.append_movement(&movement).await?;
    let product = tx.adjust_stock(movement.product_id, movement.quantity).await?;

    tracing::debug!(
        movement_id = %row.id,
        product_id = %product.id,
        quantity = row.quantity,
        movement_type = ?row.movement_type,
        stock = product.stock,
        "Movimentação lançada"
    );
    Ok((row, product))
}

/// Regras de sinal e preço dos lançamentos manuais.
fn manual_to_new_movement(input: ManualMovement) -> Result<NewMovement, AppError> {
    if input.quantity == 0 {
        return Err(AppError::field("quantity", "A quantidade não pode ser zero."));
    }

    let mut movement = NewMovement::new(input.product_id, input.quantity, input.movement_type);
    movement.notes = input.notes;

    match input.movement_type {
        MovementType::Purchase => {
            if input.quantity < 0 {
                return Err(AppError::field("quantity", "Compras devem ter quantidade positiva."));
            }
            movement.unit_price = input.unit_price;
            movement.total_price = match (input.total_price, input.unit_price) {
                (Some(total), _) => Some(total),
                (None, Some(unit)) => Some(unit * Decimal::from(input.quantity)),
                (None, None) => None,
            };
        }
        MovementType::Sale => {
            if input.quantity > 0 {
                return Err(AppError::field("quantity", "Vendas devem ter quantidade negativa."));
            }
            let unit = input
                .unit_price
                .ok_or_else(|| AppError::field("unit_price", "O preço unitário é obrigatório em vendas."))?;
            let total = input
                .total_price
                .unwrap_or_else(|| unit * Decimal::from(input.quantity.unsigned_abs()));
            movement = movement.priced(unit, total);
        }
        MovementType::Adjustment => {
            movement.unit_price = input.unit_price;
            movement.total_price = input.total_price;
        }
        MovementType::ProductionConsumption | MovementType::ProductionEntry => {
            return Err(AppError::field(
                "type",
                "Movimentações de produção só podem ser geradas pelas ordens de produção.",
            ));
        }
    }

    if movement.unit_price.is_some_and(|p| p.is_sign_negative())
        || movement.total_price.is_some_and(|p| p.is_sign_negative())
    {
        return Err(AppError::field("unit_price", "O preço não pode ser negativo."));
    }
    Ok(movement)
}

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn InventoryStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self { store }
    }

    pub async fn record_manual_movement(&self, input: ManualMovement) -> Result<InventoryMovement, AppError> {
        let movement = manual_to_new_movement(input)?;

        let mut tx = self.store.begin().await?;
        let (row, product) = post_movement(tx.as_mut(), movement).await?;
        tx.commit().await?;

        tracing::info!(
            movement_id = %row.id,
            product_id = %row.product_id,
            quantity = row.quantity,
            movement_type = ?row.movement_type,
            stock = product.stock,
            "Movimentação manual registrada"
        );
        Ok(row)
    }

    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        page: PageRequest,
    ) -> Result<Page<MovementDetail>, AppError> {
        ensure_range(&filter.range)?;

        let mut tx = self.store.begin().await?;
        let movements = tx.list_movements(&filter, page).await?;
        tx.commit().await?;
        Ok(movements)
    }

    /// Linhas do livro-razão geradas por uma ordem (consumos, entradas e venda).
    pub async fn movements_for_order(&self, order_id: Uuid) -> Result<Vec<InventoryMovement>, AppError> {
        let mut tx = self.store.begin().await?;
        if tx.find_order(order_id).await?.is_none() {
            return Err(AppError::not_found("Ordem de produção", order_id));
        }
        let movements = tx
            .movements_by_reference(&MovementReference::production_order(order_id))
            .await?;
        tx.commit().await?;
        Ok(movements)
    }

    pub async fn daily_sales(&self, range: DateRange) -> Result<Vec<DailySales>, AppError> {
        ensure_range(&range)?;

        let mut tx = self.store.begin().await?;
        let sales = tx.daily_sales(&range).await?;
        tx.commit().await?;
        Ok(sales)
    }

    /// Vendas sem preços, mais recentes primeiro, opcionalmente num intervalo de dias.
    pub async fn public_sales_history(
        &self,
        range: DateRange,
        page: PageRequest,
    ) -> Result<Page<PublicSaleEntry>, AppError> {
        ensure_range(&range)?;

        let filter = MovementFilter {
            movement_type: Some(MovementType::Sale),
            product_id: None,
            range,
        };

        let mut tx = self.store.begin().await?;
        let sales = tx.list_movements(&filter, page).await?;
        tx.commit().await?;
        Ok(sales.map(PublicSaleEntry::from))
    }
}

fn ensure_range(range: &DateRange) -> Result<(), AppError> {
    if range.is_inverted() {
        return Err(AppError::field(
            "date_end",
            "A data final deve ser igual ou posterior à data inicial.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        models::catalog::{NewProduct, ProductCategory, UnitOfMeasure},
        services::catalog_service::CatalogService,
    };
    use chrono::NaiveDate;
    use std::str::FromStr;

    struct Fixture {
        catalog: CatalogService,
        ledger: LedgerService,
    }

    fn fixture() -> Fixture {
        let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
        Fixture {
            catalog: CatalogService::new(store.clone()),
            ledger: LedgerService::new(store),
        }
    }

    async fn insumo(f: &Fixture, stock: i32) -> Product {
        let new = NewProduct {
            name: "Cera".into(),
            sku: None,
            description: None,
            category: ProductCategory::Insumo,
            unit_of_measure: UnitOfMeasure::Gramo,
            is_kit: false,
        };
        f.catalog.create(new, stock).await.unwrap()
    }

    fn manual(product_id: Uuid, movement_type: MovementType, quantity: i32) -> ManualMovement {
        ManualMovement {
            product_id,
            movement_type,
            quantity,
            unit_price: None,
            total_price: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn purchase_increases_stock_and_ledger() {
        let f = fixture();
        let p = insumo(&f, 5).await;

        f.ledger
            .record_manual_movement(manual(p.id, MovementType::Purchase, 7))
            .await
            .unwrap();

        let balance = f.catalog.ledger_balance(p.id).await.unwrap();
        assert_eq!(balance.stock, 12);
        assert_eq!(balance.ledger_total, 12);
        assert!(balance.in_sync);
    }

    #[tokio::test]
    async fn sale_requires_unit_price_and_derives_total() {
        let f = fixture();
        let p = insumo(&f, 10).await;

        let err = f
            .ledger
            .record_manual_movement(manual(p.id, MovementType::Sale, -2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let mut sale = manual(p.id, MovementType::Sale, -4);
        sale.unit_price = Some(Decimal::from_str("12.50").unwrap());
        let row = f.ledger.record_manual_movement(sale).await.unwrap();
        assert_eq!(row.total_price, Some(Decimal::from(50)));
    }

    #[tokio::test]
    async fn negative_adjustment_cannot_drive_stock_below_zero() {
        let f = fixture();
        let p = insumo(&f, 3).await;

        let err = f
            .ledger
            .record_manual_movement(manual(p.id, MovementType::Adjustment, -4))
            .await
            .unwrap_err();
        match err {
            AppError::InsufficientStock { required, available, .. } => {
                assert_eq!(required, 4);
                assert_eq!(available, 3);
            }
            other => panic!("erro inesperado: {:?}", other),
        }
        assert_eq!(f.catalog.get(p.id).await.unwrap().stock, 3);
    }

    #[tokio::test]
    async fn production_types_are_rejected_for_manual_entry() {
        let f = fixture();
        let p = insumo(&f, 3).await;
        let err = f
            .ledger
            .record_manual_movement(manual(p.id, MovementType::ProductionEntry, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn inverted_financial_range_is_a_validation_error() {
        let f = fixture();
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2025, 3, 10),
            end: NaiveDate::from_ymd_opt(2025, 3, 1),
        };
        assert!(matches!(
            f.ledger.daily_sales(range).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn movements_are_listed_newest_first_with_filters() {
        let f = fixture();
        let p = insumo(&f, 1).await;
        f.ledger
            .record_manual_movement(manual(p.id, MovementType::Purchase, 2))
            .await
            .unwrap();

        let all = f
            .ledger
            .list_movements(MovementFilter::default(), PageRequest::new(None))
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert!(all.data.windows(2).all(|w| w[0].movement.created_at >= w[1].movement.created_at));
        assert!(all.data.iter().all(|m| m.product_name == "Cera"));

        let only_adjustments = MovementFilter {
            movement_type: Some(MovementType::Adjustment),
            ..Default::default()
        };
        let page = f
            .ledger
            .list_movements(only_adjustments, PageRequest::new(None))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].movement.quantity, 1);
    }
}
