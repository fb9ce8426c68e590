use std::sync::Arc;

use rust_decimal::Decimal;

use kit_ledger::{
    common::error::AppError,
    db::{InventoryStore, MemoryStore},
    models::{
        catalog::{NewProduct, ProductCategory, UnitOfMeasure},
        production::NewOrder,
    },
    services::{CatalogService, KitService, LedgerService, ProductionService},
};

fn new_product(name: &str, is_kit: bool) -> NewProduct {
    NewProduct {
        name: name.into(),
        sku: None,
        description: None,
        category: if is_kit { ProductCategory::KitTerminado } else { ProductCategory::Material },
        unit_of_measure: UnitOfMeasure::Pieza,
        is_kit,
    }
}

// 20 progressos concorrentes de 1 unidade com componente suficiente para 10:
// exatamente 10 passam e o estoque nunca fica negativo.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_progress_never_oversells_components() {
    let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store.clone());
    let kits = KitService::new(store.clone());
    let ledger = LedgerService::new(store.clone());
    let orders = ProductionService::new(store, "OP");

    let kit = catalog.create(new_product("K", true), 0).await.unwrap();
    let component = catalog.create(new_product("C", false), 10).await.unwrap();
    kits.add(kit.id, component.id, Decimal::ONE).await.unwrap();
    let order = orders
        .create(NewOrder {
            product_id: kit.id,
            quantity_requested: 20,
            due_date: None,
            notes: None,
        })
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let orders = orders.clone();
        let order_id = order.id;
        tasks.push(tokio::spawn(async move { orders.add_progress(order_id, 1).await }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(AppError::InsufficientStock { .. }) => {}
            Err(other) => panic!("erro inesperado: {:?}", other),
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(catalog.get(component.id).await.unwrap().stock, 0);
    assert_eq!(catalog.get(kit.id).await.unwrap().stock, 10);
    assert_eq!(orders.get(order.id).await.unwrap().order.quantity_produced, 10);
    assert_eq!(ledger.movements_for_order(order.id).await.unwrap().len(), 20);

    for id in [kit.id, component.id] {
        assert!(catalog.ledger_balance(id).await.unwrap().in_sync);
    }
}

// Duas ordens disputando o mesmo componente.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn competing_orders_share_component_stock_safely() {
    let store: Arc<dyn InventoryStore> = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store.clone());
    let kits = KitService::new(store.clone());
    let orders = ProductionService::new(store, "OP");

    let kit = catalog.create(new_product("K", true), 0).await.unwrap();
    let component = catalog.create(new_product("C", false), 9).await.unwrap();
    kits.add(kit.id, component.id, Decimal::from(3)).await.unwrap();

    let mut ids = Vec::new();
    for _ in 0..2 {
        let order = orders
            .create(NewOrder {
                product_id: kit.id,
                quantity_requested: 2,
                due_date: None,
                notes: None,
            })
            .await
            .unwrap();
        ids.push(order.id);
    }

    // cada chamada pede 6; só uma cabe em 9
    let handles: Vec<_> = ids
        .iter()
        .map(|&id| {
            let orders = orders.clone();
            tokio::spawn(async move { orders.add_progress(id, 2).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("task panicked").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(catalog.get(component.id).await.unwrap().stock, 3);
    assert_eq!(catalog.get(kit.id).await.unwrap().stock, 2);
}
