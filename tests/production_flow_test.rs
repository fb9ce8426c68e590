mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn kit_production_and_delivery_scenario() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let component = app.seed_product("C", false, 10).await;
    app.seed_component(&kit, &component, 2.0).await;
    let order = app.seed_order(&kit, 3).await;

    let (status, body) = app.get(&format!("/api/production-orders/{order}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Pendiente");
    assert_eq!(body["order_number"], "OP-0001");
    assert_eq!(body["product_name"], "K");

    // AddProgress(3): consome 6 de C, credita 3 em K
    let (status, body) = app
        .post(&format!("/api/production-orders/{order}/add-progress"), json!({ "quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "En Progreso");
    assert_eq!(body["quantity_produced"], 3);
    assert_eq!(app.stock_of(&component).await, 4);
    assert_eq!(app.stock_of(&kit).await, 3);

    let (_, rows) = app.get(&format!("/api/production-orders/{order}/movements")).await;
    let rows = rows.as_array().unwrap();
    assert!(rows.iter().any(|m| m["product_id"] == component.as_str()
        && m["quantity"] == -6
        && m["type"] == "Consumo_Produccion"
        && m["reference"]["id"] == order.as_str()));
    assert!(rows.iter().any(|m| m["product_id"] == kit.as_str()
        && m["quantity"] == 3
        && m["type"] == "Entrada_Produccion"));

    // nada mais a produzir
    let (status, body) = app
        .post(&format!("/api/production-orders/{order}/add-progress"), json!({ "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["quantity"].is_array());
    assert_eq!(app.stock_of(&component).await, 4);

    // Deliver(50): venda de -3 com total 150, data retroativa
    let (status, body) = app
        .post(
            &format!("/api/production-orders/{order}/deliver"),
            json!({ "delivery_date": "2025-01-15", "unit_price": 50 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "Completado");
    assert_eq!(app.stock_of(&kit).await, 0);

    let (_, page) = app.get("/api/inventory-movements?type=Venta&date_start=&date_end=").await;
    assert_eq!(page["total"], 1);
    let sale = &page["data"][0];
    assert_eq!(sale["quantity"], -3);
    assert_eq!(sale["total_price"].as_f64(), Some(150.0));
    assert!(sale["created_at"].as_str().unwrap().starts_with("2025-01-15T00:00:00"));

    let (status, sales) = app
        .get("/api/production-orders/financials?date_start=2025-01-01&date_end=2025-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales, json!([{ "date": "2025-01-15", "total": 150.0 }]));

    for product in [&kit, &component] {
        app.assert_ledger_in_sync(product).await;
    }

    // ordem concluída não aceita mais nada; cada recusa deixa estoque e livro-razão intactos
    let ledger_rows = app.order_movement_count(&order).await;
    let (_, all_before) = app.get("/api/inventory-movements").await;

    let rejected = [
        (Method::POST, format!("/api/production-orders/{order}/add-progress"), Some(json!({ "quantity": 1 }))),
        (
            Method::POST,
            format!("/api/production-orders/{order}/deliver"),
            Some(json!({ "delivery_date": "2025-01-20", "unit_price": 50 })),
        ),
        (Method::PATCH, format!("/api/production-orders/{order}/status"), Some(json!({ "status": "Cancelled" }))),
    ];
    for (method, uri, body) in rejected {
        let (status, response) = app.request(method, &uri, body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}: {response}");
        assert_eq!(app.stock_of(&kit).await, 0);
        assert_eq!(app.stock_of(&component).await, 4);
        assert_eq!(app.order_movement_count(&order).await, ledger_rows);
        let (_, all_after) = app.get("/api/inventory-movements").await;
        assert_eq!(all_after["total"], all_before["total"]);
    }

    let (_, body) = app.get(&format!("/api/production-orders/{order}")).await;
    assert_eq!(body["status"], "Completado");
}

#[tokio::test]
async fn insufficient_component_names_it_and_changes_nothing() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let plenty = app.seed_product("Plenty", false, 50).await;
    let scarce = app.seed_product("Scarce", false, 3).await;
    app.seed_component(&kit, &plenty, 1.0).await;
    app.seed_component(&kit, &scarce, 2.0).await;
    let order = app.seed_order(&kit, 5).await;

    let (status, body) = app
        .post(&format!("/api/production-orders/{order}/add-progress"), json!({ "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["component"]["product_id"], scarce.as_str());
    assert_eq!(body["component"]["name"], "Scarce");
    assert_eq!(body["component"]["required"], 4);
    assert_eq!(body["component"]["available"], 3);

    assert_eq!(app.stock_of(&plenty).await, 50);
    assert_eq!(app.stock_of(&scarce).await, 3);
    assert_eq!(app.stock_of(&kit).await, 0);
    let (_, rows) = app.get(&format!("/api/production-orders/{order}/movements")).await;
    assert_eq!(rows, json!([]));
    let (_, body) = app.get(&format!("/api/production-orders/{order}")).await;
    assert_eq!(body["status"], "Pendiente");
    assert_eq!(body["quantity_produced"], 0);
}

#[tokio::test]
async fn deliver_without_production_is_rejected() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let order = app.seed_order(&kit, 2).await;

    let (status, body) = app
        .post(
            &format!("/api/production-orders/{order}/deliver"),
            json!({ "delivery_date": "2025-02-01", "unit_price": 10 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["quantity_produced"].is_array());

    let (_, body) = app.get(&format!("/api/production-orders/{order}")).await;
    assert_eq!(body["status"], "Pendiente");
}

#[tokio::test]
async fn kit_without_recipe_cannot_progress() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let order = app.seed_order(&kit, 1).await;

    let (status, body) = app
        .post(&format!("/api/production-orders/{order}/add-progress"), json!({ "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("componentes"));
}

#[tokio::test]
async fn catalog_rules_surface_as_http_errors() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let component = app.seed_product("C", false, 5).await;
    let plain = app.seed_product("Plain", false, 0).await;

    // par duplicado
    app.seed_component(&kit, &component, 1.0).await;
    let (status, _) = app
        .post(
            &format!("/api/products/{kit}/components"),
            json!({ "component_product_id": component, "quantity_required": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // alvo não é kit
    let (status, _) = app
        .post(
            &format!("/api/products/{plain}/components"),
            json!({ "component_product_id": component, "quantity_required": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // ordem para produto que não é kit
    let (status, body) = app
        .post("/api/production-orders", json!({ "product_id": plain, "quantity_requested": 1 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["product_id"].is_array());

    // quantidade inválida
    let (status, body) = app
        .post("/api/production-orders", json!({ "product_id": kit, "quantity_requested": 0 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["quantity_requested"].is_array());

    // exclusão bloqueada por histórico (estoque inicial gerou movimentação)
    let (status, _) = app
        .request(Method::DELETE, &format!("/api/products/{component}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app.request(Method::DELETE, &format!("/api/products/{plain}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/products/{plain}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn manual_movements_and_public_views() {
    let app = TestApp::new();
    let product = app.seed_product("Crema", false, 2).await;

    let (status, body) = app
        .post(
            "/api/inventory-movements",
            json!({ "product_id": product, "type": "Compra", "quantity": 8, "unit_price": 1.5 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(app.stock_of(&product).await, 10);

    let (status, _) = app
        .post(
            "/api/inventory-movements",
            json!({ "product_id": product, "type": "Venta", "quantity": -20, "unit_price": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .post(
            "/api/inventory-movements",
            json!({ "product_id": product, "type": "Venta", "quantity": -4, "unit_price": 4 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    app.assert_ledger_in_sync(&product).await;

    let (status, history) = app.get("/api/public/sales-history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["total"], 1);
    assert_eq!(history["data"][0]["quantity"], -4);
    assert!(history["data"][0].get("total_price").is_none());

    let (status, inventory) = app.get("/api/public/inventory").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inventory[0]["stock"], 6);
    assert_eq!(inventory[0]["active_orders"], json!([]));
}

#[tokio::test]
async fn public_sales_history_filters_by_whole_days() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let component = app.seed_product("C", false, 10).await;
    app.seed_component(&kit, &component, 1.0).await;

    for (quantity, date) in [(1, "2025-03-01"), (2, "2025-03-10"), (3, "2025-04-02")] {
        let order = app.seed_order(&kit, quantity).await;
        let (status, _) = app
            .post(&format!("/api/production-orders/{order}/add-progress"), json!({ "quantity": quantity }))
            .await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = app
            .post(
                &format!("/api/production-orders/{order}/deliver"),
                json!({ "delivery_date": date, "unit_price": 5 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // dias inteiros, ambos inclusivos: 2025-03-01 e 2025-03-10 entram, abril fica de fora
    let (status, page) = app
        .get("/api/public/sales-history?date_start=2025-03-01&date_end=2025-03-10")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"][0]["quantity"], -2);
    assert_eq!(page["data"][1]["quantity"], -1);

    let (_, page) = app.get("/api/public/sales-history?date_start=2025-03-02&date_end=").await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"][0]["quantity"], -3);

    let (_, page) = app.get("/api/public/sales-history?date_start=&date_end=&page=").await;
    assert_eq!(page["total"], 3);

    let (status, body) = app
        .get("/api/public/sales-history?date_start=2025-04-01&date_end=2025-03-01")
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["details"]["date_end"].is_array());
}

#[tokio::test]
async fn listing_orders_filters_by_status() {
    let app = TestApp::new();
    let kit = app.seed_product("K", true, 0).await;
    let first = app.seed_order(&kit, 1).await;
    let second = app.seed_order(&kit, 2).await;

    let (status, _) = app
        .request(
            Method::PATCH,
            &format!("/api/production-orders/{second}/status"),
            Some(json!({ "status": "Cancelado" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, pending) = app.get("/api/production-orders?status=Pendiente&product_id=").await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], first.as_str());

    let (_, all) = app.get("/api/production-orders").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("OK"));

    let (status, doc) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/production-orders/{id}/add-progress"].is_object());
}
