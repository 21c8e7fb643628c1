//! End-to-end sale flows against an in-memory database.

use merceria_core::cart::ViolationReason;
use merceria_core::{
    CartItem, CoreError, PaymentMethod, Product, ReceiptView, TaxRate, UnitOfMeasure, UserRole,
};
use merceria_db::{
    Database, DbConfig, NewProduct, NewUser, SaleCoordinator, SaleRequest, ServiceError,
};
use rust_decimal::Decimal;

struct Shop {
    db: Database,
    coordinator: SaleCoordinator,
    cashier_id: i64,
}

async fn shop() -> Shop {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let cashier = db
        .users()
        .insert(&NewUser {
            username: "caja1".to_string(),
            full_name: "Caja Uno".to_string(),
            role: UserRole::Cashier,
        })
        .await
        .unwrap();
    let coordinator = SaleCoordinator::new(db.clone(), TaxRate::default());
    Shop {
        db,
        coordinator,
        cashier_id: cashier.id,
    }
}

async fn add_product(
    db: &Database,
    code: &str,
    unit: UnitOfMeasure,
    stock_units: i64,
    price_cents: i64,
) -> Product {
    db.products()
        .insert(&NewProduct {
            code: code.to_string(),
            name: format!("Producto {code}"),
            description: None,
            unit,
            stock_milli: stock_units * 1000,
            price_cents,
        })
        .await
        .unwrap()
}

async fn stock_of(db: &Database, id: i64) -> i64 {
    db.products().get_by_id(id).await.unwrap().unwrap().stock_milli
}

fn qty(raw: &str) -> Decimal {
    raw.parse().unwrap()
}

#[tokio::test]
async fn test_last_units_sell_once() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 5, 1000).await;
    let request = SaleRequest::new(vec![CartItem::new(a.id, qty("5"))]);

    let committed = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();
    let sale = &committed.record.sale;
    assert_eq!(sale.total_cents, 5000);
    assert_eq!(sale.subtotal_cents, 4237);
    assert_eq!(sale.tax_cents, 763);
    assert_eq!(sale.payment_method, PaymentMethod::Cash);
    assert_eq!(stock_of(&shop.db, a.id).await, 0);

    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();
    match err {
        ServiceError::Core(CoreError::InsufficientStock { shortages }) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].product_id, a.id);
            assert_eq!(shortages[0].requested_milli, 5000);
            assert_eq!(shortages[0].available_milli, 0);
            assert_eq!(shortages[0].to_string(), "A: requested 5, available 0");
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(stock_of(&shop.db, a.id).await, 0);
    assert_eq!(shop.db.sales().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_override_price_leaves_catalog_alone() {
    let shop = shop().await;
    let b = add_product(&shop.db, "B", UnitOfMeasure::Unit, 10, 2000).await;
    let request = SaleRequest::new(vec![CartItem::new(b.id, qty("2")).with_override(qty("15.00"))]);

    let committed = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();
    let item = &committed.record.items[0];
    assert_eq!(item.line_subtotal_cents, 3000);
    assert_eq!(item.unit_price_cents, 1500);
    assert!(item.was_override);

    let after = shop.db.products().get_by_id(b.id).await.unwrap().unwrap();
    assert_eq!(after.price_cents, 2000);
}

#[tokio::test]
async fn test_total_equals_sum_of_lines() {
    let shop = shop().await;
    let ribbon = add_product(&shop.db, "CIN-01", UnitOfMeasure::Meter, 100, 333).await;
    let lace = add_product(&shop.db, "ENC-01", UnitOfMeasure::Meter, 100, 199).await;
    let buttons = add_product(&shop.db, "BOT-01", UnitOfMeasure::Dozen, 100, 875).await;

    let request = SaleRequest::new(vec![
        CartItem::new(ribbon.id, qty("1.5")),
        CartItem::new(lace.id, qty("0.75")),
        CartItem::new(buttons.id, qty("3")),
        CartItem::new(ribbon.id, qty("2.25")).with_override(qty("2.99")),
    ]);

    let committed = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();
    let record = &committed.record;
    let lines: i64 = record.items.iter().map(|i| i.line_subtotal_cents).sum();

    assert_eq!(record.sale.total_cents, lines);
    assert_eq!(record.items_total(), record.sale.total());
    assert_eq!(record.sale.subtotal_cents + record.sale.tax_cents, record.sale.total_cents);

    // 1.5 × 3.33 = 4.995 → 5.00; 0.75 × 1.99 = 1.4925 → 1.49
    assert_eq!(record.items[0].line_subtotal_cents, 500);
    assert_eq!(record.items[1].line_subtotal_cents, 149);
}

#[tokio::test]
async fn test_stock_conservation_with_duplicate_lines() {
    let shop = shop().await;
    let ribbon = add_product(&shop.db, "CIN-01", UnitOfMeasure::Meter, 10, 150).await;
    let thread = add_product(&shop.db, "HIL-01", UnitOfMeasure::Unit, 8, 450).await;

    let request = SaleRequest::new(vec![
        CartItem::new(ribbon.id, qty("2.5")),
        CartItem::new(thread.id, qty("3")),
        CartItem::new(ribbon.id, qty("1.25")),
    ]);
    shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();

    assert_eq!(stock_of(&shop.db, ribbon.id).await, 10_000 - 3_750);
    assert_eq!(stock_of(&shop.db, thread.id).await, 8_000 - 3_000);
}

#[tokio::test]
async fn test_duplicate_lines_checked_on_aggregate() {
    let shop = shop().await;
    let thread = add_product(&shop.db, "HIL-01", UnitOfMeasure::Unit, 4, 450).await;

    // Each line fits on its own, together they do not.
    let request = SaleRequest::new(vec![
        CartItem::new(thread.id, qty("3")),
        CartItem::new(thread.id, qty("3")),
    ]);
    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();

    match err {
        ServiceError::Core(CoreError::InsufficientStock { shortages }) => {
            assert_eq!(shortages.len(), 1);
            assert_eq!(shortages[0].requested_milli, 6000);
            assert_eq!(shortages[0].available_milli, 4000);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }
    assert_eq!(stock_of(&shop.db, thread.id).await, 4000);
}

#[tokio::test]
async fn test_every_short_line_is_reported() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 1, 100).await;
    let b = add_product(&shop.db, "B", UnitOfMeasure::Unit, 10, 100).await;
    let c = add_product(&shop.db, "C", UnitOfMeasure::Unit, 0, 100).await;

    let request = SaleRequest::new(vec![
        CartItem::new(a.id, qty("2")),
        CartItem::new(b.id, qty("2")),
        CartItem::new(c.id, qty("1")),
    ]);
    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();

    let ServiceError::Core(CoreError::InsufficientStock { shortages }) = err else {
        panic!("expected InsufficientStock");
    };
    let ids: Vec<i64> = shortages.iter().map(|s| s.product_id).collect();
    assert_eq!(ids, vec![a.id, c.id]);
    assert_eq!(stock_of(&shop.db, b.id).await, 10_000);
    assert_eq!(shop.db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_cart_invalid_collects_all_violations() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 10, 100).await;
    let buttons = add_product(&shop.db, "BOT-01", UnitOfMeasure::Dozen, 10, 900).await;

    let request = SaleRequest::new(vec![
        CartItem::new(0, qty("1")),
        CartItem::new(a.id, qty("-1")),
        CartItem::new(buttons.id, qty("1.5")),
        CartItem::new(9999, qty("1")),
        CartItem::new(a.id, qty("1")).with_override(qty("0")),
    ]);
    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();
    assert!(err.is_client_fault());

    let ServiceError::Core(CoreError::CartInvalid { violations }) = err else {
        panic!("expected CartInvalid");
    };
    let reasons: Vec<(Option<usize>, ViolationReason)> =
        violations.into_iter().map(|v| (v.line, v.reason)).collect();
    assert_eq!(
        reasons,
        vec![
            (Some(0), ViolationReason::InvalidProductId),
            (Some(1), ViolationReason::NonPositiveQuantity),
            (
                Some(2),
                ViolationReason::NonIntegralQuantity {
                    unit: UnitOfMeasure::Dozen
                }
            ),
            (Some(3), ViolationReason::ProductNotFound),
            (Some(4), ViolationReason::NonPositiveOverride),
        ]
    );
}

#[tokio::test]
async fn test_empty_cart_rejected() {
    let shop = shop().await;
    let err = shop
        .coordinator
        .commit(&SaleRequest::new(Vec::new()), shop.cashier_id)
        .await
        .unwrap_err();

    let ServiceError::Core(CoreError::CartInvalid { violations }) = err else {
        panic!("expected CartInvalid");
    };
    assert_eq!(violations[0].reason, ViolationReason::EmptyCart);
    assert_eq!(violations[0].line, None);
}

#[tokio::test]
async fn test_inactive_product_rejected() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 10, 100).await;
    shop.db.products().soft_delete(a.id).await.unwrap();

    let err = shop
        .coordinator
        .preview(&[CartItem::new(a.id, qty("1"))])
        .await
        .unwrap_err();
    let ServiceError::Core(CoreError::CartInvalid { violations }) = err else {
        panic!("expected CartInvalid");
    };
    assert_eq!(violations[0].reason, ViolationReason::ProductInactive);
}

#[tokio::test]
async fn test_cancel_restores_stock_and_removes_sale() {
    let shop = shop().await;
    let ribbon = add_product(&shop.db, "CIN-01", UnitOfMeasure::Meter, 10, 150).await;
    let thread = add_product(&shop.db, "HIL-01", UnitOfMeasure::Unit, 8, 450).await;

    let request = SaleRequest::new(vec![
        CartItem::new(ribbon.id, qty("2.5")),
        CartItem::new(thread.id, qty("3")),
        CartItem::new(ribbon.id, qty("0.5")),
    ]);
    let committed = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();
    let sale_id = committed.record.sale.id;

    let cancelled = shop.coordinator.cancel(sale_id).await.unwrap();
    assert_eq!(cancelled.items.len(), 3);

    assert_eq!(stock_of(&shop.db, ribbon.id).await, 10_000);
    assert_eq!(stock_of(&shop.db, thread.id).await, 8_000);

    let err = shop.coordinator.get_sale(sale_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::SaleNotFound(_))));
    assert!(shop.db.sales().get_items(sale_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_unknown_sale() {
    let shop = shop().await;
    let err = shop.coordinator.cancel(42).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::SaleNotFound(42))));
}

#[tokio::test]
async fn test_inactive_cashier_cannot_sell() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 10, 100).await;
    shop.db.users().set_active(shop.cashier_id, false).await.unwrap();

    let request = SaleRequest::new(vec![CartItem::new(a.id, qty("1"))]);
    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::UserNotFound(_))));
    assert_eq!(stock_of(&shop.db, a.id).await, 10_000);
}

#[tokio::test]
async fn test_interleaved_commits_never_oversell() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 3, 1000).await;
    let request = SaleRequest::new(vec![CartItem::new(a.id, qty("2"))]);

    let (first, second) = tokio::join!(
        shop.coordinator.commit(&request, shop.cashier_id),
        shop.coordinator.commit(&request, shop.cashier_id),
    );

    let results = [first, second];
    let committed = results.iter().filter(|r| r.is_ok()).count();
    let short = results
        .iter()
        .filter(|r| matches!(r, Err(ServiceError::Core(CoreError::InsufficientStock { .. }))))
        .count();
    assert_eq!((committed, short), (1, 1));
    assert_eq!(stock_of(&shop.db, a.id).await, 1000);
    assert_eq!(shop.db.sales().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_notes_and_payment_method_persisted() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 10, 100).await;

    let mut request = SaleRequest::new(vec![CartItem::new(a.id, qty("1"))]);
    request.notes = Some("  regalo  ".to_string());
    request.payment_method = PaymentMethod::WalletTransfer;
    let committed = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap();

    let stored = shop.coordinator.get_sale(committed.record.sale.id).await.unwrap();
    assert_eq!(stored.sale.notes.as_deref(), Some("regalo"));
    assert_eq!(stored.sale.payment_method, PaymentMethod::WalletTransfer);

    request.notes = Some("x".repeat(501));
    let err = shop.coordinator.commit(&request, shop.cashier_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_history_keeps_snapshot_after_catalog_edit() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 10, 100).await;
    let committed = shop
        .coordinator
        .commit(&SaleRequest::new(vec![CartItem::new(a.id, qty("2"))]), shop.cashier_id)
        .await
        .unwrap();

    shop.db
        .products()
        .update_details(
            a.id,
            &merceria_db::ProductUpdate {
                name: Some("Renombrado".to_string()),
                price_cents: Some(999),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = shop.coordinator.get_sale(committed.record.sale.id).await.unwrap();
    let receipt = ReceiptView::from(&stored);
    assert_eq!(receipt.line_items[0].product_name, "Producto A");
    assert_eq!(receipt.line_items[0].unit_price_charged.cents(), 100);
    assert_eq!(receipt.total.cents(), 200);
}

#[tokio::test]
async fn test_reports_after_sales() {
    let shop = shop().await;
    let a = add_product(&shop.db, "A", UnitOfMeasure::Unit, 100, 1000).await;
    let b = add_product(&shop.db, "B", UnitOfMeasure::Unit, 100, 250).await;

    for cart in [
        vec![CartItem::new(a.id, qty("1"))],
        vec![CartItem::new(a.id, qty("2")), CartItem::new(b.id, qty("1"))],
        vec![CartItem::new(b.id, qty("10"))],
    ] {
        shop.coordinator
            .commit(&SaleRequest::new(cart), shop.cashier_id)
            .await
            .unwrap();
    }

    let stats = shop.db.sales().stats().await.unwrap();
    assert_eq!(stats.count, 3);
    assert_eq!(stats.revenue_cents, 1000 + 2250 + 2500);
    assert_eq!(stats.max_cents, 2500);
    assert_eq!(stats.min_cents, 1000);
    assert_eq!(stats.average_cents, 1917);

    let today = shop.db.sales().list_today().await.unwrap();
    assert_eq!(today.len(), 3);
    assert_eq!(shop.db.sales().stats_today().await.unwrap().count, 3);
    let overview = shop.db.sales().overview().await.unwrap();
    assert_eq!(overview.general, stats);
    assert_eq!(overview.month.count, 3);
    assert_eq!(overview.today.revenue_cents, stats.revenue_cents);

    let top = shop.db.sales().top_products(5).await.unwrap();
    assert_eq!(top[0].product_id, b.id);
    assert_eq!(top[0].quantity_milli, 11_000);
    assert_eq!(top[0].times_sold, 2);
    assert_eq!(top[1].revenue_cents, 3000);

    let page = shop.db.sales().list(2, 0).await.unwrap();
    assert_eq!(page.len(), 2);
    assert!(page[0].id > page[1].id);
}
