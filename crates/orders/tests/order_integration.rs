//! Integration tests for the order ledger against the in-memory stores.

use std::sync::Arc;

use common::{Actor, Money, OrderId, ProductId, UserId};
use orders::{InMemoryOrderStore, OrderError, OrderLedger, OrderStatus, PlaceLine};
use stock::{InMemoryStockStore, ProductRecord, StockError, StockStore};

async fn setup() -> (OrderLedger, InMemoryStockStore) {
    let stock = InMemoryStockStore::new();
    stock
        .insert_product(ProductRecord::new("SKU-001", "Widget", Money::from_cents(1000), 3))
        .await
        .unwrap();
    stock
        .insert_product(ProductRecord::new("SKU-002", "Gadget", Money::from_cents(2500), 10))
        .await
        .unwrap();

    let ledger = OrderLedger::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(stock.clone()),
    );
    (ledger, stock)
}

async fn quantity(stock: &InMemoryStockStore, sku: &str) -> u32 {
    stock
        .get(&ProductId::new(sku))
        .await
        .unwrap()
        .unwrap()
        .quantity
}

#[tokio::test]
async fn place_debits_stock_and_snapshots_price() {
    let (ledger, stock) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 2)])
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items[0].unit_price, Money::from_cents(1000));
    assert_eq!(order.total_amount(), Money::from_cents(2000));
    assert_eq!(quantity(&stock, "SKU-001").await, 1);

    // A later catalog price change does not touch the snapshot.
    let stored = ledger.get(&customer, order.id).await.unwrap();
    assert_eq!(stored.items[0].unit_price, Money::from_cents(1000));
}

#[tokio::test]
async fn place_fails_whole_on_any_shortage() {
    let (ledger, stock) = setup().await;
    let customer = Actor::customer(UserId::new());

    let err = ledger
        .place(
            &customer,
            vec![PlaceLine::new("SKU-002", 2), PlaceLine::new("SKU-001", 4)],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::Stock(StockError::InsufficientStock { requested: 4, available: 3, .. })
    ));
    // No partial debit.
    assert_eq!(quantity(&stock, "SKU-001").await, 3);
    assert_eq!(quantity(&stock, "SKU-002").await, 10);
}

#[tokio::test]
async fn place_rejects_empty_and_zero_quantity() {
    let (ledger, _) = setup().await;
    let customer = Actor::customer(UserId::new());

    assert!(matches!(
        ledger.place(&customer, vec![]).await.unwrap_err(),
        OrderError::EmptyOrder
    ));
    assert!(matches!(
        ledger
            .place(&customer, vec![PlaceLine::new("SKU-001", 0)])
            .await
            .unwrap_err(),
        OrderError::InvalidQuantity { quantity: 0, .. }
    ));
}

#[tokio::test]
async fn cancel_restores_stock() {
    let (ledger, stock) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 2)])
        .await
        .unwrap();
    assert_eq!(quantity(&stock, "SKU-001").await, 1);

    let cancelled = ledger.cancel(&customer, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(quantity(&stock, "SKU-001").await, 3);
}

#[tokio::test]
async fn cancel_requires_owner_or_admin() {
    let (ledger, _) = setup().await;
    let owner = Actor::customer(UserId::new());
    let stranger = Actor::customer(UserId::new());

    let order = ledger
        .place(&owner, vec![PlaceLine::new("SKU-001", 1)])
        .await
        .unwrap();

    assert!(matches!(
        ledger.cancel(&stranger, order.id).await.unwrap_err(),
        OrderError::Forbidden
    ));

    // Admin may cancel on the owner's behalf.
    let cancelled = ledger.cancel(&Actor::Admin, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn cancel_only_from_pending_or_paid() {
    let (ledger, _) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 1)])
        .await
        .unwrap();

    ledger
        .set_status(&Actor::Admin, order.id, OrderStatus::Paid)
        .await
        .unwrap();
    ledger
        .set_status(&Actor::Admin, order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = ledger.cancel(&customer, order.id).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InvalidTransition { from: OrderStatus::Shipped, to: OrderStatus::Cancelled }
    ));
}

#[tokio::test]
async fn double_cancel_restores_once() {
    let (ledger, stock) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 2)])
        .await
        .unwrap();

    ledger.cancel(&customer, order.id).await.unwrap();
    let err = ledger.cancel(&customer, order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Stock restored exactly once.
    assert_eq!(quantity(&stock, "SKU-001").await, 3);
}

#[tokio::test]
async fn set_status_enforces_graph() {
    let (ledger, _) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 1)])
        .await
        .unwrap();

    // pending -> delivered skips the graph.
    let err = ledger
        .set_status(&Actor::Admin, order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    // Walking the graph works.
    for status in [OrderStatus::Paid, OrderStatus::Shipped, OrderStatus::Delivered] {
        let updated = ledger
            .set_status(&Actor::Admin, order.id, status)
            .await
            .unwrap();
        assert_eq!(updated.status, status);
    }
}

#[tokio::test]
async fn set_status_requires_admin_or_internal() {
    let (ledger, _) = setup().await;
    let customer = Actor::customer(UserId::new());

    let order = ledger
        .place(&customer, vec![PlaceLine::new("SKU-001", 1)])
        .await
        .unwrap();

    assert!(matches!(
        ledger
            .set_status(&customer, order.id, OrderStatus::Paid)
            .await
            .unwrap_err(),
        OrderError::Forbidden
    ));

    // The saga path uses the internal actor.
    let updated = ledger
        .set_status(&Actor::Internal, order.id, OrderStatus::Paid)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Paid);
}

#[tokio::test]
async fn reads_are_scoped() {
    let (ledger, _) = setup().await;
    let owner = Actor::customer(UserId::new());
    let stranger = Actor::customer(UserId::new());

    let order = ledger
        .place(&owner, vec![PlaceLine::new("SKU-001", 1)])
        .await
        .unwrap();

    assert!(ledger.get(&owner, order.id).await.is_ok());
    assert!(ledger.get(&Actor::Admin, order.id).await.is_ok());
    assert!(matches!(
        ledger.get(&stranger, order.id).await.unwrap_err(),
        OrderError::Forbidden
    ));
    assert!(matches!(
        ledger.get(&owner, OrderId::new()).await.unwrap_err(),
        OrderError::NotFound(_)
    ));

    assert_eq!(ledger.list_own(&owner).await.unwrap().len(), 1);
    assert_eq!(ledger.list_own(&stranger).await.unwrap().len(), 0);
    assert_eq!(ledger.list_all(&Actor::Admin).await.unwrap().len(), 1);
    assert!(matches!(
        ledger.list_all(&owner).await.unwrap_err(),
        OrderError::Forbidden
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_placements_against_one_unit() {
    let stock = InMemoryStockStore::new();
    stock
        .insert_product(ProductRecord::new("SKU-RACE", "Last One", Money::from_cents(100), 1))
        .await
        .unwrap();
    let ledger = OrderLedger::new(
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(stock.clone()),
    );

    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let actor = Actor::customer(UserId::new());
            ledger.place(&actor, vec![PlaceLine::new("SKU-RACE", 1)]).await
        }));
    }

    let mut successes = 0;
    let mut shortages = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(OrderError::Stock(StockError::InsufficientStock { .. })) => shortages += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(shortages, 9);
    assert_eq!(quantity(&stock, "SKU-RACE").await, 0);
}

#[tokio::test]
async fn conservation_over_place_and_cancel() {
    let (ledger, stock) = setup().await;
    let customer = Actor::customer(UserId::new());

    // S = 10 for SKU-002. Debit 3 + 2, restore the 2.
    let kept = ledger
        .place(&customer, vec![PlaceLine::new("SKU-002", 3)])
        .await
        .unwrap();
    let returned = ledger
        .place(&customer, vec![PlaceLine::new("SKU-002", 2)])
        .await
        .unwrap();
    ledger.cancel(&customer, returned.id).await.unwrap();

    assert_eq!(quantity(&stock, "SKU-002").await, 10 - 3);
    assert_eq!(
        ledger.get(&customer, kept.id).await.unwrap().status,
        OrderStatus::Pending
    );
}
