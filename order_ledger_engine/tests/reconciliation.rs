use std::{future::Future, pin::Pin};

use order_ledger_engine::{
    db_types::{AuditAction, Money, OrderId, OrderStatusType, PaymentMethod, ORDERS_TABLE, PAYMENTS_TABLE},
    events::{EventHandlers, EventHooks, OrderSettledEvent, PaymentAppliedEvent},
    order_objects::Page,
    AuditLog,
    OrderStore,
    PaymentLedger,
    ReconciliationError,
};
use tokio::{sync::mpsc, time::timeout};

mod support;
use support::{payment, TestSystem, AUDITOR, CASHIER, OWNER, STRANGER};

async fn assert_ledger_matches_order(sys: &TestSystem, order_id: &str) -> Money {
    let order_id = OrderId::from(order_id);
    let order = sys.db.fetch_order(&order_id).await.expect("Error fetching order");
    let total = sys.db.total_paid_for_order(&order_id).await.expect("Error summing ledger");
    assert_eq!(total, order.amount_paid, "ledger and amount_paid disagree");
    assert!(order.amount_paid <= order.ordered_grand_total);
    total
}

#[tokio::test]
async fn overpayments_are_clamped_to_the_debt() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 55_000).await;
    let receipt = sys.payments().apply_payment(payment("1001", 1_000_000)).await.expect("Payment failed");
    assert_eq!(receipt.entry.amount, Money::from(55_000));
    assert_eq!(receipt.requested, Money::from(1_000_000));
    assert!(receipt.was_clamped());
    assert!(receipt.settled_order());
    assert_eq!(receipt.new_order.amount_paid, Money::from(55_000));
    assert_eq!(receipt.old_order.amount_paid, Money::ZERO);
    assert_eq!(receipt.entry.payment_method, PaymentMethod::Cash);
    assert_eq!(receipt.entry.payment_source_id, "till-1");
    assert_eq!(receipt.new_order.updated_by, CASHIER);
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::from(55_000));
    sys.tear_down().await;
}

#[tokio::test]
async fn partial_payments_accumulate() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 50_000).await;
    let api = sys.payments();
    let first = api.apply_payment(payment("1001", 20_000)).await.expect("Payment failed");
    assert!(!first.was_clamped());
    assert!(!first.settled_order());
    let second = api.apply_payment(payment("1001", 20_000)).await.expect("Payment failed");
    assert_eq!(second.new_order.amount_paid, Money::from(40_000));
    let third = api.apply_payment(payment("1001", 20_000)).await.expect("Payment failed");
    assert_eq!(third.entry.amount, Money::from(10_000));
    assert!(third.settled_order());
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::from(50_000));

    let entries = api.list_payments(AUDITOR, &OrderId::from("1001"), Page::default()).await.unwrap();
    let amounts = entries.iter().map(|e| e.amount.value()).collect::<Vec<_>>();
    assert_eq!(amounts, vec![20_000, 20_000, 10_000]);
    let page = api.list_payments(AUDITOR, &OrderId::from("1001"), Page::new(2, 2)).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, entries[2].id);
    sys.tear_down().await;
}

#[tokio::test]
async fn settled_orders_reject_further_payments() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    let api = sys.payments();
    api.apply_payment(payment("1001", 10_000)).await.expect("Payment failed");
    let err = api.apply_payment(payment("1001", 5)).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::AlreadySettled(id) if id.as_str() == "1001"));
    let entries = sys.db.fetch_payments_for_order(&OrderId::from("1001"), Page::default()).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::from(10_000));
    sys.tear_down().await;
}

#[tokio::test]
async fn cancelled_orders_reject_payments() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    sys.orders().modify_status(OWNER, &OrderId::from("1001"), OrderStatusType::Cancel, None).await.unwrap();
    let err = sys.payments().apply_payment(payment("1001", 1_000)).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::OrderCancelled(_)));
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::ZERO);
    sys.tear_down().await;
}

#[tokio::test]
async fn completed_orders_with_debt_accept_payment() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    let orders = sys.orders();
    let id = OrderId::from("1001");
    orders.modify_status(OWNER, &id, OrderStatusType::Delivering, None).await.unwrap();
    orders.modify_status(OWNER, &id, OrderStatusType::Complete, None).await.unwrap();
    let receipt = sys.payments().apply_payment(payment("1001", 4_000)).await.expect("Payment failed");
    assert_eq!(receipt.new_order.status, OrderStatusType::Complete);
    assert_eq!(receipt.new_order.amount_paid, Money::from(4_000));
    sys.tear_down().await;
}

#[tokio::test]
async fn missing_and_deleted_orders_are_not_found() {
    let sys = TestSystem::new().await;
    let api = sys.payments();
    let err = api.apply_payment(payment("nope", 1_000)).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::OrderNotFound(id) if id.as_str() == "nope"));

    sys.place_order("1001", 10_000).await;
    sys.orders().soft_delete_order(OWNER, &OrderId::from("1001")).await.unwrap();
    let err = api.apply_payment(payment("1001", 1_000)).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::OrderNotFound(_)));
    let err = api.list_payments(CASHIER, &OrderId::from("1001"), Page::default()).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::OrderNotFound(_)));
    sys.tear_down().await;
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    for amount in [0, -100] {
        let err = sys.payments().apply_payment(payment("1001", amount)).await.unwrap_err();
        assert!(matches!(err, ReconciliationError::InvalidAmount(m) if m.value() == amount));
    }
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::ZERO);
    sys.tear_down().await;
}

#[tokio::test]
async fn users_without_a_payment_role_are_denied() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    let api = sys.payments();
    for user in [STRANGER, AUDITOR] {
        let mut p = payment("1001", 1_000);
        p.created_by = user.to_string();
        let err = api.apply_payment(p).await.unwrap_err();
        assert!(
            matches!(&err, ReconciliationError::PermissionDenied { user_id, business_id } if user_id == user && business_id == support::SHOP),
            "unexpected error {err}"
        );
    }
    let err = api.list_payments(STRANGER, &OrderId::from("1001"), Page::default()).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::PermissionDenied { .. }));
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::ZERO);
    sys.tear_down().await;
}

#[tokio::test]
async fn a_failed_order_update_leaves_no_ledger_entry() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    sqlx::query(
        "CREATE TRIGGER fail_amount_paid BEFORE UPDATE OF amount_paid ON orders BEGIN SELECT RAISE(ABORT, 'forced \
         failure'); END;",
    )
    .execute(sys.db.pool())
    .await
    .expect("Error creating trigger");

    let err = sys.payments().apply_payment(payment("1001", 5_000)).await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Internal(ref s) if s.contains("forced failure")), "{err}");
    let entries = sys.db.fetch_payments_for_order(&OrderId::from("1001"), Page::default()).await.unwrap();
    assert!(entries.is_empty());
    assert_eq!(assert_ledger_matches_order(&sys, "1001").await, Money::ZERO);
    let payment_history = sys.db.fetch_history(ORDERS_TABLE, "1001").await.unwrap();
    assert_eq!(payment_history.len(), 1, "only the order creation should be audited");
    sys.tear_down().await;
}

#[tokio::test]
async fn payments_are_audited() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    let receipt = sys.payments().apply_payment(payment("1001", 4_000)).await.expect("Payment failed");

    let entry_history = sys.db.fetch_history(PAYMENTS_TABLE, &receipt.entry.id.to_string()).await.unwrap();
    assert_eq!(entry_history.len(), 1);
    let record = &entry_history[0];
    assert_eq!(record.action, AuditAction::Create);
    assert_eq!(record.worker_id, CASHIER);
    assert_eq!(record.description, sys.config.messages.payment_created);
    assert_eq!(record.data.0["entry"]["amount"], 4_000);

    let order_history = sys.db.fetch_history(ORDERS_TABLE, "1001").await.unwrap();
    let actions = order_history.iter().map(|r| r.action).collect::<Vec<_>>();
    assert_eq!(actions, vec![AuditAction::Create, AuditAction::Update]);
    let update = &order_history[1];
    assert_eq!(update.data.0["before"]["amount_paid"], 0);
    assert_eq!(update.data.0["after"]["amount_paid"], 4_000);
    sys.tear_down().await;
}

#[tokio::test]
async fn payment_events_are_published() {
    let sys = TestSystem::new().await;
    sys.place_order("1001", 10_000).await;
    let (applied_tx, mut applied_rx) = mpsc::unbounded_channel::<PaymentAppliedEvent>();
    let (settled_tx, mut settled_rx) = mpsc::unbounded_channel::<OrderSettledEvent>();
    let mut hooks = EventHooks::default();
    hooks
        .on_payment_applied(move |ev| {
            let tx = applied_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ev);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        })
        .on_order_settled(move |ev| {
            let tx = settled_tx.clone();
            Box::pin(async move {
                let _ = tx.send(ev);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
    let handlers = EventHandlers::new(sys.config.event_buffer_size, hooks);
    let api = sys.payments().with_producers(handlers.producers());
    handlers.start_handlers();

    api.apply_payment(payment("1001", 6_000)).await.expect("Payment failed");
    api.apply_payment(payment("1001", 6_000)).await.expect("Payment failed");
    drop(api);

    let wait = std::time::Duration::from_secs(2);
    let first = timeout(wait, applied_rx.recv()).await.unwrap().expect("PaymentApplied not published");
    let second = timeout(wait, applied_rx.recv()).await.unwrap().expect("PaymentApplied not published");
    let mut amounts = vec![first.receipt.entry.amount.value(), second.receipt.entry.amount.value()];
    amounts.sort_unstable();
    assert_eq!(amounts, vec![4_000, 6_000]);
    let settled = timeout(wait, settled_rx.recv()).await.unwrap().expect("OrderSettled not published");
    assert_eq!(settled.order.amount_paid, Money::from(10_000));
    // Both producers are gone, so the channels close once the handlers finish
    assert!(timeout(wait, settled_rx.recv()).await.unwrap().is_none());
    sys.tear_down().await;
}
