use std::time::Duration;

use cucumber::{given, then, when};
use order_ledger_engine::{
    db_types::{Money, NewOrder, NewOrderItem, NewPayment, OrderId, OrderStatusType, PaymentMethod},
    order_objects::Page,
    OrderStore,
    PaymentLedger,
};

use crate::{cucumber::LedgerWorld, support::TestSystem};

#[given("a fresh install")]
async fn fresh_database(world: &mut LedgerWorld) {
    world.system = Some(TestSystem::new().await);
}

#[given(expr = "order {word} for {int} was placed by '{word}'")]
async fn existing_order(world: &mut LedgerWorld, order_id: String, total: i64, user: String) {
    create_order(world, order_id, total, user).await;
    if let Some(e) = world.last_error.take() {
        panic!("Error placing order: {e}");
    }
}

#[when(expr = "order {word} for {int} is placed by '{word}'")]
async fn place_order(world: &mut LedgerWorld, order_id: String, total: i64, user: String) {
    create_order(world, order_id, total, user).await;
}

async fn create_order(world: &mut LedgerWorld, order_id: String, total: i64, user: String) {
    let order = NewOrder::new(OrderId::from(order_id), "shop-1", "customer-1", user)
        .with_item(NewOrderItem::new("SKU-1", 1, Money::from(total)));
    let result = world.orders().create_order(order).await;
    world.record(result);
}

#[when(expr = "'{word}' pays {int} in cash against order {word}")]
async fn pay_cash(world: &mut LedgerWorld, user: String, amount: i64, order_id: String) {
    pay(world, user, amount, order_id, PaymentMethod::Cash).await;
}

#[when(expr = "'{word}' pays {int} by card against order {word}")]
async fn pay_card(world: &mut LedgerWorld, user: String, amount: i64, order_id: String) {
    pay(world, user, amount, order_id, PaymentMethod::Card).await;
}

async fn pay(world: &mut LedgerWorld, user: String, amount: i64, order_id: String, method: PaymentMethod) {
    let payment = NewPayment::new(OrderId::from(order_id), Money::from(amount), method, user);
    let result = world.payments().apply_payment(payment).await;
    world.last_receipt = world.record(result);
}

#[when(expr = "'{word}' moves order {word} to {word}")]
async fn move_order(world: &mut LedgerWorld, user: String, order_id: String, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let result = world.orders().modify_status(&user, &OrderId::from(order_id), status, None).await;
    world.record(result);
}

#[when(expr = "'{word}' changes the total of order {word} to {int}")]
async fn change_total(world: &mut LedgerWorld, user: String, order_id: String, total: i64) {
    let result = world.orders().modify_grand_total(&user, &OrderId::from(order_id), Money::from(total)).await;
    world.record(result);
}

#[when(expr = "'{word}' deletes order {word}")]
async fn delete_order(world: &mut LedgerWorld, user: String, order_id: String) {
    let result = world.orders().soft_delete_order(&user, &OrderId::from(order_id)).await;
    world.record(result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut LedgerWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the payment is recorded as {int}")]
async fn check_recorded_amount(world: &mut LedgerWorld, amount: i64) {
    assert!(world.last_error.is_none(), "The last request failed: {:?}", world.last_error);
    let receipt = world.last_receipt.as_ref().expect("No payment has been made");
    assert_eq!(receipt.entry.amount, Money::from(amount), "Recorded amount is incorrect");
}

#[then("the payment settles the order")]
async fn check_settled(world: &mut LedgerWorld) {
    let receipt = world.last_receipt.as_ref().expect("No payment has been made");
    assert!(receipt.settled_order(), "Order was not settled by the payment");
}

#[then("the request succeeds")]
async fn check_success(world: &mut LedgerWorld) {
    assert!(world.last_error.is_none(), "The last request failed: {:?}", world.last_error);
}

#[then(expr = "the request fails with {string}")]
async fn check_failure(world: &mut LedgerWorld, message: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    assert!(err.contains(&message), "Expected an error containing '{message}', but got '{err}'");
}

#[then(expr = "order {word} has {int} paid")]
async fn check_amount_paid(world: &mut LedgerWorld, order_id: String, amount: i64) {
    let db = &world.system().db;
    let id = OrderId::from(order_id);
    let order = db.fetch_order(&id).await.expect("Error fetching order");
    assert_eq!(order.amount_paid, Money::from(amount), "Amount paid is incorrect");
    let ledger_total = db.total_paid_for_order(&id).await.expect("Error summing ledger");
    assert_eq!(ledger_total, order.amount_paid, "Ledger and amount paid disagree");
}

#[then(expr = "order {word} has {int} payments")]
async fn check_payment_count(world: &mut LedgerWorld, order_id: String, count: usize) {
    let db = &world.system().db;
    let payments =
        db.fetch_payments_for_order(&OrderId::from(order_id), Page::new(1, 100)).await.expect("Error fetching payments");
    assert_eq!(payments.len(), count, "Number of payments is incorrect");
}

#[then(expr = "order {word} has status {word}")]
async fn check_status(world: &mut LedgerWorld, order_id: String, status: String) {
    let db = &world.system().db;
    let order = db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    assert_eq!(order.status.to_string(), status, "Order status is incorrect");
}

#[then(expr = "order {word} has a grand total of {int}")]
async fn check_grand_total(world: &mut LedgerWorld, order_id: String, total: i64) {
    let db = &world.system().db;
    let order = db.fetch_order(&OrderId::from(order_id)).await.expect("Error fetching order");
    assert_eq!(order.ordered_grand_total, Money::from(total), "Grand total is incorrect");
}

#[then(expr = "order {word} does not exist")]
async fn check_missing(world: &mut LedgerWorld, order_id: String) {
    let db = &world.system().db;
    let result = db.fetch_order(&OrderId::from(order_id)).await;
    assert!(result.is_err(), "Order still exists");
}
