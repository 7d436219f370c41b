use thiserror::Error;

use crate::{
    db_types::{Money, NewPayment, Order, OrderId, OrderStatusType},
    traits::{data_objects::PaymentReceipt, PermissionGateError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} has already been paid in full")]
    AlreadySettled(OrderId),
    #[error("Order {0} has been cancelled and cannot accept payments")]
    OrderCancelled(OrderId),
    #[error("Payment amounts must be positive, but {0} was requested")]
    InvalidAmount(Money),
    #[error("User {user_id} may not apply payments for business {business_id}")]
    PermissionDenied { user_id: String, business_id: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for ReconciliationError {
    fn from(e: sqlx::Error) -> Self {
        ReconciliationError::Internal(e.to_string())
    }
}

impl From<StoreError> for ReconciliationError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => ReconciliationError::OrderNotFound(id),
            e => ReconciliationError::Internal(e.to_string()),
        }
    }
}

impl From<PermissionGateError> for ReconciliationError {
    fn from(e: PermissionGateError) -> Self {
        ReconciliationError::Internal(e.to_string())
    }
}

/// The transactional unit of work behind `apply_payment`.
///
/// An implementation must, in one transaction:
/// 1. Lock the order so that concurrent reconciliations against it are serialised.
/// 2. Read the order and the ledger total for it (missing or soft-deleted orders are `OrderNotFound`).
/// 3. Decide the amount to record with [`plan_settlement`].
/// 4. Insert the ledger entry and write the new `amount_paid`.
/// 5. Commit.
///
/// If any step fails, nothing is persisted.
#[allow(async_fn_in_trait)]
pub trait PaymentReconciliation {
    async fn reconcile_payment(&self, payment: NewPayment) -> Result<PaymentReceipt, ReconciliationError>;
}

/// Decides how much of a requested payment an order can accept.
///
/// `total_paid` is the ledger sum for the order, read under the order lock. The result is the amount to record, which
/// is the requested amount clamped to the outstanding debt.
pub fn plan_settlement(order: &Order, total_paid: Money, requested: Money) -> Result<Money, ReconciliationError> {
    if !requested.is_positive() {
        return Err(ReconciliationError::InvalidAmount(requested));
    }
    if order.status == OrderStatusType::Cancel {
        return Err(ReconciliationError::OrderCancelled(order.order_id.clone()));
    }
    if total_paid >= order.ordered_grand_total {
        return Err(ReconciliationError::AlreadySettled(order.order_id.clone()));
    }
    let debt = order.ordered_grand_total - total_paid;
    Ok(requested.clamp_to(debt))
}
