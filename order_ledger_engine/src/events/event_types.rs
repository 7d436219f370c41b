use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, OrderStatusType},
    ledger_api::order_objects::OrderChanged,
    traits::PaymentReceipt,
};

/// Published after a payment has been committed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAppliedEvent {
    pub receipt: PaymentReceipt,
}

impl PaymentAppliedEvent {
    pub fn new(receipt: PaymentReceipt) -> Self {
        Self { receipt }
    }
}

/// Published when a payment brings an order's `amount_paid` up to its grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettledEvent {
    pub order: Order,
}

impl OrderSettledEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_order: Order,
    pub new_order: Order,
    pub actor: String,
}

impl OrderStatusChangedEvent {
    pub fn new(change: OrderChanged, actor: &str) -> Self {
        let OrderChanged { old_order, new_order } = change;
        Self { old_order, new_order, actor: actor.to_string() }
    }

    pub fn from_status(&self) -> OrderStatusType {
        self.old_order.status
    }

    pub fn to_status(&self) -> OrderStatusType {
        self.new_order.status
    }
}
