use thiserror::Error;

use crate::{
    db_types::{Money, NewOrder, Order, OrderId, OrderItem, OrderStatusLogEntry, OrderStatusType},
    ledger_api::order_objects::{OrderChanged, OrderQueryFilter, OrderUpdate},
};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} already exists")]
    OrderAlreadyExists(OrderId),
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order is already in status {0}. Nothing to do")]
    NoOp(OrderStatusType),
    #[error("Order {order_id} cannot be edited in status {status}")]
    OrderNotEditable { order_id: OrderId, status: OrderStatusType },
    #[error("The new grand total, {new_total}, is less than the {paid} already paid")]
    GrandTotalBelowPaid { new_total: Money, paid: Money },
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}

/// Owns the Order aggregate: the order row, its line items, and its status log.
///
/// Soft-deleted orders are invisible through this trait. Any attempt to fetch or modify one yields
/// [`StoreError::OrderNotFound`].
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Fetches the order with the given external id.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, StoreError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// Stores a new order and all its line items in a single transaction. The grand total is calculated from the
    /// items, `amount_paid` starts at zero and the status at `waiting_confirm`. An initial status log entry is written.
    ///
    /// Returns [`StoreError::OrderAlreadyExists`] if the external order id is taken.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Applies `update` to the order's mutable fields. This is a blind write. Lifecycle changes should go through
    /// [`Self::transition_order_status`] so that the state machine is respected.
    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, StoreError>;

    /// Orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError>;

    /// Moves the order to `new_status` under the order lock, appending an entry to the status log.
    ///
    /// Returns [`StoreError::NoOp`] for a self-transition and [`StoreError::InvalidTransition`] for anything the
    /// lifecycle state machine forbids.
    async fn transition_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        actor: &str,
        note: Option<String>,
    ) -> Result<OrderChanged, StoreError>;

    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusLogEntry>, StoreError>;

    /// Changes the grand total of an order. Only orders in `waiting_confirm` can be edited, and the new total may
    /// not fall below the amount already paid.
    async fn modify_grand_total(
        &self,
        order_id: &OrderId,
        new_total: Money,
        actor: &str,
    ) -> Result<OrderChanged, StoreError>;

    /// Marks the order as deleted. It is never removed from the database.
    async fn soft_delete_order(&self, order_id: &OrderId, actor: &str) -> Result<Order, StoreError>;
}
