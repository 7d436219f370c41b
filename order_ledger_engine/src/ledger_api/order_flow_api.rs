use std::fmt::Debug;

use log::*;
use serde_json::json;

use crate::{
    config::EngineConfig,
    db_types::{
        AuditAction,
        Money,
        NewHistoryRecord,
        NewOrder,
        Order,
        OrderId,
        OrderItem,
        OrderStatusLogEntry,
        OrderStatusType,
        Role,
        ORDERS_TABLE,
    },
    events::{EventProducers, OrderStatusChangedEvent},
    ledger_api::{
        audit_trail::{is_authorized, record_or_warn},
        errors::OrderFlowError,
        order_objects::{OrderChanged, OrderQueryFilter},
    },
    traits::{AuditLog, OrderStore, PermissionGate},
};

/// `OrderFlowApi` manages the order lifecycle: placing orders, reading them, moving them through their statuses,
/// editing totals and deleting them. Every mutation is permission-checked and audited.
pub struct OrderFlowApi<B, G, L> {
    db: B,
    gate: G,
    audit: L,
    config: EngineConfig,
    producers: EventProducers,
}

impl<B, G, L> Debug for OrderFlowApi<B, G, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G, L> OrderFlowApi<B, G, L> {
    pub fn new(db: B, gate: G, audit: L, config: EngineConfig) -> Self {
        Self { db, gate, audit, config, producers: EventProducers::default() }
    }

    pub fn with_producers(mut self, producers: EventProducers) -> Self {
        self.producers = producers;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B, G, L> OrderFlowApi<B, G, L>
where
    B: OrderStore,
    G: PermissionGate,
    L: AuditLog,
{
    /// Places a new order on behalf of `order.created_by`, who must hold one of the order roles for the business.
    ///
    /// The grand total is the sum of the line totals. The order starts in `waiting_confirm` with nothing paid.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        self.authorize(&order.created_by, &order.business_id, &self.config.order_roles).await?;
        let items = order.items.clone();
        let new_order = self.db.insert_order(order).await?;
        let record = self
            .order_record(&new_order, AuditAction::Create, &self.config.messages.order_created, &new_order.created_by)
            .with_data(json!({ "order": new_order, "items": items }));
        record_or_warn(&self.audit, record).await;
        debug!("🔄️📦️ Order {} created with a grand total of {}", new_order.order_id, new_order.ordered_grand_total);
        Ok(new_order)
    }

    /// Fetches an order. The user must hold a read role for the order's business.
    pub async fn fetch_order(&self, user_id: &str, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?;
        self.authorize(user_id, &order.business_id, &self.config.read_roles).await?;
        Ok(order)
    }

    pub async fn fetch_order_items(&self, user_id: &str, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderFlowError> {
        let order = self.fetch_order(user_id, order_id).await?;
        let items = self.db.fetch_order_items(&order.order_id).await?;
        Ok(items)
    }

    /// The status log for an order, oldest first.
    pub async fn status_history(
        &self,
        user_id: &str,
        order_id: &OrderId,
    ) -> Result<Vec<OrderStatusLogEntry>, OrderFlowError> {
        let order = self.fetch_order(user_id, order_id).await?;
        let history = self.db.fetch_status_history(&order.order_id).await?;
        Ok(history)
    }

    /// Searches the orders of a single business. Any `business_id` in the filter is replaced by `business_id`.
    pub async fn search_orders(
        &self,
        user_id: &str,
        business_id: &str,
        query: OrderQueryFilter,
    ) -> Result<Vec<Order>, OrderFlowError> {
        self.authorize(user_id, business_id, &self.config.read_roles).await?;
        let query = query.with_business_id(business_id);
        trace!("🔄️📦️ Searching orders. {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    /// Moves an order to a new status.
    ///
    /// | From \ To       | waiting_confirm | delivering | complete | cancel |
    /// |-----------------|-----------------|------------|----------|--------|
    /// | waiting_confirm | NoOp            | Ok         | Err      | Ok     |
    /// | delivering      | Err             | NoOp       | Ok       | Ok     |
    /// | complete        | Err             | Err        | NoOp     | Err    |
    /// | cancel          | Err             | Err        | Err      | NoOp   |
    ///
    /// A successful transition is appended to the order's status log, audited, and published as
    /// `OrderStatusChanged`.
    pub async fn modify_status(
        &self,
        user_id: &str,
        order_id: &OrderId,
        new_status: OrderStatusType,
        note: Option<String>,
    ) -> Result<OrderChanged, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?;
        self.authorize(user_id, &order.business_id, &self.config.order_roles).await?;
        let change = self.db.transition_order_status(order_id, new_status, user_id, note.clone()).await?;
        let record = self
            .order_record(&change.new_order, AuditAction::StatusChange, &self.config.messages.order_status_changed, user_id)
            .with_data(json!({ "before": change.old_order, "after": change.new_order, "note": note }));
        record_or_warn(&self.audit, record).await;
        info!(
            "🔄️📦️ Order {order_id} moved from {} to {} by {user_id}",
            change.old_order.status, change.new_order.status
        );
        self.producers.publish_order_status_changed(OrderStatusChangedEvent::new(change.clone(), user_id)).await;
        Ok(change)
    }

    /// Changes the grand total of an order that is still waiting for confirmation. The new total cannot be less than
    /// what has already been paid.
    pub async fn modify_grand_total(
        &self,
        user_id: &str,
        order_id: &OrderId,
        new_total: Money,
    ) -> Result<OrderChanged, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?;
        self.authorize(user_id, &order.business_id, &self.config.order_roles).await?;
        let change = self.db.modify_grand_total(order_id, new_total, user_id).await?;
        let record = self
            .order_record(&change.new_order, AuditAction::Update, &self.config.messages.order_total_modified, user_id)
            .with_data(json!({ "before": change.old_order, "after": change.new_order }));
        record_or_warn(&self.audit, record).await;
        info!(
            "🔄️📦️ Order {order_id} grand total changed from {} to {new_total} by {user_id}",
            change.old_order.ordered_grand_total
        );
        Ok(change)
    }

    /// Soft-deletes an order. It disappears from lookups, searches, reports and reconciliation, but is never removed.
    pub async fn soft_delete_order(&self, user_id: &str, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?;
        self.authorize(user_id, &order.business_id, &self.config.order_roles).await?;
        let deleted = self.db.soft_delete_order(order_id, user_id).await?;
        let record = self
            .order_record(&deleted, AuditAction::Delete, &self.config.messages.order_deleted, user_id)
            .with_data(json!({ "before": order }));
        record_or_warn(&self.audit, record).await;
        info!("🔄️📦️ Order {order_id} deleted by {user_id}");
        Ok(deleted)
    }

    async fn authorize(&self, user_id: &str, business_id: &str, roles: &[Role]) -> Result<(), OrderFlowError> {
        if is_authorized(&self.gate, user_id, business_id, roles).await? {
            Ok(())
        } else {
            Err(OrderFlowError::PermissionDenied { user_id: user_id.to_string(), business_id: business_id.to_string() })
        }
    }

    fn order_record(&self, order: &Order, action: AuditAction, description: &str, actor: &str) -> NewHistoryRecord {
        NewHistoryRecord::new(ORDERS_TABLE, order.order_id.as_str(), action, description, actor)
    }
}
