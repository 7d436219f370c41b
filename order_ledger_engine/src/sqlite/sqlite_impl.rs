//! `SqliteDatabase` is a concrete implementation of an order ledger backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::{fmt::Debug, time::Duration};

use log::*;
use sqlx::SqlitePool;

use super::db::{history, new_pool, order_tracking, orders, payments, reports, roles};
use crate::{
    config::EngineConfig,
    db_types::{
        HistoryRecord,
        Money,
        NewHistoryRecord,
        NewLedgerEntry,
        NewOrder,
        NewPayment,
        Order,
        OrderId,
        OrderItem,
        OrderStatusLogEntry,
        OrderStatusType,
        PaymentLedgerEntry,
        Permission,
        Role,
    },
    ledger_api::{
        order_objects::{OrderChanged, OrderQueryFilter, OrderUpdate, Page},
        report_objects::{OrderTotals, ReportQuery, SoldItem},
    },
    traits::{
        plan_settlement,
        AuditLog,
        AuditLogError,
        OrderStore,
        PaymentLedger,
        PaymentReceipt,
        PaymentReconciliation,
        PermissionGate,
        PermissionGateError,
        ReconciliationError,
        ReportingStore,
        RoleManagement,
        StoreError,
    },
};

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new_with_config(config: &EngineConfig) -> Result<Self, sqlx::Error> {
        let pool =
            new_pool(&config.database_url, config.max_connections, config.busy_timeout, config.use_wal).await?;
        Ok(Self { url: config.database_url.clone(), pool })
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections, DEFAULT_BUSY_TIMEOUT, true).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderStore for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_order_id(order_id, &mut conn)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        if orders::fetch_order_by_order_id(order_id, &mut conn).await?.is_none() {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        let items = orders::fetch_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order, StoreError> {
        order.validate().map_err(StoreError::InvalidOrder)?;
        let mut tx = self.pool.begin().await?;
        let new_order = orders::insert_order(&order, &mut tx).await?;
        order_tracking::append_status(
            &new_order.order_id,
            new_order.status,
            &order.created_by,
            Some("Order placed".to_string()),
            &mut tx,
        )
        .await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", new_order.order_id, new_order.id);
        Ok(new_order)
    }

    async fn update_order(&self, order_id: &OrderId, update: OrderUpdate) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_order(order_id, update, &mut conn).await?.ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn transition_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
        actor: &str,
        note: Option<String>,
    ) -> Result<OrderChanged, StoreError> {
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(order_id, &mut tx).await? {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        let old_order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        let from = old_order.status;
        if from == new_status {
            debug!("🗃️ Order {order_id} is already {new_status}. No action to take");
            return Err(StoreError::NoOp(new_status));
        }
        if !from.can_transition_to(new_status) {
            return Err(StoreError::InvalidTransition { from, to: new_status });
        }
        let update = OrderUpdate::new(actor).with_status(new_status);
        let new_order = orders::update_order(order_id, update, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        order_tracking::append_status(order_id, new_status, actor, note, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} moved from {from} to {new_status} by {actor}");
        Ok(OrderChanged::new(old_order, new_order))
    }

    async fn fetch_status_history(&self, order_id: &OrderId) -> Result<Vec<OrderStatusLogEntry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        if orders::fetch_order_by_order_id(order_id, &mut conn).await?.is_none() {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        let log = order_tracking::fetch_status_log(order_id, &mut conn).await?;
        Ok(log)
    }

    async fn modify_grand_total(
        &self,
        order_id: &OrderId,
        new_total: Money,
        actor: &str,
    ) -> Result<OrderChanged, StoreError> {
        if new_total.value() < 0 {
            return Err(StoreError::InvalidOrder(format!("The grand total cannot be negative. Got {new_total}")));
        }
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(order_id, &mut tx).await? {
            return Err(StoreError::OrderNotFound(order_id.clone()));
        }
        let old_order = orders::fetch_order_by_order_id(order_id, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        if old_order.status != OrderStatusType::WaitingConfirm {
            return Err(StoreError::OrderNotEditable { order_id: order_id.clone(), status: old_order.status });
        }
        if new_total < old_order.amount_paid {
            return Err(StoreError::GrandTotalBelowPaid { new_total, paid: old_order.amount_paid });
        }
        let new_order = orders::update_grand_total(order_id, new_total, actor, &mut tx)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} grand total changed from {} to {new_total}", old_order.ordered_grand_total);
        Ok(OrderChanged::new(old_order, new_order))
    }

    async fn soft_delete_order(&self, order_id: &OrderId, actor: &str) -> Result<Order, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::soft_delete(order_id, actor, &mut conn)
            .await?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.clone()))?;
        debug!("🗃️ Order {order_id} marked as deleted by {actor}");
        Ok(order)
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_ledger_entry(&self, entry: NewLedgerEntry) -> Result<PaymentLedgerEntry, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let entry = payments::insert_entry(&entry, &mut conn).await?;
        Ok(entry)
    }

    async fn total_paid_for_order(&self, order_id: &OrderId) -> Result<Money, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let total = payments::sum_for_order(order_id, &mut conn).await?;
        Ok(total)
    }

    async fn fetch_payments_for_order(
        &self,
        order_id: &OrderId,
        page: Page,
    ) -> Result<Vec<PaymentLedgerEntry>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let entries = payments::fetch_for_order(order_id, page, &mut conn).await?;
        Ok(entries)
    }
}

impl PaymentReconciliation for SqliteDatabase {
    async fn reconcile_payment(&self, payment: NewPayment) -> Result<PaymentReceipt, ReconciliationError> {
        let order_id = payment.order_id.clone();
        let mut tx = self.pool.begin().await?;
        if !orders::lock_order(&order_id, &mut tx).await? {
            return Err(ReconciliationError::OrderNotFound(order_id));
        }
        trace!("🗃️ Order {order_id} locked for payment reconciliation");
        let old_order = orders::fetch_order_by_order_id(&order_id, &mut tx)
            .await?
            .ok_or_else(|| ReconciliationError::OrderNotFound(order_id.clone()))?;
        let total_paid = payments::sum_for_order(&order_id, &mut tx).await?;
        if total_paid != old_order.amount_paid {
            warn!(
                "🗃️ Order {order_id} records {} paid, but its ledger sums to {total_paid}. The ledger total will be \
                 used.",
                old_order.amount_paid
            );
        }
        let amount = plan_settlement(&old_order, total_paid, payment.amount)?;
        let entry = payments::insert_entry(&NewLedgerEntry::from_payment(&payment, amount), &mut tx).await?;
        let update = OrderUpdate::new(payment.created_by.clone()).with_amount_paid(total_paid + amount);
        let new_order = orders::update_order(&order_id, update, &mut tx)
            .await?
            .ok_or_else(|| ReconciliationError::OrderNotFound(order_id.clone()))?;
        tx.commit().await?;
        debug!(
            "🗃️ Payment of {amount} (requested {}) applied to order {order_id}. Paid: {} of {}",
            payment.amount, new_order.amount_paid, new_order.ordered_grand_total
        );
        Ok(PaymentReceipt { entry, requested: payment.amount, old_order, new_order })
    }
}

impl AuditLog for SqliteDatabase {
    async fn record(&self, record: NewHistoryRecord) -> Result<HistoryRecord, AuditLogError> {
        let mut conn = self.pool.acquire().await?;
        let record = history::insert_record(record, &mut conn).await?;
        trace!("🗃️ History #{} recorded for {} {}", record.id, record.object_table, record.object_id);
        Ok(record)
    }

    async fn fetch_history(&self, object_table: &str, object_id: &str) -> Result<Vec<HistoryRecord>, AuditLogError> {
        let mut conn = self.pool.acquire().await?;
        let records = history::fetch_for_subject(object_table, object_id, &mut conn).await?;
        Ok(records)
    }
}

impl PermissionGate for SqliteDatabase {
    async fn check(&self, user_id: &str, business_id: &str, role: Role) -> Result<Permission, PermissionGateError> {
        let mut conn = self.pool.acquire().await?;
        let allowed = roles::has_role(user_id, business_id, role, &mut conn).await?;
        Ok(Permission::from(allowed))
    }
}

impl RoleManagement for SqliteDatabase {
    async fn assign_roles(&self, user_id: &str, business_id: &str, roles: &[Role]) -> Result<(), PermissionGateError> {
        let mut tx = self.pool.begin().await?;
        roles::assign_roles(user_id, business_id, roles, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {user_id} now holds {roles:?} for {business_id}");
        Ok(())
    }

    async fn remove_roles(
        &self,
        user_id: &str,
        business_id: &str,
        roles: &[Role],
    ) -> Result<u64, PermissionGateError> {
        let mut tx = self.pool.begin().await?;
        let removed = roles::remove_roles(user_id, business_id, roles, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Removed {removed} role assignments from {user_id} for {business_id}");
        Ok(removed)
    }

    async fn fetch_roles(&self, user_id: &str, business_id: &str) -> Result<Vec<Role>, PermissionGateError> {
        let mut conn = self.pool.acquire().await?;
        let roles = roles::fetch_roles(user_id, business_id, &mut conn).await?;
        Ok(roles)
    }
}

impl ReportingStore for SqliteDatabase {
    async fn fetch_sold_items(&self, query: &ReportQuery) -> Result<Vec<SoldItem>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = reports::fetch_sold_items(query, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_order_totals(&self, query: &ReportQuery) -> Result<OrderTotals, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let totals = reports::fetch_order_totals(query, &mut conn).await?;
        Ok(totals)
    }
}
