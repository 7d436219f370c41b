use std::fmt::Debug;

use futures_util::future::join;
use log::*;
use serde_json::json;
use tokio::time::timeout;

use crate::{
    config::EngineConfig,
    db_types::{AuditAction, NewHistoryRecord, NewPayment, OrderId, PaymentLedgerEntry, ORDERS_TABLE, PAYMENTS_TABLE},
    events::{EventProducers, OrderSettledEvent, PaymentAppliedEvent},
    ledger_api::{
        audit_trail::{is_authorized, record_or_warn},
        order_objects::Page,
    },
    traits::{AuditLog, OrderStore, PaymentLedger, PaymentReceipt, PaymentReconciliation, PermissionGate, ReconciliationError},
};

/// `ReconciliationApi` applies payments to orders and serves the payment history for an order.
///
/// It composes three collaborators:
/// * the backend `B`, which owns orders and the ledger and provides the transactional reconciliation step,
/// * the permission gate `G`,
/// * the audit log `L`, which receives a record for every payment after it has been committed.
///
/// The audit log is a separate value from the backend. Audit writes happen on their own connection after
/// the payment transaction has finished, and a failing audit log never changes the outcome of a payment.
pub struct ReconciliationApi<B, G, L> {
    db: B,
    gate: G,
    audit: L,
    config: EngineConfig,
    producers: EventProducers,
}

impl<B, G, L> Debug for ReconciliationApi<B, G, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B, G, L> ReconciliationApi<B, G, L> {
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

impl<B, G, L> ReconciliationApi<B, G, L>
where
    B: PaymentReconciliation + OrderStore + PaymentLedger,
    G: PermissionGate,
    L: AuditLog,
{
    /// Applies a payment against an order.
    ///
    /// The acting user (`payment.created_by`) must hold one of the configured payment roles for the order's business.
    /// The amount recorded is the requested amount clamped to what the order still owes, so `amount_paid` never
    /// exceeds the grand total. Concurrent payments against the same order are serialised by the backend.
    ///
    /// | Order state                         | Result                  |
    /// |-------------------------------------|-------------------------|
    /// | missing or deleted                  | `OrderNotFound`         |
    /// | `cancel`                            | `OrderCancelled`        |
    /// | ledger total ≥ grand total          | `AlreadySettled`        |
    /// | anything else                       | receipt for the payment |
    ///
    /// The authorisation and database work must finish within `apply_payment_timeout`, otherwise the transaction is
    /// abandoned (and rolled back) and `Internal` is returned.
    ///
    /// After the payment is committed:
    /// * the ledger entry and the order change are written to the audit log, concurrently. Failures are logged only.
    /// * `PaymentApplied` is published, followed by `OrderSettled` if this payment paid the order off.
    pub async fn apply_payment(&self, payment: NewPayment) -> Result<PaymentReceipt, ReconciliationError> {
        if !payment.amount.is_positive() {
            return Err(ReconciliationError::InvalidAmount(payment.amount));
        }
        let order_id = payment.order_id.clone();
        let deadline = self.config.apply_payment_timeout;
        let receipt = match timeout(deadline, self.authorize_and_reconcile(payment)).await {
            Ok(result) => result?,
            Err(_) => {
                error!("🔄️💰️ Payment against order {order_id} did not complete within {deadline:?}. It was rolled back.");
                return Err(ReconciliationError::Internal(format!(
                    "Applying a payment to order {order_id} timed out after {deadline:?}"
                )));
            },
        };
        if receipt.was_clamped() {
            info!(
                "🔄️💰️ Payment of {} against order {order_id} exceeded the debt and was reduced to {}",
                receipt.requested, receipt.entry.amount
            );
        }
        self.record_payment_history(&receipt).await;
        self.publish_payment_events(&receipt).await;
        debug!("🔄️💰️ Payment #{} for order {order_id} processing complete", receipt.entry.id);
        Ok(receipt)
    }

    async fn authorize_and_reconcile(&self, payment: NewPayment) -> Result<PaymentReceipt, ReconciliationError> {
        let order = self.db.fetch_order(&payment.order_id).await?;
        let user_id = payment.created_by.as_str();
        if !is_authorized(&self.gate, user_id, &order.business_id, &self.config.payment_roles).await? {
            return Err(ReconciliationError::PermissionDenied {
                user_id: user_id.to_string(),
                business_id: order.business_id,
            });
        }
        trace!("🔄️💰️ {user_id} is authorised to pay order {}", order.order_id);
        self.db.reconcile_payment(payment).await
    }

    async fn record_payment_history(&self, receipt: &PaymentReceipt) {
        let messages = &self.config.messages;
        let entry = &receipt.entry;
        let entry_record = NewHistoryRecord::new(
            PAYMENTS_TABLE,
            entry.id.to_string(),
            AuditAction::Create,
            &messages.payment_created,
            &entry.created_by,
        )
        .with_data(json!({ "entry": entry, "requested": receipt.requested }));
        let order_record = NewHistoryRecord::new(
            ORDERS_TABLE,
            receipt.new_order.order_id.as_str(),
            AuditAction::Update,
            &messages.order_amount_paid_updated,
            &entry.created_by,
        )
        .with_data(json!({ "before": receipt.old_order, "after": receipt.new_order }));
        join(record_or_warn(&self.audit, entry_record), record_or_warn(&self.audit, order_record)).await;
    }

    async fn publish_payment_events(&self, receipt: &PaymentReceipt) {
        self.producers.publish_payment_applied(PaymentAppliedEvent::new(receipt.clone())).await;
        if receipt.settled_order() {
            debug!("🔄️💰️ Order {} is now paid in full", receipt.new_order.order_id);
            self.producers.publish_order_settled(OrderSettledEvent::new(receipt.new_order.clone())).await;
        }
    }

    /// Lists the payments made against an order, oldest first.
    pub async fn list_payments(
        &self,
        user_id: &str,
        order_id: &OrderId,
        page: Page,
    ) -> Result<Vec<PaymentLedgerEntry>, ReconciliationError> {
        let order = self.db.fetch_order(order_id).await?;
        if !is_authorized(&self.gate, user_id, &order.business_id, &self.config.read_roles).await? {
            return Err(ReconciliationError::PermissionDenied {
                user_id: user_id.to_string(),
                business_id: order.business_id,
            });
        }
        let payments = self.db.fetch_payments_for_order(order_id, page).await?;
        trace!("🔄️💰️ {} payments fetched for order {order_id}", payments.len());
        Ok(payments)
    }
}
