use crate::{
    db_types::{Money, NewLedgerEntry, OrderId, PaymentLedgerEntry},
    ledger_api::order_objects::Page,
    traits::StoreError,
};

/// Owns the payment ledger. One entry per accepted payment; entries are never modified.
#[allow(async_fn_in_trait)]
pub trait PaymentLedger {
    /// Appends an entry to the ledger as-is.
    ///
    /// This does not touch the order's `amount_paid`. Payments against orders should be applied through the
    /// reconciliation flow, which keeps the two in step.
    async fn insert_ledger_entry(&self, entry: NewLedgerEntry) -> Result<PaymentLedgerEntry, StoreError>;

    /// The sum of all ledger entries for the order. Zero if there are none.
    async fn total_paid_for_order(&self, order_id: &OrderId) -> Result<Money, StoreError>;

    /// Ledger entries for the order in the order they were created.
    async fn fetch_payments_for_order(
        &self,
        order_id: &OrderId,
        page: Page,
    ) -> Result<Vec<PaymentLedgerEntry>, StoreError>;
}
