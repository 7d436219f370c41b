use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, PaymentLedgerEntry};

/// The outcome of a successfully applied payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// The ledger entry that was created. Its amount may be less than what was requested.
    pub entry: PaymentLedgerEntry,
    /// The amount the caller asked to pay
    pub requested: Money,
    pub old_order: Order,
    pub new_order: Order,
}

impl PaymentReceipt {
    /// True if the requested amount exceeded the outstanding debt and was reduced.
    pub fn was_clamped(&self) -> bool {
        self.entry.amount < self.requested
    }

    /// True if this payment settled the order in full.
    pub fn settled_order(&self) -> bool {
        !self.old_order.is_settled() && self.new_order.is_settled()
    }
}
