//! # Backend interface contracts
//!
//! Persistence is split by aggregate. A backend implements some or all of these traits, and the APIs in
//! [`crate::ledger_api`] compose them.
//!
//! * [`OrderStore`] owns orders, their line items and their status log.
//! * [`PaymentLedger`] owns the immutable payment ledger.
//! * [`AuditLog`] is the append-only history of mutations.
//! * [`PaymentReconciliation`] is the transactional unit of work that applies a payment across the order and the
//!   ledger at once.
//! * [`ReportingStore`] provides read-only aggregates for reports.
//! * [`PermissionGate`] answers role checks. [`RoleManagement`] administers roles for backends that store them.
mod audit_log;
mod data_objects;
mod order_store;
mod payment_ledger;
mod payment_reconciliation;
mod permission_gate;
mod reporting;

pub use audit_log::{AuditLog, AuditLogError};
pub use data_objects::PaymentReceipt;
pub use order_store::{OrderStore, StoreError};
pub use payment_ledger::PaymentLedger;
pub use payment_reconciliation::{plan_settlement, PaymentReconciliation, ReconciliationError};
pub use permission_gate::{PermissionGate, PermissionGateError, RoleManagement};
pub use reporting::ReportingStore;
