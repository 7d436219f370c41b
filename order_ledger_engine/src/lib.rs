//! Order Ledger Engine
//!
//! The order ledger engine records orders, accepts (possibly partial) payments against them, and keeps an append-only
//! audit trail of every change. It is storage-agnostic: the engine logic talks to its backend through the traits in
//! [`mod@traits`], and a SQLite backend is provided.
//!
//! The library is divided into these sections:
//! 1. Data types ([`mod@db_types`]) shared by every backend and API.
//! 2. Backend contracts ([`mod@traits`]) and the SQLite implementation, [`SqliteDatabase`].
//! 3. The public API ([`mod@ledger_api`]): payment reconciliation, order flow and reporting.
//! 4. Configuration ([`mod@config`]), built once and injected into the backend and APIs.
//!
//! The engine also publishes events when payments are applied, orders are settled or an order's status changes. A
//! simple hook system ([`mod@events`]) lets you subscribe to these and react to them.
pub mod config;
pub mod db_types;
pub mod events;
pub mod ledger_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::{AuditMessages, EngineConfig};
pub use ledger_api::{
    errors::{OrderFlowError, ReportingError},
    order_flow_api::OrderFlowApi,
    order_objects,
    reconciliation_api::ReconciliationApi,
    report_objects,
    reporting_api::ReportingApi,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
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
};
