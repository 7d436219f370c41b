//! The public API of the order ledger engine.
//!
//! * [`reconciliation_api::ReconciliationApi`] applies payments to orders and lists them.
//! * [`order_flow_api::OrderFlowApi`] manages the order lifecycle.
//! * [`reporting_api::ReportingApi`] builds profit reports.
//!
//! Each API is generic over the backend traits it needs, so any backend implementing [`crate::traits`] can be used.
mod audit_trail;

pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod reconciliation_api;
pub mod report_objects;
pub mod reporting_api;
