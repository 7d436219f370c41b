use thiserror::Error;

use crate::{
    db_types::{Money, OrderId, OrderStatusType},
    traits::{PermissionGateError, StoreError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
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
    #[error("User {user_id} is not authorised for this action on business {business_id}")]
    PermissionDenied { user_id: String, business_id: String },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for OrderFlowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(id) => Self::OrderNotFound(id),
            StoreError::OrderAlreadyExists(id) => Self::OrderAlreadyExists(id),
            StoreError::InvalidOrder(s) => Self::InvalidOrder(s),
            StoreError::InvalidTransition { from, to } => Self::InvalidTransition { from, to },
            StoreError::NoOp(status) => Self::NoOp(status),
            StoreError::OrderNotEditable { order_id, status } => Self::OrderNotEditable { order_id, status },
            StoreError::GrandTotalBelowPaid { new_total, paid } => Self::GrandTotalBelowPaid { new_total, paid },
            StoreError::DatabaseError(s) => Self::Internal(s),
        }
    }
}

impl From<PermissionGateError> for OrderFlowError {
    fn from(e: PermissionGateError) -> Self {
        Self::Internal(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ReportingError {
    #[error("User {user_id} may not view reports for business {business_id}")]
    PermissionDenied { user_id: String, business_id: String },
    #[error("Invalid report query: {0}")]
    InvalidQuery(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ReportingError {
    fn from(e: StoreError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<PermissionGateError> for ReportingError {
    fn from(e: PermissionGateError) -> Self {
        Self::Internal(e.to_string())
    }
}
