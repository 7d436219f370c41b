use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use ledger_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// Table names used as audit subjects. History rows reference entities by `(table, id)` pairs.
pub const ORDERS_TABLE: &str = "orders";
pub const PAYMENTS_TABLE: &str = "payment_order_history";

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConversionError("An order id cannot be empty".into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle state of an order.
///
/// ```text
///   waiting_confirm ──► delivering ──► complete
///          │                 │
///          └──────► cancel ◄─┘
/// ```
///
/// `complete` and `cancel` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusType {
    /// The order has been placed and is waiting for the merchant to confirm it.
    WaitingConfirm,
    /// The order has been confirmed and is on its way to the customer.
    Delivering,
    /// The order has been delivered.
    Complete,
    /// The order has been cancelled by the customer or the merchant.
    Cancel,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Cancel)
    }

    /// Whether the state machine permits moving from `self` to `next`. Self-transitions are never permitted.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (WaitingConfirm, Delivering) | (Delivering, Complete) | (WaitingConfirm | Delivering, Cancel))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::WaitingConfirm => write!(f, "waiting_confirm"),
            OrderStatusType::Delivering => write!(f, "delivering"),
            OrderStatusType::Complete => write!(f, "complete"),
            OrderStatusType::Cancel => write!(f, "cancel"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting_confirm" => Ok(Self::WaitingConfirm),
            "delivering" => Ok(Self::Delivering),
            "complete" => Ok(Self::Complete),
            "cancel" => Ok(Self::Cancel),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to waiting_confirm");
            OrderStatusType::WaitingConfirm
        })
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub business_id: String,
    pub customer_id: String,
    pub memo: Option<String>,
    /// What the buyer owes. Fixed when the order is placed and only changed by an explicit edit.
    pub ordered_grand_total: Money,
    /// Running total of accepted payments. Only the reconciliation flow writes this.
    pub amount_paid: Money,
    pub status: OrderStatusType,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The amount the order can still accept.
    pub fn debt(&self) -> Money {
        self.ordered_grand_total - self.amount_paid
    }

    pub fn is_settled(&self) -> bool {
        self.amount_paid >= self.ordered_grand_total
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

//--------------------------------------       OrderItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub sku_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// The cost of the item to the merchant at the time of sale.
    pub unit_cost: Money,
}

impl OrderItem {
    /// `None` if the line total does not fit in a money amount.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub fn line_cost(&self) -> Option<Money> {
        self.unit_cost.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub sku_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
}

impl NewOrderItem {
    pub fn new<S: Into<String>>(sku_id: S, quantity: i64, unit_price: Money) -> Self {
        let sku_id = sku_id.into();
        Self { name: sku_id.clone(), sku_id, quantity, unit_price, unit_cost: Money::ZERO }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_unit_cost(mut self, unit_cost: Money) -> Self {
        self.unit_cost = unit_cost;
        self
    }

    /// `None` if the line total does not fit in a money amount.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    pub fn line_cost(&self) -> Option<Money> {
        self.unit_cost.checked_mul(self.quantity)
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// The external, unique order id
    pub order_id: OrderId,
    /// The business that sold the order. Permission checks are made against this id.
    pub business_id: String,
    pub customer_id: String,
    /// An optional free-text note supplied with the order
    pub memo: Option<String>,
    pub items: Vec<NewOrderItem>,
    /// The user that placed the order
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new<B, C, U>(order_id: OrderId, business_id: B, customer_id: C, created_by: U) -> Self
    where
        B: Into<String>,
        C: Into<String>,
        U: Into<String>,
    {
        Self {
            order_id,
            business_id: business_id.into(),
            customer_id: customer_id.into(),
            memo: None,
            items: Vec::new(),
            created_by: created_by.into(),
            created_at: Utc::now(),
        }
    }

    pub fn with_item(mut self, item: NewOrderItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// The grand total for the order is the sum of its line totals. `None` if it overflows.
    pub fn grand_total(&self) -> Option<Money> {
        self.items.iter().try_fold(Money::ZERO, |total, item| total.checked_add(item.line_total()?))
    }

    /// Checks the order for structural problems before it is stored. Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.business_id.trim().is_empty() {
            return Err("business_id is required".into());
        }
        if self.items.is_empty() {
            return Err("an order must contain at least one item".into());
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(format!("item {} has a non-positive quantity", item.sku_id));
        }
        if let Some(item) = self.items.iter().find(|i| i.unit_price.value() < 0 || i.unit_cost.value() < 0) {
            return Err(format!("item {} has a negative price or cost", item.sku_id));
        }
        if let Some(item) = self.items.iter().find(|i| i.line_total().is_none() || i.line_cost().is_none()) {
            return Err(format!("the line total for item {} is too large", item.sku_id));
        }
        if self.grand_total().is_none() {
            return Err("the grand total for the order is too large".into());
        }
        Ok(())
    }
}

//--------------------------------------     PaymentMethod     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    EWallet,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::EWallet => write!(f, "e_wallet"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "bank_transfer" => Ok(Self::BankTransfer),
            "card" => Ok(Self::Card),
            "e_wallet" => Ok(Self::EWallet),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------       NewPayment      ---------------------------------------------------------
/// A request to apply a payment against an order.
///
/// `amount` is what the caller *asks* to pay. The amount actually recorded in the ledger is clamped to the order's
/// outstanding debt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub order_id: OrderId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    /// Identifies where the money came from, e.g. a bank reference or till number
    pub payment_source_id: String,
    /// The acting user
    pub created_by: String,
}

impl NewPayment {
    pub fn new<U: Into<String>>(order_id: OrderId, amount: Money, payment_method: PaymentMethod, created_by: U) -> Self {
        Self { order_id, amount, payment_method, payment_source_id: String::default(), created_by: created_by.into() }
    }

    pub fn with_source<S: Into<String>>(mut self, payment_source_id: S) -> Self {
        self.payment_source_id = payment_source_id.into();
        self
    }
}

//--------------------------------------   PaymentLedgerEntry  ---------------------------------------------------------
/// One accepted payment against an order. Entries are never edited; corrections are new entries.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentLedgerEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_source_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// A ledger row ready for insertion. `amount` has already been clamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub order_id: OrderId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_source_id: String,
    pub created_by: String,
}

impl NewLedgerEntry {
    pub fn from_payment(payment: &NewPayment, amount: Money) -> Self {
        Self {
            order_id: payment.order_id.clone(),
            amount,
            payment_method: payment.payment_method,
            payment_source_id: payment.payment_source_id.clone(),
            created_by: payment.created_by.clone(),
        }
    }
}

//--------------------------------------      AuditAction      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    StatusChange,
    Delete,
}

impl Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
            AuditAction::Update => write!(f, "update"),
            AuditAction::StatusChange => write!(f, "status_change"),
            AuditAction::Delete => write!(f, "delete"),
        }
    }
}

//--------------------------------------     HistoryRecord     ---------------------------------------------------------
/// An append-only audit entry. The subject is identified by `(object_table, object_id)` so that any entity type can be
/// audited.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub id: i64,
    pub object_id: String,
    pub object_table: String,
    pub action: AuditAction,
    pub description: String,
    pub data: Json<Value>,
    pub worker_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRecord {
    pub object_id: String,
    pub object_table: String,
    pub action: AuditAction,
    pub description: String,
    pub data: Value,
    pub worker_id: String,
}

impl NewHistoryRecord {
    pub fn new<I, T, D, W>(object_table: T, object_id: I, action: AuditAction, description: D, worker_id: W) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        D: Into<String>,
        W: Into<String>,
    {
        Self {
            object_id: object_id.into(),
            object_table: object_table.into(),
            action,
            description: description.into(),
            data: Value::Null,
            worker_id: worker_id.into(),
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

//-------------------------------------- OrderStatusLogEntry   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderStatusLogEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub status: OrderStatusType,
    pub actor: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------          Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Manager,
    Cashier,
    Auditor,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Manager => write!(f, "manager"),
            Role::Cashier => write!(f, "cashier"),
            Role::Auditor => write!(f, "auditor"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "manager" => Ok(Self::Manager),
            "cashier" => Ok(Self::Cashier),
            "auditor" => Ok(Self::Auditor),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------       Permission      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allow,
    Deny,
}

impl Permission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Permission::Allow)
    }
}

impl From<bool> for Permission {
    fn from(allowed: bool) -> Self {
        if allowed {
            Permission::Allow
        } else {
            Permission::Deny
        }
    }
}
