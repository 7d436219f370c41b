use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Money, Order, OrderId, OrderStatusType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub business_id: Option<String>,
    pub customer_id: Option<String>,
    pub memo: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_business_id<S: Into<String>>(mut self, business_id: S) -> Self {
        self.business_id = Some(business_id.into());
        self
    }

    pub fn with_customer_id<S: Into<String>>(mut self, customer_id: S) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.business_id.is_none() &&
            self.customer_id.is_none() &&
            self.memo.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.status.as_ref().map(Vec::is_empty).unwrap_or(true)
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(business_id) = &self.business_id {
            write!(f, "business_id: {business_id}. ")?;
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(memo) = &self.memo {
            write!(f, "memo: {memo}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        Ok(())
    }
}

/// The set of order fields that may be changed after an order is placed.
///
/// The grand total is not editable here. Use `OrderStore::modify_grand_total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub updated_by: String,
    pub new_status: Option<OrderStatusType>,
    pub new_amount_paid: Option<Money>,
    pub new_memo: Option<String>,
}

impl OrderUpdate {
    pub fn new<S: Into<String>>(updated_by: S) -> Self {
        Self { updated_by: updated_by.into(), new_status: None, new_amount_paid: None, new_memo: None }
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.new_status = Some(status);
        self
    }

    pub fn with_amount_paid(mut self, amount_paid: Money) -> Self {
        self.new_amount_paid = Some(amount_paid);
        self
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.new_memo = Some(memo.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.new_status.is_none() && self.new_amount_paid.is_none() && self.new_memo.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanged {
    pub old_order: Order,
    pub new_order: Order,
}

impl OrderChanged {
    pub fn new(old_order: Order, new_order: Order) -> Self {
        Self { old_order, new_order }
    }

    pub fn order_id(&self) -> &OrderId {
        &self.new_order.order_id
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Page {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page: page.max(1), page_size: page_size.clamp(1, MAX_PAGE_SIZE) }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }
}
