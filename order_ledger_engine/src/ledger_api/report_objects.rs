use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{db_types::Money, ledger_api::order_objects::Page};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSort {
    /// Total quantity sold, highest first
    #[default]
    QuantityDesc,
    RevenueDesc,
    ProfitDesc,
    SkuAsc,
}

/// Parameters for a profit report. The time window applies to order creation time and is inclusive at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub business_id: String,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub sort: ReportSort,
    pub page: Page,
}

impl ReportQuery {
    pub fn new<S: Into<String>>(business_id: S) -> Self {
        Self { business_id: business_id.into(), since: None, until: None, sort: ReportSort::default(), page: Page::default() }
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn sorted_by(mut self, sort: ReportSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.page = page;
        self
    }
}

/// One sold order line, as read from a non-cancelled, non-deleted order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SoldItem {
    pub sku_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub unit_cost: Money,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderTotals {
    pub order_count: i64,
    pub sum_grand_total: Money,
    pub sum_paid: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuReportRow {
    pub sku_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitReport {
    pub business_id: String,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub order_count: i64,
    pub sum_grand_total: Money,
    pub sum_paid: Money,
    pub sum_outstanding: Money,
    pub cost_total: Money,
    pub profit_total: Money,
    /// The number of distinct SKUs across all pages
    pub total_skus: usize,
    pub page: Page,
    pub items: Vec<SkuReportRow>,
}
