use std::{collections::BTreeMap, fmt::Debug};

use log::*;

use crate::{
    config::EngineConfig,
    db_types::Money,
    ledger_api::{
        audit_trail::is_authorized,
        errors::ReportingError,
        report_objects::{ProfitReport, ReportQuery, ReportSort, SkuReportRow, SoldItem},
    },
    traits::{PermissionGate, ReportingStore},
};

/// Read-only profit and revenue reporting over a business's orders.
pub struct ReportingApi<B, G> {
    db: B,
    gate: G,
    config: EngineConfig,
}

impl<B, G> Debug for ReportingApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportingApi")
    }
}

impl<B, G> ReportingApi<B, G> {
    pub fn new(db: B, gate: G, config: EngineConfig) -> Self {
        Self { db, gate, config }
    }
}

impl<B, G> ReportingApi<B, G>
where
    B: ReportingStore,
    G: PermissionGate,
{
    /// Builds a profit report for `query.business_id`.
    ///
    /// Cancelled and deleted orders are left out. Profit is the sum of grand totals less the historical cost of every
    /// item sold. The per-SKU breakdown is sorted according to `query.sort` (ties always go to the lower SKU) and then
    /// paged.
    pub async fn profit_report(&self, user_id: &str, query: ReportQuery) -> Result<ProfitReport, ReportingError> {
        if let (Some(since), Some(until)) = (query.since, query.until) {
            if since > until {
                let msg = format!("The report window starts ({since}) after it ends ({until})");
                return Err(ReportingError::InvalidQuery(msg));
            }
        }
        if !is_authorized(&self.gate, user_id, &query.business_id, &self.config.report_roles).await? {
            return Err(ReportingError::PermissionDenied {
                user_id: user_id.to_string(),
                business_id: query.business_id.clone(),
            });
        }
        let totals = self.db.fetch_order_totals(&query).await?;
        let sold = self.db.fetch_sold_items(&query).await?;
        trace!("📊️ {} orders and {} sold lines for {}", totals.order_count, sold.len(), query.business_id);
        let mut rows = summarize_by_sku(sold)?;
        let cost_total =
            rows.iter().try_fold(Money::ZERO, |total, r| total.checked_add(r.cost)).ok_or_else(|| overflow("cost"))?;
        let sum_outstanding =
            totals.sum_grand_total.checked_sub(totals.sum_paid).ok_or_else(|| overflow("outstanding"))?;
        let profit_total = totals.sum_grand_total.checked_sub(cost_total).ok_or_else(|| overflow("profit"))?;
        sort_rows(&mut rows, query.sort);
        let total_skus = rows.len();
        let items = rows
            .into_iter()
            .skip(usize::try_from(query.page.offset()).unwrap_or(usize::MAX))
            .take(query.page.page_size as usize)
            .collect();
        let report = ProfitReport {
            business_id: query.business_id,
            since: query.since,
            until: query.until,
            order_count: totals.order_count,
            sum_grand_total: totals.sum_grand_total,
            sum_paid: totals.sum_paid,
            sum_outstanding,
            cost_total,
            profit_total,
            total_skus,
            page: query.page,
            items,
        };
        debug!("📊️ Profit report for {} built. Profit: {}", report.business_id, report.profit_total);
        Ok(report)
    }
}

/// Folds sold order lines into one row per SKU. The first name seen for a SKU is kept. Rows come out in SKU order.
///
/// Fails if any per-SKU figure no longer fits in a money amount.
pub fn summarize_by_sku(sold: Vec<SoldItem>) -> Result<Vec<SkuReportRow>, ReportingError> {
    let mut by_sku = BTreeMap::<String, SkuReportRow>::new();
    for item in sold {
        let revenue = item.unit_price.checked_mul(item.quantity).ok_or_else(|| overflow(&item.sku_id))?;
        let cost = item.unit_cost.checked_mul(item.quantity).ok_or_else(|| overflow(&item.sku_id))?;
        let row = by_sku.entry(item.sku_id.clone()).or_insert_with(|| SkuReportRow {
            sku_id: item.sku_id.clone(),
            name: item.name,
            quantity: 0,
            revenue: Money::ZERO,
            cost: Money::ZERO,
            profit: Money::ZERO,
        });
        row.quantity = row.quantity.checked_add(item.quantity).ok_or_else(|| overflow(&item.sku_id))?;
        row.revenue = row.revenue.checked_add(revenue).ok_or_else(|| overflow(&item.sku_id))?;
        row.cost = row.cost.checked_add(cost).ok_or_else(|| overflow(&item.sku_id))?;
        row.profit = row.revenue.checked_sub(row.cost).ok_or_else(|| overflow(&item.sku_id))?;
    }
    Ok(by_sku.into_values().collect())
}

fn overflow(what: &str) -> ReportingError {
    ReportingError::Internal(format!("Report figures for {what} are too large to represent"))
}

/// Sorts report rows. Every ordering breaks ties by SKU, ascending, so the result is deterministic.
pub fn sort_rows(rows: &mut [SkuReportRow], sort: ReportSort) {
    match sort {
        ReportSort::QuantityDesc => rows.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.sku_id.cmp(&b.sku_id))),
        ReportSort::RevenueDesc => rows.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.sku_id.cmp(&b.sku_id))),
        ReportSort::ProfitDesc => rows.sort_by(|a, b| b.profit.cmp(&a.profit).then_with(|| a.sku_id.cmp(&b.sku_id))),
        ReportSort::SkuAsc => rows.sort_by(|a, b| a.sku_id.cmp(&b.sku_id)),
    }
}
