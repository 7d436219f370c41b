use crate::{
    ledger_api::report_objects::{OrderTotals, ReportQuery, SoldItem},
    traits::StoreError,
};

/// Read-only access to the data behind profit reports. Cancelled and soft-deleted orders never contribute.
#[allow(async_fn_in_trait)]
pub trait ReportingStore {
    /// Every order line sold by the business within the query's time window.
    async fn fetch_sold_items(&self, query: &ReportQuery) -> Result<Vec<SoldItem>, StoreError>;

    async fn fetch_order_totals(&self, query: &ReportQuery) -> Result<OrderTotals, StoreError>;
}
