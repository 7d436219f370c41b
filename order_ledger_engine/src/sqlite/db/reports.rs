use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::ledger_api::report_objects::{OrderTotals, ReportQuery, SoldItem};

/// Restricts `o` (the orders table) to live orders of the business within the report window.
fn push_order_scope(builder: &mut QueryBuilder<'_, Sqlite>, query: &ReportQuery) {
    builder.push(" WHERE o.deleted_at IS NULL AND o.status <> 'cancel' AND o.business_id = ");
    builder.push_bind(query.business_id.clone());
    if let Some(since) = query.since {
        builder.push(" AND o.created_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND o.created_at <= ");
        builder.push_bind(until);
    }
}

pub async fn fetch_sold_items(query: &ReportQuery, conn: &mut SqliteConnection) -> Result<Vec<SoldItem>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        "SELECT i.sku_id, i.name, i.quantity, i.unit_price, i.unit_cost FROM order_items i JOIN orders o ON o.order_id \
         = i.order_id",
    );
    push_order_scope(&mut builder, query);
    builder.push(" ORDER BY i.id ASC");
    trace!("📊️ Executing query: {}", builder.sql());
    builder.build_query_as::<SoldItem>().fetch_all(conn).await
}

pub async fn fetch_order_totals(query: &ReportQuery, conn: &mut SqliteConnection) -> Result<OrderTotals, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        "SELECT COUNT(*) AS order_count, COALESCE(SUM(o.ordered_grand_total), 0) AS sum_grand_total, \
         COALESCE(SUM(o.amount_paid), 0) AS sum_paid FROM orders o",
    );
    push_order_scope(&mut builder, query);
    trace!("📊️ Executing query: {}", builder.sql());
    builder.build_query_as::<OrderTotals>().fetch_one(conn).await
}
