use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Money, NewLedgerEntry, OrderId, PaymentLedgerEntry},
    ledger_api::order_objects::Page,
};

pub async fn insert_entry(
    entry: &NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<PaymentLedgerEntry, sqlx::Error> {
    let entry: PaymentLedgerEntry = sqlx::query_as(
        r#"
            INSERT INTO payment_order_history (order_id, amount, payment_method, payment_source_id, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(entry.order_id.as_str())
    .bind(entry.amount)
    .bind(entry.payment_method)
    .bind(&entry.payment_source_id)
    .bind(&entry.created_by)
    .fetch_one(conn)
    .await?;
    trace!("💰️ Ledger entry #{} of {} recorded for order {}", entry.id, entry.amount, entry.order_id);
    Ok(entry)
}

pub async fn sum_for_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM payment_order_history WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(Money::from(total))
}

pub async fn fetch_for_order(
    order_id: &OrderId,
    page: Page,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentLedgerEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT * FROM payment_order_history WHERE order_id = $1
            ORDER BY created_at ASC, id ASC
            LIMIT $2 OFFSET $3;
        "#,
    )
    .bind(order_id.as_str())
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(conn)
    .await
}
