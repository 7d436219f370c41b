use sqlx::SqliteConnection;

use crate::db_types::{OrderId, OrderStatusLogEntry, OrderStatusType};

pub async fn append_status(
    order_id: &OrderId,
    status: OrderStatusType,
    actor: &str,
    note: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<OrderStatusLogEntry, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_status_log (order_id, status, actor, note)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(status)
    .bind(actor)
    .bind(note)
    .fetch_one(conn)
    .await
}

pub async fn fetch_status_log(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderStatusLogEntry>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_status_log WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await
}
