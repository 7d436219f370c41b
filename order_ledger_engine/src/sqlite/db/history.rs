use sqlx::{types::Json, SqliteConnection};

use crate::db_types::{HistoryRecord, NewHistoryRecord};

pub async fn insert_record(
    record: NewHistoryRecord,
    conn: &mut SqliteConnection,
) -> Result<HistoryRecord, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO histories (object_id, object_table, action, description, data, worker_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(record.object_id)
    .bind(record.object_table)
    .bind(record.action)
    .bind(record.description)
    .bind(Json(record.data))
    .bind(record.worker_id)
    .fetch_one(conn)
    .await
}

pub async fn fetch_for_subject(
    object_table: &str,
    object_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<HistoryRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM histories WHERE object_table = $1 AND object_id = $2 ORDER BY id ASC")
        .bind(object_table)
        .bind(object_id)
        .fetch_all(conn)
        .await
}
