use sqlx::SqliteConnection;

use crate::db_types::Role;

pub async fn has_role(
    user_id: &str,
    business_id: &str,
    role: Role,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM role_assignments WHERE user_id = $1 AND business_id = $2 AND role = $3",
    )
    .bind(user_id)
    .bind(business_id)
    .bind(role)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Idempotent. Roles the user already holds are skipped.
pub async fn assign_roles(
    user_id: &str,
    business_id: &str,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    for role in roles {
        sqlx::query("INSERT OR IGNORE INTO role_assignments (user_id, business_id, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(business_id)
            .bind(*role)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

pub async fn remove_roles(
    user_id: &str,
    business_id: &str,
    roles: &[Role],
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let mut removed = 0;
    for role in roles {
        let result = sqlx::query("DELETE FROM role_assignments WHERE user_id = $1 AND business_id = $2 AND role = $3")
            .bind(user_id)
            .bind(business_id)
            .bind(*role)
            .execute(&mut *conn)
            .await?;
        removed += result.rows_affected();
    }
    Ok(removed)
}

pub async fn fetch_roles(
    user_id: &str,
    business_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Role>, sqlx::Error> {
    sqlx::query_scalar("SELECT role FROM role_assignments WHERE user_id = $1 AND business_id = $2 ORDER BY id ASC")
        .bind(user_id)
        .bind(business_id)
        .fetch_all(conn)
        .await
}
