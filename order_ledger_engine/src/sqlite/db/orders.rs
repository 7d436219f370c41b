use chrono::Utc;
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderId, OrderItem},
    ledger_api::order_objects::{OrderQueryFilter, OrderUpdate},
    traits::StoreError,
};

/// Inserts a new order and its line items. This is not atomic on its own. Pass `&mut tx` from an open transaction so
/// that a failure in any item rolls back the order too.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, StoreError> {
    let grand_total = order
        .grand_total()
        .ok_or_else(|| StoreError::InvalidOrder(format!("The grand total for order {} is too large", order.order_id)))?;
    let result = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                business_id,
                customer_id,
                memo,
                ordered_grand_total,
                created_by,
                updated_by,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.business_id)
    .bind(&order.customer_id)
    .bind(&order.memo)
    .bind(grand_total)
    .bind(&order.created_by)
    .bind(&order.created_by)
    .bind(order.created_at)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await;
    let new_order: Order = match result {
        Ok(o) => o,
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(StoreError::OrderAlreadyExists(order.order_id.clone()));
        },
        Err(e) => return Err(e.into()),
    };
    for item in &order.items {
        insert_item(&order.order_id, item, &mut *conn).await?;
    }
    debug!("📝️ Order [{}] inserted with id {} and {} items", new_order.order_id, new_order.id, order.items.len());
    Ok(new_order)
}

async fn insert_item(
    order_id: &OrderId,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, sku_id, name, quantity, unit_price, unit_cost)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(&item.sku_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.unit_cost)
    .fetch_one(conn)
    .await
}

/// Returns the order for the corresponding `order_id`, unless it has been deleted.
pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1 AND deleted_at IS NULL")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// Takes the database write lock and pins the order row for the rest of the transaction.
///
/// SQLite has no `SELECT ... FOR UPDATE`. A no-op write on the order row does the same job: from this statement until
/// the transaction ends, no other connection can write, and any connection trying to will wait on its busy timeout.
/// This must be the first statement in the transaction so that every subsequent read sees the locked state.
///
/// Returns `false` if the order does not exist or has been deleted.
pub async fn lock_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET updated_at = updated_at WHERE order_id = $1 AND deleted_at IS NULL")
        .bind(order_id.as_str())
        .execute(conn)
        .await?;
    trace!("📝️ Lock on order {order_id} taken. {} rows touched", result.rows_affected());
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`. Deleted orders are never returned.
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE deleted_at IS NULL");
    if let Some(business_id) = query.business_id {
        builder.push(" AND business_id = ");
        builder.push_bind(business_id);
    }
    if let Some(customer_id) = query.customer_id {
        builder.push(" AND customer_id = ");
        builder.push_bind(customer_id);
    }
    if let Some(memo) = query.memo {
        builder.push(" AND memo LIKE ");
        builder.push_bind(format!("%{memo}%"));
    }
    if let Some(since) = query.since {
        builder.push(" AND created_at >= ");
        builder.push_bind(since);
    }
    if let Some(until) = query.until {
        builder.push(" AND created_at <= ");
        builder.push_bind(until);
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        builder.push(" AND status IN (");
        let mut in_clause = builder.separated(", ");
        for status in statuses {
            in_clause.push_bind(status);
        }
        in_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY created_at ASC, id ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

/// Writes the fields in `update` to the order. Returns `None` if the order does not exist or has been deleted.
pub async fn update_order(
    order_id: &OrderId,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StoreError> {
    if update.is_empty() {
        debug!("📝️ No fields to update for order {order_id}. Update request skipped.");
        return Err(StoreError::InvalidOrder(format!("The update for order {order_id} has no fields to change")));
    }
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = ");
    builder.push_bind(Utc::now());
    builder.push(", updated_by = ");
    builder.push_bind(update.updated_by);
    if let Some(status) = update.new_status {
        builder.push(", status = ");
        builder.push_bind(status);
    }
    if let Some(amount_paid) = update.new_amount_paid {
        builder.push(", amount_paid = ");
        builder.push_bind(amount_paid);
    }
    if let Some(memo) = update.new_memo {
        builder.push(", memo = ");
        builder.push_bind(memo);
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str().to_string());
    builder.push(" AND deleted_at IS NULL RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(order)
}

pub async fn update_grand_total(
    order_id: &OrderId,
    new_total: Money,
    actor: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET ordered_grand_total = $1, updated_by = $2, updated_at = $3
            WHERE order_id = $4 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(new_total)
    .bind(actor)
    .bind(Utc::now())
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn soft_delete(
    order_id: &OrderId,
    actor: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let now = Utc::now();
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET deleted_at = $1, updated_at = $2, updated_by = $3
            WHERE order_id = $4 AND deleted_at IS NULL
            RETURNING *;
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(actor)
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(order)
}
