//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open a transaction and pass `&mut tx` to each function
//! when several writes must succeed or fail together.
use std::{str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod history;
pub mod order_tracking;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod roles;

pub async fn new_pool(
    url: &str,
    max_connections: u32,
    busy_timeout: Duration,
    use_wal: bool,
) -> Result<SqlitePool, SqlxError> {
    let mut options = SqliteConnectOptions::from_str(url)?.busy_timeout(busy_timeout).foreign_keys(true);
    if use_wal {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    info!("🗃️ Connected to {url} with up to {max_connections} connections");
    Ok(pool)
}
