//! Engine configuration.
//!
//! [`EngineConfig`] is an immutable value that is built once (usually via [`EngineConfig::from_env_or_default`]) and
//! handed to the database backend and the API structs when they are constructed. Nothing in the engine reads the
//! environment after that point.
use std::{env, str::FromStr, time::Duration};

use ledger_common::helpers::{parse_boolean_flag, parse_list};
use log::*;

use crate::db_types::Role;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_ledger.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_APPLY_PAYMENT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long a connection waits for the SQLite write lock before giving up.
    pub busy_timeout: Duration,
    /// Use write-ahead logging. Readers then never block on the writer holding an order lock.
    pub use_wal: bool,
    /// The deadline for the transactional part of `apply_payment`.
    pub apply_payment_timeout: Duration,
    pub event_buffer_size: usize,
    /// A user holding any of these roles for an order's business may apply payments to it.
    pub payment_roles: Vec<Role>,
    /// Roles that may create orders, change their status, edit totals and delete them.
    pub order_roles: Vec<Role>,
    /// Roles that may read orders and payment history.
    pub read_roles: Vec<Role>,
    /// Roles that may run reports for a business.
    pub report_roles: Vec<Role>,
    pub messages: AuditMessages,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            use_wal: true,
            apply_payment_timeout: DEFAULT_APPLY_PAYMENT_TIMEOUT,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            payment_roles: vec![Role::Owner, Role::Manager, Role::Cashier],
            order_roles: vec![Role::Owner, Role::Manager, Role::Cashier],
            read_roles: vec![Role::Owner, Role::Manager, Role::Cashier, Role::Auditor],
            report_roles: vec![Role::Owner, Role::Manager, Role::Auditor],
            messages: AuditMessages::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(database_url: &str) -> Self {
        Self { database_url: database_url.to_string(), ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let database_url = env::var("OLE_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OLE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_env_or("OLE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let busy_timeout = Duration::from_millis(parse_env_or("OLE_BUSY_TIMEOUT_MS", 5_000u64));
        let use_wal = parse_boolean_flag(env::var("OLE_USE_WAL").ok(), true);
        let apply_payment_timeout = Duration::from_secs(parse_env_or("OLE_APPLY_PAYMENT_TIMEOUT", 60u64));
        let event_buffer_size = parse_env_or("OLE_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let payment_roles = roles_from_env("OLE_PAYMENT_ROLES", defaults.payment_roles);
        let order_roles = roles_from_env("OLE_ORDER_ROLES", defaults.order_roles);
        let read_roles = roles_from_env("OLE_READ_ROLES", defaults.read_roles);
        let report_roles = roles_from_env("OLE_REPORT_ROLES", defaults.report_roles);
        Self {
            database_url,
            max_connections,
            busy_timeout,
            use_wal,
            apply_payment_timeout,
            event_buffer_size,
            payment_roles,
            order_roles,
            read_roles,
            report_roles,
            messages: AuditMessages::default(),
        }
    }

    pub fn with_apply_payment_timeout(mut self, timeout: Duration) -> Self {
        self.apply_payment_timeout = timeout;
        self
    }

    pub fn with_messages(mut self, messages: AuditMessages) -> Self {
        self.messages = messages;
        self
    }
}

fn parse_env_or<T>(var: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {var}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn roles_from_env(var: &str, default: Vec<Role>) -> Vec<Role> {
    let Ok(value) = env::var(var) else {
        return default;
    };
    let roles = parse_list(&value)
        .into_iter()
        .filter_map(|s| {
            s.parse::<Role>().map_err(|e| warn!("🪛️ Ignoring invalid role ({s}) in {var}: {e}")).ok()
        })
        .collect::<Vec<Role>>();
    if roles.is_empty() {
        warn!("🚨️ {var} was configured, but contains no valid roles. No user will be authorised for this action.");
    }
    roles
}

/// The description strings written to the audit log.
///
/// These are injected into the engine as part of [`EngineConfig`] so that hosts can localise or reword them without
/// touching engine code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditMessages {
    pub order_created: String,
    pub order_status_changed: String,
    pub order_total_modified: String,
    pub order_deleted: String,
    pub payment_created: String,
    pub order_amount_paid_updated: String,
}

impl Default for AuditMessages {
    fn default() -> Self {
        Self {
            order_created: "Order created".to_string(),
            order_status_changed: "Order status changed".to_string(),
            order_total_modified: "Order grand total modified".to_string(),
            order_deleted: "Order deleted".to_string(),
            payment_created: "Payment recorded against order".to_string(),
            order_amount_paid_updated: "Order amount paid updated".to_string(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.apply_payment_timeout, Duration::from_secs(60));
        assert!(config.payment_roles.contains(&Role::Cashier));
        assert!(!config.report_roles.contains(&Role::Cashier));
        assert_eq!(config.messages.payment_created, "Payment recorded against order");
    }

    #[test]
    fn reading_from_env() {
        env::set_var("OLE_TEST_ROLES", "owner, auditor, janitor");
        assert_eq!(roles_from_env("OLE_TEST_ROLES", vec![]), vec![Role::Owner, Role::Auditor]);
        env::set_var("OLE_TEST_NUMBER", "not-a-number");
        assert_eq!(parse_env_or("OLE_TEST_NUMBER", 7u32), 7);
        env::set_var("OLE_TEST_NUMBER", " 12 ");
        assert_eq!(parse_env_or("OLE_TEST_NUMBER", 7u32), 12);
        assert_eq!(roles_from_env("OLE_TEST_UNSET_ROLES", vec![Role::Manager]), vec![Role::Manager]);
    }
}
