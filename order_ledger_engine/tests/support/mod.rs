#![allow(dead_code)]
use log::*;
use order_ledger_engine::{
    db_types::{Money, NewOrder, NewOrderItem, NewPayment, Order, OrderId, PaymentMethod, Role},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    EngineConfig,
    OrderFlowApi,
    ReconciliationApi,
    ReportingApi,
    RoleManagement,
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub const SHOP: &str = "shop-1";
pub const OTHER_SHOP: &str = "shop-2";
pub const CASHIER: &str = "cashier-carl";
pub const OWNER: &str = "owner-olga";
pub const AUDITOR: &str = "auditor-ann";
pub const STRANGER: &str = "stranger-sam";

pub type Payments = ReconciliationApi<SqliteDatabase, SqliteDatabase, SqliteDatabase>;
pub type Orders = OrderFlowApi<SqliteDatabase, SqliteDatabase, SqliteDatabase>;
pub type Reports = ReportingApi<SqliteDatabase, SqliteDatabase>;

/// A throwaway database with a few users already holding roles in [`SHOP`].
#[derive(Debug)]
pub struct TestSystem {
    pub url: String,
    pub db: SqliteDatabase,
    pub config: EngineConfig,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let config = EngineConfig { database_url: url.clone(), max_connections: 5, ..config };
        let db = SqliteDatabase::new_with_config(&config).await.expect("Error creating database");
        db.assign_roles(CASHIER, SHOP, &[Role::Cashier]).await.expect("Error assigning roles");
        db.assign_roles(OWNER, SHOP, &[Role::Owner]).await.expect("Error assigning roles");
        db.assign_roles(AUDITOR, SHOP, &[Role::Auditor]).await.expect("Error assigning roles");
        debug!("🚀️ Test system ready at {url}");
        Self { url, db, config }
    }

    pub fn payments(&self) -> Payments {
        ReconciliationApi::new(self.db.clone(), self.db.clone(), self.db.clone(), self.config.clone())
    }

    pub fn orders(&self) -> Orders {
        OrderFlowApi::new(self.db.clone(), self.db.clone(), self.db.clone(), self.config.clone())
    }

    pub fn reports(&self) -> Reports {
        ReportingApi::new(self.db.clone(), self.db.clone(), self.config.clone())
    }

    /// Places a single-item order in [`SHOP`] for `total`.
    pub async fn place_order(&self, order_id: &str, total: i64) -> Order {
        let order = NewOrder::new(OrderId::from(order_id), SHOP, "customer-1", CASHIER)
            .with_item(NewOrderItem::new("SKU-1", 1, Money::from(total)));
        self.orders().create_order(order).await.expect("Error creating order")
    }

    pub async fn tear_down(mut self) {
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        if let Err(e) = Sqlite::drop_database(&self.url).await {
            warn!("🚀️ Could not remove test database {}: {e}", self.url);
        }
    }
}

/// A cash payment by [`CASHIER`].
pub fn payment(order_id: &str, amount: i64) -> NewPayment {
    NewPayment::new(OrderId::from(order_id), Money::from(amount), PaymentMethod::Cash, CASHIER).with_source("till-1")
}
