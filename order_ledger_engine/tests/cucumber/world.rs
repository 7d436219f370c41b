use cucumber::World;
use order_ledger_engine::PaymentReceipt;

use crate::support::{Orders, Payments, TestSystem};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<TestSystem>,
    pub last_receipt: Option<PaymentReceipt>,
    pub last_error: Option<String>,
}

impl LedgerWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Ledger system not initialised. Did you forget 'Given a fresh install'?")
    }

    pub fn payments(&self) -> Payments {
        self.system().payments()
    }

    pub fn orders(&self) -> Orders {
        self.system().orders()
    }

    /// Remembers the outcome of the last request so that `then` steps can inspect it.
    pub fn record<T, E: std::fmt::Display>(&mut self, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            },
        }
    }
}
