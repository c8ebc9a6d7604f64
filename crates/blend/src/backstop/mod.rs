//! Backstop queries: one assembler per record, each built from a single
//! batched ledger read.

mod config;
mod pool_balance;
mod pool_user;
mod token;

pub use config::{BackstopConfig, load_config};
pub use pool_balance::{BackstopPoolBalance, load_pool_balance};
pub use pool_user::{BackstopPoolUser, Q4W, UserBalance, UserEmissions, load_pool_user};
pub use token::{BackstopToken, load_token};

use soroban::Error;

/// Names of required pieces found absent while assembling a record.
#[derive(Debug, Default)]
struct Missing(Vec<String>);

impl Missing {
    /// Passes `slot` through, noting `name` when it is empty.
    fn check<T>(&mut self, slot: Option<T>, name: &str) -> Option<T> {
        if slot.is_none() {
            self.0.push(name.to_string());
        }
        slot
    }

    fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn into_error(self) -> Error {
        Error::MissingData(self.0)
    }
}
