//! Versioned snapshot storage for prices, balances, exchange balances and
//! rates.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod domain;
pub mod engine;
pub mod error;
pub mod model;
pub mod observability;
pub mod snapshot;
pub mod store;
pub mod version;

pub use domain::{Balances, Domain, ExchangeBalances, KeyedDomain, Prices, Rates, SnapshotDomain};
pub use engine::EngineOptions;
pub use error::{ErrorClass, Result, StoreError};
pub use store::{SnapshotStore, StoreCounts};
pub use version::Version;
