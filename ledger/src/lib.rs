//! Oracle Ledger
//!
//! Economic core of a prediction oracle: fixed-point arithmetic, model
//! inference, a share-based liquidity pool, exposure-capped betting and
//! reputation-weighted profit distribution with staking.
//!
//! ## Flow:
//! 1. **inference**: feeder payload + trained model -> directional signal
//! 2. **betting**: signal -> confidence-sized bet against the pool
//! 3. **distribution**: settled outcome -> profit split, reputation, slashing
//!
//! Every transition is deterministic and all-or-nothing. The [`service`]
//! module serializes writes per market for hosting in an async process.

pub mod constants;
pub mod error;
pub mod fixed;
pub mod types;
pub mod inference;
pub mod pool;
pub mod betting;
pub mod distribution;
pub mod ledger;
pub mod service;
pub mod registry;
pub mod report;
pub mod scenario;
pub mod config;

pub use error::{ArithmeticError, LedgerError, Result};
pub use types::*;
pub use inference::{InferenceEngine, Prediction, TreePath};
pub use pool::LiquidityPool;
pub use betting::BettingEngine;
pub use distribution::{Penalty, ProfitDistributor};
pub use ledger::{Ledger, LedgerSnapshot, SettlementOutcome};
pub use service::{LedgerHandle, LedgerService};
pub use registry::MarketRegistry;
pub use report::{LogSink, PriceFields, ReportSink, SettlementReport, WriterSink};
pub use scenario::{ReplaySummary, Scenario, Step};
pub use config::LedgerConfig;

/// Version of the oracle ledger
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
