//! Weighted pools - multi-asset liquidity pools priced by a weighted-sum invariant
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use application::PoolService;
pub use domain::liquidity::LiquidityEngine;
pub use domain::pool::{Pool, PoolRegistry};
pub use domain::swap::SwapEngine;
pub use infrastructure::ledger::{InMemoryLedger, Ledger, Transactional};
pub use shared::errors::PoolError;
