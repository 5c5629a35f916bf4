//! Liquidity domain - deposits and withdrawals priced by the weighted sum

mod liquidity_engine;

pub use liquidity_engine::{AddLiquidity, LiquidityEngine, LiquidityReceipt, RemoveLiquidity};
