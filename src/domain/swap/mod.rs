//! Swap domain - weight-ratio exchange between members

mod swap_engine;

pub use swap_engine::{SwapEngine, SwapQuote, SwapRequest};
