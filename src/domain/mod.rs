//! Domain layer - pool invariant engine

pub mod invariant;
pub mod liquidity;
pub mod pool;
pub mod swap;

#[cfg(test)]
pub(crate) mod test_support;
