//! Common types used across the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Swap fee expressed as a fraction of the input amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub numerator: u64,
    pub denominator: u64,
}

impl Fee {
    pub fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Fee in basis points, for display only
    pub fn as_bps(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 * 10_000.0 / self.denominator as f64
    }
}

impl fmt::Display for Fee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// How `add_liquidity` treats contributions that do not match current reserve ratios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositPolicy {
    /// Any contribution is accepted; a skewed deposit dilutes the depositor
    #[default]
    AcceptWithDilution,
    /// After the first liquidity event, deposits must match reserve ratios exactly
    RequireProportional,
}

impl DepositPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositPolicy::AcceptWithDilution => "accept_with_dilution",
            DepositPolicy::RequireProportional => "require_proportional",
        }
    }
}

impl FromStr for DepositPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accept_with_dilution" | "accept" | "dilute" => Ok(DepositPolicy::AcceptWithDilution),
            "require_proportional" | "proportional" | "strict" => {
                Ok(DepositPolicy::RequireProportional)
            }
            _ => Err(anyhow::anyhow!("Unknown deposit policy: {}", s)),
        }
    }
}
