use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::AppError;

#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    pub program_id: String,

    // Final pool state
    pub pool: PoolSnapshot,

    // Per-step results
    pub steps: Vec<StepOutcome>,

    // Every token account held by a named actor
    pub balances: Vec<WalletBalance>,

    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub address: String,
    pub admin: String,
    pub authority: String,
    pub share_mint: String,
    pub fee: String,
    pub fee_bps: f64,
    pub capacity: usize,
    pub token_count: usize,
    pub share_supply: u64,
    pub weighted_sum: u128,
    pub members: Vec<MemberSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub token: String,
    pub mint: String,
    pub vault: String,
    pub weight: u64,
    pub balance: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StepOutcome {
    pub index: usize,
    pub op: String,
    pub detail: Option<String>,
    /// Set when the step failed as the scenario expected
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletBalance {
    pub actor: String,
    pub token: String,
    pub account: String,
    pub amount: u64,
}

impl StepOutcome {
    pub fn succeeded(index: usize, op: &str, detail: String) -> Self {
        Self {
            index,
            op: op.to_string(),
            detail: Some(detail),
            error: None,
        }
    }

    pub fn failed(index: usize, op: &str, error: &AppError) -> Self {
        Self {
            index,
            op: op.to_string(),
            detail: None,
            error: Some(error.to_string()),
        }
    }
}

impl ScenarioReport {
    pub fn new(name: String, program_id: Pubkey, pool: PoolSnapshot, steps: Vec<StepOutcome>) -> Self {
        Self {
            name,
            program_id: program_id.to_string(),
            pool,
            steps,
            balances: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_balances(mut self, balances: Vec<WalletBalance>) -> Self {
        self.balances = balances;
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary, one line per entry
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![
            format!("📋 Scenario '{}' @ {}", self.name, self.timestamp.to_rfc3339()),
            format!(
                "🏊 Pool {} | fee {} ({:.1} bps) | {}/{} members | shares {} | S = {}",
                self.pool.address,
                self.pool.fee,
                self.pool.fee_bps,
                self.pool.token_count,
                self.pool.capacity,
                self.pool.share_supply,
                self.pool.weighted_sum
            ),
        ];
        for (i, member) in self.pool.members.iter().enumerate() {
            lines.push(format!(
                "   {}. {} weight={} vault={} balance={}",
                i, member.token, member.weight, member.vault, member.balance
            ));
        }
        for step in &self.steps {
            match (&step.detail, &step.error) {
                (Some(detail), _) => lines.push(format!("   ✅ [{}] {}: {}", step.index, step.op, detail)),
                (None, Some(error)) => {
                    lines.push(format!("   ❌ [{}] {} (expected): {}", step.index, step.op, error))
                }
                (None, None) => lines.push(format!("   [{}] {}", step.index, step.op)),
            }
        }
        for balance in &self.balances {
            lines.push(format!(
                "   💰 {} {} = {}",
                balance.actor, balance.token, balance.amount
            ));
        }
        lines
    }
}
