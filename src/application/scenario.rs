//! Scenario replay - drives a pool through a scripted sequence of operations
//! against the in-memory ledger.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::application::pool_service::PoolService;
use crate::application::report::{MemberSnapshot, PoolSnapshot, ScenarioReport, StepOutcome, WalletBalance};
use crate::domain::invariant;
use crate::domain::liquidity::{AddLiquidity, RemoveLiquidity};
use crate::domain::pool::AddToken;
use crate::domain::swap::SwapRequest;
use crate::infrastructure::derivation::derive_wallet;
use crate::infrastructure::ledger::{InMemoryLedger, Ledger};
use crate::shared::config::EngineConfig;
use crate::shared::errors::{AppError, PoolError};
use crate::shared::types::{DepositPolicy, Fee};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    pub pool: PoolSetup,
    /// Overrides the configured deposit policy for this run
    #[serde(default)]
    pub deposit_policy: Option<DepositPolicy>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolSetup {
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    #[serde(default)]
    pub capacity: Option<u16>,
    #[serde(default = "default_admin")]
    pub admin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioStep {
    #[serde(flatten)]
    pub step: Step,
    /// Error kind this step must fail with, e.g. `Unauthorized`
    #[serde(default)]
    pub expect_error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Mint `amount` of `token` into the actor's wallet
    Fund {
        actor: String,
        token: String,
        amount: u64,
    },
    AddToken {
        token: String,
        weight: u64,
        #[serde(default)]
        caller: Option<String>,
        /// Mint the required seed to the admin wallet before registering
        #[serde(default = "default_true")]
        fund_seed: bool,
    },
    RemoveToken {
        token: String,
        #[serde(default)]
        caller: Option<String>,
    },
    ModifyFee {
        numerator: u64,
        denominator: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    ModifyWeight {
        token: String,
        weight: u64,
        #[serde(default)]
        caller: Option<String>,
    },
    /// Amounts are in member order
    AddLiquidity {
        actor: String,
        amounts: Vec<u64>,
        #[serde(default = "default_true")]
        fund: bool,
    },
    /// Burns `shares`, or the actor's whole share balance when omitted
    RemoveLiquidity {
        actor: String,
        #[serde(default)]
        shares: Option<u64>,
    },
    Swap {
        actor: String,
        from: String,
        to: String,
        amount_in: u64,
        #[serde(default)]
        min_amount_out: u64,
        #[serde(default = "default_true")]
        fund: bool,
    },
    Quote {
        from: String,
        to: String,
        amount_in: u64,
    },
}

fn default_name() -> String {
    "scenario".to_string()
}

fn default_admin() -> String {
    "admin".to_string()
}

fn default_true() -> bool {
    true
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Fund { .. } => "fund",
            Step::AddToken { .. } => "add_token",
            Step::RemoveToken { .. } => "remove_token",
            Step::ModifyFee { .. } => "modify_fee",
            Step::ModifyWeight { .. } => "modify_weight",
            Step::AddLiquidity { .. } => "add_liquidity",
            Step::RemoveLiquidity { .. } => "remove_liquidity",
            Step::Swap { .. } => "swap",
            Step::Quote { .. } => "quote",
        }
    }
}

impl Scenario {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::ScenarioError(format!(
                "Failed to read scenario {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, AppError> {
        toml::from_str(content)
            .map_err(|e| AppError::ScenarioError(format!("Failed to parse scenario: {}", e)))
    }
}

/// Replays a [`Scenario`] against a fresh in-memory ledger
pub struct ScenarioRunner {
    service: PoolService<InMemoryLedger>,
    program_id: Pubkey,
    default_capacity: u16,
    pool: Pubkey,
    admin_name: String,
    faucet: Pubkey,
    actors: BTreeMap<String, Pubkey>,
    tokens: BTreeMap<String, Pubkey>,
}

impl ScenarioRunner {
    pub fn new(config: &EngineConfig, policy: DepositPolicy) -> Result<Self, AppError> {
        config.validate()?;
        let program_id = config.program_id()?;
        Ok(Self {
            service: PoolService::new(program_id, InMemoryLedger::new(), policy),
            program_id,
            default_capacity: config.default_capacity,
            pool: Pubkey::new_unique(),
            admin_name: default_admin(),
            faucet: Pubkey::new_unique(),
            actors: BTreeMap::new(),
            tokens: BTreeMap::new(),
        })
    }

    pub fn service(&self) -> &PoolService<InMemoryLedger> {
        &self.service
    }

    pub fn pool(&self) -> &Pubkey {
        &self.pool
    }

    pub fn run(&mut self, scenario: &Scenario) -> Result<ScenarioReport, AppError> {
        info!("🚀 Running scenario '{}' ({} steps)", scenario.name, scenario.steps.len());

        let setup = &scenario.pool;
        let capacity = setup.capacity.unwrap_or(self.default_capacity) as usize;
        self.admin_name = setup.admin.clone();
        let admin = self.actor(&setup.admin);
        self.service.create_pool(
            self.pool,
            Fee::new(setup.fee_numerator, setup.fee_denominator),
            admin,
            capacity,
        )?;

        let mut outcomes = Vec::with_capacity(scenario.steps.len());
        for (index, entry) in scenario.steps.iter().enumerate() {
            let op = entry.step.name();
            debug!("Step {}: {}", index, op);
            let outcome = match (self.apply(&entry.step), &entry.expect_error) {
                (Ok(detail), None) => StepOutcome::succeeded(index, op, detail),
                (Err(e), Some(expected)) if error_kind(&e) == expected.as_str() => {
                    StepOutcome::failed(index, op, &e)
                }
                (Ok(detail), Some(expected)) => {
                    return Err(AppError::ScenarioError(format!(
                        "step {} ({}) succeeded ({}) but was expected to fail with {}",
                        index, op, detail, expected
                    )))
                }
                (Err(AppError::Pool(e)), _) => {
                    return Err(AppError::ScenarioError(format!(
                        "step {} ({}) failed: {}",
                        index, op, e
                    )))
                }
                (Err(e), _) => return Err(e),
            };
            outcomes.push(outcome);
        }

        let report = ScenarioReport::new(scenario.name.clone(), self.program_id, self.snapshot()?, outcomes)
            .with_balances(self.balances()?);
        info!("✅ Scenario '{}' complete", scenario.name);
        Ok(report)
    }

    fn apply(&mut self, step: &Step) -> Result<String, AppError> {
        let pool = self.pool;
        match step {
            Step::Fund { actor, token, amount } => {
                let owner = self.actor(actor);
                let mint = self.token(token)?;
                let wallet = self.fund(&owner, &mint, *amount)?;
                Ok(format!("{} {} -> {}", amount, token, wallet))
            }
            Step::AddToken {
                token,
                weight,
                caller,
                fund_seed,
            } => {
                let admin = self.caller(caller);
                let mint = self.token(token)?;
                let admin_token_account = self.wallet(&admin, &mint)?;
                if *fund_seed && *weight > 0 {
                    let state = self.service.pool(&pool)?;
                    if !state.members().is_empty() && !state.members().contains(&mint) {
                        let base = self.service.weighted_sum(&pool)?;
                        let seed = invariant::seed_amount(base, *weight)?;
                        self.fund(&admin, &mint, seed)?;
                    }
                }
                let existing_vaults = self
                    .service
                    .pool(&pool)?
                    .members()
                    .iter()
                    .map(|m| m.vault)
                    .collect();
                let registration = self.service.add_token_to_pool(&AddToken {
                    pool,
                    mint,
                    weight: *weight,
                    admin,
                    admin_token_account,
                    existing_vaults,
                })?;
                Ok(format!(
                    "{} registered at index {} (weight {}, base {}, seed {})",
                    token, registration.index, weight, registration.base, registration.seed
                ))
            }
            Step::RemoveToken { token, caller } => {
                let admin = self.caller(caller);
                let mint = self.token(token)?;
                let removed = self.service.remove_token_from_pool(&pool, &mint, &admin)?;
                let stranded = self.service.ledger().balance(&removed.vault)?;
                Ok(format!("{} removed, {} left in vault {}", token, stranded, removed.vault))
            }
            Step::ModifyFee {
                numerator,
                denominator,
                caller,
            } => {
                let admin = self.caller(caller);
                let fee = Fee::new(*numerator, *denominator);
                self.service.modify_fee(&pool, fee, &admin)?;
                Ok(format!("fee set to {}", fee))
            }
            Step::ModifyWeight { token, weight, caller } => {
                let admin = self.caller(caller);
                let mint = self.token(token)?;
                self.service.modify_token_weight(&pool, &mint, *weight, &admin)?;
                Ok(format!("{} weight set to {}", token, weight))
            }
            Step::AddLiquidity { actor, amounts, fund } => {
                let owner = self.actor(actor);
                let (mints, vault_accounts) = self.member_accounts()?;
                let mut owner_accounts = Vec::with_capacity(mints.len());
                for (i, mint) in mints.iter().enumerate() {
                    let account = match (*fund, amounts.get(i)) {
                        (true, Some(amount)) => self.fund(&owner, mint, *amount)?,
                        _ => self.wallet(&owner, mint)?,
                    };
                    owner_accounts.push(account);
                }
                let owner_share_account = self.share_wallet(&owner)?;
                let receipt = self.service.add_liquidity(
                    &pool,
                    &AddLiquidity {
                        owner,
                        owner_share_account,
                        amounts: amounts.clone(),
                        owner_accounts,
                        vault_accounts,
                    },
                )?;
                Ok(format!(
                    "{} shares minted to {} for {:?}",
                    receipt.shares, actor, receipt.amounts
                ))
            }
            Step::RemoveLiquidity { actor, shares } => {
                let owner = self.actor(actor);
                let (mints, vault_accounts) = self.member_accounts()?;
                let owner_accounts = mints
                    .iter()
                    .map(|mint| self.wallet(&owner, mint))
                    .collect::<Result<Vec<_>, _>>()?;
                let owner_share_account = self.share_wallet(&owner)?;
                let burn_amount = match shares {
                    Some(shares) => *shares,
                    None => self.service.ledger().balance(&owner_share_account)?,
                };
                let receipt = self.service.remove_liquidity(
                    &pool,
                    &RemoveLiquidity {
                        owner,
                        owner_share_account,
                        burn_amount,
                        owner_accounts,
                        vault_accounts,
                    },
                )?;
                Ok(format!(
                    "{} shares burned by {} for {:?}",
                    receipt.shares, actor, receipt.amounts
                ))
            }
            Step::Swap {
                actor,
                from,
                to,
                amount_in,
                min_amount_out,
                fund,
            } => {
                let owner = self.actor(actor);
                let (mint_in, mint_out) = (self.token(from)?, self.token(to)?);
                let user_in = if *fund {
                    self.fund(&owner, &mint_in, *amount_in)?
                } else {
                    self.wallet(&owner, &mint_in)?
                };
                let user_out = self.wallet(&owner, &mint_out)?;
                let state = self.service.pool(&pool)?;
                let vault_in = state.addresses().vault(&mint_in);
                let vault_out = state.addresses().vault(&mint_out);
                let quote = self.service.swap(
                    &pool,
                    &SwapRequest {
                        owner,
                        amount_in: *amount_in,
                        min_amount_out: *min_amount_out,
                        vault_in,
                        vault_out,
                        user_in,
                        user_out,
                    },
                )?;
                Ok(format!(
                    "{} {} -> {} {} (fee {})",
                    quote.amount_in, from, quote.amount_out, to, quote.fee
                ))
            }
            Step::Quote { from, to, amount_in } => {
                let (mint_in, mint_out) = (self.token(from)?, self.token(to)?);
                let quote = self.service.quote(&pool, &mint_in, &mint_out, *amount_in)?;
                Ok(format!(
                    "{} {} would return {} {} (fee {}, effective {})",
                    amount_in, from, quote.amount_out, to, quote.fee, quote.effective_in
                ))
            }
        }
    }

    fn actor(&mut self, name: &str) -> Pubkey {
        *self
            .actors
            .entry(name.to_string())
            .or_insert_with(Pubkey::new_unique)
    }

    fn caller(&mut self, caller: &Option<String>) -> Pubkey {
        let name = caller.clone().unwrap_or_else(|| self.admin_name.clone());
        self.actor(&name)
    }

    /// Mint for `name`, created with the runner's faucet as authority on first use
    fn token(&mut self, name: &str) -> Result<Pubkey, AppError> {
        if let Some(mint) = self.tokens.get(name) {
            return Ok(*mint);
        }
        let mint = Pubkey::new_unique();
        self.service.ledger_mut().create_mint(mint, self.faucet)?;
        self.tokens.insert(name.to_string(), mint);
        Ok(mint)
    }

    /// Derived wallet of `owner` for `mint`, created empty on first use
    fn wallet(&mut self, owner: &Pubkey, mint: &Pubkey) -> Result<Pubkey, AppError> {
        let address = derive_wallet(&self.program_id, owner, mint);
        let ledger = self.service.ledger_mut();
        if !ledger.exists(&address) {
            ledger.create_token_account(address, *mint, *owner)?;
        }
        Ok(address)
    }

    fn share_wallet(&mut self, owner: &Pubkey) -> Result<Pubkey, AppError> {
        let share_mint = self.service.pool(&self.pool)?.share_mint;
        self.wallet(owner, &share_mint)
    }

    fn fund(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Result<Pubkey, AppError> {
        let wallet = self.wallet(owner, mint)?;
        if amount > 0 {
            let faucet = self.faucet;
            self.service
                .ledger_mut()
                .mint_to(mint, &wallet, &faucet, amount)?;
        }
        Ok(wallet)
    }

    fn member_accounts(&self) -> Result<(Vec<Pubkey>, Vec<Pubkey>), AppError> {
        let members = self.service.pool(&self.pool)?.members();
        Ok((
            members.iter().map(|m| m.mint).collect(),
            members.iter().map(|m| m.vault).collect(),
        ))
    }

    fn token_name(&self, mint: &Pubkey) -> String {
        self.tokens
            .iter()
            .find(|(_, m)| *m == mint)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| mint.to_string())
    }

    fn snapshot(&self) -> Result<PoolSnapshot, AppError> {
        let pool = self.service.pool(&self.pool)?;
        let ledger = self.service.ledger();
        let members = pool
            .members()
            .iter()
            .map(|m| {
                Ok(MemberSnapshot {
                    token: self.token_name(&m.mint),
                    mint: m.mint.to_string(),
                    vault: m.vault.to_string(),
                    weight: m.weight,
                    balance: ledger.balance(&m.vault)?,
                })
            })
            .collect::<Result<Vec<_>, PoolError>>()?;

        Ok(PoolSnapshot {
            address: pool.address.to_string(),
            admin: pool.admin.to_string(),
            authority: pool.authority.to_string(),
            share_mint: pool.share_mint.to_string(),
            fee: pool.fee.to_string(),
            fee_bps: pool.fee.as_bps(),
            capacity: pool.capacity(),
            token_count: pool.token_count(),
            share_supply: self.service.share_supply(&self.pool)?,
            weighted_sum: self.service.weighted_sum(&self.pool)?,
            members,
        })
    }

    fn balances(&self) -> Result<Vec<WalletBalance>, AppError> {
        let share_mint = self.service.pool(&self.pool)?.share_mint;
        let mut balances = Vec::new();
        for (actor, owner) in &self.actors {
            for account in self.service.ledger().accounts().filter(|a| a.owner == *owner) {
                let token = if account.mint == share_mint {
                    "shares".to_string()
                } else {
                    self.token_name(&account.mint)
                };
                balances.push(WalletBalance {
                    actor: actor.clone(),
                    token,
                    account: account.address.to_string(),
                    amount: account.amount,
                });
            }
        }
        Ok(balances)
    }
}

/// Variant name of the pool error behind `err`, e.g. `SlippageExceeded`
fn error_kind(err: &AppError) -> String {
    match err {
        AppError::Pool(e) => {
            let debug = format!("{:?}", e);
            debug
                .split(|c: char| !c.is_alphanumeric())
                .next()
                .unwrap_or_default()
                .to_string()
        }
        other => other.to_string(),
    }
}
