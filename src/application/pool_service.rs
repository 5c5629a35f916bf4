//! Pool service - runs every pool operation as one all-or-nothing unit

use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};

use crate::domain::liquidity::{AddLiquidity, LiquidityEngine, LiquidityReceipt, RemoveLiquidity};
use crate::domain::pool::{AddToken, MemberToken, Pool, PoolRegistry, Registration};
use crate::domain::swap::{SwapEngine, SwapQuote, SwapRequest};
use crate::infrastructure::ledger::{Ledger, Transactional};
use crate::infrastructure::record::PoolRecord;
use crate::shared::errors::PoolError;
use crate::shared::types::{DepositPolicy, Fee};

/// Owns the registry and the ledger. Each public operation takes a ledger
/// checkpoint and a copy of the registry first; on error both are restored.
pub struct PoolService<L: Ledger + Transactional> {
    registry: PoolRegistry,
    ledger: L,
    liquidity: LiquidityEngine,
    swaps: SwapEngine,
}

impl<L: Ledger + Transactional> PoolService<L> {
    pub fn new(program_id: Pubkey, ledger: L, policy: DepositPolicy) -> Self {
        Self {
            registry: PoolRegistry::new(program_id),
            ledger,
            liquidity: LiquidityEngine::new(policy),
            swaps: SwapEngine::new(),
        }
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for account setup outside pool operations
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn pool(&self, pool: &Pubkey) -> Result<&Pool, PoolError> {
        self.registry.pool(pool)
    }

    pub fn policy(&self) -> DepositPolicy {
        self.liquidity.policy()
    }

    fn atomic<T, F>(&mut self, operation: &str, f: F) -> Result<T, PoolError>
    where
        F: FnOnce(&mut PoolRegistry, &mut L, &LiquidityEngine, &SwapEngine) -> Result<T, PoolError>,
    {
        let checkpoint = self.ledger.checkpoint();
        let registry = self.registry.clone();

        match f(&mut self.registry, &mut self.ledger, &self.liquidity, &self.swaps) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("⚠️ {} failed, rolling back: {}", operation, e);
                self.ledger.rollback(checkpoint);
                self.registry = registry;
                Err(e)
            }
        }
    }

    pub fn create_pool(
        &mut self,
        pool: Pubkey,
        fee: Fee,
        admin: Pubkey,
        capacity: usize,
    ) -> Result<Pool, PoolError> {
        self.atomic("create_pool", |registry, ledger, _, _| {
            registry
                .create_pool(ledger, pool, fee, admin, capacity)
                .map(Pool::clone)
        })
    }

    pub fn add_token_to_pool(&mut self, request: &AddToken) -> Result<Registration, PoolError> {
        self.atomic("add_token_to_pool", |registry, ledger, _, _| {
            registry.add_token_to_pool(ledger, request)
        })
    }

    pub fn remove_token_from_pool(
        &mut self,
        pool: &Pubkey,
        mint: &Pubkey,
        admin: &Pubkey,
    ) -> Result<MemberToken, PoolError> {
        self.atomic("remove_token_from_pool", |registry, _, _, _| {
            registry.remove_token_from_pool(pool, mint, admin)
        })
    }

    pub fn modify_fee(&mut self, pool: &Pubkey, fee: Fee, admin: &Pubkey) -> Result<(), PoolError> {
        self.atomic("modify_fee", |registry, _, _, _| {
            registry.modify_fee(pool, fee, admin)
        })
    }

    pub fn modify_token_weight(
        &mut self,
        pool: &Pubkey,
        mint: &Pubkey,
        new_weight: u64,
        admin: &Pubkey,
    ) -> Result<(), PoolError> {
        self.atomic("modify_token_weight", |registry, _, _, _| {
            registry.modify_token_weight(pool, mint, new_weight, admin)
        })
    }

    pub fn add_liquidity(
        &mut self,
        pool: &Pubkey,
        request: &AddLiquidity,
    ) -> Result<LiquidityReceipt, PoolError> {
        self.atomic("add_liquidity", |registry, ledger, liquidity, _| {
            liquidity.add_liquidity(registry.pool(pool)?, ledger, request)
        })
    }

    pub fn remove_liquidity(
        &mut self,
        pool: &Pubkey,
        request: &RemoveLiquidity,
    ) -> Result<LiquidityReceipt, PoolError> {
        self.atomic("remove_liquidity", |registry, ledger, liquidity, _| {
            liquidity.remove_liquidity(registry.pool(pool)?, ledger, request)
        })
    }

    pub fn swap(&mut self, pool: &Pubkey, request: &SwapRequest) -> Result<SwapQuote, PoolError> {
        self.atomic("swap", |registry, ledger, _, swaps| {
            swaps.swap(registry.pool(pool)?, ledger, request)
        })
    }

    pub fn quote(
        &self,
        pool: &Pubkey,
        mint_in: &Pubkey,
        mint_out: &Pubkey,
        amount_in: u64,
    ) -> Result<SwapQuote, PoolError> {
        self.swaps
            .quote(self.registry.pool(pool)?, mint_in, mint_out, amount_in)
    }

    pub fn weighted_sum(&self, pool: &Pubkey) -> Result<u128, PoolError> {
        self.registry.pool(pool)?.weighted_sum(&self.ledger)
    }

    pub fn share_supply(&self, pool: &Pubkey) -> Result<u64, PoolError> {
        let share_mint = self.registry.pool(pool)?.share_mint;
        Ok(self.ledger.supply(&share_mint)?)
    }

    pub fn record(&self, pool: &Pubkey) -> Result<PoolRecord, PoolError> {
        PoolRecord::from_pool(self.registry.pool(pool)?)
    }

    /// Register the pool persisted at `address`. Its share mint and every member
    /// vault must already exist in this service's ledger.
    pub fn restore_pool(&mut self, address: Pubkey, record: PoolRecord) -> Result<&Pool, PoolError> {
        let pool = record.into_pool(self.registry.program_id(), &address)?;
        let share_mint = self.ledger.mint_info(&pool.share_mint)?;
        if share_mint.mint_authority != pool.authority {
            return Err(PoolError::CorruptRecord(format!(
                "share mint {} is not controlled by the pool authority",
                pool.share_mint
            )));
        }
        for member in pool.members() {
            let vault = self.ledger.account(&member.vault)?;
            if vault.mint != member.mint || vault.owner != pool.authority {
                return Err(PoolError::CorruptRecord(format!(
                    "vault {} does not belong to member {}",
                    member.vault, member.mint
                )));
            }
        }

        self.registry.restore(pool)?;
        info!("♻️ Pool {} restored from record", address);
        self.registry.pool(&address)
    }
}
