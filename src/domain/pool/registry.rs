//! Pool registry - pool creation, membership and parameter edits

use std::collections::BTreeMap;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use super::member_list::{MemberList, MemberToken};
use super::pool_state::Pool;
use crate::domain::invariant;
use crate::infrastructure::derivation::PoolAddresses;
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::{LedgerError, PoolError};
use crate::shared::types::Fee;

/// Request to register a new member token
#[derive(Debug, Clone)]
pub struct AddToken {
    pub pool: Pubkey,
    pub mint: Pubkey,
    pub weight: u64,
    pub admin: Pubkey,
    /// Admin-owned account the seed liquidity is taken from
    pub admin_token_account: Pubkey,
    /// Caller's view of the current vaults, in member order. Only checked for
    /// alignment; balances are always re-read from the ledger.
    pub existing_vaults: Vec<Pubkey>,
}

/// Outcome of a successful registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub member: MemberToken,
    pub index: usize,
    /// Weighted sum of the pool before the new member joined
    pub base: u128,
    pub seed: u64,
}

/// Owns every pool and implements membership and parameter mutation
#[derive(Debug, Clone)]
pub struct PoolRegistry {
    program_id: Pubkey,
    pools: BTreeMap<Pubkey, Pool>,
}

impl PoolRegistry {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            pools: BTreeMap::new(),
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    pub fn pool(&self, pool: &Pubkey) -> Result<&Pool, PoolError> {
        self.pools.get(pool).ok_or(PoolError::PoolNotFound(*pool))
    }

    fn pool_mut(&mut self, pool: &Pubkey) -> Result<&mut Pool, PoolError> {
        self.pools.get_mut(pool).ok_or(PoolError::PoolNotFound(*pool))
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    /// Register a pool restored from its persisted record
    pub fn restore(&mut self, pool: Pool) -> Result<(), PoolError> {
        if self.pools.contains_key(&pool.address) {
            return Err(PoolError::PoolAlreadyExists(pool.address));
        }
        self.pools.insert(pool.address, pool);
        Ok(())
    }

    pub fn create_pool<L: Ledger>(
        &mut self,
        ledger: &mut L,
        pool: Pubkey,
        fee: Fee,
        admin: Pubkey,
        capacity: usize,
    ) -> Result<&Pool, PoolError> {
        invariant::validate_fee(fee)?;
        let members = MemberList::with_capacity(capacity)?;
        if self.pools.contains_key(&pool) {
            return Err(PoolError::PoolAlreadyExists(pool));
        }

        let addresses = PoolAddresses::derive(&self.program_id, &pool);
        ledger
            .create_mint(addresses.share_mint, addresses.authority)
            .map_err(|e| match e {
                LedgerError::AccountAlreadyExists(_) => PoolError::PoolAlreadyExists(pool),
                other => other.into(),
            })?;

        info!(
            "✅ Pool created: pool={}, share_mint={}, admin={}, fee={}, capacity={}",
            pool, addresses.share_mint, admin, fee, capacity
        );

        let created = Pool::new(addresses, admin, fee, members);
        Ok(self.pools.entry(pool).or_insert(created))
    }

    pub fn add_token_to_pool<L: Ledger>(
        &mut self,
        ledger: &mut L,
        request: &AddToken,
    ) -> Result<Registration, PoolError> {
        let pool = self.pool_mut(&request.pool)?;
        pool.ensure_admin(&request.admin)?;
        invariant::validate_weight(request.weight)?;
        if pool.members().is_full() {
            return Err(PoolError::PoolFull(pool.capacity()));
        }
        if pool.members().contains(&request.mint) {
            return Err(PoolError::DuplicateMember(request.mint));
        }
        pool.ensure_vaults_aligned(&request.existing_vaults)?;

        // Seed is computed from live balances, never from the caller's snapshot
        let base = pool.weighted_sum(ledger)?;
        let seed = if pool.members().is_empty() {
            0
        } else {
            invariant::seed_amount(base, request.weight)?
        };
        debug!(
            "Registering {} with weight {}: base={}, seed={}",
            request.mint, request.weight, base, seed
        );

        let vault = pool.addresses().vault(&request.mint);
        ledger.mint_info(&request.mint)?;
        // A vault that already exists belongs to a previously removed member
        if ledger.exists(&vault) {
            return Err(PoolError::DuplicateMember(request.mint));
        }
        if seed > 0 {
            ledger.check_debit(
                &request.admin_token_account,
                &request.mint,
                &request.admin,
                seed,
            )?;
        }

        ledger
            .create_token_account(vault, request.mint, pool.authority)
            .map_err(|e| match e {
                LedgerError::AccountAlreadyExists(_) => PoolError::DuplicateMember(request.mint),
                other => other.into(),
            })?;
        if seed > 0 {
            ledger.transfer(&request.admin_token_account, &vault, &request.admin, seed)?;
        }

        let member = MemberToken {
            mint: request.mint,
            vault,
            weight: request.weight,
        };
        pool.members_mut().push(member)?;
        let index = pool.token_count() - 1;

        info!(
            "✅ Token {} added to pool {} at index {} (weight {}, seed {})",
            member.mint, pool.address, index, member.weight, seed
        );

        Ok(Registration {
            member,
            index,
            base,
            seed,
        })
    }

    /// Deregister `mint`. The vault keeps its balance and is no longer reachable
    /// through liquidity withdrawal.
    pub fn remove_token_from_pool(
        &mut self,
        pool: &Pubkey,
        mint: &Pubkey,
        admin: &Pubkey,
    ) -> Result<MemberToken, PoolError> {
        let pool = self.pool_mut(pool)?;
        pool.ensure_admin(admin)?;
        let (index, _) = pool.member(mint)?;
        let removed = pool
            .members_mut()
            .remove(index)
            .ok_or(PoolError::UnknownMember(*mint))?;

        info!(
            "Token {} removed from pool {}; vault {} left stranded",
            removed.mint, pool.address, removed.vault
        );
        Ok(removed)
    }

    pub fn modify_fee(&mut self, pool: &Pubkey, fee: Fee, admin: &Pubkey) -> Result<(), PoolError> {
        let pool = self.pool_mut(pool)?;
        pool.ensure_admin(admin)?;
        invariant::validate_fee(fee)?;

        info!("Pool {} fee changed {} -> {}", pool.address, pool.fee, fee);
        pool.fee = fee;
        Ok(())
    }

    /// Overwrite a member's weight. Vault balances are left alone, so this
    /// deliberately reprices the member against the rest of the pool.
    pub fn modify_token_weight(
        &mut self,
        pool: &Pubkey,
        mint: &Pubkey,
        new_weight: u64,
        admin: &Pubkey,
    ) -> Result<(), PoolError> {
        let pool = self.pool_mut(pool)?;
        pool.ensure_admin(admin)?;
        invariant::validate_weight(new_weight)?;
        let (index, _) = pool.member(mint)?;
        let address = pool.address;

        let member = pool
            .members_mut()
            .get_mut(index)
            .ok_or(PoolError::UnknownMember(*mint))?;
        info!(
            "Pool {} token {} weight changed {} -> {}",
            address, mint, member.weight, new_weight
        );
        member.weight = new_weight;
        Ok(())
    }
}
