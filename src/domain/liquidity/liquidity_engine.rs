//! Share minting and burning against the weighted-sum invariant

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info, warn};

use crate::domain::invariant;
use crate::domain::pool::Pool;
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::PoolError;
use crate::shared::types::DepositPolicy;

/// Deposit request. Every list is positional: entry `i` belongs to member `i`.
#[derive(Debug, Clone)]
pub struct AddLiquidity {
    pub owner: Pubkey,
    pub owner_share_account: Pubkey,
    pub amounts: Vec<u64>,
    pub owner_accounts: Vec<Pubkey>,
    pub vault_accounts: Vec<Pubkey>,
}

/// Withdrawal request. Every list is positional: entry `i` belongs to member `i`.
#[derive(Debug, Clone)]
pub struct RemoveLiquidity {
    pub owner: Pubkey,
    pub owner_share_account: Pubkey,
    pub burn_amount: u64,
    pub owner_accounts: Vec<Pubkey>,
    pub vault_accounts: Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiquidityReceipt {
    /// Shares minted on deposit or burned on withdrawal
    pub shares: u64,
    /// Per-member amounts deposited or paid out, in member order
    pub amounts: Vec<u64>,
    pub lp_supply_before: u64,
    pub weighted_sum_before: u128,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidityEngine {
    policy: DepositPolicy,
}

impl LiquidityEngine {
    pub fn new(policy: DepositPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DepositPolicy {
        self.policy
    }

    fn check_share_account<L: Ledger>(
        pool: &Pool,
        ledger: &L,
        share_account: &Pubkey,
        owner: &Pubkey,
    ) -> Result<u64, PoolError> {
        let account = ledger.account(share_account)?;
        if account.mint != pool.share_mint {
            return Err(PoolError::MintMismatch(*share_account));
        }
        if account.owner != *owner {
            return Err(PoolError::Unauthorized(*owner));
        }
        Ok(account.amount)
    }

    pub fn add_liquidity<L: Ledger>(
        &self,
        pool: &Pool,
        ledger: &mut L,
        request: &AddLiquidity,
    ) -> Result<LiquidityReceipt, PoolError> {
        pool.ensure_account_count(request.amounts.len())?;
        pool.ensure_account_count(request.owner_accounts.len())?;
        pool.ensure_vaults_aligned(&request.vault_accounts)?;
        Self::check_share_account(pool, ledger, &request.owner_share_account, &request.owner)?;

        let balances = pool.vault_balances(ledger)?;
        let weights: Vec<u64> = pool.members().iter().map(|m| m.weight).collect();
        let s_pre = invariant::weighted_sum(balances.iter().copied().zip(weights.iter().copied()))?;
        let lp_supply = ledger.supply(&pool.share_mint)?;

        if lp_supply > 0
            && self.policy == DepositPolicy::RequireProportional
            && !invariant::is_proportional(&request.amounts, &balances)
        {
            return Err(PoolError::DisproportionateDeposit);
        }

        let contributed =
            invariant::weighted_sum(request.amounts.iter().copied().zip(weights.iter().copied()))?;
        let minted = invariant::shares_for_deposit(lp_supply, contributed, s_pre)?;
        debug!(
            "Deposit into {}: contributed={}, s_pre={}, lp_supply={}, minted={}",
            pool.address, contributed, s_pre, lp_supply, minted
        );
        if minted == 0 && contributed > 0 {
            warn!(
                "Deposit into {} worth {} weighted units mints no shares",
                pool.address, contributed
            );
        }

        let legs: Vec<(u64, &Pubkey, &Pubkey)> = request
            .amounts
            .iter()
            .zip(&request.owner_accounts)
            .zip(&request.vault_accounts)
            .filter(|((amount, _), _)| **amount > 0)
            .map(|((amount, from), vault)| (*amount, from, vault))
            .collect();
        // Every leg and the mint must be able to settle before anything moves
        for (amount, from, vault) in &legs {
            ledger.check_transfer(from, vault, &request.owner, *amount)?;
        }
        ledger.check_mint_to(
            &pool.share_mint,
            &request.owner_share_account,
            &pool.authority,
            minted,
        )?;

        for (amount, from, vault) in legs {
            ledger.transfer(from, vault, &request.owner, amount)?;
        }
        ledger.mint_to(
            &pool.share_mint,
            &request.owner_share_account,
            &pool.authority,
            minted,
        )?;

        info!(
            "💧 Liquidity added to {}: {} shares minted to {}",
            pool.address, minted, request.owner
        );

        Ok(LiquidityReceipt {
            shares: minted,
            amounts: request.amounts.clone(),
            lp_supply_before: lp_supply,
            weighted_sum_before: s_pre,
        })
    }

    pub fn remove_liquidity<L: Ledger>(
        &self,
        pool: &Pool,
        ledger: &mut L,
        request: &RemoveLiquidity,
    ) -> Result<LiquidityReceipt, PoolError> {
        pool.ensure_account_count(request.owner_accounts.len())?;
        pool.ensure_vaults_aligned(&request.vault_accounts)?;

        let share_balance =
            Self::check_share_account(pool, ledger, &request.owner_share_account, &request.owner)?;
        if request.burn_amount > share_balance {
            return Err(PoolError::InsufficientBalance {
                account: request.owner_share_account,
                needed: request.burn_amount,
                available: share_balance,
            });
        }
        let lp_supply = ledger.supply(&pool.share_mint)?;
        if request.burn_amount > lp_supply {
            return Err(PoolError::InsufficientBalance {
                account: pool.share_mint,
                needed: request.burn_amount,
                available: lp_supply,
            });
        }

        for account in &request.owner_accounts {
            if ledger.account(account)?.owner != request.owner {
                return Err(PoolError::Unauthorized(request.owner));
            }
        }

        let balances = pool.vault_balances(ledger)?;
        let s_pre = pool.weighted_sum(ledger)?;
        let payouts = balances
            .iter()
            .map(|balance| invariant::payout(*balance, request.burn_amount, lp_supply))
            .collect::<Result<Vec<u64>, PoolError>>()?;
        debug!(
            "Withdrawal from {}: burn={}, lp_supply={}, payouts={:?}",
            pool.address, request.burn_amount, lp_supply, payouts
        );

        let legs: Vec<(u64, &Pubkey, &Pubkey)> = payouts
            .iter()
            .zip(&request.vault_accounts)
            .zip(&request.owner_accounts)
            .filter(|((amount, _), _)| **amount > 0)
            .map(|((amount, vault), to)| (*amount, vault, to))
            .collect();
        for (amount, vault, to) in &legs {
            ledger.check_transfer(vault, to, &pool.authority, *amount)?;
        }
        ledger.check_burn(
            &pool.share_mint,
            &request.owner_share_account,
            &request.owner,
            request.burn_amount,
        )?;

        for (amount, vault, to) in legs {
            ledger.transfer(vault, to, &pool.authority, amount)?;
        }
        ledger.burn(
            &pool.share_mint,
            &request.owner_share_account,
            &request.owner,
            request.burn_amount,
        )?;

        info!(
            "Liquidity removed from {}: {} shares burned by {}",
            pool.address, request.burn_amount, request.owner
        );

        Ok(LiquidityReceipt {
            shares: request.burn_amount,
            amounts: payouts,
            lp_supply_before: lp_supply,
            weighted_sum_before: s_pre,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_support::TestPool;
    use crate::shared::types::Fee;

    fn two_member_pool() -> TestPool {
        let mut t = TestPool::new(Fee::new(5, 1000), 4);
        t.add_member(20);
        t.add_member(40);
        t
    }

    fn deposit(
        t: &mut TestPool,
        engine: &LiquidityEngine,
        owner: &Pubkey,
        share_account: &Pubkey,
        amounts: &[u64],
    ) -> Result<LiquidityReceipt, PoolError> {
        let owner_accounts = t.wallets(owner, amounts);
        let request = AddLiquidity {
            owner: *owner,
            owner_share_account: *share_account,
            amounts: amounts.to_vec(),
            owner_accounts,
            vault_accounts: t.vaults(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        engine.add_liquidity(pool, &mut t.ledger, &request)
    }

    fn withdraw(
        t: &mut TestPool,
        engine: &LiquidityEngine,
        owner: &Pubkey,
        share_account: &Pubkey,
        burn_amount: u64,
    ) -> Result<(LiquidityReceipt, Vec<Pubkey>), PoolError> {
        let zeros = vec![0; t.pool().token_count()];
        let owner_accounts = t.wallets(owner, &zeros);
        let request = RemoveLiquidity {
            owner: *owner,
            owner_share_account: *share_account,
            burn_amount,
            owner_accounts: owner_accounts.clone(),
            vault_accounts: t.vaults(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        let receipt = engine.remove_liquidity(pool, &mut t.ledger, &request)?;
        Ok((receipt, owner_accounts))
    }

    #[test]
    fn test_first_deposit_mints_weighted_units() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);

        let receipt = deposit(&mut t, &engine, &alice, &shares, &[1000, 2000]).unwrap();
        assert_eq!(receipt.shares, 100_000);
        assert_eq!(receipt.lp_supply_before, 0);
        assert_eq!(t.balance(&shares), 100_000);
        assert_eq!(t.vault_balances(), vec![1000, 2000]);
    }

    #[test]
    fn test_full_exit_returns_deposit() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000]).unwrap();

        let (receipt, accounts) = withdraw(&mut t, &engine, &alice, &shares, 100_000).unwrap();
        assert_eq!(receipt.amounts, vec![1000, 2000]);
        assert_eq!(t.balance(&accounts[0]), 1000);
        assert_eq!(t.balance(&accounts[1]), 2000);
        assert_eq!(t.balance(&shares), 0);
        assert_eq!(t.share_supply(), 0);
        assert_eq!(t.vault_balances(), vec![0, 0]);
    }

    #[test]
    fn test_round_trip_loss_bounded_by_member_count() {
        let mut t = TestPool::new(Fee::new(0, 1), 4);
        t.add_member(3);
        t.add_member(7);
        t.add_member(11);
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        let amounts = [333, 1001, 57];
        let receipt = deposit(&mut t, &engine, &alice, &shares, &amounts).unwrap();

        let (exit, _) = withdraw(&mut t, &engine, &alice, &shares, receipt.shares).unwrap();
        let lost: u64 = amounts
            .iter()
            .zip(&exit.amounts)
            .map(|(put, got)| put - got)
            .sum();
        assert!(lost <= 3);
    }

    #[test]
    fn test_second_deposit_is_pro_rata() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let alice_shares = t.share_account(&alice);
        let bob_shares = t.share_account(&bob);
        deposit(&mut t, &engine, &alice, &alice_shares, &[1000, 2000]).unwrap();

        let receipt = deposit(&mut t, &engine, &bob, &bob_shares, &[500, 1000]).unwrap();
        assert_eq!(receipt.weighted_sum_before, 100_000);
        assert_eq!(receipt.shares, 50_000);
        assert_eq!(t.share_supply(), 150_000);
    }

    #[test]
    fn test_skewed_deposit_accepted_with_dilution() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let alice_shares = t.share_account(&alice);
        let bob_shares = t.share_account(&bob);
        deposit(&mut t, &engine, &alice, &alice_shares, &[1000, 2000]).unwrap();

        let receipt = deposit(&mut t, &engine, &bob, &bob_shares, &[1000, 0]).unwrap();
        assert_eq!(receipt.shares, 20_000);
    }

    #[test]
    fn test_strict_policy_rejects_skewed_deposit() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::new(DepositPolicy::RequireProportional);
        let alice = Pubkey::new_unique();
        let bob = Pubkey::new_unique();
        let alice_shares = t.share_account(&alice);
        let bob_shares = t.share_account(&bob);
        // first liquidity event is never checked
        deposit(&mut t, &engine, &alice, &alice_shares, &[1000, 5]).unwrap();

        assert_eq!(
            deposit(&mut t, &engine, &bob, &bob_shares, &[100, 2]),
            Err(PoolError::DisproportionateDeposit)
        );
        assert!(deposit(&mut t, &engine, &bob, &bob_shares, &[200, 1]).is_ok());
    }

    #[test]
    fn test_deposit_account_count_mismatch() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        let owner_accounts = t.wallets(&alice, &[10, 10]);
        let request = AddLiquidity {
            owner: alice,
            owner_share_account: shares,
            amounts: vec![10],
            owner_accounts,
            vault_accounts: t.vaults(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        assert_eq!(
            engine.add_liquidity(pool, &mut t.ledger, &request),
            Err(PoolError::AccountCountMismatch { expected: 2, actual: 1 })
        );
    }

    #[test]
    fn test_deposit_insufficient_balance() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        let owner_accounts = t.wallets(&alice, &[10, 10]);
        let request = AddLiquidity {
            owner: alice,
            owner_share_account: shares,
            amounts: vec![10, 11],
            owner_accounts,
            vault_accounts: t.vaults(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        assert!(matches!(
            engine.add_liquidity(pool, &mut t.ledger, &request),
            Err(PoolError::InsufficientBalance { needed: 11, available: 10, .. })
        ));
        // the first leg could settle but must not have
        assert_eq!(t.balance(&request.owner_accounts[0]), 10);
        assert_eq!(t.vault_balances(), vec![0, 0]);
        assert_eq!(t.share_supply(), 0);
    }

    #[test]
    fn test_withdraw_account_count_mismatch() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000]).unwrap();

        let owner_accounts = t.wallets(&alice, &[0, 0]);
        let request = RemoveLiquidity {
            owner: alice,
            owner_share_account: shares,
            burn_amount: 10_000,
            owner_accounts: vec![owner_accounts[0]],
            vault_accounts: t.vaults(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        assert_eq!(
            engine.remove_liquidity(pool, &mut t.ledger, &request),
            Err(PoolError::AccountCountMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(t.vault_balances(), vec![1000, 2000]);
        assert_eq!(t.balance(&shares), 100_000);
    }

    #[test]
    fn test_withdraw_rejects_stale_lists_after_removal() {
        let mut t = two_member_pool();
        let removed_mint = t.add_member(10);
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000, 4000]).unwrap();

        // lists captured while three members were registered
        let stale_vaults = t.vaults();
        let stale_accounts = t.wallets(&alice, &[0, 0, 0]);
        let admin = t.admin;
        t.registry
            .remove_token_from_pool(&t.pool, &removed_mint, &admin)
            .unwrap();

        let request = RemoveLiquidity {
            owner: alice,
            owner_share_account: shares,
            burn_amount: 70_000,
            owner_accounts: stale_accounts.clone(),
            vault_accounts: stale_vaults.clone(),
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        assert_eq!(
            engine.remove_liquidity(pool, &mut t.ledger, &request),
            Err(PoolError::AccountCountMismatch { expected: 2, actual: 3 })
        );

        // fresh vaults but the stale owner list is still rejected
        let request = RemoveLiquidity {
            vault_accounts: t.vaults(),
            ..request
        };
        let pool = t.registry.pool(&t.pool).unwrap();
        assert_eq!(
            engine.remove_liquidity(pool, &mut t.ledger, &request),
            Err(PoolError::AccountCountMismatch { expected: 2, actual: 3 })
        );
        assert_eq!(t.balance(&stale_vaults[2]), 4000);
        assert_eq!(t.balance(&shares), 140_000);
    }

    #[test]
    fn test_withdraw_more_than_owned() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000]).unwrap();

        assert!(matches!(
            withdraw(&mut t, &engine, &alice, &shares, 100_001),
            Err(PoolError::InsufficientBalance { needed: 100_001, .. })
        ));
    }

    #[test]
    fn test_withdraw_rejects_foreign_share_account() {
        let mut t = two_member_pool();
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let mallory = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000]).unwrap();

        assert_eq!(
            withdraw(&mut t, &engine, &mallory, &shares, 10).unwrap_err(),
            PoolError::Unauthorized(mallory)
        );
    }

    #[test]
    fn test_removed_member_pays_nothing() {
        let mut t = two_member_pool();
        let removed_mint = t.add_member(10);
        let engine = LiquidityEngine::default();
        let alice = Pubkey::new_unique();
        let shares = t.share_account(&alice);
        deposit(&mut t, &engine, &alice, &shares, &[1000, 2000, 4000]).unwrap();

        let stranded_vault = t.pool().member(&removed_mint).unwrap().1.vault;
        let admin = t.admin;
        t.registry
            .remove_token_from_pool(&t.pool, &removed_mint, &admin)
            .unwrap();

        let (receipt, accounts) = withdraw(&mut t, &engine, &alice, &shares, 70_000).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(receipt.amounts, vec![500, 1000]);
        assert_eq!(t.balance(&stranded_vault), 4000);
    }
}
