//! Fee-bearing exchange between two pool members

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, info};

use crate::domain::invariant;
use crate::domain::pool::Pool;
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::PoolError;

#[derive(Debug, Clone)]
pub struct SwapRequest {
    pub owner: Pubkey,
    pub amount_in: u64,
    pub min_amount_out: u64,
    pub vault_in: Pubkey,
    pub vault_out: Pubkey,
    pub user_in: Pubkey,
    pub user_out: Pubkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SwapQuote {
    pub mint_in: Pubkey,
    pub mint_out: Pubkey,
    pub amount_in: u64,
    /// Retained in the input vault
    pub fee: u64,
    pub effective_in: u64,
    pub amount_out: u64,
    pub weight_in: u64,
    pub weight_out: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwapEngine;

impl SwapEngine {
    pub fn new() -> Self {
        Self
    }

    /// Price a swap of `amount_in` from member `index_in` to member `index_out`
    fn quote_members(
        pool: &Pool,
        index_in: usize,
        index_out: usize,
        amount_in: u64,
    ) -> Result<SwapQuote, PoolError> {
        let members = pool.members().as_slice();
        let (member_in, member_out) = (&members[index_in], &members[index_out]);
        if index_in == index_out {
            return Err(PoolError::UnknownMember(member_out.mint));
        }

        let (fee, effective_in) = invariant::apply_fee(amount_in, pool.fee)?;
        let amount_out = invariant::swap_output(effective_in, member_in.weight, member_out.weight)?;
        invariant::check_swap_invariant(effective_in, member_in.weight, amount_out, member_out.weight)?;

        Ok(SwapQuote {
            mint_in: member_in.mint,
            mint_out: member_out.mint,
            amount_in,
            fee,
            effective_in,
            amount_out,
            weight_in: member_in.weight,
            weight_out: member_out.weight,
        })
    }

    /// Price a swap by mint without touching any balance
    pub fn quote(
        &self,
        pool: &Pool,
        mint_in: &Pubkey,
        mint_out: &Pubkey,
        amount_in: u64,
    ) -> Result<SwapQuote, PoolError> {
        let (index_in, _) = pool.member(mint_in)?;
        let (index_out, _) = pool.member(mint_out)?;
        Self::quote_members(pool, index_in, index_out, amount_in)
    }

    pub fn swap<L: Ledger>(
        &self,
        pool: &Pool,
        ledger: &mut L,
        request: &SwapRequest,
    ) -> Result<SwapQuote, PoolError> {
        let (index_in, _) = pool.member_by_vault(&request.vault_in)?;
        let (index_out, _) = pool.member_by_vault(&request.vault_out)?;
        let quote = Self::quote_members(pool, index_in, index_out, request.amount_in)?;
        debug!(
            "Swap on {}: in={} fee={} effective={} out={} (weights {}/{})",
            pool.address,
            quote.amount_in,
            quote.fee,
            quote.effective_in,
            quote.amount_out,
            quote.weight_in,
            quote.weight_out
        );

        let reserve_in = ledger.balance(&request.vault_in)?;
        let reserve_out = ledger.balance(&request.vault_out)?;
        if reserve_in == 0 || reserve_out == 0 {
            return Err(PoolError::InsufficientLiquidity);
        }
        if quote.amount_out < request.min_amount_out {
            return Err(PoolError::SlippageExceeded {
                amount_out: quote.amount_out,
                min_amount_out: request.min_amount_out,
            });
        }
        if quote.amount_out > reserve_out {
            return Err(PoolError::InsufficientBalance {
                account: request.vault_out,
                needed: quote.amount_out,
                available: reserve_out,
            });
        }
        if ledger.account(&request.user_out)?.owner != request.owner {
            return Err(PoolError::Unauthorized(request.owner));
        }
        // Both legs must be able to settle before either moves
        ledger.check_transfer(
            &request.user_in,
            &request.vault_in,
            &request.owner,
            request.amount_in,
        )?;
        ledger.check_transfer(
            &request.vault_out,
            &request.user_out,
            &pool.authority,
            quote.amount_out,
        )?;

        // Full amount in, fee included, stays with the pool
        ledger.transfer(
            &request.user_in,
            &request.vault_in,
            &request.owner,
            request.amount_in,
        )?;
        ledger.transfer(
            &request.vault_out,
            &request.user_out,
            &pool.authority,
            quote.amount_out,
        )?;

        info!(
            "🔄 Swap on {}: {} {} -> {} {} (fee {})",
            pool.address, quote.amount_in, quote.mint_in, quote.amount_out, quote.mint_out, quote.fee
        );
        Ok(quote)
    }
}
