//! In-memory ledger used by the CLI driver and the test-suite

use std::collections::BTreeMap;

use solana_sdk::pubkey::Pubkey;
use tracing::trace;

use super::{Ledger, MintAccount, TokenAccount, Transactional};
use crate::shared::errors::LedgerError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    accounts: BTreeMap<Pubkey, TokenAccount>,
    mints: BTreeMap<Pubkey, MintAccount>,
}

/// Full copy of ledger state taken by [`Transactional::checkpoint`]
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    accounts: BTreeMap<Pubkey, TokenAccount>,
    mints: BTreeMap<Pubkey, MintAccount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &TokenAccount> {
        self.accounts.values()
    }

    fn account_mut(&mut self, address: &Pubkey) -> Result<&mut TokenAccount, LedgerError> {
        self.accounts
            .get_mut(address)
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    fn mint_mut(&mut self, mint: &Pubkey) -> Result<&mut MintAccount, LedgerError> {
        self.mints
            .get_mut(mint)
            .ok_or(LedgerError::MintNotFound(*mint))
    }
}

impl Ledger for InMemoryLedger {
    fn account(&self, address: &Pubkey) -> Result<TokenAccount, LedgerError> {
        self.accounts
            .get(address)
            .copied()
            .ok_or(LedgerError::AccountNotFound(*address))
    }

    fn mint_info(&self, mint: &Pubkey) -> Result<MintAccount, LedgerError> {
        self.mints
            .get(mint)
            .copied()
            .ok_or(LedgerError::MintNotFound(*mint))
    }

    fn create_mint(&mut self, mint: Pubkey, mint_authority: Pubkey) -> Result<(), LedgerError> {
        if self.mints.contains_key(&mint) {
            return Err(LedgerError::AccountAlreadyExists(mint));
        }
        self.mints.insert(
            mint,
            MintAccount {
                address: mint,
                mint_authority,
                supply: 0,
            },
        );
        trace!("created mint {} (authority {})", mint, mint_authority);
        Ok(())
    }

    fn create_token_account(
        &mut self,
        address: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
    ) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&address) {
            return Err(LedgerError::AccountAlreadyExists(address));
        }
        if !self.mints.contains_key(&mint) {
            return Err(LedgerError::MintNotFound(mint));
        }
        self.accounts.insert(
            address,
            TokenAccount {
                address,
                mint,
                owner,
                amount: 0,
            },
        );
        trace!("created token account {} for mint {}", address, mint);
        Ok(())
    }

    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.check_transfer(from, to, authority, amount)?;
        if from == to {
            return Ok(());
        }
        let source = self.account(from)?;
        let destination = self.account(to)?;

        let credited = destination
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.account_mut(from)?.amount = source.amount - amount;
        self.account_mut(to)?.amount = credited;

        trace!("transfer {} from {} to {}", amount, from, to);
        Ok(())
    }

    fn mint_to(
        &mut self,
        mint: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.check_mint_to(mint, to, authority, amount)?;
        let mint_info = self.mint_info(mint)?;
        let destination = self.account(to)?;

        let supply = mint_info
            .supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let balance = destination
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        self.mint_mut(mint)?.supply = supply;
        self.account_mut(to)?.amount = balance;

        trace!("minted {} of {} to {}", amount, mint, to);
        Ok(())
    }

    fn burn(
        &mut self,
        mint: &Pubkey,
        from: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.check_burn(mint, from, authority, amount)?;
        let mint_info = self.mint_info(mint)?;
        let source = self.account(from)?;

        // supply >= any single balance
        self.mint_mut(mint)?.supply = mint_info.supply - amount;
        self.account_mut(from)?.amount = source.amount - amount;

        trace!("burned {} of {} from {}", amount, mint, from);
        Ok(())
    }
}

impl Transactional for InMemoryLedger {
    type Checkpoint = LedgerSnapshot;

    fn checkpoint(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            accounts: self.accounts.clone(),
            mints: self.mints.clone(),
        }
    }

    fn rollback(&mut self, checkpoint: LedgerSnapshot) {
        self.accounts = checkpoint.accounts;
        self.mints = checkpoint.mints;
    }
}
