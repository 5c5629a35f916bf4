//! Ledger binding - token accounts, mints and atomic transfer primitives
//!
//! The pool engine never stores balances itself. It reads vault balances and share
//! supply through [`Ledger`] and moves value only through its transfer, mint and
//! burn primitives, each of which is all-or-nothing on its own. Multi-step
//! operations get their atomicity from [`Transactional`].

mod memory_ledger;

pub use memory_ledger::InMemoryLedger;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::LedgerError;

/// Token account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenAccount {
    pub address: Pubkey,
    pub mint: Pubkey,
    /// Authority allowed to debit this account
    pub owner: Pubkey,
    pub amount: u64,
}

/// Mint state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintAccount {
    pub address: Pubkey,
    pub mint_authority: Pubkey,
    pub supply: u64,
}

/// Token-account substrate consumed by the pool engine
pub trait Ledger {
    fn account(&self, address: &Pubkey) -> Result<TokenAccount, LedgerError>;

    fn mint_info(&self, mint: &Pubkey) -> Result<MintAccount, LedgerError>;

    fn create_mint(&mut self, mint: Pubkey, mint_authority: Pubkey) -> Result<(), LedgerError>;

    fn create_token_account(
        &mut self,
        address: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
    ) -> Result<(), LedgerError>;

    /// Debit `from` and credit `to`. Fails without effect unless `authority` owns
    /// `from`, both accounts hold the same mint and `from` covers `amount`.
    fn transfer(
        &mut self,
        from: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn mint_to(
        &mut self,
        mint: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn burn(
        &mut self,
        mint: &Pubkey,
        from: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError>;

    fn balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.account(address)?.amount)
    }

    fn supply(&self, mint: &Pubkey) -> Result<u64, LedgerError> {
        Ok(self.mint_info(mint)?.supply)
    }

    fn exists(&self, address: &Pubkey) -> bool {
        self.account(address).is_ok()
    }

    /// Checks [`Ledger::transfer`] performs, without applying anything
    fn check_transfer(
        &self,
        from: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let source = self.account(from)?;
        let destination = self.account(to)?;
        if source.owner != *authority {
            return Err(LedgerError::OwnerMismatch(*authority));
        }
        if source.mint != destination.mint {
            return Err(LedgerError::MintMismatch(*to));
        }
        if source.amount < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *from,
                needed: amount,
                available: source.amount,
            });
        }
        if from != to {
            destination
                .amount
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        }
        Ok(())
    }

    /// Whether `authority` may take `amount` of `mint` out of `from`.
    /// Used where the destination does not exist yet, and by burn.
    fn check_debit(
        &self,
        from: &Pubkey,
        mint: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<TokenAccount, LedgerError> {
        let source = self.account(from)?;
        if source.owner != *authority {
            return Err(LedgerError::OwnerMismatch(*authority));
        }
        if source.mint != *mint {
            return Err(LedgerError::MintMismatch(*from));
        }
        if source.amount < amount {
            return Err(LedgerError::InsufficientFunds {
                account: *from,
                needed: amount,
                available: source.amount,
            });
        }
        Ok(source)
    }

    /// Checks [`Ledger::mint_to`] performs, without applying anything
    fn check_mint_to(
        &self,
        mint: &Pubkey,
        to: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        let mint_info = self.mint_info(mint)?;
        let destination = self.account(to)?;
        if mint_info.mint_authority != *authority {
            return Err(LedgerError::OwnerMismatch(*authority));
        }
        if destination.mint != *mint {
            return Err(LedgerError::MintMismatch(*to));
        }
        mint_info
            .supply
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        destination
            .amount
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Checks [`Ledger::burn`] performs, without applying anything
    fn check_burn(
        &self,
        mint: &Pubkey,
        from: &Pubkey,
        authority: &Pubkey,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.mint_info(mint)?;
        self.check_debit(from, mint, authority, amount)?;
        Ok(())
    }
}

/// Ledgers that can undo every mutation made after a checkpoint
pub trait Transactional {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}
