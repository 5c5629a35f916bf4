//! Pool root record

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use super::member_list::{MemberList, MemberToken};
use crate::domain::invariant;
use crate::infrastructure::derivation::PoolAddresses;
use crate::infrastructure::ledger::Ledger;
use crate::shared::errors::PoolError;
use crate::shared::types::Fee;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub address: Pubkey,
    pub admin: Pubkey,
    pub fee: Fee,
    pub share_mint: Pubkey,
    /// Owner of every vault and mint authority of the share mint
    pub authority: Pubkey,
    #[serde(skip)]
    addresses: PoolAddresses,
    members: MemberList,
}

impl Pool {
    pub(crate) fn new(
        addresses: PoolAddresses,
        admin: Pubkey,
        fee: Fee,
        members: MemberList,
    ) -> Self {
        Self {
            address: addresses.pool,
            admin,
            fee,
            share_mint: addresses.share_mint,
            authority: addresses.authority,
            addresses,
            members,
        }
    }

    pub fn addresses(&self) -> &PoolAddresses {
        &self.addresses
    }

    pub fn members(&self) -> &MemberList {
        &self.members
    }

    pub(crate) fn members_mut(&mut self) -> &mut MemberList {
        &mut self.members
    }

    pub fn token_count(&self) -> usize {
        self.members.len()
    }

    pub fn capacity(&self) -> usize {
        self.members.capacity()
    }

    pub fn member(&self, mint: &Pubkey) -> Result<(usize, &MemberToken), PoolError> {
        let index = self
            .members
            .position(mint)
            .ok_or(PoolError::UnknownMember(*mint))?;
        Ok((index, &self.members.as_slice()[index]))
    }

    pub fn member_by_vault(&self, vault: &Pubkey) -> Result<(usize, &MemberToken), PoolError> {
        let index = self
            .members
            .position_by_vault(vault)
            .ok_or(PoolError::UnknownMember(*vault))?;
        Ok((index, &self.members.as_slice()[index]))
    }

    pub fn ensure_admin(&self, caller: &Pubkey) -> Result<(), PoolError> {
        if self.admin != *caller {
            return Err(PoolError::Unauthorized(*caller));
        }
        Ok(())
    }

    /// Reject positional account lists that do not have one entry per member
    pub fn ensure_account_count(&self, actual: usize) -> Result<(), PoolError> {
        let expected = self.token_count();
        if actual != expected {
            return Err(PoolError::AccountCountMismatch { expected, actual });
        }
        Ok(())
    }

    /// Check that `vaults[i]` is the vault of member `i`
    pub fn ensure_vaults_aligned(&self, vaults: &[Pubkey]) -> Result<(), PoolError> {
        self.ensure_account_count(vaults.len())?;
        for (member, vault) in self.members.iter().zip(vaults) {
            if member.vault != *vault {
                return Err(PoolError::UnknownMember(*vault));
            }
        }
        Ok(())
    }

    /// Live vault balances in member order
    pub fn vault_balances<L: Ledger>(&self, ledger: &L) -> Result<Vec<u64>, PoolError> {
        self.members
            .iter()
            .map(|m| ledger.balance(&m.vault).map_err(PoolError::from))
            .collect()
    }

    /// Weighted sum `S` over current members, read from live vault balances
    pub fn weighted_sum<L: Ledger>(&self, ledger: &L) -> Result<u128, PoolError> {
        let balances = self.vault_balances(ledger)?;
        invariant::weighted_sum(
            balances
                .into_iter()
                .zip(self.members.iter().map(|m| m.weight)),
        )
    }
}
