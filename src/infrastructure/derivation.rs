//! Deterministic derivation of per-pool sub-accounts

use solana_sdk::pubkey::Pubkey;

pub const AUTHORITY_SEED: &[u8] = b"pool_authority";
pub const SHARE_MINT_SEED: &[u8] = b"pool_mint";
pub const VAULT_SEED: &[u8] = b"pool_vault";
pub const WALLET_SEED: &[u8] = b"wallet";

/// Addresses owned by a single pool, all program-derived from the pool key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAddresses {
    pub program_id: Pubkey,
    pub pool: Pubkey,
    pub authority: Pubkey,
    pub authority_bump: u8,
    pub share_mint: Pubkey,
}

impl PoolAddresses {
    pub fn derive(program_id: &Pubkey, pool: &Pubkey) -> Self {
        let (authority, authority_bump) =
            Pubkey::find_program_address(&[AUTHORITY_SEED, pool.as_ref()], program_id);
        let (share_mint, _) =
            Pubkey::find_program_address(&[SHARE_MINT_SEED, pool.as_ref()], program_id);

        Self {
            program_id: *program_id,
            pool: *pool,
            authority,
            authority_bump,
            share_mint,
        }
    }

    /// Vault holding the reserve of `mint` for this pool
    pub fn vault(&self, mint: &Pubkey) -> Pubkey {
        derive_vault(&self.program_id, &self.pool, mint)
    }
}

pub fn derive_vault(program_id: &Pubkey, pool: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[VAULT_SEED, pool.as_ref(), mint.as_ref()], program_id).0
}

/// Token account of `owner` for `mint`, used by the local driver in place of
/// associated token accounts
pub fn derive_wallet(program_id: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[WALLET_SEED, owner.as_ref(), mint.as_ref()], program_id).0
}
