//! Fixtures shared by the domain tests

use solana_sdk::pubkey::Pubkey;

use crate::domain::pool::{AddToken, Pool, PoolRegistry};
use crate::infrastructure::ledger::{InMemoryLedger, Ledger};
use crate::shared::types::Fee;

pub struct TestPool {
    pub ledger: InMemoryLedger,
    pub registry: PoolRegistry,
    pub pool: Pubkey,
    pub admin: Pubkey,
    pub faucet: Pubkey,
}

impl TestPool {
    pub fn new(fee: Fee, capacity: usize) -> Self {
        let mut ledger = InMemoryLedger::new();
        let mut registry = PoolRegistry::new(Pubkey::new_unique());
        let pool = Pubkey::new_unique();
        let admin = Pubkey::new_unique();
        registry
            .create_pool(&mut ledger, pool, fee, admin, capacity)
            .unwrap();
        Self {
            ledger,
            registry,
            pool,
            admin,
            faucet: Pubkey::new_unique(),
        }
    }

    pub fn pool(&self) -> &Pool {
        self.registry.pool(&self.pool).unwrap()
    }

    /// Register a fresh mint with `weight`, funding the admin for whatever seed is due
    pub fn add_member(&mut self, weight: u64) -> Pubkey {
        let mint = Pubkey::new_unique();
        self.ledger.create_mint(mint, self.faucet).unwrap();
        let admin = self.admin;
        let admin_account = self.wallet(&admin, &mint, u64::MAX / 4);
        let request = AddToken {
            pool: self.pool,
            mint,
            weight,
            admin,
            admin_token_account: admin_account,
            existing_vaults: self.vaults(),
        };
        self.registry
            .add_token_to_pool(&mut self.ledger, &request)
            .unwrap();
        mint
    }

    /// Token account for `owner` holding `amount` of `mint`
    pub fn wallet(&mut self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let account = Pubkey::new_unique();
        self.ledger
            .create_token_account(account, *mint, *owner)
            .unwrap();
        if amount > 0 {
            self.ledger
                .mint_to(mint, &account, &self.faucet, amount)
                .unwrap();
        }
        account
    }

    /// One funded account per member, in member order
    pub fn wallets(&mut self, owner: &Pubkey, amounts: &[u64]) -> Vec<Pubkey> {
        let mints: Vec<Pubkey> = self.pool().members().iter().map(|m| m.mint).collect();
        mints
            .iter()
            .zip(amounts)
            .map(|(mint, amount)| self.wallet(owner, mint, *amount))
            .collect()
    }

    pub fn share_account(&mut self, owner: &Pubkey) -> Pubkey {
        let account = Pubkey::new_unique();
        let share_mint = self.pool().share_mint;
        self.ledger
            .create_token_account(account, share_mint, *owner)
            .unwrap();
        account
    }

    pub fn vaults(&self) -> Vec<Pubkey> {
        self.pool().members().iter().map(|m| m.vault).collect()
    }

    pub fn vault_balances(&self) -> Vec<u64> {
        self.pool().vault_balances(&self.ledger).unwrap()
    }

    pub fn balance(&self, account: &Pubkey) -> u64 {
        self.ledger.balance(account).unwrap()
    }

    pub fn share_supply(&self) -> u64 {
        self.ledger.supply(&self.pool().share_mint).unwrap()
    }
}
