//! Error handling for the pool engine and its collaborators

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Pool engine errors.
///
/// Every public operation either succeeds completely or fails with exactly one of
/// these kinds; nothing is downgraded to a silent no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool is full: capacity {0} reached")]
    PoolFull(usize),

    #[error("Token {0} is already a member of the pool")]
    DuplicateMember(Pubkey),

    #[error("Unknown pool member: {0}")]
    UnknownMember(Pubkey),

    #[error("Unauthorized: {0} is not the pool admin")]
    Unauthorized(Pubkey),

    #[error("Slippage exceeded: amount out {amount_out} < minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u64, min_amount_out: u64 },

    #[error("Insufficient balance in {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: Pubkey,
        needed: u64,
        available: u64,
    },

    #[error("Insufficient liquidity: a vault on the swap path is empty")]
    InsufficientLiquidity,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Account count mismatch: expected {expected}, got {actual}")]
    AccountCountMismatch { expected: usize, actual: usize },

    #[error("Weight must be greater than zero")]
    InvalidWeight,

    #[error("Invalid fee {numerator}/{denominator}")]
    InvalidFee { numerator: u64, denominator: u64 },

    #[error("Pool capacity must be greater than zero")]
    InvalidCapacity,

    #[error("Pool already exists: {0}")]
    PoolAlreadyExists(Pubkey),

    #[error("Pool not found: {0}")]
    PoolNotFound(Pubkey),

    #[error("Integer overflow or underflow")]
    MathOverflow,

    #[error("Deposit is not proportional to current reserves")]
    DisproportionateDeposit,

    #[error("Weighted sum invariant violated")]
    InvariantViolation,

    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Account {0} holds a different mint")]
    MintMismatch(Pubkey),

    #[error("Corrupt pool record: {0}")]
    CorruptRecord(String),
}

/// Ledger binding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    AccountNotFound(Pubkey),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(Pubkey),

    #[error("Mint not found: {0}")]
    MintNotFound(Pubkey),

    #[error("Account {0} holds a different mint")]
    MintMismatch(Pubkey),

    #[error("Insufficient funds in {account}: need {needed}, have {available}")]
    InsufficientFunds {
        account: Pubkey,
        needed: u64,
        available: u64,
    },

    #[error("{0} is not allowed to sign for this account")]
    OwnerMismatch(Pubkey),

    #[error("Balance overflow")]
    Overflow,
}

impl From<LedgerError> for PoolError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(key) | LedgerError::MintNotFound(key) => {
                PoolError::AccountNotFound(key)
            }
            LedgerError::AccountAlreadyExists(key) => PoolError::DuplicateMember(key),
            LedgerError::MintMismatch(key) => PoolError::MintMismatch(key),
            LedgerError::InsufficientFunds {
                account,
                needed,
                available,
            } => PoolError::InsufficientBalance {
                account,
                needed,
                available,
            },
            LedgerError::OwnerMismatch(key) => PoolError::Unauthorized(key),
            LedgerError::Overflow => PoolError::MathOverflow,
        }
    }
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Scenario error: {0}")]
    ScenarioError(String),

    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Pool(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_to_pool_kinds() {
        let account = Pubkey::new_unique();
        let err: PoolError = LedgerError::InsufficientFunds {
            account,
            needed: 10,
            available: 3,
        }
        .into();
        assert_eq!(
            err,
            PoolError::InsufficientBalance {
                account,
                needed: 10,
                available: 3
            }
        );

        let err: PoolError = LedgerError::OwnerMismatch(account).into();
        assert_eq!(err, PoolError::Unauthorized(account));

        let err: PoolError = LedgerError::AccountAlreadyExists(account).into();
        assert_eq!(err, PoolError::DuplicateMember(account));
    }

    #[test]
    fn test_app_error_wraps_pool_error() {
        let err: AppError = PoolError::DivisionByZero.into();
        assert!(err.to_string().contains("Division by zero"));
    }
}
