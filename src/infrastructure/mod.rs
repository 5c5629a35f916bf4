//! Infrastructure layer - ledger binding, address derivation and record codec

pub mod derivation;
pub mod ledger;
pub mod record;

pub use derivation::PoolAddresses;
pub use ledger::{InMemoryLedger, Ledger, Transactional};
pub use record::PoolRecord;
