//! Persisted pool record layout (borsh)

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

use crate::domain::pool::{MemberList, MemberToken, Pool};
use crate::infrastructure::derivation::PoolAddresses;
use crate::shared::errors::PoolError;
use crate::shared::types::Fee;

/// Bytes per member slot: mint + vault + weight
pub const MEMBER_RECORD_LEN: usize = 32 + 32 + 8;

/// Fixed header: fees, admin, share mint, capacity, token count, vec length prefix
pub const POOL_HEADER_LEN: usize = 8 + 8 + 32 + 32 + 2 + 2 + 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MemberRecord {
    pub mint: [u8; 32],
    pub vault: [u8; 32],
    pub weight: u64,
}

/// On-disk pool layout. `members` always has `capacity` slots; slots at or past
/// `token_count` are zeroed.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct PoolRecord {
    pub fee_numerator: u64,
    pub fee_denominator: u64,
    pub admin: [u8; 32],
    pub share_mint: [u8; 32],
    pub capacity: u16,
    pub token_count: u16,
    pub members: Vec<MemberRecord>,
}

impl PoolRecord {
    pub fn encoded_len(capacity: usize) -> usize {
        POOL_HEADER_LEN + capacity * MEMBER_RECORD_LEN
    }

    pub fn from_pool(pool: &Pool) -> Result<Self, PoolError> {
        let capacity = u16::try_from(pool.capacity()).map_err(|_| PoolError::MathOverflow)?;
        let token_count = u16::try_from(pool.token_count()).map_err(|_| PoolError::MathOverflow)?;

        let mut members = vec![MemberRecord::default(); pool.capacity()];
        for (slot, member) in members.iter_mut().zip(pool.members()) {
            *slot = MemberRecord {
                mint: member.mint.to_bytes(),
                vault: member.vault.to_bytes(),
                weight: member.weight,
            };
        }

        Ok(Self {
            fee_numerator: pool.fee.numerator,
            fee_denominator: pool.fee.denominator,
            admin: pool.admin.to_bytes(),
            share_mint: pool.share_mint.to_bytes(),
            capacity,
            token_count,
            members,
        })
    }

    /// Rebuild the pool stored at `address`, re-deriving its sub-accounts under `program_id`
    pub fn into_pool(self, program_id: &Pubkey, address: &Pubkey) -> Result<Pool, PoolError> {
        let capacity = self.capacity as usize;
        let token_count = self.token_count as usize;
        if self.members.len() != capacity {
            return Err(PoolError::CorruptRecord(format!(
                "{} member slots for capacity {}",
                self.members.len(),
                capacity
            )));
        }
        if token_count > capacity {
            return Err(PoolError::CorruptRecord(format!(
                "token count {} exceeds capacity {}",
                token_count, capacity
            )));
        }

        let addresses = PoolAddresses::derive(program_id, address);
        if addresses.share_mint.to_bytes() != self.share_mint {
            return Err(PoolError::CorruptRecord(
                "share mint does not belong to this pool".to_string(),
            ));
        }

        let mut members = MemberList::with_capacity(capacity)
            .map_err(|_| PoolError::CorruptRecord("zero capacity".to_string()))?;
        for slot in &self.members[..token_count] {
            if slot.weight == 0 {
                return Err(PoolError::CorruptRecord("member with zero weight".to_string()));
            }
            members.push(MemberToken {
                mint: Pubkey::new_from_array(slot.mint),
                vault: Pubkey::new_from_array(slot.vault),
                weight: slot.weight,
            })?;
        }

        Ok(Pool::new(
            addresses,
            Pubkey::new_from_array(self.admin),
            Fee::new(self.fee_numerator, self.fee_denominator),
            members,
        ))
    }

    pub fn encode(&self) -> Result<Vec<u8>, PoolError> {
        self.try_to_vec()
            .map_err(|e| PoolError::CorruptRecord(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, PoolError> {
        Self::try_from_slice(bytes).map_err(|e| PoolError::CorruptRecord(e.to_string()))
    }
}
