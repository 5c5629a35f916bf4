//! Bounded, insertion-ordered member storage

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::shared::errors::PoolError;

/// One registered member of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberToken {
    pub mint: Pubkey,
    pub vault: Pubkey,
    pub weight: u64,
}

/// Fixed-capacity member sequence.
///
/// The capacity is chosen when the pool is created and never grows. Appends are
/// O(1); removal shifts every later row one position left so positional account
/// lists stay aligned with the remaining members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberList {
    capacity: usize,
    members: Vec<MemberToken>,
}

impl MemberList {
    pub fn with_capacity(capacity: usize) -> Result<Self, PoolError> {
        if capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        Ok(Self {
            capacity,
            members: Vec::with_capacity(capacity),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() == self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&MemberToken> {
        self.members.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut MemberToken> {
        self.members.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MemberToken> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[MemberToken] {
        &self.members
    }

    pub fn position(&self, mint: &Pubkey) -> Option<usize> {
        self.members.iter().position(|m| m.mint == *mint)
    }

    pub fn position_by_vault(&self, vault: &Pubkey) -> Option<usize> {
        self.members.iter().position(|m| m.vault == *vault)
    }

    pub fn contains(&self, mint: &Pubkey) -> bool {
        self.position(mint).is_some()
    }

    pub fn push(&mut self, member: MemberToken) -> Result<(), PoolError> {
        if self.is_full() {
            return Err(PoolError::PoolFull(self.capacity));
        }
        self.members.push(member);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<MemberToken> {
        if index >= self.members.len() {
            return None;
        }
        Some(self.members.remove(index))
    }
}

impl<'a> IntoIterator for &'a MemberList {
    type Item = &'a MemberToken;
    type IntoIter = std::slice::Iter<'a, MemberToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
