//! Stake lock state and the expiry rule.

use alloy::primitives::{Address, U256};
use serde::Serialize;

/// Unlock time as reported by the staking contract.
///
/// The contract returns `0` for an account that never staked; that value is
/// folded into `NoLock` here so it can never be mistaken for a timestamp
/// in the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "unlock_timestamp", rename_all = "snake_case")]
pub enum LockStatus {
    NoLock,
    LockedUntil(U256),
}

impl LockStatus {
    pub fn from_unlock_time(raw: U256) -> Self {
        if raw.is_zero() {
            Self::NoLock
        } else {
            Self::LockedUntil(raw)
        }
    }

    /// `true` iff there is a lock and `block_timestamp >= unlock`.
    pub fn is_expired_at(&self, block_timestamp: u64) -> bool {
        match self {
            Self::NoLock => false,
            Self::LockedUntil(unlock) => U256::from(block_timestamp) >= *unlock,
        }
    }

    /// Raw on-chain value (0 for `NoLock`).
    pub fn unlock_time(&self) -> U256 {
        match self {
            Self::NoLock => U256::ZERO,
            Self::LockedUntil(unlock) => *unlock,
        }
    }
}

/// One unlock-time reading for the monitored account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnlockRecord {
    pub account: Address,
    pub status: LockStatus,
}

impl UnlockRecord {
    pub fn new(account: Address, unlock_time: U256) -> Self {
        Self {
            account,
            status: LockStatus::from_unlock_time(unlock_time),
        }
    }
}
