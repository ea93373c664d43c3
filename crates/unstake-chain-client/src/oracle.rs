//! Staking contract unlock-time reads.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use unstake_protocol::{LockStatus, UnlockRecord, UNLOCK_TIME_SIGNATURE};

use crate::{client::ChainClient, error::ChainClientError, view::call_view};

/// Typed wrapper over the staking contract's `unlockTime(address)` view.
#[derive(Debug, Clone, Copy)]
pub struct LockOracle {
    staking: Address,
}

impl LockOracle {
    pub fn new(staking: Address) -> Self {
        Self { staking }
    }

    /// Raw unlock timestamp; `0` when the account has no stake.
    pub async fn unlock_time<C>(
        &self,
        client: &C,
        account: Address,
    ) -> Result<U256, ChainClientError>
    where
        C: ChainClient + ?Sized,
    {
        let out = call_view(
            client,
            self.staking,
            UNLOCK_TIME_SIGNATURE,
            &[DynSolValue::Address(account)],
        )
        .await?;

        match out.first().and_then(DynSolValue::as_uint) {
            Some((value, _bits)) => Ok(value),
            None => Err(ChainClientError::Chain {
                method: "eth_call",
                context: format!("to={}, {UNLOCK_TIME_SIGNATURE}", self.staking),
                reason: format!("expected a single uint256, got {out:?}"),
            }),
        }
    }

    /// Unlock time folded into [`LockStatus`].
    pub async fn unlock_record<C>(
        &self,
        client: &C,
        account: Address,
    ) -> Result<UnlockRecord, ChainClientError>
    where
        C: ChainClient + ?Sized,
    {
        let raw = self.unlock_time(client, account).await?;
        Ok(UnlockRecord::new(account, raw))
    }

    pub async fn lock_status<C>(
        &self,
        client: &C,
        account: Address,
    ) -> Result<LockStatus, ChainClientError>
    where
        C: ChainClient + ?Sized,
    {
        Ok(self.unlock_record(client, account).await?.status)
    }
}
