//! Chain values the keeper consumes, and their JSON-RPC wire shapes.

use alloy::primitives::{B256, U64};
use serde::{Deserialize, Serialize};

/// Head block as seen by one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSnapshot {
    pub number: u64,
    pub timestamp: u64,
}

/// Outcome of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub success: bool,
    pub gas_used: u64,
}

// ============================================================================
// Wire types (hex quantities, camelCase keys)
// ============================================================================

/// Subset of an `eth_getBlockByNumber` result.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcBlock {
    number: U64,
    timestamp: U64,
}

impl From<RpcBlock> for BlockSnapshot {
    fn from(b: RpcBlock) -> Self {
        Self {
            number: b.number.to::<u64>(),
            timestamp: b.timestamp.to::<u64>(),
        }
    }
}

/// Subset of an `eth_getTransactionReceipt` result.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RpcReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    /// Post-Byzantium status: 0x1 success, 0x0 reverted.
    status: Option<U64>,
    gas_used: Option<U64>,
}

impl RpcReceipt {
    /// `None` while the receipt is still pending inclusion.
    pub(crate) fn into_receipt(self) -> Option<TxReceipt> {
        let block_number = self.block_number?.to::<u64>();
        Some(TxReceipt {
            transaction_hash: self.transaction_hash,
            block_number,
            success: self.status.map(|s| s == U64::from(1u8)).unwrap_or(false),
            gas_used: self.gas_used.map(|g| g.to::<u64>()).unwrap_or(0),
        })
    }
}
