use alloy::primitives::B256;
use thiserror::Error;
use unstake_protocol::ProtocolError;

/// Failure of a single chain operation, tagged with the RPC method and the
/// arguments it was called with so the caller can decide whether to retry.
#[derive(Debug, Error)]
pub enum ChainClientError {
    /// Transport-level failure: timeout, refused connection, non-JSON body.
    #[error("network error in {method}({context}): {reason}")]
    Network {
        method: &'static str,
        context: String,
        reason: String,
    },

    /// The node answered, but with an error object, a revert or a result
    /// that does not decode.
    #[error("chain error in {method}({context}): {reason}")]
    Chain {
        method: &'static str,
        context: String,
        reason: String,
    },

    /// Transaction was accepted but reverted or never confirmed.
    #[error("transaction {tx_hash} failed: {reason}")]
    TransactionFailed { tx_hash: B256, reason: String },

    /// A view call could not be encoded or its result decoded.
    #[error("{method}: {source}")]
    Abi {
        method: &'static str,
        #[source]
        source: ProtocolError,
    },
}

impl ChainClientError {
    /// Only transport errors are worth retrying, and only for reads.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}
