// unstake-chain-client: JSON-RPC access to the chain for the unstake keeper.
// Reads blocks and contract views, submits signed transactions and polls
// for their receipts. No retries at this layer; callers decide.

pub mod client;
pub mod error;
pub mod oracle;
pub mod types;
pub mod view;

pub use client::{ChainClient, RpcChainClient};
pub use error::ChainClientError;
pub use oracle::LockOracle;
pub use types::{BlockSnapshot, TxReceipt};
