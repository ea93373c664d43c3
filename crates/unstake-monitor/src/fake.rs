//! Scripted in-memory chain for monitor tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use tokio::sync::watch;

use unstake_chain_client::{BlockSnapshot, ChainClient, ChainClientError, TxReceipt};

/// Hardhat default account #0.
pub const HARDHAT_KEY_0: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Hardhat default account #1.
pub const HARDHAT_KEY_1: &str =
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendFailure {
    Network,
    Chain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipts {
    Success,
    Reverted,
    Pending,
}

/// Scripted read. The last entry repeats once the queue runs dry.
type Step<T> = Result<T, &'static str>;

struct Script {
    unlock_times: VecDeque<Step<U256>>,
    block_timestamps: VecDeque<Step<u64>>,
    next_block_number: u64,
    nonce: u64,
    gas_price: u128,
    send_error: Option<SendFailure>,
    receipts: Receipts,

    sent: Vec<Bytes>,
    send_attempts: usize,
    unlock_reads: usize,
    block_reads: usize,
    cancel_after_blocks: Option<(usize, watch::Sender<bool>)>,
}

/// Cloneable handle; tests keep one copy to inspect after the monitor ran.
#[derive(Clone)]
pub struct ScriptedChain(Arc<Mutex<Script>>);

impl Default for ScriptedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Script {
            unlock_times: VecDeque::from([Ok(U256::ZERO)]),
            block_timestamps: VecDeque::from([Ok(0)]),
            next_block_number: 100,
            nonce: 0,
            gas_price: 3_000_000_000,
            send_error: None,
            receipts: Receipts::Success,
            sent: Vec::new(),
            send_attempts: 0,
            unlock_reads: 0,
            block_reads: 0,
            cancel_after_blocks: None,
        })))
    }

    pub fn unlock_times(self, times: impl IntoIterator<Item = u64>) -> Self {
        self.unlock_steps(times.into_iter().map(Ok))
    }

    pub fn unlock_steps(self, steps: impl IntoIterator<Item = Step<u64>>) -> Self {
        self.0.lock().unwrap().unlock_times =
            steps.into_iter().map(|s| s.map(U256::from)).collect();
        self
    }

    pub fn block_timestamps(self, times: impl IntoIterator<Item = u64>) -> Self {
        self.block_steps(times.into_iter().map(Ok))
    }

    pub fn block_steps(self, steps: impl IntoIterator<Item = Step<u64>>) -> Self {
        self.0.lock().unwrap().block_timestamps = steps.into_iter().collect();
        self
    }

    pub fn nonce(self, nonce: u64) -> Self {
        self.0.lock().unwrap().nonce = nonce;
        self
    }

    pub fn gas_price(self, price: u128) -> Self {
        self.0.lock().unwrap().gas_price = price;
        self
    }

    pub fn send_fails_with_network(self) -> Self {
        self.0.lock().unwrap().send_error = Some(SendFailure::Network);
        self
    }

    pub fn send_fails_with_chain(self) -> Self {
        self.0.lock().unwrap().send_error = Some(SendFailure::Chain);
        self
    }

    pub fn receipts(self, receipts: Receipts) -> Self {
        self.0.lock().unwrap().receipts = receipts;
        self
    }

    /// Raise `cancel` while serving the `n`-th head-block read.
    pub fn cancel_after_blocks(self, n: usize, cancel: watch::Sender<bool>) -> Self {
        self.0.lock().unwrap().cancel_after_blocks = Some((n, cancel));
        self
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.0.lock().unwrap().sent.clone()
    }

    pub fn send_attempts(&self) -> usize {
        self.0.lock().unwrap().send_attempts
    }

    pub fn unlock_reads(&self) -> usize {
        self.0.lock().unwrap().unlock_reads
    }

    pub fn block_reads(&self) -> usize {
        self.0.lock().unwrap().block_reads
    }
}

fn next_step<T: Copy>(queue: &mut VecDeque<Step<T>>) -> Step<T> {
    if queue.len() > 1 {
        queue.pop_front().expect("non-empty")
    } else {
        *queue.front().expect("script has at least one step")
    }
}

fn scripted_network_error(method: &'static str, reason: &str) -> ChainClientError {
    ChainClientError::Network {
        method,
        context: "scripted".into(),
        reason: reason.to_owned(),
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn latest_block(&self) -> Result<BlockSnapshot, ChainClientError> {
        let mut s = self.0.lock().unwrap();
        s.block_reads += 1;
        if let Some((n, cancel)) = &s.cancel_after_blocks {
            if s.block_reads == *n {
                let _ = cancel.send(true);
            }
        }
        let timestamp = next_step(&mut s.block_timestamps)
            .map_err(|r| scripted_network_error("eth_getBlockByNumber", r))?;
        let number = s.next_block_number;
        s.next_block_number += 1;
        Ok(BlockSnapshot { number, timestamp })
    }

    async fn call(&self, _to: Address, _data: Bytes) -> Result<Bytes, ChainClientError> {
        let mut s = self.0.lock().unwrap();
        s.unlock_reads += 1;
        let unlock = next_step(&mut s.unlock_times)
            .map_err(|r| scripted_network_error("eth_call", r))?;
        Ok(Bytes::from(unlock.to_be_bytes::<32>().to_vec()))
    }

    async fn chain_id(&self) -> Result<u64, ChainClientError> {
        Ok(31337)
    }

    async fn transaction_count(&self, _account: Address) -> Result<u64, ChainClientError> {
        Ok(self.0.lock().unwrap().nonce)
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        Ok(self.0.lock().unwrap().gas_price)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<B256, ChainClientError> {
        let mut s = self.0.lock().unwrap();
        s.send_attempts += 1;
        match s.send_error {
            Some(SendFailure::Network) => {
                return Err(scripted_network_error(
                    "eth_sendRawTransaction",
                    "connection reset by peer",
                ))
            }
            Some(SendFailure::Chain) => {
                return Err(ChainClientError::Chain {
                    method: "eth_sendRawTransaction",
                    context: "scripted".into(),
                    reason: "code=-32000 msg=nonce too low".into(),
                })
            }
            None => {}
        }
        let hash = keccak256(&raw);
        s.sent.push(raw);
        Ok(hash)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TxReceipt>, ChainClientError> {
        let s = self.0.lock().unwrap();
        let receipt = |success| TxReceipt {
            transaction_hash: tx_hash,
            block_number: s.next_block_number,
            success,
            gas_used: 61_000,
        };
        Ok(match s.receipts {
            Receipts::Success => Some(receipt(true)),
            Receipts::Reverted => Some(receipt(false)),
            Receipts::Pending => None,
        })
    }
}
