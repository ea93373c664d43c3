//! Delegated unstake transaction: build, sign locally, broadcast.
//!
//! The transaction is sent to the user's own account with the delegation
//! payload as data:
//!   - `to`        = monitored account (EOA)
//!   - `data`      = 0xef0100 || walletLogic || executeUnstake(staking)
//!   - `gas_limit` = fixed ceiling
//!   - `value`     = 0
//!
//! Signing is split from broadcasting so the caller can abandon the
//! preparation reads on shutdown but never interrupt `eth_sendRawTransaction`
//! half-way.

use alloy::consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, TxKind, B256, U256};
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use anyhow::Context as _;

use unstake_chain_client::{ChainClient, ChainClientError};
use unstake_protocol::DelegationPayload;

/// Unsigned delegated-unstake call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnstakeTransaction {
    pub to: Address,
    pub data: Bytes,
    pub gas_limit: u64,
}

impl UnstakeTransaction {
    pub fn new(account: Address, payload: &DelegationPayload, gas_limit: u64) -> Self {
        Self {
            to: account,
            data: payload.to_bytes(),
            gas_limit,
        }
    }
}

/// Signed, EIP-2718 encoded transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub hash: B256,
    pub raw: Bytes,
    pub nonce: u64,
}

/// Fetch chain id, pending nonce and gas price, then sign.
pub async fn prepare<C>(
    client: &C,
    signer: &PrivateKeySigner,
    tx: &UnstakeTransaction,
) -> anyhow::Result<SignedTransaction>
where
    C: ChainClient + ?Sized,
{
    let chain_id = client.chain_id().await.context("reading chain id")?;
    let nonce = client
        .transaction_count(signer.address())
        .await
        .context("reading account nonce")?;
    let gas_price = client.gas_price().await.context("reading gas price")?;

    tracing::debug!(chain_id, nonce, gas_price, "signing unstake transaction");

    sign_legacy(signer, tx, chain_id, nonce, gas_price)
}

/// EIP-155 legacy transaction signed with `signer`.
pub fn sign_legacy(
    signer: &PrivateKeySigner,
    tx: &UnstakeTransaction,
    chain_id: u64,
    nonce: u64,
    gas_price: u128,
) -> anyhow::Result<SignedTransaction> {
    let legacy = TxLegacy {
        chain_id: Some(chain_id),
        nonce,
        gas_price,
        gas_limit: tx.gas_limit,
        to: TxKind::Call(tx.to),
        value: U256::ZERO,
        input: tx.data.clone(),
    };

    let signature = signer
        .sign_hash_sync(&legacy.signature_hash())
        .map_err(|e| anyhow::anyhow!("signing unstake transaction: {e}"))?;

    let envelope = TxEnvelope::from(legacy.into_signed(signature));

    Ok(SignedTransaction {
        hash: *envelope.tx_hash(),
        raw: envelope.encoded_2718().into(),
        nonce,
    })
}

/// Broadcast once. No resubmission on failure.
pub async fn broadcast<C>(client: &C, signed: &SignedTransaction) -> Result<B256, ChainClientError>
where
    C: ChainClient + ?Sized,
{
    let hash = client.send_raw_transaction(signed.raw.clone()).await?;
    if hash != signed.hash {
        tracing::warn!(
            local = %signed.hash,
            node  = %hash,
            "Node reported a different transaction hash; tracking the node's",
        );
    }
    Ok(hash)
}
