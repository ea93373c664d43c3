//! View calls by human-readable signature.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::Address;
use unstake_protocol::abi::{decode_output, encode_call};

use crate::{client::ChainClient, error::ChainClientError};

/// Call `signature(args…)` on `to` and decode its return values.
///
/// `signature` must carry a `returns (...)` clause for outputs to decode,
/// e.g. `function unlockTime(address) view returns (uint256)`.
pub async fn call_view<C>(
    client: &C,
    to: Address,
    signature: &str,
    args: &[DynSolValue],
) -> Result<Vec<DynSolValue>, ChainClientError>
where
    C: ChainClient + ?Sized,
{
    let data = encode_call(signature, args).map_err(|source| ChainClientError::Abi {
        method: "eth_call",
        source,
    })?;

    let raw = client.call(to, data).await?;

    decode_output(signature, &raw).map_err(|e| ChainClientError::Chain {
        method: "eth_call",
        context: format!("to={to}, {signature}"),
        reason: e.to_string(),
    })
}
