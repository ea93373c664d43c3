//! Signature-driven ABI helpers shared by the payload encoder and view calls.

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::primitives::Bytes;

use crate::error::ProtocolError;

/// Parse a human-readable signature, e.g. `executeUnstake(address)` or
/// `function unlockTime(address) view returns (uint256)`.
pub fn parse_function(signature: &str) -> Result<Function, ProtocolError> {
    Function::parse(signature).map_err(|e| ProtocolError::InvalidSignature {
        signature: signature.to_owned(),
        reason: e.to_string(),
    })
}

/// ABI-encode a call, selector included. Rejects wrong arity or argument types.
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Result<Bytes, ProtocolError> {
    let function = parse_function(signature)?;
    if function.inputs.len() != args.len() {
        return Err(ProtocolError::ArgumentMismatch {
            signature: signature.to_owned(),
            reason: format!("expected {} arguments, got {}", function.inputs.len(), args.len()),
        });
    }
    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ProtocolError::ArgumentMismatch {
            signature: signature.to_owned(),
            reason: e.to_string(),
        })
}

/// Decode the return data of a call to `signature`.
pub fn decode_output(signature: &str, data: &[u8]) -> Result<Vec<DynSolValue>, ProtocolError> {
    let function = parse_function(signature)?;
    function
        .abi_decode_output(data)
        .map_err(|e| ProtocolError::MalformedOutput {
            signature: signature.to_owned(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, U256};

    #[test]
    fn view_signature_with_returns_parses() {
        let f = parse_function(crate::UNLOCK_TIME_SIGNATURE).unwrap();
        assert_eq!(f.name, "unlockTime");
        assert_eq!(f.inputs.len(), 1);
        assert_eq!(f.outputs.len(), 1);
        // Selector ignores the returns clause.
        assert_eq!(f.selector(), parse_function("unlockTime(address)").unwrap().selector());
    }

    #[test]
    fn encodes_single_address_call() {
        let who = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        let data = encode_call("unlockTime(address)", &[DynSolValue::Address(who)]).unwrap();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[16..36], who.as_slice());
    }

    #[test]
    fn decodes_uint_output() {
        let mut word = [0u8; 32];
        word[30..].copy_from_slice(&1_000u16.to_be_bytes());
        let out = decode_output(crate::UNLOCK_TIME_SIGNATURE, &word).unwrap();
        assert_eq!(out, vec![DynSolValue::Uint(U256::from(1_000u64), 256)]);
    }

    #[test]
    fn short_output_is_rejected() {
        let err = decode_output(crate::UNLOCK_TIME_SIGNATURE, &[0u8; 7]).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedOutput { .. }));
    }
}
