//! Delegated-call payload encoding.
//!
//! Wire layout of the transaction data sent to the user's own account:
//! ```text
//! [3 bytes:  designation marker 0xef 0x01 0x00]
//! [20 bytes: delegate contract address]
//! [4 bytes:  function selector]
//! [n bytes:  ABI-encoded arguments]
//! ```
//! The first 23 bytes designate the delegate whose code runs in the account's
//! context; the rest is the call executed through that delegation.
//!
//! [`build_delegation_payload`] encodes any call. [`DelegationPayload`] only
//! holds calls taking exactly one `address` argument, the shape the unstake
//! entry point has.

use alloy::dyn_abi::{DynSolValue, JsonAbiExt};
use alloy::primitives::{Address, Bytes};

use crate::{
    abi::{encode_call, parse_function},
    constants::{ADDRESS_LEN, DELEGATION_HEADER_LEN, DELEGATION_MARKER, EXECUTE_UNSTAKE_SIGNATURE},
    error::ProtocolError,
};

const SELECTOR_LEN: usize = 4;
const WORD_LEN: usize = 32;

const _: () = assert!(DELEGATION_HEADER_LEN == DELEGATION_MARKER.len() + ADDRESS_LEN);
const _: () = assert!(DELEGATION_HEADER_LEN == 23);

/// Marker followed by the delegate address.
pub fn designation_header(delegate: Address) -> [u8; DELEGATION_HEADER_LEN] {
    let mut header = [0u8; DELEGATION_HEADER_LEN];
    header[..DELEGATION_MARKER.len()].copy_from_slice(&DELEGATION_MARKER);
    header[DELEGATION_MARKER.len()..].copy_from_slice(delegate.as_slice());
    header
}

/// Designation header plus a single-address call, validated on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationPayload {
    delegate: Address,
    call_data: Bytes,
}

impl DelegationPayload {
    /// Encode `signature(arg)` as the call to run through `delegate`.
    /// `signature` must take exactly one `address`.
    pub fn new(
        delegate: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<Self, ProtocolError> {
        let function = parse_function(signature)?;
        let single_address = function.inputs.len() == 1 && function.inputs[0].ty == "address";
        if !single_address {
            return Err(ProtocolError::ArgumentMismatch {
                signature: signature.to_owned(),
                reason: "delegated call must take exactly one address argument".into(),
            });
        }
        let call_data = encode_call(signature, args)?;
        Ok(Self {
            delegate,
            call_data,
        })
    }

    /// `executeUnstake(staking)` delegated to the WalletLogic contract.
    pub fn execute_unstake(wallet_logic: Address, staking: Address) -> Result<Self, ProtocolError> {
        Self::new(
            wallet_logic,
            EXECUTE_UNSTAKE_SIGNATURE,
            &[DynSolValue::Address(staking)],
        )
    }

    /// Split raw transaction data back into header and call. The call must
    /// be a selector and one left-padded address word.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        const EXPECTED: usize = DELEGATION_HEADER_LEN + SELECTOR_LEN + WORD_LEN;
        if data.len() != EXPECTED {
            return Err(ProtocolError::MalformedPayload(format!(
                "{} bytes, expected header + selector + one address word ({EXPECTED})",
                data.len(),
            )));
        }
        if data[..DELEGATION_MARKER.len()] != DELEGATION_MARKER {
            return Err(ProtocolError::MalformedPayload(format!(
                "bad designation marker 0x{}",
                hex::encode(&data[..DELEGATION_MARKER.len()])
            )));
        }
        let word = &data[DELEGATION_HEADER_LEN + SELECTOR_LEN..];
        if word[..WORD_LEN - ADDRESS_LEN].iter().any(|b| *b != 0) {
            return Err(ProtocolError::MalformedPayload(
                "call argument is not a left-padded address".into(),
            ));
        }
        Ok(Self {
            delegate: Address::from_slice(&data[DELEGATION_MARKER.len()..DELEGATION_HEADER_LEN]),
            call_data: Bytes::copy_from_slice(&data[DELEGATION_HEADER_LEN..]),
        })
    }

    pub fn delegate(&self) -> Address {
        self.delegate
    }

    /// Selector-prefixed call data.
    pub fn call_data(&self) -> &Bytes {
        &self.call_data
    }

    pub fn header(&self) -> [u8; DELEGATION_HEADER_LEN] {
        designation_header(self.delegate)
    }

    /// Full transaction data: header || call data.
    pub fn to_bytes(&self) -> Bytes {
        concat_payload(self.delegate, &self.call_data)
    }

    /// Decode the call arguments, checking the selector against `signature`.
    pub fn decode_call(&self, signature: &str) -> Result<Vec<DynSolValue>, ProtocolError> {
        let function = parse_function(signature)?;
        let (selector, args) = self.call_data.split_at(SELECTOR_LEN);
        if selector != function.selector().as_slice() {
            return Err(ProtocolError::MalformedPayload(format!(
                "selector 0x{} does not match {signature}",
                hex::encode(selector)
            )));
        }
        function
            .abi_decode_input(args)
            .map_err(|e| ProtocolError::MalformedPayload(format!("call arguments: {e}")))
    }
}

/// Build the transaction data that runs `signature(args…)` through `delegate`.
pub fn build_delegation_payload(
    delegate: Address,
    signature: &str,
    args: &[DynSolValue],
) -> Result<Bytes, ProtocolError> {
    let call_data = encode_call(signature, args)?;
    Ok(concat_payload(delegate, &call_data))
}

fn concat_payload(delegate: Address, call_data: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(DELEGATION_HEADER_LEN + call_data.len());
    out.extend_from_slice(&designation_header(delegate));
    out.extend_from_slice(call_data);
    out.into()
}
