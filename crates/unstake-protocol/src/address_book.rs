//! Deployed contract addresses (`addresses.json`).
//!
//! The deployment script writes a flat JSON object:
//! ```text
//! {
//!   "deployer":    "0x…",   optional
//!   "token":       "0x…",
//!   "staking":     "0x…",
//!   "walletLogic": "0x…",
//!   "network":     "bscTestnet"   optional
//! }
//! ```
//! The book is loaded once before the monitor starts and never mutated.

use std::path::{Path, PathBuf};

use alloy::primitives::Address;
use serde::Deserialize;

use crate::{constants::ADDRESS_LEN, error::ProtocolError};

/// Addresses of the three deployed contracts plus optional deployment metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressBook {
    pub token: Address,
    pub staking: Address,
    pub wallet_logic: Address,
    pub deployer: Option<Address>,
    pub network: Option<String>,
}

#[derive(Deserialize)]
struct RawAddressBook {
    token: Option<String>,
    staking: Option<String>,
    #[serde(rename = "walletLogic")]
    wallet_logic: Option<String>,
    deployer: Option<String>,
    network: Option<String>,
}

impl AddressBook {
    /// Read and validate the address file at `path`.
    pub fn load(path: &Path) -> Result<Self, ProtocolError> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProtocolError::ConfigMissing {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => {
                return Err(ProtocolError::ConfigMalformed {
                    path: path.to_path_buf(),
                    reason: format!("unreadable: {e}"),
                });
            }
        };
        Self::from_json(&text, path)
    }

    /// Parse the JSON contents of an address file. `origin` is only used in errors.
    pub fn from_json(text: &str, origin: &Path) -> Result<Self, ProtocolError> {
        let malformed = |reason: String| ProtocolError::ConfigMalformed {
            path: origin.to_path_buf(),
            reason,
        };

        let raw: RawAddressBook =
            serde_json::from_str(text).map_err(|e| malformed(format!("invalid JSON: {e}")))?;

        let required = |key: &str, value: Option<String>| -> Result<Address, ProtocolError> {
            let value = value.ok_or_else(|| malformed(format!("missing required key `{key}`")))?;
            parse_address(&value).map_err(|reason| malformed(format!("`{key}`: {reason}")))
        };

        let token = required("token", raw.token)?;
        let staking = required("staking", raw.staking)?;
        let wallet_logic = required("walletLogic", raw.wallet_logic)?;

        let deployer = match raw.deployer {
            None => None,
            Some(s) => Some(
                parse_address(&s).map_err(|reason| malformed(format!("`deployer`: {reason}")))?,
            ),
        };

        Ok(Self {
            token,
            staking,
            wallet_logic,
            deployer,
            network: raw.network,
        })
    }

    /// Default location: `addresses.json` in the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from(crate::constants::DEFAULT_ADDRESS_FILE)
    }
}

/// Parse a `0x`-prefixed, 40-hex-digit account address.
///
/// Mixed case is accepted without checksum validation, matching what
/// the deployment tooling writes.
pub fn parse_address(s: &str) -> Result<Address, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| format!("{s:?} is not 0x-prefixed"))?;
    if digits.len() != ADDRESS_LEN * 2 {
        return Err(format!(
            "{s:?} has {} hex digits, expected {}",
            digits.len(),
            ADDRESS_LEN * 2
        ));
    }
    let bytes = hex::decode(digits).map_err(|e| format!("{s:?} is not hex: {e}"))?;
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOKEN: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
    const STAKING: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
    const WALLET: &str = "0x9fE46736679d2D9a65F0992F2272dE9f3c7fa6e0";

    fn sample_json() -> String {
        format!(
            r#"{{
  "deployer": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
  "token": "{TOKEN}",
  "staking": "{STAKING}",
  "walletLogic": "{WALLET}",
  "network": "bscTestnet"
}}"#
        )
    }

    #[test]
    fn loads_deployment_output() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        let book = AddressBook::load(file.path()).unwrap();
        assert_eq!(book.token, parse_address(TOKEN).unwrap());
        assert_eq!(book.staking, parse_address(STAKING).unwrap());
        assert_eq!(book.wallet_logic, parse_address(WALLET).unwrap());
        assert_eq!(book.network.as_deref(), Some("bscTestnet"));
        assert!(book.deployer.is_some());
    }

    #[test]
    fn metadata_is_optional() {
        let json =
            format!(r#"{{"token":"{TOKEN}","staking":"{STAKING}","walletLogic":"{WALLET}"}}"#);
        let book = AddressBook::from_json(&json, Path::new("addresses.json")).unwrap();
        assert_eq!(book.deployer, None);
        assert_eq!(book.network, None);
    }

    #[test]
    fn missing_file_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = AddressBook::load(&dir.path().join("addresses.json")).unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigMissing { .. }));
    }

    #[test]
    fn missing_key_is_config_malformed() {
        let json = format!(r#"{{"token":"{TOKEN}","staking":"{STAKING}"}}"#);
        let err = AddressBook::from_json(&json, Path::new("a.json")).unwrap_err();
        match err {
            ProtocolError::ConfigMalformed { reason, .. } => {
                assert!(reason.contains("walletLogic"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_address_is_config_malformed() {
        let json = format!(r#"{{"token":"{TOKEN}","staking":"0x1234","walletLogic":"{WALLET}"}}"#);
        let err = AddressBook::from_json(&json, Path::new("a.json")).unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigMalformed { .. }));
    }

    #[test]
    fn non_json_is_config_malformed() {
        let err = AddressBook::from_json("token=0x00", Path::new("a.json")).unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigMalformed { .. }));
    }

    #[test]
    fn parse_address_rejects_non_hex_and_missing_prefix() {
        assert!(parse_address("5FbDB2315678afecb367f032d93F642f64180aa3").is_err());
        assert!(parse_address("0xZZbDB2315678afecb367f032d93F642f64180aa3").is_err());
        assert!(parse_address(TOKEN).is_ok());
    }
}
