//! Signing key loading.

use alloy::signers::local::PrivateKeySigner;
use anyhow::{anyhow, bail, Context as _};

/// Parse the hex private key from `PRIVATE_KEY` (process environment or
/// `.env`) or `--private-key`.
///
/// The key itself never reaches a log line or an error message.
pub fn load_signer(key: Option<&str>) -> anyhow::Result<PrivateKeySigner> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| anyhow!("PRIVATE_KEY is not set; check the environment or .env file"))?;

    let digits = key.strip_prefix("0x").unwrap_or(key);
    let bytes = hex::decode(digits).context("PRIVATE_KEY is not valid hex")?;
    if bytes.len() != 32 {
        bail!("PRIVATE_KEY must be 32 bytes, got {}", bytes.len());
    }

    PrivateKeySigner::from_slice(&bytes)
        .map_err(|_| anyhow!("PRIVATE_KEY is not a valid secp256k1 secret key"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    use crate::fake::{HARDHAT_KEY_0, HARDHAT_KEY_1};

    #[test]
    fn loads_hardhat_accounts() {
        let signer = load_signer(Some(HARDHAT_KEY_0)).unwrap();
        assert_eq!(
            signer.address(),
            address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let signer = load_signer(Some(HARDHAT_KEY_1.trim_start_matches("0x"))).unwrap();
        assert_eq!(
            signer.address(),
            address!("70997970C51812dc3A010C7d01b50e0d17dc79C8")
        );
    }

    #[test]
    fn missing_key_is_fatal() {
        for key in [None, Some(""), Some("   ")] {
            let err = load_signer(key).unwrap_err();
            assert!(err.to_string().contains("PRIVATE_KEY is not set"), "{err}");
        }
    }

    #[test]
    fn malformed_key_is_rejected_without_echo() {
        let err = load_signer(Some("0xnot-a-key")).unwrap_err();
        assert!(!format!("{err:#}").contains("not-a-key"));

        let err = load_signer(Some("0xdeadbeef")).unwrap_err();
        assert!(err.to_string().contains("32 bytes"), "{err}");

        let zero = format!("0x{}", "00".repeat(32));
        assert!(load_signer(Some(&zero)).is_err());
    }
}
