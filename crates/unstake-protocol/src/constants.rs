// ============================================================================
// Keeper constants
// ============================================================================

// --- Delegation -------------------------------------------------------------

/// Designation marker that prefixes a delegated account's code (EIP-7702).
pub const DELEGATION_MARKER: [u8; 3] = [0xef, 0x01, 0x00];

/// Length of an EVM account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Designation header = marker || delegate address.
pub const DELEGATION_HEADER_LEN: usize = DELEGATION_MARKER.len() + ADDRESS_LEN;

// --- Contract interfaces ----------------------------------------------------

/// WalletLogic entry point executed in the context of the user's account.
pub const EXECUTE_UNSTAKE_SIGNATURE: &str = "executeUnstake(address)";

/// Staking contract view returning the account's unlock timestamp (0 = no stake).
pub const UNLOCK_TIME_SIGNATURE: &str = "function unlockTime(address) view returns (uint256)";

// --- Transaction ------------------------------------------------------------

/// Gas ceiling for the delegated unstake transaction.
pub const UNSTAKE_GAS_LIMIT: u64 = 300_000;

// --- Defaults ---------------------------------------------------------------

/// BSC testnet endpoint the contracts were deployed against.
pub const DEFAULT_RPC_URL: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";

/// Written by the deployment script in the project root.
pub const DEFAULT_ADDRESS_FILE: &str = "addresses.json";

/// Roughly one block on the target network.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
