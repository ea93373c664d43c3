// unstake-protocol: the pure side of the unstake keeper.
// Address bookkeeping, the lock-expiry rule and the delegation payload
// encoding; nothing in this crate touches the network.

pub mod abi;
pub mod address_book;
pub mod constants;
pub mod delegation;
pub mod error;
pub mod lock;

pub use address_book::AddressBook;
pub use constants::*;
pub use delegation::{build_delegation_payload, designation_header, DelegationPayload};
pub use error::ProtocolError;
pub use lock::{LockStatus, UnlockRecord};
