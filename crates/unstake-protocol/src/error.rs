use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("address file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    #[error("address file {} is malformed: {reason}", path.display())]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("invalid function signature {signature:?}: {reason}")]
    InvalidSignature { signature: String, reason: String },

    #[error("arguments do not match {signature}: {reason}")]
    ArgumentMismatch { signature: String, reason: String },

    #[error("malformed delegation payload: {0}")]
    MalformedPayload(String),

    #[error("cannot decode return data of {signature}: {reason}")]
    MalformedOutput { signature: String, reason: String },
}
