use thiserror::Error;

use crate::diagnostics::ValidationError;

/// Problems with a descriptor table itself, as opposed to the data checked
/// against it.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("descriptor \"{0}\" is registered twice")]
    DuplicateName(String),
    #[error("object in descriptor \"{descriptor}\" declares {side} key \"{key}\" more than once")]
    DuplicateKey {
        descriptor: String,
        side: KeySide,
        key: String,
    },
    #[error("descriptor \"{from}\" references \"{to}\", which is not registered")]
    UnresolvedReference { from: String, to: String },
    #[error("invalid schema document at {path}: {message}")]
    Document { path: String, message: String },
    #[error("failed to read schema document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySide {
    Json,
    Internal,
}

impl std::fmt::Display for KeySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySide::Json => f.write_str("JSON"),
            KeySide::Internal => f.write_str("internal"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("at path {path} → {message}")]
    Bridge { path: String, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
