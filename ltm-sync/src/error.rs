//! Error types for ltm-sync.

use thiserror::Error;

use crate::clients::ClientError;
use crate::validation::ValidationError;

/// Errors surfaced to the driver by resource managers.
#[derive(Debug, Error)]
pub enum Error {
    /// An identity field failed its format check. No remote call was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The appliance (or the transport to it) rejected a call.
    #[error(transparent)]
    Remote(#[from] ClientError),

    /// The operation needs a stored identifier but the record has none.
    #[error("{kind} record has no identifier")]
    MissingId { kind: &'static str },

    /// The managed kind does not offer this lifecycle operation.
    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        kind: &'static str,
        operation: &'static str,
    },

    /// Node deletion kept failing on pool references after every retry.
    #[error(
        "gave up deleting {kind} {name} after {attempts} attempts: still referenced by pool {pool}"
    )]
    DependencyResolutionExhausted {
        kind: &'static str,
        name: String,
        pool: String,
        attempts: u32,
    },
}

impl Error {
    /// The underlying appliance error, if this came from the remote client.
    pub fn remote(&self) -> Option<&ClientError> {
        match self {
            Error::Remote(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for resource manager operations.
pub type Result<T> = std::result::Result<T, Error>;
