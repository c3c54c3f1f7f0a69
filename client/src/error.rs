use swapcrow_core::{EscrowError, IdentityError};

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("Escrow metadata belongs to program {found}, agent targets {expected}")]
    ProgramMismatch { expected: String, found: String },
}

impl ClientError {
    /// The ledger-level failure behind this error, if any.
    pub fn escrow_error(&self) -> Option<&EscrowError> {
        match self {
            Self::Escrow(e) => Some(e),
            _ => None,
        }
    }
}
