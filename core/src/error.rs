use thiserror::Error;

use crate::identity::Identity;

/// Escrow-related errors.
///
/// Every variant aborts the atomic unit it was raised in; no state
/// change survives a failed transition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EscrowError {
    /// A required signer did not authorize the transition.
    #[error("unauthorized: required signer missing")]
    Unauthorized,

    /// Source holding cannot cover the requested amount.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// Holding's asset type does not match the expected asset.
    #[error("asset mismatch: expected {expected}, found {found}")]
    AssetMismatch { expected: Identity, found: Identity },

    /// Supplied account does not match the reference stored in the record.
    #[error("holding mismatch: expected {expected}, found {found}")]
    HoldingMismatch { expected: Identity, found: Identity },

    /// Transition attempted on a resolved or nonexistent record.
    #[error("escrow record is not active")]
    RecordNotActive,

    /// Seeds and bump do not reproduce the expected derived identity.
    #[error("invalid derivation")]
    InvalidDerivation,

    /// No bump in the search space yields a valid derived identity.
    #[error("derivation exhausted: no valid bump found")]
    DerivationExhausted,

    #[error("amount must be non-zero")]
    InvalidAmount,

    #[error("account already in use: {0}")]
    AccountInUse(Identity),

    #[error("account not found: {0}")]
    AccountNotFound(Identity),

    #[error("invalid account data for {0}")]
    InvalidAccountData(Identity),

    #[error("insufficient lamports: required {required}, available {available}")]
    InsufficientLamports { required: u64, available: u64 },

    #[error("cannot close holding with non-zero balance {0}")]
    NonZeroBalance(u64),

    #[error("invalid instruction data: {0}")]
    InvalidInstruction(String),

    #[error("not enough account keys: expected {expected}, got {got}")]
    NotEnoughAccountKeys { expected: usize, got: usize },

    #[error("invalid transaction signature for {0}")]
    InvalidSignature(Identity),

    #[error("account {0} modified without being marked writable")]
    ReadonlyModified(Identity),

    #[error("transaction already processed")]
    DuplicateTransaction,

    #[error("unknown program: {0}")]
    UnknownProgram(Identity),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("identity error: {0}")]
    Identity(IdentityError),
}

/// Errors that might occur while parsing into an `Identity`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("cannot parse identity from empty string")]
    EmptyIdentity,

    #[error("identity must be 32 bytes, got {0}")]
    InvalidLength(usize),
}

impl From<IdentityError> for EscrowError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<bincode::error::EncodeError> for EscrowError {
    fn from(value: bincode::error::EncodeError) -> Self {
        Self::Encoding(value.to_string())
    }
}

impl From<bincode::error::DecodeError> for EscrowError {
    fn from(value: bincode::error::DecodeError) -> Self {
        Self::Encoding(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_error_display() {
        let err = EscrowError::InsufficientBalance {
            required: 1000,
            available: 10,
        };
        assert_eq!(
            err.to_string(),
            "insufficient balance: required 1000, available 10"
        );
    }

    #[test]
    fn identity_error_converts() {
        let err: EscrowError = IdentityError::EmptyIdentity.into();
        assert!(matches!(err, EscrowError::Identity(IdentityError::EmptyIdentity)));
    }
}
