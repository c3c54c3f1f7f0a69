//! Trustless two-party token-swap escrow.
//!
//! The initializer locks asset A in a vault owned by a keyless derived
//! authority; a taker releases it by paying asset B, or the initializer
//! takes it back. All transitions run atomically on the [`Ledger`].

/// Fungible assets and the transfer capability the escrow relies on
pub mod asset;
/// Deterministic, keyless identity derivation
pub mod derive;
pub mod error;
/// Escrow record, instructions and state machine
pub mod escrow;
pub mod identity;
/// In-memory ledger with all-or-nothing transaction execution
pub mod ledger;

#[cfg(test)]
mod utils;

pub use asset::{AssetTransfer, Holding, Mint, TokenProgram};
pub use error::{EscrowError, IdentityError};
pub use escrow::{EscrowProgram, EscrowRecord};
pub use identity::{Identity, Keypair, Signature};
pub use ledger::{Ledger, Program, Receipt, Rent, Transaction};

pub type Result<T> = std::result::Result<T, EscrowError>;
