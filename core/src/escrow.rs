//! The escrow program: custody of the initializer's deposit in a vault
//! owned by a keyless derived authority, released by Exchange or
//! returned by Cancel.

pub mod instruction;
pub mod processor;
pub mod state;

use crate::derive::find_derived_identity;
use crate::identity::Identity;
use crate::Result;

pub use instruction::{CancelAccounts, EscrowInstruction, ExchangeAccounts, InitializeEscrowAccounts};
pub use processor::EscrowProgram;
pub use state::EscrowRecord;

/// Label the vault holding is derived from.
pub const VAULT_SEED: &[u8] = b"token-seed";

/// Label the vault authority is derived from.
pub const VAULT_AUTHORITY_SEED: &[u8] = b"escrow";

/// Vault identity and bump for `program_id`.
pub fn find_vault(program_id: &Identity) -> Result<(Identity, u8)> {
    find_derived_identity(&[VAULT_SEED], program_id)
}

/// Vault-authority identity and bump for `program_id`.
pub fn find_vault_authority(program_id: &Identity) -> Result<(Identity, u8)> {
    find_derived_identity(&[VAULT_AUTHORITY_SEED], program_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ESCROW_PROGRAM_ID;

    #[test]
    fn vault_and_authority_differ() {
        let (vault, _) = find_vault(&ESCROW_PROGRAM_ID).unwrap();
        let (authority, _) = find_vault_authority(&ESCROW_PROGRAM_ID).unwrap();
        assert_ne!(vault, authority);
        assert!(!vault.is_on_curve());
        assert!(!authority.is_on_curve());
    }
}
