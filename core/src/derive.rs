//! Deterministic derivation of keyless authorities.
//!
//! A derived identity is `sha256(seeds || bump || base || marker)`,
//! accepted only when the digest is *off* the ed25519 curve. No private
//! key exists for such an identity, so the only way it can authorize a
//! transfer is through
//! [`InvokeContext::signers_with_derived`](crate::ledger::InvokeContext::signers_with_derived),
//! which re-runs this derivation for the calling program.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::identity::Identity;
use crate::{EscrowError, Result};

/// Maximum number of seeds, the bump included.
pub const MAX_SEEDS: usize = 16;

/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

const DERIVATION_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Derives the identity for `seeds` and `bump` under `base`.
///
/// # Errors
///
/// Returns `EscrowError::InvalidDerivation` if the seeds are out of
/// bounds or the resulting digest lies on the curve.
pub fn create_derived_identity(seeds: &[&[u8]], bump: u8, base: &Identity) -> Result<Identity> {
    check_seeds(seeds)?;
    let id = hash_seeds(seeds, bump, base);
    if id.is_on_curve() {
        return Err(EscrowError::InvalidDerivation);
    }
    Ok(id)
}

/// Finds the canonical (highest valid) bump for `seeds` under `base`.
///
/// Two independent callers with the same inputs always get the same pair.
///
/// # Errors
///
/// Returns `EscrowError::DerivationExhausted` if no bump in `0..=255`
/// produces an off-curve identity.
pub fn find_derived_identity(seeds: &[&[u8]], base: &Identity) -> Result<(Identity, u8)> {
    search_bumps(seeds, base, (0..=u8::MAX).rev())
}

/// Checks that `supplied` is exactly the identity derived from `seeds`
/// and `bump` under `base`.
pub fn verify_derived_identity(
    supplied: &Identity,
    seeds: &[&[u8]],
    bump: u8,
    base: &Identity,
) -> Result<()> {
    let derived = create_derived_identity(seeds, bump, base)?;
    if bool::from(supplied.as_ref().ct_eq(derived.as_ref())) {
        Ok(())
    } else {
        Err(EscrowError::InvalidDerivation)
    }
}

fn search_bumps(
    seeds: &[&[u8]],
    base: &Identity,
    bumps: impl IntoIterator<Item = u8>,
) -> Result<(Identity, u8)> {
    check_seeds(seeds)?;
    bumps
        .into_iter()
        .map(|bump| (hash_seeds(seeds, bump, base), bump))
        .find(|(id, _)| !id.is_on_curve())
        .ok_or(EscrowError::DerivationExhausted)
}

fn check_seeds(seeds: &[&[u8]]) -> Result<()> {
    // the bump occupies one seed slot
    if seeds.len() >= MAX_SEEDS || seeds.iter().any(|s| s.len() > MAX_SEED_LEN) {
        return Err(EscrowError::InvalidDerivation);
    }
    Ok(())
}

fn hash_seeds(seeds: &[&[u8]], bump: u8, base: &Identity) -> Identity {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(base.as_ref());
    hasher.update(DERIVATION_MARKER);
    Identity::new(hasher.finalize().into())
}
