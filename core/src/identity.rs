//! Identities of parties, holdings and programs, plus the keypairs
//! that let a party co-sign a transition.

use std::fmt;
use std::str::FromStr;

use bincode::{Decode, Encode};
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey};
use rand::rngs::OsRng;
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;

/// Length of an identity in bytes.
pub const IDENTITY_LEN: usize = 32;

/// Identity of the system program: owns plain lamport accounts.
pub const SYSTEM_PROGRAM_ID: Identity = Identity([0u8; IDENTITY_LEN]);

/// Identity of the token program (`TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`).
pub const TOKEN_PROGRAM_ID: Identity = Identity([
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
]);

/// Default identity of the escrow program.
pub const ESCROW_PROGRAM_ID: Identity = Identity([
    0x8a, 0x2f, 0x4c, 0x11, 0x73, 0x5e, 0x90, 0x0d, 0xc4, 0x37, 0x6b, 0xa2, 0x19, 0xe8, 0x51, 0x3f,
    0x02, 0x9d, 0x46, 0xbb, 0x70, 0x1c, 0xe5, 0x88, 0x24, 0xaf, 0x63, 0x0e, 0xd9, 0x5a, 0x37, 0xc1,
]);

/// Address-like value identifying a party, a holding, a program or a
/// derived authority. May or may not correspond to a private key.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(into = "String", try_from = "String"))]
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Identity([u8; IDENTITY_LEN]);

impl Identity {
    pub const fn new(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(self) -> [u8; IDENTITY_LEN] {
        self.0
    }

    /// Whether the bytes decode to a point on the ed25519 curve.
    ///
    /// Derived identities must be off-curve so that no private key can
    /// ever sign for them.
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }
}

impl AsRef<[u8]> for Identity {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; IDENTITY_LEN]> for Identity {
    fn from(bytes: [u8; IDENTITY_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Identity {
    type Error = IdentityError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; IDENTITY_LEN] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    /// Parses base58 (the default textual form) or `0x`-prefixed hex.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        let bytes = match s.strip_prefix("0x") {
            Some(h) => hex::decode(h)?,
            None => bs58::decode(s).into_vec()?,
        };
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.to_string()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

/// Ed25519 signature over an encoded transaction message.
#[derive(Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct Signature([u8; 64]);

impl Signature {
    pub fn to_bytes(self) -> [u8; 64] {
        self.0
    }

    /// Checks this signature against `message` under `signer`.
    pub fn verify(&self, signer: &Identity, message: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(&signer.0) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&self.0);
        key.verify(message, &sig).is_ok()
    }
}

impl From<[u8; 64]> for Signature {
    fn from(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(&self.0[..8]))
    }
}

/// A party's signing key. Its identity is the ed25519 verifying key.
#[derive(Clone)]
pub struct Keypair(SigningKey);

impl Keypair {
    /// Generates a fresh keypair from OS randomness.
    pub fn new() -> Self {
        Self(SigningKey::generate(&mut OsRng))
    }

    /// Deterministic keypair, handy for fixtures and reproducible runs.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(SigningKey::from_bytes(&seed))
    }

    pub fn identity(&self) -> Identity {
        Identity(self.0.verifying_key().to_bytes())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message).to_bytes())
    }
}

impl Default for Keypair {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Keypair").field(&self.identity()).finish()
    }
}
