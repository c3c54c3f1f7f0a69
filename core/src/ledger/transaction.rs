//! Signed transactions and the signer set they establish.

use std::collections::BTreeSet;

use bincode::{Decode, Encode};
use sha2::{Digest, Sha256};

use crate::derive::create_derived_identity;
use crate::identity::{Identity, Keypair, Signature};
use crate::{EscrowError, Result};

/// One account an instruction touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct AccountMeta {
    pub identity: Identity,
    /// Whether the transaction must carry this identity's signature.
    pub is_signer: bool,
    /// Whether the instruction may change the account.
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(identity: Identity, is_signer: bool) -> Self {
        Self {
            identity,
            is_signer,
            is_writable: true,
        }
    }

    pub fn new_readonly(identity: Identity, is_signer: bool) -> Self {
        Self {
            identity,
            is_signer,
            is_writable: false,
        }
    }
}

/// A call into one program.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Instruction {
    pub program_id: Identity,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// The signed payload: instructions executed as one atomic unit.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Message {
    pub instructions: Vec<Instruction>,
    /// Caller-chosen value that keeps otherwise identical messages distinct.
    pub nonce: u64,
}

impl Message {
    pub fn new(instructions: Vec<Instruction>, nonce: u64) -> Self {
        Self {
            instructions,
            nonce,
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::legacy())?)
    }

    pub fn hash(&self) -> Result<[u8; 32]> {
        Ok(Sha256::digest(self.serialize()?).into())
    }

    /// Identities marked `is_signer` in any instruction.
    pub fn required_signers(&self) -> BTreeSet<Identity> {
        self.instructions
            .iter()
            .flat_map(|ix| ix.accounts.iter())
            .filter(|meta| meta.is_signer)
            .map(|meta| meta.identity)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub message: Message,
    pub signatures: Vec<(Identity, Signature)>,
}

impl Transaction {
    /// Builds a message from `instructions` and signs it with every keypair.
    pub fn new_signed(
        instructions: Vec<Instruction>,
        nonce: u64,
        keypairs: &[&Keypair],
    ) -> Result<Self> {
        let message = Message::new(instructions, nonce);
        let bytes = message.serialize()?;
        let signatures = keypairs
            .iter()
            .map(|kp| (kp.identity(), kp.sign(&bytes)))
            .collect();
        Ok(Self {
            message,
            signatures,
        })
    }

    /// Verifies every signature and returns the resulting signer set.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` for a signature that does not verify,
    /// `Unauthorized` when an identity marked `is_signer` did not sign.
    pub fn verify(&self) -> Result<Signers> {
        let bytes = self.message.serialize()?;
        for (identity, signature) in &self.signatures {
            if !signature.verify(identity, &bytes) {
                return Err(EscrowError::InvalidSignature(*identity));
            }
        }
        let signers = Signers::new(self.signatures.iter().map(|(id, _)| *id));
        for required in self.message.required_signers() {
            signers.authorize(&required)?;
        }
        Ok(signers)
    }
}

/// Identities that authorized the current atomic unit.
///
/// Built by the ledger from verified signatures; programs can only
/// extend it with identities derived from their own program id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signers(BTreeSet<Identity>);

impl Signers {
    pub(crate) fn new(ids: impl IntoIterator<Item = Identity>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.0.contains(id)
    }

    /// Authorization predicate: `id` must be in the set.
    pub fn authorize(&self, id: &Identity) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EscrowError::Unauthorized)
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.0.iter()
    }

    pub(crate) fn with_derived(&self, seeds: &[&[u8]], bump: u8, program_id: &Identity) -> Result<Self> {
        let derived = create_derived_identity(seeds, bump, program_id)?;
        let mut extended = self.clone();
        extended.0.insert(derived);
        Ok(extended)
    }
}
