//! Durable record of one pending swap.

use bincode::{Decode, Encode};
#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity::{Identity, IDENTITY_LEN};
use crate::ledger::{AccountData, AccountStore};
use crate::{EscrowError, Result};

const DISCRIMINATOR_LEN: usize = 8;

/// Terms and parties of one escrow. Fields are write-once: the record is
/// built by Initialize and afterwards only read or deleted.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct EscrowRecord {
    initializer: Identity,
    initializer_deposit: Identity,
    initializer_receive: Identity,
    initializer_amount: u64,
    taker_amount: u64,
    vault_bump: u8,
}

impl EscrowRecord {
    /// Stored size in bytes, discriminator included.
    pub const LEN: usize = DISCRIMINATOR_LEN + IDENTITY_LEN * 3 + 8 + 8 + 1;

    pub(crate) fn new(
        initializer: Identity,
        initializer_deposit: Identity,
        initializer_receive: Identity,
        initializer_amount: u64,
        taker_amount: u64,
        vault_bump: u8,
    ) -> Self {
        Self {
            initializer,
            initializer_deposit,
            initializer_receive,
            initializer_amount,
            taker_amount,
            vault_bump,
        }
    }

    pub fn initializer(&self) -> &Identity {
        &self.initializer
    }

    /// Holding the deposit was drawn from; Cancel refunds it.
    pub fn initializer_deposit(&self) -> &Identity {
        &self.initializer_deposit
    }

    /// Holding that receives the taker's payment on Exchange.
    pub fn initializer_receive(&self) -> &Identity {
        &self.initializer_receive
    }

    pub fn initializer_amount(&self) -> u64 {
        self.initializer_amount
    }

    pub fn taker_amount(&self) -> u64 {
        self.taker_amount
    }

    pub fn vault_bump(&self) -> u8 {
        self.vault_bump
    }

    /// First eight bytes of `sha256("account:EscrowRecord")`.
    pub fn discriminator() -> [u8; DISCRIMINATOR_LEN] {
        let digest = Sha256::digest(b"account:EscrowRecord");
        let mut out = [0u8; DISCRIMINATOR_LEN];
        out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
        out
    }

    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(Self::LEN);
        bytes.extend_from_slice(&Self::discriminator());
        bytes.extend(bincode::encode_to_vec(self, bincode::config::legacy())?);
        Ok(bytes)
    }

    /// Decodes a packed record.
    ///
    /// # Errors
    ///
    /// `RecordNotActive` when the discriminator does not match, and
    /// `Encoding` when the body is malformed.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DISCRIMINATOR_LEN || bytes[..DISCRIMINATOR_LEN] != Self::discriminator() {
            return Err(EscrowError::RecordNotActive);
        }
        let body = &bytes[DISCRIMINATOR_LEN..];
        let (record, _) = bincode::decode_from_slice(body, bincode::config::legacy())?;
        Ok(record)
    }

    /// Loads the active record stored at `address`.
    ///
    /// An absent account, one not owned by `program_id`, or one without a
    /// record discriminator all read as `RecordNotActive`.
    pub fn load(accounts: &AccountStore, address: &Identity, program_id: &Identity) -> Result<Self> {
        match accounts.get(address) {
            Some(account) if account.owner == *program_id => match &account.data {
                AccountData::Program(bytes) => Self::unpack(bytes),
                _ => Err(EscrowError::RecordNotActive),
            },
            _ => Err(EscrowError::RecordNotActive),
        }
    }
}
