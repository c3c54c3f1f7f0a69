use bincode::{Decode, Encode};

use crate::identity::Identity;
use crate::ledger::{AccountMeta, Instruction};
use crate::{EscrowError, Result};

/// Instructions understood by the escrow program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum EscrowInstruction {
    /// Opens the vault and record and moves the deposit into the vault.
    InitializeEscrow {
        vault_bump: u8,
        initializer_amount: u64,
        taker_amount: u64,
    },
    /// Pays the initializer and releases the vault to the taker.
    Exchange,
    /// Returns the vault to the initializer.
    Cancel,
}

impl EscrowInstruction {
    pub fn pack(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::legacy())?)
    }

    pub fn unpack(data: &[u8]) -> Result<Self> {
        let (ix, read) = bincode::decode_from_slice(data, bincode::config::legacy())
            .map_err(|e| EscrowError::InvalidInstruction(e.to_string()))?;
        if read != data.len() {
            return Err(EscrowError::InvalidInstruction(format!(
                "{} trailing bytes",
                data.len() - read
            )));
        }
        Ok(ix)
    }
}

fn identities<const N: usize>(metas: &[AccountMeta]) -> Result<[Identity; N]> {
    if metas.len() < N {
        return Err(EscrowError::NotEnoughAccountKeys {
            expected: N,
            got: metas.len(),
        });
    }
    let mut out = [Identity::default(); N];
    for (slot, meta) in out.iter_mut().zip(metas) {
        *slot = meta.identity;
    }
    Ok(out)
}

/// Accounts of an InitializeEscrow instruction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeEscrowAccounts {
    pub initializer: Identity,
    pub vault: Identity,
    /// Asset the vault holds.
    pub mint: Identity,
    pub initializer_deposit: Identity,
    pub initializer_receive: Identity,
    /// Fresh identity chosen by the submitter; co-signs.
    pub escrow: Identity,
}

impl InitializeEscrowAccounts {
    pub fn to_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.initializer, true),
            AccountMeta::new(self.vault, false),
            AccountMeta::new_readonly(self.mint, false),
            AccountMeta::new(self.initializer_deposit, false),
            AccountMeta::new_readonly(self.initializer_receive, false),
            AccountMeta::new(self.escrow, true),
        ]
    }

    pub fn from_metas(metas: &[AccountMeta]) -> Result<Self> {
        let [initializer, vault, mint, initializer_deposit, initializer_receive, escrow] =
            identities::<6>(metas)?;
        Ok(Self {
            initializer,
            vault,
            mint,
            initializer_deposit,
            initializer_receive,
            escrow,
        })
    }
}

/// Accounts of an Exchange instruction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeAccounts {
    pub taker: Identity,
    pub taker_deposit: Identity,
    pub taker_receive: Identity,
    pub initializer_deposit: Identity,
    pub initializer_receive: Identity,
    /// Receives the lamports of the closed vault and record.
    pub initializer: Identity,
    pub escrow: Identity,
    pub vault: Identity,
    pub vault_authority: Identity,
}

impl ExchangeAccounts {
    pub fn to_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new_readonly(self.taker, true),
            AccountMeta::new(self.taker_deposit, false),
            AccountMeta::new(self.taker_receive, false),
            AccountMeta::new(self.initializer_deposit, false),
            AccountMeta::new(self.initializer_receive, false),
            AccountMeta::new(self.initializer, false),
            AccountMeta::new(self.escrow, false),
            AccountMeta::new(self.vault, false),
            AccountMeta::new_readonly(self.vault_authority, false),
        ]
    }

    pub fn from_metas(metas: &[AccountMeta]) -> Result<Self> {
        let [taker, taker_deposit, taker_receive, initializer_deposit, initializer_receive, initializer, escrow, vault, vault_authority] =
            identities::<9>(metas)?;
        Ok(Self {
            taker,
            taker_deposit,
            taker_receive,
            initializer_deposit,
            initializer_receive,
            initializer,
            escrow,
            vault,
            vault_authority,
        })
    }
}

/// Accounts of a Cancel instruction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelAccounts {
    pub initializer: Identity,
    pub initializer_deposit: Identity,
    pub vault: Identity,
    pub vault_authority: Identity,
    pub escrow: Identity,
}

impl CancelAccounts {
    pub fn to_metas(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.initializer, true),
            AccountMeta::new(self.initializer_deposit, false),
            AccountMeta::new(self.vault, false),
            AccountMeta::new_readonly(self.vault_authority, false),
            AccountMeta::new(self.escrow, false),
        ]
    }

    pub fn from_metas(metas: &[AccountMeta]) -> Result<Self> {
        let [initializer, initializer_deposit, vault, vault_authority, escrow] = identities::<5>(metas)?;
        Ok(Self {
            initializer,
            initializer_deposit,
            vault,
            vault_authority,
            escrow,
        })
    }
}

pub fn initialize_escrow(
    program_id: &Identity,
    accounts: &InitializeEscrowAccounts,
    vault_bump: u8,
    initializer_amount: u64,
    taker_amount: u64,
) -> Result<Instruction> {
    let data = EscrowInstruction::InitializeEscrow {
        vault_bump,
        initializer_amount,
        taker_amount,
    }
    .pack()?;
    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_metas(),
        data,
    })
}

pub fn exchange(program_id: &Identity, accounts: &ExchangeAccounts) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_metas(),
        data: EscrowInstruction::Exchange.pack()?,
    })
}

pub fn cancel(program_id: &Identity, accounts: &CancelAccounts) -> Result<Instruction> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: accounts.to_metas(),
        data: EscrowInstruction::Cancel.pack()?,
    })
}
