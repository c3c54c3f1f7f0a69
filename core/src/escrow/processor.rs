//! Escrow state machine: Initialize, Exchange and Cancel.
//!
//! Each transition validates everything it reads before the first effect
//! and runs inside the ledger's atomic unit, so a failing step leaves no
//! partial transfer behind.

use tracing::{debug, info};

use super::instruction::{CancelAccounts, EscrowInstruction, ExchangeAccounts, InitializeEscrowAccounts};
use super::state::EscrowRecord;
use super::{find_vault_authority, VAULT_AUTHORITY_SEED, VAULT_SEED};
use crate::asset::AssetTransfer;
use crate::derive::verify_derived_identity;
use crate::identity::{Identity, ESCROW_PROGRAM_ID};
use crate::ledger::{AccountMeta, InvokeContext, Program};
use crate::{EscrowError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowProgram {
    program_id: Identity,
}

impl EscrowProgram {
    pub fn new(program_id: Identity) -> Self {
        Self { program_id }
    }

    fn initialize(
        &self,
        ctx: &mut InvokeContext<'_>,
        accounts: &InitializeEscrowAccounts,
        vault_bump: u8,
        initializer_amount: u64,
        taker_amount: u64,
    ) -> Result<()> {
        if initializer_amount == 0 || taker_amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        let signers = ctx.signers().clone();
        signers.authorize(&accounts.initializer)?;
        signers.authorize(&accounts.escrow)?;

        verify_derived_identity(&accounts.vault, &[VAULT_SEED], vault_bump, &self.program_id)?;
        let (vault_authority, _) = find_vault_authority(&self.program_id)?;

        let deposit = *ctx.accounts().holding(&accounts.initializer_deposit)?;
        if deposit.mint != accounts.mint {
            return Err(EscrowError::AssetMismatch {
                expected: accounts.mint,
                found: deposit.mint,
            });
        }
        if deposit.amount < initializer_amount {
            return Err(EscrowError::InsufficientBalance {
                required: initializer_amount,
                available: deposit.amount,
            });
        }
        ctx.accounts().holding(&accounts.initializer_receive)?;

        let vault_signers = ctx.signers_with_derived(&[VAULT_SEED], vault_bump)?;
        ctx.token().create_holding(
            &accounts.vault,
            &accounts.mint,
            &vault_authority,
            &accounts.initializer,
            &vault_signers,
        )?;

        let record = EscrowRecord::new(
            accounts.initializer,
            accounts.initializer_deposit,
            accounts.initializer_receive,
            initializer_amount,
            taker_amount,
            vault_bump,
        );
        ctx.create_program_account(&accounts.initializer, &accounts.escrow, record.pack()?, &signers)?;

        ctx.token().transfer(
            &accounts.mint,
            initializer_amount,
            &accounts.initializer_deposit,
            &accounts.vault,
            &accounts.initializer,
            &signers,
        )
    }

    fn exchange(&self, ctx: &mut InvokeContext<'_>, accounts: &ExchangeAccounts) -> Result<()> {
        let record = EscrowRecord::load(ctx.accounts(), &accounts.escrow, &self.program_id)?;
        let signers = ctx.signers().clone();
        signers.authorize(&accounts.taker)?;

        ensure_same(record.initializer(), &accounts.initializer)?;
        ensure_same(record.initializer_deposit(), &accounts.initializer_deposit)?;
        ensure_same(record.initializer_receive(), &accounts.initializer_receive)?;
        let authority_bump = self.check_vault(&record, &accounts.vault, &accounts.vault_authority)?;

        let taker_deposit = *ctx.accounts().holding(&accounts.taker_deposit)?;
        if taker_deposit.amount < record.taker_amount() {
            return Err(EscrowError::InsufficientBalance {
                required: record.taker_amount(),
                available: taker_deposit.amount,
            });
        }
        let payment_asset = ctx.accounts().holding(&accounts.initializer_receive)?.mint;
        let vault = *ctx.accounts().holding(&accounts.vault)?;

        ctx.token().transfer(
            &payment_asset,
            record.taker_amount(),
            &accounts.taker_deposit,
            &accounts.initializer_receive,
            &accounts.taker,
            &signers,
        )?;

        let authority_signers = ctx.signers_with_derived(&[VAULT_AUTHORITY_SEED], authority_bump)?;
        let mut token = ctx.token();
        token.transfer(
            &vault.mint,
            vault.amount,
            &accounts.vault,
            &accounts.taker_receive,
            &accounts.vault_authority,
            &authority_signers,
        )?;
        token.close_holding(
            &accounts.vault,
            &accounts.initializer,
            &accounts.vault_authority,
            &authority_signers,
        )?;
        ctx.close_program_account(&accounts.escrow, &accounts.initializer)?;
        Ok(())
    }

    fn cancel(&self, ctx: &mut InvokeContext<'_>, accounts: &CancelAccounts) -> Result<()> {
        let record = EscrowRecord::load(ctx.accounts(), &accounts.escrow, &self.program_id)?;
        if *record.initializer() != accounts.initializer {
            return Err(EscrowError::Unauthorized);
        }
        ctx.signers().authorize(&accounts.initializer)?;
        ensure_same(record.initializer_deposit(), &accounts.initializer_deposit)?;
        let authority_bump = self.check_vault(&record, &accounts.vault, &accounts.vault_authority)?;

        let vault = *ctx.accounts().holding(&accounts.vault)?;
        let authority_signers = ctx.signers_with_derived(&[VAULT_AUTHORITY_SEED], authority_bump)?;
        let mut token = ctx.token();
        token.transfer(
            &vault.mint,
            vault.amount,
            &accounts.vault,
            &accounts.initializer_deposit,
            &accounts.vault_authority,
            &authority_signers,
        )?;
        token.close_holding(
            &accounts.vault,
            &accounts.initializer,
            &accounts.vault_authority,
            &authority_signers,
        )?;
        ctx.close_program_account(&accounts.escrow, &accounts.initializer)?;
        Ok(())
    }

    /// Checks the supplied vault and vault authority against their
    /// derivations and returns the authority's bump.
    fn check_vault(&self, record: &EscrowRecord, vault: &Identity, authority: &Identity) -> Result<u8> {
        verify_derived_identity(vault, &[VAULT_SEED], record.vault_bump(), &self.program_id)?;
        let (expected, bump) = find_vault_authority(&self.program_id)?;
        if expected != *authority {
            return Err(EscrowError::InvalidDerivation);
        }
        Ok(bump)
    }
}

impl Default for EscrowProgram {
    fn default() -> Self {
        Self::new(ESCROW_PROGRAM_ID)
    }
}

impl Program for EscrowProgram {
    fn id(&self) -> Identity {
        self.program_id
    }

    fn process(&self, ctx: &mut InvokeContext<'_>, accounts: &[AccountMeta], data: &[u8]) -> Result<()> {
        match EscrowInstruction::unpack(data)? {
            EscrowInstruction::InitializeEscrow {
                vault_bump,
                initializer_amount,
                taker_amount,
            } => {
                let accounts = InitializeEscrowAccounts::from_metas(accounts)?;
                debug!(escrow = %accounts.escrow, initializer_amount, taker_amount, "initialize");
                self.initialize(ctx, &accounts, vault_bump, initializer_amount, taker_amount)?;
                info!(escrow = %accounts.escrow, vault = %accounts.vault, "escrow initialized");
            }
            EscrowInstruction::Exchange => {
                let accounts = ExchangeAccounts::from_metas(accounts)?;
                debug!(escrow = %accounts.escrow, taker = %accounts.taker, "exchange");
                self.exchange(ctx, &accounts)?;
                info!(escrow = %accounts.escrow, "escrow exchanged");
            }
            EscrowInstruction::Cancel => {
                let accounts = CancelAccounts::from_metas(accounts)?;
                debug!(escrow = %accounts.escrow, "cancel");
                self.cancel(ctx, &accounts)?;
                info!(escrow = %accounts.escrow, "escrow cancelled");
            }
        }
        Ok(())
    }
}

fn ensure_same(expected: &Identity, found: &Identity) -> Result<()> {
    if expected != found {
        return Err(EscrowError::HoldingMismatch {
            expected: *expected,
            found: *found,
        });
    }
    Ok(())
}
