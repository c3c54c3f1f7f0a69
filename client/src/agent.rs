use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use swapcrow_core::escrow::instruction::{
    self, CancelAccounts, ExchangeAccounts, InitializeEscrowAccounts,
};
use swapcrow_core::escrow::{find_vault, find_vault_authority};
use swapcrow_core::ledger::Instruction;
use swapcrow_core::{Identity, Keypair, Ledger, Receipt, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::interface::{EscrowMetadata, EscrowState, InitializeParams, TakerHoldings};
use crate::Agent;

/// Escrow agent that signs as one party and submits to an in-process ledger.
///
/// The ledger sits behind a mutex; holding it for the whole transaction
/// serializes racing transitions the way a real ledger serializes writes
/// to the same account.
pub struct LocalAgent {
    // Shared ledger
    ledger: Arc<Mutex<Ledger>>,
    // Escrow program the agent targets
    program_id: Identity,
    // Party this agent signs for
    signer: Keypair,
    // Randomly seeded per agent
    nonce: AtomicU64,
}

impl LocalAgent {
    pub fn new(ledger: Arc<Mutex<Ledger>>, program_id: Identity, signer: Keypair) -> Self {
        Self {
            ledger,
            program_id,
            signer,
            nonce: AtomicU64::new(rand::random()),
        }
    }

    pub fn identity(&self) -> Identity {
        self.signer.identity()
    }

    pub fn ledger(&self) -> &Arc<Mutex<Ledger>> {
        &self.ledger
    }

    async fn submit(&self, ix: Instruction, cosigners: &[&Keypair]) -> Result<Receipt> {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut keypairs = vec![&self.signer];
        keypairs.extend_from_slice(cosigners);
        let tx = Transaction::new_signed(vec![ix], nonce, &keypairs)?;

        let receipt = self.ledger.lock().await.process_transaction(&tx)?;
        debug!(sequence = receipt.sequence, signer = %self.signer.identity(), "transaction confirmed");
        Ok(receipt)
    }

    fn check_program(&self, metadata: &EscrowMetadata) -> Result<()> {
        if metadata.program_id != self.program_id {
            return Err(ClientError::ProgramMismatch {
                expected: self.program_id.to_string(),
                found: metadata.program_id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Agent for LocalAgent {
    async fn initialize_escrow(&self, params: &InitializeParams) -> Result<EscrowMetadata> {
        let escrow = Keypair::new();
        let (vault, vault_bump) = find_vault(&self.program_id)?;
        let (vault_authority, _) = find_vault_authority(&self.program_id)?;

        let accounts = InitializeEscrowAccounts {
            initializer: self.signer.identity(),
            vault,
            mint: params.mint,
            initializer_deposit: params.initializer_deposit,
            initializer_receive: params.initializer_receive,
            escrow: escrow.identity(),
        };
        let ix = instruction::initialize_escrow(
            &self.program_id,
            &accounts,
            vault_bump,
            params.initializer_amount,
            params.taker_amount,
        )?;
        self.submit(ix, &[&escrow]).await?;
        info!(escrow = %escrow.identity(), %vault, "Escrow initialized");

        Ok(EscrowMetadata {
            escrow: escrow.identity(),
            program_id: self.program_id,
            vault,
            vault_authority,
            vault_bump,
            initializer: self.signer.identity(),
            initializer_deposit: params.initializer_deposit,
            initializer_receive: params.initializer_receive,
            initializer_amount: params.initializer_amount,
            taker_amount: params.taker_amount,
            state: EscrowState::Active,
        })
    }

    async fn exchange(&self, metadata: &EscrowMetadata, holdings: &TakerHoldings) -> Result<()> {
        self.check_program(metadata)?;
        let accounts = ExchangeAccounts {
            taker: self.signer.identity(),
            taker_deposit: holdings.deposit,
            taker_receive: holdings.receive,
            initializer_deposit: metadata.initializer_deposit,
            initializer_receive: metadata.initializer_receive,
            initializer: metadata.initializer,
            escrow: metadata.escrow,
            vault: metadata.vault,
            vault_authority: metadata.vault_authority,
        };
        self.submit(instruction::exchange(&self.program_id, &accounts)?, &[])
            .await?;
        info!(escrow = %metadata.escrow, taker = %self.signer.identity(), "Escrow exchanged");
        Ok(())
    }

    async fn cancel(&self, metadata: &EscrowMetadata) -> Result<()> {
        self.check_program(metadata)?;
        let accounts = CancelAccounts {
            initializer: self.signer.identity(),
            initializer_deposit: metadata.initializer_deposit,
            vault: metadata.vault,
            vault_authority: metadata.vault_authority,
            escrow: metadata.escrow,
        };
        self.submit(instruction::cancel(&self.program_id, &accounts)?, &[])
            .await?;
        info!(escrow = %metadata.escrow, "Escrow cancelled");
        Ok(())
    }
}
