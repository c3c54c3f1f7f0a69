//! Bootstraps a fresh in-memory ledger with two parties, two assets and
//! the holdings a swap needs.

use std::sync::Arc;

use serde::Serialize;
use swapcrow_core::identity::ESCROW_PROGRAM_ID;
use swapcrow_core::{EscrowProgram, Identity, Keypair, Ledger};
use tokio::sync::Mutex;

use crate::agent::LocalAgent;
use crate::error::Result;
use crate::interface::{InitializeParams, LedgerConfig, SwapParams, TakerHoldings};

/// Token balances of both parties, in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub initializer_a: u64,
    pub initializer_b: u64,
    pub taker_a: u64,
    pub taker_b: u64,
}

pub struct Scenario {
    pub ledger: Arc<Mutex<Ledger>>,
    pub program_id: Identity,
    pub params: SwapParams,
    pub initializer: Keypair,
    pub taker: Keypair,
    pub mint_a: Identity,
    pub mint_b: Identity,
    pub initializer_a: Identity,
    pub initializer_b: Identity,
    pub taker_a: Identity,
    pub taker_b: Identity,
}

impl Scenario {
    /// Funds the initializer with `initializer_amount` of asset A and the
    /// taker with `taker_amount` of asset B.
    pub fn bootstrap(params: SwapParams, config: &LedgerConfig) -> Result<Self> {
        let program_id = ESCROW_PROGRAM_ID;
        let mut ledger = Ledger::new(config.rent()).with_program(EscrowProgram::new(program_id));

        let payer = Keypair::new();
        let mint_authority = Keypair::new();
        let initializer = Keypair::new();
        let taker = Keypair::new();
        for party in [&payer, &initializer, &taker] {
            ledger.airdrop(&party.identity(), config.airdrop_lamports)?;
        }

        let decimals = params.decimals;
        let mint_a = ledger.create_mint(&payer, &Keypair::new(), &mint_authority.identity(), decimals)?;
        let mint_b = ledger.create_mint(&payer, &Keypair::new(), &mint_authority.identity(), decimals)?;

        let mut open = |mint: &Identity, owner: &Keypair| {
            ledger.create_holding(&payer, &Keypair::new(), mint, &owner.identity())
        };
        let initializer_a = open(&mint_a, &initializer)?;
        let initializer_b = open(&mint_b, &initializer)?;
        let taker_a = open(&mint_a, &taker)?;
        let taker_b = open(&mint_b, &taker)?;

        ledger.mint_to(&mint_authority, &mint_a, &initializer_a, params.initializer_amount)?;
        ledger.mint_to(&mint_authority, &mint_b, &taker_b, params.taker_amount)?;

        Ok(Self {
            ledger: Arc::new(Mutex::new(ledger)),
            program_id,
            params,
            initializer,
            taker,
            mint_a,
            mint_b,
            initializer_a,
            initializer_b,
            taker_a,
            taker_b,
        })
    }

    pub fn initializer_agent(&self) -> LocalAgent {
        LocalAgent::new(self.ledger.clone(), self.program_id, self.initializer.clone())
    }

    pub fn taker_agent(&self) -> LocalAgent {
        LocalAgent::new(self.ledger.clone(), self.program_id, self.taker.clone())
    }

    pub fn initialize_params(&self) -> InitializeParams {
        InitializeParams {
            mint: self.mint_a,
            initializer_deposit: self.initializer_a,
            initializer_receive: self.initializer_b,
            initializer_amount: self.params.initializer_amount,
            taker_amount: self.params.taker_amount,
        }
    }

    pub fn taker_holdings(&self) -> TakerHoldings {
        TakerHoldings {
            deposit: self.taker_b,
            receive: self.taker_a,
        }
    }

    pub async fn balances(&self) -> Result<Balances> {
        let ledger = self.ledger.lock().await;
        let amount = |id: &Identity| ledger.holding(id).map(|h| h.amount);
        Ok(Balances {
            initializer_a: amount(&self.initializer_a)?,
            initializer_b: amount(&self.initializer_b)?,
            taker_a: amount(&self.taker_a)?,
            taker_b: amount(&self.taker_b)?,
        })
    }
}
