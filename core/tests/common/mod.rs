#![allow(dead_code)]

use swapcrow_core::escrow::instruction::{self, CancelAccounts, ExchangeAccounts, InitializeEscrowAccounts};
use swapcrow_core::escrow::{find_vault, find_vault_authority};
use swapcrow_core::identity::ESCROW_PROGRAM_ID;
use swapcrow_core::ledger::Instruction;
use swapcrow_core::{
    EscrowError, EscrowProgram, Identity, Keypair, Ledger, Receipt, Result, Transaction,
};

pub const LAMPORTS: u64 = 1_000_000_000;

pub fn assert_err<T: std::fmt::Debug>(res: Result<T>, expected: EscrowError) {
    match res {
        Err(e) => assert_eq!(e, expected),
        Ok(v) => panic!("Expected error {expected:?}, got Ok({v:?})"),
    }
}

pub struct Swap {
    pub ledger: Ledger,
    pub initializer: Keypair,
    pub taker: Keypair,
    pub escrow: Keypair,
    pub mint_a: Identity,
    pub mint_b: Identity,
    pub initializer_a: Identity,
    pub initializer_b: Identity,
    pub taker_a: Identity,
    pub taker_b: Identity,
    pub vault: Identity,
    pub vault_bump: u8,
    pub vault_authority: Identity,
    pub nonce: u64,
}

impl Swap {
    pub fn new(initializer_a_balance: u64, taker_b_balance: u64) -> Self {
        let mut ledger = Ledger::default().with_program(EscrowProgram::default());
        let payer = Keypair::new();
        let mint_authority = Keypair::new();
        let initializer = Keypair::new();
        let taker = Keypair::new();
        ledger.airdrop(&payer.identity(), 10 * LAMPORTS).unwrap();
        ledger.airdrop(&initializer.identity(), LAMPORTS).unwrap();

        let mint_a = ledger
            .create_mint(&payer, &Keypair::new(), &mint_authority.identity(), 0)
            .unwrap();
        let mint_b = ledger
            .create_mint(&payer, &Keypair::new(), &mint_authority.identity(), 0)
            .unwrap();
        let mut holding = |mint: &Identity, owner: &Keypair| {
            ledger
                .create_holding(&payer, &Keypair::new(), mint, &owner.identity())
                .unwrap()
        };
        let initializer_a = holding(&mint_a, &initializer);
        let initializer_b = holding(&mint_b, &initializer);
        let taker_a = holding(&mint_a, &taker);
        let taker_b = holding(&mint_b, &taker);

        if initializer_a_balance > 0 {
            ledger
                .mint_to(&mint_authority, &mint_a, &initializer_a, initializer_a_balance)
                .unwrap();
        }
        if taker_b_balance > 0 {
            ledger
                .mint_to(&mint_authority, &mint_b, &taker_b, taker_b_balance)
                .unwrap();
        }

        let (vault, vault_bump) = find_vault(&ESCROW_PROGRAM_ID).unwrap();
        let (vault_authority, _) = find_vault_authority(&ESCROW_PROGRAM_ID).unwrap();
        Self {
            ledger,
            initializer,
            taker,
            escrow: Keypair::new(),
            mint_a,
            mint_b,
            initializer_a,
            initializer_b,
            taker_a,
            taker_b,
            vault,
            vault_bump,
            vault_authority,
            nonce: 0,
        }
    }

    pub fn submit(&mut self, ix: Instruction, keypairs: &[&Keypair]) -> Result<Receipt> {
        self.nonce += 1;
        let tx = Transaction::new_signed(vec![ix], self.nonce, keypairs)?;
        self.ledger.process_transaction(&tx)
    }

    pub fn balance(&self, holding: &Identity) -> u64 {
        self.ledger.holding(holding).map(|h| h.amount).unwrap()
    }

    pub fn init_accounts(&self) -> InitializeEscrowAccounts {
        InitializeEscrowAccounts {
            initializer: self.initializer.identity(),
            vault: self.vault,
            mint: self.mint_a,
            initializer_deposit: self.initializer_a,
            initializer_receive: self.initializer_b,
            escrow: self.escrow.identity(),
        }
    }

    pub fn initialize(&mut self, initializer_amount: u64, taker_amount: u64) -> Result<Receipt> {
        self.initialize_with(self.init_accounts(), initializer_amount, taker_amount)
    }

    pub fn initialize_with(
        &mut self,
        accounts: InitializeEscrowAccounts,
        initializer_amount: u64,
        taker_amount: u64,
    ) -> Result<Receipt> {
        let ix = instruction::initialize_escrow(
            &ESCROW_PROGRAM_ID,
            &accounts,
            self.vault_bump,
            initializer_amount,
            taker_amount,
        )?;
        let (initializer, escrow) = (self.initializer.clone(), self.escrow.clone());
        self.submit(ix, &[&initializer, &escrow])
    }

    pub fn exchange_accounts(&self) -> ExchangeAccounts {
        ExchangeAccounts {
            taker: self.taker.identity(),
            taker_deposit: self.taker_b,
            taker_receive: self.taker_a,
            initializer_deposit: self.initializer_a,
            initializer_receive: self.initializer_b,
            initializer: self.initializer.identity(),
            escrow: self.escrow.identity(),
            vault: self.vault,
            vault_authority: self.vault_authority,
        }
    }

    pub fn exchange_with(&mut self, accounts: ExchangeAccounts) -> Result<Receipt> {
        let ix = instruction::exchange(&ESCROW_PROGRAM_ID, &accounts)?;
        let taker = self.taker.clone();
        self.submit(ix, &[&taker])
    }

    pub fn exchange(&mut self) -> Result<Receipt> {
        self.exchange_with(self.exchange_accounts())
    }

    pub fn cancel_accounts(&self) -> CancelAccounts {
        CancelAccounts {
            initializer: self.initializer.identity(),
            initializer_deposit: self.initializer_a,
            vault: self.vault,
            vault_authority: self.vault_authority,
            escrow: self.escrow.identity(),
        }
    }

    pub fn cancel_with(&mut self, accounts: CancelAccounts, signer: &Keypair) -> Result<Receipt> {
        let ix = instruction::cancel(&ESCROW_PROGRAM_ID, &accounts)?;
        self.submit(ix, &[signer])
    }

    pub fn cancel_by(&mut self, signer: &Keypair) -> Result<Receipt> {
        let accounts = CancelAccounts {
            initializer: signer.identity(),
            ..self.cancel_accounts()
        };
        self.cancel_with(accounts, signer)
    }

    pub fn cancel(&mut self) -> Result<Receipt> {
        let initializer = self.initializer.clone();
        self.cancel_by(&initializer)
    }

    pub fn balances(&self) -> [u64; 4] {
        [
            self.balance(&self.initializer_a),
            self.balance(&self.initializer_b),
            self.balance(&self.taker_a),
            self.balance(&self.taker_b),
        ]
    }

    pub fn is_resolved(&self) -> bool {
        self.ledger.account(&self.vault).is_none()
            && self.ledger.account(&self.escrow.identity()).is_none()
    }
}
