//! In-memory ledger that executes transactions atomically.
//!
//! A transaction is verified, then every instruction runs against a
//! staged copy of the account store. The stage replaces the committed
//! state only when all instructions succeed; otherwise it is dropped and
//! the error is returned to the submitter.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::asset::{AssetTransfer, Holding, Mint, TokenProgram};
use crate::identity::{Identity, Keypair};
use crate::{EscrowError, Result};

pub mod account;
pub mod transaction;

pub use account::{Account, AccountData, AccountStore, Rent};
pub use transaction::{AccountMeta, Instruction, Message, Signers, Transaction};

/// A program the ledger can dispatch instructions to.
pub trait Program: Send + Sync {
    /// Identity instructions address this program by.
    fn id(&self) -> Identity;

    /// Executes one instruction against the staged accounts.
    fn process(
        &self,
        ctx: &mut InvokeContext<'_>,
        accounts: &[AccountMeta],
        data: &[u8],
    ) -> Result<()>;
}

/// Everything a program sees while it runs one instruction.
pub struct InvokeContext<'a> {
    program_id: Identity,
    accounts: &'a mut AccountStore,
    signers: &'a Signers,
    rent: &'a Rent,
}

impl<'a> InvokeContext<'a> {
    pub fn new(
        program_id: Identity,
        accounts: &'a mut AccountStore,
        signers: &'a Signers,
        rent: &'a Rent,
    ) -> Self {
        Self {
            program_id,
            accounts,
            signers,
            rent,
        }
    }

    pub fn program_id(&self) -> &Identity {
        &self.program_id
    }

    pub fn signers(&self) -> &Signers {
        self.signers
    }

    pub fn accounts(&self) -> &AccountStore {
        &*self.accounts
    }

    /// The transaction's signers plus the identity derived from `seeds`
    /// and `bump` under the running program.
    pub fn signers_with_derived(&self, seeds: &[&[u8]], bump: u8) -> Result<Signers> {
        self.signers.with_derived(seeds, bump, &self.program_id)
    }

    /// The asset-transfer collaborator, bound to the staged accounts.
    pub fn token(&mut self) -> TokenProgram<'_> {
        TokenProgram::new(&mut *self.accounts, self.rent)
    }

    /// Opens an account owned by the running program. Both `payer` and
    /// `address` must be in `signers`.
    pub fn create_program_account(
        &mut self,
        payer: &Identity,
        address: &Identity,
        data: Vec<u8>,
        signers: &Signers,
    ) -> Result<()> {
        signers.authorize(payer)?;
        signers.authorize(address)?;
        self.accounts.create_account(
            payer,
            address,
            self.program_id,
            AccountData::Program(data),
            self.rent,
        )
    }

    /// Closes an account owned by the running program, returning its
    /// lamports to `recipient`.
    pub fn close_program_account(&mut self, address: &Identity, recipient: &Identity) -> Result<u64> {
        let account = self
            .accounts
            .get(address)
            .ok_or(EscrowError::AccountNotFound(*address))?;
        if account.owner != self.program_id {
            return Err(EscrowError::InvalidAccountData(*address));
        }
        self.accounts.close_account(address, recipient)
    }
}

/// Outcome of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Position of the transaction in the ledger's commit order.
    pub sequence: u64,
    pub instructions: usize,
}

/// Serializable view of the committed ledger state.
#[cfg(feature = "json")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub sequence: u64,
    pub rent: Rent,
    pub accounts: AccountStore,
}

pub struct Ledger {
    accounts: AccountStore,
    rent: Rent,
    programs: BTreeMap<Identity, Box<dyn Program>>,
    /// Hashes of every committed message. Unbounded: the ledger lives in
    /// memory for a single run, so replay protection never expires.
    processed: HashSet<[u8; 32]>,
    sequence: u64,
}

impl Ledger {
    pub fn new(rent: Rent) -> Self {
        Self {
            accounts: AccountStore::default(),
            rent,
            programs: BTreeMap::new(),
            processed: HashSet::new(),
            sequence: 0,
        }
    }

    /// Registers `program` under its own identity, replacing any previous one.
    pub fn register(&mut self, program: impl Program + 'static) {
        self.programs.insert(program.id(), Box::new(program));
    }

    pub fn with_program(mut self, program: impl Program + 'static) -> Self {
        self.register(program);
        self
    }

    pub fn rent(&self) -> &Rent {
        &self.rent
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn account(&self, id: &Identity) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn holding(&self, id: &Identity) -> Result<&Holding> {
        self.accounts.holding(id)
    }

    pub fn mint(&self, id: &Identity) -> Result<&Mint> {
        self.accounts.mint(id)
    }

    pub fn lamports(&self, id: &Identity) -> u64 {
        self.accounts.lamports(id)
    }

    /// Number of committed transactions.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn accounts_owned_by<'a>(
        &'a self,
        owner: &'a Identity,
    ) -> impl Iterator<Item = (&'a Identity, &'a Account)> + 'a {
        self.accounts.iter().filter(move |(_, a)| a.owner == *owner)
    }

    /// Executes `tx` as one atomic unit.
    ///
    /// # Errors
    ///
    /// Returns the first failure raised while verifying or executing the
    /// transaction; in that case no account is changed.
    pub fn process_transaction(&mut self, tx: &Transaction) -> Result<Receipt> {
        let hash = tx.message.hash()?;
        if self.processed.contains(&hash) {
            return Err(EscrowError::DuplicateTransaction);
        }
        let signers = tx.verify()?;

        let mut staged = self.accounts.clone();
        for (index, ix) in tx.message.instructions.iter().enumerate() {
            let program = self
                .programs
                .get(&ix.program_id)
                .ok_or(EscrowError::UnknownProgram(ix.program_id))?;

            let before = staged.clone();
            let mut ctx = InvokeContext::new(ix.program_id, &mut staged, &signers, &self.rent);
            let outcome = program
                .process(&mut ctx, &ix.accounts, &ix.data)
                .and_then(|()| before.ensure_writable(&staged, &ix.accounts));
            if let Err(err) = outcome {
                warn!(index, program = %ix.program_id, %err, "instruction failed; transaction rolled back");
                return Err(err);
            }
        }
        debug_assert_eq!(staged.total_lamports(), self.accounts.total_lamports());

        self.accounts = staged;
        self.processed.insert(hash);
        self.sequence += 1;
        debug!(
            sequence = self.sequence,
            instructions = tx.message.instructions.len(),
            "transaction committed"
        );
        Ok(Receipt {
            sequence: self.sequence,
            instructions: tx.message.instructions.len(),
        })
    }

    #[cfg(feature = "json")]
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            sequence: self.sequence,
            rent: self.rent,
            accounts: self.accounts.clone(),
        }
    }

    /// Credits lamports out of thin air. Fixture bootstrap only.
    pub fn airdrop(&mut self, to: &Identity, lamports: u64) -> Result<()> {
        self.accounts.credit_lamports(to, lamports)
    }

    /// Creates a new asset whose supply `authority` controls.
    pub fn create_mint(
        &mut self,
        payer: &Keypair,
        mint: &Keypair,
        authority: &Identity,
        decimals: u8,
    ) -> Result<Identity> {
        let signers = Signers::new([payer.identity(), mint.identity()]);
        self.commit(|token| {
            token.create_mint(&mint.identity(), authority, decimals, &payer.identity(), &signers)
        })
    }

    /// Opens an empty holding of `mint` for `owner` at the address of `holding`.
    pub fn create_holding(
        &mut self,
        payer: &Keypair,
        holding: &Keypair,
        mint: &Identity,
        owner: &Identity,
    ) -> Result<Identity> {
        let signers = Signers::new([payer.identity(), holding.identity()]);
        self.commit(|token| {
            token.create_holding(&holding.identity(), mint, owner, &payer.identity(), &signers)
        })
    }

    /// Issues `amount` of `mint` into `to`, signed by the mint authority.
    pub fn mint_to(
        &mut self,
        authority: &Keypair,
        mint: &Identity,
        to: &Identity,
        amount: u64,
    ) -> Result<()> {
        let signers = Signers::new([authority.identity()]);
        self.commit(|token| token.mint_to(mint, to, amount, &signers))
    }

    fn commit<T>(&mut self, op: impl FnOnce(&mut TokenProgram<'_>) -> Result<T>) -> Result<T> {
        let mut staged = self.accounts.clone();
        let out = op(&mut TokenProgram::new(&mut staged, &self.rent))?;
        self.accounts = staged;
        Ok(out)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(Rent::default())
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("accounts", &self.accounts.len())
            .field("programs", &self.programs.keys().collect::<Vec<_>>())
            .field("sequence", &self.sequence)
            .finish()
    }
}
