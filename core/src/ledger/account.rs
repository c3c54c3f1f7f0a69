//! Durable account state and the rent that backs it.

use std::collections::BTreeMap;

#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};

use crate::asset::{Holding, Mint};
use crate::identity::{Identity, SYSTEM_PROGRAM_ID, TOKEN_PROGRAM_ID};
use crate::ledger::AccountMeta;
use crate::{EscrowError, Result};

/// Typed contents of an account.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(tag = "kind", content = "data", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountData {
    /// Plain lamport account.
    Empty,
    /// Asset definition.
    Mint(Mint),
    /// Balance of one asset held for one owner.
    Holding(Holding),
    /// Raw bytes owned by a program.
    Program(#[cfg_attr(feature = "json", serde(with = "hex::serde"))] Vec<u8>),
}

impl AccountData {
    /// Stored size in bytes; drives the rent charged at creation.
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Mint(_) => Mint::LEN,
            Self::Holding(_) => Holding::LEN,
            Self::Program(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    /// Backing resource; returned to a designated recipient on close.
    pub lamports: u64,
    /// Program allowed to interpret and mutate `data`.
    pub owner: Identity,
    pub data: AccountData,
}

/// Storage-deposit schedule.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rent {
    pub lamports_per_byte: u64,
    /// Fixed per-account overhead in bytes.
    pub account_overhead: u64,
}

impl Rent {
    pub const DEFAULT_LAMPORTS_PER_BYTE: u64 = 6960;
    pub const DEFAULT_ACCOUNT_OVERHEAD: u64 = 128;

    /// Lamports an account with `data_len` bytes must hold.
    pub fn minimum_balance(&self, data_len: usize) -> u64 {
        self.account_overhead
            .saturating_add(data_len as u64)
            .saturating_mul(self.lamports_per_byte)
    }
}

impl Default for Rent {
    fn default() -> Self {
        Self {
            lamports_per_byte: Self::DEFAULT_LAMPORTS_PER_BYTE,
            account_overhead: Self::DEFAULT_ACCOUNT_OVERHEAD,
        }
    }
}

/// All accounts known to the ledger, ordered by identity.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "json", serde(transparent))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStore {
    accounts: BTreeMap<Identity, Account>,
}

impl AccountStore {
    pub fn get(&self, id: &Identity) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn contains(&self, id: &Identity) -> bool {
        self.accounts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Identity, &Account)> {
        self.accounts.iter()
    }

    /// Lamports held by `id`; zero for unknown accounts.
    pub fn lamports(&self, id: &Identity) -> u64 {
        self.accounts.get(id).map_or(0, |a| a.lamports)
    }

    /// Sum of all lamports; conserved by every transaction.
    pub fn total_lamports(&self) -> u128 {
        self.accounts.values().map(|a| a.lamports as u128).sum()
    }

    pub fn holding(&self, id: &Identity) -> Result<&Holding> {
        match self.get(id) {
            None => Err(EscrowError::AccountNotFound(*id)),
            Some(Account {
                owner,
                data: AccountData::Holding(h),
                ..
            }) if *owner == TOKEN_PROGRAM_ID => Ok(h),
            Some(_) => Err(EscrowError::InvalidAccountData(*id)),
        }
    }

    pub(crate) fn holding_mut(&mut self, id: &Identity) -> Result<&mut Holding> {
        match self.accounts.get_mut(id) {
            None => Err(EscrowError::AccountNotFound(*id)),
            Some(Account {
                owner,
                data: AccountData::Holding(h),
                ..
            }) if *owner == TOKEN_PROGRAM_ID => Ok(h),
            Some(_) => Err(EscrowError::InvalidAccountData(*id)),
        }
    }

    pub fn mint(&self, id: &Identity) -> Result<&Mint> {
        match self.get(id) {
            None => Err(EscrowError::AccountNotFound(*id)),
            Some(Account {
                owner,
                data: AccountData::Mint(m),
                ..
            }) if *owner == TOKEN_PROGRAM_ID => Ok(m),
            Some(_) => Err(EscrowError::InvalidAccountData(*id)),
        }
    }

    pub(crate) fn mint_mut(&mut self, id: &Identity) -> Result<&mut Mint> {
        match self.accounts.get_mut(id) {
            None => Err(EscrowError::AccountNotFound(*id)),
            Some(Account {
                owner,
                data: AccountData::Mint(m),
                ..
            }) if *owner == TOKEN_PROGRAM_ID => Ok(m),
            Some(_) => Err(EscrowError::InvalidAccountData(*id)),
        }
    }

    /// Credits `lamports` to `id`, opening a system account if needed.
    pub(crate) fn credit_lamports(&mut self, id: &Identity, lamports: u64) -> Result<()> {
        let account = self.accounts.entry(*id).or_insert_with(|| Account {
            lamports: 0,
            owner: SYSTEM_PROGRAM_ID,
            data: AccountData::Empty,
        });
        account.lamports = account
            .lamports
            .checked_add(lamports)
            .ok_or(EscrowError::Overflow)?;
        Ok(())
    }

    pub(crate) fn debit_lamports(&mut self, id: &Identity, lamports: u64) -> Result<()> {
        let available = self.lamports(id);
        if available < lamports {
            return Err(EscrowError::InsufficientLamports {
                required: lamports,
                available,
            });
        }
        if let Some(account) = self.accounts.get_mut(id) {
            account.lamports = available - lamports;
        }
        Ok(())
    }

    /// Opens `address` with `data`, funded by `payer` at the rent-exempt
    /// minimum. Authorization is the caller's responsibility.
    pub(crate) fn create_account(
        &mut self,
        payer: &Identity,
        address: &Identity,
        owner: Identity,
        data: AccountData,
        rent: &Rent,
    ) -> Result<()> {
        if self.contains(address) {
            return Err(EscrowError::AccountInUse(*address));
        }
        let lamports = rent.minimum_balance(data.len());
        self.debit_lamports(payer, lamports)?;
        self.accounts.insert(
            *address,
            Account {
                lamports,
                owner,
                data,
            },
        );
        Ok(())
    }

    /// Removes `address` and hands its lamports to `recipient`.
    pub(crate) fn close_account(&mut self, address: &Identity, recipient: &Identity) -> Result<u64> {
        let account = self
            .accounts
            .remove(address)
            .ok_or(EscrowError::AccountNotFound(*address))?;
        self.credit_lamports(recipient, account.lamports)?;
        Ok(account.lamports)
    }

    /// Fails if any account changed between `self` and `after` without
    /// being marked writable in `metas`.
    pub(crate) fn ensure_writable(&self, after: &AccountStore, metas: &[AccountMeta]) -> Result<()> {
        let writable = |id: &Identity| metas.iter().any(|m| m.identity == *id && m.is_writable);
        let changed = self
            .accounts
            .keys()
            .chain(after.accounts.keys())
            .find(|&&id| self.get(&id) != after.get(&id) && !writable(&id));
        match changed {
            Some(id) => Err(EscrowError::ReadonlyModified(*id)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Keypair;
    use crate::utils::assert_err;

    #[test]
    fn rent_minimum_balance() {
        let rent = Rent::default();
        assert_eq!(rent.minimum_balance(0), 128 * 6960);
        assert_eq!(rent.minimum_balance(Holding::LEN), (128 + 165) * 6960);
    }

    #[test]
    fn create_and_close_moves_lamports() {
        let rent = Rent::default();
        let payer = Keypair::from_seed([1; 32]).identity();
        let address = Keypair::from_seed([2; 32]).identity();
        let mut store = AccountStore::default();
        store.credit_lamports(&payer, 10_000_000).unwrap();

        let data = AccountData::Program(vec![0; 10]);
        store
            .create_account(&payer, &address, SYSTEM_PROGRAM_ID, data.clone(), &rent)
            .unwrap();
        let cost = rent.minimum_balance(10);
        assert_eq!(store.lamports(&payer), 10_000_000 - cost);
        assert_eq!(store.lamports(&address), cost);

        assert_err(
            store.create_account(&payer, &address, SYSTEM_PROGRAM_ID, data, &rent),
            EscrowError::AccountInUse(address),
        );

        assert_eq!(store.close_account(&address, &payer).unwrap(), cost);
        assert!(!store.contains(&address));
        assert_eq!(store.lamports(&payer), 10_000_000);
    }

    #[test]
    fn create_requires_rent() {
        let payer = Keypair::from_seed([1; 32]).identity();
        let address = Keypair::from_seed([2; 32]).identity();
        let mut store = AccountStore::default();
        store.credit_lamports(&payer, 5).unwrap();
        let res = store.create_account(
            &payer,
            &address,
            SYSTEM_PROGRAM_ID,
            AccountData::Empty,
            &Rent::default(),
        );
        assert!(matches!(
            res,
            Err(EscrowError::InsufficientLamports { available: 5, .. })
        ));
        assert_eq!(store.lamports(&payer), 5);
    }

    #[test]
    fn readonly_changes_are_detected() {
        let id = Keypair::from_seed([3; 32]).identity();
        let before = AccountStore::default();
        let mut after = before.clone();
        after.credit_lamports(&id, 1).unwrap();

        assert_err(
            before.ensure_writable(&after, &[AccountMeta::new_readonly(id, false)]),
            EscrowError::ReadonlyModified(id),
        );
        assert!(before
            .ensure_writable(&after, &[AccountMeta::new(id, false)])
            .is_ok());
    }
}
