//! Client-side registry of escrows.
//!
//! The escrow program keeps no list of its records; anything that wants
//! to enumerate open swaps has to watch the ledger itself. [`EscrowIndex`]
//! remembers the record identities it has seen and resolves their status
//! against the current ledger state on demand.

use std::collections::BTreeSet;

use swapcrow_core::ledger::AccountData;
use swapcrow_core::{EscrowError, EscrowRecord, Identity, Ledger};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowStatus {
    /// Funded and awaiting Exchange or Cancel.
    Active(EscrowRecord),
    /// Exchanged, cancelled, or never existed.
    Resolved,
}

#[derive(Debug, Clone)]
pub struct EscrowIndex {
    program_id: Identity,
    known: BTreeSet<Identity>,
}

impl EscrowIndex {
    pub fn new(program_id: Identity) -> Self {
        Self {
            program_id,
            known: BTreeSet::new(),
        }
    }

    /// Starts tracking `escrow`. Returns `false` if it was already known.
    pub fn track(&mut self, escrow: Identity) -> bool {
        self.known.insert(escrow)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Discovers records owned by the escrow program and returns how many
    /// were not tracked before.
    pub fn scan(&mut self, ledger: &Ledger) -> usize {
        let found: Vec<Identity> = ledger
            .accounts_owned_by(&self.program_id)
            .filter(|(_, account)| match &account.data {
                AccountData::Program(bytes) => EscrowRecord::unpack(bytes).is_ok(),
                _ => false,
            })
            .map(|(id, _)| *id)
            .collect();
        let mut discovered = 0;
        for id in found {
            if self.track(id) {
                discovered += 1;
            }
        }
        discovered
    }

    /// Status of a tracked escrow; `None` if it was never tracked.
    pub fn status(&self, ledger: &Ledger, escrow: &Identity) -> Option<EscrowStatus> {
        if !self.known.contains(escrow) {
            return None;
        }
        let status = match EscrowRecord::load(ledger.accounts(), escrow, &self.program_id) {
            Ok(record) => EscrowStatus::Active(record),
            Err(EscrowError::RecordNotActive) => EscrowStatus::Resolved,
            Err(e) => {
                tracing::warn!(%escrow, %e, "unreadable escrow record");
                EscrowStatus::Resolved
            }
        };
        Some(status)
    }

    /// Tracked escrows that are still active, with their records.
    pub fn active(&self, ledger: &Ledger) -> Vec<(Identity, EscrowRecord)> {
        self.known
            .iter()
            .filter_map(|id| match self.status(ledger, id) {
                Some(EscrowStatus::Active(record)) => Some((*id, record)),
                _ => None,
            })
            .collect()
    }

    /// Stops tracking resolved escrows and returns how many were dropped.
    pub fn prune(&mut self, ledger: &Ledger) -> usize {
        let before = self.known.len();
        let program_id = self.program_id;
        self.known
            .retain(|id| EscrowRecord::load(ledger.accounts(), id, &program_id).is_ok());
        before - self.known.len()
    }
}
