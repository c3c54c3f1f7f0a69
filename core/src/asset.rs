#[cfg(feature = "json")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::identity::{Identity, TOKEN_PROGRAM_ID};
use crate::ledger::{AccountData, AccountStore, Rent, Signers};
use crate::{EscrowError, Result};

pub use crate::derive::create_derived_identity as derive_identity;

/// Definition of a fungible asset.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mint {
    /// Identity allowed to issue new supply.
    pub authority: Identity,
    pub supply: u64,
    pub decimals: u8,
}

impl Mint {
    /// Stored size in bytes.
    pub const LEN: usize = 82;
}

/// Balance of one asset held for one owner.
#[cfg_attr(feature = "json", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holding {
    /// Asset this holding is denominated in.
    pub mint: Identity,
    /// Identity allowed to move the balance out.
    pub owner: Identity,
    pub amount: u64,
}

impl Holding {
    /// Stored size in bytes.
    pub const LEN: usize = 165;
}

/// Asset-transfer capability the escrow program drives.
///
/// Every mutation is checked against a [`Signers`] set; an authority not
/// in the set is rejected with `Unauthorized`.
pub trait AssetTransfer {
    /// Opens an empty holding of `asset` at `address` for `owner`.
    fn create_holding(
        &mut self,
        address: &Identity,
        asset: &Identity,
        owner: &Identity,
        payer: &Identity,
        signers: &Signers,
    ) -> Result<Identity>;

    /// Moves `amount` of `asset` from `from` to `to`, authorized by `authority`.
    fn transfer(
        &mut self,
        asset: &Identity,
        amount: u64,
        from: &Identity,
        to: &Identity,
        authority: &Identity,
        signers: &Signers,
    ) -> Result<()>;

    /// Closes an empty holding and returns its lamports to `recipient`.
    fn close_holding(
        &mut self,
        holding: &Identity,
        recipient: &Identity,
        authority: &Identity,
        signers: &Signers,
    ) -> Result<u64>;
}

/// Token program bound to a set of (possibly staged) accounts.
pub struct TokenProgram<'a> {
    accounts: &'a mut AccountStore,
    rent: &'a Rent,
}

impl<'a> TokenProgram<'a> {
    pub fn new(accounts: &'a mut AccountStore, rent: &'a Rent) -> Self {
        Self { accounts, rent }
    }

    /// Creates a mint with zero supply.
    pub fn create_mint(
        &mut self,
        address: &Identity,
        authority: &Identity,
        decimals: u8,
        payer: &Identity,
        signers: &Signers,
    ) -> Result<Identity> {
        signers.authorize(payer)?;
        signers.authorize(address)?;
        let mint = Mint {
            authority: *authority,
            supply: 0,
            decimals,
        };
        self.accounts.create_account(
            payer,
            address,
            TOKEN_PROGRAM_ID,
            AccountData::Mint(mint),
            self.rent,
        )?;
        Ok(*address)
    }

    /// Issues new supply into `to`; the mint authority must be a signer.
    pub fn mint_to(
        &mut self,
        mint: &Identity,
        to: &Identity,
        amount: u64,
        signers: &Signers,
    ) -> Result<()> {
        if amount == 0 {
            return Err(EscrowError::InvalidAmount);
        }
        let state = *self.accounts.mint(mint)?;
        signers.authorize(&state.authority)?;
        let holding = *self.accounts.holding(to)?;
        if holding.mint != *mint {
            return Err(EscrowError::AssetMismatch {
                expected: *mint,
                found: holding.mint,
            });
        }

        let supply = state.supply.checked_add(amount).ok_or(EscrowError::Overflow)?;
        let balance = holding.amount.checked_add(amount).ok_or(EscrowError::Overflow)?;
        self.accounts.mint_mut(mint)?.supply = supply;
        self.accounts.holding_mut(to)?.amount = balance;
        trace!(%mint, %to, amount, "minted");
        Ok(())
    }

    pub fn balance(&self, holding: &Identity) -> Result<u64> {
        Ok(self.accounts.holding(holding)?.amount)
    }
}

impl AssetTransfer for TokenProgram<'_> {
    fn create_holding(
        &mut self,
        address: &Identity,
        asset: &Identity,
        owner: &Identity,
        payer: &Identity,
        signers: &Signers,
    ) -> Result<Identity> {
        signers.authorize(payer)?;
        signers.authorize(address)?;
        self.accounts.mint(asset)?;
        let holding = Holding {
            mint: *asset,
            owner: *owner,
            amount: 0,
        };
        self.accounts.create_account(
            payer,
            address,
            TOKEN_PROGRAM_ID,
            AccountData::Holding(holding),
            self.rent,
        )?;
        Ok(*address)
    }

    fn transfer(
        &mut self,
        asset: &Identity,
        amount: u64,
        from: &Identity,
        to: &Identity,
        authority: &Identity,
        signers: &Signers,
    ) -> Result<()> {
        let source = *self.accounts.holding(from)?;
        let destination = *self.accounts.holding(to)?;
        for found in [source.mint, destination.mint] {
            if found != *asset {
                return Err(EscrowError::AssetMismatch {
                    expected: *asset,
                    found,
                });
            }
        }
        if source.owner != *authority {
            return Err(EscrowError::Unauthorized);
        }
        signers.authorize(authority)?;
        if source.amount < amount {
            return Err(EscrowError::InsufficientBalance {
                required: amount,
                available: source.amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = destination
            .amount
            .checked_add(amount)
            .ok_or(EscrowError::Overflow)?;
        self.accounts.holding_mut(from)?.amount = source.amount - amount;
        self.accounts.holding_mut(to)?.amount = credited;
        trace!(%asset, %from, %to, amount, "transferred");
        Ok(())
    }

    fn close_holding(
        &mut self,
        holding: &Identity,
        recipient: &Identity,
        authority: &Identity,
        signers: &Signers,
    ) -> Result<u64> {
        let state = *self.accounts.holding(holding)?;
        if state.owner != *authority {
            return Err(EscrowError::Unauthorized);
        }
        signers.authorize(authority)?;
        if state.amount != 0 {
            return Err(EscrowError::NonZeroBalance(state.amount));
        }
        self.accounts.close_account(holding, recipient)
    }
}
