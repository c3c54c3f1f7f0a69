//! JSON inputs and outputs of the client: swap parameters, ledger
//! configuration and escrow metadata.

use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use swapcrow_core::{Identity, Rent};

pub const TEMPLATES_DIR: &str = "templates";

/// Reads JSON-encoded swap params or ledger configs from the given `path`.
pub fn load_input_data<P, T>(path: P) -> anyhow::Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            anyhow::bail!(
                "Input file {:?} not found.
                Copy one from /{} or pass --params/--config explicitly.",
                path,
                TEMPLATES_DIR
            );
        }
        Err(e) => return Err(e).context(format!("opening file {:?}", path)),
    };
    serde_json::from_reader(file).with_context(|| format!("parsing JSON from {:?}", path))
}

/// Writes JSON-encoded `data` to the given `path`,
/// creating parent directories as needed.
pub fn save_metadata<P, T>(path: P, data: &T) -> anyhow::Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    let file = File::create(path).with_context(|| format!("creating file {:?}", path))?;
    serde_json::to_writer_pretty(file, data)
        .with_context(|| format!("serializing to JSON to {:?}", path))
}

/// Terms of a simulated swap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SwapParams {
    /// Units of asset A the initializer locks.
    pub initializer_amount: u64,
    /// Units of asset B the taker must pay.
    pub taker_amount: u64,
    /// Decimals of both mints.
    #[serde(default)]
    pub decimals: u8,
}

/// Rent schedule and funding of a fresh in-memory ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub lamports_per_byte: u64,
    /// Per-account overhead in bytes
    pub account_overhead: u64,
    /// Lamports credited to every party at bootstrap
    pub airdrop_lamports: u64,
}

impl LedgerConfig {
    pub fn rent(&self) -> Rent {
        Rent {
            lamports_per_byte: self.lamports_per_byte,
            account_overhead: self.account_overhead,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lamports_per_byte: Rent::DEFAULT_LAMPORTS_PER_BYTE,
            account_overhead: Rent::DEFAULT_ACCOUNT_OVERHEAD,
            airdrop_lamports: 10_000_000_000,
        }
    }
}

/// Holdings the initializer names when opening an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeParams {
    /// Asset A.
    pub mint: Identity,
    pub initializer_deposit: Identity,
    pub initializer_receive: Identity,
    pub initializer_amount: u64,
    pub taker_amount: u64,
}

/// Holdings the taker pays from and receives into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakerHoldings {
    pub deposit: Identity,
    pub receive: Identity,
}

/// Client-side view of an escrow's lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscrowState {
    Active,
    Exchanged,
    Cancelled,
}

impl fmt::Display for EscrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Exchanged => "exchanged",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Everything needed to later exchange or cancel an escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowMetadata {
    /// Identity of the escrow record.
    pub escrow: Identity,
    pub program_id: Identity,
    pub vault: Identity,
    pub vault_authority: Identity,
    pub vault_bump: u8,
    pub initializer: Identity,
    pub initializer_deposit: Identity,
    pub initializer_receive: Identity,
    pub initializer_amount: u64,
    pub taker_amount: u64,
    pub state: EscrowState,
}
