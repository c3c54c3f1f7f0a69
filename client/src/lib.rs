pub use agent::LocalAgent;
use error::Result;
use interface::{EscrowMetadata, InitializeParams, TakerHoldings};

pub mod agent;
pub mod error;
pub mod index;
pub mod interface;
pub mod scenario;

/// Interface for submitting escrow transitions on behalf of one party.
///
/// Implementors sign with the party's key and return only after the
/// ledger has committed or rejected the transition.
#[async_trait::async_trait]
pub trait Agent: Send + Sync {
    /// Lock the initializer's deposit in a fresh vault
    ///
    /// # Arguments
    /// * `params` - Deposit and receive holdings plus both amounts
    ///
    /// # Returns
    /// Metadata identifying the record, vault and vault authority
    async fn initialize_escrow(&self, params: &InitializeParams) -> Result<EscrowMetadata>;

    /// Pay the initializer and take the vault's contents
    ///
    /// # Preconditions
    /// - Escrow must be active
    /// - `holdings.deposit` must cover `metadata.taker_amount`
    async fn exchange(&self, metadata: &EscrowMetadata, holdings: &TakerHoldings) -> Result<()>;

    /// Return the vault's contents to the initializer
    ///
    /// # Preconditions
    /// - Escrow must be active
    /// - Agent must sign as the stored initializer
    async fn cancel(&self, metadata: &EscrowMetadata) -> Result<()>;
}

/// Client wrapping one party's escrow agent
pub struct SwapcrowClient {
    pub agent: Box<dyn Agent>,
}

impl SwapcrowClient {
    pub fn new(agent: impl Agent + 'static) -> Self {
        Self {
            agent: Box::new(agent),
        }
    }

    pub async fn initialize_escrow(&self, params: &InitializeParams) -> Result<EscrowMetadata> {
        self.agent.initialize_escrow(params).await
    }

    pub async fn exchange(&self, metadata: &EscrowMetadata, holdings: &TakerHoldings) -> Result<()> {
        self.agent.exchange(metadata, holdings).await
    }

    pub async fn cancel(&self, metadata: &EscrowMetadata) -> Result<()> {
        self.agent.cancel(metadata).await
    }
}
