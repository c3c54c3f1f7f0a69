use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use swapcrow_client::index::{EscrowIndex, EscrowStatus};
use swapcrow_client::interface::{
    load_input_data, save_metadata, EscrowState, LedgerConfig, SwapParams,
};
use swapcrow_client::scenario::Scenario;
use swapcrow_client::SwapcrowClient;
use swapcrow_core::escrow::{find_vault, find_vault_authority};
use swapcrow_core::identity::ESCROW_PROGRAM_ID;
use swapcrow_core::Identity;
use tracing_subscriber::EnvFilter;

const DEFAULT_SWAP_PARAMS_PATH: &str = "./templates/swap_params.json";
const DEFAULT_LEDGER_CONFIG_PATH: &str = "./templates/ledger_config.json";
const DEFAULT_ESCROW_METADATA_PATH: &str = "./escrow_metadata.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Derive { program_id } => {
            let (vault, vault_bump) = find_vault(&program_id)?;
            let (authority, authority_bump) = find_vault_authority(&program_id)?;
            println!("program_id:      {program_id}");
            println!("vault:           {vault} (bump {vault_bump})");
            println!("vault_authority: {authority} (bump {authority_bump})");
        }
        Commands::Simulate {
            params,
            config,
            path,
            outfile,
        } => {
            let params: SwapParams = load_input_data(&params)?;
            let config: LedgerConfig = load_input_data(&config)?;

            let scenario = Scenario::bootstrap(params, &config)?;
            tracing::info!(balances = ?scenario.balances().await?, "Ledger bootstrapped");

            let initializer = SwapcrowClient::new(scenario.initializer_agent());
            let mut metadata = initializer
                .initialize_escrow(&scenario.initialize_params())
                .await?;
            tracing::info!(balances = ?scenario.balances().await?, "Escrow initialized");

            let mut index = EscrowIndex::new(scenario.program_id);
            let discovered = index.scan(&*scenario.ledger.lock().await);
            tracing::info!(discovered, "Indexed active escrows");

            match path {
                Resolution::Exchange => {
                    let taker = SwapcrowClient::new(scenario.taker_agent());
                    taker.exchange(&metadata, &scenario.taker_holdings()).await?;
                    metadata.state = EscrowState::Exchanged;
                }
                Resolution::Cancel => {
                    initializer.cancel(&metadata).await?;
                    metadata.state = EscrowState::Cancelled;
                }
            }
            tracing::info!(balances = ?scenario.balances().await?, state = %metadata.state, "Escrow resolved");

            let status = index.status(&*scenario.ledger.lock().await, &metadata.escrow);
            if status != Some(EscrowStatus::Resolved) {
                anyhow::bail!("escrow {} still active after {}", metadata.escrow, metadata.state);
            }

            save_metadata(&outfile, &metadata)?;
            tracing::info!(outfile = ?outfile, "Escrow metadata saved");
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "swapcrow-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Resolution {
    Exchange,
    Cancel,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the vault and vault-authority identities of a program
    Derive {
        #[arg(short = 'i', long, default_value_t = ESCROW_PROGRAM_ID)]
        program_id: Identity,
    },
    /// Run a full swap on a fresh in-memory ledger
    Simulate {
        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_SWAP_PARAMS_PATH,
            value_hint = ValueHint::FilePath)]
        params: PathBuf,

        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_LEDGER_CONFIG_PATH,
            value_hint = ValueHint::FilePath)]
        config: PathBuf,

        #[arg(long, value_enum, default_value_t = Resolution::Exchange)]
        path: Resolution,

        #[arg(short, long,
            value_parser,
            default_value = DEFAULT_ESCROW_METADATA_PATH,
            value_hint = ValueHint::FilePath)]
        outfile: PathBuf,
    },
}
