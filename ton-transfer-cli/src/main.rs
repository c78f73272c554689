//! TON Transfer CLI
//!
//! Dispatches a TON transfer through a browser extension provider, a local
//! mnemonic or a wallet deep link.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use num_bigint::BigUint;
use tracing::info;

use ton_transfer::config::SenderConfig;
use ton_transfer::crypto::mnemonic::generate_mnemonic;
use ton_transfer::encoding::cell_from_base64;
use ton_transfer::platform::{NativeMessagingProvider, SystemLinkOpener};
use ton_transfer::transaction::{
    DeepLinkTransactionSender, ExtensionTransactionSender, HttpTonClient, MnemonicTransactionSender,
    StateInit, TransactionDetails, TransactionSender,
};
use ton_transfer::Address;

#[derive(Parser)]
#[command(name = "ton-transfer")]
#[command(about = "Dispatch TON transfers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a transfer
    Send {
        /// Transport used to dispatch the transfer
        #[arg(long, value_enum)]
        via: Via,

        #[command(flatten)]
        transfer: TransferArgs,
    },
    /// Print the deep link for a transfer
    Link {
        #[command(flatten)]
        transfer: TransferArgs,
    },
    /// Print the wallet address of TON_MNEMONIC
    Address,
    /// Generate a new 24-word mnemonic
    GenerateMnemonic,
}

#[derive(Clone, Copy, ValueEnum)]
enum Via {
    Extension,
    Mnemonic,
    DeepLink,
}

#[derive(Args)]
struct TransferArgs {
    /// Destination address, raw or user-friendly
    #[arg(long)]
    to: Address,

    /// Amount in nanotons
    #[arg(long)]
    amount: BigUint,

    /// State init BoC in base64
    #[arg(long)]
    state_init: String,

    /// Message payload BoC in base64
    #[arg(long)]
    payload: Option<String>,
}

impl TransferArgs {
    fn details(&self) -> Result<TransactionDetails> {
        let init_cell = cell_from_base64(&self.state_init).context("Invalid --state-init")?;
        let state_init = StateInit::from_cell(&init_cell).context("--state-init is not a state init")?;

        let mut details = TransactionDetails::new(self.to, self.amount.clone(), state_init);
        if let Some(payload) = &self.payload {
            details.message = Some(cell_from_base64(payload).context("Invalid --payload")?);
        }
        Ok(details)
    }
}

fn mnemonic_from_env() -> Result<String> {
    std::env::var("TON_MNEMONIC").context("TON_MNEMONIC is not set")
}

fn mnemonic_sender(config: &SenderConfig) -> Result<MnemonicTransactionSender<HttpTonClient>> {
    let client = HttpTonClient::new(config.provider_config())?;
    Ok(MnemonicTransactionSender::new(mnemonic_from_env()?, Arc::new(client))
        .with_workchain(config.workchain))
}

fn build_sender(via: Via, config: &SenderConfig) -> Result<Box<dyn TransactionSender>> {
    let sender: Box<dyn TransactionSender> = match via {
        Via::Extension => Box::new(ExtensionTransactionSender::new(Arc::new(
            NativeMessagingProvider::stdout(),
        ))),
        Via::Mnemonic => Box::new(mnemonic_sender(config)?),
        Via::DeepLink => {
            let prefix = config.deep_link_prefix.clone();
            match SystemLinkOpener::detect() {
                Some(opener) => Box::new(DeepLinkTransactionSender::new(prefix, Arc::new(opener))),
                None => Box::new(DeepLinkTransactionSender::without_opener(prefix)),
            }
        }
    };
    Ok(sender)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output and
    // native messaging frames
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with_writer(std::io::stderr)
        .init();

    let config = SenderConfig::from_env()?;

    match cli.command {
        Commands::Send { via, transfer } => {
            let details = transfer.details()?;
            let sender = build_sender(via, &config)?;
            sender.send_transaction(&details).await?;
            info!("Transaction dispatched");
        }
        Commands::Link { transfer } => {
            let details = transfer.details()?;
            let sender = DeepLinkTransactionSender::without_opener(config.deep_link_prefix.clone());
            println!("{}", sender.link(&details)?);
        }
        Commands::Address => {
            let sender = mnemonic_sender(&config)?;
            println!("{}", sender.wallet_address()?);
        }
        Commands::GenerateMnemonic => {
            println!("{}", generate_mnemonic(None)?);
        }
    }

    Ok(())
}
