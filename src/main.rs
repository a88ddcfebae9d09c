use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_pubkey::Pubkey;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nft_updater::prelude::*;

mod prompt;

const EXIT_FAILURE: u8 = 1;
const EXIT_PARTIAL: u8 = 2;

#[derive(Parser)]
#[command(name = "nft-updater", version)]
#[command(about = "Update Solana NFT metadata through the Shyft API", long_about = None)]
struct Cli {
    /// Env file holding API_KEY, RPC_NODE and PRIVATE_KEY_BASE64
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Override API_URL
    #[arg(long)]
    api_url: Option<String>,

    /// Override RPC_NODE
    #[arg(long)]
    rpc_url: Option<String>,

    /// Reject key arrays that are not exactly 64 bytes instead of passing them through
    #[arg(long)]
    strict_keys: bool,

    /// Do not write an entered private key back to the env file
    #[arg(long)]
    no_persist_key: bool,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone)]
pub enum Mode {
    /// Update one NFT, prompting for each field
    Single,
    /// Update every record of a JSON array file, one at a time
    Batch { file: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nft_updater=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load(&cli.env_file)?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }
    tracing::debug!(?config, "Configuration loaded");

    let normalizer = KeyNormalizer::new(if cli.strict_keys {
        ArrayPolicy::Strict
    } else {
        ArrayPolicy::Lenient
    });

    prompt::banner();
    let mode = match cli.mode {
        Some(mode) => mode,
        None => prompt::mode()?,
    };
    let updater = Updater::from_config(&config)?;

    match mode {
        Mode::Single => single(&config, &normalizer, &updater, !cli.no_persist_key).await,
        Mode::Batch { file } => batch(&config, &normalizer, &updater, file).await,
    }
}

async fn single(
    config: &Config,
    normalizer: &KeyNormalizer,
    updater: &Updater<UpdateApiClient, RpcSubmitter>,
    persist_key: bool,
) -> Result<ExitCode> {
    let credentials = if prompt::enter_keys_now()? {
        let raw = prompt::private_key()?;
        let authority = normalizer
            .normalize(raw.trim())
            .context("could not decode private key")?;
        if persist_key {
            config.persist_private_key(authority.canonical())?;
        }

        let fee_payer = match prompt::fee_payer_override()? {
            Some((address, key)) => Some(FeePayer {
                address: Pubkey::from_str(address.trim())
                    .with_context(|| format!("invalid fee payer address '{}'", address))?,
                key: normalizer
                    .normalize(key.trim())
                    .context("could not decode fee payer private key")?,
            }),
            None => configured_fee_payer(config, normalizer)?,
        };
        Credentials {
            authority,
            fee_payer,
        }
    } else {
        Credentials::from_config(config, normalizer)?
    };

    let request = prompt::update_request(
        credentials
            .fee_payer
            .as_ref()
            .map(|f| f.address.to_string()),
    )?;

    match updater.update(&request, &credentials).await {
        Ok(signature) => {
            println!("Transaction Signature: {}", signature);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            report_failure(&e);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
    }
}

async fn batch(
    config: &Config,
    normalizer: &KeyNormalizer,
    updater: &Updater<UpdateApiClient, RpcSubmitter>,
    file: PathBuf,
) -> Result<ExitCode> {
    let credentials = Credentials::from_config(config, normalizer)?;
    let report = updater
        .update_from_file(&file, &credentials)
        .await
        .with_context(|| format!("could not read batch file {}", file.display()))?;

    for outcome in &report.outcomes {
        let token = outcome.token_address.as_deref().unwrap_or("<unknown token>");
        match &outcome.result {
            Ok(signature) => println!("[{}] {}: {}", outcome.index + 1, token, signature),
            Err(e) => println!("[{}] {}: FAILED {}", outcome.index + 1, token, e),
        }
    }
    println!("{} succeeded, {} failed", report.succeeded(), report.failed());

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL)
    })
}

fn configured_fee_payer(config: &Config, normalizer: &KeyNormalizer) -> Result<Option<FeePayer>> {
    match (
        config.fee_payer_address.as_deref(),
        config.fee_payer_private_key.as_deref(),
    ) {
        (Some(address), Some(key)) => Ok(Some(FeePayer {
            address: Pubkey::from_str(address)
                .with_context(|| format!("invalid FEE_PAYER_ADDRESS '{}'", address))?,
            key: normalizer
                .normalize(key)
                .context("could not decode FEE_PAYER_PRIVATE_KEY")?,
        })),
        _ => Ok(None),
    }
}

fn report_failure(err: &UpdaterError) {
    eprintln!("Update failed: {}", err);
    if let UpdaterError::RemoteRequestFailed(HttpError::Rejected {
        status,
        headers,
        body,
        ..
    }) = err
    {
        eprintln!("Status: {}", status);
        eprintln!("Headers:");
        for (name, value) in headers {
            eprintln!("  {}: {}", name, value);
        }
        eprintln!("Response: {}", body);
    }
}
