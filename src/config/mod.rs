//! Process configuration, built once at startup and passed by reference.

pub mod env_file;

pub use env_file::EnvFile;

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::UpdaterError;
use crate::network::{DEFAULT_API_URL, DEFAULT_RPC_URL};

pub const API_KEY: &str = "API_KEY";
pub const API_URL: &str = "API_URL";
pub const RPC_NODE: &str = "RPC_NODE";
pub const PRIVATE_KEY_BASE64: &str = "PRIVATE_KEY_BASE64";
pub const FEE_PAYER_ADDRESS: &str = "FEE_PAYER_ADDRESS";
pub const FEE_PAYER_PRIVATE_KEY: &str = "FEE_PAYER_PRIVATE_KEY";
pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings read from the environment (and the `.env` file).
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub rpc_url: String,
    /// Raw private key as stored; normalized before use.
    pub private_key: Option<String>,
    pub fee_payer_address: Option<String>,
    pub fee_payer_private_key: Option<String>,
    /// `None` disables the client-side timeout.
    pub http_timeout: Option<Duration>,
    /// `.env` file the private key is persisted to.
    pub env_path: PathBuf,
}

impl Config {
    /// Load `env_path` into the process environment (if present) and read settings.
    pub fn load(env_path: impl AsRef<Path>) -> Result<Self, UpdaterError> {
        let env_path = env_path.as_ref();
        match dotenvy::from_path(env_path) {
            Ok(()) => tracing::debug!(path = %env_path.display(), "Loaded env file"),
            Err(e) if e.not_found() => {
                tracing::debug!(path = %env_path.display(), "No env file, using process environment")
            }
            Err(e) => return Err(UpdaterError::Config(format!("{}: {}", env_path.display(), e))),
        }
        Self::from_lookup(env_path, |name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(env_path: impl AsRef<Path>, lookup: F) -> Result<Self, UpdaterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get(API_KEY)
            .ok_or_else(|| UpdaterError::Config(format!("{} is not set", API_KEY)))?;

        let http_timeout = match get(HTTP_TIMEOUT_SECS) {
            None => Some(DEFAULT_HTTP_TIMEOUT),
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => None,
                Ok(secs) => Some(Duration::from_secs(secs)),
                Err(_) => {
                    return Err(UpdaterError::Config(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        HTTP_TIMEOUT_SECS, raw
                    )))
                }
            },
        };

        let fee_payer_address = get(FEE_PAYER_ADDRESS);
        let fee_payer_private_key = get(FEE_PAYER_PRIVATE_KEY);
        if fee_payer_address.is_some() != fee_payer_private_key.is_some() {
            return Err(UpdaterError::Config(format!(
                "{} and {} must be set together",
                FEE_PAYER_ADDRESS, FEE_PAYER_PRIVATE_KEY
            )));
        }

        Ok(Self {
            api_key,
            api_url: get(API_URL).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            rpc_url: get(RPC_NODE).unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            private_key: get(PRIVATE_KEY_BASE64),
            fee_payer_address,
            fee_payer_private_key,
            http_timeout,
            env_path: env_path.as_ref().to_path_buf(),
        })
    }

    /// Write a normalized private key back to the `.env` file.
    pub fn persist_private_key(&self, canonical: &str) -> Result<(), UpdaterError> {
        let mut env = EnvFile::load(&self.env_path)?;
        env.upsert(PRIVATE_KEY_BASE64, canonical);
        env.save()?;
        tracing::info!(path = %self.env_path.display(), "Saved private key to env file");
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("rpc_url", &self.rpc_url)
            .field("has_private_key", &self.private_key.is_some())
            .field("fee_payer_address", &self.fee_payer_address)
            .field("http_timeout", &self.http_timeout)
            .field("env_path", &self.env_path)
            .finish_non_exhaustive()
    }
}
