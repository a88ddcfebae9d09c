//! Endpoint constants and the Solana cluster selector sent with each update.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default update API base URL.
pub const DEFAULT_API_URL: &str = "https://api.shyft.to";

/// Path of the NFT update endpoint, relative to the API base URL.
pub const UPDATE_PATH: &str = "/sol/v2/nft/update";

/// Default Solana RPC endpoint.
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Solana cluster the token lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Testnet,
    Devnet,
    MainnetBeta,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Testnet, Network::Devnet, Network::MainnetBeta];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Testnet => "testnet",
            Self::Devnet => "devnet",
            Self::MainnetBeta => "mainnet-beta",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "testnet" => Ok(Self::Testnet),
            "devnet" => Ok(Self::Devnet),
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            other => Err(format!(
                "unknown network '{}' (expected testnet, devnet or mainnet-beta)",
                other
            )),
        }
    }
}
