//! # nft-updater
//!
//! Updates Solana NFT metadata through the Shyft update API and signs the
//! returned transaction locally.
//!
//! ## Architecture
//!
//! The crate is one pipeline in three stages:
//!
//! 1. **Keys**: normalize a pasted private key (base58, byte array or base64)
//!    into one canonical form
//! 2. **API**: assemble the multipart update request and fetch the encoded,
//!    partially signed transaction
//! 3. **Tx**: decode, partially sign with the authority or fee payer key and
//!    submit to an RPC node
//!
//! [`Updater`](updater::Updater) runs the stages for a single update or a batch
//! file. The `nft-updater` binary (feature `cli`) adds the interactive prompts.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nft_updater::prelude::*;
//!
//! let config = Config::load(".env")?;
//! let credentials = Credentials::from_config(&config, &KeyNormalizer::default())?;
//! let updater = Updater::from_config(&config)?;
//!
//! let request = UpdateRequest::new(Network::Devnet, token, authority)
//!     .with(UpdateField::Name, "Renamed");
//! let signature = updater.update(&request, &credentials).await?;
//! ```

/// Error types for every stage.
pub mod error;

/// Endpoint constants and the `Network` selector.
pub mod network;

/// Process configuration and the `.env` store.
pub mod config;

/// Private key normalization.
pub mod keys;

/// Update request assembly and the HTTP client.
pub mod api;

/// Transaction decoding, signing and submission.
pub mod tx;

/// End-to-end pipeline and batch processing.
pub mod updater;

pub mod prelude {
    pub use crate::api::{UpdateApi, UpdateApiClient, UpdateField, UpdateRequest};
    pub use crate::config::{Config, EnvFile};
    pub use crate::error::{HttpError, KeyError, SubmitError, UpdaterError, UpdaterResult};
    pub use crate::keys::{normalize_private_key, ArrayPolicy, KeyEncoding, KeyNormalizer, NormalizedKey};
    pub use crate::network::{Network, DEFAULT_API_URL, DEFAULT_RPC_URL};
    pub use crate::tx::{
        EncodedTransaction, FeePayer, RpcSubmitter, SignedTransaction, TransactionSubmitter,
    };
    pub use crate::updater::{BatchReport, Credentials, RecordOutcome, Updater};
}
