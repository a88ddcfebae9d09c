//! Error types for every pipeline stage.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level updater error. Each variant names the stage that failed.
#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Invalid key encoding: {0}")]
    InvalidKeyEncoding(#[from] KeyError),

    #[error("Remote request failed: {0}")]
    RemoteRequestFailed(#[from] HttpError),

    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("Signing or submission failed: {0}")]
    SigningOrSubmissionFailed(#[from] SubmitError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Private key decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("not a valid base58 key: {0}")]
    InvalidBase58(String),

    #[error("expected {expected} key bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("not a valid byte array: {0}")]
    InvalidArray(String),

    #[error("not valid base64: {0}")]
    InvalidBase64(String),

    #[error("not a valid ed25519 keypair: {0}")]
    InvalidKeypair(String),
}

/// Update API errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Could not read {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server rejected update with status {status}: {}", message.as_deref().unwrap_or(body))]
    Rejected {
        status: u16,
        message: Option<String>,
        headers: Vec<(String, String)>,
        body: String,
    },

    #[error("Response did not contain an encoded transaction")]
    MissingEncodedTransaction,
}

/// Signing and RPC submission errors.
#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("fee payer {0} designated but no fee payer key was provided")]
    MissingFeePayerKey(String),

    #[error("fee payer key belongs to {actual}, expected {expected}")]
    FeePayerMismatch { expected: String, actual: String },

    #[error("fee payer {0} has not signed the transaction")]
    FeePayerUnsigned(String),

    #[error("signing failed: {0}")]
    Signing(#[from] solana_signer::SignerError),

    #[error("could not serialize signed transaction: {0}")]
    Serialize(String),

    #[error("RPC error: {0}")]
    Rpc(Box<solana_client::client_error::ClientError>),

    #[error("unexpected RPC response: {0}")]
    InvalidResponse(String),
}

impl From<solana_client::client_error::ClientError> for SubmitError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(Box::new(err))
    }
}

pub type UpdaterResult<T> = Result<T, UpdaterError>;
