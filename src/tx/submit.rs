//! Submission of signed transactions to a Solana RPC node.

use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcRequest;
use solana_commitment_config::CommitmentConfig;
use solana_signature::Signature;

use crate::error::SubmitError;
use crate::tx::SignedTransaction;

/// Sends a signed transaction to the network.
#[allow(async_fn_in_trait)]
pub trait TransactionSubmitter {
    async fn submit(&self, tx: &SignedTransaction) -> Result<Signature, SubmitError>;
}

/// Submits through JSON-RPC `sendTransaction` with `confirmed` preflight commitment.
pub struct RpcSubmitter {
    pub rpc_client: RpcClient,
}

impl RpcSubmitter {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(
                rpc_url.to_string(),
                CommitmentConfig::confirmed(),
            ),
        }
    }

    pub fn from_rpc_client(rpc_client: RpcClient) -> Self {
        Self { rpc_client }
    }

    pub fn url(&self) -> String {
        self.rpc_client.url()
    }

    fn params(&self, tx: &SignedTransaction) -> Value {
        send_transaction_params(tx.wire(), self.rpc_client.commitment())
    }
}

impl TransactionSubmitter for RpcSubmitter {
    async fn submit(&self, tx: &SignedTransaction) -> Result<Signature, SubmitError> {
        tracing::debug!(
            rpc = %self.rpc_client.url(),
            signer = %tx.signer(),
            wire_len = tx.wire().len(),
            "Submitting transaction"
        );
        let response: String = self
            .rpc_client
            .send(RpcRequest::SendTransaction, self.params(tx))
            .await?;
        Signature::from_str(&response)
            .map_err(|e| SubmitError::InvalidResponse(format!("signature '{}': {}", response, e)))
    }
}

/// `sendTransaction` params for already-serialized wire bytes.
fn send_transaction_params(wire: &[u8], commitment: CommitmentConfig) -> Value {
    json!([
        STANDARD.encode(wire),
        {
            "encoding": "base64",
            "preflightCommitment": commitment.commitment,
        }
    ])
}
