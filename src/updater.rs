//! `Updater` drives one update, or a batch of them, through the pipeline:
//! request the transaction from the API, sign it locally and submit it.

use std::path::Path;
use std::str::FromStr;

use serde_json::Value;
use solana_pubkey::Pubkey;
use solana_signature::Signature;

use crate::api::{UpdateApi, UpdateApiClient, UpdateRequest};
use crate::config::Config;
use crate::error::{SubmitError, UpdaterError};
use crate::keys::{KeyNormalizer, NormalizedKey};
use crate::tx::{sign_and_submit, FeePayer, RpcSubmitter, TransactionSubmitter};

/// Keys used to sign updates.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Update authority key.
    pub authority: NormalizedKey,
    pub fee_payer: Option<FeePayer>,
}

impl Credentials {
    pub fn new(authority: NormalizedKey) -> Self {
        Self {
            authority,
            fee_payer: None,
        }
    }

    pub fn with_fee_payer(mut self, fee_payer: FeePayer) -> Self {
        self.fee_payer = Some(fee_payer);
        self
    }

    /// Credentials from `PRIVATE_KEY_BASE64` and the optional fee payer settings.
    pub fn from_config(config: &Config, normalizer: &KeyNormalizer) -> Result<Self, UpdaterError> {
        let raw = config.private_key.as_deref().ok_or_else(|| {
            UpdaterError::Config(format!("{} is not set", crate::config::PRIVATE_KEY_BASE64))
        })?;
        let mut credentials = Self::new(normalizer.normalize(raw)?);

        if let (Some(address), Some(key)) = (
            config.fee_payer_address.as_deref(),
            config.fee_payer_private_key.as_deref(),
        ) {
            credentials.fee_payer = Some(FeePayer {
                address: parse_address(address)?,
                key: normalizer.normalize(key)?,
            });
        }
        Ok(credentials)
    }
}

/// Outcome of one batch record.
#[derive(Debug)]
pub struct RecordOutcome {
    /// Zero-based position in the batch file.
    pub index: usize,
    pub token_address: Option<String>,
    pub result: Result<Signature, UpdaterError>,
}

/// Per-record outcomes of a batch run, in file order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Pipeline over an update API and a transaction submitter.
pub struct Updater<A, S> {
    api: A,
    submitter: S,
}

impl Updater<UpdateApiClient, RpcSubmitter> {
    /// Production pipeline: Shyft API client and RPC submitter from `config`.
    pub fn from_config(config: &Config) -> Result<Self, UpdaterError> {
        let api = UpdateApiClient::new(&config.api_url, &config.api_key, config.http_timeout)?;
        Ok(Self::new(api, RpcSubmitter::new(&config.rpc_url)))
    }
}

impl<A: UpdateApi, S: TransactionSubmitter> Updater<A, S> {
    pub fn new(api: A, submitter: S) -> Self {
        Self { api, submitter }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Run one update end to end and return the transaction signature.
    pub async fn update(
        &self,
        request: &UpdateRequest,
        credentials: &Credentials,
    ) -> Result<Signature, UpdaterError> {
        let fee_payer = resolve_fee_payer(request, credentials)?;

        tracing::info!(token = %request.token_address, network = %request.network, "Sending update request");
        let encoded = self.api.request_update(request).await?;
        tracing::info!(token = %request.token_address, "Update request accepted, signing transaction");

        let signature =
            sign_and_submit(&self.submitter, encoded, &credentials.authority, fee_payer.as_ref())
                .await?;
        tracing::info!(token = %request.token_address, %signature, "Transaction submitted");
        Ok(signature)
    }

    /// Process batch records one at a time, in order. A failing record does not stop the run.
    pub async fn update_batch(&self, records: &[Value], credentials: &Credentials) -> BatchReport {
        let mut report = BatchReport::default();

        for (index, record) in records.iter().enumerate() {
            let token_address = record
                .get("token_address")
                .and_then(Value::as_str)
                .map(str::to_string);

            let result = match UpdateRequest::from_record(record) {
                Ok(request) => self.update(&request, credentials).await,
                Err(e) => Err(e),
            };

            match &result {
                Ok(signature) => {
                    tracing::info!(index, token = ?token_address, %signature, "Record updated")
                }
                Err(e) => tracing::error!(index, token = ?token_address, error = %e, "Record failed"),
            }

            report.outcomes.push(RecordOutcome {
                index,
                token_address,
                result,
            });
        }

        tracing::info!(
            total = report.outcomes.len(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch finished"
        );
        report
    }

    /// Read a JSON array of update records from `path` and run them as a batch.
    pub async fn update_from_file(
        &self,
        path: impl AsRef<Path>,
        credentials: &Credentials,
    ) -> Result<BatchReport, UpdaterError> {
        let records = read_batch_file(path).await?;
        Ok(self.update_batch(&records, credentials).await)
    }
}

/// Parse a batch file: a JSON array of record objects.
pub async fn read_batch_file(path: impl AsRef<Path>) -> Result<Vec<Value>, UpdaterError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let records: Vec<Value> = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded batch file");
    Ok(records)
}

/// The fee payer that must sign `request`, if it designates one.
fn resolve_fee_payer(
    request: &UpdateRequest,
    credentials: &Credentials,
) -> Result<Option<FeePayer>, UpdaterError> {
    let Some(address) = request.fee_payer_address() else {
        return Ok(None);
    };
    let address = parse_address(address)?;

    match &credentials.fee_payer {
        Some(fee_payer) if fee_payer.address == address => Ok(Some(fee_payer.clone())),
        _ => Err(SubmitError::MissingFeePayerKey(address.to_string()).into()),
    }
}

fn parse_address(address: &str) -> Result<Pubkey, UpdaterError> {
    Pubkey::from_str(address.trim())
        .map_err(|e| UpdaterError::Validation(format!("invalid address '{}': {}", address, e)))
}
