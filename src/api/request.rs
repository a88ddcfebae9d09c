//! Update request model and multipart form assembly.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::error::UpdaterError;
use crate::network::Network;

/// How a field value is turned into a form part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Sent as-is.
    Text,
    /// Parsed as JSON and re-serialized; sent verbatim when it does not parse.
    JsonLenient,
    /// Local path whose file content is uploaded.
    FilePath,
}

/// Optional metadata fields accepted by the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UpdateField {
    Name,
    Symbol,
    Description,
    Attributes,
    Royalty,
    Image,
    Data,
    ServiceCharge,
    FeePayerAddress,
}

impl UpdateField {
    pub const ALL: [UpdateField; 9] = [
        UpdateField::Name,
        UpdateField::Symbol,
        UpdateField::Description,
        UpdateField::Attributes,
        UpdateField::Royalty,
        UpdateField::Image,
        UpdateField::Data,
        UpdateField::ServiceCharge,
        UpdateField::FeePayerAddress,
    ];

    /// Multipart field name expected by the API.
    pub fn form_name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Symbol => "symbol",
            Self::Description => "description",
            Self::Attributes => "attributes",
            Self::Royalty => "royalty",
            Self::Image => "image",
            Self::Data => "data",
            Self::ServiceCharge => "service_charge",
            Self::FeePayerAddress => "fee_payer_address",
        }
    }

    /// Key used for this field in batch record files.
    pub fn record_key(&self) -> &'static str {
        match self {
            Self::Image => "imageFilePath",
            other => other.form_name(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Attributes | Self::ServiceCharge => FieldKind::JsonLenient,
            Self::Image | Self::Data => FieldKind::FilePath,
            _ => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for UpdateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.form_name())
    }
}

/// Resolved body of a single form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    /// JSON that parsed, re-serialized compactly.
    Json(String),
    /// JSON that did not parse, sent verbatim.
    RawJson(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    pub name: &'static str,
    pub body: PartBody,
}

/// Record keys that map onto [`UpdateRequest`]'s own fields.
const MANDATORY_KEYS: [&str; 3] = ["network", "token_address", "update_authority_address"];

/// Fields for one NFT update. Optional fields that are unset or empty are never sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub network: Network,
    pub token_address: String,
    pub update_authority_address: String,
    fields: BTreeMap<UpdateField, String>,
}

impl UpdateRequest {
    pub fn new(
        network: Network,
        token_address: impl Into<String>,
        update_authority_address: impl Into<String>,
    ) -> Self {
        Self {
            network,
            token_address: token_address.into(),
            update_authority_address: update_authority_address.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set an optional field. An empty value clears it.
    pub fn set(&mut self, field: UpdateField, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        if value.is_empty() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, value);
        }
        self
    }

    pub fn with(mut self, field: UpdateField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn get(&self, field: UpdateField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Optional fields that will be sent, in form order.
    pub fn fields(&self) -> impl Iterator<Item = (UpdateField, &str)> {
        self.fields.iter().map(|(f, v)| (*f, v.as_str()))
    }

    pub fn fee_payer_address(&self) -> Option<&str> {
        self.get(UpdateField::FeePayerAddress)
    }

    /// Build a request from one record of a batch file.
    pub fn from_record(record: &Value) -> Result<Self, UpdaterError> {
        let obj = record
            .as_object()
            .ok_or_else(|| UpdaterError::Validation("record is not a JSON object".to_string()))?;

        let required = |key: &str| -> Result<String, UpdaterError> {
            match obj.get(key) {
                Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err(UpdaterError::Validation(format!("missing required field '{}'", key))),
            }
        };

        let network = Network::from_str(&required("network")?).map_err(UpdaterError::Validation)?;
        let mut request = Self::new(
            network,
            required("token_address")?,
            required("update_authority_address")?,
        );

        for key in obj.keys() {
            if MANDATORY_KEYS.contains(&key.as_str())
                || UpdateField::ALL.iter().any(|f| f.record_key() == key)
            {
                continue;
            }
            if let Some(field) = UpdateField::ALL
                .iter()
                .find(|f| f.kind() == FieldKind::FilePath && f.form_name() == key)
            {
                return Err(UpdaterError::Validation(format!(
                    "'{}' is not a record field, put the file path in '{}'",
                    key,
                    field.record_key()
                )));
            }
            tracing::warn!(
                token = %request.token_address,
                key = %key,
                "Ignoring unknown record field"
            );
        }

        for field in UpdateField::ALL {
            let value = match obj.get(field.record_key()) {
                None | Some(Value::Null) => continue,
                Some(Value::String(s)) => s.clone(),
                Some(other) => match field.kind() {
                    FieldKind::FilePath => {
                        return Err(UpdaterError::Validation(format!(
                            "'{}' must be a file path string",
                            field.record_key()
                        )))
                    }
                    FieldKind::Text | FieldKind::JsonLenient => other.to_string(),
                },
            };
            request.set(field, value);
        }

        Ok(request)
    }

    /// Resolve every field into its form part. Mandatory fields come first.
    pub fn form_parts(&self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart {
                name: "network",
                body: PartBody::Text(self.network.as_str().to_string()),
            },
            FormPart {
                name: "token_address",
                body: PartBody::Text(self.token_address.clone()),
            },
            FormPart {
                name: "update_authority_address",
                body: PartBody::Text(self.update_authority_address.clone()),
            },
        ];

        for (field, value) in self.fields() {
            let body = match field.kind() {
                FieldKind::Text => PartBody::Text(value.to_string()),
                FieldKind::FilePath => PartBody::File(PathBuf::from(value)),
                FieldKind::JsonLenient => match serde_json::from_str::<Value>(value) {
                    Ok(parsed) => PartBody::Json(parsed.to_string()),
                    Err(e) => {
                        tracing::warn!(
                            field = field.form_name(),
                            error = %e,
                            "Field is not valid JSON, sending raw string"
                        );
                        PartBody::RawJson(value.to_string())
                    }
                },
            };
            parts.push(FormPart {
                name: field.form_name(),
                body,
            });
        }

        parts
    }
}

// ─── Validators ──────────────────────────────────────────────────────────────

/// Blank or valid JSON.
pub fn validate_json(input: &str) -> Result<(), String> {
    if input.trim().is_empty() {
        return Ok(());
    }
    serde_json::from_str::<Value>(input)
        .map(|_| ())
        .map_err(|_| "Invalid JSON format!".to_string())
}

/// Blank or a number between 0 and 100.
pub fn validate_royalty(input: &str) -> Result<(), String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(());
    }
    match input.parse::<f64>() {
        Ok(v) if (0.0..=100.0).contains(&v) => Ok(()),
        _ => Err("Royalty must be a number between 0 and 100".to_string()),
    }
}

/// A base58 Solana address.
pub fn validate_address(input: &str) -> Result<(), String> {
    Pubkey::from_str(input.trim())
        .map(|_| ())
        .map_err(|e| format!("Invalid address: {}", e))
}
