//! Private key normalization.
//!
//! Users paste secret keys in whatever form their wallet exported them. Every
//! accepted form is normalized to one canonical representation, the standard
//! base64 text of the 64-byte ed25519 secret key, before anything signs with it.
//!
//! Detection order:
//!
//! 1. **Base58** (Phantom export): exactly 88 alphanumeric characters starting
//!    with `2`. A candidate that fails to decode is rejected outright.
//! 2. **Byte array** (`solana-keygen` keypair file): `[n, n, ...]` with 64 bytes.
//!    Arrays of a different length follow the configured [`ArrayPolicy`].
//! 3. **Canonical**: anything else is assumed to already be base64.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_keypair::Keypair;

use crate::error::KeyError;

/// Length of an ed25519 secret key (seed + public key).
pub const SECRET_KEY_LEN: usize = 64;

/// Exact length of a base58-encoded secret key as exported by Phantom.
pub const BASE58_KEY_LEN: usize = 88;

/// Leading character of an 88-character base58 secret key.
pub const BASE58_KEY_PREFIX: char = '2';

/// Encoding the key was supplied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    Base58,
    ByteArray,
    Canonical,
}

/// How to treat a bracketed array whose length is not [`SECRET_KEY_LEN`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArrayPolicy {
    /// Pass the input through unchanged and log a warning.
    #[default]
    Lenient,
    /// Reject with [`KeyError::InvalidLength`].
    Strict,
}

/// A secret key in canonical base64 form.
#[derive(Clone, PartialEq, Eq)]
pub struct NormalizedKey {
    canonical: String,
    source: KeyEncoding,
}

impl NormalizedKey {
    /// Wrap raw secret key bytes.
    pub fn from_bytes(bytes: &[u8], source: KeyEncoding) -> Self {
        Self {
            canonical: STANDARD.encode(bytes),
            source,
        }
    }

    /// Canonical base64 text, as persisted to `PRIVATE_KEY_BASE64`.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    pub fn source(&self) -> KeyEncoding {
        self.source
    }

    pub fn secret_bytes(&self) -> Result<Vec<u8>, KeyError> {
        STANDARD
            .decode(self.canonical.as_bytes())
            .map_err(|e| KeyError::InvalidBase64(e.to_string()))
    }

    pub fn keypair(&self) -> Result<Keypair, KeyError> {
        let bytes = self.secret_bytes()?;
        if bytes.len() != SECRET_KEY_LEN {
            return Err(KeyError::InvalidLength {
                expected: SECRET_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Keypair::try_from(bytes.as_slice()).map_err(|e| KeyError::InvalidKeypair(e.to_string()))
    }
}

impl std::fmt::Debug for NormalizedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NormalizedKey")
            .field("canonical", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Normalizes user-supplied secret keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyNormalizer {
    array_policy: ArrayPolicy,
}

impl KeyNormalizer {
    pub fn new(array_policy: ArrayPolicy) -> Self {
        Self { array_policy }
    }

    pub fn normalize(&self, input: &str) -> Result<NormalizedKey, KeyError> {
        if is_base58_candidate(input) {
            return decode_base58(input);
        }
        if input.starts_with('[') && input.ends_with(']') {
            return self.decode_array(input);
        }
        Ok(NormalizedKey {
            canonical: input.to_string(),
            source: KeyEncoding::Canonical,
        })
    }

    fn decode_array(&self, input: &str) -> Result<NormalizedKey, KeyError> {
        let values: Vec<serde_json::Value> =
            serde_json::from_str(input).map_err(|e| KeyError::InvalidArray(e.to_string()))?;

        if values.len() != SECRET_KEY_LEN {
            return match self.array_policy {
                ArrayPolicy::Strict => Err(KeyError::InvalidLength {
                    expected: SECRET_KEY_LEN,
                    actual: values.len(),
                }),
                ArrayPolicy::Lenient => {
                    tracing::warn!(
                        len = values.len(),
                        expected = SECRET_KEY_LEN,
                        "Key array has unexpected length, using input as-is"
                    );
                    Ok(NormalizedKey {
                        canonical: input.to_string(),
                        source: KeyEncoding::Canonical,
                    })
                }
            };
        }

        let bytes = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_u64()
                    .and_then(|n| u8::try_from(n).ok())
                    .ok_or_else(|| KeyError::InvalidArray(format!("element {} is not a byte: {}", i, v)))
            })
            .collect::<Result<Vec<u8>, _>>()?;

        Ok(NormalizedKey::from_bytes(&bytes, KeyEncoding::ByteArray))
    }
}

/// Normalize with the default (lenient) array policy.
pub fn normalize_private_key(input: &str) -> Result<NormalizedKey, KeyError> {
    KeyNormalizer::default().normalize(input)
}

/// Whether `input` looks like an 88-character base58 secret key.
///
/// Base64 text of a 64-byte key is also 88 characters and may start with `2`,
/// but always ends in `=` padding. Only alphanumeric input is a candidate, so
/// a base58-looking key with a stray `0`, `O`, `I` or `l` still fails to decode
/// instead of passing through.
pub fn is_base58_candidate(input: &str) -> bool {
    input.starts_with(BASE58_KEY_PREFIX)
        && input.len() == BASE58_KEY_LEN
        && input.chars().all(|c| c.is_ascii_alphanumeric())
}

fn decode_base58(input: &str) -> Result<NormalizedKey, KeyError> {
    let bytes = bs58::decode(input)
        .into_vec()
        .map_err(|e| KeyError::InvalidBase58(e.to_string()))?;
    if bytes.len() != SECRET_KEY_LEN {
        return Err(KeyError::InvalidLength {
            expected: SECRET_KEY_LEN,
            actual: bytes.len(),
        });
    }
    Ok(NormalizedKey::from_bytes(&bytes, KeyEncoding::Base58))
}
