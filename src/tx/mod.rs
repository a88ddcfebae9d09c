//! Transaction signing and submission.
//!
//! The update API returns a legacy transaction, bincode-serialized and base64
//! encoded, that already carries any signatures the service added. This module
//! decodes it, adds exactly one signature from the selected local key without
//! touching the others, re-serializes it and hands it to a
//! [`TransactionSubmitter`].
//!
//! Every step is single-shot. An [`EncodedTransaction`] is consumed when it is
//! signed; to try again, request a fresh one from the API.

pub mod submit;

pub use submit::{RpcSubmitter, TransactionSubmitter};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Transaction;

use crate::error::{SubmitError, UpdaterError};
use crate::keys::NormalizedKey;

/// Base64 text of an unsigned or partially signed transaction.
#[derive(Debug, PartialEq, Eq)]
pub struct EncodedTransaction(String);

impl EncodedTransaction {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode a transaction the way the update API does.
    pub fn from_transaction(tx: &Transaction) -> Result<Self, UpdaterError> {
        let bytes =
            bincode::serialize(tx).map_err(|e| UpdaterError::MalformedTransaction(e.to_string()))?;
        Ok(Self(STANDARD.encode(bytes)))
    }
}

/// The designated fee payer and the key that must sign for it.
#[derive(Debug, Clone)]
pub struct FeePayer {
    pub address: Pubkey,
    pub key: NormalizedKey,
}

/// A transaction carrying the local signature, ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    transaction: Transaction,
    signer: Pubkey,
    wire: Vec<u8>,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Account whose signature was added locally.
    pub fn signer(&self) -> &Pubkey {
        &self.signer
    }

    /// Serialized wire bytes, as sent to the RPC node.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// The signature added locally.
    pub fn signature(&self) -> Option<&Signature> {
        let index = self
            .transaction
            .message
            .account_keys
            .iter()
            .position(|k| k == &self.signer)?;
        self.transaction.signatures.get(index)
    }
}

/// Deserialize the API's base64 transaction.
pub fn decode_transaction(encoded: &EncodedTransaction) -> Result<Transaction, UpdaterError> {
    let bytes = STANDARD
        .decode(encoded.as_str().trim())
        .map_err(|e| UpdaterError::MalformedTransaction(format!("invalid base64: {}", e)))?;
    let tx: Transaction = bincode::deserialize(&bytes)
        .map_err(|e| UpdaterError::MalformedTransaction(format!("invalid transaction: {}", e)))?;

    let required = tx.message.header.num_required_signatures as usize;
    if tx.signatures.len() != required || tx.message.account_keys.len() < required {
        return Err(UpdaterError::MalformedTransaction(format!(
            "{} signatures for {} required signers",
            tx.signatures.len(),
            required
        )));
    }
    Ok(tx)
}

/// Pick the signing key: the fee payer's when one is designated, otherwise the authority's.
pub fn select_signer(
    authority: &NormalizedKey,
    fee_payer_address: Option<&Pubkey>,
    fee_payer_key: Option<&NormalizedKey>,
) -> Result<Keypair, UpdaterError> {
    let Some(address) = fee_payer_address else {
        return Ok(authority.keypair()?);
    };
    let key = fee_payer_key.ok_or_else(|| SubmitError::MissingFeePayerKey(address.to_string()))?;
    let keypair = key.keypair()?;
    if keypair.pubkey() != *address {
        return Err(SubmitError::FeePayerMismatch {
            expected: address.to_string(),
            actual: keypair.pubkey().to_string(),
        }
        .into());
    }
    Ok(keypair)
}

/// Add `signer`'s signature, leaving signatures already present untouched.
pub fn partial_sign(mut tx: Transaction, signer: &Keypair) -> Result<SignedTransaction, UpdaterError> {
    let blockhash = tx.message.recent_blockhash;
    tx.try_partial_sign(&[signer], blockhash)
        .map_err(SubmitError::from)?;

    // The network rejects anything the fee payer (account 0) has not signed.
    let fee_payer_signed = tx
        .signatures
        .first()
        .is_some_and(|sig| *sig != Signature::default());
    if !fee_payer_signed {
        let fee_payer = tx
            .message
            .account_keys
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();
        return Err(SubmitError::FeePayerUnsigned(fee_payer).into());
    }

    let wire = bincode::serialize(&tx).map_err(|e| SubmitError::Serialize(e.to_string()))?;

    Ok(SignedTransaction {
        transaction: tx,
        signer: signer.pubkey(),
        wire,
    })
}

/// Decode, select the signer and sign. Consumes the encoded transaction.
pub fn sign_encoded_transaction(
    encoded: EncodedTransaction,
    authority: &NormalizedKey,
    fee_payer_address: Option<&Pubkey>,
    fee_payer_key: Option<&NormalizedKey>,
) -> Result<SignedTransaction, UpdaterError> {
    let tx = decode_transaction(&encoded)?;
    let signer = select_signer(authority, fee_payer_address, fee_payer_key)?;
    let signed = partial_sign(tx, &signer)?;
    tracing::debug!(
        signer = %signed.signer(),
        wire_len = signed.wire().len(),
        "Transaction signed"
    );
    Ok(signed)
}

/// Sign and submit in one shot, returning the network's transaction signature.
pub async fn sign_and_submit<S: TransactionSubmitter>(
    submitter: &S,
    encoded: EncodedTransaction,
    authority: &NormalizedKey,
    fee_payer: Option<&FeePayer>,
) -> Result<Signature, UpdaterError> {
    let signed = sign_encoded_transaction(
        encoded,
        authority,
        fee_payer.map(|f| &f.address),
        fee_payer.map(|f| &f.key),
    )?;
    Ok(submitter.submit(&signed).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyEncoding;
    use solana_system_interface::instruction as system_instruction;

    fn key_of(keypair: &Keypair) -> NormalizedKey {
        NormalizedKey::from_bytes(&keypair.to_bytes(), KeyEncoding::Canonical)
    }

    /// Transfer from `authority` paid by `fee_payer`: both must sign.
    fn two_signer_tx(fee_payer: &Keypair, authority: &Keypair) -> Transaction {
        let ix = system_instruction::transfer(&authority.pubkey(), &fee_payer.pubkey(), 1);
        Transaction::new_with_payer(&[ix], Some(&fee_payer.pubkey()))
    }

    fn signed_count(tx: &Transaction) -> usize {
        tx.signatures
            .iter()
            .filter(|s| **s != Signature::default())
            .count()
    }

    #[test]
    fn test_partial_sign_adds_one_signature_and_keeps_existing() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();

        let mut tx = two_signer_tx(&fee_payer, &authority);
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&authority], blockhash).unwrap();
        let before = tx.signatures.clone();
        let encoded = EncodedTransaction::from_transaction(&tx).unwrap();

        let signed = sign_encoded_transaction(
            encoded,
            &key_of(&authority),
            Some(&fee_payer.pubkey()),
            Some(&key_of(&fee_payer)),
        )
        .unwrap();
        let after = &signed.transaction().signatures;

        assert_eq!(signed_count(signed.transaction()), signed_count(&tx) + 1);
        let authority_index = tx
            .message
            .account_keys
            .iter()
            .position(|k| *k == authority.pubkey())
            .unwrap();
        assert_eq!(after[authority_index], before[authority_index]);

        let sig = signed.signature().unwrap();
        assert!(sig.verify(fee_payer.pubkey().as_ref(), &signed.transaction().message_data()));
        assert_eq!(signed.signer(), &fee_payer.pubkey());
    }

    #[test]
    fn test_wire_bytes_match_signed_transaction() {
        let authority = Keypair::new();
        let tx = two_signer_tx(&authority, &authority);
        let encoded = EncodedTransaction::from_transaction(&tx).unwrap();

        let signed = sign_encoded_transaction(encoded, &key_of(&authority), None, None).unwrap();
        let decoded: Transaction = bincode::deserialize(signed.wire()).unwrap();
        assert_eq!(&decoded, signed.transaction());
        assert_eq!(signed_count(&decoded), 1);
    }

    #[test]
    fn test_authority_signs_without_fee_payer() {
        let authority = Keypair::new();
        let tx = two_signer_tx(&authority, &authority);
        let encoded = EncodedTransaction::from_transaction(&tx).unwrap();

        let signed = sign_encoded_transaction(encoded, &key_of(&authority), None, None).unwrap();
        assert_eq!(signed.signer(), &authority.pubkey());
    }

    #[test]
    fn test_wrong_key_fails_to_sign() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();
        let stranger = Keypair::new();
        let encoded =
            EncodedTransaction::from_transaction(&two_signer_tx(&fee_payer, &authority)).unwrap();

        let err = sign_encoded_transaction(encoded, &key_of(&stranger), None, None).unwrap_err();
        assert!(matches!(
            err,
            UpdaterError::SigningOrSubmissionFailed(SubmitError::Signing(_))
        ));
    }

    #[test]
    fn test_unsigned_fee_payer_is_not_submitted() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();
        let encoded =
            EncodedTransaction::from_transaction(&two_signer_tx(&fee_payer, &authority)).unwrap();

        // The authority is a required signer, so signing succeeds, but account 0 stays unsigned.
        let err = sign_encoded_transaction(encoded, &key_of(&authority), None, None).unwrap_err();
        match err {
            UpdaterError::SigningOrSubmissionFailed(SubmitError::FeePayerUnsigned(payer)) => {
                assert_eq!(payer, fee_payer.pubkey().to_string())
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_fee_payer_signed_by_service_is_accepted() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();

        let mut tx = two_signer_tx(&fee_payer, &authority);
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&fee_payer], blockhash).unwrap();
        let encoded = EncodedTransaction::from_transaction(&tx).unwrap();

        let signed = sign_encoded_transaction(encoded, &key_of(&authority), None, None).unwrap();
        assert_eq!(signed.signer(), &authority.pubkey());
        assert_eq!(signed_count(signed.transaction()), 2);
        assert_eq!(signed.transaction().signatures[0], tx.signatures[0]);
    }

    #[test]
    fn test_fee_payer_without_key_is_rejected() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();

        let err = select_signer(&key_of(&authority), Some(&fee_payer.pubkey()), None).unwrap_err();
        assert!(matches!(
            err,
            UpdaterError::SigningOrSubmissionFailed(SubmitError::MissingFeePayerKey(_))
        ));
    }

    #[test]
    fn test_fee_payer_key_must_match_address() {
        let fee_payer = Keypair::new();
        let authority = Keypair::new();

        let err = select_signer(
            &key_of(&authority),
            Some(&fee_payer.pubkey()),
            Some(&key_of(&authority)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            UpdaterError::SigningOrSubmissionFailed(SubmitError::FeePayerMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_transactions() {
        let authority = key_of(&Keypair::new());

        let err = sign_encoded_transaction(EncodedTransaction::new("%%%"), &authority, None, None)
            .unwrap_err();
        assert!(matches!(err, UpdaterError::MalformedTransaction(_)));

        let junk = EncodedTransaction::new(STANDARD.encode([1u8, 2, 3]));
        let err = sign_encoded_transaction(junk, &authority, None, None).unwrap_err();
        assert!(matches!(err, UpdaterError::MalformedTransaction(_)));
    }

    #[test]
    fn test_bad_key_is_reported_as_key_error() {
        let authority = Keypair::new();
        let encoded =
            EncodedTransaction::from_transaction(&two_signer_tx(&authority, &authority)).unwrap();
        let bogus = crate::keys::normalize_private_key("not-a-key").unwrap();

        let err = sign_encoded_transaction(encoded, &bogus, None, None).unwrap_err();
        assert!(matches!(err, UpdaterError::InvalidKeyEncoding(_)));
    }
}
