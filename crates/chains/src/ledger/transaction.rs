//! Ledger transaction building and signing.
//!
//! A vote is carried as a zero-value transaction from the submitting
//! account to itself, with the canonical vote payload in the data field.
//! Signing is local; the key never leaves the process.

use k256::ecdsa::signature::{Signer, Verifier};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use common::{VoteAnchorError, VotePayload};

/// Length of the account identifier in bytes (hex-encoded on the wire).
const ACCOUNT_BYTES: usize = 20;

/// An unsigned transaction, ready for signing.
///
/// The bincode encoding of this struct is the signing preimage, so field
/// order is part of the wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Destination account (the submitting account itself for votes).
    pub to: String,
    /// Value transferred; always zero for a vote carrier.
    pub value: u64,
    /// Payload bytes recorded on the ledger.
    pub data: Vec<u8>,
    /// Current transaction count of the signing account.
    pub nonce: u64,
    /// Gas limit.
    pub gas: u64,
    /// Gas price in wei.
    pub gas_price: u64,
    /// Chain identifier, bound into the signature.
    pub chain_id: u64,
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub tx: UnsignedTransaction,
    /// 64-byte compact ECDSA signature.
    pub signature: Vec<u8>,
    /// 33-byte compressed SEC1 public key of the signer.
    pub public_key: Vec<u8>,
}

impl SignedTransaction {
    /// Serialized broadcast form.
    pub fn raw_bytes(&self) -> Result<Vec<u8>, VoteAnchorError> {
        bincode::serialize(self).map_err(|e| VoteAnchorError::Serialization(e.to_string()))
    }

    /// Hex broadcast form with `0x` prefix.
    pub fn raw_hex(&self) -> Result<String, VoteAnchorError> {
        Ok(format!("0x{}", hex::encode(self.raw_bytes()?)))
    }

    /// Transaction identifier: SHA-256 of the raw bytes, hex with `0x`
    /// prefix. The node derives the same identifier from the broadcast
    /// form.
    pub fn id(&self) -> Result<String, VoteAnchorError> {
        let digest = Sha256::digest(self.raw_bytes()?);
        Ok(format!("0x{}", hex::encode(digest)))
    }
}

/// Build the unsigned vote-carrier transaction: a zero-value self-transfer
/// with the payload in the data field.
pub fn build_vote_transaction(
    account: &str,
    payload: &VotePayload,
    nonce: u64,
    gas: u64,
    gas_price: u64,
    chain_id: u64,
) -> UnsignedTransaction {
    UnsignedTransaction {
        to: account.to_string(),
        value: 0,
        data: payload.as_bytes().to_vec(),
        nonce,
        gas,
        gas_price,
        chain_id,
    }
}

/// Holds the signing key and derives the submitting account from it.
pub struct TransactionSigner {
    key: SigningKey,
    account: String,
}

impl TransactionSigner {
    /// Create a signer from a hex-encoded 32-byte secret key.
    pub fn from_hex(secret_hex: &str) -> Result<Self, VoteAnchorError> {
        let bytes = hex::decode(secret_hex.trim_start_matches("0x"))
            .map_err(|e| VoteAnchorError::Configuration(format!("invalid signing key: {}", e)))?;
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| VoteAnchorError::Configuration(format!("invalid signing key: {}", e)))?;
        let account = derive_account(key.verifying_key());
        Ok(Self { key, account })
    }

    /// The account identifier derived from the signing key.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Sign an unsigned transaction.
    ///
    /// The signature covers the SHA-256 digest of the bincode-encoded
    /// unsigned fields, which bind the payload, nonce, fees and chain id.
    pub fn sign(&self, tx: UnsignedTransaction) -> Result<SignedTransaction, VoteAnchorError> {
        let preimage =
            bincode::serialize(&tx).map_err(|e| VoteAnchorError::Serialization(e.to_string()))?;
        let signature: Signature = self.key.sign(&preimage);
        Ok(SignedTransaction {
            tx,
            signature: signature.to_vec(),
            public_key: self
                .key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        })
    }
}

impl std::fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material, even in debug output.
        f.debug_struct("TransactionSigner")
            .field("account", &self.account)
            .finish()
    }
}

/// Derive the account identifier from a public key: the trailing 20 bytes
/// of the SHA-256 of the compressed SEC1 encoding, hex with `0x` prefix.
pub fn derive_account(key: &VerifyingKey) -> String {
    let digest = Sha256::digest(key.to_encoded_point(true).as_bytes());
    format!("0x{}", hex::encode(&digest[digest.len() - ACCOUNT_BYTES..]))
}

/// Verify a signed transaction against its embedded public key.
pub fn verify_signature(signed: &SignedTransaction) -> Result<(), VoteAnchorError> {
    let key = VerifyingKey::from_sec1_bytes(&signed.public_key)
        .map_err(|e| VoteAnchorError::Serialization(format!("invalid public key: {}", e)))?;
    let signature = Signature::from_slice(&signed.signature)
        .map_err(|e| VoteAnchorError::Serialization(format!("invalid signature: {}", e)))?;
    let preimage = bincode::serialize(&signed.tx)
        .map_err(|e| VoteAnchorError::Serialization(e.to_string()))?;
    key.verify(&preimage, &signature)
        .map_err(|e| VoteAnchorError::Serialization(format!("signature mismatch: {}", e)))
}
