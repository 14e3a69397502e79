//! secp256k1 order signatures.
//!
//! A maker authorizes an order by signing [`hash_to_sign`] of its hash with a
//! recoverable ECDSA signature. Verification recovers the public key and
//! compares the derived address to the order's maker; nothing else about the
//! key is needed on the verifying side.

use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use tradeseal_types::{Address, OrderHash, OrderSignature, Result, TradesealError};

use crate::codec::hash_to_sign;

/// Address of a public key: the last 20 bytes of SHA-256 over the
/// uncompressed key without its `0x04` tag.
#[must_use]
pub fn address_of(key: &PublicKey) -> Address {
    let uncompressed = key.serialize_uncompressed();
    let digest = Sha256::digest(&uncompressed[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[12..]);
    Address(out)
}

/// Recovers and checks signers of order digests.
pub struct SignatureVerifier {
    secp: Secp256k1<secp256k1::VerifyOnly>,
}

impl SignatureVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }

    /// Address that produced `sig` over `digest`.
    pub fn recover(&self, digest: &[u8; 32], sig: &OrderSignature) -> Result<Address> {
        let sig = sig.normalized()?;
        let recovery_id = RecoveryId::from_i32(i32::from(sig.recovery_id())).map_err(|e| {
            TradesealError::InvalidSignatureEncoding {
                reason: e.to_string(),
            }
        })?;
        let mut compact = [0u8; 64];
        compact[..32].copy_from_slice(&sig.r);
        compact[32..].copy_from_slice(&sig.s);
        let recoverable = RecoverableSignature::from_compact(&compact, recovery_id).map_err(|e| {
            TradesealError::InvalidSignatureEncoding {
                reason: e.to_string(),
            }
        })?;
        let message = Message::from_digest(*digest);
        let key = self
            .secp
            .recover_ecdsa(&message, &recoverable)
            .map_err(|e| TradesealError::InvalidSignatureEncoding {
                reason: e.to_string(),
            })?;
        Ok(address_of(&key))
    }

    /// Whether `sig` is `claimed_signer`'s signature over order `hash`.
    /// Malformed signatures are simply invalid.
    #[must_use]
    pub fn validate(&self, hash: &OrderHash, sig: &OrderSignature, claimed_signer: &Address) -> bool {
        match self.recover(&hash_to_sign(hash), sig) {
            Ok(signer) => signer == *claimed_signer,
            Err(err) => {
                tracing::debug!(hash = %hash, error = %err, "signature did not recover");
                false
            }
        }
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SignatureVerifier")
    }
}

/// Off-chain helper holding a maker's secret key.
pub struct OrderSigner {
    secp: Secp256k1<secp256k1::SignOnly>,
    secret: SecretKey,
    address: Address,
}

impl OrderSigner {
    /// Signer for a 32-byte secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Result<Self> {
        let secret = SecretKey::from_slice(secret).map_err(|e| {
            TradesealError::InvalidSignatureEncoding {
                reason: format!("invalid secret key: {e}"),
            }
        })?;
        let secp = Secp256k1::signing_only();
        let address = address_of(&PublicKey::from_secret_key(&secp, &secret));
        Ok(Self {
            secp,
            secret,
            address,
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign the digest of order `hash`.
    #[must_use]
    pub fn sign(&self, hash: &OrderHash) -> OrderSignature {
        let message = Message::from_digest(hash_to_sign(hash));
        let (recovery_id, compact) = self
            .secp
            .sign_ecdsa_recoverable(&message, &self.secret)
            .serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        // Recovery ids are 0..=3; 2 and 3 don't occur for valid curve points.
        let v = u8::try_from(recovery_id.to_i32()).unwrap_or(0) + 27;
        OrderSignature { v, r, s }
    }
}

impl std::fmt::Debug for OrderSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
