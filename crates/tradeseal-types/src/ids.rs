//! Identifiers and primitive value types used throughout Tradeseal.
//!
//! Accounts and contracts are addressed by 20-byte [`Address`]es, orders by
//! their 256-bit [`OrderHash`]. Settled matches get a deterministic
//! [`MatchId`] so every observer derives the same identifier.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{Result, TradesealError};

/// Token quantities and prices, in integral base units.
pub type Amount = Decimal;

/// Logical time in seconds, as reported by the execution substrate.
pub type Timestamp = u64;

/// Per-order entropy distinguishing otherwise identical orders.
pub type Salt = u128;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address.
///
/// [`Address::ZERO`] is the "unset" sentinel: an order with a zero taker can
/// be filled by anyone, a zero payment token means the native asset, and a
/// zero fee recipient marks the taker side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 20] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Derive an address from a domain tag and a seed (used for proxies and
    /// other contract addresses that must be stable and collision-free).
    #[must_use]
    pub fn derive(domain: &[u8], seed: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(seed);
        let digest = hasher.finalize();
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[12..]);
        Self(out)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// First four bytes as hex, for compact log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = TradesealError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(raw).map_err(|e| TradesealError::MalformedInput {
            reason: format!("invalid address hex {s:?}: {e}"),
        })?;
        Self::from_slice(&bytes).ok_or_else(|| TradesealError::MalformedInput {
            reason: format!("address must be 20 bytes, got {}", bytes.len()),
        })
    }
}

// ---------------------------------------------------------------------------
// OrderHash
// ---------------------------------------------------------------------------

/// 256-bit order identifier: the digest of the canonical order encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderHash(pub [u8; 32]);

impl OrderHash {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// MatchId
// ---------------------------------------------------------------------------

/// Identifier of a settled (buy, sell) match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

impl MatchId {
    /// Deterministic `MatchId` from the two order hashes.
    ///
    /// Each order hash can be finalized once, so the pair identifies the
    /// match uniquely.
    #[must_use]
    pub fn deterministic(buy: &OrderHash, sell: &OrderHash) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"tradeseal:match_id:v1:");
        hasher.update(buy.0);
        hasher.update(sell.0);
        let hash = hasher.finalize();
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);
        Self(Uuid::from_bytes(bytes))
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "match:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_address_is_zero() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address([1u8; 20]).is_zero());
    }

    #[test]
    fn address_display_and_parse() {
        let addr = Address([0xab; 20]);
        let text = addr.to_string();
        assert!(text.starts_with("0xabab"));
        let back: Address = text.parse().unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn address_parse_rejects_wrong_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert!(matches!(err, TradesealError::MalformedInput { .. }));
    }

    #[test]
    fn derived_addresses_are_stable_and_distinct() {
        let a = Address::derive(b"proxy", &[1u8; 20]);
        let b = Address::derive(b"proxy", &[1u8; 20]);
        let c = Address::derive(b"proxy", &[2u8; 20]);
        let d = Address::derive(b"other", &[1u8; 20]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn match_id_deterministic() {
        let buy = OrderHash([1u8; 32]);
        let sell = OrderHash([2u8; 32]);
        assert_eq!(
            MatchId::deterministic(&buy, &sell),
            MatchId::deterministic(&buy, &sell)
        );
        assert_ne!(
            MatchId::deterministic(&buy, &sell),
            MatchId::deterministic(&sell, &buy)
        );
    }

    #[test]
    fn serde_roundtrips() {
        let addr = Address([7u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
