//! Order model for the Tradeseal settlement core.
//!
//! An [`Order`] is an immutable, signed statement of trade intent. Its hash
//! (computed by the ingress codec) is its on-chain identity; the only mutable
//! state attached to an order is its [`OrderStatus`], keyed by that hash.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, HowToCall, Salt, Timestamp};

/// Which side of the trade this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Pricing curve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SaleKind {
    /// Price is always `base_price`.
    FixedPrice,
    /// Price moves linearly by `extra` between listing and expiration.
    Auction,
}

impl std::fmt::Display for SaleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedPrice => write!(f, "FIXED_PRICE"),
            Self::Auction => write!(f, "AUCTION"),
        }
    }
}

/// Fee scheme an order opts into. Both orders of a match must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeMethod {
    /// Basis-point relayer fees to the order's fee recipient plus protocol
    /// fees to the exchange's protocol fee recipient.
    ProtocolSplit,
    /// Legacy scheme: exchange-configured fractions split between the
    /// frontend (fee recipient) and the public beneficiary.
    FrontendSplit,
}

impl std::fmt::Display for FeeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProtocolSplit => write!(f, "PROTOCOL_SPLIT"),
            Self::FrontendSplit => write!(f, "FRONTEND_SPLIT"),
        }
    }
}

/// Per-hash order status.
///
/// Transitions are **monotonic**:
/// - `Unseen → Approved` (maker approved on-chain)
/// - `Unseen | Approved → Finalized` (matched or cancelled)
///
/// `Finalized` is terminal; it is what prevents a double fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    Unseen,
    Approved,
    Finalized,
}

impl OrderStatus {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unseen, Self::Approved | Self::Finalized) | (Self::Approved, Self::Finalized)
        )
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        *self == Self::Finalized
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unseen => write!(f, "UNSEEN"),
            Self::Approved => write!(f, "APPROVED"),
            Self::Finalized => write!(f, "FINALIZED"),
        }
    }
}

/// A signed trade intent.
///
/// Every field participates in the order hash. Fee fields are basis points
/// (1/10000) and only meaningful under [`FeeMethod::ProtocolSplit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Exchange the order is valid on.
    pub exchange: Address,
    pub maker: Address,
    /// Permitted counterparty; zero means anyone.
    pub taker: Address,
    pub maker_relayer_fee: u32,
    pub taker_relayer_fee: u32,
    pub maker_protocol_fee: u32,
    pub taker_protocol_fee: u32,
    /// Relayer receiving fees; non-zero marks the maker side of a match.
    pub fee_recipient: Address,
    pub fee_method: FeeMethod,
    pub side: Side,
    pub sale_kind: SaleKind,
    /// Contract the settlement call is sent to.
    pub target: Address,
    pub how_to_call: HowToCall,
    pub calldata: Vec<u8>,
    /// Byte mask over `calldata`; non-zero bytes may be filled by the
    /// counterparty. Empty means exact match.
    pub replacement_pattern: Vec<u8>,
    pub static_target: Option<Address>,
    pub static_extradata: Vec<u8>,
    /// Zero means the native asset.
    pub payment_token: Address,
    pub base_price: Amount,
    /// Auction slope: total price movement over the listing window.
    pub extra: Amount,
    pub listing_time: Timestamp,
    /// Zero means the order never expires.
    pub expiration_time: Timestamp,
    pub salt: Salt,
}

impl Order {
    #[must_use]
    pub fn pays_native(&self) -> bool {
        self.payment_token.is_zero()
    }

    /// Whether this order is the fee-carrying (maker) side of a match.
    #[must_use]
    pub fn is_fee_side(&self) -> bool {
        !self.fee_recipient.is_zero()
    }

    /// `listing_time ≤ now < expiration_time`, where a zero expiration never
    /// expires.
    #[must_use]
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.listing_time <= now && (self.expiration_time == 0 || now < self.expiration_time)
    }
}

/// ECDSA signature over an order's signing digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignature {
    /// Recovery byte, normalized to `27` or `28`.
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl OrderSignature {
    /// An all-zero signature; never verifies. Used when an order is
    /// authorized by on-chain approval or by the transaction sender.
    pub const EMPTY: Self = Self {
        v: 27,
        r: [0u8; 32],
        s: [0u8; 32],
    };

    /// Normalize `v` into `{27, 28}`. `0`/`1` are accepted as raw recovery ids.
    pub fn normalized(self) -> crate::Result<Self> {
        let v = match self.v {
            0 | 1 => self.v + 27,
            27 | 28 => self.v,
            other => {
                return Err(crate::TradesealError::InvalidSignatureEncoding {
                    reason: format!("v must be 0, 1, 27 or 28, got {other}"),
                });
            }
        };
        Ok(Self { v, ..self })
    }

    /// Raw recovery id (0 or 1) of a normalized signature.
    #[must_use]
    pub fn recovery_id(&self) -> u8 {
        self.v.saturating_sub(27)
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    /// A fixed-price native-asset order with sensible defaults; callers
    /// override fields as needed.
    pub fn dummy(exchange: Address, maker: Address, side: Side, target: Address) -> Self {
        Self {
            exchange,
            maker,
            taker: Address::ZERO,
            maker_relayer_fee: 0,
            taker_relayer_fee: 0,
            maker_protocol_fee: 0,
            taker_protocol_fee: 0,
            fee_recipient: Address::ZERO,
            fee_method: FeeMethod::ProtocolSplit,
            side,
            sale_kind: SaleKind::FixedPrice,
            target,
            how_to_call: HowToCall::Call,
            calldata: Vec::new(),
            replacement_pattern: Vec::new(),
            static_target: None,
            static_extradata: Vec::new(),
            payment_token: Address::ZERO,
            base_price: Amount::new(100, 0),
            extra: Amount::ZERO,
            listing_time: 0,
            expiration_time: 0,
            salt: rand::random::<u128>(),
        }
    }
}
