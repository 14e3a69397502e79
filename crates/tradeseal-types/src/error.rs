//! Error types for the Tradeseal settlement core.
//!
//! All errors use the `TS_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by failure class:
//! - 1xx: Malformed input (rejected before any state change)
//! - 2xx: Authorization failures
//! - 3xx: Incompatible orders
//! - 4xx: Replay / double-spend
//! - 5xx: Static predicate rejections
//! - 6xx: Custody / call execution
//! - 9xx: General / internal errors

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{Address, OrderHash};

/// Failure class of a [`TradesealError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedInput,
    AuthorizationFailure,
    IncompatibleOrders,
    ReplayOrDoubleSpend,
    StaticPredicateRejected,
    Execution,
    Internal,
}

/// Central error enum for all Tradeseal operations.
#[derive(Debug, Error)]
pub enum TradesealError {
    // =================================================================
    // Malformed input (1xx)
    // =================================================================
    /// Generic malformed input (bad encoding, invalid field values).
    #[error("TS_ERR_100: Malformed input: {reason}")]
    MalformedInput { reason: String },

    /// Byte arrays that must be the same length are not.
    #[error("TS_ERR_101: Length mismatch: {what} ({left} vs {right})")]
    LengthMismatch {
        what: &'static str,
        left: usize,
        right: usize,
    },

    /// The order's static parameters are invalid.
    #[error("TS_ERR_102: Invalid order parameters: {reason}")]
    InvalidOrderParameters { reason: String },

    /// Price arithmetic overflowed or underflowed.
    #[error("TS_ERR_103: Price arithmetic out of range: {reason}")]
    PriceOutOfRange { reason: String },

    /// The signature's `v` is outside the accepted domain.
    #[error("TS_ERR_104: Invalid signature encoding: {reason}")]
    InvalidSignatureEncoding { reason: String },

    /// Attached native value doesn't fit the payment.
    #[error("TS_ERR_105: Invalid attached value: need {needed}, attached {attached}")]
    InvalidAttachedValue { needed: Decimal, attached: Decimal },

    // =================================================================
    // Authorization failures (2xx)
    // =================================================================
    /// Neither a valid signature nor an on-chain approval by the maker.
    #[error("TS_ERR_200: Order {0} is not authorized by its maker")]
    OrderNotAuthorized(OrderHash),

    /// The caller is not allowed to perform this operation.
    #[error("TS_ERR_201: Unauthorized caller {caller}: {reason}")]
    Unauthorized { caller: Address, reason: String },

    /// The caller is not authorized to invoke this proxy.
    #[error("TS_ERR_202: Caller {caller} may not invoke proxy of {owner}")]
    ProxyAccessDenied { caller: Address, owner: Address },

    // =================================================================
    // Incompatible orders (3xx)
    // =================================================================
    /// The two orders cannot be matched against each other.
    #[error("TS_ERR_300: Orders incompatible: {reason}")]
    IncompatibleOrders { reason: String },

    /// The buy price doesn't reach the sell price.
    #[error("TS_ERR_301: Buy price {buy_price} below sell price {sell_price}")]
    PriceNotCrossed {
        buy_price: Decimal,
        sell_price: Decimal,
    },

    /// Buy and sell order carry the same hash.
    #[error("TS_ERR_302: Self-match rejected for order {0}")]
    SelfMatch(OrderHash),

    /// The order is outside its listing/expiration window.
    #[error("TS_ERR_303: Order {hash} not settleable at {now}")]
    OutsideTimeWindow { hash: OrderHash, now: u64 },

    /// The two orders specify different fee schemes.
    #[error("TS_ERR_304: Fee method mismatch between buy and sell")]
    FeeMethodMismatch,

    // =================================================================
    // Replay / double-spend (4xx)
    // =================================================================
    /// The order hash was already matched or cancelled.
    #[error("TS_ERR_400: Order already finalized: {0}")]
    OrderFinalized(OrderHash),

    /// The order hash was already approved on-chain.
    #[error("TS_ERR_401: Order already approved: {0}")]
    OrderAlreadyApproved(OrderHash),

    /// Illegal order status transition.
    #[error("TS_ERR_402: Invalid order status transition for {hash}: {from} -> {to}")]
    InvalidStatusTransition {
        hash: OrderHash,
        from: crate::OrderStatus,
        to: crate::OrderStatus,
    },

    // =================================================================
    // Static predicate (5xx)
    // =================================================================
    /// An attached static predicate returned false.
    #[error("TS_ERR_500: Static predicate at {target} rejected the fill")]
    StaticPredicateRejected { target: Address },

    // =================================================================
    // Custody / execution (6xx)
    // =================================================================
    /// No contract code is deployed at the call target.
    #[error("TS_ERR_600: No code at call target {0}")]
    NoCodeAtTarget(Address),

    /// A proxied call returned failure under an asserting invocation.
    #[error("TS_ERR_601: Proxy call to {target} failed")]
    ProxyCallFailed { target: Address },

    /// The user has no registered proxy.
    #[error("TS_ERR_602: No proxy registered for {0}")]
    ProxyNotRegistered(Address),

    /// The user already has a proxy.
    #[error("TS_ERR_603: Proxy already registered for {0}")]
    ProxyAlreadyRegistered(Address),

    /// The proxy doesn't run the registry's current implementation.
    #[error("TS_ERR_604: Proxy implementation {actual} differs from registry's {expected}")]
    ProxyImplementationMismatch { expected: u32, actual: u32 },

    /// A grant operation was attempted in the wrong state.
    #[error("TS_ERR_605: Invalid grant transition for {addr}: {reason}")]
    InvalidGrantTransition { addr: Address, reason: String },

    /// `end_grant_authentication` called before the delay elapsed.
    #[error("TS_ERR_606: Grant delay for {addr} not elapsed: ready at {ready_at}, now {now}")]
    GrantDelayNotElapsed {
        addr: Address,
        ready_at: u64,
        now: u64,
    },

    /// Token balance too low for a transfer.
    #[error("TS_ERR_607: Insufficient balance of {asset} for {owner}: need {needed}, have {available}")]
    InsufficientBalance {
        asset: Address,
        owner: Address,
        needed: Decimal,
        available: Decimal,
    },

    /// Token allowance too low for a delegated transfer.
    #[error("TS_ERR_608: Insufficient allowance of {token}: {owner} -> {spender}, need {needed}, have {available}")]
    InsufficientAllowance {
        token: Address,
        owner: Address,
        spender: Address,
        needed: Decimal,
        available: Decimal,
    },

    /// A call target rejected its calldata.
    #[error("TS_ERR_609: Call to {target} reverted: {reason}")]
    CallReverted { target: Address, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TS_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("TS_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("TS_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("TS_ERR_903: I/O error: {0}")]
    Io(String),
}

impl TradesealError {
    /// Failure class used by callers to decide how to surface the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput { .. }
            | Self::LengthMismatch { .. }
            | Self::InvalidOrderParameters { .. }
            | Self::PriceOutOfRange { .. }
            | Self::InvalidSignatureEncoding { .. }
            | Self::InvalidAttachedValue { .. } => ErrorKind::MalformedInput,
            Self::OrderNotAuthorized(_)
            | Self::Unauthorized { .. }
            | Self::ProxyAccessDenied { .. } => ErrorKind::AuthorizationFailure,
            Self::IncompatibleOrders { .. }
            | Self::PriceNotCrossed { .. }
            | Self::SelfMatch(_)
            | Self::OutsideTimeWindow { .. }
            | Self::FeeMethodMismatch => ErrorKind::IncompatibleOrders,
            Self::OrderFinalized(_)
            | Self::OrderAlreadyApproved(_)
            | Self::InvalidStatusTransition { .. } => ErrorKind::ReplayOrDoubleSpend,
            Self::StaticPredicateRejected { .. } => ErrorKind::StaticPredicateRejected,
            Self::NoCodeAtTarget(_)
            | Self::ProxyCallFailed { .. }
            | Self::ProxyNotRegistered(_)
            | Self::ProxyAlreadyRegistered(_)
            | Self::ProxyImplementationMismatch { .. }
            | Self::InvalidGrantTransition { .. }
            | Self::GrantDelayNotElapsed { .. }
            | Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::CallReverted { .. } => ErrorKind::Execution,
            Self::Internal(_) | Self::Serialization(_) | Self::Configuration(_) | Self::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for [`TradesealError::IncompatibleOrders`].
    pub fn incompatible(reason: impl Into<String>) -> Self {
        Self::IncompatibleOrders {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`TradesealError::MalformedInput`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            reason: reason.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TradesealError>;

impl From<std::io::Error> for TradesealError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TradesealError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
