//! # tradeseal-settlement
//!
//! **Settlement plane**: the exchange's public entry points and the
//! all-or-nothing `atomic_match`.
//!
//! ## Architecture
//!
//! `atomic_match` takes a signed buy and a signed sell order and:
//! 1. Hashes both and rejects a self-match
//! 2. Validates each order (parameters, window, status, authorization)
//! 3. Checks pairwise compatibility and computes the match price
//! 4. Runs both static predicates over the merged calldata
//! 5. Opens a ledger snapshot and finalizes both hashes
//! 6. Executes the merged call through the seller's proxy
//! 7. Moves the price and every fee leg
//!
//! Any failure from step 5 on reverts the snapshot, so a rejected match
//! leaves no trace.
//!
//! ## Modules
//!
//! - [`exchange`]: [`Exchange`], [`TxContext`], [`Substrate`], administration
//! - [`funds`]: native and token payment execution
//! - [`telemetry`]: tracing subscriber setup

pub mod exchange;
pub mod funds;
pub mod telemetry;

pub use exchange::{Exchange, SignedOrder, Substrate, TxContext};
pub use funds::{PaymentContext, check_attached_value, settle_payments};
pub use telemetry::{init_tracing, init_tracing_from_env};
