//! # tradeseal-types
//!
//! Shared types, errors, and configuration for the **Tradeseal** settlement
//! core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`OrderHash`], [`MatchId`], [`Amount`], [`Timestamp`]
//! - **Order model**: [`Order`], [`Side`], [`SaleKind`], [`FeeMethod`], [`OrderStatus`], [`OrderSignature`]
//! - **External calls**: [`ExternalCall`], [`HowToCall`], [`CallContext`]
//! - **State**: the [`Ledger`] trait, [`MemoryLedger`], [`with_rollback`]
//! - **Receipts**: [`MatchReceipt`], [`FeeTransfer`], [`ExchangeEvent`]
//! - **Configuration**: [`ExchangeConfig`], [`FeeSchedule`], [`RegistryConfig`]
//! - **Time**: [`Clock`], [`SystemClock`], [`ManualClock`]
//! - **Errors**: [`TradesealError`] with `TS_ERR_` prefix codes
//! - **ABI words**: calldata selector and word helpers in [`abi`]
//! - **Constants**: system-wide limits and defaults

pub mod abi;
pub mod call;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod order;
pub mod receipt;

// Re-export all primary types at crate root for ergonomic imports:
//   use tradeseal_types::{Order, Side, Address, Ledger, ...};

pub use call::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use order::*;
pub use receipt::*;

// Constants and ABI helpers are accessed via their module path
// (not re-exported to avoid name collisions).
