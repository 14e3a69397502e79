//! # tradeseal-custody
//!
//! **Custody and authorization layer for Tradeseal.**
//!
//! Users never hand assets to the exchange. Each user registers one
//! [`AuthenticatedProxy`] that holds their approvals; the exchange can act
//! through it only while the [`ProxyRegistry`] trusts the exchange and the
//! user hasn't revoked registry access on their proxy.
//!
//! - **Registry**: one proxy per user, two-phase delayed caller grants
//! - **Proxies**: owner- or registry-authorized call forwarding with rollback
//! - **Executor**: the single trusted [`CallExecutor`] and [`ContractDirectory`]
//! - **Token transfer proxy**: pulls approved token payments
//! - **Call targets**: [`FungibleToken`] and the batching [`Atomicizer`]

pub mod atomicizer;
pub mod executor;
pub mod grant;
pub mod proxy;
pub mod registry;
pub mod token;
pub mod transfer_proxy;

pub use atomicizer::Atomicizer;
pub use executor::{CallEnv, CallExecutor, CallTarget, ContractDirectory, StaticPredicate};
pub use grant::GrantState;
pub use proxy::AuthenticatedProxy;
pub use registry::ProxyRegistry;
pub use token::FungibleToken;
pub use transfer_proxy::TokenTransferProxy;
