//! # tradeseal-ingress
//!
//! **Order envelope**: everything that decides whether a single order may
//! enter settlement.
//!
//! ## Architecture
//!
//! 1. **Codec**: canonical encoding, order hash, signing digest
//! 2. **SignatureVerifier**: secp256k1 recovery against the maker address
//! 3. **OrderValidator**: parameters, time window, status, authorization
//! 4. **Static predicates**: read-only veto over the merged fill calldata
//!
//! ## Order Flow
//!
//! ```text
//! Order → codec::hash_order() → OrderValidator.require_valid_order()
//!       → (pair checks in matchcore) → require_static_predicate()
//! ```

pub mod codec;
pub mod signature;
pub mod validator;

pub use codec::{decode, encode, hash_order, hash_to_sign};
pub use signature::{OrderSigner, SignatureVerifier, address_of};
pub use validator::{OrderValidator, evaluate_static_predicate, require_static_predicate};
