//! # tradeseal-matchcore
//!
//! **Pure order-matching predicates for Tradeseal.**
//!
//! MatchCore is the compute plane: given two orders and a logical time it
//! decides whether they describe the same trade, at what price, and who pays
//! which fee. It has:
//!
//! - **Zero side effects**: no ledger access, no signatures, no custody
//! - **Deterministic output**: same orders and time, same answer
//! - **Masked calldata reconciliation**: counterparties fill only the bytes
//!   the other side left open
//! - **Two fee schemes**: basis-point protocol split and legacy frontend split

pub mod calldata;
pub mod fees;
pub mod matcher;
pub mod pricing;

pub use calldata::{guarded_array_replace, merge_calldata, order_calldata_can_match};
pub use fees::{SettlementPlan, basis_point_fee, plan_settlement};
pub use matcher::{
    MatchTerms, calculate_match_price, check_orders_match, maker_side, match_terms,
    orders_can_match,
};
pub use pricing::{calculate_final_price, current_price};
