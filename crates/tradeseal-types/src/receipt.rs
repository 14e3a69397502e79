//! Settlement receipts and exchange events.
//!
//! Entry points return these values to the caller; nothing here is
//! persisted beyond the ledger effects they describe.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, MatchId, OrderHash, Timestamp};

/// Which fee leg a [`FeeTransfer`] pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeKind {
    MakerRelayer,
    TakerRelayer,
    MakerProtocol,
    TakerProtocol,
    BuyFrontend,
    BuyBeneficiary,
    SellFrontend,
    SellBeneficiary,
}

impl std::fmt::Display for FeeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MakerRelayer => write!(f, "MAKER_RELAYER"),
            Self::TakerRelayer => write!(f, "TAKER_RELAYER"),
            Self::MakerProtocol => write!(f, "MAKER_PROTOCOL"),
            Self::TakerProtocol => write!(f, "TAKER_PROTOCOL"),
            Self::BuyFrontend => write!(f, "BUY_FRONTEND"),
            Self::BuyBeneficiary => write!(f, "BUY_BENEFICIARY"),
            Self::SellFrontend => write!(f, "SELL_FRONTEND"),
            Self::SellBeneficiary => write!(f, "SELL_BENEFICIARY"),
        }
    }
}

/// One fee payment, in the match's payment asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTransfer {
    pub kind: FeeKind,
    pub from: Address,
    pub to: Address,
    pub amount: Amount,
}

/// Proof of a completed atomic match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReceipt {
    pub match_id: MatchId,
    pub buy_hash: OrderHash,
    pub sell_hash: OrderHash,
    pub buyer: Address,
    pub seller: Address,
    /// Zero means the native asset.
    pub payment_token: Address,
    /// Amount the seller was paid before seller-side fees.
    pub price: Amount,
    pub fee_transfers: Vec<FeeTransfer>,
    /// Opaque caller-supplied tag, echoed back unchanged.
    pub metadata: [u8; 32],
    pub settled_at: Timestamp,
}

impl MatchReceipt {
    /// Total fees paid by `payer` in this match.
    #[must_use]
    pub fn fees_paid_by(&self, payer: &Address) -> Amount {
        self.fee_transfers
            .iter()
            .filter(|t| t.from == *payer)
            .map(|t| t.amount)
            .sum()
    }
}

/// Observable outcome of an exchange entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    OrderApproved {
        hash: OrderHash,
        maker: Address,
        order_book_inclusion_desired: bool,
    },
    OrderCancelled {
        hash: OrderHash,
    },
    OrdersMatched(MatchReceipt),
}
