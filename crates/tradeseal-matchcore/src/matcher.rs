//! Pairwise compatibility of a buy and a sell order.
//!
//! Everything here is a pure function of the two orders and the logical
//! time: no signatures, no status lookups, no balances. Per-order validity
//! is the ingress layer's job; this module only decides whether two
//! individually valid orders describe the same trade.

use tradeseal_types::{Amount, Order, Result, Side, Timestamp, TradesealError};

use crate::calldata::merge_calldata;
use crate::pricing::current_price;

/// Outcome of a successful compatibility check: the agreed call and price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchTerms {
    /// Calldata both masks agree on.
    pub calldata: Vec<u8>,
    /// Price the seller receives before fees.
    pub price: Amount,
    /// Side carrying the non-zero fee recipient.
    pub maker_side: Side,
}

/// The fee-carrying ("maker") side of a pair, if exactly one exists.
#[must_use]
pub fn maker_side(buy: &Order, sell: &Order) -> Option<Side> {
    match (buy.is_fee_side(), sell.is_fee_side()) {
        (true, false) => Some(Side::Buy),
        (false, true) => Some(Side::Sell),
        _ => None,
    }
}

/// Check every pairwise condition, reporting the first that fails.
pub fn check_orders_match(buy: &Order, sell: &Order, now: Timestamp) -> Result<()> {
    if buy.side != Side::Buy || sell.side != Side::Sell {
        return Err(TradesealError::incompatible(format!(
            "expected BUY/SELL pair, got {}/{}",
            buy.side, sell.side
        )));
    }
    if buy.exchange != sell.exchange {
        return Err(TradesealError::incompatible("orders name different exchanges"));
    }
    if buy.fee_method != sell.fee_method {
        return Err(TradesealError::FeeMethodMismatch);
    }
    if buy.payment_token != sell.payment_token {
        return Err(TradesealError::incompatible(format!(
            "payment tokens differ: {} vs {}",
            buy.payment_token, sell.payment_token
        )));
    }
    if !buy.taker.is_zero() && buy.taker != sell.maker {
        return Err(TradesealError::incompatible(format!(
            "buy order is reserved for taker {}",
            buy.taker
        )));
    }
    if !sell.taker.is_zero() && sell.taker != buy.maker {
        return Err(TradesealError::incompatible(format!(
            "sell order is reserved for taker {}",
            sell.taker
        )));
    }
    if maker_side(buy, sell).is_none() {
        return Err(TradesealError::incompatible(
            "exactly one order must name a fee recipient",
        ));
    }
    if buy.target != sell.target {
        return Err(TradesealError::incompatible(format!(
            "targets differ: {} vs {}",
            buy.target, sell.target
        )));
    }
    if buy.how_to_call != sell.how_to_call {
        return Err(TradesealError::incompatible(format!(
            "call kinds differ: {} vs {}",
            buy.how_to_call, sell.how_to_call
        )));
    }
    if !buy.is_live_at(now) {
        return Err(TradesealError::incompatible(format!(
            "buy order not settleable at {now}"
        )));
    }
    if !sell.is_live_at(now) {
        return Err(TradesealError::incompatible(format!(
            "sell order not settleable at {now}"
        )));
    }
    merge_calldata(
        &buy.calldata,
        &buy.replacement_pattern,
        &sell.calldata,
        &sell.replacement_pattern,
    )?;
    Ok(())
}

#[must_use]
pub fn orders_can_match(buy: &Order, sell: &Order, now: Timestamp) -> bool {
    check_orders_match(buy, sell, now).is_ok()
}

/// The sell side's current price, provided the buy side's current price
/// reaches it.
pub fn calculate_match_price(buy: &Order, sell: &Order, now: Timestamp) -> Result<Amount> {
    let sell_price = current_price(sell, now)?;
    let buy_price = current_price(buy, now)?;
    if buy_price < sell_price {
        return Err(TradesealError::PriceNotCrossed {
            buy_price,
            sell_price,
        });
    }
    tracing::debug!(%buy_price, %sell_price, now, "match price computed");
    Ok(sell_price)
}

/// Full pairwise evaluation: compatibility, merged calldata and price.
pub fn match_terms(buy: &Order, sell: &Order, now: Timestamp) -> Result<MatchTerms> {
    check_orders_match(buy, sell, now)?;
    let calldata = merge_calldata(
        &buy.calldata,
        &buy.replacement_pattern,
        &sell.calldata,
        &sell.replacement_pattern,
    )?;
    let price = calculate_match_price(buy, sell, now)?;
    let maker_side = maker_side(buy, sell)
        .ok_or_else(|| TradesealError::incompatible("no fee-carrying side"))?;
    Ok(MatchTerms {
        calldata,
        price,
        maker_side,
    })
}
