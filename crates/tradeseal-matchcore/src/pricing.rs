//! Current-price computation for fixed-price and linear auction orders.

use rust_decimal::Decimal;
use tradeseal_types::{Amount, Order, Result, SaleKind, Side, Timestamp, TradesealError};

/// Price of an order at `now`.
///
/// - `FixedPrice`: `base`.
/// - `Auction`: the price moves linearly by `extra` across
///   `[listing, expiration]`; sells move up from `base`, buys move down.
///   `now` is clamped into the window, and a zero-length window prices at
///   `base`.
///
/// The auction delta is floored to whole base units.
pub fn calculate_final_price(
    side: Side,
    sale_kind: SaleKind,
    base: Amount,
    extra: Amount,
    listing: Timestamp,
    expiration: Timestamp,
    now: Timestamp,
) -> Result<Amount> {
    if sale_kind == SaleKind::FixedPrice || expiration <= listing {
        return Ok(base);
    }

    let elapsed = now.clamp(listing, expiration) - listing;
    let duration = expiration - listing;

    let delta = extra
        .checked_mul(Decimal::from(elapsed))
        .and_then(|scaled| scaled.checked_div(Decimal::from(duration)))
        .map(|d| d.floor())
        .ok_or_else(|| TradesealError::PriceOutOfRange {
            reason: format!("auction delta overflow: extra {extra}, elapsed {elapsed}/{duration}"),
        })?;

    match side {
        Side::Sell => base
            .checked_add(delta)
            .ok_or_else(|| TradesealError::PriceOutOfRange {
                reason: format!("sell price overflow: {base} + {delta}"),
            }),
        Side::Buy => {
            let price = base
                .checked_sub(delta)
                .ok_or_else(|| TradesealError::PriceOutOfRange {
                    reason: format!("buy price overflow: {base} - {delta}"),
                })?;
            if price.is_sign_negative() {
                return Err(TradesealError::PriceOutOfRange {
                    reason: format!("buy price underflow: {base} - {delta}"),
                });
            }
            Ok(price)
        }
    }
}

/// [`calculate_final_price`] with the parameters taken from `order`.
pub fn current_price(order: &Order, now: Timestamp) -> Result<Amount> {
    calculate_final_price(
        order.side,
        order.sale_kind,
        order.base_price,
        order.extra,
        order.listing_time,
        order.expiration_time,
        now,
    )
}
