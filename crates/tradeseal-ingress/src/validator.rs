//! Per-order validity.
//!
//! An order is settleable when its static parameters are sane, it is inside
//! its time window, its hash isn't finalized, and its maker authorized it:
//! by signature, by on-chain approval, or by sending the transaction
//! themselves.

use tradeseal_custody::ContractDirectory;
use tradeseal_types::constants::{INVERSE_BASIS_POINT, MAX_CALLDATA_LEN, MAX_STATIC_EXTRADATA_LEN};
use tradeseal_types::{
    Address, Amount, ExchangeConfig, FeeMethod, Ledger, Order, OrderHash, OrderSignature,
    OrderStatus, Result, SaleKind, Timestamp, TradesealError,
};

use crate::signature::SignatureVerifier;

fn invalid(reason: impl Into<String>) -> TradesealError {
    TradesealError::InvalidOrderParameters {
        reason: reason.into(),
    }
}

fn check_amount(name: &str, amount: Amount) -> Result<()> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(invalid(format!("{name} is negative: {amount}")));
    }
    if !amount.fract().is_zero() {
        return Err(invalid(format!("{name} is not integral: {amount}")));
    }
    Ok(())
}

/// Validates orders against one exchange's configuration.
#[derive(Debug)]
pub struct OrderValidator<'a> {
    config: &'a ExchangeConfig,
    verifier: &'a SignatureVerifier,
}

impl<'a> OrderValidator<'a> {
    #[must_use]
    pub fn new(config: &'a ExchangeConfig, verifier: &'a SignatureVerifier) -> Self {
        Self { config, verifier }
    }

    /// Static checks that depend only on the order and the exchange config.
    pub fn check_order_parameters(&self, order: &Order) -> Result<()> {
        if order.exchange != self.config.exchange_id {
            return Err(invalid(format!(
                "order targets exchange {}, this is {}",
                order.exchange, self.config.exchange_id
            )));
        }
        if order.sale_kind == SaleKind::Auction && order.expiration_time <= order.listing_time {
            return Err(invalid("auction needs expiration_time after listing_time"));
        }
        if !self.config.accepts_payment_token(&order.payment_token) {
            return Err(invalid(format!(
                "payment token {} is not whitelisted",
                order.payment_token
            )));
        }
        check_amount("base_price", order.base_price)?;
        check_amount("extra", order.extra)?;

        if order.calldata.len() > MAX_CALLDATA_LEN {
            return Err(invalid(format!("calldata of {} bytes", order.calldata.len())));
        }
        if order.static_extradata.len() > MAX_STATIC_EXTRADATA_LEN {
            return Err(invalid(format!(
                "static extradata of {} bytes",
                order.static_extradata.len()
            )));
        }
        if !order.replacement_pattern.is_empty()
            && order.replacement_pattern.len() != order.calldata.len()
        {
            return Err(TradesealError::LengthMismatch {
                what: "calldata vs replacement mask",
                left: order.calldata.len(),
                right: order.replacement_pattern.len(),
            });
        }

        let fees = [
            order.maker_relayer_fee,
            order.taker_relayer_fee,
            order.maker_protocol_fee,
            order.taker_protocol_fee,
        ];
        match order.fee_method {
            FeeMethod::ProtocolSplit => {
                if fees.iter().any(|bps| *bps > INVERSE_BASIS_POINT) {
                    return Err(invalid(format!(
                        "fee above {INVERSE_BASIS_POINT} bps: {fees:?}"
                    )));
                }
                let schedule = &self.config.fees;
                if order.maker_protocol_fee < schedule.minimum_maker_protocol_fee
                    || order.taker_protocol_fee < schedule.minimum_taker_protocol_fee
                {
                    return Err(invalid(format!(
                        "protocol fees {}/{} below minimum {}/{}",
                        order.maker_protocol_fee,
                        order.taker_protocol_fee,
                        schedule.minimum_maker_protocol_fee,
                        schedule.minimum_taker_protocol_fee
                    )));
                }
            }
            FeeMethod::FrontendSplit => {
                if fees.iter().any(|bps| *bps != 0) {
                    return Err(invalid("frontend-split orders carry no per-order fees"));
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn validate_order_parameters(&self, order: &Order) -> bool {
        self.check_order_parameters(order).is_ok()
    }

    /// Full validity for an order presented with `sig`.
    ///
    /// When `sender` is the order's maker the signature is not consulted.
    pub fn require_valid_order(
        &self,
        hash: &OrderHash,
        order: &Order,
        sig: &OrderSignature,
        sender: Option<&Address>,
        ledger: &dyn Ledger,
        now: Timestamp,
    ) -> Result<()> {
        self.check_order_parameters(order)?;

        let status = ledger.order_status(hash);
        if status.is_finalized() {
            return Err(TradesealError::OrderFinalized(*hash));
        }
        if !order.is_live_at(now) {
            return Err(TradesealError::OutsideTimeWindow { hash: *hash, now });
        }

        if sender == Some(&order.maker) || status == OrderStatus::Approved {
            return Ok(());
        }
        if self.verifier.validate(hash, sig, &order.maker) {
            Ok(())
        } else {
            Err(TradesealError::OrderNotAuthorized(*hash))
        }
    }

    #[must_use]
    pub fn validate_order(
        &self,
        hash: &OrderHash,
        order: &Order,
        sig: &OrderSignature,
        ledger: &dyn Ledger,
        now: Timestamp,
    ) -> bool {
        self.require_valid_order(hash, order, sig, None, ledger, now)
            .is_ok()
    }
}

/// Evaluate the order's static predicate, read-only, on
/// `static_extradata ++ fill_calldata`.
///
/// No static target always passes; a static target with no predicate
/// deployed never does.
#[must_use]
pub fn evaluate_static_predicate(
    order: &Order,
    fill_calldata: &[u8],
    contracts: &ContractDirectory,
    ledger: &dyn Ledger,
) -> bool {
    let Some(target) = order.static_target else {
        return true;
    };
    let Some(predicate) = contracts.predicate(&target) else {
        tracing::debug!(target_addr = %target, "no static predicate deployed");
        return false;
    };
    let mut input = Vec::with_capacity(order.static_extradata.len() + fill_calldata.len());
    input.extend_from_slice(&order.static_extradata);
    input.extend_from_slice(fill_calldata);
    predicate.check(&input, ledger)
}

/// [`evaluate_static_predicate`] as a `Result`.
pub fn require_static_predicate(
    order: &Order,
    fill_calldata: &[u8],
    contracts: &ContractDirectory,
    ledger: &dyn Ledger,
) -> Result<()> {
    if evaluate_static_predicate(order, fill_calldata, contracts, ledger) {
        Ok(())
    } else {
        Err(TradesealError::StaticPredicateRejected {
            target: order.static_target.unwrap_or(Address::ZERO),
        })
    }
}
