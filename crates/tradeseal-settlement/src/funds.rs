//! Payment execution for a settled match.
//!
//! Native asset: the transaction's attached value moves from the sender to
//! the exchange, which pays the seller, every fee leg, and refunds the
//! excess to the buyer. Tokens: the price and each fee leg are pulled
//! through the token transfer proxy, which the exchange must be
//! registry-authorized to use.

use tradeseal_custody::{CallEnv, ProxyRegistry, TokenTransferProxy};
use tradeseal_matchcore::SettlementPlan;
use tradeseal_types::{Address, Amount, Result, TradesealError};

/// Value and identities for one payment run.
#[derive(Debug, Clone, Copy)]
pub struct PaymentContext<'a> {
    pub exchange: Address,
    pub sender: Address,
    pub attached_value: Amount,
    pub payment_token: Address,
    pub transfer_proxy: &'a TokenTransferProxy,
    pub registry: &'a ProxyRegistry,
}

/// Reject attached value that can't fund, or doesn't belong to, the match.
pub fn check_attached_value(plan: &SettlementPlan, payment_token: &Address, value: Amount) -> Result<()> {
    let needed = if payment_token.is_zero() {
        plan.buyer_outflow()?
    } else {
        Amount::ZERO
    };
    let ok = if payment_token.is_zero() {
        value >= needed
    } else {
        value.is_zero()
    };
    if ok {
        Ok(())
    } else {
        Err(TradesealError::InvalidAttachedValue {
            needed,
            attached: value,
        })
    }
}

/// Move the price and every fee leg of `plan`.
pub fn settle_payments(env: &mut CallEnv<'_>, ctx: &PaymentContext<'_>, plan: &SettlementPlan) -> Result<()> {
    check_attached_value(plan, &ctx.payment_token, ctx.attached_value)?;
    if ctx.payment_token.is_zero() {
        settle_native(env, ctx, plan)
    } else {
        settle_token(env, ctx, plan)
    }
}

fn settle_native(env: &mut CallEnv<'_>, ctx: &PaymentContext<'_>, plan: &SettlementPlan) -> Result<()> {
    let ledger = &mut *env.ledger;
    ledger.transfer_native(&ctx.sender, &ctx.exchange, ctx.attached_value)?;

    let proceeds = plan.seller_inflow()?;
    if !proceeds.is_zero() {
        ledger.transfer_native(&ctx.exchange, &plan.seller, proceeds)?;
    }
    for fee in &plan.fees {
        ledger.transfer_native(&ctx.exchange, &fee.to, fee.amount)?;
    }
    let outflow = plan.buyer_outflow()?;
    let refund = ctx
        .attached_value
        .checked_sub(outflow)
        .ok_or(TradesealError::InvalidAttachedValue {
            needed: outflow,
            attached: ctx.attached_value,
        })?;
    if !refund.is_zero() {
        ledger.transfer_native(&ctx.exchange, &plan.buyer, refund)?;
    }
    tracing::debug!(
        value = %ctx.attached_value,
        proceeds = %proceeds,
        refund = %refund,
        "native payment settled"
    );
    Ok(())
}

fn settle_token(env: &mut CallEnv<'_>, ctx: &PaymentContext<'_>, plan: &SettlementPlan) -> Result<()> {
    let token = ctx.payment_token;
    let pull = |env: &mut CallEnv<'_>, from: Address, to: Address, amount: Amount| {
        if amount.is_zero() {
            return Ok(());
        }
        ctx.transfer_proxy
            .transfer_from(ctx.registry, env, ctx.exchange, token, from, to, amount)
    };

    pull(env, plan.buyer, plan.seller, plan.price)?;
    for fee in &plan.fees {
        pull(env, fee.from, fee.to, fee.amount)?;
    }
    tracing::debug!(token = %token, price = %plan.price, fees = plan.fees.len(), "token payment settled");
    Ok(())
}
