//! Fee planning for a matched pair.
//!
//! Two mutually exclusive schemes, selected by the orders' shared
//! [`FeeMethod`]:
//!
//! - **ProtocolSplit**: basis-point fees read from the maker-side order.
//!   Relayer fees go to that order's fee recipient, protocol fees to the
//!   exchange's protocol fee recipient. Maker fees are charged to the maker
//!   side, taker fees to the taker side.
//! - **FrontendSplit**: exchange-wide decimal fractions of the price, split
//!   between the maker side's fee recipient (the frontend) and the public
//!   beneficiary.
//!
//! All fees are floored to whole base units.

use rust_decimal::Decimal;
use tradeseal_types::constants::INVERSE_BASIS_POINT;
use tradeseal_types::{
    Address, Amount, FeeKind, FeeMethod, FeeSchedule, FeeTransfer, Order, Result, Side,
    TradesealError,
};

use crate::matcher::maker_side;

/// Who pays whom for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementPlan {
    pub buyer: Address,
    pub seller: Address,
    pub price: Amount,
    /// Every non-zero fee leg.
    pub fees: Vec<FeeTransfer>,
}

impl SettlementPlan {
    /// Price plus every fee charged to the buyer.
    pub fn buyer_outflow(&self) -> Result<Amount> {
        let fees = self.fees_from(&self.buyer)?;
        self.price
            .checked_add(fees)
            .ok_or_else(|| out_of_range(format!("buyer outflow overflow: {} + {fees}", self.price)))
    }

    /// Price minus every fee charged to the seller.
    pub fn seller_inflow(&self) -> Result<Amount> {
        let fees = self.fees_from(&self.seller)?;
        self.price
            .checked_sub(fees)
            .ok_or_else(|| out_of_range(format!("seller inflow overflow: {} - {fees}", self.price)))
    }

    pub fn fees_from(&self, payer: &Address) -> Result<Amount> {
        self.fees
            .iter()
            .filter(|f| f.from == *payer)
            .try_fold(Amount::ZERO, |total, f| {
                total
                    .checked_add(f.amount)
                    .ok_or_else(|| out_of_range(format!("fee total overflow for {payer}")))
            })
    }
}

fn out_of_range(reason: String) -> TradesealError {
    TradesealError::PriceOutOfRange { reason }
}

/// `floor(bps * price / 10000)`.
pub fn basis_point_fee(price: Amount, bps: u32) -> Result<Amount> {
    price
        .checked_mul(Decimal::from(bps))
        .and_then(|scaled| scaled.checked_div(Decimal::from(INVERSE_BASIS_POINT)))
        .map(|fee| fee.floor())
        .ok_or_else(|| TradesealError::PriceOutOfRange {
            reason: format!("fee overflow: {bps} bps of {price}"),
        })
}

fn fraction_fee(price: Amount, fraction: Decimal) -> Result<Amount> {
    price
        .checked_mul(fraction)
        .map(|fee| fee.floor())
        .ok_or_else(|| TradesealError::PriceOutOfRange {
            reason: format!("fee overflow: {fraction} of {price}"),
        })
}

/// Compute every fee leg for `buy`/`sell` settling at `price`.
pub fn plan_settlement(
    buy: &Order,
    sell: &Order,
    price: Amount,
    schedule: &FeeSchedule,
) -> Result<SettlementPlan> {
    if buy.fee_method != sell.fee_method {
        return Err(TradesealError::FeeMethodMismatch);
    }
    let maker = maker_side(buy, sell)
        .ok_or_else(|| TradesealError::incompatible("exactly one order must name a fee recipient"))?;

    let mut plan = SettlementPlan {
        buyer: buy.maker,
        seller: sell.maker,
        price,
        fees: Vec::new(),
    };
    let mut push = |kind: FeeKind, from: Address, to: Address, amount: Amount| {
        if !amount.is_zero() {
            plan.fees.push(FeeTransfer {
                kind,
                from,
                to,
                amount,
            });
        }
    };

    match buy.fee_method {
        FeeMethod::ProtocolSplit => {
            let (maker_order, taker_order) = match maker {
                Side::Sell => (sell, buy),
                Side::Buy => (buy, sell),
            };
            if taker_order.taker_relayer_fee < maker_order.taker_relayer_fee {
                return Err(TradesealError::incompatible(format!(
                    "taker order allows {} bps relayer fee, maker requires {}",
                    taker_order.taker_relayer_fee, maker_order.taker_relayer_fee
                )));
            }
            if taker_order.taker_protocol_fee < maker_order.taker_protocol_fee {
                return Err(TradesealError::incompatible(format!(
                    "taker order allows {} bps protocol fee, maker requires {}",
                    taker_order.taker_protocol_fee, maker_order.taker_protocol_fee
                )));
            }
            let relayer = maker_order.fee_recipient;
            let protocol = schedule.protocol_fee_recipient;
            let (maker_payer, taker_payer) = (maker_order.maker, taker_order.maker);

            push(
                FeeKind::MakerRelayer,
                maker_payer,
                relayer,
                basis_point_fee(price, maker_order.maker_relayer_fee)?,
            );
            push(
                FeeKind::TakerRelayer,
                taker_payer,
                relayer,
                basis_point_fee(price, maker_order.taker_relayer_fee)?,
            );
            push(
                FeeKind::MakerProtocol,
                maker_payer,
                protocol,
                basis_point_fee(price, maker_order.maker_protocol_fee)?,
            );
            push(
                FeeKind::TakerProtocol,
                taker_payer,
                protocol,
                basis_point_fee(price, maker_order.taker_protocol_fee)?,
            );
        }
        FeeMethod::FrontendSplit => {
            let frontend = match maker {
                Side::Sell => sell.fee_recipient,
                Side::Buy => buy.fee_recipient,
            };
            let beneficiary = schedule.public_beneficiary;

            push(
                FeeKind::BuyFrontend,
                buy.maker,
                frontend,
                fraction_fee(price, schedule.buy_frontend_fee)?,
            );
            push(
                FeeKind::BuyBeneficiary,
                buy.maker,
                beneficiary,
                fraction_fee(price, schedule.buy_beneficiary_fee)?,
            );
            push(
                FeeKind::SellFrontend,
                sell.maker,
                frontend,
                fraction_fee(price, schedule.sell_frontend_fee)?,
            );
            push(
                FeeKind::SellBeneficiary,
                sell.maker,
                beneficiary,
                fraction_fee(price, schedule.sell_beneficiary_fee)?,
            );
        }
    }

    let seller_fees = plan.fees_from(&plan.seller)?;
    if seller_fees > price {
        return Err(out_of_range(format!(
            "seller fees {seller_fees} exceed price {price}"
        )));
    }
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXCHANGE: Address = Address([0xee; 20]);
    const TARGET: Address = Address([0x70; 20]);
    const BUYER: Address = Address([0xb0; 20]);
    const SELLER: Address = Address([0x50; 20]);
    const RELAYER: Address = Address([0x7e; 20]);
    const PROTOCOL: Address = Address([0x9a; 20]);
    const BENEFICIARY: Address = Address([0xbe; 20]);

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            protocol_fee_recipient: PROTOCOL,
            public_beneficiary: BENEFICIARY,
            ..FeeSchedule::default()
        }
    }

    fn pair(method: FeeMethod) -> (Order, Order) {
        let mut buy = Order::dummy(EXCHANGE, BUYER, Side::Buy, TARGET);
        let mut sell = Order::dummy(EXCHANGE, SELLER, Side::Sell, TARGET);
        buy.fee_method = method;
        sell.fee_method = method;
        sell.fee_recipient = RELAYER;
        (buy, sell)
    }

    fn fee(plan: &SettlementPlan, kind: FeeKind) -> Option<&FeeTransfer> {
        plan.fees.iter().find(|f| f.kind == kind)
    }

    #[test]
    fn basis_points_floor() {
        assert_eq!(basis_point_fee(Amount::new(1000, 0), 250).unwrap(), Amount::new(25, 0));
        assert_eq!(basis_point_fee(Amount::new(999, 0), 1).unwrap(), Amount::ZERO);
        assert_eq!(basis_point_fee(Amount::new(1000, 0), 0).unwrap(), Amount::ZERO);
    }

    #[test]
    fn protocol_split_sell_maker() {
        let (mut buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.maker_relayer_fee = 250;
        sell.taker_relayer_fee = 100;
        sell.maker_protocol_fee = 50;
        sell.taker_protocol_fee = 20;
        buy.taker_relayer_fee = 100;
        buy.taker_protocol_fee = 20;

        let plan = plan_settlement(&buy, &sell, Amount::new(1000, 0), &schedule()).unwrap();
        let maker_relayer = fee(&plan, FeeKind::MakerRelayer).unwrap();
        assert_eq!((maker_relayer.from, maker_relayer.to), (SELLER, RELAYER));
        assert_eq!(maker_relayer.amount, Amount::new(25, 0));
        let taker_protocol = fee(&plan, FeeKind::TakerProtocol).unwrap();
        assert_eq!((taker_protocol.from, taker_protocol.to), (BUYER, PROTOCOL));
        assert_eq!(taker_protocol.amount, Amount::new(2, 0));

        assert_eq!(plan.buyer_outflow().unwrap(), Amount::new(1012, 0));
        assert_eq!(plan.seller_inflow().unwrap(), Amount::new(970, 0));
    }

    #[test]
    fn protocol_split_buy_maker_charges_buyer_maker_fees() {
        let (mut buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.fee_recipient = Address::ZERO;
        buy.fee_recipient = RELAYER;
        buy.maker_relayer_fee = 100;
        buy.taker_relayer_fee = 50;
        sell.taker_relayer_fee = 50;

        let plan = plan_settlement(&buy, &sell, Amount::new(1000, 0), &schedule()).unwrap();
        assert_eq!(fee(&plan, FeeKind::MakerRelayer).unwrap().from, BUYER);
        assert_eq!(fee(&plan, FeeKind::TakerRelayer).unwrap().from, SELLER);
        assert_eq!(plan.buyer_outflow().unwrap(), Amount::new(1010, 0));
        assert_eq!(plan.seller_inflow().unwrap(), Amount::new(995, 0));
    }

    #[test]
    fn taker_must_allow_maker_taker_fees() {
        let (buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.taker_relayer_fee = 100;
        let err = plan_settlement(&buy, &sell, Amount::new(1000, 0), &schedule()).unwrap_err();
        assert!(matches!(err, TradesealError::IncompatibleOrders { .. }));
    }

    #[test]
    fn frontend_split_uses_schedule_fractions() {
        let (buy, sell) = pair(FeeMethod::FrontendSplit);
        let mut schedule = schedule();
        schedule.buy_frontend_fee = Decimal::new(1, 2); // 1%
        schedule.sell_beneficiary_fee = Decimal::new(25, 3); // 2.5%

        let plan = plan_settlement(&buy, &sell, Amount::new(1001, 0), &schedule).unwrap();
        let frontend = fee(&plan, FeeKind::BuyFrontend).unwrap();
        assert_eq!((frontend.from, frontend.to), (BUYER, RELAYER));
        assert_eq!(frontend.amount, Amount::new(10, 0));
        let beneficiary = fee(&plan, FeeKind::SellBeneficiary).unwrap();
        assert_eq!((beneficiary.from, beneficiary.to), (SELLER, BENEFICIARY));
        assert_eq!(beneficiary.amount, Amount::new(25, 0));
        assert!(fee(&plan, FeeKind::SellFrontend).is_none());
    }

    #[test]
    fn mismatched_methods_rejected() {
        let (buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.fee_method = FeeMethod::FrontendSplit;
        let err = plan_settlement(&buy, &sell, Amount::new(10, 0), &schedule()).unwrap_err();
        assert!(matches!(err, TradesealError::FeeMethodMismatch));
    }

    #[test]
    fn seller_fees_cannot_exceed_price() {
        let (mut buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.maker_relayer_fee = 8_000;
        sell.maker_protocol_fee = 5_000;
        buy.taker_relayer_fee = 0;
        let err = plan_settlement(&buy, &sell, Amount::new(100, 0), &schedule()).unwrap_err();
        assert!(matches!(err, TradesealError::PriceOutOfRange { .. }));
    }

    #[test]
    fn buyer_outflow_overflow_is_out_of_range() {
        let (mut buy, mut sell) = pair(FeeMethod::ProtocolSplit);
        sell.taker_relayer_fee = 1;
        buy.taker_relayer_fee = 1;

        let plan = plan_settlement(&buy, &sell, Amount::MAX, &schedule()).unwrap();
        assert_eq!(plan.fees_from(&BUYER).unwrap(), basis_point_fee(Amount::MAX, 1).unwrap());
        let err = plan.buyer_outflow().unwrap_err();
        assert!(matches!(err, TradesealError::PriceOutOfRange { .. }));
        assert_eq!(plan.seller_inflow().unwrap(), Amount::MAX);
    }

    #[test]
    fn fee_total_overflow_is_out_of_range() {
        let leg = FeeTransfer {
            kind: FeeKind::BuyFrontend,
            from: BUYER,
            to: RELAYER,
            amount: Amount::MAX,
        };
        let plan = SettlementPlan {
            buyer: BUYER,
            seller: SELLER,
            price: Amount::ONE,
            fees: vec![leg.clone(), leg],
        };
        let err = plan.fees_from(&BUYER).unwrap_err();
        assert!(matches!(err, TradesealError::PriceOutOfRange { .. }));
        assert_eq!(plan.fees_from(&SELLER).unwrap(), Amount::ZERO);
    }
}
