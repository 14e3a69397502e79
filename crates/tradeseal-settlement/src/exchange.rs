//! Exchange entry points.
//!
//! The [`Exchange`] owns configuration and the signature verifier; all
//! mutable state (ledger, proxy registry, deployed code) is passed in per
//! call through a [`Substrate`]. `atomic_match` is the only entry point that
//! makes external calls, and it finalizes both order hashes before any of
//! them runs.

use tradeseal_custody::{CallEnv, ContractDirectory, ProxyRegistry, TokenTransferProxy};
use tradeseal_ingress::{OrderValidator, SignatureVerifier, codec, require_static_predicate};
use tradeseal_matchcore::{self as matchcore, SettlementPlan};
use tradeseal_types::constants::{ENGINE_NAME, INVERSE_BASIS_POINT, VERSION};
use tradeseal_types::{
    Address, Amount, Clock, ExchangeConfig, ExchangeEvent, ExternalCall, FeeSchedule, Ledger,
    MatchId, MatchReceipt, Order, OrderHash, OrderSignature, OrderStatus, Result, Timestamp,
    TradesealError, transition_order,
};

use crate::funds::{PaymentContext, check_attached_value, settle_payments};

/// Transaction-level inputs: who is calling, with how much native value,
/// at what logical time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxContext {
    pub sender: Address,
    pub value: Amount,
    pub now: Timestamp,
}

impl TxContext {
    #[must_use]
    pub fn new(sender: Address, now: Timestamp) -> Self {
        Self {
            sender,
            value: Amount::ZERO,
            now,
        }
    }

    /// Context stamped with `clock`'s current time.
    #[must_use]
    pub fn at(sender: Address, clock: &dyn Clock) -> Self {
        Self::new(sender, clock.now())
    }

    #[must_use]
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// World state an entry point runs against.
pub struct Substrate<'a> {
    pub ledger: &'a mut dyn Ledger,
    pub registry: &'a ProxyRegistry,
    pub contracts: &'a ContractDirectory,
}

impl<'a> Substrate<'a> {
    pub fn new(
        ledger: &'a mut dyn Ledger,
        registry: &'a ProxyRegistry,
        contracts: &'a ContractDirectory,
    ) -> Self {
        Self {
            ledger,
            registry,
            contracts,
        }
    }
}

/// An order with the signature presented for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedOrder {
    pub order: Order,
    pub signature: OrderSignature,
}

impl SignedOrder {
    #[must_use]
    pub fn new(order: Order, signature: OrderSignature) -> Self {
        Self { order, signature }
    }

    /// An order authorized on-chain or by the transaction sender.
    #[must_use]
    pub fn unsigned(order: Order) -> Self {
        Self::new(order, OrderSignature::EMPTY)
    }
}

#[derive(Debug)]
pub struct Exchange {
    config: ExchangeConfig,
    verifier: SignatureVerifier,
    transfer_proxy: TokenTransferProxy,
}

impl Exchange {
    pub fn new(config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        let transfer_proxy = TokenTransferProxy::new(config.token_transfer_proxy);
        tracing::info!(
            engine = ENGINE_NAME,
            version = VERSION,
            exchange = %config.exchange_id,
            owner = %config.owner,
            transfer_proxy = %transfer_proxy.address,
            payment_tokens = config.payment_token_whitelist.len(),
            "exchange initialized"
        );
        Ok(Self {
            config,
            verifier: SignatureVerifier::new(),
            transfer_proxy,
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.config.exchange_id
    }

    #[must_use]
    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    fn validator(&self) -> OrderValidator<'_> {
        OrderValidator::new(&self.config, &self.verifier)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn hash_order(&self, order: &Order) -> Result<OrderHash> {
        codec::hash_order(order)
    }

    #[must_use]
    pub fn validate_order_parameters(&self, order: &Order) -> bool {
        self.validator().validate_order_parameters(order)
    }

    /// Whether `order` could settle at `now` on the strength of `signature`
    /// or a prior approval.
    #[must_use]
    pub fn validate_order(
        &self,
        ledger: &dyn Ledger,
        order: &Order,
        signature: &OrderSignature,
        now: Timestamp,
    ) -> bool {
        match codec::hash_order(order) {
            Ok(hash) => self
                .validator()
                .validate_order(&hash, order, signature, ledger, now),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn order_status(&self, ledger: &dyn Ledger, hash: &OrderHash) -> OrderStatus {
        ledger.order_status(hash)
    }

    pub fn calculate_current_price(&self, order: &Order, now: Timestamp) -> Result<Amount> {
        matchcore::current_price(order, now)
    }

    #[must_use]
    pub fn orders_can_match(&self, buy: &Order, sell: &Order, now: Timestamp) -> bool {
        buy.exchange == self.address() && matchcore::orders_can_match(buy, sell, now)
    }

    pub fn calculate_match_price(&self, buy: &Order, sell: &Order, now: Timestamp) -> Result<Amount> {
        matchcore::calculate_match_price(buy, sell, now)
    }

    // ---------------------------------------------------------------------
    // Order lifecycle
    // ---------------------------------------------------------------------

    /// The maker approves `order` on-chain, so it settles without a
    /// signature.
    pub fn approve_order(
        &self,
        ledger: &mut dyn Ledger,
        tx: &TxContext,
        order: &Order,
        order_book_inclusion_desired: bool,
    ) -> Result<ExchangeEvent> {
        if tx.sender != order.maker {
            return Err(TradesealError::Unauthorized {
                caller: tx.sender,
                reason: "only the maker may approve an order".into(),
            });
        }
        self.validator().check_order_parameters(order)?;
        let hash = codec::hash_order(order)?;
        transition_order(ledger, hash, OrderStatus::Approved)?;
        tracing::info!(hash = %hash, maker = %order.maker, order_book_inclusion_desired, "order approved");
        Ok(ExchangeEvent::OrderApproved {
            hash,
            maker: order.maker,
            order_book_inclusion_desired,
        })
    }

    /// The maker cancels `order` by finalizing its hash. Cancelling an
    /// already finalized hash succeeds without effect, whoever calls.
    pub fn cancel_order(
        &self,
        ledger: &mut dyn Ledger,
        tx: &TxContext,
        order: &Order,
    ) -> Result<ExchangeEvent> {
        let hash = codec::hash_order(order)?;
        if ledger.order_status(&hash).is_finalized() {
            tracing::debug!(hash = %hash, "cancel of finalized order ignored");
            return Ok(ExchangeEvent::OrderCancelled { hash });
        }
        if tx.sender != order.maker {
            return Err(TradesealError::Unauthorized {
                caller: tx.sender,
                reason: "only the maker may cancel an order".into(),
            });
        }
        transition_order(ledger, hash, OrderStatus::Finalized)?;
        tracing::info!(hash = %hash, maker = %order.maker, "order cancelled");
        Ok(ExchangeEvent::OrderCancelled { hash })
    }

    // ---------------------------------------------------------------------
    // Settlement
    // ---------------------------------------------------------------------

    /// Settle `buy` against `sell` in one all-or-nothing step.
    ///
    /// On success both hashes are finalized, the merged call has run through
    /// the seller's proxy and every payment leg has moved. On failure the
    /// ledger is exactly as it was.
    pub fn atomic_match(
        &self,
        sub: &mut Substrate<'_>,
        tx: &TxContext,
        buy: &SignedOrder,
        sell: &SignedOrder,
        metadata: [u8; 32],
    ) -> Result<MatchReceipt> {
        match self.try_atomic_match(sub, tx, buy, sell, metadata) {
            Ok(receipt) => {
                tracing::info!(
                    match_id = %receipt.match_id,
                    buy_hash = %receipt.buy_hash,
                    sell_hash = %receipt.sell_hash,
                    price = %receipt.price,
                    fees = receipt.fee_transfers.len(),
                    "orders matched"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    sender = %tx.sender,
                    buy_maker = %buy.order.maker,
                    sell_maker = %sell.order.maker,
                    error = %err,
                    "atomic match rejected"
                );
                Err(err)
            }
        }
    }

    fn try_atomic_match(
        &self,
        sub: &mut Substrate<'_>,
        tx: &TxContext,
        buy: &SignedOrder,
        sell: &SignedOrder,
        metadata: [u8; 32],
    ) -> Result<MatchReceipt> {
        let buy_hash = codec::hash_order(&buy.order)?;
        let sell_hash = codec::hash_order(&sell.order)?;
        if buy_hash == sell_hash {
            return Err(TradesealError::SelfMatch(buy_hash));
        }

        let validator = self.validator();
        validator.require_valid_order(
            &buy_hash,
            &buy.order,
            &buy.signature,
            Some(&tx.sender),
            &*sub.ledger,
            tx.now,
        )?;
        validator.require_valid_order(
            &sell_hash,
            &sell.order,
            &sell.signature,
            Some(&tx.sender),
            &*sub.ledger,
            tx.now,
        )?;

        matchcore::check_orders_match(&buy.order, &sell.order, tx.now)?;
        if !sub.contracts.has_code(&sell.order.target) {
            return Err(TradesealError::NoCodeAtTarget(sell.order.target));
        }
        let terms = matchcore::match_terms(&buy.order, &sell.order, tx.now)?;
        let plan = matchcore::plan_settlement(&buy.order, &sell.order, terms.price, &self.config.fees)?;

        require_static_predicate(&buy.order, &terms.calldata, sub.contracts, &*sub.ledger)?;
        require_static_predicate(&sell.order, &terms.calldata, sub.contracts, &*sub.ledger)?;
        check_attached_value(&plan, &sell.order.payment_token, tx.value)?;

        let call = ExternalCall {
            target: sell.order.target,
            calldata: terms.calldata,
            kind: sell.order.how_to_call,
        };
        let payment = PaymentContext {
            exchange: self.address(),
            sender: tx.sender,
            attached_value: tx.value,
            payment_token: sell.order.payment_token,
            transfer_proxy: &self.transfer_proxy,
            registry: sub.registry,
        };
        self.execute(sub, buy_hash, sell_hash, &sell.order.maker, &call, &payment, &plan)?;

        Ok(MatchReceipt {
            match_id: MatchId::deterministic(&buy_hash, &sell_hash),
            buy_hash,
            sell_hash,
            buyer: plan.buyer,
            seller: plan.seller,
            payment_token: sell.order.payment_token,
            price: plan.price,
            fee_transfers: plan.fees,
            metadata,
            settled_at: tx.now,
        })
    }

    /// Everything inside the ledger snapshot: finalize, call, pay.
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        sub: &mut Substrate<'_>,
        buy_hash: OrderHash,
        sell_hash: OrderHash,
        seller: &Address,
        call: &ExternalCall,
        payment: &PaymentContext<'_>,
        plan: &SettlementPlan,
    ) -> Result<()> {
        let registry = sub.registry;
        let mut env = CallEnv::new(&mut *sub.ledger, sub.contracts);
        env.transact(|env| {
            transition_order(&mut *env.ledger, buy_hash, OrderStatus::Finalized)?;
            transition_order(&mut *env.ledger, sell_hash, OrderStatus::Finalized)?;

            let proxy = registry
                .proxy_for(seller)
                .ok_or(TradesealError::ProxyNotRegistered(*seller))?;
            if proxy.implementation != registry.current_implementation() {
                return Err(TradesealError::ProxyImplementationMismatch {
                    expected: registry.current_implementation(),
                    actual: proxy.implementation,
                });
            }
            proxy.proxy_assert(registry, env, self.address(), call)?;
            settle_payments(env, payment, plan)
        })
    }

    // ---------------------------------------------------------------------
    // Administration
    // ---------------------------------------------------------------------

    fn require_owner(&self, caller: Address, action: &str) -> Result<()> {
        if caller == self.config.owner {
            Ok(())
        } else {
            Err(TradesealError::Unauthorized {
                caller,
                reason: format!("only the exchange owner may {action}"),
            })
        }
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.config.owner
    }

    pub fn set_fee_schedule(&mut self, caller: Address, fees: FeeSchedule) -> Result<()> {
        self.require_owner(caller, "set fees")?;
        fees.validate()?;
        self.config.fees = fees;
        tracing::info!("fee schedule replaced");
        Ok(())
    }

    pub fn set_minimum_protocol_fees(&mut self, caller: Address, maker: u32, taker: u32) -> Result<()> {
        self.require_owner(caller, "set protocol fee minimums")?;
        if maker > INVERSE_BASIS_POINT || taker > INVERSE_BASIS_POINT {
            return Err(TradesealError::Configuration(format!(
                "minimum protocol fees must not exceed {INVERSE_BASIS_POINT} bps"
            )));
        }
        self.config.fees.minimum_maker_protocol_fee = maker;
        self.config.fees.minimum_taker_protocol_fee = taker;
        tracing::info!(maker, taker, "minimum protocol fees changed");
        Ok(())
    }

    pub fn set_protocol_fee_recipient(&mut self, caller: Address, recipient: Address) -> Result<()> {
        self.require_owner(caller, "set the protocol fee recipient")?;
        self.config.fees.protocol_fee_recipient = recipient;
        tracing::info!(recipient = %recipient, "protocol fee recipient changed");
        Ok(())
    }

    pub fn set_public_beneficiary(&mut self, caller: Address, beneficiary: Address) -> Result<()> {
        self.require_owner(caller, "set the public beneficiary")?;
        self.config.fees.public_beneficiary = beneficiary;
        tracing::info!(beneficiary = %beneficiary, "public beneficiary changed");
        Ok(())
    }

    /// Allow or disallow `token` as an order's payment token. The native
    /// asset needs no listing.
    pub fn set_payment_token_whitelisted(
        &mut self,
        caller: Address,
        token: Address,
        whitelisted: bool,
    ) -> Result<()> {
        self.require_owner(caller, "change the payment token whitelist")?;
        if token.is_zero() {
            return Err(TradesealError::Configuration(
                "the native asset is always accepted".into(),
            ));
        }
        if whitelisted {
            self.config.payment_token_whitelist.insert(token);
        } else {
            self.config.payment_token_whitelist.remove(&token);
        }
        tracing::info!(token = %token, whitelisted, "payment token whitelist changed");
        Ok(())
    }

    #[must_use]
    pub fn is_payment_token_whitelisted(&self, token: &Address) -> bool {
        self.config.payment_token_whitelist.contains(token)
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.require_owner(caller, "transfer ownership")?;
        self.config.owner = new_owner;
        tracing::info!(new_owner = %new_owner, "exchange ownership transferred");
        Ok(())
    }
}
