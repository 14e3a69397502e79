//! End-to-end settlement tests across all crates.
//!
//! Each scenario builds a small market (exchange, proxy registry, deployed
//! tokens, in-memory ledger) and drives it only through public entry
//! points: order signing, approval and cancellation, registry
//! administration, and `atomic_match`.
//!
//! They verify that rejected matches leave the ledger untouched and that
//! settled matches conserve every asset's supply.

use rust_decimal::Decimal;
use tradeseal_custody::{
    Atomicizer, CallEnv, CallTarget, ContractDirectory, FungibleToken, ProxyRegistry,
};
use tradeseal_ingress::{OrderSigner, hash_order};
use tradeseal_settlement::{Exchange, SignedOrder, Substrate, TxContext, init_tracing};
use tradeseal_types::*;

const EXCHANGE: Address = Address([0xee; 20]);
const OWNER: Address = Address([0x0a; 20]);
const TTP: Address = Address([0x77; 20]);
const RELAYER: Address = Address([0x7e; 20]);
const PROTOCOL: Address = Address([0x9f; 20]);
const ITEM: Address = Address([0x17; 20]);
const ITEM_B: Address = Address([0x18; 20]);
const PAY_TOKEN: Address = Address([0xaa; 20]);
const ATOMICIZER: Address = Address([0xa7; 20]);
const PREDICATE: Address = Address([0x5a; 20]);
const OBSERVER: Address = Address([0xc4; 20]);

/// Call target that reverts unless both order hashes are already final
/// when it runs.
struct FinalizationObserver {
    buy: OrderHash,
    sell: OrderHash,
}

impl CallTarget for FinalizationObserver {
    fn execute(&self, env: &mut CallEnv<'_>, _ctx: CallContext, _calldata: &[u8]) -> Result<()> {
        for hash in [&self.buy, &self.sell] {
            let status = env.ledger.order_status(hash);
            if status != OrderStatus::Finalized {
                return Err(TradesealError::CallReverted {
                    target: OBSERVER,
                    reason: format!("order {hash} still {status:?} during call"),
                });
            }
        }
        Ok(())
    }
}

/// Helper: one exchange deployment with a single buyer and seller.
struct Market {
    exchange: Exchange,
    registry: ProxyRegistry,
    contracts: ContractDirectory,
    ledger: MemoryLedger,
    clock: ManualClock,
    buyer: OrderSigner,
    seller: OrderSigner,
    seller_proxy: Address,
}

impl Market {
    fn new() -> Self {
        let mut config = ExchangeConfig::new(EXCHANGE, OWNER, TTP);
        config.fees.protocol_fee_recipient = PROTOCOL;
        Self::with_config(config)
    }

    fn with_config(config: ExchangeConfig) -> Self {
        init_tracing("warn", false).unwrap();
        let mut registry = ProxyRegistry::new(config.registry.clone());
        registry
            .grant_initial_authentication(config.registry.owner, EXCHANGE)
            .unwrap();
        let exchange = Exchange::new(config).expect("valid config");

        let seller = OrderSigner::from_secret_bytes(&[0x51; 32]).unwrap();
        let buyer = OrderSigner::from_secret_bytes(&[0xb1; 32]).unwrap();
        let seller_proxy = registry.register_proxy(seller.address()).unwrap();

        let mut contracts = ContractDirectory::new();
        contracts.deploy(ITEM, FungibleToken);
        contracts.deploy(ITEM_B, FungibleToken);
        contracts.deploy(PAY_TOKEN, FungibleToken);
        contracts.deploy(ATOMICIZER, Atomicizer);

        let mut ledger = MemoryLedger::new();
        ledger.mint_token(ITEM, seller_proxy, Amount::ONE).unwrap();
        ledger.mint_native(buyer.address(), Amount::from(20_000)).unwrap();

        Self {
            exchange,
            registry,
            contracts,
            ledger,
            clock: ManualClock::new(1_000),
            buyer,
            seller,
            seller_proxy,
        }
    }

    fn settle(&mut self, tx: &TxContext, buy: &SignedOrder, sell: &SignedOrder) -> Result<MatchReceipt> {
        let mut sub = Substrate::new(&mut self.ledger, &self.registry, &self.contracts);
        self.exchange.atomic_match(&mut sub, tx, buy, sell, [0; 32])
    }

    /// Sell one ITEM for `price` native units; the seller's order carries
    /// the relayer.
    fn item_orders(&self, price: i64) -> (Order, Order) {
        let calldata = FungibleToken::transfer_calldata(&self.buyer.address(), Amount::ONE).unwrap();
        let mut sell = Order::dummy(EXCHANGE, self.seller.address(), Side::Sell, ITEM);
        sell.calldata = calldata.clone();
        sell.fee_recipient = RELAYER;
        sell.base_price = Amount::from(price);
        let mut buy = Order::dummy(EXCHANGE, self.buyer.address(), Side::Buy, ITEM);
        buy.calldata = calldata;
        buy.base_price = Amount::from(price);
        (buy, sell)
    }

    fn signed_item_orders(&self, price: i64) -> (SignedOrder, SignedOrder) {
        let (buy, sell) = self.item_orders(price);
        (sign(&self.buyer, buy), sign(&self.seller, sell))
    }

    fn relayer_tx(&self) -> TxContext {
        TxContext::at(RELAYER, &self.clock)
    }

    fn buyer_tx(&self, value: i64) -> TxContext {
        TxContext::at(self.buyer.address(), &self.clock).with_value(Amount::from(value))
    }

    fn native(&self, who: &Address) -> Amount {
        self.ledger.native_balance(who)
    }
}

fn sign(signer: &OrderSigner, order: Order) -> SignedOrder {
    let hash = hash_order(&order).unwrap();
    SignedOrder::new(order, signer.sign(&hash))
}

// =========================================================================
// Settlement
// =========================================================================

#[test]
fn native_settlement_with_protocol_fees() {
    let mut m = Market::new();
    let (mut buy, mut sell) = m.item_orders(10_000);
    sell.maker_relayer_fee = 250;
    sell.taker_relayer_fee = 100;
    sell.maker_protocol_fee = 50;
    sell.taker_protocol_fee = 25;
    buy.taker_relayer_fee = 100;
    buy.taker_protocol_fee = 25;

    // The buyer submits, so its own order needs no signature.
    let buy = SignedOrder::unsigned(buy);
    let sell = sign(&m.seller, sell);
    let tx = m.buyer_tx(10_200);
    let receipt = m.settle(&tx, &buy, &sell).unwrap();

    assert_eq!(receipt.price, Amount::from(10_000));
    assert_eq!(receipt.fees_paid_by(&m.seller.address()), Amount::from(300));
    assert_eq!(receipt.fees_paid_by(&m.buyer.address()), Amount::from(125));
    assert_eq!(receipt.settled_at, 1_000);

    assert_eq!(m.native(&m.seller.address()), Amount::from(9_700));
    assert_eq!(m.native(&RELAYER), Amount::from(350));
    assert_eq!(m.native(&PROTOCOL), Amount::from(75));
    assert_eq!(m.native(&m.buyer.address()), Amount::from(9_875));
    assert_eq!(m.native(&EXCHANGE), Amount::ZERO);
    assert_eq!(m.ledger.native_supply(), Amount::from(20_000));

    assert_eq!(m.ledger.token_balance(&ITEM, &m.buyer.address()), Amount::ONE);
    assert_eq!(m.ledger.token_balance(&ITEM, &m.seller_proxy), Amount::ZERO);
    assert_eq!(m.ledger.token_supply(&ITEM), Amount::ONE);
}

#[test]
fn token_settlement_with_frontend_fees_and_bundle() {
    let frontend = Address([0xfe; 20]);
    let beneficiary = Address([0xbe; 20]);
    let mut config = ExchangeConfig::new(EXCHANGE, OWNER, TTP);
    config.fees.public_beneficiary = beneficiary;
    config.fees.buy_frontend_fee = Decimal::new(1, 2);
    config.fees.buy_beneficiary_fee = Decimal::new(5, 3);
    config.fees.sell_frontend_fee = Decimal::new(2, 2);
    config.fees.sell_beneficiary_fee = Decimal::new(1, 2);
    let mut m = Market::with_config(config);

    let buyer = m.buyer.address();
    let seller = m.seller.address();
    m.ledger.mint_token(ITEM_B, m.seller_proxy, Amount::from(5)).unwrap();
    m.ledger.mint_token(PAY_TOKEN, buyer, Amount::from(2_000)).unwrap();
    m.ledger.set_token_allowance(&PAY_TOKEN, &buyer, &TTP, Amount::from(2_000));
    m.ledger.set_token_allowance(&PAY_TOKEN, &seller, &TTP, Amount::from(2_000));

    // One order moves two assets: the proxy delegate-calls the atomicizer.
    let bundle = Atomicizer::batch_calldata(&[
        ExternalCall::call(ITEM, FungibleToken::transfer_calldata(&buyer, Amount::ONE).unwrap()),
        ExternalCall::call(ITEM_B, FungibleToken::transfer_calldata(&buyer, Amount::from(5)).unwrap()),
    ])
    .unwrap();
    let order = |maker: Address, side: Side| {
        let mut o = Order::dummy(EXCHANGE, maker, side, ATOMICIZER);
        o.how_to_call = HowToCall::DelegateCall;
        o.calldata = bundle.clone();
        o.fee_method = FeeMethod::FrontendSplit;
        o.payment_token = PAY_TOKEN;
        o.base_price = Amount::from(1_000);
        o
    };
    let mut buy = order(buyer, Side::Buy);
    buy.fee_recipient = frontend;
    let sell = order(seller, Side::Sell);

    let buy = sign(&m.buyer, buy);
    let sell = sign(&m.seller, sell);
    let tx = m.relayer_tx();

    // Unlisted payment tokens are refused before anything moves.
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::InvalidOrderParameters { .. }));
    assert_eq!(m.ledger.token_balance(&PAY_TOKEN, &buyer), Amount::from(2_000));
    assert_eq!(m.ledger.token_balance(&ITEM_B, &m.seller_proxy), Amount::from(5));

    m.exchange.set_payment_token_whitelisted(OWNER, PAY_TOKEN, true).unwrap();
    let receipt = m.settle(&tx, &buy, &sell).unwrap();

    assert_eq!(receipt.payment_token, PAY_TOKEN);
    assert_eq!(receipt.fee_transfers.len(), 4);
    assert_eq!(m.ledger.token_balance(&PAY_TOKEN, &buyer), Amount::from(985));
    assert_eq!(m.ledger.token_balance(&PAY_TOKEN, &seller), Amount::from(970));
    assert_eq!(m.ledger.token_balance(&PAY_TOKEN, &frontend), Amount::from(30));
    assert_eq!(m.ledger.token_balance(&PAY_TOKEN, &beneficiary), Amount::from(15));
    assert_eq!(m.ledger.token_supply(&PAY_TOKEN), Amount::from(2_000));

    assert_eq!(m.ledger.token_balance(&ITEM, &buyer), Amount::ONE);
    assert_eq!(m.ledger.token_balance(&ITEM_B, &buyer), Amount::from(5));
    assert_eq!(m.ledger.token_balance(&ITEM_B, &m.seller_proxy), Amount::ZERO);
}

#[test]
fn auction_settles_at_current_sell_price() {
    let mut m = Market::new();
    let (mut buy, mut sell) = m.item_orders(100);
    sell.sale_kind = SaleKind::Auction;
    sell.extra = Amount::from(100);
    sell.listing_time = 1_000;
    sell.expiration_time = 1_100;
    buy.base_price = Amount::from(200);
    let buy = SignedOrder::unsigned(buy);
    let sell = sign(&m.seller, sell);

    m.clock.advance(50);
    let tx = m.buyer_tx(200);
    let receipt = m.settle(&tx, &buy, &sell).unwrap();

    assert_eq!(receipt.price, Amount::from(150));
    assert_eq!(m.native(&m.seller.address()), Amount::from(150));
    // Excess value is refunded.
    assert_eq!(m.native(&m.buyer.address()), Amount::from(19_850));
}

#[test]
fn masked_recipient_filled_by_buyer() {
    let mut m = Market::new();
    let (mut buy, mut sell) = m.item_orders(100);
    // The seller leaves the recipient word open for any buyer.
    sell.calldata = FungibleToken::transfer_calldata(&Address::ZERO, Amount::ONE).unwrap();
    let mut mask = vec![0u8; sell.calldata.len()];
    mask[4..36].fill(0xff);
    sell.replacement_pattern = mask;
    buy.calldata = FungibleToken::transfer_calldata(&m.buyer.address(), Amount::ONE).unwrap();

    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));
    let tx = m.buyer_tx(100);
    m.settle(&tx, &buy, &sell).unwrap();
    assert_eq!(m.ledger.token_balance(&ITEM, &m.buyer.address()), Amount::ONE);
}

// =========================================================================
// Rejections
// =========================================================================

#[test]
fn self_match_rejected() {
    let mut m = Market::new();
    let (_, sell) = m.signed_item_orders(100);
    let tx = m.relayer_tx();
    let err = m.settle(&tx, &sell, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::SelfMatch(_)));
}

#[test]
fn double_settle_fails_and_leaves_balances() {
    let mut m = Market::new();
    m.ledger.mint_token(ITEM, m.seller_proxy, Amount::ONE).unwrap();
    let (buy, sell) = m.signed_item_orders(100);
    let tx = m.buyer_tx(100);
    m.settle(&tx, &buy, &sell).unwrap();

    let buyer_before = m.native(&m.buyer.address());
    let seller_before = m.native(&m.seller.address());
    let err = m.settle(&tx, &buy, &sell).unwrap_err();

    assert!(matches!(err, TradesealError::OrderFinalized(_)));
    assert_eq!(err.kind(), ErrorKind::ReplayOrDoubleSpend);
    assert_eq!(m.native(&m.buyer.address()), buyer_before);
    assert_eq!(m.native(&m.seller.address()), seller_before);
    assert_eq!(m.ledger.token_balance(&ITEM, &m.seller_proxy), Amount::ONE);
}

#[test]
fn underpriced_buy_rejected_without_effects() {
    let mut m = Market::new();
    let (mut buy, sell) = m.item_orders(100);
    buy.base_price = Amount::from(90);
    let buy_hash = hash_order(&buy).unwrap();
    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));

    let tx = m.buyer_tx(100);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::PriceNotCrossed { .. }));
    assert_eq!(m.ledger.order_status(&buy_hash), OrderStatus::Unseen);
    assert_eq!(m.native(&m.buyer.address()), Amount::from(20_000));
}

#[test]
fn insufficient_value_rejected() {
    let mut m = Market::new();
    let (buy, sell) = m.signed_item_orders(100);
    let tx = m.buyer_tx(99);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::InvalidAttachedValue { .. }));
}

#[test]
fn failing_call_reverts_finalization() {
    let mut m = Market::new();
    let (mut buy, mut sell) = m.item_orders(100);
    // The proxy only holds one ITEM.
    let calldata = FungibleToken::transfer_calldata(&m.buyer.address(), Amount::from(2)).unwrap();
    buy.calldata = calldata.clone();
    sell.calldata = calldata;
    let sell_hash = hash_order(&sell).unwrap();
    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));

    let tx = m.buyer_tx(100);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::ProxyCallFailed { target } if target == ITEM));
    assert_eq!(m.ledger.order_status(&sell_hash), OrderStatus::Unseen);
    assert_eq!(m.native(&m.buyer.address()), Amount::from(20_000));
    assert_eq!(m.ledger.open_snapshots(), 0);
}

#[test]
fn orders_are_final_before_the_call_runs() {
    let mut m = Market::new();
    let (mut buy, mut sell) = m.item_orders(100);
    buy.target = OBSERVER;
    sell.target = OBSERVER;
    buy.calldata = vec![0xca, 0x11];
    sell.calldata = vec![0xca, 0x11];
    let (buy_hash, sell_hash) = (hash_order(&buy).unwrap(), hash_order(&sell).unwrap());
    m.contracts.deploy(
        OBSERVER,
        FinalizationObserver {
            buy: buy_hash,
            sell: sell_hash,
        },
    );
    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));

    let tx = m.buyer_tx(100);
    m.settle(&tx, &buy, &sell).unwrap();
    assert_eq!(m.ledger.order_status(&buy_hash), OrderStatus::Finalized);
    assert_eq!(m.ledger.order_status(&sell_hash), OrderStatus::Finalized);
    assert_eq!(m.native(&m.buyer.address()), Amount::from(19_900));
}

#[test]
fn static_predicate_vetoes_fill() {
    let mut m = Market::new();
    let seller_proxy = m.seller_proxy;
    // Only fills that leave the proxy holding stock pass.
    m.contracts.deploy_predicate(PREDICATE, move |_: &[u8], ledger: &dyn Ledger| {
        ledger.token_balance(&ITEM, &seller_proxy) > Amount::ONE
    });
    let (buy, mut sell) = m.item_orders(100);
    sell.static_target = Some(PREDICATE);
    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));

    let tx = m.buyer_tx(100);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::StaticPredicateRejected { target } if target == PREDICATE));

    m.ledger.mint_token(ITEM, seller_proxy, Amount::ONE).unwrap();
    m.settle(&tx, &buy, &sell).unwrap();
}

#[test]
fn expired_order_rejected() {
    let mut m = Market::new();
    let (buy, mut sell) = m.item_orders(100);
    sell.expiration_time = 1_010;
    let (buy, sell) = (sign(&m.buyer, buy), sign(&m.seller, sell));
    m.clock.set(1_010);
    let tx = m.buyer_tx(100);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::OutsideTimeWindow { now: 1_010, .. }));
}

// =========================================================================
// Authorization and custody
// =========================================================================

#[test]
fn registry_revocation_blocks_then_regrant_restores() {
    let mut m = Market::new();
    let (buy, sell) = m.signed_item_orders(100);
    let tx = m.buyer_tx(100);

    m.registry.revoke_authentication(OWNER, EXCHANGE).unwrap();
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::ProxyAccessDenied { caller, .. } if caller == EXCHANGE));

    let now = m.clock.now();
    m.registry.start_grant_authentication(OWNER, EXCHANGE, now).unwrap();
    m.registry
        .end_grant_authentication(OWNER, EXCHANGE, now + constants::DEFAULT_GRANT_DELAY_SECS)
        .unwrap();
    m.settle(&tx, &buy, &sell).unwrap();
}

#[test]
fn user_revoked_proxy_blocks_then_reenable_restores() {
    let mut m = Market::new();
    let (buy, sell) = m.signed_item_orders(100);
    let tx = m.buyer_tx(100);
    let seller = m.seller.address();

    m.registry.set_proxy_revoked(seller, true).unwrap();
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AuthorizationFailure);

    m.registry.set_proxy_revoked(seller, false).unwrap();
    m.settle(&tx, &buy, &sell).unwrap();
}

#[test]
fn grant_delay_is_enforced() {
    let mut config = ExchangeConfig::new(EXCHANGE, OWNER, TTP);
    config.registry.grant_delay_secs = 3_600;
    let mut m = Market::with_config(config);
    let second_exchange = Address([0xef; 20]);

    m.registry
        .start_grant_authentication(OWNER, second_exchange, 1_000)
        .unwrap();
    let err = m
        .registry
        .end_grant_authentication(OWNER, second_exchange, 4_599)
        .unwrap_err();
    assert!(matches!(err, TradesealError::GrantDelayNotElapsed { ready_at: 4_600, .. }));
    assert!(!m.registry.is_authorized(&second_exchange));

    m.registry
        .end_grant_authentication(OWNER, second_exchange, 4_600)
        .unwrap();
    assert!(m.registry.is_authorized(&second_exchange));
    // The bootstrap grant was already spent on the first exchange.
    assert!(m
        .registry
        .grant_initial_authentication(OWNER, second_exchange)
        .is_err());
}

#[test]
fn unsigned_order_needs_approval() {
    let mut m = Market::new();
    let (buy, sell) = m.item_orders(100);
    let buy = sign(&m.buyer, buy);
    let sell = SignedOrder::unsigned(sell);
    let tx = m.buyer_tx(100);

    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::OrderNotAuthorized(_)));

    let seller_tx = TxContext::at(m.seller.address(), &m.clock);
    m.exchange
        .approve_order(&mut m.ledger, &seller_tx, &sell.order, false)
        .unwrap();
    m.settle(&tx, &buy, &sell).unwrap();
}

#[test]
fn cancelled_order_cannot_settle() {
    let mut m = Market::new();
    let (buy, sell) = m.signed_item_orders(100);
    let seller_tx = TxContext::at(m.seller.address(), &m.clock);
    let event = m
        .exchange
        .cancel_order(&mut m.ledger, &seller_tx, &sell.order)
        .unwrap();
    assert!(matches!(event, ExchangeEvent::OrderCancelled { .. }));
    // Cancelling again is a no-op, whoever calls.
    let relayer_tx = m.relayer_tx();
    m.exchange
        .cancel_order(&mut m.ledger, &relayer_tx, &sell.order)
        .unwrap();

    let tx = m.buyer_tx(100);
    let err = m.settle(&tx, &buy, &sell).unwrap_err();
    assert!(matches!(err, TradesealError::OrderFinalized(_)));
}

// =========================================================================
// Configuration
// =========================================================================

#[test]
fn exchange_from_json_config() {
    let json = serde_json::json!({
        "exchange_id": EXCHANGE,
        "owner": OWNER,
        "token_transfer_proxy": TTP,
        "fees": {
            "protocol_fee_recipient": PROTOCOL,
            "minimum_maker_protocol_fee": 0,
            "minimum_taker_protocol_fee": 0,
            "public_beneficiary": Address::ZERO,
            "buy_frontend_fee": "0",
            "buy_beneficiary_fee": "0",
            "sell_frontend_fee": "0.025",
            "sell_beneficiary_fee": "0",
        },
        "registry": {
            "owner": OWNER,
            "grant_delay_secs": 60,
            "initial_implementation": 1,
        },
    });
    let config = ExchangeConfig::from_json_str(&json.to_string()).unwrap();
    assert_eq!(config.fees.sell_frontend_fee, Decimal::new(25, 3));
    assert_eq!(config.registry.grant_delay_secs, 60);

    let m = Market::with_config(config);
    assert_eq!(m.exchange.address(), EXCHANGE);
    assert_eq!(m.registry.grant_delay(), 60);

    let bad = json.to_string().replace("0.025", "1.5");
    assert!(matches!(
        ExchangeConfig::from_json_str(&bad),
        Err(TradesealError::Configuration(_))
    ));
}
