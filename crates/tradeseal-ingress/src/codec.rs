//! Canonical order encoding and hashing.
//!
//! ## Layout
//!
//! Fixed-width fields come first, in this order:
//!
//! | field | bytes |
//! |-------|-------|
//! | exchange, maker, taker | 20 each |
//! | maker/taker relayer fee, maker/taker protocol fee | 4 each, BE |
//! | fee_recipient | 20 |
//! | fee_method, side, sale_kind | 1 each |
//! | target | 20 |
//! | how_to_call | 1 |
//! | static_target | 1 presence byte + 20 |
//! | payment_token | 20 |
//! | base_price, extra | 16 each, normalized decimal |
//! | listing_time, expiration_time | 8 each, BE |
//! | salt | 16, BE |
//!
//! followed by `calldata`, `replacement_pattern` and `static_extradata`,
//! each prefixed with a 4-byte BE length.
//!
//! Every field is covered, so changing any of them (fees included) changes
//! the order hash.

use rust_decimal::Decimal;
use sha2::{Digest, Sha256};
use tradeseal_types::constants::{ORDER_HASH_DOMAIN, SIGNED_MESSAGE_PREFIX};
use tradeseal_types::{
    Address, Amount, FeeMethod, HowToCall, Order, OrderHash, Result, SaleKind, Side,
    TradesealError,
};

/// Size of the fixed-width prefix.
pub const FIXED_LEN: usize = 20 * 3 + 4 * 4 + 20 + 3 + 20 + 1 + 21 + 20 + 16 * 2 + 8 * 2 + 16;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn side_tag(side: Side) -> u8 {
    match side {
        Side::Buy => 0,
        Side::Sell => 1,
    }
}

fn sale_kind_tag(kind: SaleKind) -> u8 {
    match kind {
        SaleKind::FixedPrice => 0,
        SaleKind::Auction => 1,
    }
}

fn fee_method_tag(method: FeeMethod) -> u8 {
    match method {
        FeeMethod::ProtocolSplit => 0,
        FeeMethod::FrontendSplit => 1,
    }
}

fn how_to_call_tag(how: HowToCall) -> u8 {
    match how {
        HowToCall::Call => 0,
        HowToCall::DelegateCall => 1,
    }
}

fn put_var(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| TradesealError::malformed(format!("field of {} bytes too long", bytes.len())))?;
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Canonical byte encoding of `order`.
pub fn encode(order: &Order) -> Result<Vec<u8>> {
    let var_len =
        order.calldata.len() + order.replacement_pattern.len() + order.static_extradata.len();
    let mut buf = Vec::with_capacity(FIXED_LEN + 12 + var_len);

    buf.extend_from_slice(order.exchange.as_bytes());
    buf.extend_from_slice(order.maker.as_bytes());
    buf.extend_from_slice(order.taker.as_bytes());
    buf.extend_from_slice(&order.maker_relayer_fee.to_be_bytes());
    buf.extend_from_slice(&order.taker_relayer_fee.to_be_bytes());
    buf.extend_from_slice(&order.maker_protocol_fee.to_be_bytes());
    buf.extend_from_slice(&order.taker_protocol_fee.to_be_bytes());
    buf.extend_from_slice(order.fee_recipient.as_bytes());
    buf.push(fee_method_tag(order.fee_method));
    buf.push(side_tag(order.side));
    buf.push(sale_kind_tag(order.sale_kind));
    buf.extend_from_slice(order.target.as_bytes());
    buf.push(how_to_call_tag(order.how_to_call));
    match order.static_target {
        Some(addr) => {
            buf.push(1);
            buf.extend_from_slice(addr.as_bytes());
        }
        None => {
            buf.push(0);
            buf.extend_from_slice(Address::ZERO.as_bytes());
        }
    }
    buf.extend_from_slice(order.payment_token.as_bytes());
    buf.extend_from_slice(&order.base_price.normalize().serialize());
    buf.extend_from_slice(&order.extra.normalize().serialize());
    buf.extend_from_slice(&order.listing_time.to_be_bytes());
    buf.extend_from_slice(&order.expiration_time.to_be_bytes());
    buf.extend_from_slice(&order.salt.to_be_bytes());

    put_var(&mut buf, &order.calldata)?;
    put_var(&mut buf, &order.replacement_pattern)?;
    put_var(&mut buf, &order.static_extradata)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                TradesealError::malformed(format!(
                    "order truncated reading {field} at offset {}",
                    self.pos
                ))
            })?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self, field: &str) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field)?);
        Ok(out)
    }

    fn address(&mut self, field: &str) -> Result<Address> {
        Ok(Address(self.array::<20>(field)?))
    }

    fn byte(&mut self, field: &str) -> Result<u8> {
        Ok(self.array::<1>(field)?[0])
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array(field)?))
    }

    fn u64(&mut self, field: &str) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array(field)?))
    }

    fn amount(&mut self, field: &str) -> Result<Amount> {
        let raw: [u8; 16] = self.array(field)?;
        // Flags: bytes 0..4 little-endian, scale in byte 2, sign in the top bit.
        if raw[0] != 0 || raw[1] != 0 || raw[3] & 0x7f != 0 || raw[2] > 28 {
            return Err(TradesealError::malformed(format!("invalid decimal in {field}")));
        }
        let value = Decimal::deserialize(raw);
        if value.normalize().serialize() != raw {
            return Err(TradesealError::malformed(format!(
                "non-canonical decimal in {field}"
            )));
        }
        Ok(value)
    }

    fn var(&mut self, field: &str) -> Result<Vec<u8>> {
        let len = usize::try_from(self.u32(field)?)
            .map_err(|_| TradesealError::malformed(format!("{field} length overflow")))?;
        Ok(self.take(len, field)?.to_vec())
    }
}

fn bad_tag(field: &str, tag: u8) -> TradesealError {
    TradesealError::malformed(format!("unknown {field} tag {tag}"))
}

/// Inverse of [`encode`]. Rejects truncation, trailing bytes, unknown enum
/// tags and non-canonical encodings.
pub fn decode(bytes: &[u8]) -> Result<Order> {
    let mut c = Cursor { data: bytes, pos: 0 };

    let exchange = c.address("exchange")?;
    let maker = c.address("maker")?;
    let taker = c.address("taker")?;
    let maker_relayer_fee = c.u32("maker_relayer_fee")?;
    let taker_relayer_fee = c.u32("taker_relayer_fee")?;
    let maker_protocol_fee = c.u32("maker_protocol_fee")?;
    let taker_protocol_fee = c.u32("taker_protocol_fee")?;
    let fee_recipient = c.address("fee_recipient")?;
    let fee_method = match c.byte("fee_method")? {
        0 => FeeMethod::ProtocolSplit,
        1 => FeeMethod::FrontendSplit,
        t => return Err(bad_tag("fee_method", t)),
    };
    let side = match c.byte("side")? {
        0 => Side::Buy,
        1 => Side::Sell,
        t => return Err(bad_tag("side", t)),
    };
    let sale_kind = match c.byte("sale_kind")? {
        0 => SaleKind::FixedPrice,
        1 => SaleKind::Auction,
        t => return Err(bad_tag("sale_kind", t)),
    };
    let target = c.address("target")?;
    let how_to_call = match c.byte("how_to_call")? {
        0 => HowToCall::Call,
        1 => HowToCall::DelegateCall,
        t => return Err(bad_tag("how_to_call", t)),
    };
    let presence = c.byte("static_target")?;
    let static_addr = c.address("static_target")?;
    let static_target = match presence {
        0 if static_addr.is_zero() => None,
        0 => return Err(TradesealError::malformed("absent static_target has non-zero bytes")),
        1 => Some(static_addr),
        t => return Err(bad_tag("static_target presence", t)),
    };
    let payment_token = c.address("payment_token")?;
    let base_price = c.amount("base_price")?;
    let extra = c.amount("extra")?;
    let listing_time = c.u64("listing_time")?;
    let expiration_time = c.u64("expiration_time")?;
    let salt = u128::from_be_bytes(c.array("salt")?);
    let calldata = c.var("calldata")?;
    let replacement_pattern = c.var("replacement_pattern")?;
    let static_extradata = c.var("static_extradata")?;

    if c.pos != bytes.len() {
        return Err(TradesealError::malformed(format!(
            "{} trailing bytes after order",
            bytes.len() - c.pos
        )));
    }

    Ok(Order {
        exchange,
        maker,
        taker,
        maker_relayer_fee,
        taker_relayer_fee,
        maker_protocol_fee,
        taker_protocol_fee,
        fee_recipient,
        fee_method,
        side,
        sale_kind,
        target,
        how_to_call,
        calldata,
        replacement_pattern,
        static_target,
        static_extradata,
        payment_token,
        base_price,
        extra,
        listing_time,
        expiration_time,
        salt,
    })
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// The order's identity: SHA-256 over a domain tag and the canonical
/// encoding.
pub fn hash_order(order: &Order) -> Result<OrderHash> {
    let mut hasher = Sha256::new();
    hasher.update(ORDER_HASH_DOMAIN);
    hasher.update(encode(order)?);
    Ok(OrderHash(hasher.finalize().into()))
}

/// Digest a maker signs: the order hash under the signed-message prefix.
#[must_use]
pub fn hash_to_sign(hash: &OrderHash) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(b"32");
    hasher.update(hash.as_bytes());
    hasher.finalize().into()
}
