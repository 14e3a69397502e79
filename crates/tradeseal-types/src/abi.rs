//! Minimal ABI-style calldata words.
//!
//! Calldata is a 4-byte selector followed by 32-byte words. Addresses are
//! left-padded, amounts are unsigned big-endian integers. Fixed-width words
//! are what make byte-level replacement masks practical: a counterparty
//! fills exactly the 32 bytes of the field left open.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use sha2::{Digest, Sha256};

use crate::{Address, Amount, Result, TradesealError};

pub const SELECTOR_LEN: usize = 4;
pub const WORD_LEN: usize = 32;

/// 4-byte function selector: leading bytes of SHA-256 of the signature text.
#[must_use]
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Sha256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// Left-pad an address into a word.
#[must_use]
pub fn address_word(addr: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&addr.0);
    word
}

/// Encode a non-negative integral amount into a word.
pub fn amount_word(amount: Amount) -> Result<[u8; 32]> {
    if amount.is_sign_negative() || !amount.fract().is_zero() {
        return Err(TradesealError::malformed(format!(
            "amount {amount} is not a non-negative integer"
        )));
    }
    let value = amount
        .to_u128()
        .ok_or_else(|| TradesealError::malformed(format!("amount {amount} out of range")))?;
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    Ok(word)
}

#[must_use]
pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Builds calldata word by word.
#[derive(Debug, Clone, Default)]
pub struct CalldataBuilder {
    buf: Vec<u8>,
}

impl CalldataBuilder {
    #[must_use]
    pub fn new(selector: [u8; 4]) -> Self {
        let mut buf = Vec::with_capacity(SELECTOR_LEN + 3 * WORD_LEN);
        buf.extend_from_slice(&selector);
        Self { buf }
    }

    #[must_use]
    pub fn address(mut self, addr: &Address) -> Self {
        self.buf.extend_from_slice(&address_word(addr));
        self
    }

    pub fn amount(mut self, amount: Amount) -> Result<Self> {
        self.buf.extend_from_slice(&amount_word(amount)?);
        Ok(self)
    }

    #[must_use]
    pub fn uint(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&u64_word(value));
        self
    }

    /// Raw bytes, unpadded. Callers encode the length first.
    #[must_use]
    pub fn bytes(mut self, data: &[u8]) -> Self {
        self.buf.extend_from_slice(data);
        self
    }

    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Sequential reader over calldata words.
#[derive(Debug)]
pub struct CalldataReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> CalldataReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                TradesealError::malformed(format!(
                    "calldata truncated: need {len} bytes at offset {}, have {}",
                    self.offset,
                    self.data.len()
                ))
            })?;
        let out = &self.data[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    pub fn selector(&mut self) -> Result<[u8; 4]> {
        let raw = self.take(SELECTOR_LEN)?;
        Ok([raw[0], raw[1], raw[2], raw[3]])
    }

    pub fn address(&mut self) -> Result<Address> {
        let word = self.take(WORD_LEN)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(TradesealError::malformed("address word has dirty high bytes"));
        }
        Address::from_slice(&word[12..])
            .ok_or_else(|| TradesealError::Internal("address slice length".into()))
    }

    pub fn amount(&mut self) -> Result<Amount> {
        let word = self.take(WORD_LEN)?;
        if word[..16].iter().any(|b| *b != 0) {
            return Err(TradesealError::malformed("amount word exceeds 128 bits"));
        }
        let mut raw = [0u8; 16];
        raw.copy_from_slice(&word[16..]);
        let value = u128::from_be_bytes(raw);
        Amount::from_u128(value)
            .ok_or_else(|| TradesealError::malformed(format!("amount {value} out of range")))
    }

    pub fn uint(&mut self) -> Result<u64> {
        let word = self.take(WORD_LEN)?;
        if word[..24].iter().any(|b| *b != 0) {
            return Err(TradesealError::malformed("uint word exceeds 64 bits"));
        }
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&word[24..]);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.take(len)
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Fail unless every byte was consumed.
    pub fn finish(self) -> Result<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(TradesealError::malformed(format!(
                "{} trailing calldata bytes",
                self.remaining()
            )))
        }
    }
}
