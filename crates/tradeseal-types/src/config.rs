//! Configuration for an exchange deployment and its proxy registry.

use std::collections::BTreeSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Address, Result, TradesealError, constants};

/// Top-level configuration of one exchange instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// The exchange's own address; orders must name it in `exchange`.
    pub exchange_id: Address,
    /// Account allowed to change fee settings.
    pub owner: Address,
    /// Address of the token transfer proxy users approve for payments.
    pub token_transfer_proxy: Address,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Tokens orders may name as `payment_token`. The native asset is
    /// always accepted.
    #[serde(default)]
    pub payment_token_whitelist: BTreeSet<Address>,
}

/// Fee parameters for both fee schemes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Receives protocol fees under the protocol-split scheme.
    pub protocol_fee_recipient: Address,
    /// Floor on `maker_protocol_fee` for protocol-split orders (bps).
    pub minimum_maker_protocol_fee: u32,
    /// Floor on `taker_protocol_fee` for protocol-split orders (bps).
    pub minimum_taker_protocol_fee: u32,
    /// Receives the beneficiary share under the frontend-split scheme.
    pub public_beneficiary: Address,
    /// Fraction of the price the buyer pays the frontend.
    pub buy_frontend_fee: Decimal,
    /// Fraction of the price the buyer pays the public beneficiary.
    pub buy_beneficiary_fee: Decimal,
    /// Fraction of the price the seller pays the frontend.
    pub sell_frontend_fee: Decimal,
    /// Fraction of the price the seller pays the public beneficiary.
    pub sell_beneficiary_fee: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            protocol_fee_recipient: Address::ZERO,
            minimum_maker_protocol_fee: 0,
            minimum_taker_protocol_fee: 0,
            public_beneficiary: Address::ZERO,
            buy_frontend_fee: Decimal::ZERO,
            buy_beneficiary_fee: Decimal::ZERO,
            sell_frontend_fee: Decimal::ZERO,
            sell_beneficiary_fee: Decimal::ZERO,
        }
    }
}

impl FeeSchedule {
    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("buy_frontend_fee", self.buy_frontend_fee),
            ("buy_beneficiary_fee", self.buy_beneficiary_fee),
            ("sell_frontend_fee", self.sell_frontend_fee),
            ("sell_beneficiary_fee", self.sell_beneficiary_fee),
        ];
        for (name, value) in fractions {
            if value.is_sign_negative() || value >= Decimal::ONE {
                return Err(TradesealError::Configuration(format!(
                    "{name} must be in [0, 1), got {value}"
                )));
            }
        }
        let bp = constants::INVERSE_BASIS_POINT;
        if self.minimum_maker_protocol_fee > bp || self.minimum_taker_protocol_fee > bp {
            return Err(TradesealError::Configuration(format!(
                "minimum protocol fees must not exceed {bp} bps"
            )));
        }
        Ok(())
    }
}

/// Proxy registry parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Account allowed to grant and revoke caller authorization.
    pub owner: Address,
    /// Minimum seconds between starting and ending a grant.
    pub grant_delay_secs: u64,
    /// Implementation version new proxies are created with.
    pub initial_implementation: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            owner: Address::ZERO,
            grant_delay_secs: constants::DEFAULT_GRANT_DELAY_SECS,
            initial_implementation: constants::INITIAL_PROXY_IMPLEMENTATION,
        }
    }
}

impl ExchangeConfig {
    /// Minimal config for an exchange at `exchange_id` owned by `owner`.
    #[must_use]
    pub fn new(exchange_id: Address, owner: Address, token_transfer_proxy: Address) -> Self {
        Self {
            exchange_id,
            owner,
            token_transfer_proxy,
            fees: FeeSchedule::default(),
            registry: RegistryConfig {
                owner,
                ..RegistryConfig::default()
            },
            payment_token_whitelist: BTreeSet::new(),
        }
    }

    /// Whether orders may settle in `token`.
    #[must_use]
    pub fn accepts_payment_token(&self, token: &Address) -> bool {
        token.is_zero() || self.payment_token_whitelist.contains(token)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| TradesealError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.exchange_id.is_zero() {
            return Err(TradesealError::Configuration(
                "exchange_id must be non-zero".into(),
            ));
        }
        if self.registry.grant_delay_secs == 0 {
            return Err(TradesealError::Configuration(
                "grant_delay_secs must be positive".into(),
            ));
        }
        self.fees.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> ExchangeConfig {
        ExchangeConfig::new(Address([1; 20]), Address([2; 20]), Address([3; 20]))
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = cfg();
        cfg.validate().unwrap();
        assert_eq!(cfg.registry.owner, Address([2; 20]));
        assert_eq!(cfg.registry.grant_delay_secs, constants::DEFAULT_GRANT_DELAY_SECS);
    }

    #[test]
    fn fraction_out_of_range_rejected() {
        let mut cfg = cfg();
        cfg.fees.sell_frontend_fee = Decimal::ONE;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TradesealError::Configuration(_)));
    }

    #[test]
    fn native_always_accepted_tokens_need_listing() {
        let token = Address([0xaa; 20]);
        let json = serde_json::json!({
            "exchange_id": Address([1; 20]),
            "owner": Address([2; 20]),
            "token_transfer_proxy": Address([3; 20]),
            "payment_token_whitelist": [token],
        });
        let cfg = ExchangeConfig::from_json_str(&json.to_string()).unwrap();
        assert!(cfg.accepts_payment_token(&Address::ZERO));
        assert!(cfg.accepts_payment_token(&token));
        assert!(!cfg.accepts_payment_token(&Address([0xab; 20])));
        assert!(!self::cfg().accepts_payment_token(&token));
    }

    #[test]
    fn zero_delay_rejected() {
        let mut cfg = cfg();
        cfg.registry.grant_delay_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn json_roundtrip_and_defaults() {
        let json = serde_json::to_string(&cfg()).unwrap();
        let back = ExchangeConfig::from_json_str(&json).unwrap();
        assert_eq!(back.exchange_id, Address([1; 20]));
        assert_eq!(back.fees, FeeSchedule::default());

        // `fees` and `registry` fall back to defaults when omitted.
        let minimal = serde_json::json!({
            "exchange_id": Address([1; 20]),
            "owner": Address([2; 20]),
            "token_transfer_proxy": Address([3; 20]),
        });
        let parsed = ExchangeConfig::from_json_str(&minimal.to_string()).unwrap();
        assert_eq!(parsed.registry, RegistryConfig::default());
    }
}
