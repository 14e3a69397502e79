//! Token transfer proxy.
//!
//! Users approve this single address once per token; registry-authorized
//! callers (the exchange) then pull token payments through it.

use tradeseal_types::{Address, Amount, ExternalCall, Result, TradesealError};

use crate::executor::{CallEnv, CallExecutor};
use crate::registry::ProxyRegistry;
use crate::token::FungibleToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransferProxy {
    pub address: Address,
}

impl TokenTransferProxy {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Move `amount` of `token` from `from` to `to`, spending the allowance
    /// `from` granted to this proxy.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer_from(
        &self,
        registry: &ProxyRegistry,
        env: &mut CallEnv<'_>,
        caller: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if !registry.is_authorized(&caller) {
            return Err(TradesealError::Unauthorized {
                caller,
                reason: "token transfer proxy requires a registry-authorized caller".into(),
            });
        }
        let calldata = FungibleToken::transfer_from_calldata(&from, &to, amount)?;
        CallExecutor::dispatch(env, caller, self.address, &ExternalCall::call(token, calldata))
    }
}
