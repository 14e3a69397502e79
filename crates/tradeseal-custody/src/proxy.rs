//! Per-user authenticated proxies.
//!
//! A proxy holds a user's approvals and assets-in-flight. It forwards calls
//! for its owner, and for registry-authorized callers (the exchange) unless
//! the owner has revoked registry access on it.

use serde::{Deserialize, Serialize};
use tradeseal_types::{Address, ExternalCall, Result, TradesealError};

use crate::executor::{CallEnv, CallExecutor};
use crate::registry::ProxyRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedProxy {
    pub owner: Address,
    /// Stable across upgrades; derived from `owner`.
    pub address: Address,
    /// Implementation version this proxy currently runs.
    pub implementation: u32,
    /// When set, registry-authorized callers may no longer use this proxy.
    pub revoked: bool,
}

impl AuthenticatedProxy {
    /// Whether `caller` may drive this proxy.
    #[must_use]
    pub fn accepts(&self, registry: &ProxyRegistry, caller: &Address) -> bool {
        *caller == self.owner || (!self.revoked && registry.is_authorized(caller))
    }

    /// Forward `call`. An unauthorized caller is an error; a failing call is
    /// `Ok(false)` with its ledger effects rolled back.
    pub fn proxy(
        &self,
        registry: &ProxyRegistry,
        env: &mut CallEnv<'_>,
        caller: Address,
        call: &ExternalCall,
    ) -> Result<bool> {
        if !self.accepts(registry, &caller) {
            return Err(TradesealError::ProxyAccessDenied {
                caller,
                owner: self.owner,
            });
        }
        let outcome = env.transact(|env| CallExecutor::dispatch(env, caller, self.address, call));
        match outcome {
            Ok(()) => Ok(true),
            Err(err) => {
                tracing::warn!(
                    proxy = %self.address,
                    target_addr = %call.target,
                    error = %err,
                    "proxied call failed, rolled back"
                );
                Ok(false)
            }
        }
    }

    /// [`proxy`](Self::proxy), turning a failed call into an error.
    pub fn proxy_assert(
        &self,
        registry: &ProxyRegistry,
        env: &mut CallEnv<'_>,
        caller: Address,
        call: &ExternalCall,
    ) -> Result<()> {
        if self.proxy(registry, env, caller, call)? {
            Ok(())
        } else {
            Err(TradesealError::ProxyCallFailed {
                target: call.target,
            })
        }
    }
}
