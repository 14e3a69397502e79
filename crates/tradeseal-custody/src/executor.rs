//! The single trusted call executor and the contract directory it resolves
//! targets from.
//!
//! Nothing in the workspace runs a call target directly. Proxies, the token
//! transfer proxy and batch executors all go through
//! [`CallExecutor::dispatch`], which fixes the [`CallContext`] according to
//! the call kind.

use std::collections::HashMap;

use tradeseal_types::{
    Address, CallContext, ExternalCall, HowToCall, Ledger, Result, TradesealError, with_rollback,
};

/// Code deployed at an address. `Err` reverts the call.
pub trait CallTarget {
    fn execute(&self, env: &mut CallEnv<'_>, ctx: CallContext, calldata: &[u8]) -> Result<()>;
}

/// Read-only predicate deployed at an address.
pub trait StaticPredicate {
    fn check(&self, data: &[u8], ledger: &dyn Ledger) -> bool;
}

impl<F> StaticPredicate for F
where
    F: Fn(&[u8], &dyn Ledger) -> bool,
{
    fn check(&self, data: &[u8], ledger: &dyn Ledger) -> bool {
        self(data, ledger)
    }
}

/// Address → deployed code.
#[derive(Default)]
pub struct ContractDirectory {
    targets: HashMap<Address, Box<dyn CallTarget>>,
    predicates: HashMap<Address, Box<dyn StaticPredicate>>,
}

impl ContractDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy `target` at `addr`, replacing whatever was there.
    pub fn deploy(&mut self, addr: Address, target: impl CallTarget + 'static) {
        self.targets.insert(addr, Box::new(target));
    }

    pub fn deploy_predicate(&mut self, addr: Address, predicate: impl StaticPredicate + 'static) {
        self.predicates.insert(addr, Box::new(predicate));
    }

    #[must_use]
    pub fn target(&self, addr: &Address) -> Option<&dyn CallTarget> {
        self.targets.get(addr).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn predicate(&self, addr: &Address) -> Option<&dyn StaticPredicate> {
        self.predicates.get(addr).map(AsRef::as_ref)
    }

    /// Whether any code is deployed at `addr`.
    #[must_use]
    pub fn has_code(&self, addr: &Address) -> bool {
        self.targets.contains_key(addr) || self.predicates.contains_key(addr)
    }
}

impl std::fmt::Debug for ContractDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractDirectory")
            .field("targets", &self.targets.len())
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

/// Mutable state plus deployed code, as seen by a running call.
pub struct CallEnv<'a> {
    pub ledger: &'a mut dyn Ledger,
    pub contracts: &'a ContractDirectory,
}

impl<'a> CallEnv<'a> {
    pub fn new(ledger: &'a mut dyn Ledger, contracts: &'a ContractDirectory) -> Self {
        Self { ledger, contracts }
    }

    /// Run `f` inside a ledger snapshot, reverting on error.
    pub fn transact<T>(&mut self, f: impl FnOnce(&mut CallEnv<'_>) -> Result<T>) -> Result<T> {
        let contracts = self.contracts;
        with_rollback(&mut *self.ledger, |ledger| f(&mut CallEnv::new(ledger, contracts)))
    }
}

/// Executes [`ExternalCall`]s on behalf of an account.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallExecutor;

impl CallExecutor {
    /// Run `call` from the account at `executing`, which was itself invoked
    /// by `sender`.
    ///
    /// - `Call`: the target sees `executing` as its sender and runs as itself.
    /// - `DelegateCall`: the target's code runs as `executing`, and `sender`
    ///   is passed through unchanged.
    pub fn dispatch(
        env: &mut CallEnv<'_>,
        sender: Address,
        executing: Address,
        call: &ExternalCall,
    ) -> Result<()> {
        let contracts = env.contracts;
        let target = contracts
            .target(&call.target)
            .ok_or(TradesealError::NoCodeAtTarget(call.target))?;
        let ctx = match call.kind {
            HowToCall::Call => CallContext {
                sender: executing,
                this: call.target,
            },
            HowToCall::DelegateCall => CallContext {
                sender,
                this: executing,
            },
        };
        tracing::trace!(
            target_addr = %call.target,
            kind = %call.kind,
            sender = %ctx.sender,
            this = %ctx.this,
            "dispatching call"
        );
        target.execute(env, ctx, &call.calldata)
    }
}
