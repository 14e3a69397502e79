//! Proxy registry: one proxy per user plus the set of callers trusted to use
//! them.
//!
//! Callers are trusted through the two-phase [`GrantState`] machine. Only
//! the first caller can skip the delay, through the one-shot
//! [`ProxyRegistry::grant_initial_authentication`].

use std::collections::{BTreeSet, HashMap};

use tradeseal_types::constants::PROXY_ADDRESS_DOMAIN;
use tradeseal_types::{Address, RegistryConfig, Result, Timestamp, TradesealError};

use crate::grant::GrantState;
use crate::proxy::AuthenticatedProxy;

#[derive(Debug)]
pub struct ProxyRegistry {
    owner: Address,
    delay: u64,
    current_implementation: u32,
    published: BTreeSet<u32>,
    proxies: HashMap<Address, AuthenticatedProxy>,
    grants: HashMap<Address, GrantState>,
    initial_grant_used: bool,
}

impl ProxyRegistry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            owner: config.owner,
            delay: config.grant_delay_secs,
            current_implementation: config.initial_implementation,
            published: BTreeSet::from([config.initial_implementation]),
            proxies: HashMap::new(),
            grants: HashMap::new(),
            initial_grant_used: false,
        }
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn grant_delay(&self) -> u64 {
        self.delay
    }

    #[must_use]
    pub fn current_implementation(&self) -> u32 {
        self.current_implementation
    }

    /// Address the proxy of `owner` lives at, registered or not.
    #[must_use]
    pub fn proxy_address_of(owner: &Address) -> Address {
        Address::derive(PROXY_ADDRESS_DOMAIN, owner.as_bytes())
    }

    fn require_owner(&self, caller: Address, action: &str) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(TradesealError::Unauthorized {
                caller,
                reason: format!("only the registry owner may {action}"),
            })
        }
    }

    // ---------------------------------------------------------------------
    // Proxies
    // ---------------------------------------------------------------------

    /// Create the caller's proxy. Each user gets exactly one.
    pub fn register_proxy(&mut self, caller: Address) -> Result<Address> {
        if self.proxies.contains_key(&caller) {
            return Err(TradesealError::ProxyAlreadyRegistered(caller));
        }
        let proxy = AuthenticatedProxy {
            owner: caller,
            address: Self::proxy_address_of(&caller),
            implementation: self.current_implementation,
            revoked: false,
        };
        let address = proxy.address;
        self.proxies.insert(caller, proxy);
        tracing::info!(owner = %caller, proxy = %address, "proxy registered");
        Ok(address)
    }

    #[must_use]
    pub fn proxy_for(&self, owner: &Address) -> Option<&AuthenticatedProxy> {
        self.proxies.get(owner)
    }

    fn proxy_mut(&mut self, owner: Address) -> Result<&mut AuthenticatedProxy> {
        self.proxies
            .get_mut(&owner)
            .ok_or(TradesealError::ProxyNotRegistered(owner))
    }

    /// The proxy owner toggles whether registry-authorized callers may use
    /// their proxy.
    pub fn set_proxy_revoked(&mut self, caller: Address, revoked: bool) -> Result<()> {
        let proxy = self.proxy_mut(caller)?;
        proxy.revoked = revoked;
        tracing::info!(owner = %caller, revoked, "proxy registry access changed");
        Ok(())
    }

    /// Registry owner publishes a new implementation version and makes it
    /// current. Versions only increase.
    pub fn publish_implementation(&mut self, caller: Address, version: u32) -> Result<()> {
        self.require_owner(caller, "publish proxy implementations")?;
        if version <= self.current_implementation {
            return Err(TradesealError::malformed(format!(
                "implementation {version} not newer than current {}",
                self.current_implementation
            )));
        }
        self.published.insert(version);
        self.current_implementation = version;
        tracing::info!(version, "proxy implementation published");
        Ok(())
    }

    /// The proxy owner switches their proxy to a published implementation.
    /// The proxy address does not change.
    pub fn upgrade_proxy(&mut self, caller: Address, version: u32) -> Result<()> {
        if !self.published.contains(&version) {
            return Err(TradesealError::ProxyImplementationMismatch {
                expected: self.current_implementation,
                actual: version,
            });
        }
        let proxy = self.proxy_mut(caller)?;
        proxy.implementation = version;
        tracing::info!(owner = %caller, version, "proxy upgraded");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Authorized callers
    // ---------------------------------------------------------------------

    #[must_use]
    pub fn grant_state(&self, addr: &Address) -> GrantState {
        self.grants.get(addr).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_authorized(&self, addr: &Address) -> bool {
        self.grant_state(addr).is_authorized()
    }

    /// Authorize `addr` immediately. Usable once, to bootstrap the first
    /// exchange.
    pub fn grant_initial_authentication(&mut self, caller: Address, addr: Address) -> Result<()> {
        self.require_owner(caller, "grant initial authentication")?;
        if self.initial_grant_used {
            return Err(TradesealError::InvalidGrantTransition {
                addr,
                reason: "initial authentication already granted".into(),
            });
        }
        self.initial_grant_used = true;
        self.grants.insert(addr, GrantState::Authorized);
        tracing::info!(addr = %addr, "initial caller authorized");
        Ok(())
    }

    pub fn start_grant_authentication(
        &mut self,
        caller: Address,
        addr: Address,
        now: Timestamp,
    ) -> Result<()> {
        self.require_owner(caller, "start grants")?;
        let next = self.grant_state(&addr).start(addr, now)?;
        self.grants.insert(addr, next);
        tracing::info!(
            addr = %addr,
            ready_at = now.saturating_add(self.delay),
            "caller grant started"
        );
        Ok(())
    }

    pub fn end_grant_authentication(
        &mut self,
        caller: Address,
        addr: Address,
        now: Timestamp,
    ) -> Result<()> {
        self.require_owner(caller, "end grants")?;
        let next = self.grant_state(&addr).end(addr, now, self.delay)?;
        self.grants.insert(addr, next);
        tracing::info!(addr = %addr, "caller authorized");
        Ok(())
    }

    /// Immediately drop `addr` back to idle, cancelling any pending grant.
    pub fn revoke_authentication(&mut self, caller: Address, addr: Address) -> Result<()> {
        self.require_owner(caller, "revoke callers")?;
        let next = self.grant_state(&addr).revoke();
        self.grants.insert(addr, next);
        tracing::info!(addr = %addr, "caller authorization revoked");
        Ok(())
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<()> {
        self.require_owner(caller, "transfer ownership")?;
        self.owner = new_owner;
        tracing::info!(new_owner = %new_owner, "registry ownership transferred");
        Ok(())
    }
}
