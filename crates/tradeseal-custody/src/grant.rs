//! Two-phase, time-delayed authorization of registry callers.
//!
//! A contract address becomes a trusted caller of every user proxy only
//! after the registry owner starts a grant and, at least `delay` seconds
//! later, ends it. The delay gives users time to notice a pending grant and
//! revoke their own proxy before a malicious caller becomes live.
//!
//! ```text
//! Idle ──start──▶ PendingSince(t) ──end (now ≥ t + delay)──▶ Authorized
//!   ▲                   │                                        │
//!   └──────revoke───────┴────────────────revoke──────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tradeseal_types::{Address, Result, Timestamp, TradesealError};

/// Authorization state of one candidate caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GrantState {
    #[default]
    Idle,
    PendingSince(Timestamp),
    Authorized,
}

impl GrantState {
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        *self == Self::Authorized
    }

    /// Earliest time a pending grant can be completed.
    #[must_use]
    pub fn ready_at(&self, delay: u64) -> Option<Timestamp> {
        match self {
            Self::PendingSince(t) => Some(t.saturating_add(delay)),
            _ => None,
        }
    }

    /// `Idle → PendingSince(now)`.
    pub fn start(self, addr: Address, now: Timestamp) -> Result<Self> {
        match self {
            Self::Idle => Ok(Self::PendingSince(now)),
            Self::PendingSince(t) => Err(TradesealError::InvalidGrantTransition {
                addr,
                reason: format!("grant already pending since {t}"),
            }),
            Self::Authorized => Err(TradesealError::InvalidGrantTransition {
                addr,
                reason: "already authorized".into(),
            }),
        }
    }

    /// `PendingSince(t) → Authorized` once `now ≥ t + delay`.
    pub fn end(self, addr: Address, now: Timestamp, delay: u64) -> Result<Self> {
        match self {
            Self::PendingSince(t) => {
                let ready_at = t.saturating_add(delay);
                if now < ready_at {
                    return Err(TradesealError::GrantDelayNotElapsed { addr, ready_at, now });
                }
                Ok(Self::Authorized)
            }
            Self::Idle => Err(TradesealError::InvalidGrantTransition {
                addr,
                reason: "no pending grant".into(),
            }),
            Self::Authorized => Err(TradesealError::InvalidGrantTransition {
                addr,
                reason: "already authorized".into(),
            }),
        }
    }

    /// Any state back to `Idle`, immediately.
    #[must_use]
    pub fn revoke(self) -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for GrantState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::PendingSince(t) => write!(f, "PENDING_SINCE({t})"),
            Self::Authorized => write!(f, "AUTHORIZED"),
        }
    }
}
