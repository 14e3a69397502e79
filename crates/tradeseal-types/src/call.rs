//! Capability-typed external calls.
//!
//! The settlement layer never invokes arbitrary code directly: it builds an
//! [`ExternalCall`] and hands it to the custody layer's trusted executor,
//! which runs it on behalf of a user's proxy.

use serde::{Deserialize, Serialize};

use crate::Address;

/// How a proxy forwards a call to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HowToCall {
    /// Ordinary call: the target runs with the proxy as sender.
    Call,
    /// The target's code runs in the proxy's own context.
    DelegateCall,
}

impl std::fmt::Display for HowToCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::DelegateCall => write!(f, "DELEGATECALL"),
        }
    }
}

/// `{address, calldata, callKind}`: everything a proxy needs to act.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalCall {
    pub target: Address,
    pub calldata: Vec<u8>,
    pub kind: HowToCall,
}

impl ExternalCall {
    #[must_use]
    pub fn call(target: Address, calldata: Vec<u8>) -> Self {
        Self {
            target,
            calldata,
            kind: HowToCall::Call,
        }
    }

    #[must_use]
    pub fn delegate(target: Address, calldata: Vec<u8>) -> Self {
        Self {
            target,
            calldata,
            kind: HowToCall::DelegateCall,
        }
    }
}

/// Execution context seen by a call target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Immediate caller of the running code.
    pub sender: Address,
    /// Address whose identity and storage the code runs under. For a
    /// delegate call this is the proxy, not the target.
    pub this: Address,
}
