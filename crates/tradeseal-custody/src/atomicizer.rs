//! Batch call target.
//!
//! Delegate-called by a proxy, the atomicizer runs a list of calls with the
//! proxy as their sender, so a single order can move several assets at once.
//! If any call fails the whole batch fails.

use tradeseal_types::abi::{self, CalldataBuilder, CalldataReader};
use tradeseal_types::{CallContext, ExternalCall, Result, TradesealError};

use crate::executor::{CallEnv, CallExecutor, CallTarget};

pub const ATOMICIZE_SIG: &str = "atomicize(address[],bytes[])";

#[derive(Debug, Clone, Copy, Default)]
pub struct Atomicizer;

impl Atomicizer {
    /// Encode a batch: count word, then per call its target word, a length
    /// word and the raw calldata.
    pub fn batch_calldata(calls: &[ExternalCall]) -> Result<Vec<u8>> {
        let count = u64::try_from(calls.len())
            .map_err(|_| TradesealError::malformed("too many calls in batch"))?;
        let mut builder = CalldataBuilder::new(abi::selector(ATOMICIZE_SIG)).uint(count);
        for call in calls {
            let len = u64::try_from(call.calldata.len())
                .map_err(|_| TradesealError::malformed("call too long"))?;
            builder = builder.address(&call.target).uint(len).bytes(&call.calldata);
        }
        Ok(builder.finish())
    }

    fn decode(calldata: &[u8]) -> Result<Vec<ExternalCall>> {
        let mut reader = CalldataReader::new(calldata);
        if reader.selector()? != abi::selector(ATOMICIZE_SIG) {
            return Err(TradesealError::malformed("not an atomicize call"));
        }
        let count = reader.uint()?;
        let mut calls = Vec::new();
        for _ in 0..count {
            let target = reader.address()?;
            let len = usize::try_from(reader.uint()?)
                .map_err(|_| TradesealError::malformed("call length overflow"))?;
            let data = reader.bytes(len)?.to_vec();
            calls.push(ExternalCall::call(target, data));
        }
        reader.finish()?;
        Ok(calls)
    }
}

impl CallTarget for Atomicizer {
    fn execute(&self, env: &mut CallEnv<'_>, ctx: CallContext, calldata: &[u8]) -> Result<()> {
        let calls = Self::decode(calldata).map_err(|e| TradesealError::CallReverted {
            target: ctx.this,
            reason: e.to_string(),
        })?;
        for call in &calls {
            CallExecutor::dispatch(env, ctx.sender, ctx.this, call)?;
        }
        Ok(())
    }
}
