//! Fungible token call target.
//!
//! Balances and allowances live in the ledger's token storage, keyed by the
//! address the code runs as (`ctx.this`). Calldata is a selector followed by
//! 32-byte words.

use tradeseal_types::abi::{self, CalldataBuilder, CalldataReader};
use tradeseal_types::{Address, Amount, CallContext, Result, TradesealError};

use crate::executor::{CallEnv, CallTarget};

pub const TRANSFER_SIG: &str = "transfer(address,uint256)";
pub const TRANSFER_FROM_SIG: &str = "transferFrom(address,address,uint256)";
pub const APPROVE_SIG: &str = "approve(address,uint256)";

/// Standard fungible token: `transfer`, `transferFrom`, `approve`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FungibleToken;

impl FungibleToken {
    pub fn transfer_calldata(to: &Address, amount: Amount) -> Result<Vec<u8>> {
        Ok(CalldataBuilder::new(abi::selector(TRANSFER_SIG))
            .address(to)
            .amount(amount)?
            .finish())
    }

    pub fn transfer_from_calldata(from: &Address, to: &Address, amount: Amount) -> Result<Vec<u8>> {
        Ok(CalldataBuilder::new(abi::selector(TRANSFER_FROM_SIG))
            .address(from)
            .address(to)
            .amount(amount)?
            .finish())
    }

    pub fn approve_calldata(spender: &Address, amount: Amount) -> Result<Vec<u8>> {
        Ok(CalldataBuilder::new(abi::selector(APPROVE_SIG))
            .address(spender)
            .amount(amount)?
            .finish())
    }
}

impl CallTarget for FungibleToken {
    fn execute(&self, env: &mut CallEnv<'_>, ctx: CallContext, calldata: &[u8]) -> Result<()> {
        let token = ctx.this;
        let mut reader = CalldataReader::new(calldata);
        let selector = reader.selector()?;

        if selector == abi::selector(TRANSFER_SIG) {
            let to = reader.address()?;
            let amount = reader.amount()?;
            reader.finish()?;
            env.ledger.transfer_token(&token, &ctx.sender, &to, amount)
        } else if selector == abi::selector(TRANSFER_FROM_SIG) {
            let from = reader.address()?;
            let to = reader.address()?;
            let amount = reader.amount()?;
            reader.finish()?;
            let available = env.ledger.token_allowance(&token, &from, &ctx.sender);
            if available < amount {
                return Err(TradesealError::InsufficientAllowance {
                    token,
                    owner: from,
                    spender: ctx.sender,
                    needed: amount,
                    available,
                });
            }
            env.ledger
                .set_token_allowance(&token, &from, &ctx.sender, available - amount);
            env.ledger.transfer_token(&token, &from, &to, amount)
        } else if selector == abi::selector(APPROVE_SIG) {
            let spender = reader.address()?;
            let amount = reader.amount()?;
            reader.finish()?;
            env.ledger
                .set_token_allowance(&token, &ctx.sender, &spender, amount);
            Ok(())
        } else {
            Err(TradesealError::CallReverted {
                target: token,
                reason: format!("unknown selector 0x{}", hex_selector(selector)),
            })
        }
    }
}

fn hex_selector(selector: [u8; 4]) -> String {
    selector.iter().map(|b| format!("{b:02x}")).collect()
}
