//! Explicit state abstraction.
//!
//! Every piece of mutable state the settlement core touches lives behind
//! [`Ledger`]: native balances, fungible-token balances and allowances, and
//! the per-hash [`OrderStatus`]. Components receive it by `&mut dyn Ledger`
//! (or `&dyn Ledger` for read-only use), so each can be tested without a full
//! execution substrate.
//!
//! Transactions are modelled with nested snapshots: [`with_rollback`] runs a
//! closure and restores the snapshot if it fails, which is how both the
//! atomic match and individual proxy legs get all-or-nothing semantics.

use std::collections::HashMap;

use crate::{Address, Amount, OrderHash, OrderStatus, Result, TradesealError};

/// Handle to a ledger snapshot; only valid on the ledger that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotId(pub usize);

/// Shared keyed store of balances, allowances and order status.
pub trait Ledger {
    // --- native asset ---
    fn native_balance(&self, owner: &Address) -> Amount;
    fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()>;

    // --- fungible tokens (storage keyed by token contract address) ---
    fn token_balance(&self, token: &Address, owner: &Address) -> Amount;
    fn token_allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount;
    fn set_token_allowance(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    );
    fn transfer_token(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()>;

    // --- order status ---
    fn order_status(&self, hash: &OrderHash) -> OrderStatus;
    fn set_order_status(&mut self, hash: OrderHash, status: OrderStatus);

    // --- transactional boundary ---
    fn snapshot(&mut self) -> SnapshotId;
    /// Restore the state captured by `id`, discarding it and any later
    /// snapshots.
    fn revert_to(&mut self, id: SnapshotId);
    /// Keep the current state; discard `id` and any later snapshots.
    fn release(&mut self, id: SnapshotId);
}

/// Move `hash` to `status`, enforcing the monotonic status machine.
pub fn transition_order(ledger: &mut dyn Ledger, hash: OrderHash, status: OrderStatus) -> Result<()> {
    let current = ledger.order_status(&hash);
    if !current.can_transition_to(status) {
        return Err(match current {
            OrderStatus::Finalized => TradesealError::OrderFinalized(hash),
            OrderStatus::Approved if status == OrderStatus::Approved => {
                TradesealError::OrderAlreadyApproved(hash)
            }
            _ => TradesealError::InvalidStatusTransition {
                hash,
                from: current,
                to: status,
            },
        });
    }
    ledger.set_order_status(hash, status);
    Ok(())
}

/// Run `f` inside a snapshot; on error every write `f` made is undone.
pub fn with_rollback<T>(
    ledger: &mut dyn Ledger,
    f: impl FnOnce(&mut dyn Ledger) -> Result<T>,
) -> Result<T> {
    let snapshot = ledger.snapshot();
    match f(ledger) {
        Ok(value) => {
            ledger.release(snapshot);
            Ok(value)
        }
        Err(err) => {
            ledger.revert_to(snapshot);
            Err(err)
        }
    }
}

#[derive(Debug, Clone, Default)]
struct LedgerState {
    native: HashMap<Address, Amount>,
    tokens: HashMap<(Address, Address), Amount>,
    allowances: HashMap<(Address, Address, Address), Amount>,
    orders: HashMap<OrderHash, OrderStatus>,
}

/// In-memory [`Ledger`] with copy-on-snapshot rollback.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: LedgerState,
    snapshots: Vec<LedgerState>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit native balance out of thin air (genesis funding).
    pub fn mint_native(&mut self, owner: Address, amount: Amount) -> Result<()> {
        let credited = credit(Address::ZERO, owner, self.native_balance(&owner), amount)?;
        self.state.native.insert(owner, credited);
        Ok(())
    }

    /// Credit token balance out of thin air (token genesis).
    pub fn mint_token(&mut self, token: Address, owner: Address, amount: Amount) -> Result<()> {
        let credited = credit(token, owner, self.token_balance(&token, &owner), amount)?;
        self.state.tokens.insert((token, owner), credited);
        Ok(())
    }

    /// Sum of all balances of `token`; transfers must conserve it.
    #[must_use]
    pub fn token_supply(&self, token: &Address) -> Amount {
        self.state
            .tokens
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, amount)| *amount)
            .sum()
    }

    /// Sum of all native balances.
    #[must_use]
    pub fn native_supply(&self) -> Amount {
        self.state.native.values().copied().sum()
    }

    /// Number of open snapshots (zero outside any transaction).
    #[must_use]
    pub fn open_snapshots(&self) -> usize {
        self.snapshots.len()
    }
}

/// New balance of `owner` after receiving `amount`; the debit side is
/// untouched when this fails.
fn credit(asset: Address, owner: Address, balance: Amount, amount: Amount) -> Result<Amount> {
    balance
        .checked_add(amount)
        .ok_or_else(|| TradesealError::PriceOutOfRange {
            reason: format!("balance overflow: {owner} crediting {amount} of {asset}"),
        })
}

impl Ledger for MemoryLedger {
    fn native_balance(&self, owner: &Address) -> Amount {
        self.state.native.get(owner).copied().unwrap_or_default()
    }

    fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let available = self.native_balance(from);
        if available < amount {
            return Err(TradesealError::InsufficientBalance {
                asset: Address::ZERO,
                owner: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = credit(Address::ZERO, *to, self.native_balance(to), amount)?;
        self.state.native.insert(*from, available - amount);
        self.state.native.insert(*to, credited);
        Ok(())
    }

    fn token_balance(&self, token: &Address, owner: &Address) -> Amount {
        self.state
            .tokens
            .get(&(*token, *owner))
            .copied()
            .unwrap_or_default()
    }

    fn token_allowance(&self, token: &Address, owner: &Address, spender: &Address) -> Amount {
        self.state
            .allowances
            .get(&(*token, *owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    fn set_token_allowance(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) {
        self.state
            .allowances
            .insert((*token, *owner, *spender), amount);
    }

    fn transfer_token(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<()> {
        let available = self.token_balance(token, from);
        if available < amount {
            return Err(TradesealError::InsufficientBalance {
                asset: *token,
                owner: *from,
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = credit(*token, *to, self.token_balance(token, to), amount)?;
        self.state.tokens.insert((*token, *from), available - amount);
        self.state.tokens.insert((*token, *to), credited);
        Ok(())
    }

    fn order_status(&self, hash: &OrderHash) -> OrderStatus {
        self.state.orders.get(hash).copied().unwrap_or_default()
    }

    fn set_order_status(&mut self, hash: OrderHash, status: OrderStatus) {
        self.state.orders.insert(hash, status);
    }

    fn snapshot(&mut self) -> SnapshotId {
        self.snapshots.push(self.state.clone());
        SnapshotId(self.snapshots.len() - 1)
    }

    fn revert_to(&mut self, id: SnapshotId) {
        if id.0 < self.snapshots.len() {
            self.snapshots.truncate(id.0 + 1);
            if let Some(saved) = self.snapshots.pop() {
                self.state = saved;
            }
        }
    }

    fn release(&mut self, id: SnapshotId) {
        self.snapshots.truncate(id.0);
    }
}
