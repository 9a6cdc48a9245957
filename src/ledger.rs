//! Ledger facts consumed by the registry: current time and account balances.

use crate::types::{Address, Amount, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock in whole seconds
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: u64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Balance collaborator
pub trait BalanceOracle: Send + Sync {
    fn balance_of(&self, address: &Address) -> Amount;
}

/// Fixed balance table; unknown addresses hold zero
#[derive(Debug, Default)]
pub struct StaticBalances {
    balances: RwLock<HashMap<Address, Amount>>,
}

impl StaticBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(balances: HashMap<Address, Amount>) -> Self {
        Self {
            balances: RwLock::new(balances),
        }
    }

    pub fn set(&self, address: Address, amount: Amount) {
        self.balances.write().insert(address, amount);
    }
}

impl BalanceOracle for StaticBalances {
    fn balance_of(&self, address: &Address) -> Amount {
        self.balances.read().get(address).copied().unwrap_or(0)
    }
}
