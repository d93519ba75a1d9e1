//! prot-gate
//!
//! Keyed mutual exclusion for critical sections that wrap a remote
//! read-modify-write with no transactional primitive of its own.
//!
//! # Contract
//! - At most one critical section per [`ResourceKey`] is in flight at any
//!   instant, across every clone of a [`KeyedGate`].
//! - Different keys never wait on each other.
//! - The key is released on every exit path: `Ok`, `Err`, panic unwinding,
//!   and cancellation of the calling future.
//! - A lock-table entry lives exactly as long as some caller is holding or
//!   waiting on its key. An empty table means every key is free.
//!
//! Waiters park on a per-key async mutex rather than polling. There is no
//! timeout and no fairness guarantee beyond what `tokio::sync::Mutex`
//! provides.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tracing::debug;

// ---------------------------------------------------------------------------
// ResourceKey
// ---------------------------------------------------------------------------

/// Opaque, non-empty name of a remote entity; the unit of mutual exclusion.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(String);

impl ResourceKey {
    pub fn new(raw: impl Into<String>) -> Result<Self, GateError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(GateError::EmptyKey);
        }
        Ok(ResourceKey(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Numeric remote ids always make a valid key.
impl From<u64> for ResourceKey {
    fn from(id: u64) -> Self {
        ResourceKey(id.to_string())
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    EmptyKey,
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateError::EmptyKey => write!(f, "resource key must not be empty"),
        }
    }
}

impl std::error::Error for GateError {}

// ---------------------------------------------------------------------------
// KeyedGate
// ---------------------------------------------------------------------------

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Cloneable handle to one lock table. Clones share the table; separately
/// constructed gates are fully independent.
#[derive(Clone, Default)]
pub struct KeyedGate {
    table: Arc<Mutex<HashMap<String, Slot>>>,
}

impl fmt::Debug for KeyedGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedGate")
            .field("live_keys", &self.len())
            .finish()
    }
}

impl KeyedGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `critical_section` while holding `key`, waiting for any current
    /// holder first. The outcome is returned unchanged.
    pub async fn run_exclusive<T, E, F, Fut>(
        &self,
        key: &ResourceKey,
        critical_section: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let lease = self.checkout(key);
        let _held = lease.slot().lock().await;

        debug!(
            key = %key,
            waited_ms = started.elapsed().as_millis() as u64,
            "gate acquired"
        );

        let outcome = critical_section().await;

        debug!(key = %key, ok = outcome.is_ok(), "gate released");
        outcome
    }

    /// True while a critical section is running or waiting on `key`.
    pub fn is_held(&self, key: &str) -> bool {
        self.lock_table().contains_key(key)
    }

    /// Number of live lock-table entries.
    pub fn len(&self) -> usize {
        self.lock_table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The table mutex is only ever held for a map lookup or insert, never
    // across an await, so check-and-register is a single non-suspending step.
    fn lock_table(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn checkout(&self, key: &ResourceKey) -> Lease<'_> {
        let slot = self
            .lock_table()
            .entry(key.as_str().to_string())
            .or_default()
            .clone();
        Lease {
            gate: self,
            key: key.as_str().to_string(),
            slot,
        }
    }
}

/// A registered interest in one key. Dropping it removes the table entry
/// once no other lease references the same slot.
struct Lease<'g> {
    gate: &'g KeyedGate,
    key: String,
    slot: Slot,
}

impl Lease<'_> {
    fn slot(&self) -> &tokio::sync::Mutex<()> {
        &self.slot
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        let mut table = self.gate.lock_table();
        // Release our handle under the table lock: clones are only made under
        // this same lock, so the strong count below is exact. The detached
        // default slot left behind is never in the table.
        drop(std::mem::take(&mut self.slot));
        if table
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            table.remove(&self.key);
        }
    }
}
