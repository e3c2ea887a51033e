use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use cos_types::{Origin, PermissionDecision};
use tracing::{info, warn};

use crate::error::{GateError, GateResult};

/// Session-scoped memory of per-origin decisions.
///
/// Implementations must uphold:
/// - `AllowOnce` is never persisted; `put` returns it unchanged.
/// - Once `NeverAllow` is recorded for an origin it is terminal for the
///   session; later `put`s for that origin return `NeverAllow`.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// The persisted decision for `origin`, if any.
    async fn get(&self, origin: &Origin) -> GateResult<Option<PermissionDecision>>;

    /// Record a decision and return the decision now in effect.
    async fn put(
        &self,
        origin: &Origin,
        decision: PermissionDecision,
    ) -> GateResult<PermissionDecision>;
}

/// `HashMap`-backed decision table. Data lives as long as the value does,
/// which is exactly one storage-host session.
#[derive(Debug, Default)]
pub struct InMemoryPermissionStore {
    decisions: RwLock<HashMap<Origin, PermissionDecision>>,
}

impl InMemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronous lookup for callers that already own the table.
    pub fn lookup(&self, origin: &Origin) -> GateResult<Option<PermissionDecision>> {
        let map = self
            .decisions
            .read()
            .map_err(|e| GateError::Store(format!("lock poisoned: {e}")))?;
        Ok(map.get(origin).copied())
    }

    /// Synchronous record; see [`PermissionStore::put`] for the rules.
    pub fn record(
        &self,
        origin: &Origin,
        decision: PermissionDecision,
    ) -> GateResult<PermissionDecision> {
        if !decision.is_persistent() {
            return Ok(decision);
        }
        let mut map = self
            .decisions
            .write()
            .map_err(|e| GateError::Store(format!("lock poisoned: {e}")))?;
        if map.get(origin) == Some(&PermissionDecision::NeverAllow) {
            if decision != PermissionDecision::NeverAllow {
                warn!(origin = %origin, requested = %decision, "origin is blocked for this session");
            }
            return Ok(PermissionDecision::NeverAllow);
        }
        map.insert(origin.clone(), decision);
        info!(origin = %origin, decision = %decision, "permission recorded");
        Ok(decision)
    }

    pub fn len(&self) -> usize {
        self.decisions.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PermissionStore for InMemoryPermissionStore {
    async fn get(&self, origin: &Origin) -> GateResult<Option<PermissionDecision>> {
        self.lookup(origin)
    }

    async fn put(
        &self,
        origin: &Origin,
        decision: PermissionDecision,
    ) -> GateResult<PermissionDecision> {
        self.record(origin, decision)
    }
}
