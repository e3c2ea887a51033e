use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use cos_types::{ContentHash, Origin, PermissionDecision};
use tracing::{debug, info, warn};

use crate::config::GateConfig;
use crate::error::GateResult;
use crate::prompter::{BatchDescription, PermissionPrompter, PromptResponse};
use crate::store::PermissionStore;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Why a read was authorized.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantSource {
    /// The gate runs in permissive mode.
    Permissive,
    /// A persisted `allow-session` decision.
    Persisted,
    /// The user answered a prompt.
    Prompt(PermissionDecision),
}

/// Why a read was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DenialReason {
    /// The origin is recorded as `never-allow` for this session.
    Blocked,
    /// The user just answered `never-allow`; the origin is now blocked.
    NeverAllow,
    Declined,
    Dismissed,
    /// The prompter did not answer within the configured timeout.
    TimedOut,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Blocked => "origin is blocked for this session",
            Self::NeverAllow => "user chose never allow",
            Self::Declined => "user declined",
            Self::Dismissed => "prompt dismissed",
            Self::TimedOut => "prompt timed out",
        };
        f.write_str(text)
    }
}

/// The outcome of a permission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionVerdict {
    Granted(GrantSource),
    Denied(DenialReason),
}

impl PermissionVerdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// Whether answering this check involved showing a prompt.
    pub fn prompted(&self) -> bool {
        match self {
            Self::Granted(GrantSource::Prompt(_)) => true,
            Self::Denied(reason) => !matches!(reason, DenialReason::Blocked),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// PermissionGate
// ---------------------------------------------------------------------------

/// Per-origin permission state machine for read-intent requests.
///
/// ```text
/// unknown ──prompt──▶ allow-once    (authorize this request, store nothing)
///         ──prompt──▶ allow-session (store, authorize)
///         ──prompt──▶ never-allow   (store, deny; terminal)
///         ──decline / dismiss / timeout──▶ deny, store nothing
/// ```
///
/// Create-intent handle requests skip the gate; reading through such a
/// handle does not.
pub struct PermissionGate {
    store: Arc<dyn PermissionStore>,
    prompter: Arc<dyn PermissionPrompter>,
    config: GateConfig,
}

impl PermissionGate {
    pub fn new(
        store: Arc<dyn PermissionStore>,
        prompter: Arc<dyn PermissionPrompter>,
        config: GateConfig,
    ) -> Self {
        Self {
            store,
            prompter,
            config,
        }
    }

    /// The current configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether `origin` may read the given batch.
    pub async fn check(
        &self,
        origin: &Origin,
        hashes: &[ContentHash],
    ) -> GateResult<PermissionVerdict> {
        if self.config.permissive {
            debug!(origin = %origin, "permissive gate, read granted");
            return Ok(PermissionVerdict::Granted(GrantSource::Permissive));
        }

        match self.store.get(origin).await? {
            Some(PermissionDecision::AllowSession) => {
                debug!(origin = %origin, "session permission on record");
                return Ok(PermissionVerdict::Granted(GrantSource::Persisted));
            }
            Some(PermissionDecision::NeverAllow) => {
                warn!(origin = %origin, "read refused, origin blocked");
                return Ok(PermissionVerdict::Denied(DenialReason::Blocked));
            }
            Some(PermissionDecision::AllowOnce) | None => {}
        }

        let batch = BatchDescription::new(origin.clone(), hashes.to_vec());
        let started = Instant::now();
        let response = match self.config.prompt_timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.prompter.ask(origin, &batch)).await {
                    Ok(response) => response?,
                    Err(_) => {
                        warn!(origin = %origin, ?limit, "permission prompt timed out");
                        return Ok(PermissionVerdict::Denied(DenialReason::TimedOut));
                    }
                }
            }
            None => self.prompter.ask(origin, &batch).await?,
        };
        info!(
            origin = %origin,
            files = hashes.len(),
            ?response,
            elapsed = ?started.elapsed(),
            "permission prompt answered"
        );

        let verdict = match response {
            PromptResponse::Decision(decision) => {
                let effective = if decision.is_persistent() {
                    self.store.put(origin, decision).await?
                } else {
                    decision
                };
                if effective.allows() {
                    PermissionVerdict::Granted(GrantSource::Prompt(effective))
                } else {
                    PermissionVerdict::Denied(DenialReason::NeverAllow)
                }
            }
            PromptResponse::Declined => PermissionVerdict::Denied(DenialReason::Declined),
            PromptResponse::Dismissed => PermissionVerdict::Denied(DenialReason::Dismissed),
        };
        Ok(verdict)
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
