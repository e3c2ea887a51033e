//! Permission gate for cross-origin storage.
//!
//! Every read-intent request passes through the gate before it crosses the
//! isolation boundary. The gate consults a session-scoped
//! [`PermissionStore`], asks an injected [`PermissionPrompter`] when no
//! durable decision exists, and records `allow-session` / `never-allow`
//! answers. `never-allow` is terminal for the session: later reads from that
//! origin are refused without prompting.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cos_gate::{GateConfig, InMemoryPermissionStore, PermissionGate, StaticPrompter};
//! use cos_types::{ContentHash, Origin};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let gate = PermissionGate::new(
//!     Arc::new(InMemoryPermissionStore::new()),
//!     Arc::new(StaticPrompter::allow_session()),
//!     GateConfig::default(),
//! );
//! let origin = Origin::new("example.com").unwrap();
//! let hash = ContentHash::new("SHA-256", "deadbeef");
//! let verdict = gate.check(&origin, &[hash]).await.unwrap();
//! assert!(verdict.is_granted());
//! # });
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod prompter;
pub mod store;

// Re-exports for convenience.
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{DenialReason, GrantSource, PermissionGate, PermissionVerdict};
pub use prompter::{
    BatchDescription, PermissionPrompter, PromptResponse, ScriptedPrompter, StaticPrompter,
};
pub use store::{InMemoryPermissionStore, PermissionStore};

#[cfg(test)]
mod tests {
    use super::*;
    use cos_types::{ContentHash, Origin, PermissionDecision};
    use std::sync::Arc;
    use std::time::Duration;

    /// Helper: the requesting origin.
    fn origin() -> Origin {
        Origin::new("example.com").unwrap()
    }

    fn hashes() -> Vec<ContentHash> {
        vec![ContentHash::new("SHA-256", "deadbeef")]
    }

    fn gate_with(
        answers: Vec<PromptResponse>,
    ) -> (PermissionGate, Arc<InMemoryPermissionStore>, Arc<ScriptedPrompter>) {
        let store = Arc::new(InMemoryPermissionStore::new());
        let prompter = Arc::new(ScriptedPrompter::new(answers));
        let gate = PermissionGate::new(store.clone(), prompter.clone(), GateConfig::default());
        (gate, store, prompter)
    }

    // -----------------------------------------------------------------------
    // 1. Prompt outcomes
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn allow_once_grants_without_persisting() {
        let (gate, store, prompter) =
            gate_with(vec![PromptResponse::Decision(PermissionDecision::AllowOnce)]);
        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(
            verdict,
            PermissionVerdict::Granted(GrantSource::Prompt(PermissionDecision::AllowOnce))
        );
        assert!(store.is_empty());
        assert_eq!(prompter.times_asked(), 1);

        // Nothing was stored, so the next read prompts again.
        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(verdict, PermissionVerdict::Denied(DenialReason::Dismissed));
        assert_eq!(prompter.times_asked(), 2);
    }

    #[tokio::test]
    async fn allow_session_skips_later_prompts() {
        let (gate, store, prompter) =
            gate_with(vec![PromptResponse::Decision(PermissionDecision::AllowSession)]);
        assert!(gate.check(&origin(), &hashes()).await.unwrap().is_granted());
        assert_eq!(
            store.lookup(&origin()).unwrap(),
            Some(PermissionDecision::AllowSession)
        );

        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(verdict, PermissionVerdict::Granted(GrantSource::Persisted));
        assert!(!verdict.prompted());
        assert_eq!(prompter.times_asked(), 1);
    }

    // -----------------------------------------------------------------------
    // 2. Terminality of never-allow
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn never_allow_is_terminal_without_prompting() {
        let (gate, _store, prompter) = gate_with(vec![
            PromptResponse::Decision(PermissionDecision::NeverAllow),
            PromptResponse::Decision(PermissionDecision::AllowSession),
        ]);
        let first = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(first, PermissionVerdict::Denied(DenialReason::NeverAllow));
        assert!(first.prompted());

        for _ in 0..3 {
            let verdict = gate.check(&origin(), &hashes()).await.unwrap();
            assert_eq!(verdict, PermissionVerdict::Denied(DenialReason::Blocked));
            assert!(!verdict.prompted());
        }
        assert_eq!(prompter.times_asked(), 1);
    }

    #[tokio::test]
    async fn preexisting_block_never_prompts() {
        let (gate, store, prompter) = gate_with(vec![]);
        store.record(&origin(), PermissionDecision::NeverAllow).unwrap();
        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(verdict, PermissionVerdict::Denied(DenialReason::Blocked));
        assert_eq!(prompter.times_asked(), 0);
    }

    // -----------------------------------------------------------------------
    // 3. Declines and dismissals leave state untouched
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn decline_and_dismiss_store_nothing() {
        let (gate, store, _prompter) =
            gate_with(vec![PromptResponse::Declined, PromptResponse::Dismissed]);
        assert_eq!(
            gate.check(&origin(), &hashes()).await.unwrap(),
            PermissionVerdict::Denied(DenialReason::Declined)
        );
        assert_eq!(
            gate.check(&origin(), &hashes()).await.unwrap(),
            PermissionVerdict::Denied(DenialReason::Dismissed)
        );
        assert!(store.is_empty());
    }

    // -----------------------------------------------------------------------
    // 4. Configuration
    // -----------------------------------------------------------------------
    #[tokio::test]
    async fn permissive_gate_never_prompts() {
        let store = Arc::new(InMemoryPermissionStore::new());
        store.record(&origin(), PermissionDecision::NeverAllow).unwrap();
        let prompter = Arc::new(ScriptedPrompter::default());
        let gate = PermissionGate::new(store, prompter.clone(), GateConfig::permissive());
        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(verdict, PermissionVerdict::Granted(GrantSource::Permissive));
        assert_eq!(prompter.times_asked(), 0);
    }

    struct StalledPrompter;

    #[async_trait::async_trait]
    impl PermissionPrompter for StalledPrompter {
        async fn ask(&self, _: &Origin, _: &BatchDescription) -> GateResult<PromptResponse> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn prompt_timeout_denies() {
        let gate = PermissionGate::new(
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(StalledPrompter),
            GateConfig::default().with_prompt_timeout(Duration::from_millis(20)),
        );
        let verdict = gate.check(&origin(), &hashes()).await.unwrap();
        assert_eq!(verdict, PermissionVerdict::Denied(DenialReason::TimedOut));
    }

    struct BrokenPrompter;

    #[async_trait::async_trait]
    impl PermissionPrompter for BrokenPrompter {
        async fn ask(&self, _: &Origin, _: &BatchDescription) -> GateResult<PromptResponse> {
            Err(GateError::Prompter("no display".into()))
        }
    }

    #[tokio::test]
    async fn prompter_failure_is_an_error() {
        let gate = PermissionGate::new(
            Arc::new(InMemoryPermissionStore::new()),
            Arc::new(BrokenPrompter),
            GateConfig::default(),
        );
        let err = gate.check(&origin(), &hashes()).await.unwrap_err();
        assert_eq!(err, GateError::Prompter("no display".into()));
    }

    #[tokio::test]
    async fn origins_are_decided_separately() {
        let (gate, _store, prompter) = gate_with(vec![
            PromptResponse::Decision(PermissionDecision::NeverAllow),
            PromptResponse::Decision(PermissionDecision::AllowOnce),
        ]);
        let other = Origin::new("other.org").unwrap();
        assert!(!gate.check(&origin(), &hashes()).await.unwrap().is_granted());
        assert!(gate.check(&other, &hashes()).await.unwrap().is_granted());
        assert_eq!(prompter.times_asked(), 2);
    }
}
