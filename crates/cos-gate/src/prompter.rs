use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cos_types::{ContentHash, Origin, PermissionDecision};

use crate::error::{GateError, GateResult};

/// What the user is being asked to approve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchDescription {
    pub origin: Origin,
    pub hashes: Vec<ContentHash>,
}

impl BatchDescription {
    pub fn new(origin: Origin, hashes: Vec<ContentHash>) -> Self {
        Self { origin, hashes }
    }

    /// Human-readable prompt text.
    pub fn message(&self) -> String {
        match self.hashes.as_slice() {
            [single] => format!(
                "{} wants to access the file {} stored on this device.",
                self.origin, single
            ),
            many => format!(
                "{} wants to access {} files stored on this device.",
                self.origin,
                many.len()
            ),
        }
    }
}

/// How a prompt was resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptResponse {
    /// The user picked one of the decision options.
    Decision(PermissionDecision),
    /// The user explicitly refused this request (without "never allow").
    Declined,
    /// The prompt was closed without an answer.
    Dismissed,
}

/// Consent surface: a native dialog, a terminal prompt, or an automated
/// policy.
#[async_trait]
pub trait PermissionPrompter: Send + Sync {
    async fn ask(&self, origin: &Origin, batch: &BatchDescription) -> GateResult<PromptResponse>;
}

/// Answers every prompt the same way.
#[derive(Clone, Copy, Debug)]
pub struct StaticPrompter(pub PromptResponse);

impl StaticPrompter {
    pub fn allow_once() -> Self {
        Self(PromptResponse::Decision(PermissionDecision::AllowOnce))
    }

    pub fn allow_session() -> Self {
        Self(PromptResponse::Decision(PermissionDecision::AllowSession))
    }

    pub fn never_allow() -> Self {
        Self(PromptResponse::Decision(PermissionDecision::NeverAllow))
    }

    pub fn decline() -> Self {
        Self(PromptResponse::Declined)
    }
}

#[async_trait]
impl PermissionPrompter for StaticPrompter {
    async fn ask(&self, _origin: &Origin, _batch: &BatchDescription) -> GateResult<PromptResponse> {
        Ok(self.0)
    }
}

/// Replays queued answers in order and counts how often it was asked.
///
/// Once the queue is empty every prompt is dismissed.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<PromptResponse>>,
    asked: AtomicUsize,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = PromptResponse>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: AtomicUsize::new(0),
        }
    }

    /// Number of prompts shown so far.
    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionPrompter for ScriptedPrompter {
    async fn ask(&self, _origin: &Origin, _batch: &BatchDescription) -> GateResult<PromptResponse> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let mut answers = self
            .answers
            .lock()
            .map_err(|e| GateError::Prompter(format!("lock poisoned: {e}")))?;
        Ok(answers.pop_front().unwrap_or(PromptResponse::Dismissed))
    }
}
