use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use cos_gate::{
    BatchDescription, GateError, GateResult, PermissionPrompter, PromptResponse, StaticPrompter,
};
use cos_types::{Origin, PermissionDecision};

use crate::cli::Assume;

/// Asks on stderr and reads the answer from stdin.
pub struct TerminalPrompter;

#[async_trait]
impl PermissionPrompter for TerminalPrompter {
    async fn ask(&self, _origin: &Origin, batch: &BatchDescription) -> GateResult<PromptResponse> {
        let message = batch.message();
        tokio::task::spawn_blocking(move || {
            let mut stderr = io::stderr();
            writeln!(stderr, "{message}")?;
            write!(stderr, "Allow [o]nce, for this [s]ession, [n]ever, or decline? ")?;
            stderr.flush()?;
            let mut line = String::new();
            let read = io::stdin().lock().read_line(&mut line)?;
            Ok::<_, io::Error>(if read == 0 {
                PromptResponse::Dismissed
            } else {
                parse_answer(&line)
            })
        })
        .await
        .map_err(|e| GateError::Prompter(e.to_string()))?
        .map_err(|e| GateError::Prompter(e.to_string()))
    }
}

/// Anything that is not a recognised decision declines.
pub fn parse_answer(line: &str) -> PromptResponse {
    let answer = line.trim().to_ascii_lowercase();
    let decision = match answer.as_str() {
        "o" => Some(PermissionDecision::AllowOnce),
        "s" => Some(PermissionDecision::AllowSession),
        "n" => Some(PermissionDecision::NeverAllow),
        other => other.parse().ok(),
    };
    decision.map_or(PromptResponse::Declined, PromptResponse::Decision)
}

pub fn assumed(assume: Assume) -> StaticPrompter {
    match assume {
        Assume::Once => StaticPrompter::allow_once(),
        Assume::Session => StaticPrompter::allow_session(),
        Assume::Never => StaticPrompter::never_allow(),
        Assume::Decline => StaticPrompter::decline(),
    }
}
