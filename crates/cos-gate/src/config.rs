use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the permission gate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// When `true`, every read is granted without consulting the decision
    /// store or prompting. Intended for single-user local tooling.
    pub permissive: bool,
    /// How long to wait for the prompter before treating the prompt as
    /// dismissed. `None` waits indefinitely.
    pub prompt_timeout: Option<Duration>,
}

impl GateConfig {
    /// A configuration that grants every read.
    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Default::default()
        }
    }

    pub fn with_prompt_timeout(mut self, timeout: Duration) -> Self {
        self.prompt_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompts_without_timeout() {
        let config = GateConfig::default();
        assert!(!config.permissive);
        assert!(config.prompt_timeout.is_none());
    }

    #[test]
    fn partial_config_deserializes() {
        let config: GateConfig = serde_json::from_str(r#"{"permissive":true}"#).unwrap();
        assert_eq!(config, GateConfig::permissive());
    }
}
