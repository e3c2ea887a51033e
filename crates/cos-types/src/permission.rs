use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A user's verdict on read access for one origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionDecision {
    /// Authorize the current request only. Never persisted.
    AllowOnce,
    /// Authorize every read from this origin for the rest of the session.
    AllowSession,
    /// Refuse every read from this origin for the rest of the session,
    /// without asking again.
    NeverAllow,
}

impl PermissionDecision {
    /// Whether the decision outlives the request that produced it.
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::AllowOnce)
    }

    pub fn allows(&self) -> bool {
        !matches!(self, Self::NeverAllow)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowOnce => "allow-once",
            Self::AllowSession => "allow-session",
            Self::NeverAllow => "never-allow",
        }
    }
}

impl fmt::Display for PermissionDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionDecision {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow-once" | "once" => Ok(Self::AllowOnce),
            "allow-session" | "session" => Ok(Self::AllowSession),
            "never-allow" | "never" => Ok(Self::NeverAllow),
            _ => Err(TypeError::UnknownDecision(s.to_string())),
        }
    }
}
