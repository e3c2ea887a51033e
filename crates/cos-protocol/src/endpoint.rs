/// HTTP endpoint paths for the storage host.
pub mod endpoints {
    pub const HEALTH: &str = "/v1/health";
    pub const INFO: &str = "/v1/info";
    /// `POST` one encoded request envelope, receive one encoded response.
    pub const ENVELOPE: &str = "/v1/envelope";
}

/// Health check response.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub protocol_version: u32,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            protocol_version: super::message::PROTOCOL_VERSION,
        }
    }
}
