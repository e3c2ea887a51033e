use std::path::Path;

use anyhow::Context;
use cos_host::HostConfig;
use cos_sdk::{CacheConfig, ClientConfig};
use serde::{Deserialize, Serialize};

/// Everything the `--config` file may set. Missing tables keep defaults.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub host: HostConfig,
    pub cache: CacheConfig,
}

impl CliConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_gives_defaults() {
        let config = CliConfig::load(None).unwrap();
        assert!(!config.host.verify_writes);
        assert!(config.cache.index_path.is_none());
    }

    #[test]
    fn loads_all_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cos.toml");
        std::fs::write(
            &path,
            r#"
            [client]
            request_timeout_ms = 500

            [client.gate]
            permissive = true

            [host]
            bind_addr = "0.0.0.0:9000"
            verify_writes = true

            [cache]
            strip_prefixes = ["https://example.com"]
            "#,
        )
        .unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.client.request_timeout_ms, Some(500));
        assert!(config.client.gate.permissive);
        assert_eq!(config.host.bind_addr.port(), 9000);
        assert!(config.host.verify_writes);
        assert_eq!(config.cache.strip_prefixes, vec!["https://example.com".to_string()]);
    }

    #[test]
    fn bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cos.toml");
        std::fs::write(&path, "[host]\nmax_blob_size = \"big\"").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }
}
