use std::net::{Ipv4Addr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Limits and listener settings for a [`StorageHost`](crate::StorageHost).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Address the HTTP surface binds to.
    pub bind_addr: SocketAddr,
    /// Largest record accepted by `storeFileData`, in bytes.
    pub max_blob_size: u64,
    /// Reject writes whose bytes do not digest to the target hash. Only
    /// applies to algorithms the host can compute.
    pub verify_writes: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8787)),
            max_blob_size: 32 * 1024 * 1024,
            verify_writes: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = HostConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8787".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_blob_size, 32 * 1024 * 1024);
        assert!(!c.verify_writes);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c: HostConfig = toml::from_str("verify_writes = true\nmax_blob_size = 16").unwrap();
        assert!(c.verify_writes);
        assert_eq!(c.max_blob_size, 16);
        assert_eq!(c.bind_addr, HostConfig::default().bind_addr);
    }
}
