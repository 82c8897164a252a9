//! Service configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Faucet service settings. Chain and asset policies live in the
/// [`ChainRegistry`](crate::registry::ChainRegistry); this covers the
/// process itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server bind address
    pub server_addr: String,

    /// Path to a chain registry JSON file; the built-in catalog is used
    /// when unset.
    pub registry_path: Option<PathBuf>,

    /// Maximum number of rate-limit records held in memory.
    pub limiter_capacity: u64,

    /// Rate-limit record TTL in seconds. Clamped at startup to at least the
    /// largest configured rate-limit window.
    pub limiter_ttl_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:3000".to_string(),
            registry_path: None,
            limiter_capacity: 10_000,
            limiter_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl ServiceConfig {
    /// Load from environment variables with defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("FAUCET_SERVER_ADDR") {
            config.server_addr = addr;
        }

        if let Ok(path) = std::env::var("FAUCET_CHAINS") {
            config.registry_path = Some(PathBuf::from(path));
        }

        if let Ok(capacity) = std::env::var("FAUCET_LIMITER_CAPACITY") {
            config.limiter_capacity = capacity.parse().unwrap_or(config.limiter_capacity);
        }

        if let Ok(ttl) = std::env::var("FAUCET_LIMITER_TTL") {
            config.limiter_ttl_secs = ttl.parse().unwrap_or(config.limiter_ttl_secs);
        }

        config
    }

    pub fn limiter_ttl(&self) -> Duration {
        Duration::from_secs(self.limiter_ttl_secs)
    }
}
