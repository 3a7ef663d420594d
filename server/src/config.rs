//! Configuration for the Playgate server.
//!
//! Everything comes from environment variables with sensible defaults:
//! - `PLAYGATE_DATABASE_PATH`: SQLite file (default `./data/playgate.db`)
//! - `PLAYGATE_BIND_ADDR`: listen address (default `127.0.0.1:8080`)
//! - `PLAYGATE_POOL_RECYCLE_SECS`: connection recycle age (default 299)
//! - `PLAYGATE_POOL_TIMEOUT_SECS`: acquisition timeout (default 20)
//!
//! Unparsable values fall back to the default with a warning rather
//! than refusing to start.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use playgate_store::StoreConfig;

const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreConfig,
}

/// Read configuration from the environment.
pub fn load() -> ServerConfig {
    let mut store = StoreConfig::default();

    if let Ok(path) = std::env::var("PLAYGATE_DATABASE_PATH") {
        store.path = PathBuf::from(path);
    }
    if let Some(secs) = env_u64("PLAYGATE_POOL_RECYCLE_SECS") {
        store.recycle_after = Duration::from_secs(secs);
    }
    if let Some(secs) = env_u64("PLAYGATE_POOL_TIMEOUT_SECS") {
        store.acquire_timeout = Duration::from_secs(secs);
    }

    let bind_addr = match std::env::var("PLAYGATE_BIND_ADDR") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(value = %raw, "invalid PLAYGATE_BIND_ADDR, using default");
            DEFAULT_BIND_ADDR
        }),
        Err(_) => DEFAULT_BIND_ADDR,
    };

    ServerConfig { bind_addr, store }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "invalid integer, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Note: env-var precedence is not tested here to avoid test
    // pollution; only the defaults are pinned down.

    #[test]
    fn test_defaults() {
        let config = load();
        assert_eq!(config.store.recycle_after, Duration::from_secs(299));
        assert_eq!(config.store.acquire_timeout, Duration::from_secs(20));
        assert_eq!(config.store.max_connections, 5);
    }
}
