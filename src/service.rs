//! Connection-mode entry points.
//!
//! Deployment configuration supplies a raw host list and a connection mode.
//! Standalone mode normalizes the hosts and hands them straight to the
//! store client; sentinel mode treats them as monitoring daemons and
//! resolves the replicated topology through them first.

use std::str::FromStr;

use crate::cache::TopologyCache;
use crate::error::{Error, Result};
use crate::failover::{build_failover_topology, ClientTopology, Options};
use crate::hosts::{normalize_hosts, HostEntry};
use crate::sentinel::SentinelClient;

/// Default port of the store itself.
pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default port of the monitoring daemon.
pub const DEFAULT_SENTINEL_PORT: u16 = 26379;

/// How the configured host list is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Hosts are store servers, connected to directly.
    Standalone,
    /// Hosts are sentinels used to locate the master and its replicas.
    Sentinel,
}

impl ConnectionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionMode::Standalone => "standalone",
            ConnectionMode::Sentinel => "sentinel",
        }
    }
}

impl FromStr for ConnectionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "standalone" => Ok(ConnectionMode::Standalone),
            "sentinel" => Ok(ConnectionMode::Sentinel),
            other => Err(Error::UnsupportedMode(other.to_string())),
        }
    }
}

/// Configuration for one resolved store client.
pub struct ServiceConfig {
    /// Raw `"host"` / `"host:port"` entries.
    pub hosts: Vec<String>,
    pub mode: ConnectionMode,
    /// Extra options passed through to the store client.
    pub options: Options,
    /// Consult and maintain the topology cache in sentinel mode.
    pub use_cache: bool,
}

impl ServiceConfig {
    pub fn new(hosts: Vec<String>, mode: &str) -> Result<Self> {
        Ok(Self {
            hosts,
            mode: mode.parse()?,
            options: Options::new(),
            use_cache: true,
        })
    }
}

/// Resolve the host list and options a store client should be built with.
pub fn resolve_client_hosts(config: &ServiceConfig) -> Result<ClientTopology> {
    match config.mode {
        ConnectionMode::Standalone => {
            let hosts = normalize_hosts(&config.hosts, DEFAULT_REDIS_PORT)
                .into_iter()
                .map(|e| HostEntry::new(e.host, e.port))
                .collect();
            Ok(ClientTopology {
                hosts,
                options: config.options.clone(),
            })
        }
        ConnectionMode::Sentinel => {
            let endpoints = normalize_hosts(&config.hosts, DEFAULT_SENTINEL_PORT);
            let cache = config
                .use_cache
                .then(|| TopologyCache::for_endpoints(&endpoints));

            let mut sentinel = SentinelClient::new(endpoints);
            build_failover_topology(&mut sentinel, config.options.clone(), cache.as_ref())
        }
    }
}
