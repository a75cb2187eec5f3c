//! Host list normalization.
//!
//! Deployment configuration hands us raw `"host"` or `"host:port"` strings;
//! this module turns them into typed endpoints and defines the ranked host
//! entry consumed by the downstream store client.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `host:port` pair, immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One entry of the ranked host list handed to the replicated-store client.
///
/// The master carries the `"master"` alias and comes first; replicas follow
/// unaliased. Entries produced by discovery are marked persistent so the
/// store client keeps its pooled connections across requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub persistent: bool,
}

impl HostEntry {
    /// Plain entry, as used for standalone host lists.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            alias: None,
            persistent: false,
        }
    }

    /// The primary entry of a replicated set.
    pub fn master(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            alias: Some("master".to_string()),
            persistent: true,
        }
    }

    /// A replica entry of a replicated set.
    pub fn replica(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            alias: None,
            persistent: true,
        }
    }
}

/// Parse raw host strings into endpoints, applying `default_port` where an
/// entry carries no `:port` suffix.
///
/// Entries are split on the first `:` only. Nothing is validated here; an
/// entry whose port suffix is not a valid port number is carried whole into
/// the host field, so it surfaces as a resolution failure at connect time.
pub fn normalize_hosts(hosts: &[String], default_port: u16) -> Vec<Endpoint> {
    hosts
        .iter()
        .map(|raw| match raw.split_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => Endpoint::new(host, port),
                Err(_) => Endpoint::new(raw.as_str(), default_port),
            },
            None => Endpoint::new(raw.as_str(), default_port),
        })
        .collect()
}
