//! Failover client construction.
//!
//! Resolves the current master/replica topology through a sentinel and
//! shapes it into the ranked host list a replicated-store client consumes:
//! the master first under the `master` alias, replicas after it, plus an
//! options map that always carries `replication = true`.

use std::collections::HashMap;
use std::time::Duration;

use sonic_rs::{json, Value};

use crate::cache::{TopologyCache, DEFAULT_MAX_AGE};
use crate::error::{Error, Result};
use crate::hosts::HostEntry;
use crate::sentinel::SentinelClient;

/// Options handed through to the replicated-store client constructor.
pub type Options = HashMap<String, Value>;

/// The resolved constructor arguments for the downstream store client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientTopology {
    pub hosts: Vec<HostEntry>,
    pub options: Options,
}

/// Resolve the ranked host list for a replicated client.
///
/// When a cache is supplied and holds a fresh entry, no network access
/// happens at all. Otherwise the topology is discovered live and, cache
/// permitting, persisted for the next caller inside the freshness window.
pub fn build_failover_topology(
    sentinel: &mut SentinelClient,
    options: Options,
    cache: Option<&TopologyCache>,
) -> Result<ClientTopology> {
    build_with_max_age(sentinel, options, cache, DEFAULT_MAX_AGE)
}

pub(crate) fn build_with_max_age(
    sentinel: &mut SentinelClient,
    mut options: Options,
    cache: Option<&TopologyCache>,
    max_age: Duration,
) -> Result<ClientTopology> {
    let hosts = match cache.and_then(|c| c.read_fresh(max_age)) {
        Some(hosts) => {
            log::debug!("using cached topology ({} hosts)", hosts.len());
            hosts
        }
        None => {
            let hosts = resolve_topology(sentinel)?;
            if let Some(cache) = cache {
                if let Err(e) = cache.write(&hosts) {
                    log::warn!("failed to persist topology cache: {}", e);
                }
            }
            hosts
        }
    };

    options.insert("replication".to_string(), json!(true));
    Ok(ClientTopology { hosts, options })
}

/// Query the sentinel for the current master and its replicas.
fn resolve_topology(sentinel: &mut SentinelClient) -> Result<Vec<HostEntry>> {
    let masters = sentinel.masters()?;
    let master = masters.first().ok_or(Error::NoMasterFound)?;

    let name = non_empty(master.get("name")).ok_or(Error::NoMasterFound)?;
    let ip = non_empty(master.get("ip")).ok_or(Error::NoMasterFound)?;
    let port = non_empty(master.get("port")).ok_or(Error::NoMasterFound)?;
    let port: u16 = port
        .parse()
        .map_err(|_| Error::MalformedReply(format!("master port '{}' is not a port", port)))?;

    let mut hosts = vec![HostEntry::master(ip, port)];

    for replica in sentinel.replicas(name)? {
        let ip = replica.get("ip");
        let port = replica.get("port").and_then(|p| p.parse::<u16>().ok());
        match (ip, port) {
            (Some(ip), Some(port)) => hosts.push(HostEntry::replica(ip, port)),
            _ => log::debug!("skipping replica with incomplete address: {:?}", replica),
        }
    }

    Ok(hosts)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
