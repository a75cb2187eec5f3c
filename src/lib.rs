//! Master/replica topology discovery for Redis-compatible clusters.
//!
//! Speaks a small subset of the sentinel text protocol to find the current
//! master and its replicas, and turns the answer into the ranked host list
//! a replicated-store client is constructed with, with a short-lived
//! on-disk cache in front of the network round trip.

pub mod cache;
pub mod error;
pub mod failover;
pub mod hosts;
pub mod sentinel;
pub mod service;

pub use cache::{TopologyCache, DEFAULT_MAX_AGE};
pub use error::{Error, Result};
pub use failover::{build_failover_topology, ClientTopology, Options};
pub use hosts::{normalize_hosts, Endpoint, HostEntry};
pub use sentinel::{EntityRecord, SentinelClient};
pub use service::{
    resolve_client_hosts, ConnectionMode, ServiceConfig, DEFAULT_REDIS_PORT,
    DEFAULT_SENTINEL_PORT,
};
