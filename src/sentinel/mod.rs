//! Sentinel discovery.
//!
//! Client side of the sentinel text protocol: querying the monitored
//! masters and their replicas, and decoding the flat entity replies.

pub mod client;
pub mod response;

pub use client::SentinelClient;
pub use response::{decode, EntityRecord};
