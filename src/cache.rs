//! Topology cache.
//!
//! Discovery results are persisted as a small JSON artifact so repeated
//! client constructions inside the freshness window skip the sentinel round
//! trip. The cache is advisory shared state: writers go through a sibling
//! temp file and a rename so readers never see a partial entry, and any
//! missing, stale, or unreadable slot is simply a miss.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use sha1::{Digest, Sha1};

use crate::error::Result;
use crate::hosts::{Endpoint, HostEntry};

/// Freshness window for cached topology.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60);

pub struct TopologyCache {
    path: PathBuf,
}

impl TopologyCache {
    /// Cache slot for a specific sentinel set.
    ///
    /// The file name carries a fingerprint of the sorted, normalized host
    /// list, so deployments pointing at different sentinels never read each
    /// other's entries.
    pub fn for_endpoints(endpoints: &[Endpoint]) -> Self {
        let mut names: Vec<String> = endpoints.iter().map(|e| e.to_string()).collect();
        names.sort();

        let mut hasher = Sha1::new();
        for name in &names {
            hasher.update(name.as_bytes());
            hasher.update(b"\n");
        }
        let fingerprint = hex::encode(hasher.finalize());

        Self {
            path: std::env::temp_dir().join(format!("sentinel-topology-{}.json", fingerprint)),
        }
    }

    /// Cache slot at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The last written host list, if the slot is younger than `max_age`.
    /// Anything that prevents that (no slot, stale slot, unreadable or
    /// corrupt content) is a miss, not an error.
    pub fn read_fresh(&self, max_age: Duration) -> Option<Vec<HostEntry>> {
        let modified = fs::metadata(&self.path).ok()?.modified().ok()?;
        let age = modified.elapsed().ok()?;
        if age > max_age {
            log::debug!(
                "topology cache {} is stale ({}s old)",
                self.path.display(),
                age.as_secs()
            );
            return None;
        }

        let bytes = fs::read(&self.path).ok()?;
        match sonic_rs::from_slice(&bytes) {
            Ok(hosts) => Some(hosts),
            Err(e) => {
                log::debug!(
                    "ignoring corrupt topology cache {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Overwrite the slot with the given host list.
    pub fn write(&self, hosts: &[HostEntry]) -> Result<()> {
        let bytes = sonic_rs::to_vec(&hosts)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
