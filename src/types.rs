use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Immutable configuration for one scan invocation.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Target host name or IP address.
    pub host: String,
    /// Ports to probe, in the order the port specification produced them.
    /// Duplicates are probed again; the list is never empty.
    pub ports: Vec<u16>,
    /// Per-probe deadline applied to the connect attempt and to each
    /// banner read/write step.
    pub timeout: Duration,
    /// Ceiling on simultaneously running probes; 0 means unbounded.
    pub concurrency: usize,
    /// Attempt to read a service banner from each open port.
    pub grab_banner: bool,
}

/// Per-port result of one probe. Only `open == true` outcomes are
/// surfaced by the engine; the rest are discarded after aggregation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub port: u16,
    pub open: bool,
    /// Service label from the catalog, HTTP override, or keyword match;
    /// "Unknown" when nothing matched.
    pub service: String,
    /// Banner text read from the service; empty if none was collected.
    pub banner: String,
}

impl ScanOutcome {
    /// Outcome for a port that refused, timed out, or was unreachable.
    pub fn closed(port: u16) -> Self {
        Self {
            port,
            open: false,
            service: String::new(),
            banner: String::new(),
        }
    }
}
