//! Physical placement parsing
//!
//! The metadata server exposes the host placement of a VM as a
//! slash-delimited string of the form `/<cluster>/<rack>/<host>`.

use std::fmt;
use std::str::FromStr;

use crate::error::LabelError;
use crate::labels::{LabelSet, TOPOLOGY_CLUSTER_LABEL, TOPOLOGY_HOST_LABEL, TOPOLOGY_RACK_LABEL};

/// Cluster, rack and host of the machine running a VM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalPlacement {
    pub cluster: String,
    pub rack: String,
    pub host: String,
}

impl PhysicalPlacement {
    /// Parse a `/cluster/rack/host` attribute string
    ///
    /// Surrounding whitespace is ignored. The string must split into exactly
    /// four segments, the first one empty and the remaining three non-empty.
    pub fn parse(raw: &str) -> Result<Self, LabelError> {
        let malformed = || LabelError::Malformed {
            what: "physical host",
            value: raw.to_string(),
        };

        let segments: Vec<&str> = raw.trim().split('/').collect();
        match segments.as_slice() {
            ["", cluster, rack, host]
                if !cluster.is_empty() && !rack.is_empty() && !host.is_empty() =>
            {
                Ok(Self {
                    cluster: cluster.to_string(),
                    rack: rack.to_string(),
                    host: host.to_string(),
                })
            }
            _ => Err(malformed()),
        }
    }

    /// Topology labels for this placement
    pub fn labels(&self) -> LabelSet {
        LabelSet::from([
            (TOPOLOGY_CLUSTER_LABEL.to_string(), self.cluster.clone()),
            (TOPOLOGY_RACK_LABEL.to_string(), self.rack.clone()),
            (TOPOLOGY_HOST_LABEL.to_string(), self.host.clone()),
        ])
    }
}

impl FromStr for PhysicalPlacement {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PhysicalPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.cluster, self.rack, self.host)
    }
}
