use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;

/// Host/port pair the transfer clients talk to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Resolve to socket addresses. An empty result is reported as an error.
    pub async fn resolve(&self) -> std::io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((self.hostname.as_str(), self.port))
            .await?
            .collect();
        if addrs.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} resolved to no addresses", self.hostname),
            ));
        }
        Ok(addrs)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

/// What a run actually exercised: a remote server, or the in-process simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTarget {
    Simulated,
    Remote(Endpoint),
}

impl RunTarget {
    pub fn is_simulated(&self) -> bool {
        matches!(self, RunTarget::Simulated)
    }
}

impl fmt::Display for RunTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunTarget::Simulated => f.write_str("simulated target"),
            RunTarget::Remote(endpoint) => endpoint.fmt(f),
        }
    }
}

/// Remote file name correlating one upload with its matching download.
///
/// Names embed the worker id and the cycle index, so no two cycles of a run
/// ever share a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransferName(String);

impl TransferName {
    pub fn for_cycle(prefix: &str, worker_id: usize, cycle_index: u64) -> Self {
        Self(format!("{}-w{}-c{}.txt", prefix, worker_id, cycle_index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TransferName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TransferName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for TransferName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
