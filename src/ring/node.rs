use std::fmt;

use crate::error::CacheError;

/// A physical member of the cluster.
///
/// Nodes are immutable value objects; equality and hashing cover all three
/// fields so they can key maps and be matched for ring removal. The ring
/// position of a node is derived from `address()`, not from the id alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    id: String,
    host: String,
    port: u16,
}

impl Node {
    pub fn new(id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
            port,
        }
    }

    /// Builds a node from a `host:port` string, using the address itself as
    /// the id. This is how statically configured peers enter the ring before
    /// their real identity is learned from a heartbeat.
    pub fn from_address(address: &str) -> Result<Self, CacheError> {
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| CacheError::MalformedPeerAddress(address.to_string()))?;
        if host.is_empty() {
            return Err(CacheError::MalformedPeerAddress(address.to_string()));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| CacheError::MalformedPeerAddress(address.to_string()))?;
        Ok(Self::new(address, host, port))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.address())
    }
}
