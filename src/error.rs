use thiserror::Error;

/// Failure modes surfaced by the routing and peer-communication layers.
///
/// Replication fan-out failures are never wrapped in this type; they are
/// logged by the coordinator and swallowed. Only client-facing paths
/// (blocking forwards, reads, primary resolution) produce these values.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The hash ring holds no nodes, so no owner can be resolved.
    #[error("no nodes available")]
    RingEmpty,

    /// A peer could not be reached, or timed out, during a forwarded call.
    #[error("request to peer {address} failed: {source}")]
    PeerUnreachable {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    /// A peer answered with a non-success status; the remote body is kept
    /// so the caller sees what the peer reported.
    #[error("peer returned status {status}: {body}")]
    PeerErrorResponse { status: u16, body: String },

    /// A configured peer entry could not be parsed as `host:port`.
    #[error("malformed peer address '{0}', expected host:port")]
    MalformedPeerAddress(String),
}
