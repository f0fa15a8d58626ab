//! Node configuration.
//!
//! Identity and peers come from the command line; tuning knobs come from
//! `CACHE_*` environment variables. Bad capacity values degrade to the
//! default with a warning instead of failing startup.

use std::time::Duration;

use crate::ring::Node;

const DEFAULT_REPLICATION_FACTOR: usize = 2;
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_READ_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MAX_ENTRIES: i64 = 1000;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Stable identity of this node.
    pub id: String,
    /// Listening host; together with `port` it also fixes this node's ring
    /// positions.
    pub host: String,
    pub port: u16,
    /// All cluster members as `host:port`, including this node.
    pub peers: Vec<String>,
    /// Total copies per key, primary included.
    pub replication_factor: usize,
    /// LRU bound of the local store; non-positive values fall back to the
    /// default at store construction.
    pub max_entries: i64,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl NodeConfig {
    /// Parses `--id <id> --host <host> --port <port> --peers <a:p,b:p,...>`
    /// plus environment overrides.
    pub fn from_args(args: &[String]) -> anyhow::Result<Self> {
        let mut id: Option<String> = None;
        let mut host: Option<String> = None;
        let mut port: Option<u16> = None;
        let mut peers: Vec<String> = Vec::new();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--id" => {
                    id = Some(required_value(args, i, "--id")?.to_string());
                    i += 2;
                }
                "--host" => {
                    host = Some(required_value(args, i, "--host")?.to_string());
                    i += 2;
                }
                "--port" => {
                    port = Some(required_value(args, i, "--port")?.parse()?);
                    i += 2;
                }
                "--peers" => {
                    peers = required_value(args, i, "--peers")?
                        .split(',')
                        .map(|peer| peer.trim().to_string())
                        .filter(|peer| !peer.is_empty())
                        .collect();
                    i += 2;
                }
                _ => {
                    i += 1;
                }
            }
        }

        let host = host.ok_or_else(|| anyhow::anyhow!("--host is required"))?;
        let port = port.ok_or_else(|| anyhow::anyhow!("--port is required"))?;
        let id = id.unwrap_or_else(|| format!("{}:{}", host, port));

        let replication_factor = env_value("CACHE_REPLICATION_FACTOR", DEFAULT_REPLICATION_FACTOR)
            .max(1);
        let max_entries = env_value("CACHE_MAX_ENTRIES", DEFAULT_MAX_ENTRIES);
        let connect_timeout =
            Duration::from_millis(env_value("CACHE_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS));
        let read_timeout =
            Duration::from_millis(env_value("CACHE_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT_MS));

        Ok(Self {
            id,
            host,
            port,
            peers,
            replication_factor,
            max_entries,
            connect_timeout,
            read_timeout,
        })
    }

    pub fn local_node(&self) -> Node {
        Node::new(self.id.clone(), self.host.clone(), self.port)
    }

    /// Logs the loaded configuration, flagging peer entries that will be
    /// skipped because they do not parse as `host:port`.
    pub fn log_startup(&self) {
        tracing::info!("--- Node configuration loaded ---");
        tracing::info!("Node id: {}", self.id);
        tracing::info!("Listening on {}:{}", self.host, self.port);
        tracing::info!("Replication factor: {}", self.replication_factor);
        tracing::info!("Capacity (max entries): {}", self.max_entries);

        if self.peers.is_empty() {
            tracing::warn!("No peers configured; this node will form a cluster of one");
        } else {
            for peer in &self.peers {
                match Node::from_address(peer) {
                    Ok(node) => tracing::info!("Configured peer: {}", node.address()),
                    Err(e) => tracing::warn!("Ignoring peer entry: {}", e),
                }
            }
        }
    }
}

fn required_value<'a>(args: &'a [String], i: usize, flag: &str) -> anyhow::Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
}

fn env_value<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(parts: &[&str]) -> Vec<String> {
        let mut all = vec!["node".to_string()];
        all.extend(parts.iter().map(|p| p.to_string()));
        all
    }

    #[test]
    fn parses_identity_and_peers() {
        let config = NodeConfig::from_args(&args(&[
            "--id",
            "node-a",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
            "--peers",
            "127.0.0.1:8080,127.0.0.1:8081, 127.0.0.1:8082",
        ]))
        .unwrap();

        assert_eq!(config.id, "node-a");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.peers,
            vec!["127.0.0.1:8080", "127.0.0.1:8081", "127.0.0.1:8082"]
        );
        assert_eq!(config.local_node().address(), "127.0.0.1:8080");
    }

    #[test]
    fn id_defaults_to_the_address() {
        let config =
            NodeConfig::from_args(&args(&["--host", "10.0.0.5", "--port", "9000"])).unwrap();
        assert_eq!(config.id, "10.0.0.5:9000");
        assert!(config.peers.is_empty());
    }

    #[test]
    fn missing_host_or_port_is_an_error() {
        assert!(NodeConfig::from_args(&args(&["--port", "8080"])).is_err());
        assert!(NodeConfig::from_args(&args(&["--host", "127.0.0.1"])).is_err());
        assert!(NodeConfig::from_args(&args(&["--host", "127.0.0.1", "--port"])).is_err());
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let config = NodeConfig::from_args(&args(&[
            "--verbose",
            "--host",
            "127.0.0.1",
            "--port",
            "8080",
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
    }
}
