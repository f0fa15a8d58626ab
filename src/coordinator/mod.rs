//! Request Routing Module
//!
//! The coordinator decides, for every operation, whether this node serves
//! it from the local store, forwards it to the key's primary, or performs a
//! primary write with asynchronous fan-out to the replicas.
//!
//! ## Write paths
//! - **Primary write**: local store mutation, then fire-and-forget
//!   replication to up to R-1 other nodes. The client's success is the
//!   local mutation; replication failures are logged, never surfaced.
//! - **Replica write**: local mutation only, no further routing.
//!
//! The internal API re-derives the role from the current ring on the
//! receiving node, so a forwarded client write that lands on the primary
//! still replicates.

pub mod service;

pub use service::Coordinator;

#[cfg(test)]
mod tests;
