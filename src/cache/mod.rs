//! Local Cache Module
//!
//! The per-node storage layer: a bounded in-memory map with LRU eviction,
//! per-entry TTL expiry, and atomic hit/miss/put/delete accounting.
//!
//! ## Core Concepts
//! - **LRU discipline**: reads and writes both promote a key to
//!   most-recently-used; an insertion that pushes the map past capacity
//!   evicts exactly the least-recently-used key.
//! - **TTL expiry**: entries carry their own lifetime; an expired entry
//!   observed by any operation is removed before the operation returns,
//!   and a background sweep clears the rest.
//! - **Counters**: monotonic hit/miss/put/delete counts, readable without
//!   taking the store lock.

pub mod entry;
pub mod store;

pub use entry::Entry;
pub use store::LocalStore;

#[cfg(test)]
mod tests;
