//! Consistent Hashing Module
//!
//! Maps keys to owning nodes via a ring of hash positions. Each physical
//! node contributes a fixed number of virtual positions so that load spreads
//! evenly and membership changes move only a small slice of the key space.
//!
//! ## Core Concepts
//! - **Virtual nodes**: every physical node is hashed onto the ring 100 times.
//! - **Primary lookup**: the owner of a key is the node at the first position
//!   clockwise from the key's hash, wrapping at the end of the ring.
//! - **Replica sets**: continuing clockwise past the primary yields the
//!   ordered list of distinct physical nodes that hold copies of the key.

pub mod node;
pub mod ring;

pub use node::Node;
pub use ring::HashRing;
