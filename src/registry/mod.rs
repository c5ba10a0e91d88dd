//! Fan-out registry
//!
//! The bounded set of subscribers currently receiving the stream. Every
//! admission or removal is mirrored onto the routing graph through a
//! [`BranchRouter`](crate::routing::BranchRouter), so a registry entry always
//! has a live delivery branch behind it.
//!
//! The registry is owned by the node actor and is never shared; see
//! [`crate::node`].

pub mod entry;
pub mod error;
pub mod store;

pub use entry::Subscriber;
pub use error::RegistryError;
pub use store::FanoutRegistry;
