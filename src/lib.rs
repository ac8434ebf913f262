//! Delver - an iterative DNS resolver.
//!
//! Walks the delegation hierarchy from a root server down to an
//! authoritative answer, caching every name-server address it learns
//! along the way. The library exposes the individual stages so they can
//! be tested and benchmarked in isolation.

pub mod cache;
pub mod dns;
pub mod domain;
pub mod error;
pub mod query;
pub mod resolver;
pub mod transport;

pub use error::{Error, Result};
