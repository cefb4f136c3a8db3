//! Linkup search API, restricted to official French domains.

pub mod client;
pub mod types;

pub use client::{LinkupClient, LinkupError, WebSearch};
pub use types::{SearchArgs, SearchResult};
