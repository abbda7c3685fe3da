//! Storyboard Persistence Gateway
//!
//! The session persists exactly one opaque blob per document through a
//! [`PersistenceGateway`]. Gateways never look inside the blob.
//!
//! - [`InMemoryGateway`]: process-local map, used by tests and demos
//! - [`DirectoryGateway`]: one record file per document
//! - [`HttpGateway`]: REST backend, bearer-token scoped
//!
//! Every gateway upserts by [`DocumentId`]: a store replaces the previous
//! record instead of accumulating history.

#![warn(unreachable_pub)]

mod config;
mod directory;
mod error;
mod gateway;
mod http;
mod memory;
mod types;

pub use config::GatewayConfig;
pub use directory::DirectoryGateway;
pub use error::PersistenceError;
pub use gateway::PersistenceGateway;
pub use http::HttpGateway;
pub use memory::InMemoryGateway;
pub use types::{DocumentId, PersistedBlob, RecordId, StoreRequest};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
