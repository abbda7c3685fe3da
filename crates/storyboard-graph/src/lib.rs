//! Storyboard Graph Document Model
//!
//! Investigative artifacts (nodes) and their relationships (directed edges),
//! owned by a single editing session.
//!
//! # Core Concepts
//!
//! - [`GraphDocument`]: the aggregate; all mutations go through it
//! - [`Node`] / [`Edge`]: elements with opaque [`NodeId`] / [`EdgeId`]
//! - [`NodeKind`]: closed set of node categories
//! - [`SerializableDocument`]: the `{nodes, edges}` shape handed to the codec and to export
//!
//! # Example
//!
//! ```rust
//! use storyboard_graph::{GraphDocument, NodeKind};
//!
//! let mut doc = GraphDocument::new();
//! let a = doc.add_node("Whistleblower X", NodeKind::Source, "").unwrap();
//! let b = doc.add_node("Leaked Memo", NodeKind::Evidence, "").unwrap();
//! doc.add_edge(&a, &b, "corroborates").unwrap();
//!
//! doc.remove_node(a.as_str());
//! assert_eq!(doc.edge_count(), 0);
//! ```

#![warn(unreachable_pub)]

mod document;
mod element;
mod error;
mod id;
mod legacy;
mod wire;

pub use document::{GraphDocument, RemovedNode};
pub use element::{Edge, Node, NodeKind, UnknownKind};
pub use error::{GraphError, ReferenceError, ValidationError};
pub use id::{EdgeId, NodeId};
pub use wire::{export_file_name, Deserialized, LoadWarning, SerializableDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
