//! The graph document aggregate
//!
//! [`GraphDocument`] owns every node and edge of one storyboard. It enforces
//! the referential invariant at mutation time: an edge can only be added
//! between existing nodes, and removing a node removes every edge touching it.

use crate::element::{Edge, Node, NodeKind};
use crate::error::{GraphError, ReferenceError, ValidationError};
use crate::id::{EdgeId, NodeId};
use crate::wire::SerializableDocument;
use chrono::Utc;
use indexmap::IndexMap;

/// A node removed from the document together with its cascaded edges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedNode {
    /// The removed node
    pub node: Node,
    /// Edges that referenced it, in document order
    pub edges: Vec<Edge>,
}

/// In-memory storyboard graph
///
/// # Invariants
/// - every edge's `source` and `target` are keys of `nodes`
/// - no edge is a self-loop
/// - iteration follows insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDocument {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
}

impl GraphDocument {
    /// Create an empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its fresh identifier
    ///
    /// # Errors
    /// `ValidationError::EmptyLabel` if `label` is blank
    pub fn add_node(
        &mut self,
        label: impl Into<String>,
        kind: NodeKind,
        notes: impl Into<String>,
    ) -> Result<NodeId, ValidationError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel);
        }

        let id = loop {
            let candidate = NodeId::generate();
            if !self.nodes.contains_key(&candidate) {
                break candidate;
            }
        };

        self.nodes.insert(
            id.clone(),
            Node {
                id: id.clone(),
                label,
                kind,
                notes: notes.into(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Add a directed edge between two existing nodes
    ///
    /// # Errors
    /// - `ReferenceError::UnknownSource` / `UnknownTarget` if an endpoint is absent
    /// - `ValidationError::SelfLoop` if `source == target`
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        label: impl Into<String>,
    ) -> Result<EdgeId, GraphError> {
        if !self.nodes.contains_key(source) {
            return Err(ReferenceError::UnknownSource(source.clone()).into());
        }
        if !self.nodes.contains_key(target) {
            return Err(ReferenceError::UnknownTarget(target.clone()).into());
        }
        if source == target {
            return Err(ValidationError::SelfLoop(source.clone()).into());
        }

        let id = loop {
            let candidate = EdgeId::generate();
            if !self.edges.contains_key(&candidate) {
                break candidate;
            }
        };

        self.edges.insert(
            id.clone(),
            Edge {
                id: id.clone(),
                source: source.clone(),
                target: target.clone(),
                label: label.into(),
            },
        );
        Ok(id)
    }

    /// Remove a node and every edge incident to it
    ///
    /// Returns `None` without touching the document if `id` is absent.
    pub fn remove_node(&mut self, id: &str) -> Option<RemovedNode> {
        let node = self.nodes.shift_remove(id)?;

        let mut edges = Vec::new();
        self.edges.retain(|_, edge| {
            if edge.is_incident_to(id) {
                edges.push(edge.clone());
                false
            } else {
                true
            }
        });

        tracing::debug!(node = %node.id, cascaded = edges.len(), "removed node");
        Some(RemovedNode { node, edges })
    }

    /// Remove an edge; `None` if absent
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        self.edges.shift_remove(id)
    }

    /// Replace a node's label
    ///
    /// # Errors
    /// - `ValidationError::EmptyLabel` if `label` is blank
    /// - `ReferenceError::UnknownNode` if the node is absent
    pub fn set_node_label(&mut self, id: &str, label: impl Into<String>) -> Result<(), GraphError> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel.into());
        }
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ReferenceError::UnknownNode(NodeId::from(id)))?;
        node.label = label;
        Ok(())
    }

    /// Replace a node's notes
    ///
    /// # Errors
    /// `ReferenceError::UnknownNode` if the node is absent
    pub fn set_node_notes(&mut self, id: &str, notes: impl Into<String>) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| ReferenceError::UnknownNode(NodeId::from(id)))?;
        node.notes = notes.into();
        Ok(())
    }

    /// Look up a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up an edge
    #[inline]
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Whether the node exists
    #[inline]
    #[must_use]
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Whether the edge exists
    #[inline]
    #[must_use]
    pub fn contains_edge(&self, id: &str) -> bool {
        self.edges.contains_key(id)
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges touching `node` at either end
    pub fn incident_edges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |edge| edge.is_incident_to(node))
    }

    /// Number of nodes
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// No nodes and no edges
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Produce the shape consumed by the codec and by file export
    #[must_use]
    pub fn serialize(&self) -> SerializableDocument {
        SerializableDocument {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Insert pre-validated parts; used by deserialization only
    pub(crate) fn from_parts(
        nodes: IndexMap<NodeId, Node>,
        edges: IndexMap<EdgeId, Edge>,
    ) -> Self {
        Self { nodes, edges }
    }
}
