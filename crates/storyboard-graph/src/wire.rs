//! Serialized document shape and validated deserialization
//!
//! The persisted plaintext is `{ "nodes": [...], "edges": [...] }`. The same
//! JSON is what a user gets from file export.

use crate::document::GraphDocument;
use crate::element::{Edge, Node};
use crate::error::ValidationError;
use crate::id::{EdgeId, NodeId};
use crate::legacy;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Plain serialized form of a [`GraphDocument`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableDocument {
    /// Nodes in document order
    pub nodes: Vec<Node>,
    /// Edges in document order
    pub edges: Vec<Edge>,
}

impl SerializableDocument {
    /// Interpret untyped JSON as a document
    ///
    /// Accepts the current `{nodes, edges}` shape as well as the older
    /// element-array shape (`{"elements": [...]}` or a bare array).
    ///
    /// # Errors
    /// `ValidationError::MalformedDocument` if required fields are missing or mistyped
    pub fn from_value(value: serde_json::Value) -> Result<Self, ValidationError> {
        if legacy::is_legacy_shape(&value) {
            return legacy::convert(value);
        }
        serde_json::from_value(value)
            .map_err(|e| ValidationError::MalformedDocument(e.to_string()))
    }

    /// Pretty JSON for user-initiated export
    ///
    /// # Errors
    /// Propagates serializer failures
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Default export file name for a given day, e.g. `storyboard_2024-05-01.json`
#[must_use]
pub fn export_file_name(day: NaiveDate) -> String {
    format!("storyboard_{}.json", day.format("%Y-%m-%d"))
}

/// Non-fatal problem found while loading a stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Edge references a node that is not in the document
    DanglingEdge {
        /// Dropped edge
        edge: EdgeId,
        /// The first missing endpoint
        missing: NodeId,
    },
    /// Edge connects a node to itself
    SelfLoop {
        /// Dropped edge
        edge: EdgeId,
    },
    /// A second node with an id already seen; the first one is kept
    DuplicateNode(NodeId),
    /// A second edge with an id already seen; the first one is kept
    DuplicateEdge(EdgeId),
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::DanglingEdge { edge, missing } => {
                write!(f, "dropped edge {edge}: node {missing} does not exist")
            }
            LoadWarning::SelfLoop { edge } => write!(f, "dropped self-loop edge {edge}"),
            LoadWarning::DuplicateNode(id) => write!(f, "ignored duplicate node {id}"),
            LoadWarning::DuplicateEdge(id) => write!(f, "ignored duplicate edge {id}"),
        }
    }
}

/// Result of a successful deserialization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deserialized {
    /// The reconstructed document
    pub document: GraphDocument,
    /// Entries that were dropped on the way
    pub warnings: Vec<LoadWarning>,
}

impl GraphDocument {
    /// Rebuild a document from its serialized form
    ///
    /// Dangling and self-loop edges as well as duplicate ids are dropped and
    /// reported in [`Deserialized::warnings`]; they never fail the load.
    ///
    /// # Errors
    /// `ValidationError` if a node has a blank label or an id is empty
    pub fn deserialize(doc: SerializableDocument) -> Result<Deserialized, ValidationError> {
        let mut warnings = Vec::new();

        let mut nodes = IndexMap::with_capacity(doc.nodes.len());
        for node in doc.nodes {
            if node.id.as_str().is_empty() {
                return Err(ValidationError::MalformedDocument(
                    "node with empty id".to_string(),
                ));
            }
            if node.label.trim().is_empty() {
                return Err(ValidationError::MalformedDocument(format!(
                    "node {} has an empty label",
                    node.id
                )));
            }
            if nodes.contains_key(&node.id) {
                warnings.push(LoadWarning::DuplicateNode(node.id));
                continue;
            }
            nodes.insert(node.id.clone(), node);
        }

        let mut edges = IndexMap::with_capacity(doc.edges.len());
        for edge in doc.edges {
            if edge.id.as_str().is_empty() {
                return Err(ValidationError::MalformedDocument(
                    "edge with empty id".to_string(),
                ));
            }
            if edges.contains_key(&edge.id) {
                warnings.push(LoadWarning::DuplicateEdge(edge.id));
                continue;
            }
            let missing = [&edge.source, &edge.target]
                .into_iter()
                .find(|endpoint| !nodes.contains_key(*endpoint))
                .cloned();
            if let Some(missing) = missing {
                warnings.push(LoadWarning::DanglingEdge {
                    edge: edge.id,
                    missing,
                });
                continue;
            }
            if edge.source == edge.target {
                warnings.push(LoadWarning::SelfLoop { edge: edge.id });
                continue;
            }
            edges.insert(edge.id.clone(), edge);
        }

        for warning in &warnings {
            tracing::warn!(%warning, "storyboard entry dropped during load");
        }

        Ok(Deserialized {
            document: GraphDocument::from_parts(nodes, edges),
            warnings,
        })
    }

    /// [`SerializableDocument::from_value`] followed by [`GraphDocument::deserialize`]
    ///
    /// # Errors
    /// `ValidationError` for a malformed shape or invalid node
    pub fn from_value(value: serde_json::Value) -> Result<Deserialized, ValidationError> {
        Self::deserialize(SerializableDocument::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NodeKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serialize_then_deserialize_is_identity() {
        let mut doc = GraphDocument::new();
        let a = doc.add_node("A", NodeKind::Source, "n").unwrap();
        let b = doc.add_node("B", NodeKind::Evidence, "").unwrap();
        doc.add_edge(&a, &b, "corroborates").unwrap();

        let restored = GraphDocument::deserialize(doc.serialize()).unwrap();
        assert!(restored.warnings.is_empty());
        assert_eq!(restored.document, doc);
    }

    #[test]
    fn wire_shape_uses_camel_case_timestamp() {
        let mut doc = GraphDocument::new();
        doc.add_node("A", NodeKind::Lead, "").unwrap();
        let value = serde_json::to_value(doc.serialize()).unwrap();
        let node = &value["nodes"][0];
        assert!(node.get("createdAt").is_some());
        assert_eq!(node["kind"], "lead");
        assert!(value["edges"].as_array().unwrap().is_empty());
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let value = json!({ "nodes": [{ "id": "node_1", "kind": "lead" }], "edges": [] });
        assert!(matches!(
            GraphDocument::from_value(value),
            Err(ValidationError::MalformedDocument(_))
        ));

        let value = json!({ "edges": [] });
        assert!(GraphDocument::from_value(value).is_err());

        let value = json!("just a string");
        assert!(GraphDocument::from_value(value).is_err());
    }

    #[test]
    fn blank_stored_label_is_rejected() {
        let value = json!({
            "nodes": [{ "id": "node_1", "label": " ", "kind": "lead", "notes": "",
                        "createdAt": "2024-01-01T00:00:00Z" }],
            "edges": []
        });
        assert!(GraphDocument::from_value(value).is_err());
    }

    #[test]
    fn dangling_and_looping_edges_are_dropped_with_warnings() {
        let value = json!({
            "nodes": [
                { "id": "a", "label": "A", "kind": "source", "createdAt": "2024-01-01T00:00:00Z" },
                { "id": "b", "label": "B", "kind": "theory", "createdAt": "2024-01-01T00:00:00Z" }
            ],
            "edges": [
                { "id": "e1", "source": "a", "target": "b", "label": "ok" },
                { "id": "e2", "source": "a", "target": "gone", "label": "dangling" },
                { "id": "e3", "source": "b", "target": "b", "label": "loop" },
                { "id": "e1", "source": "b", "target": "a", "label": "dup" }
            ]
        });

        let loaded = GraphDocument::from_value(value).unwrap();
        assert_eq!(loaded.document.edge_count(), 1);
        assert_eq!(
            loaded.warnings,
            vec![
                LoadWarning::DanglingEdge {
                    edge: EdgeId::from("e2"),
                    missing: NodeId::from("gone"),
                },
                LoadWarning::SelfLoop { edge: EdgeId::from("e3") },
                LoadWarning::DuplicateEdge(EdgeId::from("e1")),
            ]
        );
    }

    #[test]
    fn duplicate_nodes_keep_first() {
        let value = json!({
            "nodes": [
                { "id": "a", "label": "first", "kind": "lead", "createdAt": "2024-01-01T00:00:00Z" },
                { "id": "a", "label": "second", "kind": "lead", "createdAt": "2024-01-01T00:00:00Z" }
            ],
            "edges": []
        });
        let loaded = GraphDocument::from_value(value).unwrap();
        assert_eq!(loaded.document.node("a").unwrap().label, "first");
        assert_eq!(loaded.warnings, vec![LoadWarning::DuplicateNode(NodeId::from("a"))]);
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(export_file_name(day), "storyboard_2024-05-01.json");
    }
}
