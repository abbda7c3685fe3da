//! Nodes, edges and node kinds

use crate::id::{EdgeId, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of an investigative artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A person or outlet supplying information
    #[default]
    Source,
    /// Something worth following up
    Lead,
    /// Documents, recordings, data
    Evidence,
    /// A working hypothesis connecting other nodes
    Theory,
}

impl NodeKind {
    /// Every kind, in presentation order
    pub const ALL: [NodeKind; 4] = [
        NodeKind::Source,
        NodeKind::Lead,
        NodeKind::Evidence,
        NodeKind::Theory,
    ];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Source => "source",
            NodeKind::Lead => "lead",
            NodeKind::Evidence => "evidence",
            NodeKind::Theory => "theory",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown node kind name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown node kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// An investigative artifact on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Identifier
    pub id: NodeId,
    /// Display label, never blank
    pub label: String,
    /// Category
    pub kind: NodeKind,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Directed relationship between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Identifier
    pub id: EdgeId,
    /// Origin node
    pub source: NodeId,
    /// Destination node
    pub target: NodeId,
    /// Relationship description
    #[serde(default)]
    pub label: String,
}

impl Edge {
    /// Whether this edge touches `node` at either end
    #[inline]
    #[must_use]
    pub fn is_incident_to(&self, node: &str) -> bool {
        self.source.as_str() == node || self.target.as_str() == node
    }
}
