//! Element-array documents written by the first storyboard client
//!
//! That client stored `{"elements": [{"data": {...}}, ...]}` where an element
//! is an edge when its data carries `source` and `target`, and a node
//! otherwise. Node kinds were a free-form `type` string, timestamps were named
//! `timestamp`. Plain file exports contained the bare element array.

use crate::element::{Edge, Node, NodeKind};
use crate::error::ValidationError;
use crate::id::{EdgeId, NodeId};
use crate::wire::SerializableDocument;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct LegacyDocument {
    elements: Vec<LegacyElement>,
}

#[derive(Debug, Deserialize)]
struct LegacyElement {
    data: LegacyData,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LegacyData {
    Edge {
        id: String,
        source: String,
        target: String,
        #[serde(default)]
        label: String,
    },
    Node {
        id: String,
        label: String,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        notes: String,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
    },
}

pub(crate) fn is_legacy_shape(value: &Value) -> bool {
    match value {
        Value::Array(_) => true,
        Value::Object(map) => map.contains_key("elements") && !map.contains_key("nodes"),
        _ => false,
    }
}

pub(crate) fn convert(value: Value) -> Result<SerializableDocument, ValidationError> {
    let elements = match value {
        Value::Array(_) => serde_json::from_value::<Vec<LegacyElement>>(value),
        other => serde_json::from_value::<LegacyDocument>(other).map(|doc| doc.elements),
    }
    .map_err(|e| ValidationError::MalformedDocument(format!("legacy elements: {e}")))?;

    let mut doc = SerializableDocument::default();
    for element in elements {
        match element.data {
            LegacyData::Edge {
                id,
                source,
                target,
                label,
            } => doc.edges.push(Edge {
                id: EdgeId::from(id),
                source: NodeId::from(source),
                target: NodeId::from(target),
                label,
            }),
            LegacyData::Node {
                id,
                label,
                kind,
                notes,
                timestamp,
            } => {
                let kind = match kind {
                    Some(name) => name
                        .parse::<NodeKind>()
                        .map_err(|e| ValidationError::MalformedDocument(e.to_string()))?,
                    None => NodeKind::default(),
                };
                doc.nodes.push(Node {
                    id: NodeId::from(id),
                    label,
                    kind,
                    notes,
                    created_at: timestamp.unwrap_or_default(),
                });
            }
        }
    }

    tracing::info!(
        nodes = doc.nodes.len(),
        edges = doc.edges.len(),
        "converted legacy element-array document"
    );
    Ok(doc)
}
