//! Contract between the session and whatever draws the graph
//!
//! The session never talks to a drawing library. After every change that
//! affects the picture it builds a [`RenderView`] and hands it to a
//! [`RenderAdapter`]. Layout, hit-testing and animation are the adapter's
//! business.

use crate::interaction::Selection;
use serde::Serialize;
use storyboard_graph::{EdgeId, GraphDocument, NodeId, NodeKind};

/// Colours for one node category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeStyle {
    /// Fill colour as `#rrggbb`
    pub fill: &'static str,
    /// Border colour as `#rrggbb`
    pub border: &'static str,
}

impl NodeStyle {
    /// Style of a node with no usable category
    pub const FALLBACK: NodeStyle = NodeStyle {
        fill: "#3498db",
        border: "#2980b9",
    };

    /// Style for `kind`
    #[must_use]
    pub const fn for_kind(kind: NodeKind) -> Self {
        let fill = match kind {
            NodeKind::Source => "#e74c3c",
            NodeKind::Lead => "#f39c12",
            NodeKind::Evidence => "#27ae60",
            NodeKind::Theory => "#9b59b6",
        };
        NodeStyle {
            fill,
            border: Self::FALLBACK.border,
        }
    }
}

/// Colour of edges and their arrowheads
pub const EDGE_COLOR: &str = "#7f8c8d";

/// One node as it should be drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderNode {
    /// Node id, for hit-testing back into gestures
    pub id: NodeId,
    /// Text on the node
    pub label: String,
    /// Category
    pub kind: NodeKind,
    /// Colours derived from the category
    pub style: NodeStyle,
    /// Whether this node is the current selection
    pub selected: bool,
}

/// One directed edge as it should be drawn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    /// Edge id
    pub id: EdgeId,
    /// Tail node
    pub source: NodeId,
    /// Head node, carries the arrow
    pub target: NodeId,
    /// Text on the edge
    pub label: String,
    /// Whether this edge is the current selection
    pub selected: bool,
}

/// Everything an adapter needs for one frame, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderView {
    /// Nodes to draw
    pub nodes: Vec<RenderNode>,
    /// Edges to draw
    pub edges: Vec<RenderEdge>,
    /// Current selection
    pub selection: Selection,
}

impl RenderView {
    /// Build the view of `document` with `selection` highlighted
    #[must_use]
    pub fn build(document: &GraphDocument, selection: &Selection) -> Self {
        let nodes = document
            .nodes()
            .map(|node| RenderNode {
                id: node.id.clone(),
                label: node.label.clone(),
                kind: node.kind,
                style: NodeStyle::for_kind(node.kind),
                selected: selection.node() == Some(&node.id),
            })
            .collect();
        let edges = document
            .edges()
            .map(|edge| RenderEdge {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                label: edge.label.clone(),
                selected: selection.edge() == Some(&edge.id),
            })
            .collect();
        Self {
            nodes,
            edges,
            selection: selection.clone(),
        }
    }
}

/// Something that draws a [`RenderView`]
pub trait RenderAdapter: Send {
    /// Replace whatever is on screen with `view`
    fn draw(&mut self, view: &RenderView);
}

impl<F> RenderAdapter for F
where
    F: FnMut(&RenderView) + Send,
{
    fn draw(&mut self, view: &RenderView) {
        self(view);
    }
}
