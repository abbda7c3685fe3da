//! Gesture handling and the single-selection model
//!
//! Gestures arrive from whatever front end drives the session. The
//! controller turns each one into at most one document mutation and keeps
//! the selection consistent with the document: one node, one edge, or
//! nothing, and never an id the document no longer contains.

use serde::Serialize;
use storyboard_graph::{
    EdgeId, GraphDocument, GraphError, NodeId, NodeKind, ReferenceError,
};

/// Label used when a connection is drawn without one
pub const DEFAULT_EDGE_LABEL: &str = "connects to";

/// Current selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Selection {
    /// Nothing selected
    #[default]
    None,
    /// One node
    Node(NodeId),
    /// One edge
    Edge(EdgeId),
}

impl Selection {
    /// Whether nothing is selected
    #[inline]
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Selected node, if the selection is a node
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::None | Self::Edge(_) => None,
        }
    }

    /// Selected edge, if the selection is an edge
    #[inline]
    #[must_use]
    pub fn edge(&self) -> Option<&EdgeId> {
        match self {
            Self::Edge(id) => Some(id),
            Self::None | Self::Node(_) => None,
        }
    }
}

/// User input the session understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gesture {
    /// Add a node
    CreateNode {
        /// Display label, must not be blank
        label: String,
        /// Category
        kind: NodeKind,
        /// Free text
        notes: String,
    },
    /// Draw an edge between two nodes
    Connect {
        /// Origin node
        source: NodeId,
        /// Destination node
        target: NodeId,
        /// Relationship description, [`DEFAULT_EDGE_LABEL`] when absent
        label: Option<String>,
    },
    /// Tap a node
    SelectNode(NodeId),
    /// Tap an edge
    SelectEdge(EdgeId),
    /// Tap empty canvas
    ClickCanvas,
    /// Explicit clear
    Deselect,
    /// Delete whatever is selected
    DeleteSelected,
    /// Change a node's label or notes
    EditNode {
        /// Node to edit
        id: NodeId,
        /// New label
        label: Option<String>,
        /// New notes
        notes: Option<String>,
    },
}

impl Gesture {
    /// Convenience constructor for [`Gesture::CreateNode`]
    #[must_use]
    pub fn create_node(label: impl Into<String>, kind: NodeKind, notes: impl Into<String>) -> Self {
        Self::CreateNode {
            label: label.into(),
            kind,
            notes: notes.into(),
        }
    }

    /// Convenience constructor for [`Gesture::Connect`]
    #[must_use]
    pub fn connect(source: NodeId, target: NodeId, label: Option<String>) -> Self {
        Self::Connect {
            source,
            target,
            label,
        }
    }
}

/// Document change caused by a gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A node was added
    NodeCreated(NodeId),
    /// An edge was added
    EdgeCreated(EdgeId),
    /// A node was removed together with its incident edges
    NodeRemoved {
        /// Removed node
        node: NodeId,
        /// Edges removed with it
        edges: Vec<EdgeId>,
    },
    /// An edge was removed
    EdgeRemoved(EdgeId),
    /// A node's label or notes changed
    NodeEdited(NodeId),
}

/// What applying a gesture did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureOutcome {
    /// Document change, if any
    pub mutation: Option<Mutation>,
    /// Selection after the gesture
    pub selection: Selection,
    /// Whether the selection differs from before the gesture
    pub selection_changed: bool,
}

impl GestureOutcome {
    /// Whether the document changed
    #[inline]
    #[must_use]
    pub fn mutated(&self) -> bool {
        self.mutation.is_some()
    }

    /// Whether the view needs a redraw
    #[inline]
    #[must_use]
    pub fn needs_redraw(&self) -> bool {
        self.mutated() || self.selection_changed
    }

    /// Id of the node this gesture created
    #[must_use]
    pub fn created_node(&self) -> Option<&NodeId> {
        match &self.mutation {
            Some(Mutation::NodeCreated(id)) => Some(id),
            _ => None,
        }
    }

    /// Id of the edge this gesture created
    #[must_use]
    pub fn created_edge(&self) -> Option<&EdgeId> {
        match &self.mutation {
            Some(Mutation::EdgeCreated(id)) => Some(id),
            _ => None,
        }
    }
}

/// Owns the selection and applies gestures to a document
#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    selection: Selection,
}

impl InteractionController {
    /// Controller with nothing selected
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current selection
    #[inline]
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Apply one gesture
    ///
    /// A rejected gesture leaves both the document and the selection
    /// untouched.
    ///
    /// # Errors
    /// `GraphError` when the document rejects the change or a gesture names
    /// an unknown entity
    pub fn apply(
        &mut self,
        document: &mut GraphDocument,
        gesture: Gesture,
    ) -> Result<GestureOutcome, GraphError> {
        let before = self.selection.clone();

        let mutation = match gesture {
            Gesture::CreateNode { label, kind, notes } => {
                Some(Mutation::NodeCreated(document.add_node(label, kind, notes)?))
            }
            Gesture::Connect {
                source,
                target,
                label,
            } => {
                let label = label.unwrap_or_else(|| DEFAULT_EDGE_LABEL.to_string());
                Some(Mutation::EdgeCreated(document.add_edge(&source, &target, label)?))
            }
            Gesture::SelectNode(id) => {
                if !document.contains_node(id.as_str()) {
                    return Err(ReferenceError::UnknownNode(id).into());
                }
                self.selection = Selection::Node(id);
                None
            }
            Gesture::SelectEdge(id) => {
                if !document.contains_edge(id.as_str()) {
                    return Err(ReferenceError::UnknownEdge(id).into());
                }
                self.selection = Selection::Edge(id);
                None
            }
            Gesture::ClickCanvas | Gesture::Deselect => {
                self.selection = Selection::None;
                None
            }
            Gesture::DeleteSelected => self.delete_selected(document),
            Gesture::EditNode { id, label, notes } => {
                if !document.contains_node(id.as_str()) {
                    return Err(ReferenceError::UnknownNode(id).into());
                }
                if label.is_none() && notes.is_none() {
                    None
                } else {
                    if let Some(label) = label {
                        document.set_node_label(id.as_str(), label)?;
                    }
                    if let Some(notes) = notes {
                        document.set_node_notes(id.as_str(), notes)?;
                    }
                    Some(Mutation::NodeEdited(id))
                }
            }
        };

        self.reconcile(document);

        Ok(GestureOutcome {
            mutation,
            selection_changed: self.selection != before,
            selection: self.selection.clone(),
        })
    }

    /// Drop a selection that points at something the document lost
    pub fn reconcile(&mut self, document: &GraphDocument) {
        let stale = match &self.selection {
            Selection::None => false,
            Selection::Node(id) => !document.contains_node(id.as_str()),
            Selection::Edge(id) => !document.contains_edge(id.as_str()),
        };
        if stale {
            tracing::debug!(selection = ?self.selection, "clearing stale selection");
            self.selection = Selection::None;
        }
    }

    fn delete_selected(&mut self, document: &mut GraphDocument) -> Option<Mutation> {
        let selection = std::mem::take(&mut self.selection);
        match selection {
            Selection::None => None,
            Selection::Node(id) => document.remove_node(id.as_str()).map(|removed| {
                Mutation::NodeRemoved {
                    node: removed.node.id,
                    edges: removed.edges.into_iter().map(|edge| edge.id).collect(),
                }
            }),
            Selection::Edge(id) => document
                .remove_edge(id.as_str())
                .map(|edge| Mutation::EdgeRemoved(edge.id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use storyboard_graph::ValidationError;

    fn two_nodes() -> (GraphDocument, NodeId, NodeId) {
        let mut doc = GraphDocument::new();
        let a = doc.add_node("Informant", NodeKind::Source, "").unwrap();
        let b = doc.add_node("Warehouse", NodeKind::Lead, "").unwrap();
        (doc, a, b)
    }

    #[test]
    fn create_node_does_not_select() {
        let mut doc = GraphDocument::new();
        let mut ctl = InteractionController::new();

        let outcome = ctl
            .apply(&mut doc, Gesture::create_node("Receipt", NodeKind::Evidence, ""))
            .unwrap();

        assert!(outcome.mutated());
        assert!(!outcome.selection_changed);
        assert_eq!(doc.node_count(), 1);
        assert!(ctl.selection().is_none());
    }

    #[test]
    fn connect_defaults_the_label() {
        let (mut doc, a, b) = two_nodes();
        let mut ctl = InteractionController::new();

        let outcome = ctl.apply(&mut doc, Gesture::connect(a, b, None)).unwrap();
        let Some(Mutation::EdgeCreated(edge)) = outcome.mutation else {
            panic!("expected an edge");
        };
        assert_eq!(doc.edge(edge.as_str()).unwrap().label, DEFAULT_EDGE_LABEL);
    }

    #[test]
    fn selecting_an_edge_replaces_a_node_selection() {
        let (mut doc, a, b) = two_nodes();
        let edge = doc.add_edge(&a, &b, "met at").unwrap();
        let mut ctl = InteractionController::new();

        ctl.apply(&mut doc, Gesture::SelectNode(a)).unwrap();
        let outcome = ctl.apply(&mut doc, Gesture::SelectEdge(edge.clone())).unwrap();

        assert_eq!(outcome.selection, Selection::Edge(edge));
        assert!(outcome.selection_changed);
        assert!(!outcome.mutated());
    }

    #[test]
    fn unknown_selection_is_rejected_and_keeps_the_old_one() {
        let (mut doc, a, _) = two_nodes();
        let mut ctl = InteractionController::new();
        ctl.apply(&mut doc, Gesture::SelectNode(a.clone())).unwrap();

        let err = ctl
            .apply(&mut doc, Gesture::SelectNode(NodeId::from("node_missing")))
            .unwrap_err();

        assert!(matches!(err, GraphError::Reference(ReferenceError::UnknownNode(_))));
        assert_eq!(ctl.selection(), &Selection::Node(a));
    }

    #[test]
    fn canvas_click_clears() {
        let (mut doc, a, _) = two_nodes();
        let mut ctl = InteractionController::new();
        ctl.apply(&mut doc, Gesture::SelectNode(a)).unwrap();

        let outcome = ctl.apply(&mut doc, Gesture::ClickCanvas).unwrap();
        assert!(outcome.selection.is_none());
        assert!(outcome.selection_changed);
    }

    #[test]
    fn delete_selected_node_cascades_and_clears() {
        let (mut doc, a, b) = two_nodes();
        let edge = doc.add_edge(&a, &b, "").unwrap();
        let mut ctl = InteractionController::new();
        ctl.apply(&mut doc, Gesture::SelectNode(a.clone())).unwrap();

        let outcome = ctl.apply(&mut doc, Gesture::DeleteSelected).unwrap();

        assert_eq!(
            outcome.mutation,
            Some(Mutation::NodeRemoved {
                node: a,
                edges: vec![edge],
            })
        );
        assert!(ctl.selection().is_none());
        assert_eq!(doc.edge_count(), 0);
        assert_eq!(doc.node_count(), 1);
    }

    #[test]
    fn delete_selected_edge_keeps_nodes() {
        let (mut doc, a, b) = two_nodes();
        let edge = doc.add_edge(&a, &b, "").unwrap();
        let mut ctl = InteractionController::new();
        ctl.apply(&mut doc, Gesture::SelectEdge(edge.clone())).unwrap();

        let outcome = ctl.apply(&mut doc, Gesture::DeleteSelected).unwrap();
        assert_eq!(outcome.mutation, Some(Mutation::EdgeRemoved(edge)));
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn delete_with_nothing_selected_is_noop() {
        let (mut doc, _, _) = two_nodes();
        let mut ctl = InteractionController::new();
        let outcome = ctl.apply(&mut doc, Gesture::DeleteSelected).unwrap();
        assert!(!outcome.needs_redraw());
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn edit_with_blank_label_changes_nothing() {
        let (mut doc, a, _) = two_nodes();
        let mut ctl = InteractionController::new();

        let err = ctl
            .apply(
                &mut doc,
                Gesture::EditNode {
                    id: a.clone(),
                    label: Some("  ".into()),
                    notes: Some("should not land".into()),
                },
            )
            .unwrap_err();

        assert_eq!(err, GraphError::Validation(ValidationError::EmptyLabel));
        assert_eq!(doc.node(a.as_str()).unwrap().notes, "");
    }

    #[test]
    fn edit_updates_label_and_notes() {
        let (mut doc, a, _) = two_nodes();
        let mut ctl = InteractionController::new();

        let outcome = ctl
            .apply(
                &mut doc,
                Gesture::EditNode {
                    id: a.clone(),
                    label: Some("Confidential informant".into()),
                    notes: Some("met twice".into()),
                },
            )
            .unwrap();

        assert_eq!(outcome.mutation, Some(Mutation::NodeEdited(a.clone())));
        let node = doc.node(a.as_str()).unwrap();
        assert_eq!(node.label, "Confidential informant");
        assert_eq!(node.notes, "met twice");
    }

    #[test]
    fn rejected_connect_leaves_document_alone() {
        let (mut doc, a, _) = two_nodes();
        let mut ctl = InteractionController::new();
        let err = ctl.apply(&mut doc, Gesture::connect(a.clone(), a, None)).unwrap_err();
        assert!(matches!(err, GraphError::Validation(ValidationError::SelfLoop(_))));
        assert_eq!(doc.edge_count(), 0);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Create,
        Connect(usize, usize),
        SelectNode(usize),
        SelectEdge(usize),
        Click,
        Delete,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            Just(Step::Create),
            (0..8usize, 0..8usize).prop_map(|(a, b)| Step::Connect(a, b)),
            (0..8usize).prop_map(Step::SelectNode),
            (0..8usize).prop_map(Step::SelectEdge),
            Just(Step::Click),
            Just(Step::Delete),
        ]
    }

    proptest! {
        #[test]
        fn selection_always_points_at_a_live_entity(steps in prop::collection::vec(step(), 1..60)) {
            let mut doc = GraphDocument::new();
            let mut ctl = InteractionController::new();

            for step in steps {
                let nodes: Vec<NodeId> = doc.nodes().map(|n| n.id.clone()).collect();
                let edges: Vec<EdgeId> = doc.edges().map(|e| e.id.clone()).collect();
                let gesture = match step {
                    Step::Create => Gesture::create_node("n", NodeKind::Theory, ""),
                    Step::Connect(a, b) if !nodes.is_empty() => Gesture::connect(
                        nodes[a % nodes.len()].clone(),
                        nodes[b % nodes.len()].clone(),
                        None,
                    ),
                    Step::SelectNode(i) if !nodes.is_empty() => {
                        Gesture::SelectNode(nodes[i % nodes.len()].clone())
                    }
                    Step::SelectEdge(i) if !edges.is_empty() => {
                        Gesture::SelectEdge(edges[i % edges.len()].clone())
                    }
                    Step::Delete => Gesture::DeleteSelected,
                    _ => Gesture::ClickCanvas,
                };
                let _ = ctl.apply(&mut doc, gesture);

                match ctl.selection() {
                    Selection::None => {}
                    Selection::Node(id) => prop_assert!(doc.contains_node(id.as_str())),
                    Selection::Edge(id) => prop_assert!(doc.contains_edge(id.as_str())),
                }
            }
        }
    }
}
