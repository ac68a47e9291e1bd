//! Anchor handle visibility.
//!
//! Handles are hidden until the pointer hovers their node. While a
//! connection is being drawn, every node other than the source shows its
//! handles, and the handle under the pointer is highlighted.

use crate::connect::DrawingConnection;
use crate::hit::AnchorHit;
use fc_core::{Anchor, DiagramGraph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Hidden,
    Normal,
    Highlighted,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandleVisibility {
    hovered: Option<NodeId>,
    revealed: Vec<NodeId>,
    highlighted: Option<AnchorHit>,
}

impl HandleVisibility {
    pub fn hovered(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn set_hovered(&mut self, node: Option<NodeId>) {
        self.hovered = node;
    }

    /// Nodes whose handles are shown because a connection is being drawn.
    pub fn revealed(&self) -> &[NodeId] {
        &self.revealed
    }

    pub fn highlighted(&self) -> Option<AnchorHit> {
        self.highlighted
    }

    /// Follow the connection tool: reveal handles while drawing, hide them after.
    pub fn sync(&mut self, graph: &DiagramGraph, drawing: Option<&DrawingConnection>) {
        match drawing {
            Some(d) => {
                if self.revealed.is_empty() {
                    self.revealed = graph
                        .node_ids()
                        .iter()
                        .copied()
                        .filter(|id| *id != d.source)
                        .collect();
                }
                self.highlighted = d.hovered;
            }
            None => {
                self.revealed.clear();
                self.highlighted = None;
            }
        }
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.hovered == Some(node) || self.revealed.contains(&node)
    }

    pub fn state(&self, node: NodeId, anchor: Anchor) -> HandleState {
        if self.highlighted == Some(AnchorHit { node, anchor }) {
            HandleState::Highlighted
        } else if self.is_visible(node) {
            HandleState::Normal
        } else {
            HandleState::Hidden
        }
    }

    /// Forget a node that left the graph.
    pub fn forget(&mut self, node: NodeId) {
        if self.hovered == Some(node) {
            self.hovered = None;
        }
        self.revealed.retain(|id| *id != node);
        if self.highlighted.is_some_and(|h| h.node == node) {
            self.highlighted = None;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
