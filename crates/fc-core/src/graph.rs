//! The diagram graph: nodes joined by connectors.
//!
//! Storage is a `StableDiGraph<Node, Connector>`: nodes are graph vertices
//! and every connector is an edge from its start node to its end node.
//! Removing a node therefore removes its connectors too, so a connector can
//! never outlive either endpoint. Insertion order (which is also the z-order
//! and the order of generated text) is kept in separate order lists because
//! the stable graph reuses vacant slots.
//!
//! Every mutation emits [`ChangeRecord`]s to subscribers.

use crate::change::{
    ChangeListener, ChangeRecord, EntityId, Field, FieldValue, Notifier, SubscriptionId,
};
use crate::geometry::contains_point;
use crate::id::{ConnectorId, NodeId};
use crate::model::*;
use kurbo::{Point, Size, Vec2};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use std::collections::{HashMap, HashSet};

/// Result of [`DiagramGraph::add_connector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddConnectorOutcome {
    /// The connector was stored under this ID.
    Added(ConnectorId),
    /// The two nodes are already linked (in either direction) by this connector.
    Duplicate(ConnectorId),
    /// Start and end are the same node.
    SelfLoop,
    /// An endpoint does not exist in the graph.
    MissingNode(NodeId),
}

impl AddConnectorOutcome {
    pub fn added(self) -> Option<ConnectorId> {
        match self {
            AddConnectorOutcome::Added(id) => Some(id),
            _ => None,
        }
    }
}

/// A node removed from the graph along with the connectors that went with it.
#[derive(Debug, Clone)]
pub struct RemovedNode {
    pub node: Node,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Default)]
pub struct DiagramGraph {
    graph: StableDiGraph<Node, Connector>,
    node_index: HashMap<NodeId, NodeIndex>,
    connector_index: HashMap<ConnectorId, EdgeIndex>,
    /// Back-to-front paint order of nodes.
    node_order: Vec<NodeId>,
    connector_order: Vec<ConnectorId>,
    notifier: Notifier,
}

impl DiagramGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Subscriptions ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.notifier.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    // ─── Ids ─────────────────────────────────────────────────────────────

    /// A node ID not used by any node in this graph.
    pub fn fresh_node_id(&self) -> NodeId {
        loop {
            let id = NodeId::generate();
            if !self.node_index.contains_key(&id) {
                return id;
            }
        }
    }

    /// A connector ID not used by any connector in this graph.
    pub fn fresh_connector_id(&self) -> ConnectorId {
        loop {
            let id = ConnectorId::generate();
            if !self.connector_index.contains_key(&id) {
                return id;
            }
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn connector_count(&self) -> usize {
        self.connector_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_order.is_empty()
    }

    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn find_connector(&self, id: ConnectorId) -> Option<&Connector> {
        self.connector_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.node_index.contains_key(&id)
    }

    /// Nodes in stored (back-to-front) order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.node_order.iter().map(|id| &self.graph[self.node_index[id]])
    }

    /// Connectors in stored order.
    pub fn connectors(&self) -> impl Iterator<Item = &Connector> + '_ {
        self.connector_order
            .iter()
            .map(|id| &self.graph[self.connector_index[id]])
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn connector_ids(&self) -> &[ConnectorId] {
        &self.connector_order
    }

    /// The front-most node whose bounding box contains `point`.
    pub fn find_node_at(&self, point: Point) -> Option<NodeId> {
        self.node_order
            .iter()
            .rev()
            .copied()
            .find(|id| contains_point(&self.graph[self.node_index[id]], point))
    }

    /// Every connector that starts or ends at `id`, in stored order.
    pub fn find_connectors_for_node(&self, id: NodeId) -> Vec<&Connector> {
        let Some(&idx) = self.node_index.get(&id) else {
            return Vec::new();
        };
        let incident: HashSet<ConnectorId> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.weight().id)
            .collect();
        self.connectors()
            .filter(|c| incident.contains(&c.id))
            .collect()
    }

    /// The connector linking `a` and `b` in either direction, if any.
    pub fn connector_between(&self, a: NodeId, b: NodeId) -> Option<ConnectorId> {
        let ia = *self.node_index.get(&a)?;
        let ib = *self.node_index.get(&b)?;
        self.graph
            .find_edge_undirected(ia, ib)
            .map(|(edge, _)| self.graph[edge].id)
    }

    pub fn connection_exists(&self, a: NodeId, b: NodeId) -> bool {
        self.connector_between(a, b).is_some()
    }

    // ─── Structural mutations ────────────────────────────────────────────

    /// Add a node on top of the z-order. Returns the ID it was stored under:
    /// a node whose ID is already taken is given a fresh one.
    pub fn add_node(&mut self, mut node: Node) -> NodeId {
        if self.node_index.contains_key(&node.id) {
            let fresh = self.fresh_node_id();
            log::warn!("node id {} already in use, storing as {}", node.id, fresh);
            node.id = fresh;
        }
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.node_index.insert(id, idx);
        self.node_order.push(id);
        self.notifier.emit(ChangeRecord::added(EntityId::Node(id)));
        id
    }

    /// Remove a node and every connector attached to it.
    ///
    /// One removal record is emitted per connector, then one for the node.
    pub fn remove_node(&mut self, id: NodeId) -> Option<RemovedNode> {
        let idx = *self.node_index.get(&id)?;
        let connectors: Vec<Connector> = self
            .find_connectors_for_node(id)
            .into_iter()
            .cloned()
            .collect();

        for c in &connectors {
            self.connector_index.remove(&c.id);
            self.connector_order.retain(|cid| *cid != c.id);
            self.notifier
                .emit(ChangeRecord::removed(EntityId::Connector(c.id)));
        }

        // petgraph drops the incident edges along with the vertex.
        let node = self.graph.remove_node(idx)?;
        self.node_index.remove(&id);
        self.node_order.retain(|n| *n != id);
        self.notifier.emit(ChangeRecord::removed(EntityId::Node(id)));
        log::debug!("removed node {id} with {} connector(s)", connectors.len());
        Some(RemovedNode { node, connectors })
    }

    /// Store a connector between two existing, distinct, not-yet-linked nodes.
    ///
    /// A connector whose ID is already taken is given a fresh one.
    pub fn add_connector(&mut self, mut connector: Connector) -> AddConnectorOutcome {
        let (start, end) = (connector.start_node, connector.end_node);
        if start == end {
            return AddConnectorOutcome::SelfLoop;
        }
        let Some(&si) = self.node_index.get(&start) else {
            return AddConnectorOutcome::MissingNode(start);
        };
        let Some(&ei) = self.node_index.get(&end) else {
            return AddConnectorOutcome::MissingNode(end);
        };
        if let Some(existing) = self.connector_between(start, end) {
            log::debug!("suppressed duplicate connector {start} ↔ {end}");
            return AddConnectorOutcome::Duplicate(existing);
        }
        if self.connector_index.contains_key(&connector.id) {
            connector.id = self.fresh_connector_id();
        }

        let id = connector.id;
        let edge = self.graph.add_edge(si, ei, connector);
        self.connector_index.insert(id, edge);
        self.connector_order.push(id);
        self.notifier
            .emit(ChangeRecord::added(EntityId::Connector(id)));
        AddConnectorOutcome::Added(id)
    }

    pub fn remove_connector(&mut self, id: ConnectorId) -> Option<Connector> {
        let edge = self.connector_index.remove(&id)?;
        self.connector_order.retain(|c| *c != id);
        let removed = self.graph.remove_edge(edge);
        self.notifier
            .emit(ChangeRecord::removed(EntityId::Connector(id)));
        removed
    }

    /// Copy a node under a fresh ID, shifted by `offset`. The copy is unselected.
    pub fn clone_node(&mut self, id: NodeId, offset: Vec2) -> Option<NodeId> {
        let mut copy = self.find_node(id)?.clone();
        copy.id = self.fresh_node_id();
        copy.position += offset;
        copy.selected = false;
        Some(self.add_node(copy))
    }

    /// Remove everything, emitting a removal record per entity.
    pub fn clear(&mut self) {
        for cid in std::mem::take(&mut self.connector_order) {
            self.notifier
                .emit(ChangeRecord::removed(EntityId::Connector(cid)));
        }
        for nid in std::mem::take(&mut self.node_order) {
            self.notifier.emit(ChangeRecord::removed(EntityId::Node(nid)));
        }
        self.graph.clear();
        self.node_index.clear();
        self.connector_index.clear();
    }

    /// Take over the contents of `other` while keeping this graph's subscribers.
    ///
    /// Subscribers see removals for the old contents followed by additions for
    /// the new ones.
    pub fn replace_contents(&mut self, other: DiagramGraph) {
        self.clear();
        let DiagramGraph {
            graph,
            node_index,
            connector_index,
            node_order,
            connector_order,
            notifier: _,
        } = other;
        self.graph = graph;
        self.node_index = node_index;
        self.connector_index = connector_index;
        self.node_order = node_order;
        self.connector_order = connector_order;

        for i in 0..self.node_order.len() {
            let id = self.node_order[i];
            self.notifier.emit(ChangeRecord::added(EntityId::Node(id)));
        }
        for i in 0..self.connector_order.len() {
            let id = self.connector_order[i];
            self.notifier
                .emit(ChangeRecord::added(EntityId::Connector(id)));
        }
    }

    // ─── Node field mutations ────────────────────────────────────────────

    /// Apply `update` to a node field and emit a record if the value changed.
    fn update_node<T: Clone + PartialEq>(
        &mut self,
        id: NodeId,
        field: Field,
        get: impl Fn(&mut Node) -> &mut T,
        value: T,
        wrap: impl Fn(T) -> FieldValue,
    ) -> bool {
        let Some(&idx) = self.node_index.get(&id) else {
            return false;
        };
        let slot = get(&mut self.graph[idx]);
        if *slot == value {
            return false;
        }
        let old = std::mem::replace(slot, value.clone());
        self.notifier.emit(ChangeRecord {
            entity: EntityId::Node(id),
            field,
            old: wrap(old),
            new: wrap(value),
        });
        true
    }

    pub fn move_node_to(&mut self, id: NodeId, position: Point) -> bool {
        self.update_node(id, Field::Position, |n| &mut n.position, position, FieldValue::Point)
    }

    pub fn translate_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.find_node(id) {
            Some(node) => {
                let target = node.position + delta;
                self.move_node_to(id, target)
            }
            None => false,
        }
    }

    pub fn resize_node(&mut self, id: NodeId, size: Size) -> bool {
        self.update_node(id, Field::Size, |n| &mut n.size, size, FieldValue::Size)
    }

    pub fn set_node_text(&mut self, id: NodeId, text: String) -> bool {
        self.update_node(id, Field::Text, |n| &mut n.text, text, FieldValue::Text)
    }

    pub fn set_node_shape(&mut self, id: NodeId, shape: ShapeKind) -> bool {
        self.update_node(id, Field::Shape, |n| &mut n.shape, shape, FieldValue::Shape)
    }

    pub fn set_node_style(&mut self, id: NodeId, style: NodeStyle) -> bool {
        self.update_node(id, Field::Style, |n| &mut n.style, style, |s| {
            FieldValue::Style(Box::new(s))
        })
    }

    pub fn set_node_selected(&mut self, id: NodeId, selected: bool) -> bool {
        self.update_node(id, Field::Selected, |n| &mut n.selected, selected, FieldValue::Flag)
    }

    // ─── Connector field mutations ───────────────────────────────────────

    fn update_connector<T: Clone + PartialEq>(
        &mut self,
        id: ConnectorId,
        field: Field,
        get: impl Fn(&mut Connector) -> &mut T,
        value: T,
        wrap: impl Fn(T) -> FieldValue,
    ) -> bool {
        let Some(&idx) = self.connector_index.get(&id) else {
            return false;
        };
        let slot = get(&mut self.graph[idx]);
        if *slot == value {
            return false;
        }
        let old = std::mem::replace(slot, value.clone());
        self.notifier.emit(ChangeRecord {
            entity: EntityId::Connector(id),
            field,
            old: wrap(old),
            new: wrap(value),
        });
        true
    }

    pub fn set_connector_label(&mut self, id: ConnectorId, label: Option<String>) -> bool {
        let label = label.filter(|l| !l.is_empty());
        self.update_connector(id, Field::Label, |c| &mut c.label, label, FieldValue::Label)
    }

    pub fn set_connector_anchors(&mut self, id: ConnectorId, start: Anchor, end: Anchor) -> bool {
        let Some(&idx) = self.connector_index.get(&id) else {
            return false;
        };
        let c = &mut self.graph[idx];
        let old = (c.start_anchor, c.end_anchor);
        if old == (start, end) {
            return false;
        }
        c.start_anchor = start;
        c.end_anchor = end;
        self.notifier.emit(ChangeRecord {
            entity: EntityId::Connector(id),
            field: Field::Anchors,
            old: FieldValue::Anchors(old.0, old.1),
            new: FieldValue::Anchors(start, end),
        });
        true
    }

    pub fn set_connector_line_style(&mut self, id: ConnectorId, style: LineStyle) -> bool {
        self.update_connector(
            id,
            Field::LineStyle,
            |c| &mut c.line_style,
            style,
            FieldValue::LineStyle,
        )
    }

    pub fn set_connector_arrows(&mut self, id: ConnectorId, start: ArrowKind, end: ArrowKind) -> bool {
        let Some(&idx) = self.connector_index.get(&id) else {
            return false;
        };
        let c = &mut self.graph[idx];
        let old = (c.start_arrow, c.end_arrow);
        if old == (start, end) {
            return false;
        }
        c.start_arrow = start;
        c.end_arrow = end;
        self.notifier.emit(ChangeRecord {
            entity: EntityId::Connector(id),
            field: Field::Arrows,
            old: FieldValue::Arrows(old.0, old.1),
            new: FieldValue::Arrows(start, end),
        });
        true
    }

    pub fn set_connector_stroke(&mut self, id: ConnectorId, color: Color, width: f64) -> bool {
        let Some(&idx) = self.connector_index.get(&id) else {
            return false;
        };
        let c = &mut self.graph[idx];
        let old = (c.line_color, c.line_width);
        if old == (color, width) {
            return false;
        }
        c.line_color = color;
        c.line_width = width;
        self.notifier.emit(ChangeRecord {
            entity: EntityId::Connector(id),
            field: Field::Stroke,
            old: FieldValue::Stroke(old.0, old.1),
            new: FieldValue::Stroke(color, width),
        });
        true
    }

    pub fn set_connector_selected(&mut self, id: ConnectorId, selected: bool) -> bool {
        self.update_connector(
            id,
            Field::Selected,
            |c| &mut c.selected,
            selected,
            FieldValue::Flag,
        )
    }
}
