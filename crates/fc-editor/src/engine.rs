//! Canvas engine: owns the diagram and routes pointer gestures to tools.
//!
//! - **Canvas → Model**: pointer events are routed to the tool holding the
//!   pointer capture; the tool answers with `GraphMutation`s that the engine
//!   applies to the `DiagramGraph`.
//! - **Model → Text**: a graph listener marks the generated diagram text
//!   dirty; it is regenerated on the next request, not on every drag frame.
//! - **Model ⇄ Disk**: documents are rebuilt off to the side and swapped in
//!   only once they have validated.

use crate::capture::PointerCapture;
use crate::connect::{ConnectOutcome, ConnectState, ConnectTool};
use crate::handles::HandleVisibility;
use crate::hit::{Hit, anchor_at, hit_test, node_at};
use crate::input::{InputEvent, Modifiers};
use crate::tools::{DragTool, Tool, ToolContext, ToolKind};
use fc_core::document::{Document, Metadata};
use fc_core::error::Result;
use fc_core::geometry::snap_to_grid;
use fc_core::mermaid;
use fc_core::*;
use std::cell::Cell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

/// A single model edit, produced by tools or issued by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    AddNode { node: Node },
    RemoveNode { id: NodeId },
    MoveNode { id: NodeId, dx: f64, dy: f64 },
    SetPosition { id: NodeId, position: Point },
    ResizeNode { id: NodeId, size: Size },
    SetText { id: NodeId, text: String },
    SetShape { id: NodeId, shape: ShapeKind },
    SetStyle { id: NodeId, style: NodeStyle },
    DuplicateNode { id: NodeId },
    AddConnector { connector: Connector },
    RemoveConnector { id: ConnectorId },
    SetLabel { id: ConnectorId, label: Option<String> },
    SetAnchors { id: ConnectorId, start: Anchor, end: Anchor },
    SetLineStyle { id: ConnectorId, style: LineStyle },
    SetArrows { id: ConnectorId, start: ArrowKind, end: ArrowKind },
    SetConnectorStroke { id: ConnectorId, color: Color, width: f64 },
}

/// Drag operation requested by a palette drop. Only copies are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Copy,
    Move,
    Link,
}

/// Outbound notifications for the host application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The user asked to push the generated diagram text into the editor.
    ApplyCode(String),
}

pub struct CanvasEngine {
    graph: DiagramGraph,
    view: ViewState,
    config: CanvasConfig,

    drag: DragTool,
    connect: ConnectTool,
    capture: PointerCapture,
    handles: HandleVisibility,

    metadata: Metadata,
    /// Last generated diagram text.
    code: String,
    /// Set by the graph listener on any non-selection change.
    code_dirty: Rc<Cell<bool>>,
    host_events: Vec<HostEvent>,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasEngine {
    pub fn new() -> Self {
        Self::with_config(CanvasConfig::default())
    }

    pub fn with_config(config: CanvasConfig) -> Self {
        let code_dirty = Rc::new(Cell::new(true));
        let mut graph = DiagramGraph::new();
        let flag = Rc::clone(&code_dirty);
        graph.subscribe(Box::new(move |record| {
            if record.field != Field::Selected {
                flag.set(true);
            }
        }));

        Self {
            graph,
            view: ViewState::new(&config),
            metadata: Metadata::new(&config),
            config,
            drag: DragTool::new(),
            connect: ConnectTool::new(),
            capture: PointerCapture::default(),
            handles: HandleVisibility::default(),
            code: String::new(),
            code_dirty,
            host_events: Vec::new(),
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    /// Register a listener for model changes (for incremental view updates).
    pub fn subscribe(&mut self, listener: ChangeListener) -> SubscriptionId {
        self.graph.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.graph.unsubscribe(id)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn connect_state(&self) -> &ConnectState {
        self.connect.state()
    }

    pub fn last_connect_outcome(&self) -> Option<ConnectOutcome> {
        self.connect.last_outcome()
    }

    pub fn dragged_node(&self) -> Option<NodeId> {
        self.drag.grabbed()
    }

    pub fn capture_owner(&self) -> Option<ToolKind> {
        self.capture.owner()
    }

    pub fn handles(&self) -> &HandleVisibility {
        &self.handles
    }

    // ─── Pointer input ───────────────────────────────────────────────────

    pub fn handle_pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        self.handle_event(InputEvent::PointerDown { x, y, modifiers });
    }

    pub fn handle_pointer_move(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        self.handle_event(InputEvent::PointerMove { x, y, modifiers });
    }

    pub fn handle_pointer_up(&mut self, x: f64, y: f64, modifiers: Modifiers) {
        self.handle_event(InputEvent::PointerUp { x, y, modifiers });
    }

    pub fn handle_pointer_cancel(&mut self, x: f64, y: f64) {
        self.handle_event(InputEvent::PointerCancel { x, y });
    }

    pub fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown { .. } => self.pointer_down(&event),
            InputEvent::PointerMove { .. } => match self.capture.owner() {
                Some(owner) => self.route(owner, &event, Hit::default()),
                None => self.track_hover(event.position()),
            },
            InputEvent::PointerUp { .. } | InputEvent::PointerCancel { .. } => {
                if let Some(owner) = self.capture.release() {
                    self.route(owner, &event, Hit::default());
                }
            }
        }
        self.handles.sync(&self.graph, self.connect.drawing());
    }

    fn pointer_down(&mut self, event: &InputEvent) {
        // A press while a gesture is still captured means its release was lost.
        if let Some(stale) = self.capture.release() {
            log::warn!("press while {stale:?} held the pointer; cancelling it");
            let p = event.position();
            self.route(stale, &InputEvent::PointerCancel { x: p.x, y: p.y }, Hit::default());
        }

        let pos = event.position();
        let additive = event.modifiers().additive();
        let hit = hit_test(&self.graph, pos, self.config.handle_size);

        if hit.anchor.is_some() {
            self.route(ToolKind::Connect, event, hit);
            if self.connect.is_active() {
                self.capture.acquire(ToolKind::Connect);
            }
        } else if let Some(id) = hit.node {
            let target = SelectionTarget::Node(id);
            if additive || !self.view.selection.is_selected(target) {
                self.select(target, additive);
            }
            self.route(ToolKind::Drag, event, hit);
            if self.drag.is_active() {
                self.capture.acquire(ToolKind::Drag);
            }
        } else if let Some(id) = hit.connector {
            self.select(SelectionTarget::Connector(id), additive);
        } else if !additive {
            self.clear_selection();
        }
    }

    /// Hand `event` to `tool` and apply what it returns.
    fn route(&mut self, tool: ToolKind, event: &InputEvent, hit: Hit) {
        let ctx = ToolContext {
            graph: &self.graph,
            view: &self.view,
            config: &self.config,
            hit,
        };
        let mutations = match tool {
            ToolKind::Drag => self.drag.handle(event, &ctx),
            ToolKind::Connect => self.connect.handle(event, &ctx),
        };
        for m in mutations {
            self.apply_mutation(m);
        }
    }

    fn track_hover(&mut self, pos: Point) {
        let hovered = node_at(&self.graph, pos).or_else(|| {
            anchor_at(&self.graph, pos, self.config.handle_size, None).map(|h| h.node)
        });
        self.handles.set_hovered(hovered);
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Apply a mutation. Returns `false` if it changed nothing.
    pub fn apply_mutation(&mut self, mutation: GraphMutation) -> bool {
        let g = &mut self.graph;
        match mutation {
            GraphMutation::AddNode { node } => {
                g.add_node(node);
                true
            }
            GraphMutation::RemoveNode { id } => self.remove_node(id),
            GraphMutation::MoveNode { id, dx, dy } => g.translate_node(id, Vec2::new(dx, dy)),
            GraphMutation::SetPosition { id, position } => g.move_node_to(id, position),
            GraphMutation::ResizeNode { id, size } => g.resize_node(id, size),
            GraphMutation::SetText { id, text } => g.set_node_text(id, text),
            GraphMutation::SetShape { id, shape } => g.set_node_shape(id, shape),
            GraphMutation::SetStyle { id, style } => g.set_node_style(id, style),
            GraphMutation::DuplicateNode { id } => {
                g.clone_node(id, self.config.clone_offset).is_some()
            }
            GraphMutation::AddConnector { connector } => match g.add_connector(connector) {
                AddConnectorOutcome::Added(_) => true,
                other => {
                    log::debug!("connector not added: {other:?}");
                    false
                }
            },
            GraphMutation::RemoveConnector { id } => self.remove_connector(id),
            GraphMutation::SetLabel { id, label } => g.set_connector_label(id, label),
            GraphMutation::SetAnchors { id, start, end } => g.set_connector_anchors(id, start, end),
            GraphMutation::SetLineStyle { id, style } => g.set_connector_line_style(id, style),
            GraphMutation::SetArrows { id, start, end } => g.set_connector_arrows(id, start, end),
            GraphMutation::SetConnectorStroke { id, color, width } => {
                g.set_connector_stroke(id, color, width)
            }
        }
    }

    fn remove_node(&mut self, id: NodeId) -> bool {
        let Some(removed) = self.graph.remove_node(id) else {
            return false;
        };
        self.view.selection.remove(SelectionTarget::Node(id));
        for c in &removed.connectors {
            self.view.selection.remove(SelectionTarget::Connector(c.id));
        }
        self.handles.forget(id);
        if self.drag.grabbed() == Some(id) {
            self.drag.reset();
            self.release_capture(ToolKind::Drag);
        }
        if self.connect.drawing().is_some_and(|d| d.source == id) {
            self.connect.cancel();
            self.release_capture(ToolKind::Connect);
            self.handles.sync(&self.graph, None);
        }
        true
    }

    /// Drop the capture if `tool` holds it.
    fn release_capture(&mut self, tool: ToolKind) {
        if self.capture.owner() == Some(tool) {
            self.capture.release();
        }
    }

    fn remove_connector(&mut self, id: ConnectorId) -> bool {
        if self.graph.remove_connector(id).is_none() {
            return false;
        }
        self.view.selection.remove(SelectionTarget::Connector(id));
        true
    }

    // ─── Selection ───────────────────────────────────────────────────────

    fn set_selected_flag(&mut self, target: SelectionTarget, selected: bool) {
        match target {
            SelectionTarget::Node(id) => self.graph.set_node_selected(id, selected),
            SelectionTarget::Connector(id) => self.graph.set_connector_selected(id, selected),
        };
    }

    /// Select a node or connector. Additive selection toggles `target`.
    pub fn select(&mut self, target: SelectionTarget, additive: bool) {
        for (t, selected) in self.view.selection.select(target, additive) {
            self.set_selected_flag(t, selected);
        }
    }

    pub fn clear_selection(&mut self) {
        for (t, selected) in self.view.selection.clear() {
            self.set_selected_flag(t, selected);
        }
    }

    pub fn select_all(&mut self) {
        let targets: Vec<SelectionTarget> = self
            .graph
            .node_ids()
            .iter()
            .map(|id| SelectionTarget::Node(*id))
            .chain(
                self.graph
                    .connector_ids()
                    .iter()
                    .map(|id| SelectionTarget::Connector(*id)),
            )
            .collect();
        for t in targets {
            if self.view.selection.insert(t) {
                self.set_selected_flag(t, true);
            }
        }
    }

    /// Delete every selected connector and node (with its connectors).
    /// Returns how many entities were removed.
    pub fn delete_selection(&mut self) -> usize {
        let targets: Vec<SelectionTarget> = self.view.selection.iter().collect();
        let before = self.graph.node_count() + self.graph.connector_count();
        for t in targets {
            match t {
                SelectionTarget::Connector(id) => self.remove_connector(id),
                SelectionTarget::Node(id) => self.remove_node(id),
            };
        }
        self.clear_selection();
        before - (self.graph.node_count() + self.graph.connector_count())
    }

    /// Duplicate the selected nodes, plus the connectors running between them.
    /// The copies become the new selection.
    pub fn duplicate_selection(&mut self) -> Vec<NodeId> {
        let sources: Vec<NodeId> = self.view.selection.nodes().collect();
        let mut copies = HashMap::with_capacity(sources.len());
        for id in &sources {
            if let Some(copy) = self.graph.clone_node(*id, self.config.clone_offset) {
                copies.insert(*id, copy);
            }
        }

        let links: Vec<Connector> = self
            .graph
            .connectors()
            .filter(|c| copies.contains_key(&c.start_node) && copies.contains_key(&c.end_node))
            .cloned()
            .collect();
        for mut c in links {
            c.id = self.graph.fresh_connector_id();
            c.start_node = copies[&c.start_node];
            c.end_node = copies[&c.end_node];
            c.selected = false;
            self.graph.add_connector(c);
        }

        let new_ids: Vec<NodeId> = sources.iter().filter_map(|id| copies.get(id).copied()).collect();
        self.clear_selection();
        for id in &new_ids {
            self.select(SelectionTarget::Node(*id), true);
        }
        new_ids
    }

    /// Create a node from a palette template dropped at `position`.
    ///
    /// The node's top-left lands on the drop point (snapped when snapping is
    /// on) and becomes the selection. Only copy drops are accepted.
    pub fn drop_template(
        &mut self,
        template: &ShapeTemplate,
        position: Point,
        effect: DropEffect,
    ) -> Option<NodeId> {
        if effect != DropEffect::Copy {
            log::debug!("rejected {effect:?} drop of {}", template.id);
            return None;
        }
        let position = if self.view.snap_to_grid {
            snap_to_grid(position, self.view.grid_size())
        } else {
            position
        };
        let id = self.graph.add_node(template.create_node(position));
        self.select(SelectionTarget::Node(id), false);
        log::debug!("dropped {} as {id}", template.id);
        Some(id)
    }

    // ─── View ────────────────────────────────────────────────────────────

    pub fn zoom_in(&mut self) -> f64 {
        self.view.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.view.zoom_out()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.view.reset_zoom()
    }

    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        self.view.set_zoom(zoom)
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.view.show_grid = show;
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.view.snap_to_grid = snap;
    }

    pub fn set_grid_size(&mut self, size: f64) -> bool {
        self.view.set_grid_size(size)
    }

    // ─── Diagram text ────────────────────────────────────────────────────

    /// Current diagram text, regenerated only if the model changed.
    pub fn generate_code(&mut self) -> &str {
        if self.code_dirty.replace(false) {
            self.code = mermaid::generate(&self.graph, self.config.direction);
        }
        &self.code
    }

    /// Queue the current diagram text for the host's editor.
    pub fn request_apply_code(&mut self) {
        let code = self.generate_code().to_owned();
        self.host_events.push(HostEvent::ApplyCode(code));
    }

    pub fn drain_host_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.host_events)
    }

    // ─── Documents ───────────────────────────────────────────────────────

    /// Snapshot the canvas as a persisted document.
    pub fn to_document(&mut self) -> Document {
        self.generate_code();
        let doc = Document::from_graph(&self.graph, self.view.settings(), &self.metadata, &self.code);
        self.metadata = doc.metadata.clone();
        doc
    }

    pub fn save_to_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.to_document().write_to_path(path)
    }

    /// Replace the canvas with `doc`. On error the canvas is left untouched.
    pub fn load_document(&mut self, doc: &Document) -> Result<()> {
        let (graph, settings) = doc.to_graph(&self.config)?;

        self.abort_gesture();
        self.view.selection.clear();
        self.handles.clear();
        self.graph.replace_contents(graph);
        self.view.apply_settings(settings);
        self.metadata = doc.metadata.clone();
        log::debug!("document loaded ({} nodes)", self.graph.node_count());
        Ok(())
    }

    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let doc = Document::from_json_str(json)?;
        self.load_document(&doc)
    }

    pub fn load_from_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let doc = Document::read_from_path(path)?;
        self.load_document(&doc)
    }

    /// Start over with an empty canvas and fresh metadata.
    pub fn new_document(&mut self) {
        self.abort_gesture();
        self.view.selection.clear();
        self.handles.clear();
        self.graph.clear();
        self.view = ViewState::new(&self.config);
        self.metadata = Metadata::new(&self.config);
    }

    fn abort_gesture(&mut self) {
        self.capture.release();
        self.drag.reset();
        self.connect.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine_with(nodes: &[(&str, f64, f64)]) -> CanvasEngine {
        let mut engine = CanvasEngine::new();
        for &(id, x, y) in nodes {
            engine.apply_mutation(GraphMutation::AddNode {
                node: Node::new(
                    NodeId::intern(id),
                    ShapeKind::Rectangle,
                    Point::new(x, y),
                    Size::new(100.0, 50.0),
                ),
            });
        }
        engine
    }

    #[test]
    fn selection_flags_follow_view_state() {
        let mut engine = engine_with(&[("ea", 0.0, 0.0), ("eb", 200.0, 0.0)]);
        let a = NodeId::intern("ea");
        let b = NodeId::intern("eb");
        engine.select(SelectionTarget::Node(a), false);
        engine.select(SelectionTarget::Node(b), true);
        assert!(engine.graph().find_node(a).unwrap().selected);
        assert!(engine.graph().find_node(b).unwrap().selected);

        engine.select(SelectionTarget::Node(b), false);
        assert!(!engine.graph().find_node(a).unwrap().selected);
        assert!(engine.graph().find_node(b).unwrap().selected);

        engine.clear_selection();
        assert!(!engine.graph().find_node(b).unwrap().selected);
        assert!(engine.view().selection.is_empty());
    }

    #[test]
    fn code_is_cached_until_the_model_changes() {
        let mut engine = engine_with(&[("ca", 0.0, 0.0)]);
        let first = engine.generate_code().to_owned();
        assert!(first.contains("ca["));

        // Selection is not part of the diagram text.
        engine.select(SelectionTarget::Node(NodeId::intern("ca")), false);
        assert!(!engine.code_dirty.get());

        engine.apply_mutation(GraphMutation::SetText {
            id: NodeId::intern("ca"),
            text: "Renamed".into(),
        });
        assert!(engine.code_dirty.get());
        assert!(engine.generate_code().contains("ca[Renamed]"));
    }

    #[test]
    fn apply_code_request_reaches_the_host() {
        let mut engine = engine_with(&[("ha", 0.0, 0.0)]);
        engine.request_apply_code();
        let events = engine.drain_host_events();
        assert_eq!(events.len(), 1);
        let HostEvent::ApplyCode(code) = &events[0];
        assert!(code.starts_with("flowchart TD\n"));
        assert!(engine.drain_host_events().is_empty());
    }

    #[test]
    fn delete_selection_cascades() {
        let mut engine = engine_with(&[("xa", 0.0, 0.0), ("xb", 200.0, 0.0), ("xc", 0.0, 200.0)]);
        for (id, a, b) in [("xab", "xa", "xb"), ("xbc", "xb", "xc")] {
            engine.apply_mutation(GraphMutation::AddConnector {
                connector: Connector::new(
                    ConnectorId::intern(id),
                    NodeId::intern(a),
                    Anchor::Right,
                    NodeId::intern(b),
                    Anchor::Left,
                ),
            });
        }
        engine.select(SelectionTarget::Node(NodeId::intern("xa")), false);
        engine.select(SelectionTarget::Connector(ConnectorId::intern("xab")), true);

        assert_eq!(engine.delete_selection(), 2);
        assert_eq!(engine.graph().node_count(), 2);
        let left: Vec<&str> = engine.graph().connectors().map(|c| c.id.as_str()).collect();
        assert_eq!(left, vec!["xbc"]);
        assert!(engine.view().selection.is_empty());
    }

    #[test]
    fn duplicate_selection_copies_nodes_and_inner_links() {
        let mut engine = engine_with(&[("ua", 0.0, 0.0), ("ub", 200.0, 0.0)]);
        engine.apply_mutation(GraphMutation::AddConnector {
            connector: Connector::new(
                ConnectorId::intern("uab"),
                NodeId::intern("ua"),
                Anchor::Right,
                NodeId::intern("ub"),
                Anchor::Left,
            ),
        });
        engine.select_all();
        let copies = engine.duplicate_selection();

        assert_eq!(copies.len(), 2);
        assert_eq!(engine.graph().node_count(), 4);
        assert_eq!(engine.graph().connector_count(), 2);
        assert!(engine.graph().connection_exists(copies[0], copies[1]));
        let first = engine.graph().find_node(copies[0]).unwrap();
        assert_eq!(first.position, Point::new(20.0, 20.0));
        assert!(first.selected);
        assert!(!engine.graph().find_node(NodeId::intern("ua")).unwrap().selected);
    }

    #[test]
    fn drop_template_accepts_copy_only() {
        let mut engine = CanvasEngine::new();
        let palette = default_palette();
        let template = find_template(&palette, "rhombus").unwrap();

        assert_eq!(
            engine.drop_template(template, Point::new(10.0, 10.0), DropEffect::Move),
            None
        );
        let id = engine
            .drop_template(template, Point::new(33.0, 47.0), DropEffect::Copy)
            .unwrap();
        let node = engine.graph().find_node(id).unwrap();
        assert_eq!(node.position, Point::new(40.0, 40.0));
        assert_eq!(node.shape, ShapeKind::Rhombus);
        assert!(engine.view().selection.is_selected(SelectionTarget::Node(id)));
    }

    #[test]
    fn bad_document_leaves_canvas_untouched() {
        let mut engine = engine_with(&[("keep", 0.0, 0.0)]);
        let mut doc = engine.to_document();
        doc.diagram.connectors.push(fc_core::document::ConnectorRecord {
            id: "broken".into(),
            start_node_id: "keep".into(),
            end_node_id: "missing".into(),
            label: None,
            start_anchor: Anchor::Right,
            end_anchor: Anchor::Left,
            line_style: LineStyle::Solid,
            line_width: 2.0,
            start_arrow_type: ArrowKind::None,
            end_arrow_type: ArrowKind::Arrow,
            line_color: "#333333".into(),
        });
        doc.diagram.nodes.clear();

        assert!(engine.load_document(&doc).is_err());
        assert_eq!(engine.graph().node_ids(), &[NodeId::intern("keep")]);
        assert!(engine.load_json("{ not json").is_err());
        assert_eq!(engine.graph().node_count(), 1);
    }

    #[test]
    fn new_document_resets_canvas() {
        let mut engine = engine_with(&[("na", 0.0, 0.0)]);
        engine.set_zoom(2.0);
        engine.new_document();
        assert!(engine.graph().is_empty());
        assert_eq!(engine.view().zoom(), 1.0);
    }
}
