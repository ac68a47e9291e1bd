//! Connection drawing: anchor-to-anchor connector creation.
//!
//! ```text
//!            press on anchor handle
//!   Idle ─────────────────────────────▶ Drawing
//!    ▲                                    │ move: guide follows pointer,
//!    │                                    │       snaps to hovered handle
//!    └──────── release / cancel ──────────┘
//! ```
//!
//! Release resolves the target node from the hovered handle, or else from
//! the node under the release point. No target, the source itself, or an
//! already-linked pair discard the gesture. Every exit path returns to `Idle`.

use crate::engine::GraphMutation;
use crate::hit::{AnchorHit, anchor_at};
use crate::input::InputEvent;
use crate::tools::{Tool, ToolContext, ToolKind};
use fc_core::geometry::{anchor_point, classify_edge_by_angle, node_bounds};
use fc_core::{Anchor, Connector, ConnectorId, NodeId, Point};

/// Transient line from the source anchor to the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub from: Point,
    pub to: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawingConnection {
    pub source: NodeId,
    pub source_anchor: Anchor,
    pub guide: GuideLine,
    /// Handle of another node currently under the pointer.
    pub hovered: Option<AnchorHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ConnectState {
    #[default]
    Idle,
    Drawing(DrawingConnection),
}

/// How the last gesture ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Created(ConnectorId),
    /// The two nodes were already linked; nothing was added.
    Duplicate(ConnectorId),
    /// Released over empty canvas.
    NoTarget,
    /// Released over the source node.
    SameNode,
    Cancelled,
}

#[derive(Debug, Default)]
pub struct ConnectTool {
    state: ConnectState,
    last_outcome: Option<ConnectOutcome>,
}

impl ConnectTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConnectState {
        &self.state
    }

    pub fn drawing(&self) -> Option<&DrawingConnection> {
        match &self.state {
            ConnectState::Drawing(d) => Some(d),
            ConnectState::Idle => None,
        }
    }

    pub fn last_outcome(&self) -> Option<ConnectOutcome> {
        self.last_outcome
    }

    /// Abandon the gesture in progress, if any.
    pub fn cancel(&mut self) {
        if self.is_active() {
            self.state = ConnectState::Idle;
            self.last_outcome = Some(ConnectOutcome::Cancelled);
            log::debug!("connect cancelled");
        }
    }

    fn begin(&mut self, hit: AnchorHit, pos: Point, ctx: &ToolContext<'_>) {
        let Some(node) = ctx.graph.find_node(hit.node) else {
            return;
        };
        let from = anchor_point(node, hit.anchor);
        self.state = ConnectState::Drawing(DrawingConnection {
            source: hit.node,
            source_anchor: hit.anchor,
            guide: GuideLine { from, to: pos },
            hovered: None,
        });
        log::debug!("connect start {}:{}", hit.node, hit.anchor.as_str());
    }

    /// Update hover and guide end for a pointer at `pos`.
    fn track(drawing: &mut DrawingConnection, pos: Point, ctx: &ToolContext<'_>) {
        let hovered = anchor_at(ctx.graph, pos, ctx.config.handle_size, Some(drawing.source));
        if hovered != drawing.hovered {
            match (drawing.hovered, hovered) {
                (Some(old), _) => log::trace!("handle exit {}:{}", old.node, old.anchor.as_str()),
                (None, Some(new)) => {
                    log::trace!("handle enter {}:{}", new.node, new.anchor.as_str())
                }
                (None, None) => {}
            }
            drawing.hovered = hovered;
        }
        drawing.guide.to = hovered
            .and_then(|h| ctx.graph.find_node(h.node).map(|n| anchor_point(n, h.anchor)))
            .unwrap_or(pos);
    }

    fn release(&mut self, pos: Point, ctx: &ToolContext<'_>) -> Vec<GraphMutation> {
        let ConnectState::Drawing(mut drawing) = std::mem::take(&mut self.state) else {
            return vec![];
        };
        Self::track(&mut drawing, pos, ctx);

        let target = drawing
            .hovered
            .map(|h| h.node)
            .or_else(|| ctx.graph.find_node_at(pos));

        let (outcome, mutations) = match target {
            // The source was removed while the gesture was in flight.
            _ if !ctx.graph.contains_node(drawing.source) => {
                (ConnectOutcome::Cancelled, vec![])
            }
            None => (ConnectOutcome::NoTarget, vec![]),
            Some(t) if t == drawing.source => (ConnectOutcome::SameNode, vec![]),
            Some(t) => match ctx.graph.connector_between(drawing.source, t) {
                Some(existing) => (ConnectOutcome::Duplicate(existing), vec![]),
                None => {
                    let end_anchor = match drawing.hovered {
                        Some(h) if h.node == t => h.anchor,
                        _ => ctx
                            .graph
                            .find_node(t)
                            .map(|n| classify_edge_by_angle(node_bounds(n).center(), pos))
                            .unwrap_or_default(),
                    };
                    let connector = Connector::new(
                        ctx.graph.fresh_connector_id(),
                        drawing.source,
                        drawing.source_anchor,
                        t,
                        end_anchor,
                    );
                    (
                        ConnectOutcome::Created(connector.id),
                        vec![GraphMutation::AddConnector { connector }],
                    )
                }
            },
        };

        match outcome {
            ConnectOutcome::Created(id) => log::debug!("connect created {id}"),
            other => log::debug!("connect discarded: {other:?}"),
        }
        self.last_outcome = Some(outcome);
        mutations
    }
}

impl Tool for ConnectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Connect
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<GraphMutation> {
        let pos = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                if let (false, Some(hit)) = (self.is_active(), ctx.hit.anchor) {
                    self.begin(hit, pos, ctx);
                }
                vec![]
            }
            InputEvent::PointerMove { .. } => {
                if let ConnectState::Drawing(drawing) = &mut self.state {
                    Self::track(drawing, pos, ctx);
                }
                vec![]
            }
            InputEvent::PointerUp { .. } => self.release(pos, ctx),
            InputEvent::PointerCancel { .. } => {
                self.cancel();
                vec![]
            }
        }
    }

    fn is_active(&self) -> bool {
        matches!(self.state, ConnectState::Drawing(_))
    }

    fn reset(&mut self) {
        self.state = ConnectState::Idle;
    }
}
