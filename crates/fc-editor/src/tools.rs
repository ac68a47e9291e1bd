//! Tool system for canvas interactions.
//!
//! Each tool translates input events into `GraphMutation` commands that the
//! `CanvasEngine` applies. Tools read the model through a [`ToolContext`] and
//! never mutate it directly.
//!
//! ## Gestures
//!
//! | Press on | Tool | Move | Release |
//! |----------|------|------|---------|
//! | Node body | [`DragTool`] | `MoveNode` by the pointer delta | `SetPosition` to the grid when snapping |
//! | Anchor handle | [`ConnectTool`](crate::connect::ConnectTool) | Guide line follows / snaps to handles | `AddConnector` or discard |

use crate::engine::GraphMutation;
use crate::hit::Hit;
use crate::input::InputEvent;
use fc_core::geometry::snap_to_grid;
use fc_core::{CanvasConfig, DiagramGraph, NodeId, Point, SelectionTarget, ViewState};
use smallvec::SmallVec;

/// Which tool owns a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Drag,
    Connect,
}

/// Read-only view of the model handed to a tool with each event.
pub struct ToolContext<'a> {
    pub graph: &'a DiagramGraph,
    pub view: &'a ViewState,
    pub config: &'a CanvasConfig,
    /// What lies under the event position.
    pub hit: Hit,
}

/// Trait for tools that handle input and produce mutations.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more mutations.
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<GraphMutation>;

    /// Whether a gesture is in progress.
    fn is_active(&self) -> bool;

    /// Drop any gesture state without producing mutations.
    fn reset(&mut self);
}

// ─── Drag Tool ───────────────────────────────────────────────────────────

/// Moves nodes with the pointer.
///
/// Movement is live and unsnapped while dragging. On release (or cancel) every
/// moved node is snapped to the grid if snapping is enabled.
#[derive(Debug, Default)]
pub struct DragTool {
    /// The node under the pointer at press time.
    grabbed: Option<NodeId>,
    /// Every node that follows the pointer.
    moving: SmallVec<[NodeId; 4]>,
    last: Point,
}

impl DragTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grabbed(&self) -> Option<NodeId> {
        self.grabbed
    }

    pub fn moving(&self) -> &[NodeId] {
        &self.moving
    }

    fn start(&mut self, id: NodeId, at: Point, ctx: &ToolContext<'_>) {
        self.grabbed = Some(id);
        self.last = at;
        self.moving.clear();
        if ctx.view.selection.is_selected(SelectionTarget::Node(id)) {
            self.moving.extend(ctx.view.selection.nodes());
        } else {
            self.moving.push(id);
        }
        log::debug!("drag start {id} ({} node(s))", self.moving.len());
    }

    fn step(&mut self, to: Point) -> Vec<GraphMutation> {
        let delta = to - self.last;
        self.last = to;
        if delta.x == 0.0 && delta.y == 0.0 {
            return vec![];
        }
        self.moving
            .iter()
            .map(|&id| GraphMutation::MoveNode {
                id,
                dx: delta.x,
                dy: delta.y,
            })
            .collect()
    }

    /// End the gesture. `to` is the release position, `None` for a cancel.
    fn finish(&mut self, to: Option<Point>, ctx: &ToolContext<'_>) -> Vec<GraphMutation> {
        let delta = to.map_or(fc_core::Vec2::ZERO, |p| p - self.last);
        let mut mutations = match to {
            Some(p) => self.step(p),
            None => vec![],
        };

        if ctx.view.snap_to_grid {
            for &id in &self.moving {
                let Some(node) = ctx.graph.find_node(id) else {
                    continue;
                };
                let raw = node.position + delta;
                let snapped = snap_to_grid(raw, ctx.view.grid_size());
                if snapped != raw {
                    mutations.push(GraphMutation::SetPosition {
                        id,
                        position: snapped,
                    });
                }
            }
        }

        if let Some(id) = self.grabbed.take() {
            log::debug!("drag end {id}");
        }
        self.moving.clear();
        mutations
    }
}

impl Tool for DragTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Drag
    }

    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext<'_>) -> Vec<GraphMutation> {
        let pos = event.position();
        match event {
            InputEvent::PointerDown { .. } => {
                if let Some(id) = ctx.hit.node {
                    self.start(id, pos, ctx);
                }
                vec![]
            }
            InputEvent::PointerMove { .. } if self.is_active() => self.step(pos),
            InputEvent::PointerUp { .. } if self.is_active() => self.finish(Some(pos), ctx),
            InputEvent::PointerCancel { .. } if self.is_active() => self.finish(None, ctx),
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.grabbed.is_some()
    }

    fn reset(&mut self) {
        self.grabbed = None;
        self.moving.clear();
    }
}
