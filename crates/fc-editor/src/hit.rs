//! Hit testing: point → node, anchor handle, or connector.
//!
//! Walks nodes front-to-back (last painted = topmost).

use fc_core::geometry::{anchor_point, contains_point, distance_to_segment, handle_rect};
use fc_core::{Anchor, ConnectorId, DiagramGraph, NodeId, Point};

/// An anchor handle under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit {
    pub node: NodeId,
    pub anchor: Anchor,
}

/// Everything under one pointer position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hit {
    pub node: Option<NodeId>,
    pub anchor: Option<AnchorHit>,
    pub connector: Option<ConnectorId>,
}

/// Topmost node whose bounds contain `point`.
pub fn node_at(graph: &DiagramGraph, point: Point) -> Option<NodeId> {
    graph.find_node_at(point)
}

/// Topmost anchor handle whose square of side `handle_size` contains `point`.
///
/// A handle counts only where no node in front of its owner covers `point`,
/// so a node's body hides the handles of the nodes behind it. Handles of
/// `exclude` are skipped (used while drawing from that node).
pub fn anchor_at(
    graph: &DiagramGraph,
    point: Point,
    handle_size: f64,
    exclude: Option<NodeId>,
) -> Option<AnchorHit> {
    let order = graph.node_ids();
    for (i, &id) in order.iter().enumerate().rev() {
        if Some(id) == exclude {
            continue;
        }
        let Some(node) = graph.find_node(id) else {
            continue;
        };
        let Some(anchor) = Anchor::HANDLES
            .into_iter()
            .find(|&a| handle_rect(anchor_point(node, a), handle_size).contains(point))
        else {
            continue;
        };
        if covered(graph, &order[i + 1..], point) {
            continue;
        }
        return Some(AnchorHit { node: id, anchor });
    }
    None
}

/// Whether any of `front` contains `point`.
fn covered(graph: &DiagramGraph, front: &[NodeId], point: Point) -> bool {
    front
        .iter()
        .filter_map(|id| graph.find_node(*id))
        .any(|n| contains_point(n, point))
}

/// Topmost connector whose straight anchor-to-anchor segment passes within
/// `tolerance` of `point`.
pub fn connector_at(graph: &DiagramGraph, point: Point, tolerance: f64) -> Option<ConnectorId> {
    let mut connectors: Vec<_> = graph.connectors().collect();
    connectors.reverse();
    connectors.into_iter().find_map(|c| {
        let a = graph.find_node(c.start_node)?;
        let b = graph.find_node(c.end_node)?;
        let d = distance_to_segment(
            point,
            anchor_point(a, c.start_anchor),
            anchor_point(b, c.end_anchor),
        );
        (d <= tolerance).then_some(c.id)
    })
}

/// Resolve everything under `point`.
pub fn hit_test(graph: &DiagramGraph, point: Point, handle_size: f64) -> Hit {
    Hit {
        node: node_at(graph, point),
        anchor: anchor_at(graph, point, handle_size, None),
        connector: connector_at(graph, point, handle_size / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{Connector, Node, ShapeKind, Size};

    fn graph() -> DiagramGraph {
        let mut g = DiagramGraph::new();
        g.add_node(Node::new(
            NodeId::intern("ha"),
            ShapeKind::Rectangle,
            Point::new(0.0, 0.0),
            Size::new(100.0, 50.0),
        ));
        g.add_node(Node::new(
            NodeId::intern("hb"),
            ShapeKind::Rectangle,
            Point::new(300.0, 0.0),
            Size::new(100.0, 50.0),
        ));
        g.add_connector(Connector::new(
            ConnectorId::intern("hab"),
            NodeId::intern("ha"),
            Anchor::Right,
            NodeId::intern("hb"),
            Anchor::Left,
        ));
        g
    }

    #[test]
    fn anchor_handles_are_hit_around_their_point() {
        let g = graph();
        assert_eq!(
            anchor_at(&g, Point::new(102.0, 23.0), 10.0, None),
            Some(AnchorHit {
                node: NodeId::intern("ha"),
                anchor: Anchor::Right
            })
        );
        assert_eq!(anchor_at(&g, Point::new(50.0, 25.0), 10.0, None), None);
        assert_eq!(
            anchor_at(&g, Point::new(102.0, 23.0), 10.0, Some(NodeId::intern("ha"))),
            None
        );
    }

    #[test]
    fn front_node_hides_handles_behind_it() {
        let mut g = DiagramGraph::new();
        for (id, x) in [("hback", 0.0), ("hfront", 50.0)] {
            g.add_node(Node::new(
                NodeId::intern(id),
                ShapeKind::Rectangle,
                Point::new(x, 0.0),
                Size::new(100.0, 50.0),
            ));
        }
        // "hback"'s right handle at (100, 25) lies under "hfront".
        assert_eq!(anchor_at(&g, Point::new(100.0, 25.0), 10.0, None), None);
        // The front node's own handle still wins where it overlaps "hback".
        assert_eq!(
            anchor_at(&g, Point::new(50.0, 25.0), 10.0, None),
            Some(AnchorHit {
                node: NodeId::intern("hfront"),
                anchor: Anchor::Left
            })
        );
        // Outside the front node the back handle is reachable again.
        assert_eq!(
            anchor_at(&g, Point::new(48.0, 52.0), 10.0, None).map(|h| h.node),
            Some(NodeId::intern("hback"))
        );
    }

    #[test]
    fn connector_hit_uses_segment_distance() {
        let g = graph();
        assert_eq!(
            connector_at(&g, Point::new(200.0, 27.0), 5.0),
            Some(ConnectorId::intern("hab"))
        );
        assert_eq!(connector_at(&g, Point::new(200.0, 40.0), 5.0), None);
    }

    #[test]
    fn hit_test_combines_layers() {
        let g = graph();
        let hit = hit_test(&g, Point::new(50.0, 0.0), 10.0);
        assert_eq!(hit.node, Some(NodeId::intern("ha")));
        assert_eq!(hit.anchor.map(|a| a.anchor), Some(Anchor::Top));
        assert_eq!(hit_test(&g, Point::new(200.0, 200.0), 10.0), Hit::default());
    }
}
