//! Anchor geometry, containment, angle classification, and grid snapping.
//!
//! Pure functions over canvas coordinates. The y axis grows downward.

use crate::model::{Anchor, Node};
use kurbo::{Point, Rect, Size};

/// Canvas position of `anchor` on `node`'s bounding box.
pub fn anchor_point(node: &Node, anchor: Anchor) -> Point {
    let Point { x, y } = node.position;
    let Size { width: w, height: h } = node.size;
    match anchor {
        Anchor::Top => Point::new(x + w / 2.0, y),
        Anchor::Right => Point::new(x + w, y + h / 2.0),
        Anchor::Bottom => Point::new(x + w / 2.0, y + h),
        Anchor::Left => Point::new(x, y + h / 2.0),
        Anchor::Center => Point::new(x + w / 2.0, y + h / 2.0),
    }
}

/// Axis-aligned bounding box of a node.
pub fn node_bounds(node: &Node) -> Rect {
    Rect::from_origin_size(node.position, node.size)
}

/// Inclusive bounding-box test: points on the border count as inside.
pub fn contains_point(node: &Node, point: Point) -> bool {
    let b = node_bounds(node);
    point.x >= b.x0 && point.x <= b.x1 && point.y >= b.y0 && point.y <= b.y1
}

/// Pick the edge of a box facing `point`, as seen from the box `center`.
///
/// Angles are `atan2(dy, dx)` in degrees: `[-45, 45)` → right,
/// `[45, 135)` → bottom, `[-135, -45)` → top, anything else → left.
pub fn classify_edge_by_angle(center: Point, point: Point) -> Anchor {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    // Exact comparisons instead of atan2 so the diagonals land deterministically.
    if (dx == 0.0 && dy == 0.0) || (dx > 0.0 && dy >= -dx && dy < dx) {
        Anchor::Right
    } else if dy > 0.0 && dx <= dy && dx > -dy {
        Anchor::Bottom
    } else if dy < 0.0 && dx >= dy && dx < -dy {
        Anchor::Top
    } else {
        Anchor::Left
    }
}

/// Round each axis to the nearest multiple of `grid_size`.
///
/// A non-positive grid size leaves the point untouched.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 || !grid_size.is_finite() {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Square hit target of side `size` centred on `center`.
pub fn handle_rect(center: Point, size: f64) -> Rect {
    Rect::from_center_size(center, Size::new(size, size))
}

/// Shortest distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::model::ShapeKind;

    fn node(x: f64, y: f64, w: f64, h: f64) -> Node {
        Node::new(
            NodeId::intern("geo"),
            ShapeKind::Rectangle,
            Point::new(x, y),
            Size::new(w, h),
        )
    }

    fn at_angle(deg: f64) -> Point {
        let r = deg.to_radians();
        Point::new(100.0 * r.cos(), 100.0 * r.sin())
    }

    #[test]
    fn anchor_points_sit_on_the_box() {
        let n = node(10.0, 20.0, 120.0, 60.0);
        assert_eq!(anchor_point(&n, Anchor::Top), Point::new(70.0, 20.0));
        assert_eq!(anchor_point(&n, Anchor::Right), Point::new(130.0, 50.0));
        assert_eq!(anchor_point(&n, Anchor::Bottom), Point::new(70.0, 80.0));
        assert_eq!(anchor_point(&n, Anchor::Left), Point::new(10.0, 50.0));
        assert_eq!(anchor_point(&n, Anchor::Center), node_bounds(&n).center());
    }

    #[test]
    fn anchor_edges_match_box_sides() {
        for (x, y, w, h) in [(0.0, 0.0, 1.0, 1.0), (-40.0, 15.5, 80.0, 33.0)] {
            let n = node(x, y, w, h);
            assert_eq!(anchor_point(&n, Anchor::Top).y, y);
            assert_eq!(anchor_point(&n, Anchor::Bottom).y, y + h);
            assert_eq!(anchor_point(&n, Anchor::Left).x, x);
            assert_eq!(anchor_point(&n, Anchor::Right).x, x + w);
        }
    }

    #[test]
    fn containment_is_inclusive() {
        let n = node(0.0, 0.0, 100.0, 50.0);
        assert!(contains_point(&n, Point::new(0.0, 0.0)));
        assert!(contains_point(&n, Point::new(100.0, 50.0)));
        assert!(contains_point(&n, Point::new(50.0, 25.0)));
        assert!(!contains_point(&n, Point::new(100.1, 25.0)));
        assert!(!contains_point(&n, Point::new(50.0, -0.1)));
    }

    #[test]
    fn classify_quadrants() {
        let c = Point::ORIGIN;
        assert_eq!(classify_edge_by_angle(c, Point::new(10.0, 0.0)), Anchor::Right);
        assert_eq!(classify_edge_by_angle(c, Point::new(0.0, 10.0)), Anchor::Bottom);
        assert_eq!(classify_edge_by_angle(c, Point::new(-10.0, 0.0)), Anchor::Left);
        assert_eq!(classify_edge_by_angle(c, Point::new(0.0, -10.0)), Anchor::Top);
    }

    #[test]
    fn classify_boundaries_are_pinned() {
        let c = Point::ORIGIN;
        // Exact diagonals: each lower bound belongs to the half-open range.
        assert_eq!(classify_edge_by_angle(c, Point::new(10.0, -10.0)), Anchor::Right); // -45
        assert_eq!(classify_edge_by_angle(c, Point::new(10.0, 10.0)), Anchor::Bottom); // 45
        assert_eq!(classify_edge_by_angle(c, Point::new(-10.0, 10.0)), Anchor::Left); // 135
        assert_eq!(classify_edge_by_angle(c, Point::new(-10.0, -10.0)), Anchor::Top); // -135
        // Just inside the neighbouring ranges.
        assert_eq!(classify_edge_by_angle(c, at_angle(-45.5)), Anchor::Top);
        assert_eq!(classify_edge_by_angle(c, at_angle(44.5)), Anchor::Right);
        assert_eq!(classify_edge_by_angle(c, at_angle(134.5)), Anchor::Bottom);
        assert_eq!(classify_edge_by_angle(c, at_angle(-134.5)), Anchor::Top);
        assert_eq!(classify_edge_by_angle(c, at_angle(-135.5)), Anchor::Left);
    }

    #[test]
    fn classify_degenerate_vector_is_right() {
        let c = Point::new(5.0, 5.0);
        assert_eq!(classify_edge_by_angle(c, c), Anchor::Right);
    }

    #[test]
    fn snap_rounds_to_nearest_multiple() {
        assert_eq!(snap_to_grid(Point::new(29.0, 31.0), 20.0), Point::new(20.0, 40.0));
        assert_eq!(snap_to_grid(Point::new(-9.0, -11.0), 20.0), Point::new(0.0, -20.0));
        assert_eq!(snap_to_grid(Point::new(40.0, 60.0), 20.0), Point::new(40.0, 60.0));
        assert_eq!(snap_to_grid(Point::new(3.0, 4.0), 0.0), Point::new(3.0, 4.0));
    }

    #[test]
    fn segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!((distance_to_segment(Point::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-9);
        assert!((distance_to_segment(Point::new(-4.0, 3.0), a, b) - 5.0).abs() < 1e-9);
        assert!((distance_to_segment(Point::new(2.0, 2.0), a, a) - 8.0_f64.sqrt()).abs() < 1e-9);
    }
}
