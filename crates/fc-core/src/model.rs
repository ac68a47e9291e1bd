//! Diagram entities: nodes (visual shapes), connectors, and their styling.
//!
//! Entities are plain data. They are owned by [`DiagramGraph`](crate::graph::DiagramGraph),
//! which is the only place that mutates them and emits change records.
//! Connectors refer to nodes by ID, never by reference.

use crate::id::{ConnectorId, NodeId};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color from 8-bit channels.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            1.0,
        )
    }

    /// Parse a hex color string: `#RGB`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let byte = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgb8(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb8(byte(0)?, byte(2)?, byte(4)?)),
            8 => {
                let mut c = Self::rgb8(byte(0)?, byte(2)?, byte(4)?);
                c.a = byte(6)? as f32 / 255.0;
                Some(c)
            }
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

// ─── Enumerations ────────────────────────────────────────────────────────

/// The outline a node is drawn with. Mirrors the flowchart node shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    #[default]
    Rectangle,
    Rounded,
    Stadium,
    Subroutine,
    Cylinder,
    Circle,
    DoubleCircle,
    Asymmetric,
    Rhombus,
    Hexagon,
    Parallelogram,
    ParallelogramAlt,
    Trapezoid,
    TrapezoidAlt,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 14] = [
        ShapeKind::Rectangle,
        ShapeKind::Rounded,
        ShapeKind::Stadium,
        ShapeKind::Subroutine,
        ShapeKind::Cylinder,
        ShapeKind::Circle,
        ShapeKind::DoubleCircle,
        ShapeKind::Asymmetric,
        ShapeKind::Rhombus,
        ShapeKind::Hexagon,
        ShapeKind::Parallelogram,
        ShapeKind::ParallelogramAlt,
        ShapeKind::Trapezoid,
        ShapeKind::TrapezoidAlt,
    ];

    /// Declaration pattern for generated diagram text.
    /// `{id}` and `{text}` are substituted by the generator. This is the only
    /// source of node declarations; palette templates carry a copy.
    pub fn pattern(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "{id}[{text}]",
            ShapeKind::Rounded => "{id}({text})",
            ShapeKind::Stadium => "{id}([{text}])",
            ShapeKind::Subroutine => "{id}[[{text}]]",
            ShapeKind::Cylinder => "{id}[({text})]",
            ShapeKind::Circle => "{id}(({text}))",
            ShapeKind::DoubleCircle => "{id}((({text})))",
            ShapeKind::Asymmetric => "{id}>{text}]",
            ShapeKind::Rhombus => "{id}{{text}}",
            ShapeKind::Hexagon => "{id}{{{text}}}",
            ShapeKind::Parallelogram => "{id}[/{text}/]",
            ShapeKind::ParallelogramAlt => "{id}[\\{text}\\]",
            ShapeKind::Trapezoid => "{id}[/{text}\\]",
            ShapeKind::TrapezoidAlt => "{id}[\\{text}/]",
        }
    }
}

/// A named attachment point on a node's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
    #[default]
    Center,
}

impl Anchor {
    /// The four anchors that have a visible handle.
    pub const HANDLES: [Anchor; 4] = [Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left];

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Right => "right",
            Anchor::Bottom => "bottom",
            Anchor::Left => "left",
            Anchor::Center => "center",
        }
    }
}

/// How a connector's line is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Thick,
}

/// Arrowhead drawn at one end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowKind {
    #[default]
    None,
    Arrow,
    Open,
    Diamond,
    Circle,
    Cross,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Visual attributes of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub font_family: String,
    pub font_size: f64,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill_color: Color::rgb8(0xEC, 0xEC, 0xFF),
            stroke_color: Color::rgb8(0x93, 0x70, 0xDB),
            stroke_width: 1.0,
            font_family: "Trebuchet MS".into(),
            font_size: 14.0,
        }
    }
}

/// A visual shape on the canvas. `position` is the top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub size: Size,
    pub text: String,
    pub shape: ShapeKind,
    pub selected: bool,
    pub style: NodeStyle,
}

impl Node {
    pub fn new(id: NodeId, shape: ShapeKind, position: Point, size: Size) -> Self {
        Self {
            id,
            position,
            size,
            text: String::new(),
            shape,
            selected: false,
            style: NodeStyle::default(),
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

// ─── Connectors ──────────────────────────────────────────────────────────

pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

pub fn default_line_color() -> Color {
    Color::rgb8(0x33, 0x33, 0x33)
}

/// A connection between two nodes, attached at named anchors.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    pub id: ConnectorId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub label: Option<String>,
    pub start_anchor: Anchor,
    pub end_anchor: Anchor,
    pub line_style: LineStyle,
    pub start_arrow: ArrowKind,
    pub end_arrow: ArrowKind,
    pub line_color: Color,
    pub line_width: f64,
    pub selected: bool,
}

impl Connector {
    /// A solid connector with an arrowhead at the end.
    pub fn new(
        id: ConnectorId,
        start_node: NodeId,
        start_anchor: Anchor,
        end_node: NodeId,
        end_anchor: Anchor,
    ) -> Self {
        Self {
            id,
            start_node,
            end_node,
            label: None,
            start_anchor,
            end_anchor,
            line_style: LineStyle::Solid,
            start_arrow: ArrowKind::None,
            end_arrow: ArrowKind::Arrow,
            line_color: default_line_color(),
            line_width: DEFAULT_LINE_WIDTH,
            selected: false,
        }
    }

    /// Whether this connector links `a` and `b`, in either direction.
    pub fn links(&self, a: NodeId, b: NodeId) -> bool {
        (self.start_node == a && self.end_node == b) || (self.start_node == b && self.end_node == a)
    }

    /// Whether either end of this connector is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.start_node == node || self.end_node == node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_roundtrip() {
        let c = Color::from_hex("#6C5CE7").unwrap();
        assert_eq!(c.to_hex(), "#6C5CE7");

        let c2 = Color::from_hex("#FF000080").unwrap();
        assert!((c2.a - 128.0 / 255.0).abs() < 0.01);
        assert_eq!(c2.to_hex().len(), 9);

        assert_eq!(Color::from_hex("fff").unwrap().to_hex(), "#FFFFFF");
        assert!(Color::from_hex("#12345").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
    }

    #[test]
    fn connector_links_is_unordered() {
        let a = NodeId::intern("a");
        let b = NodeId::intern("b");
        let c = Connector::new(
            ConnectorId::intern("ab"),
            a,
            Anchor::Right,
            b,
            Anchor::Left,
        );
        assert!(c.links(a, b));
        assert!(c.links(b, a));
        assert!(!c.links(a, NodeId::intern("z")));
        assert!(c.touches(b));
    }

    #[test]
    fn every_shape_pattern_has_both_placeholders() {
        for shape in ShapeKind::ALL {
            let p = shape.pattern();
            assert!(p.starts_with("{id}"), "{shape:?}");
            assert!(p.contains("{text}"), "{shape:?}");
        }
    }
}
