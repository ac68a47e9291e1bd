//! Generator: DiagramGraph → flowchart diagram text.
//!
//! One-directional; the text is never parsed back. Output order is fixed
//! (header, node declarations, connector lines, style lines, each in stored
//! order), so an unchanged graph always yields byte-identical text.

use crate::config::Direction;
use crate::graph::DiagramGraph;
use crate::id::NodeId;
use crate::model::*;
use crate::palette::expand_pattern;
use std::collections::{HashMap, HashSet};
use std::fmt::Write;

/// Generate flowchart text for `graph`.
#[must_use]
pub fn generate(graph: &DiagramGraph, direction: Direction) -> String {
    let mut out = String::with_capacity(256);
    let _ = writeln!(out, "flowchart {}", direction.as_str());

    let ids = DiagramIds::assign(graph);

    for node in graph.nodes() {
        let id = ids.get(node.id);
        let _ = writeln!(
            out,
            "    {}",
            expand_pattern(node.shape.pattern(), id, &escape_text(&node.text))
        );
    }

    for c in graph.connectors() {
        let (link, reversed) = link_token(c);
        let (from, to) = if reversed {
            (ids.get(c.end_node), ids.get(c.start_node))
        } else {
            (ids.get(c.start_node), ids.get(c.end_node))
        };
        match c.label.as_deref() {
            Some(label) if !label.is_empty() => {
                let _ = writeln!(out, "    {from} {link}|{}| {to}", escape_text(label));
            }
            _ => {
                let _ = writeln!(out, "    {from} {link} {to}");
            }
        }
    }

    // ─── Styles ───
    let default_style = NodeStyle::default();
    for node in graph.nodes() {
        let s = &node.style;
        if s.fill_color != default_style.fill_color
            || s.stroke_color != default_style.stroke_color
            || s.stroke_width != default_style.stroke_width
        {
            let _ = writeln!(
                out,
                "    style {} fill:{},stroke:{},stroke-width:{}px",
                ids.get(node.id),
                s.fill_color.to_hex(),
                s.stroke_color.to_hex(),
                format_num(s.stroke_width)
            );
        }
    }

    let default_color = default_line_color();
    for (i, c) in graph.connectors().enumerate() {
        if c.line_color != default_color || c.line_width != DEFAULT_LINE_WIDTH {
            let _ = writeln!(
                out,
                "    linkStyle {i} stroke:{},stroke-width:{}px",
                c.line_color.to_hex(),
                format_num(c.line_width)
            );
        }
    }

    out
}

// ─── Links ────────────────────────────────────────────────────────────────

/// Link syntax for a connector: body from the line style, heads from the arrows.
///
/// A link may not carry a head at its start only, so a connector with just a
/// start arrowhead is written reversed. The flag reports that the endpoints
/// must be swapped.
fn link_token(c: &Connector) -> (String, bool) {
    // (body used before a head, body without a head)
    let (body, bare) = match c.line_style {
        LineStyle::Solid => ("--", "---"),
        LineStyle::Dashed => ("-.-", "-.-"),
        LineStyle::Dotted => ("-..-", "-..-"),
        LineStyle::Thick => ("==", "==="),
    };
    let reversed = c.end_arrow == ArrowKind::None && c.start_arrow != ArrowKind::None;
    let (start_arrow, end_arrow) = if reversed {
        (ArrowKind::None, c.start_arrow)
    } else {
        (c.start_arrow, c.end_arrow)
    };
    let start = match start_arrow {
        ArrowKind::None => "",
        ArrowKind::Arrow | ArrowKind::Open | ArrowKind::Diamond => "<",
        ArrowKind::Circle => "o",
        ArrowKind::Cross => "x",
    };
    let end = match end_arrow {
        ArrowKind::None => return (bare.to_owned(), reversed),
        ArrowKind::Arrow | ArrowKind::Open | ArrowKind::Diamond => ">",
        ArrowKind::Circle => "o",
        ArrowKind::Cross => "x",
    };
    (format!("{start}{body}{end}"), reversed)
}

// ─── Identifiers ──────────────────────────────────────────────────────────

/// Node IDs rewritten into the identifier alphabet, kept distinct.
struct DiagramIds {
    map: HashMap<NodeId, String>,
}

impl DiagramIds {
    fn assign(graph: &DiagramGraph) -> Self {
        let mut map = HashMap::with_capacity(graph.node_count());
        let mut used = HashSet::new();
        for node in graph.nodes() {
            let base = sanitize_id(node.id.as_str());
            let mut candidate = base.clone();
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{base}_{n}");
                n += 1;
            }
            map.insert(node.id, candidate);
        }
        Self { map }
    }

    fn get(&self, id: NodeId) -> &str {
        self.map.get(&id).map_or_else(|| id.as_str(), String::as_str)
    }
}

fn sanitize_id(raw: &str) -> String {
    let mut id: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if id.is_empty() {
        id.push('_');
    }
    // `end` closes a subgraph.
    if id.eq_ignore_ascii_case("end") {
        id.push('_');
    }
    id
}

// ─── Text ─────────────────────────────────────────────────────────────────

const SYNTAX_CHARS: &[char] = &[
    '[', ']', '(', ')', '{', '}', '<', '>', '|', '"', '#', ';', '/', '\\', ':', '&', '%', '\n',
];

/// Text as it goes between a shape's delimiters.
///
/// Plain text is emitted as-is. Text containing syntax characters is quoted,
/// with `"` written as `#quot;` and line breaks as `<br/>`.
fn escape_text(text: &str) -> String {
    if text.is_empty() {
        return "\" \"".into();
    }
    if !text.contains(SYNTAX_CHARS) && text.trim() == text {
        return text.into();
    }
    let body = text
        .replace('\r', "")
        .replace('"', "#quot;")
        .replace('\n', "<br/>");
    format!("\"{body}\"")
}

fn format_num(n: f64) -> String {
    if n == n.floor() {
        format!("{}", n as i64)
    } else {
        format!("{n:.2}")
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ConnectorId;
    use kurbo::{Point, Size};
    use pretty_assertions::assert_eq;

    fn add(g: &mut DiagramGraph, id: &str, shape: ShapeKind, text: &str) {
        g.add_node(
            Node::new(NodeId::intern(id), shape, Point::ORIGIN, Size::new(100.0, 50.0))
                .with_text(text),
        );
    }

    fn connect(g: &mut DiagramGraph, id: &str, a: &str, b: &str) -> ConnectorId {
        g.add_connector(Connector::new(
            ConnectorId::intern(id),
            NodeId::intern(a),
            Anchor::Bottom,
            NodeId::intern(b),
            Anchor::Top,
        ))
        .added()
        .unwrap()
    }

    #[test]
    fn generates_declarations_then_links() {
        let mut g = DiagramGraph::new();
        add(&mut g, "start", ShapeKind::Stadium, "Start");
        add(&mut g, "check", ShapeKind::Rhombus, "Ready?");
        add(&mut g, "done", ShapeKind::Rectangle, "Done");
        connect(&mut g, "m1", "start", "check");
        let yes = connect(&mut g, "m2", "check", "done");
        g.set_connector_label(yes, Some("yes".into()));

        let expected = "\
flowchart TD
    start([Start])
    check{Ready?}
    done[Done]
    start --> check
    check -->|yes| done
";
        assert_eq!(generate(&g, Direction::TopDown), expected);
    }

    #[test]
    fn generation_is_idempotent() {
        let mut g = DiagramGraph::new();
        add(&mut g, "ia", ShapeKind::Hexagon, "A");
        add(&mut g, "ib", ShapeKind::Cylinder, "B");
        connect(&mut g, "iab", "ia", "ib");
        assert_eq!(
            generate(&g, Direction::LeftRight),
            generate(&g, Direction::LeftRight)
        );
    }

    #[test]
    fn link_tokens_follow_style_and_arrows() {
        let mut c = Connector::new(
            ConnectorId::intern("lt"),
            NodeId::intern("x"),
            Anchor::Right,
            NodeId::intern("y"),
            Anchor::Left,
        );
        let token = |c: &Connector| link_token(c).0;
        assert_eq!(token(&c), "-->");
        c.end_arrow = ArrowKind::None;
        assert_eq!(token(&c), "---");
        c.line_style = LineStyle::Thick;
        assert_eq!(token(&c), "===");
        c.end_arrow = ArrowKind::Circle;
        assert_eq!(token(&c), "==o");
        c.line_style = LineStyle::Dashed;
        c.end_arrow = ArrowKind::Arrow;
        c.start_arrow = ArrowKind::Arrow;
        assert_eq!(token(&c), "<-.->");
        c.line_style = LineStyle::Dotted;
        c.start_arrow = ArrowKind::Cross;
        c.end_arrow = ArrowKind::Cross;
        assert_eq!(token(&c), "x-..-x");
    }

    #[test]
    fn start_only_arrowhead_is_written_reversed() {
        let mut g = DiagramGraph::new();
        add(&mut g, "ra", ShapeKind::Rectangle, "A");
        add(&mut g, "rb", ShapeKind::Rectangle, "B");
        add(&mut g, "rc", ShapeKind::Rectangle, "C");
        let plain = connect(&mut g, "rab", "ra", "rb");
        g.set_connector_arrows(plain, ArrowKind::Arrow, ArrowKind::None);
        let thick = connect(&mut g, "rbc", "rb", "rc");
        g.set_connector_arrows(thick, ArrowKind::Circle, ArrowKind::None);
        g.set_connector_line_style(thick, LineStyle::Thick);
        g.set_connector_label(thick, Some("back".into()));

        let text = generate(&g, Direction::TopDown);
        assert!(text.contains("    rb --> ra\n"), "{text}");
        assert!(text.contains("    rc ==o|back| rb\n"), "{text}");
        assert!(!text.contains("<-"));
        assert!(!text.contains("<="));
    }

    #[test]
    fn text_with_syntax_characters_is_quoted() {
        assert_eq!(escape_text("plain words"), "plain words");
        assert_eq!(escape_text(""), "\" \"");
        assert_eq!(escape_text("a (b)"), "\"a (b)\"");
        assert_eq!(escape_text("say \"hi\""), "\"say #quot;hi#quot;\"");
        assert_eq!(escape_text("two\nlines"), "\"two<br/>lines\"");
    }

    #[test]
    fn ids_are_sanitized_and_kept_distinct() {
        let mut g = DiagramGraph::new();
        add(&mut g, "a-b", ShapeKind::Rectangle, "one");
        add(&mut g, "a_b", ShapeKind::Rectangle, "two");
        add(&mut g, "end", ShapeKind::Rectangle, "three");
        connect(&mut g, "sx", "a-b", "end");

        let text = generate(&g, Direction::TopDown);
        assert!(text.contains("    a_b[one]\n"));
        assert!(text.contains("    a_b_2[two]\n"));
        assert!(text.contains("    end_[three]\n"));
        assert!(text.contains("    a_b --> end_\n"));
    }

    #[test]
    fn non_default_styles_emit_style_lines() {
        let mut g = DiagramGraph::new();
        add(&mut g, "sa", ShapeKind::Rectangle, "A");
        add(&mut g, "sb", ShapeKind::Rectangle, "B");
        let c = connect(&mut g, "sab", "sa", "sb");
        let mut style = NodeStyle::default();
        style.fill_color = Color::rgb8(0xFF, 0, 0);
        style.stroke_width = 2.5;
        g.set_node_style(NodeId::intern("sa"), style);
        g.set_connector_stroke(c, Color::rgb8(0, 0, 0xFF), 3.0);

        let text = generate(&g, Direction::TopDown);
        assert!(text.contains("    style sa fill:#FF0000,stroke:#9370DB,stroke-width:2.5px\n"));
        assert!(!text.contains("style sb"));
        assert!(text.contains("    linkStyle 0 stroke:#0000FF,stroke-width:3px\n"));
    }
}
