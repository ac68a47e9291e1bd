//! Shape palette: the templates new nodes are created from.

use crate::id::NodeId;
use crate::model::{Node, ShapeKind};
use kurbo::{Point, Size};

/// An immutable palette entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTemplate {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub shape: ShapeKind,
    pub default_size: Size,
    pub default_text: String,
    pub icon: String,
    /// Declaration pattern with `{id}` and `{text}` placeholders, copied from
    /// [`ShapeKind::pattern`]. Nodes do not remember their template, so
    /// generated text always uses the shape kind; this copy only serves
    /// palette previews through [`ShapeTemplate::render`].
    pub pattern: String,
}

impl ShapeTemplate {
    pub fn new(
        id: &str,
        name: &str,
        category: &str,
        shape: ShapeKind,
        default_size: Size,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            shape,
            default_size,
            default_text: name.into(),
            icon: format!("shape-{id}"),
            pattern: shape.pattern().into(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    /// Instantiate a node with its top-left corner at `position`.
    ///
    /// The node gets a generated ID; the graph replaces it if it collides.
    pub fn create_node(&self, position: Point) -> Node {
        Node::new(NodeId::generate(), self.shape, position, self.default_size)
            .with_text(self.default_text.clone())
    }

    /// Preview declaration for a node made from this template.
    ///
    /// `{id}` is substituted first so text containing
    /// the literal `{id}` is left alone.
    pub fn render(&self, id: &str, text: &str) -> String {
        expand_pattern(&self.pattern, id, text)
    }
}

pub(crate) fn expand_pattern(pattern: &str, id: &str, text: &str) -> String {
    match pattern.split_once("{text}") {
        Some((head, tail)) => {
            format!("{}{text}{tail}", head.replace("{id}", id))
        }
        None => pattern.replace("{id}", id),
    }
}

/// The built-in flowchart palette.
pub fn default_palette() -> Vec<ShapeTemplate> {
    let process = Size::new(120.0, 60.0);
    let square = Size::new(80.0, 80.0);
    vec![
        ShapeTemplate::new("rectangle", "Process", "Basic", ShapeKind::Rectangle, process)
            .with_description("A processing step"),
        ShapeTemplate::new("rounded", "Rounded", "Basic", ShapeKind::Rounded, process)
            .with_description("An event or alternate step"),
        ShapeTemplate::new("stadium", "Terminal", "Basic", ShapeKind::Stadium, process)
            .with_description("Start or end of a flow"),
        ShapeTemplate::new("rhombus", "Decision", "Basic", ShapeKind::Rhombus, Size::new(100.0, 100.0))
            .with_description("A yes/no branch"),
        ShapeTemplate::new("circle", "Circle", "Basic", ShapeKind::Circle, square)
            .with_description("A connector point"),
        ShapeTemplate::new("subroutine", "Subroutine", "Process", ShapeKind::Subroutine, process)
            .with_description("A predefined process"),
        ShapeTemplate::new("cylinder", "Database", "Data", ShapeKind::Cylinder, Size::new(100.0, 70.0))
            .with_description("Stored data"),
        ShapeTemplate::new("doubleCircle", "Double circle", "Basic", ShapeKind::DoubleCircle, square)
            .with_description("A stop state"),
        ShapeTemplate::new("asymmetric", "Flag", "Process", ShapeKind::Asymmetric, process)
            .with_description("An asymmetric marker"),
        ShapeTemplate::new("hexagon", "Preparation", "Process", ShapeKind::Hexagon, process)
            .with_description("A setup step"),
        ShapeTemplate::new("parallelogram", "Input", "Data", ShapeKind::Parallelogram, process)
            .with_description("Input data"),
        ShapeTemplate::new("parallelogramAlt", "Output", "Data", ShapeKind::ParallelogramAlt, process)
            .with_description("Output data"),
        ShapeTemplate::new("trapezoid", "Manual operation", "Process", ShapeKind::Trapezoid, process)
            .with_description("A manual step"),
        ShapeTemplate::new("trapezoidAlt", "Manual input", "Data", ShapeKind::TrapezoidAlt, process)
            .with_description("Manually entered data"),
    ]
}

pub fn find_template<'a>(palette: &'a [ShapeTemplate], id: &str) -> Option<&'a ShapeTemplate> {
    palette.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_covers_every_shape_once() {
        let palette = default_palette();
        for shape in ShapeKind::ALL {
            assert_eq!(
                palette.iter().filter(|t| t.shape == shape).count(),
                1,
                "{shape:?}"
            );
        }
    }

    #[test]
    fn create_node_uses_template_defaults() {
        let palette = default_palette();
        let decision = find_template(&palette, "rhombus").unwrap();
        let node = decision.create_node(Point::new(40.0, 60.0));
        assert_eq!(node.position, Point::new(40.0, 60.0));
        assert_eq!(node.size, Size::new(100.0, 100.0));
        assert_eq!(node.shape, ShapeKind::Rhombus);
        assert_eq!(node.text, "Decision");

        let other = decision.create_node(Point::ORIGIN);
        assert_ne!(node.id, other.id);
    }

    #[test]
    fn render_expands_placeholders() {
        let palette = default_palette();
        let t = find_template(&palette, "rhombus").unwrap();
        assert_eq!(t.render("q", "Ok?"), "q{Ok?}");
        let hex = find_template(&palette, "hexagon").unwrap();
        assert_eq!(hex.render("h", "Prep"), "h{{Prep}}");
        assert_eq!(
            find_template(&palette, "rectangle").unwrap().render("a", "{id}"),
            "a[{id}]"
        );
    }

    #[test]
    fn preview_matches_generated_declaration() {
        use crate::config::Direction;
        use crate::graph::DiagramGraph;
        use crate::mermaid::generate;

        for template in default_palette() {
            let mut g = DiagramGraph::new();
            let mut node = template.create_node(Point::ORIGIN);
            node.id = NodeId::intern("pv");
            g.add_node(node);
            let expected = format!("    {}\n", template.render("pv", &template.default_text));
            assert!(
                generate(&g, Direction::TopDown).contains(&expected),
                "{}",
                template.id
            );
        }
    }
}
