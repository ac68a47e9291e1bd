//! Persisted document: the durable JSON form of a diagram.
//!
//! Saving maps every node and connector to a flat record (enums as strings,
//! colors as hex). Loading rebuilds a fresh [`DiagramGraph`] from the records
//! with every ID restored verbatim. A document that fails validation is
//! rejected as a whole, so a caller's live graph is never half-replaced.

use crate::config::CanvasConfig;
use crate::error::{DocumentError, Result};
use crate::graph::{AddConnectorOutcome, DiagramGraph};
use crate::id::{ConnectorId, NodeId};
use crate::model::{Anchor, ArrowKind, Color, Connector, LineStyle, Node, NodeStyle, ShapeKind};
use crate::view::CanvasSettings;
use chrono::{DateTime, Utc};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Version written by this crate. Any `1.x` version is accepted on load.
pub const FORMAT_VERSION: &str = "1.0";

/// Value of `diagram.type` for flowcharts.
pub const DIAGRAM_KIND: &str = "flowchart";

// ─── Records ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: String,
    pub metadata: Metadata,
    pub diagram: DiagramRecord,
    /// Last generated diagram text. Advisory only; regenerated on demand.
    #[serde(default)]
    pub mermaid_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub application: String,
}

impl Metadata {
    pub fn new(config: &CanvasConfig) -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
            author: config.author.clone(),
            application: config.application.clone(),
        }
    }

    /// Stamp `modified` with the current time.
    pub fn touch(&mut self) {
        self.modified = Utc::now().max(self.created);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub settings: SettingsRecord,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub connectors: Vec<ConnectorRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub zoom_level: f64,
}

impl From<CanvasSettings> for SettingsRecord {
    fn from(s: CanvasSettings) -> Self {
        Self {
            show_grid: s.show_grid,
            snap_to_grid: s.snap_to_grid,
            grid_size: s.grid_size,
            zoom_level: s.zoom_level,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub text: String,
    pub shape: ShapeKind,
    pub position: PointRecord,
    pub size: SizeRecord,
    pub style: StyleRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorRecord {
    pub id: String,
    pub start_node_id: String,
    pub end_node_id: String,
    #[serde(default)]
    pub label: Option<String>,
    pub start_anchor: Anchor,
    pub end_anchor: Anchor,
    pub line_style: LineStyle,
    pub line_width: f64,
    pub start_arrow_type: ArrowKind,
    pub end_arrow_type: ArrowKind,
    pub line_color: String,
}

// ─── Graph → records ──────────────────────────────────────────────────────

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        let style = &node.style;
        Self {
            id: node.id.as_str().to_owned(),
            text: node.text.clone(),
            shape: node.shape,
            position: PointRecord {
                x: node.position.x,
                y: node.position.y,
            },
            size: SizeRecord {
                width: node.size.width,
                height: node.size.height,
            },
            style: StyleRecord {
                fill_color: style.fill_color.to_hex(),
                stroke_color: style.stroke_color.to_hex(),
                stroke_width: style.stroke_width,
                font_family: Some(style.font_family.clone()),
                font_size: Some(style.font_size),
            },
        }
    }
}

impl From<&Connector> for ConnectorRecord {
    fn from(c: &Connector) -> Self {
        Self {
            id: c.id.as_str().to_owned(),
            start_node_id: c.start_node.as_str().to_owned(),
            end_node_id: c.end_node.as_str().to_owned(),
            label: c.label.clone(),
            start_anchor: c.start_anchor,
            end_anchor: c.end_anchor,
            line_style: c.line_style,
            line_width: c.line_width,
            start_arrow_type: c.start_arrow,
            end_arrow_type: c.end_arrow,
            line_color: c.line_color.to_hex(),
        }
    }
}

// ─── Records → graph ──────────────────────────────────────────────────────

fn parse_color(hex: &str) -> Result<Color> {
    Color::from_hex(hex).ok_or_else(|| DocumentError::InvalidColor(hex.to_owned()))
}

impl NodeRecord {
    pub fn to_node(&self) -> Result<Node> {
        let defaults = NodeStyle::default();
        let style = NodeStyle {
            fill_color: parse_color(&self.style.fill_color)?,
            stroke_color: parse_color(&self.style.stroke_color)?,
            stroke_width: self.style.stroke_width,
            font_family: self
                .style
                .font_family
                .clone()
                .unwrap_or(defaults.font_family),
            font_size: self.style.font_size.unwrap_or(defaults.font_size),
        };
        let mut node = Node::new(
            NodeId::intern(&self.id),
            self.shape,
            Point::new(self.position.x, self.position.y),
            Size::new(self.size.width, self.size.height),
        )
        .with_text(self.text.clone());
        node.style = style;
        Ok(node)
    }
}

impl ConnectorRecord {
    pub fn to_connector(&self) -> Result<Connector> {
        let mut c = Connector::new(
            ConnectorId::intern(&self.id),
            NodeId::intern(&self.start_node_id),
            self.start_anchor,
            NodeId::intern(&self.end_node_id),
            self.end_anchor,
        );
        c.label = self.label.clone().filter(|l| !l.is_empty());
        c.line_style = self.line_style;
        c.line_width = self.line_width;
        c.start_arrow = self.start_arrow_type;
        c.end_arrow = self.end_arrow_type;
        c.line_color = parse_color(&self.line_color)?;
        Ok(c)
    }
}

// ─── Document ─────────────────────────────────────────────────────────────

impl Document {
    /// Capture a graph and its view settings.
    ///
    /// `metadata` is the metadata of the document being saved over (or a
    /// fresh one); its `modified` stamp is updated.
    pub fn from_graph(
        graph: &DiagramGraph,
        settings: CanvasSettings,
        metadata: &Metadata,
        code: &str,
    ) -> Self {
        let mut metadata = metadata.clone();
        metadata.touch();
        Self {
            version: FORMAT_VERSION.to_owned(),
            metadata,
            diagram: DiagramRecord {
                kind: DIAGRAM_KIND.to_owned(),
                settings: settings.into(),
                nodes: graph.nodes().map(NodeRecord::from).collect(),
                connectors: graph.connectors().map(ConnectorRecord::from).collect(),
            },
            mermaid_code: code.to_owned(),
        }
    }

    /// Rebuild a fresh graph and view settings from this document.
    ///
    /// Fails on an unsupported version, a duplicate ID, a connector whose
    /// endpoints are missing or equal, two connectors linking the same pair of
    /// nodes, an unparseable color, or a non-positive grid size. Zoom outside
    /// the configured range is clamped.
    pub fn to_graph(&self, config: &CanvasConfig) -> Result<(DiagramGraph, CanvasSettings)> {
        self.build_graph(config)
            .inspect_err(|e| log::warn!("rejected document: {e}"))
    }

    fn build_graph(&self, config: &CanvasConfig) -> Result<(DiagramGraph, CanvasSettings)> {
        check_version(&self.version)?;
        let settings = self.settings(config)?;

        let mut graph = DiagramGraph::new();
        let mut seen = HashSet::new();
        for record in &self.diagram.nodes {
            if !seen.insert(record.id.as_str()) {
                return Err(DocumentError::DuplicateId(record.id.clone()));
            }
            graph.add_node(record.to_node()?);
        }

        let mut seen = HashSet::new();
        for record in &self.diagram.connectors {
            if !seen.insert(record.id.as_str()) {
                return Err(DocumentError::DuplicateId(record.id.clone()));
            }
            match graph.add_connector(record.to_connector()?) {
                AddConnectorOutcome::Added(_) => {}
                AddConnectorOutcome::SelfLoop => {
                    return Err(DocumentError::SelfLoop(record.id.clone()));
                }
                AddConnectorOutcome::MissingNode(node) => {
                    return Err(DocumentError::DanglingConnector {
                        connector: record.id.clone(),
                        node: node.as_str().to_owned(),
                    });
                }
                AddConnectorOutcome::Duplicate(_) => {
                    return Err(DocumentError::DuplicateConnector {
                        connector: record.id.clone(),
                    });
                }
            }
        }

        log::debug!(
            "loaded document with {} node(s), {} connector(s)",
            graph.node_count(),
            graph.connector_count()
        );
        Ok((graph, settings))
    }

    fn settings(&self, config: &CanvasConfig) -> Result<CanvasSettings> {
        let s = self.diagram.settings;
        if !(s.grid_size.is_finite() && s.grid_size > 0.0) {
            return Err(DocumentError::InvalidSettings(format!(
                "grid size must be positive, got {}",
                s.grid_size
            )));
        }
        let zoom_level = config.clamp_zoom(s.zoom_level);
        if zoom_level != s.zoom_level {
            log::warn!("document zoom {} clamped to {zoom_level}", s.zoom_level);
        }
        Ok(CanvasSettings {
            show_grid: s.show_grid,
            snap_to_grid: s.snap_to_grid,
            grid_size: s.grid_size,
            zoom_level,
        })
    }

    // ─── I/O ──────────────────────────────────────────────────────────────

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    pub fn read_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

fn check_version(version: &str) -> Result<()> {
    match version.split('.').next() {
        Some("1") => Ok(()),
        _ => Err(DocumentError::UnsupportedVersion(version.to_owned())),
    }
}
