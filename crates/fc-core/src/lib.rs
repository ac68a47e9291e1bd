pub mod change;
pub mod config;
pub mod document;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod mermaid;
pub mod model;
pub mod palette;
pub mod view;

pub use change::{ChangeListener, ChangeRecord, EntityId, Field, FieldValue, SubscriptionId};
pub use config::{CanvasConfig, Direction};
pub use document::{Document, Metadata};
pub use error::{DocumentError, Result};
pub use graph::{AddConnectorOutcome, DiagramGraph, RemovedNode};
pub use id::{ConnectorId, NodeId};
pub use model::*;
pub use palette::{ShapeTemplate, default_palette, find_template};
pub use view::{CanvasSettings, Selection, SelectionTarget, ViewState};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size, Vec2};
