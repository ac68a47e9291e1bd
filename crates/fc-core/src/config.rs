//! Canvas configuration.

use kurbo::Vec2;

// ─── Direction ────────────────────────────────────────────────────────────

/// Layout direction written into the generated flowchart header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    TopDown,
    BottomTop,
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopDown => "TD",
            Direction::BottomTop => "BT",
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
        }
    }

    /// Accepts `TD`, `TB`, `BT`, `LR`, `RL` (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TD" | "TB" => Some(Direction::TopDown),
            "BT" => Some(Direction::BottomTop),
            "LR" => Some(Direction::LeftRight),
            "RL" => Some(Direction::RightLeft),
            _ => None,
        }
    }
}

// ─── Config ───────────────────────────────────────────────────────────────

/// Configuration for a canvas session.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    /// Lower zoom bound. Default: **0.25**.
    pub min_zoom: f64,
    /// Upper zoom bound. Default: **4.0**.
    pub max_zoom: f64,
    /// Factor applied by one zoom-in step. Default: **1.1**.
    pub zoom_step: f64,
    /// Grid size for new canvases. Default: **20**.
    pub default_grid_size: f64,
    /// Offset applied to duplicated nodes. Default: **(20, 20)**.
    pub clone_offset: Vec2,
    /// Side length of an anchor handle's hit square. Default: **10**.
    pub handle_size: f64,
    /// Written into the metadata of new documents.
    pub author: String,
    pub application: String,
    pub direction: Direction,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_zoom: 0.25,
            max_zoom: 4.0,
            zoom_step: 1.1,
            default_grid_size: 20.0,
            clone_offset: Vec2::new(20.0, 20.0),
            handle_size: 10.0,
            author: String::new(),
            application: "FlowCanvas".into(),
            direction: Direction::TopDown,
        }
    }
}

impl CanvasConfig {
    /// Clamp `zoom` into `[min_zoom, max_zoom]`.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return 1.0_f64.clamp(self.min_zoom, self.max_zoom);
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse_accepts_aliases() {
        assert_eq!(Direction::parse("tb"), Some(Direction::TopDown));
        assert_eq!(Direction::parse("LR"), Some(Direction::LeftRight));
        assert_eq!(Direction::parse("diagonal"), None);
        assert_eq!(Direction::default().as_str(), "TD");
    }

    #[test]
    fn clamp_zoom_bounds() {
        let config = CanvasConfig::default();
        assert_eq!(config.clamp_zoom(10.0), 4.0);
        assert_eq!(config.clamp_zoom(0.01), 0.25);
        assert_eq!(config.clamp_zoom(f64::NAN), 1.0);
    }
}
