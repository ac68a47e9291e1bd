//! Session view-state: selection, zoom and grid settings.
//!
//! Nothing here is part of the graph. The persisted part of it (grid and
//! zoom) round-trips through [`CanvasSettings`].

use crate::config::CanvasConfig;
use crate::id::{ConnectorId, NodeId};
use smallvec::SmallVec;

// ─── Selection ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionTarget {
    Node(NodeId),
    Connector(ConnectorId),
}

/// Flag changes produced by one selection operation: `(target, now_selected)`.
pub type SelectionChanges = SmallVec<[(SelectionTarget, bool); 4]>;

/// Ordered set of selected nodes and connectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    items: Vec<SelectionTarget>,
}

impl Selection {
    pub fn is_selected(&self, target: SelectionTarget) -> bool {
        self.items.contains(&target)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Selected targets in selection order.
    pub fn iter(&self) -> impl Iterator<Item = SelectionTarget> + '_ {
        self.items.iter().copied()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter().filter_map(|t| match t {
            SelectionTarget::Node(id) => Some(id),
            SelectionTarget::Connector(_) => None,
        })
    }

    pub fn connectors(&self) -> impl Iterator<Item = ConnectorId> + '_ {
        self.iter().filter_map(|t| match t {
            SelectionTarget::Connector(id) => Some(id),
            SelectionTarget::Node(_) => None,
        })
    }

    /// Select `target`.
    ///
    /// Non-additive: the previous selection is replaced. Additive: `target`
    /// is toggled and the rest of the selection is kept.
    pub fn select(&mut self, target: SelectionTarget, additive: bool) -> SelectionChanges {
        let mut changes = SelectionChanges::new();
        if additive {
            if let Some(pos) = self.items.iter().position(|t| *t == target) {
                self.items.remove(pos);
                changes.push((target, false));
            } else {
                self.items.push(target);
                changes.push((target, true));
            }
            return changes;
        }

        let already = self.is_selected(target);
        for t in self.items.drain(..).filter(|t| *t != target) {
            changes.push((t, false));
        }
        self.items.push(target);
        if !already {
            changes.push((target, true));
        }
        changes
    }

    /// Add `target` without touching the rest. No change if already selected.
    pub fn insert(&mut self, target: SelectionTarget) -> bool {
        if self.is_selected(target) {
            return false;
        }
        self.items.push(target);
        true
    }

    /// Drop `target` from the selection (e.g. because it was deleted).
    pub fn remove(&mut self, target: SelectionTarget) -> bool {
        let before = self.items.len();
        self.items.retain(|t| *t != target);
        self.items.len() != before
    }

    pub fn clear(&mut self) -> SelectionChanges {
        self.items.drain(..).map(|t| (t, false)).collect()
    }
}

// ─── Settings ─────────────────────────────────────────────────────────────

/// The persisted subset of the view-state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSettings {
    pub show_grid: bool,
    pub snap_to_grid: bool,
    pub grid_size: f64,
    pub zoom_level: f64,
}

impl CanvasSettings {
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self {
            show_grid: true,
            snap_to_grid: true,
            grid_size: config.default_grid_size,
            zoom_level: 1.0,
        }
    }
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self::from_config(&CanvasConfig::default())
    }
}

// ─── ViewState ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ViewState {
    pub selection: Selection,
    zoom: f64,
    pub show_grid: bool,
    pub snap_to_grid: bool,
    grid_size: f64,
    min_zoom: f64,
    max_zoom: f64,
    zoom_step: f64,
}

impl ViewState {
    pub fn new(config: &CanvasConfig) -> Self {
        let settings = CanvasSettings::from_config(config);
        Self {
            selection: Selection::default(),
            zoom: settings.zoom_level,
            show_grid: settings.show_grid,
            snap_to_grid: settings.snap_to_grid,
            grid_size: settings.grid_size,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn grid_size(&self) -> f64 {
        self.grid_size
    }

    /// Set the zoom level, clamped to the configured range. Returns the applied value.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let clamped = if zoom.is_nan() {
            1.0_f64.clamp(self.min_zoom, self.max_zoom)
        } else {
            zoom.clamp(self.min_zoom, self.max_zoom)
        };
        if clamped != zoom {
            log::debug!("zoom {zoom} clamped to {clamped}");
        }
        self.zoom = clamped;
        clamped
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set_zoom(self.zoom * self.zoom_step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set_zoom(self.zoom / self.zoom_step)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.set_zoom(1.0)
    }

    /// Returns `false` and leaves the grid alone for non-positive sizes.
    pub fn set_grid_size(&mut self, size: f64) -> bool {
        if !(size.is_finite() && size > 0.0) {
            log::warn!("ignoring invalid grid size {size}");
            return false;
        }
        self.grid_size = size;
        true
    }

    pub fn settings(&self) -> CanvasSettings {
        CanvasSettings {
            show_grid: self.show_grid,
            snap_to_grid: self.snap_to_grid,
            grid_size: self.grid_size,
            zoom_level: self.zoom,
        }
    }

    /// Restore persisted settings. Zoom is clamped; an invalid grid size is ignored.
    pub fn apply_settings(&mut self, settings: CanvasSettings) {
        self.show_grid = settings.show_grid;
        self.snap_to_grid = settings.snap_to_grid;
        self.set_grid_size(settings.grid_size);
        self.set_zoom(settings.zoom_level);
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(&CanvasConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn n(s: &str) -> SelectionTarget {
        SelectionTarget::Node(NodeId::intern(s))
    }

    #[test]
    fn plain_select_replaces_previous_selection() {
        let mut sel = Selection::default();
        sel.select(n("va"), false);
        sel.select(n("vb"), true);
        let changes = sel.select(n("vc"), false);

        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![n("vc")]);
        assert_eq!(
            changes.to_vec(),
            vec![(n("va"), false), (n("vb"), false), (n("vc"), true)]
        );
    }

    #[test]
    fn reselecting_sole_target_is_a_no_op() {
        let mut sel = Selection::default();
        sel.select(n("va"), false);
        assert!(sel.select(n("va"), false).is_empty());
        assert_eq!(sel.len(), 1);
    }

    #[test]
    fn additive_select_toggles() {
        let mut sel = Selection::default();
        sel.select(n("va"), false);
        sel.select(n("vb"), true);
        assert_eq!(sel.len(), 2);

        let changes = sel.select(n("va"), true);
        assert_eq!(changes.to_vec(), vec![(n("va"), false)]);
        assert_eq!(sel.iter().collect::<Vec<_>>(), vec![n("vb")]);
    }

    #[test]
    fn clear_reports_every_deselection() {
        let mut sel = Selection::default();
        sel.select(n("va"), false);
        sel.select(SelectionTarget::Connector(ConnectorId::intern("vc")), true);
        assert_eq!(sel.clear().len(), 2);
        assert!(sel.is_empty());
    }

    #[test]
    fn zoom_in_never_exceeds_ceiling() {
        let mut view = ViewState::default();
        for _ in 0..100 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), 4.0);
    }

    #[test]
    fn zoom_out_never_goes_below_floor() {
        let mut view = ViewState::default();
        for _ in 0..100 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), 0.25);
        assert_eq!(view.reset_zoom(), 1.0);
    }

    #[test]
    fn zoom_steps_by_configured_factor() {
        let mut view = ViewState::default();
        let z = view.zoom_in();
        assert!((z - 1.1).abs() < 1e-12);
        let z = view.zoom_out();
        assert!((z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn grid_size_must_be_positive() {
        let mut view = ViewState::default();
        assert!(!view.set_grid_size(0.0));
        assert!(!view.set_grid_size(-5.0));
        assert!(!view.set_grid_size(f64::INFINITY));
        assert_eq!(view.grid_size(), 20.0);
        assert!(view.set_grid_size(8.0));
        assert_eq!(view.grid_size(), 8.0);
    }

    #[test]
    fn settings_roundtrip_through_view() {
        let mut view = ViewState::default();
        view.apply_settings(CanvasSettings {
            show_grid: false,
            snap_to_grid: false,
            grid_size: 15.0,
            zoom_level: 9.0,
        });
        assert_eq!(
            view.settings(),
            CanvasSettings {
                show_grid: false,
                snap_to_grid: false,
                grid_size: 15.0,
                zoom_level: 4.0,
            }
        );
    }
}
