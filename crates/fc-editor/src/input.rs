//! Input abstraction layer.
//!
//! The host translates its pointer events into canvas coordinates and feeds
//! them in as `InputEvent`s.

use fc_core::Point;

/// Keyboard modifiers held during a pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Whether selection should be extended rather than replaced.
    pub fn additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// A normalized pointer event in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64, modifiers: Modifiers },
    PointerMove { x: f64, y: f64, modifiers: Modifiers },
    PointerUp { x: f64, y: f64, modifiers: Modifiers },
    /// The gesture was aborted (pointer left the window, capture lost).
    /// Carries the last known position.
    PointerCancel { x: f64, y: f64 },
}

impl InputEvent {
    pub fn down(x: f64, y: f64) -> Self {
        Self::PointerDown {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self::PointerMove {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn up(x: f64, y: f64) -> Self {
        Self::PointerUp {
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn position(&self) -> Point {
        match *self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::PointerCancel { x, y } => Point::new(x, y),
        }
    }

    pub fn modifiers(&self) -> Modifiers {
        match *self {
            Self::PointerDown { modifiers, .. }
            | Self::PointerMove { modifiers, .. }
            | Self::PointerUp { modifiers, .. } => modifiers,
            Self::PointerCancel { .. } => Modifiers::NONE,
        }
    }
}
