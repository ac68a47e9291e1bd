//! Exclusive pointer capture for the duration of one gesture.

use crate::tools::ToolKind;

/// Routes every event of a gesture to the tool that started it.
///
/// At most one tool owns the pointer. The owner is set on press and taken
/// back on release or cancel.
#[derive(Debug, Default)]
pub struct PointerCapture {
    owner: Option<ToolKind>,
}

impl PointerCapture {
    /// Returns `false` if another gesture still holds the pointer.
    pub fn acquire(&mut self, owner: ToolKind) -> bool {
        if self.owner.is_some() {
            return false;
        }
        self.owner = Some(owner);
        true
    }

    /// Give up the capture, returning the previous owner.
    pub fn release(&mut self) -> Option<ToolKind> {
        self.owner.take()
    }

    pub fn owner(&self) -> Option<ToolKind> {
        self.owner
    }

    pub fn is_captured(&self) -> bool {
        self.owner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_is_exclusive_until_released() {
        let mut capture = PointerCapture::default();
        assert!(capture.acquire(ToolKind::Connect));
        assert!(!capture.acquire(ToolKind::Drag));
        assert_eq!(capture.owner(), Some(ToolKind::Connect));
        assert_eq!(capture.release(), Some(ToolKind::Connect));
        assert!(!capture.is_captured());
        assert_eq!(capture.release(), None);
        assert!(capture.acquire(ToolKind::Drag));
    }
}
