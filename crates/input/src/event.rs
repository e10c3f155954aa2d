use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Pointer buttons the controls distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// A raw pointer event from the host windowing system.
///
/// Positions are in physical pixels with the origin at the top-left corner
/// of the surface. Hosts translate their native events into these; the
/// controls never see platform types.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { button: PointerButton, position: Vec2 },
    Move { position: Vec2 },
    Up { button: PointerButton },
    /// Scroll in wheel notches; positive moves the camera away.
    Wheel { delta: f32 },
}

impl PointerEvent {
    pub fn position(&self) -> Option<Vec2> {
        match self {
            Self::Down { position, .. } | Self::Move { position } => Some(*position),
            Self::Up { .. } | Self::Wheel { .. } => None,
        }
    }
}
