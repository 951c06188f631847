//! Raw pointer and keyboard input types.

use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Identifier the platform assigns to each active pointer.
pub type PointerId = u32;

/// Pressed-buttons bitmask values.
pub const PRIMARY_BUTTON: u8 = 1;
pub const SECONDARY_BUTTON: u8 = 2;
pub const AUXILIARY_BUTTON: u8 = 4;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Secondary,
    Auxiliary,
}

impl MouseButton {
    /// Pick the button a press acts with, preferring primary, then
    /// secondary, then auxiliary.
    pub fn from_bitmask(buttons: u8) -> Option<Self> {
        if buttons & PRIMARY_BUTTON != 0 {
            Some(Self::Primary)
        } else if buttons & SECONDARY_BUTTON != 0 {
            Some(Self::Secondary)
        } else if buttons & AUXILIARY_BUTTON != 0 {
            Some(Self::Auxiliary)
        } else {
            None
        }
    }

    /// Bitmask value of this button.
    pub fn bit(self) -> u8 {
        match self {
            Self::Primary => PRIMARY_BUTTON,
            Self::Secondary => SECONDARY_BUTTON,
            Self::Auxiliary => AUXILIARY_BUTTON,
        }
    }
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A single pointer sample in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub pointer_id: PointerId,
    pub position: Point,
    /// Pressed-buttons bitmask at the time of the event.
    #[serde(default)]
    pub buttons: u8,
}

impl PointerEvent {
    pub fn down(pointer_id: PointerId, position: Point, buttons: u8) -> Self {
        Self {
            phase: PointerPhase::Down,
            pointer_id,
            position,
            buttons,
        }
    }

    pub fn moved(pointer_id: PointerId, position: Point) -> Self {
        Self {
            phase: PointerPhase::Move,
            pointer_id,
            position,
            buttons: 0,
        }
    }

    pub fn up(pointer_id: PointerId, position: Point) -> Self {
        Self {
            phase: PointerPhase::Up,
            pointer_id,
            position,
            buttons: 0,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}
