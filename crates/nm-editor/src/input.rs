//! Input abstraction layer.
//!
//! Normalizes browser pointer, wheel, and double-click events into a single
//! `InputEvent` enum consumed by the interaction controller. Coordinates are
//! always screen-space pixels relative to the canvas.

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Whether the gesture should add to the selection instead of replacing it.
    pub fn additive(&self) -> bool {
        self.shift || self.ctrl || self.meta
    }
}

/// Which pointer button was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

impl PointerButton {
    /// Map a DOM `MouseEvent.button` index.
    pub fn from_dom(button: i16) -> Option<Self> {
        match button {
            0 => Some(PointerButton::Primary),
            1 => Some(PointerButton::Middle),
            2 => Some(PointerButton::Secondary),
            _ => None,
        }
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Pointer pressed.
    PointerDown {
        x: f32,
        y: f32,
        button: PointerButton,
        modifiers: Modifiers,
    },

    /// Pointer moved. `buttons` is the DOM `MouseEvent.buttons` bitmask;
    /// zero means the platform no longer reports any button held.
    PointerMove {
        x: f32,
        y: f32,
        buttons: u16,
        modifiers: Modifiers,
    },

    /// Pointer released.
    PointerUp { x: f32, y: f32, modifiers: Modifiers },

    /// Wheel / pinch. Positive `delta` zooms out.
    Wheel { x: f32, y: f32, delta: f32 },

    /// Double click.
    DoubleClick { x: f32, y: f32 },
}

impl InputEvent {
    pub fn pointer_down(x: f32, y: f32, button: PointerButton, modifiers: Modifiers) -> Self {
        Self::PointerDown {
            x,
            y,
            button,
            modifiers,
        }
    }

    /// Move with the primary button held.
    pub fn drag_to(x: f32, y: f32) -> Self {
        Self::PointerMove {
            x,
            y,
            buttons: 1,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn pointer_up(x: f32, y: f32, modifiers: Modifiers) -> Self {
        Self::PointerUp { x, y, modifiers }
    }

    /// Extract position for any event.
    pub fn position(&self) -> (f32, f32) {
        match self {
            Self::PointerDown { x, y, .. }
            | Self::PointerMove { x, y, .. }
            | Self::PointerUp { x, y, .. }
            | Self::Wheel { x, y, .. }
            | Self::DoubleClick { x, y } => (*x, *y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_buttons_map() {
        assert_eq!(PointerButton::from_dom(0), Some(PointerButton::Primary));
        assert_eq!(PointerButton::from_dom(2), Some(PointerButton::Secondary));
        assert_eq!(PointerButton::from_dom(4), None);
    }

    #[test]
    fn alt_alone_is_not_additive() {
        let alt = Modifiers {
            alt: true,
            ..Modifiers::NONE
        };
        assert!(!alt.additive());
        assert!(Modifiers::SHIFT.additive());
    }
}
