//! Hotkey-bound on/off state shared by overlays and processors.

#![allow(missing_docs)]

/// Keyboard key that can be bound to a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Alphabetic keys.
    A, B, C, D, E, F, G, H, I, J, K, L, M,
    /// More alphabetic keys.
    N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
    /// Number keys.
    Num0, Num1, Num2, Num3, Num4, Num5, Num6, Num7, Num8, Num9,
    /// Function keys.
    F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Control key is held.
    pub ctrl: bool,
    /// Alt key is held.
    pub alt: bool,
    /// Super/Command key is held.
    pub super_key: bool,
}

impl Modifiers {
    /// No modifier held.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        super_key: false,
    };

    /// Only control held.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        super_key: false,
    };

    /// Only shift held.
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
        super_key: false,
    };
}

/// A key plus the exact modifier mask it must be pressed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hotkey {
    /// Key that triggers the toggle.
    pub key: Key,
    /// Modifiers that must be held (and no others).
    pub modifiers: Modifiers,
}

impl Hotkey {
    /// Creates a hotkey without modifiers.
    #[must_use]
    pub const fn key(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Creates a hotkey with a modifier mask.
    #[must_use]
    pub const fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Returns true if `key` pressed with `modifiers` triggers this hotkey.
    #[must_use]
    pub fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }
}

/// Anything that flips between two states on a hotkey.
///
/// Overlays flip their displayed state, processors their active state.
/// Toggling twice always restores the original state.
pub trait Toggleable {
    /// Flips the state and returns the new value.
    fn toggle(&self) -> bool;

    /// Hotkey bound to [`Toggleable::toggle`], if any.
    fn hotkey(&self) -> Option<Hotkey> {
        None
    }
}
