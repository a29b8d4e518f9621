//! Per-frame keyboard input resource.
//!
//! Captures the logical actions the game cares about and exposes them to
//! systems via the [`InputState`] resource. Each action can be bound to
//! several physical keys; defaults use the arrow keys plus WASD for movement
//! and Space for jump. Escape and F11 are fixed window keys.
use bevy_ecs::prelude::*;
use log::warn;
use raylib::prelude::*;
use smallvec::{SmallVec, smallvec};

/// Logical gameplay action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Jump,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Jump,
    ];

    /// Key used in the `[controls]` config section.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Jump => "jump",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(name.trim()))
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn default_keys(&self) -> SmallVec<[KeyboardKey; 2]> {
        match self {
            Action::Up => smallvec![KeyboardKey::KEY_UP, KeyboardKey::KEY_W],
            Action::Down => smallvec![KeyboardKey::KEY_DOWN, KeyboardKey::KEY_S],
            Action::Left => smallvec![KeyboardKey::KEY_LEFT, KeyboardKey::KEY_A],
            Action::Right => smallvec![KeyboardKey::KEY_RIGHT, KeyboardKey::KEY_D],
            Action::Jump => smallvec![KeyboardKey::KEY_SPACE],
        }
    }
}

#[derive(Debug, Clone)]
/// Boolean key state with the keyboard bindings that drive it.
pub struct BoolState {
    /// Whether any bound key is currently held this frame.
    pub active: bool,
    /// Whether the state became active this frame.
    pub just_pressed: bool,
    /// Whether the state became inactive this frame.
    pub just_released: bool,

    /// Keys bound to this action.
    pub key_bindings: SmallVec<[KeyboardKey; 2]>,
}

impl BoolState {
    fn bound_to(keys: SmallVec<[KeyboardKey; 2]>) -> Self {
        Self {
            active: false,
            just_pressed: false,
            just_released: false,
            key_bindings: keys,
        }
    }

    /// Record this frame's held state and derive the edge flags.
    pub fn set(&mut self, down: bool) {
        self.just_pressed = down && !self.active;
        self.just_released = !down && self.active;
        self.active = down;
    }
}

impl Default for BoolState {
    fn default() -> Self {
        Self::bound_to(SmallVec::new())
    }
}

/// Resource capturing the per-frame keyboard state relevant to gameplay.
#[derive(Resource, Debug, Clone)]
pub struct InputState {
    actions: [BoolState; 5],
    // Window keys
    pub quit: BoolState,
    pub fullscreen_toggle: BoolState,
    /// Set by Escape or by closing the window; ends the game loop.
    pub quit_requested: bool,
    /// Set when F11 was pressed this frame; consumed by the window system.
    pub fullscreen_toggled: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            actions: Action::ALL.map(|a| BoolState::bound_to(a.default_keys())),
            quit: BoolState::bound_to(smallvec![KeyboardKey::KEY_ESCAPE]),
            fullscreen_toggle: BoolState::bound_to(smallvec![KeyboardKey::KEY_F11]),
            quit_requested: false,
            fullscreen_toggled: false,
        }
    }
}

impl InputState {
    pub fn is_pressed(&self, action: Action) -> bool {
        self.actions[action.index()].active
    }

    pub fn state(&self, action: Action) -> &BoolState {
        &self.actions[action.index()]
    }

    pub fn state_mut(&mut self, action: Action) -> &mut BoolState {
        &mut self.actions[action.index()]
    }

    /// Drive an action directly; used by tests and scripted input.
    pub fn set_pressed(&mut self, action: Action, down: bool) {
        self.state_mut(action).set(down);
    }

    /// Replace default bindings with configured key names.
    ///
    /// Unknown key names are skipped with a warning and returned. An action
    /// whose every name is unknown keeps its previous binding.
    pub fn apply_bindings(&mut self, controls: &[(Action, Vec<String>)]) -> Vec<String> {
        let mut skipped = Vec::new();
        for (action, names) in controls {
            let mut keys: SmallVec<[KeyboardKey; 2]> = SmallVec::new();
            for name in names {
                match key_from_name(name) {
                    Some(key) => keys.push(key),
                    None => {
                        warn!(
                            "Unknown key '{}' for action '{}', mapping skipped",
                            name,
                            action.name()
                        );
                        skipped.push(name.clone());
                    }
                }
            }
            if !keys.is_empty() {
                self.state_mut(*action).key_bindings = keys;
            }
        }
        skipped
    }
}

/// Resolve a raylib key name such as `W`, `SPACE`, `KEY_LEFT_SHIFT` or `F1`.
pub fn key_from_name(name: &str) -> Option<KeyboardKey> {
    use KeyboardKey::*;
    let upper = name.trim().to_ascii_uppercase();
    let name = upper.strip_prefix("KEY_").unwrap_or(&upper);
    let key = match name {
        "A" => KEY_A,
        "B" => KEY_B,
        "C" => KEY_C,
        "D" => KEY_D,
        "E" => KEY_E,
        "F" => KEY_F,
        "G" => KEY_G,
        "H" => KEY_H,
        "I" => KEY_I,
        "J" => KEY_J,
        "K" => KEY_K,
        "L" => KEY_L,
        "M" => KEY_M,
        "N" => KEY_N,
        "O" => KEY_O,
        "P" => KEY_P,
        "Q" => KEY_Q,
        "R" => KEY_R,
        "S" => KEY_S,
        "T" => KEY_T,
        "U" => KEY_U,
        "V" => KEY_V,
        "W" => KEY_W,
        "X" => KEY_X,
        "Y" => KEY_Y,
        "Z" => KEY_Z,
        "0" | "ZERO" => KEY_ZERO,
        "1" | "ONE" => KEY_ONE,
        "2" | "TWO" => KEY_TWO,
        "3" | "THREE" => KEY_THREE,
        "4" | "FOUR" => KEY_FOUR,
        "5" | "FIVE" => KEY_FIVE,
        "6" | "SIX" => KEY_SIX,
        "7" | "SEVEN" => KEY_SEVEN,
        "8" | "EIGHT" => KEY_EIGHT,
        "9" | "NINE" => KEY_NINE,
        "UP" => KEY_UP,
        "DOWN" => KEY_DOWN,
        "LEFT" => KEY_LEFT,
        "RIGHT" => KEY_RIGHT,
        "SPACE" => KEY_SPACE,
        "ENTER" | "RETURN" => KEY_ENTER,
        "TAB" => KEY_TAB,
        "BACKSPACE" => KEY_BACKSPACE,
        "INSERT" => KEY_INSERT,
        "DELETE" => KEY_DELETE,
        "HOME" => KEY_HOME,
        "END" => KEY_END,
        "PAGE_UP" => KEY_PAGE_UP,
        "PAGE_DOWN" => KEY_PAGE_DOWN,
        "LEFT_SHIFT" | "LSHIFT" => KEY_LEFT_SHIFT,
        "RIGHT_SHIFT" | "RSHIFT" => KEY_RIGHT_SHIFT,
        "LEFT_CONTROL" | "LCTRL" => KEY_LEFT_CONTROL,
        "RIGHT_CONTROL" | "RCTRL" => KEY_RIGHT_CONTROL,
        "LEFT_ALT" | "LALT" => KEY_LEFT_ALT,
        "RIGHT_ALT" | "RALT" => KEY_RIGHT_ALT,
        "F1" => KEY_F1,
        "F2" => KEY_F2,
        "F3" => KEY_F3,
        "F4" => KEY_F4,
        "F5" => KEY_F5,
        "F6" => KEY_F6,
        "F7" => KEY_F7,
        "F8" => KEY_F8,
        "F9" => KEY_F9,
        "F10" => KEY_F10,
        // F11 stays reserved for the fullscreen toggle
        "F12" => KEY_F12,
        "KP_0" => KEY_KP_0,
        "KP_1" => KEY_KP_1,
        "KP_2" => KEY_KP_2,
        "KP_3" => KEY_KP_3,
        "KP_4" => KEY_KP_4,
        "KP_5" => KEY_KP_5,
        "KP_6" => KEY_KP_6,
        "KP_7" => KEY_KP_7,
        "KP_8" => KEY_KP_8,
        "KP_9" => KEY_KP_9,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolstate_default() {
        let bs = BoolState::default();
        assert!(!bs.active);
        assert!(!bs.just_pressed);
        assert!(!bs.just_released);
        assert!(bs.key_bindings.is_empty());
    }

    #[test]
    fn test_inputstate_default_all_inactive() {
        let input = InputState::default();
        for action in Action::ALL {
            assert!(!input.is_pressed(action));
        }
        assert!(!input.quit_requested);
        assert!(!input.fullscreen_toggled);
    }

    #[test]
    fn test_inputstate_default_key_bindings() {
        let input = InputState::default();
        assert_eq!(
            input.state(Action::Up).key_bindings.as_slice(),
            &[KeyboardKey::KEY_UP, KeyboardKey::KEY_W]
        );
        assert_eq!(
            input.state(Action::Left).key_bindings.as_slice(),
            &[KeyboardKey::KEY_LEFT, KeyboardKey::KEY_A]
        );
        assert_eq!(
            input.state(Action::Jump).key_bindings.as_slice(),
            &[KeyboardKey::KEY_SPACE]
        );
        assert_eq!(input.quit.key_bindings[0], KeyboardKey::KEY_ESCAPE);
        assert_eq!(input.fullscreen_toggle.key_bindings[0], KeyboardKey::KEY_F11);
    }

    #[test]
    fn test_set_pressed_edges() {
        let mut input = InputState::default();
        input.set_pressed(Action::Jump, true);
        assert!(input.is_pressed(Action::Jump));
        assert!(input.state(Action::Jump).just_pressed);
        input.set_pressed(Action::Jump, true);
        assert!(!input.state(Action::Jump).just_pressed);
        input.set_pressed(Action::Jump, false);
        assert!(input.state(Action::Jump).just_released);
    }

    #[test]
    fn test_apply_bindings_skips_unknown_key() {
        let mut input = InputState::default();
        let skipped = input.apply_bindings(&[
            (Action::Jump, vec!["LEFT_SHIFT".into(), "HYPERSPACE".into()]),
            (Action::Down, vec!["NOPE".into()]),
        ]);
        assert_eq!(skipped, vec!["HYPERSPACE".to_string(), "NOPE".to_string()]);
        assert_eq!(
            input.state(Action::Jump).key_bindings.as_slice(),
            &[KeyboardKey::KEY_LEFT_SHIFT]
        );
        // every name unknown keeps the default
        assert_eq!(
            input.state(Action::Down).key_bindings.as_slice(),
            &[KeyboardKey::KEY_DOWN, KeyboardKey::KEY_S]
        );
    }

    #[test]
    fn test_key_and_action_names() {
        assert_eq!(key_from_name("w"), Some(KeyboardKey::KEY_W));
        assert_eq!(key_from_name("KEY_SPACE"), Some(KeyboardKey::KEY_SPACE));
        assert_eq!(key_from_name(" up "), Some(KeyboardKey::KEY_UP));
        assert_eq!(key_from_name("F11"), None);
        assert_eq!(Action::from_name("Jump"), Some(Action::Jump));
        assert_eq!(Action::from_name("fire"), None);
    }
}
