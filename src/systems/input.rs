//! Input systems.
//!
//! - [`update_input_state`] reads hardware input from Raylib each frame and
//!   writes the results into [`crate::resources::input::InputState`].
//! - [`window_requests`] consumes the fullscreen flag and fires
//!   [`SwitchFullScreenEvent`].
use bevy_ecs::prelude::*;
use raylib::ffi::KeyboardKey;

use crate::events::switchfullscreen::SwitchFullScreenEvent;
use crate::resources::input::{Action, InputState};

/// Poll Raylib for keyboard input and update the `InputState` resource.
pub fn update_input_state(mut input: ResMut<InputState>, rl: NonSend<raylib::RaylibHandle>) {
    let any_down = |keys: &[KeyboardKey]| keys.iter().any(|k| rl.is_key_down(*k));
    let any_pressed = |keys: &[KeyboardKey]| keys.iter().any(|k| rl.is_key_pressed(*k));

    for action in Action::ALL {
        let down = any_down(&input.state(action).key_bindings);
        input.state_mut(action).set(down);
    }

    let quit = any_down(&input.quit.key_bindings);
    input.quit.set(quit);
    let fullscreen = any_down(&input.fullscreen_toggle.key_bindings);
    input.fullscreen_toggle.set(fullscreen);

    if any_pressed(&input.quit.key_bindings) || rl.window_should_close() {
        input.quit_requested = true;
    }
    if any_pressed(&input.fullscreen_toggle.key_bindings) {
        input.fullscreen_toggled = true;
    }
}

/// Fire the fullscreen toggle once per F11 press and reset the flag.
pub fn window_requests(mut input: ResMut<InputState>, mut commands: Commands) {
    if input.fullscreen_toggled {
        input.fullscreen_toggled = false;
        commands.trigger(SwitchFullScreenEvent {});
    }
}
