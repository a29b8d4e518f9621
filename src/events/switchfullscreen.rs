//! Fullscreen toggle event and observer.
//!
//! F11 (or `[graphics] fullscreen = yes` at startup) triggers
//! [`SwitchFullScreenEvent`]. The [`FullScreen`] marker resource records the
//! mode the game asked for; the window itself is the source of truth for
//! whether the switch worked.

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{info, warn};
use raylib::RaylibHandle;
use raylib::ffi;

use crate::resources::fullscreen::FullScreen;
use crate::resources::gameconfig::GameConfig;

#[derive(Event, Debug, Clone, Copy)]
pub struct SwitchFullScreenEvent {}

/// Flip between windowed mode at the configured size and fullscreen at the
/// current monitor's resolution.
pub fn switch_fullscreen_observer(
    _trigger: On<SwitchFullScreenEvent>,
    mut rl: NonSendMut<RaylibHandle>,
    mut commands: Commands,
    fullscreen: Option<Res<FullScreen>>,
    config: Res<GameConfig>,
) {
    let want_fullscreen = fullscreen.is_none();
    if want_fullscreen {
        commands.insert_resource(FullScreen);
        enter_fullscreen(&mut rl);
    } else {
        commands.remove_resource::<FullScreen>();
        let (w, h) = config.window_size();
        leave_fullscreen(&mut rl, w as i32, h as i32);
    }

    let mode = if want_fullscreen { "fullscreen" } else { "windowed" };
    if rl.is_window_fullscreen() == want_fullscreen {
        info!("Switched to {} mode", mode);
    } else {
        warn!("Window did not switch to {} mode", mode);
    }
}

fn enter_fullscreen(rl: &mut RaylibHandle) {
    if rl.is_window_fullscreen() {
        return;
    }
    let (width, height) = unsafe {
        let monitor = ffi::GetCurrentMonitor();
        (ffi::GetMonitorWidth(monitor), ffi::GetMonitorHeight(monitor))
    };
    info!("Monitor resolution {}x{}", width, height);
    rl.set_window_size(width, height);
    rl.toggle_fullscreen();
}

fn leave_fullscreen(rl: &mut RaylibHandle, width: i32, height: i32) {
    if !rl.is_window_fullscreen() {
        return;
    }
    rl.toggle_fullscreen();
    rl.set_window_size(width, height);
    rl.restore_window();
}
