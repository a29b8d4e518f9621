use bevy_ecs::prelude::*;

use crate::resources::background::BackgroundScroll;
use crate::resources::worldtime::WorldTime;

/// Scroll the background, when the level has one.
pub fn background_scroll(background: Option<ResMut<BackgroundScroll>>, time: Res<WorldTime>) {
    if let Some(mut background) = background {
        background.advance(time.delta);
    }
}
