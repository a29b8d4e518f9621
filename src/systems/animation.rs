//! Tile animation system.
//!
//! Advances every entity collection ([`TileSet`]), decoration included, by
//! the frame delta. Player
//! tracks are advanced separately by
//! [`player_animation`](crate::systems::player::player_animation) so only the
//! visible track moves.

use bevy_ecs::prelude::*;

use crate::components::player::PlayerState;
use crate::components::tileset::TileSet;
use crate::resources::worldtime::WorldTime;

/// Advance the animation of every member of every collection.
pub fn tileset_animation(
    mut query: Query<&mut TileSet, Without<PlayerState>>,
    time: Res<WorldTime>,
) {
    for mut set in query.iter_mut() {
        set.update(time.delta);
    }
}
