//! Player controller.
//!
//! Each frame the controller turns the logical input into an [`Intent`],
//! runs the movement state machine, then integrates the position one axis at
//! a time against the static level tiles:
//!
//! 1. descend through a platform (`down` on a descendable tile)
//! 2. horizontal input: facing, `run`, acceleration or deceleration
//! 3. jump initiation (`up` or `jump` while on ground)
//! 4. jump hold / early release
//! 5. airborne default (`fall`)
//! 6. landing (`fall`/`descend` back to `idle`)
//!
//! Rules 1 to 5 run before integration; rule 6 runs after vertical
//! resolution so a landing is visible in the same frame.

use bevy_ecs::prelude::*;
use raylib::prelude::Vector2;

use crate::components::boxcollider::BoxCollider;
use crate::components::player::{Facing, MovementState, PlayerParams, PlayerState};
use crate::components::tileset::{TileCategory, TileDescriptor, TileSet};
use crate::resources::input::{Action, InputState};
use crate::resources::tilecatalog::TileMetrics;
use crate::resources::worldtime::WorldTime;
use crate::systems::collision::{CollisionView, resolve_horizontal};

/// Directions requested this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Intent {
    /// `up` and `jump` both start and hold a jump.
    pub fn from_input(input: &InputState) -> Self {
        Self {
            up: input.is_pressed(Action::Up) || input.is_pressed(Action::Jump),
            down: input.is_pressed(Action::Down),
            left: input.is_pressed(Action::Left),
            right: input.is_pressed(Action::Right),
        }
    }

    /// -1 for left, 1 for right, 0 for none. Left wins when both are held.
    fn horizontal(&self) -> f32 {
        if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        }
    }
}

/// Advance the player by one frame.
pub fn step_player(
    state: &mut PlayerState,
    params: &PlayerParams,
    collider: &BoxCollider,
    intent: Intent,
    view: &CollisionView<'_>,
    dt: f32,
) {
    // 1. descend
    if intent.down
        && state.on_ground
        && state.movement.is_grounded_state()
        && view.descend_under(&collider.aabb(state.position()))
    {
        state.movement = MovementState::Descend;
        state.on_ground = false;
        state.vertical_velocity = params.gravity * dt;
        state.descend_elapsed = 0.0;
    }

    // 2. horizontal input
    let direction = intent.horizontal();
    if direction != 0.0 {
        state.facing = if direction < 0.0 {
            Facing::Left
        } else {
            Facing::Right
        };
        if state.on_ground {
            state.movement = MovementState::Run;
        }
        accelerate(state, direction, params, dt);
    } else {
        if state.on_ground && state.movement.is_grounded_state() {
            state.movement = MovementState::Idle;
        }
        decelerate(state, params.deceleration * dt);
    }

    // 3. jump initiation
    if state.movement != MovementState::Jump && intent.up && state.on_ground {
        state.movement = MovementState::Jump;
        state.on_ground = false;
        state.vertical_velocity = params.jump_acceleration;
        state.jump_elapsed = 0.0;
    }

    // 4. jump hold / release
    if state.movement == MovementState::Jump {
        if intent.up {
            state.jump_elapsed += dt;
            if state.jump_elapsed >= params.jump_time_max {
                state.movement = MovementState::Fall;
            }
        } else {
            state.movement = MovementState::Fall;
        }
    }

    // 5. airborne default
    if !state.on_ground
        && !matches!(
            state.movement,
            MovementState::Jump | MovementState::Descend
        )
    {
        state.movement = MovementState::Fall;
    }

    // horizontal axis
    let new_x = state.x + state.velocity * dt;
    state.x = resolve_horizontal(view, collider, state.x, state.y, new_x);

    let ignore_descend =
        state.movement == MovementState::Descend && state.descend_elapsed < params.descend_time;

    // walked off a ledge
    if state.on_ground && !view.supports(&collider.aabb(state.position()), ignore_descend) {
        state.on_ground = false;
        if state.movement.is_grounded_state() {
            state.movement = MovementState::Fall;
        }
    }

    // vertical axis
    if !state.on_ground {
        state.vertical_velocity += params.gravity * dt;
        if state.movement == MovementState::Jump {
            state.vertical_velocity -= params.jump_hold_force * dt;
        }
        let previous = collider.aabb(state.position());
        let new_y = state.y + state.vertical_velocity * dt;
        let next = collider.aabb(Vector2::new(state.x, new_y));

        if state.vertical_velocity > 0.0 {
            match view.landing(&previous, &next, ignore_descend) {
                Some(top) => {
                    state.y = collider.y_resting_on(top);
                    state.vertical_velocity = 0.0;
                    state.on_ground = true;
                }
                None => state.y = new_y,
            }
        } else if state.vertical_velocity < 0.0 && view.ceiling(&previous, &next) {
            state.vertical_velocity = 0.0;
            if state.movement == MovementState::Jump {
                state.movement = MovementState::Fall;
            }
        } else {
            state.y = new_y;
        }
    }

    if state.movement == MovementState::Descend {
        state.descend_elapsed += dt;
    }

    // 6. landing
    if state.on_ground
        && matches!(
            state.movement,
            MovementState::Fall | MovementState::Descend
        )
    {
        state.movement = MovementState::Idle;
    }
}

/// Speed up toward `direction * max_velocity`. A remainder under half a
/// step snaps to the limit so that rounding in the sum of `dt` steps never
/// delays the clamp by a frame.
fn accelerate(state: &mut PlayerState, direction: f32, params: &PlayerParams, dt: f32) {
    let step = params.acceleration * dt;
    let limit = direction * params.max_velocity;
    let velocity = state.velocity + direction * step;
    state.velocity = if (limit - velocity).abs() < step * 0.5 {
        limit
    } else {
        velocity.clamp(-params.max_velocity, params.max_velocity)
    };
}

/// Move `velocity` toward 0 by `amount` without crossing it. A remainder
/// under half a step snaps to 0.
fn decelerate(state: &mut PlayerState, amount: f32) {
    if state.velocity.abs() < amount * 1.5 {
        state.velocity = 0.0;
    } else if state.velocity > 0.0 {
        state.velocity -= amount;
    } else {
        state.velocity += amount;
    }
}

/// Animation track shown for the current movement state.
pub fn current_track<'a>(state: &PlayerState, tracks: &'a TileSet) -> Option<&'a TileDescriptor> {
    state
        .movement
        .animation_candidates()
        .iter()
        .find_map(|name| tracks.animation(name))
}

fn current_track_mut<'a>(
    state: &PlayerState,
    tracks: &'a mut TileSet,
) -> Option<&'a mut TileDescriptor> {
    let name = state
        .movement
        .animation_candidates()
        .iter()
        .find(|name| tracks.animation(name).is_some())?;
    tracks
        .tiles
        .iter_mut()
        .find(|t| t.animation_name.as_deref() == Some(*name))
}

/// Run the controller for every player against the platform and terrain
/// collections. A track switch restarts the new track from its first frame.
pub fn player_controller(
    mut players: Query<(&mut PlayerState, &PlayerParams, &BoxCollider, &mut TileSet)>,
    collections: Query<(&TileSet, &TileCategory), Without<PlayerState>>,
    input: Res<InputState>,
    time: Res<WorldTime>,
    metrics: Res<TileMetrics>,
) {
    let view = CollisionView::new(
        *metrics,
        collections
            .iter()
            .filter(|(_, category)| {
                matches!(category, TileCategory::Platform | TileCategory::Terrain)
            })
            .map(|(set, _)| set),
    );
    let intent = Intent::from_input(&input);

    for (mut state, params, collider, mut tracks) in players.iter_mut() {
        let before = state.movement;
        step_player(&mut state, params, collider, intent, &view, time.delta);
        if state.movement != before {
            if let Some(track) = current_track_mut(&state, &mut tracks) {
                track.frame.reset();
            }
        }
    }
}

/// Advance only the track the player currently shows.
pub fn player_animation(mut players: Query<(&PlayerState, &mut TileSet)>, time: Res<WorldTime>) {
    for (state, mut tracks) in players.iter_mut() {
        if let Some(track) = current_track_mut(state, &mut tracks) {
            track.advance(time.delta);
        }
    }
}
