//! Player state and tuning components.
//!
//! [`PlayerState`] is the mutable per-frame state driven by the
//! [`player_controller`](crate::systems::player::player_controller) system.
//! [`PlayerParams`] holds the movement tuning loaded from the `[player]`
//! section of the configuration file.

use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// Movement state; each one maps to a player animation track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovementState {
    #[default]
    Idle,
    Run,
    Jump,
    Fall,
    Descend,
}

impl MovementState {
    pub fn animation_name(&self) -> &'static str {
        match self {
            MovementState::Idle => "idle",
            MovementState::Run => "run",
            MovementState::Jump => "jump",
            MovementState::Fall => "fall",
            MovementState::Descend => "descend",
        }
    }

    /// Tracks to try, in order, when a map lacks this state's animation.
    pub fn animation_candidates(&self) -> &'static [&'static str] {
        match self {
            MovementState::Idle => &["idle"],
            MovementState::Run => &["run", "idle"],
            MovementState::Jump => &["jump", "idle"],
            MovementState::Fall => &["fall", "jump", "idle"],
            MovementState::Descend => &["descend", "fall", "jump", "idle"],
        }
    }

    pub fn is_grounded_state(&self) -> bool {
        matches!(self, MovementState::Idle | MovementState::Run)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

/// Movement tuning. Units are tiles and seconds.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct PlayerParams {
    /// Horizontal acceleration while a direction is held (tiles/s²).
    pub acceleration: f32,
    pub max_velocity: f32,
    /// Horizontal deceleration with no direction held (tiles/s²).
    pub deceleration: f32,
    /// Initial vertical velocity of a jump; negative is up.
    pub jump_acceleration: f32,
    /// Upward force applied while the jump button is held (tiles/s²).
    pub jump_hold_force: f32,
    /// Longest time the jump button extends a jump (s).
    pub jump_time_max: f32,
    pub gravity: f32,
    /// Time during which descendable platforms are ignored after a descend (s).
    pub descend_time: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            acceleration: 12.0,
            max_velocity: 12.0,
            deceleration: 24.0,
            jump_acceleration: -24.0,
            jump_hold_force: 12.0,
            jump_time_max: 0.2,
            gravity: 35.0,
            descend_time: 0.25,
        }
    }
}

/// Mutable player state, positions in tile units.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub x: f32,
    pub y: f32,
    pub velocity: f32,
    pub vertical_velocity: f32,
    pub on_ground: bool,
    pub facing: Facing,
    pub movement: MovementState,
    pub jump_elapsed: f32,
    pub descend_elapsed: f32,
}

impl PlayerState {
    /// A player standing still at `(x, y)`.
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            velocity: 0.0,
            vertical_velocity: 0.0,
            on_ground: true,
            facing: Facing::Right,
            movement: MovementState::Idle,
            jump_elapsed: 0.0,
            descend_elapsed: 0.0,
        }
    }

    pub fn position(&self) -> Vector2 {
        Vector2::new(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_falls_back_to_idle() {
        for state in [
            MovementState::Idle,
            MovementState::Run,
            MovementState::Jump,
            MovementState::Fall,
            MovementState::Descend,
        ] {
            let candidates = state.animation_candidates();
            assert_eq!(candidates[0], state.animation_name());
            assert_eq!(*candidates.last().unwrap(), "idle");
        }
    }

    #[test]
    fn test_new_player_is_grounded_idle() {
        let p = PlayerState::at(5.0, 10.0);
        assert!(p.on_ground);
        assert_eq!(p.movement, MovementState::Idle);
        assert_eq!(p.facing, Facing::Right);
        assert_eq!(p.position(), Vector2::new(5.0, 10.0));
    }

    #[test]
    fn test_default_params_jump_upward() {
        let params = PlayerParams::default();
        assert!(params.jump_acceleration < 0.0);
        assert!(params.gravity > 0.0);
    }
}
