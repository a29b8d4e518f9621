//! Game systems.
//!
//! This module groups all ECS systems that advance simulation, input, and
//! rendering.
//!
//! Submodules overview
//! - [`animation`] – advance the animation of every tile collection
//! - [`background`] – scroll the background
//! - [`collision`] – read-only collision queries against level tiles
//! - [`input`] – read hardware input and update [`crate::resources::input::InputState`]
//! - [`player`] – player state machine, physics and animation track selection
//! - [`render`] – draw the level with Raylib
//! - [`time`] – update simulation time and delta

pub mod animation;
pub mod background;
pub mod collision;
pub mod input;
pub mod player;
pub mod render;
pub mod time;
