//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the game world.
//!
//! Submodules overview:
//! - [`boxcollider`] – axis-aligned boxes and the player's collision box
//! - [`player`] – player movement state and tuning
//! - [`tileset`] – tile descriptors, sprite frames and entity collections

pub mod boxcollider;
pub mod player;
pub mod tileset;
