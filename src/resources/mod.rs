//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution: input state, timing, configuration,
//! rendering handles and the level's tile catalog.
//!
//! Overview
//! - `background` – scrolling background state and its composed texture
//! - `camera2d` – shared 2D camera used for world/screen transforms
//! - `fullscreen` – presence marks the window as fullscreen
//! - `gameconfig` – settings loaded from `config.ini`
//! - `input` – per-frame state of the logical actions
//! - `texturestore` – loaded textures keyed by image path
//! - `tilecatalog` – typed tiles of the loaded map grouped by category
//! - `worldtime` – simulation time and delta
pub mod background;
pub mod camera2d;
pub mod fullscreen;
pub mod gameconfig;
pub mod input;
pub mod texturestore;
pub mod tilecatalog;
pub mod worldtime;
