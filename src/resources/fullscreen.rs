//! Fullscreen marker resource.
//!
//! Present while the window is fullscreen. Inserted at startup when
//! `[graphics] fullscreen = yes` and toggled by F11.
use bevy_ecs::prelude::Resource;

/// Marker resource: when present, the window is in fullscreen mode.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FullScreen;
