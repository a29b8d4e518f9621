//! Event types and observers.
//!
//! Submodules:
//! - [`switchfullscreen`] – toggle the window between fullscreen and windowed
pub mod switchfullscreen;
