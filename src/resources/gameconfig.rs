//! Game configuration resource.
//!
//! Manages game settings loaded from an INI configuration file. Provides
//! defaults for safe startup; every missing or malformed value keeps its
//! default.
//!
//! # Configuration File Format
//!
//! ```ini
//! [graphics]
//! resolution = 1280x720
//! fullscreen = no
//! target_fps = 60
//! scale = 2.0
//!
//! [map]
//! path = assets/maps/level1.tmx
//!
//! [background]
//! image = assets/images/background.png
//! scroll_speed = 0.3
//! x_block_bounds = 0, 40
//! y_block_bounds = -2, 12
//!
//! [controls]
//! up = W, UP
//! jump = SPACE
//!
//! [player]
//! gravity = 35
//! ```

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};
use std::path::{Path, PathBuf};

use crate::components::player::PlayerParams;
use crate::resources::input::Action;

/// Default safe values for startup
const DEFAULT_WINDOW_WIDTH: u32 = 1280;
const DEFAULT_WINDOW_HEIGHT: u32 = 720;
const DEFAULT_TARGET_FPS: u32 = 60;
const DEFAULT_FULLSCREEN: bool = false;
const DEFAULT_SCALE: f32 = 1.0;
const DEFAULT_SCROLL_SPEED: f32 = 0.3;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";
const DEFAULT_MAP_PATH: &str = "assets/maps/level1.tmx";

/// Background layout read from the `[background]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundConfig {
    /// Image tiled across the block range. No background when absent.
    pub image: Option<PathBuf>,
    /// Pixels per 60 Hz frame.
    pub scroll_speed: f32,
    /// Inclusive-exclusive range of level tiles covered horizontally.
    pub x_block_bounds: (i32, i32),
    pub y_block_bounds: (i32, i32),
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            image: None,
            scroll_speed: DEFAULT_SCROLL_SPEED,
            x_block_bounds: (0, 0),
            y_block_bounds: (0, 0),
        }
    }
}

/// Game configuration resource.
///
/// Stores window settings, the level to load, the background layout, key
/// remapping and the player movement tuning.
#[derive(Resource, Debug, Clone)]
pub struct GameConfig {
    /// Window width in pixels.
    pub window_width: u32,
    /// Window height in pixels.
    pub window_height: u32,
    /// Target frames per second.
    pub target_fps: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Camera zoom applied to the level.
    pub scale: f32,
    /// Tiled map to load.
    pub map_path: PathBuf,
    pub background: BackgroundConfig,
    /// Key names per action, in file order. Actions not listed keep their
    /// default bindings.
    pub controls: Vec<(Action, Vec<String>)>,
    pub player: PlayerParams,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GameConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            window_width: DEFAULT_WINDOW_WIDTH,
            window_height: DEFAULT_WINDOW_HEIGHT,
            target_fps: DEFAULT_TARGET_FPS,
            fullscreen: DEFAULT_FULLSCREEN,
            scale: DEFAULT_SCALE,
            map_path: PathBuf::from(DEFAULT_MAP_PATH),
            background: BackgroundConfig::default(),
            controls: Vec::new(),
            player: PlayerParams::default(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    /// Load configuration from INI text. Relative paths resolve against the
    /// current directory.
    pub fn load_from_str(&mut self, text: &str) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .read(text.to_string())
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        self.apply(&config);
        Ok(())
    }

    fn apply(&mut self, config: &Ini) {
        // [graphics] section
        if let Some(resolution) = config.get("graphics", "resolution") {
            match parse_resolution(&resolution) {
                Some((w, h)) => {
                    self.window_width = w;
                    self.window_height = h;
                }
                None => warn!("Ignoring invalid resolution '{}'", resolution),
            }
        }
        if let Some(fullscreen) = read_value(config.getboolcoerce("graphics", "fullscreen"), "fullscreen") {
            self.fullscreen = fullscreen;
        }
        if let Some(fps) = read_value(config.getuint("graphics", "target_fps"), "target_fps") {
            self.target_fps = fps as u32;
        }
        if let Some(scale) = read_value(config.getfloat("graphics", "scale"), "scale") {
            if scale > 0.0 {
                self.scale = scale as f32;
            } else {
                warn!("Ignoring non-positive scale {}", scale);
            }
        }

        // [map] section
        if let Some(path) = config.get("map", "path").filter(|p| !p.is_empty()) {
            self.map_path = PathBuf::from(path);
        }

        // [background] section
        if let Some(image) = config.get("background", "image").filter(|p| !p.is_empty()) {
            self.background.image = Some(PathBuf::from(image));
        }
        if let Some(speed) = read_value(config.getfloat("background", "scroll_speed"), "scroll_speed") {
            self.background.scroll_speed = speed as f32;
        }
        for (key, slot) in [
            ("x_block_bounds", &mut self.background.x_block_bounds),
            ("y_block_bounds", &mut self.background.y_block_bounds),
        ] {
            if let Some(raw) = config.get("background", key) {
                match parse_bounds(&raw) {
                    Some(bounds) => *slot = bounds,
                    None => warn!("Ignoring invalid {} '{}'", key, raw),
                }
            }
        }

        // [controls] section
        if let Some(section) = config.get_map_ref().get("controls") {
            let mut entries: Vec<_> = section.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (name, raw) in entries {
                let Some(action) = Action::from_name(name) else {
                    warn!("Ignoring [controls] entry '{}': unknown action", name);
                    continue;
                };
                let keys: Vec<String> = raw
                    .as_deref()
                    .unwrap_or_default()
                    .split(',')
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
                    .collect();
                if !keys.is_empty() {
                    self.controls.retain(|(a, _)| *a != action);
                    self.controls.push((action, keys));
                }
            }
        }

        // [player] section
        let player = &mut self.player;
        for (key, slot) in [
            ("acceleration", &mut player.acceleration),
            ("max_velocity", &mut player.max_velocity),
            ("deceleration", &mut player.deceleration),
            ("jump_acceleration", &mut player.jump_acceleration),
            ("jump_hold_force", &mut player.jump_hold_force),
            ("jump_time_max", &mut player.jump_time_max),
            ("gravity", &mut player.gravity),
            ("descend_time", &mut player.descend_time),
        ] {
            if let Some(value) = read_value(config.getfloat("player", key), key) {
                *slot = value as f32;
            }
        }

        info!(
            "Loaded config: {}x{} window, fps={}, fullscreen={}, scale={}, map={}",
            self.window_width,
            self.window_height,
            self.target_fps,
            self.fullscreen,
            self.scale,
            self.map_path.display()
        );
    }

    /// Override the level to load.
    pub fn set_map_path(&mut self, path: impl AsRef<Path>) {
        self.map_path = path.as_ref().to_path_buf();
    }

    /// Get the window size.
    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

/// Unwrap a typed configparser lookup, logging values of the wrong type.
fn read_value<T>(result: Result<Option<T>, String>, key: &str) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring invalid value for '{}': {}", key, e);
            None
        }
    }
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_resolution(raw: &str) -> Option<(u32, u32)> {
    let (w, h) = raw.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

/// Parse a `start, end` pair of tile indices.
pub fn parse_bounds(raw: &str) -> Option<(i32, i32)> {
    let (a, b) = raw.split_once(',')?;
    let a: i32 = a.trim().parse().ok()?;
    let b: i32 = b.trim().parse().ok()?;
    (a <= b).then_some((a, b))
}
