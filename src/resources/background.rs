//! Scrolling background.
//!
//! A single background image is tiled across a block range of the level into
//! one composed texture at load time. [`BackgroundScroll`] holds the vertical
//! scroll offset advanced each frame by
//! [`background_scroll`](crate::systems::background::background_scroll).

use std::path::{Path, PathBuf};

use bevy_ecs::prelude::Resource;
use log::info;
use raylib::prelude::*;
use thiserror::Error;

use crate::resources::gameconfig::BackgroundConfig;
use crate::resources::tilecatalog::TileMetrics;

/// Rate at which `scroll_speed` is expressed (pixels per frame at 60 Hz).
pub const REFERENCE_FPS: f32 = 60.0;

#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("background image not found: {}", .0.display())]
    MissingImage(PathBuf),
    #[error("failed to load background image {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("background image {} has zero size", .0.display())]
    EmptyImage(PathBuf),
}

/// Scroll state of the background.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct BackgroundScroll {
    pub y_offset: f32,
    /// Pixels per 60 Hz frame.
    pub scroll_speed: f32,
    /// Height of the source image; the offset wraps past it.
    pub image_height: f32,
    /// Top-left corner of the composed texture in level pixels.
    pub origin: Vector2,
}

impl BackgroundScroll {
    pub fn new(scroll_speed: f32, image_height: f32, origin: Vector2) -> Self {
        Self {
            y_offset: 0.0,
            scroll_speed,
            image_height,
            origin,
        }
    }

    /// Move the offset by `scroll_speed` per reference frame, wrapping to 0
    /// once it passes the image height.
    pub fn advance(&mut self, dt: f32) {
        self.y_offset += self.scroll_speed * dt * REFERENCE_FPS;
        if self.y_offset > self.image_height {
            self.y_offset = 0.0;
        }
    }

    /// Where to draw the composed texture this frame.
    pub fn draw_position(&self) -> Vector2 {
        Vector2::new(self.origin.x, self.origin.y + self.y_offset)
    }
}

/// Composed background texture.
#[derive(Resource)]
pub struct BackgroundTexture(pub Texture2D);

/// Pixel size of the composed background and the top-left corner of every
/// copy of the source image inside it.
///
/// The block bounds are in level tiles; copies of the `image_w` x `image_h`
/// image are laid out edge to edge starting at the composed origin.
pub fn layout(
    x_bounds: (i32, i32),
    y_bounds: (i32, i32),
    metrics: TileMetrics,
    image_w: i32,
    image_h: i32,
) -> ((i32, i32), Vec<(i32, i32)>) {
    let width = (x_bounds.1 - x_bounds.0).max(0) * metrics.tile_width as i32;
    let height = (y_bounds.1 - y_bounds.0).max(0) * metrics.tile_height as i32;
    let mut blits = Vec::new();
    if image_w <= 0 || image_h <= 0 {
        return ((width, height), blits);
    }
    for x in (0..width).step_by(image_w as usize) {
        for y in (0..height).step_by(image_h as usize) {
            blits.push((x, y));
        }
    }
    ((width, height), blits)
}

/// Load and compose the background described by `config`.
///
/// Returns `Ok(None)` when no image is configured.
pub fn load_background(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    config: &BackgroundConfig,
    metrics: TileMetrics,
) -> Result<Option<(BackgroundScroll, BackgroundTexture)>, BackgroundError> {
    let Some(path) = config.image.as_deref() else {
        return Ok(None);
    };
    let source = load_image(path)?;
    let (image_w, image_h) = (source.width(), source.height());
    if image_w <= 0 || image_h <= 0 {
        return Err(BackgroundError::EmptyImage(path.to_path_buf()));
    }

    let ((width, height), blits) = layout(
        config.x_block_bounds,
        config.y_block_bounds,
        metrics,
        image_w,
        image_h,
    );
    // An empty block range still shows a single copy.
    let (width, height) = if blits.is_empty() {
        (image_w, image_h)
    } else {
        (width, height)
    };
    let mut composed = Image::gen_image_color(width, height, Color::BLANK);
    let src_rec = Rectangle::new(0.0, 0.0, image_w as f32, image_h as f32);
    for (x, y) in blits.iter().copied().chain(blits.is_empty().then_some((0, 0))) {
        let dst_rec = Rectangle::new(x as f32, y as f32, image_w as f32, image_h as f32);
        composed.draw(&source, src_rec, dst_rec, Color::WHITE);
    }

    let texture = rl
        .load_texture_from_image(thread, &composed)
        .map_err(|e| BackgroundError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let origin = Vector2::new(
        (config.x_block_bounds.0 * metrics.tile_width as i32) as f32,
        (config.y_block_bounds.0 * metrics.tile_height as i32) as f32,
    );
    info!(
        "Background {} composed to {}x{} px ({} copies)",
        path.display(),
        width,
        height,
        blits.len().max(1)
    );
    Ok(Some((
        BackgroundScroll::new(config.scroll_speed, image_h as f32, origin),
        BackgroundTexture(texture),
    )))
}

fn load_image(path: &Path) -> Result<Image, BackgroundError> {
    if !path.exists() {
        return Err(BackgroundError::MissingImage(path.to_path_buf()));
    }
    let name = path.to_string_lossy();
    Image::load_image(&name).map_err(|e| BackgroundError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
