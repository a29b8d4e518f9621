//! Tile catalog built from a loaded map.
//!
//! Groups every typed tile of the map by [`TileCategory`], resolving sprite
//! frames (static image or animation frames) and collision flags from the tile
//! properties. Tiles placed several times share one descriptor listing all
//! their grid positions. Placed tiles without a recognized type end up in
//! [`TileCategory::Decoration`] so every visible cell is still drawn.

use std::path::Path;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::{debug, info};
use raylib::prelude::Rectangle;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::components::tileset::{
    DEFAULT_FRAME_DURATION, GridPos, SpriteFrame, TileCategory, TileDescriptor,
};
use crate::map::{RawMap, RawTile, RawTileset};

/// Pixel size of one map tile.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileMetrics {
    pub tile_width: u32,
    pub tile_height: u32,
}

impl TileMetrics {
    pub fn new(tile_width: u32, tile_height: u32) -> Self {
        Self {
            tile_width,
            tile_height,
        }
    }

    /// Convert a pixel size to tile units.
    pub fn to_tiles(&self, width_px: u32, height_px: u32) -> (f32, f32) {
        (
            width_px as f32 / self.tile_width.max(1) as f32,
            height_px as f32 / self.tile_height.max(1) as f32,
        )
    }
}

impl Default for TileMetrics {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

/// Typed tiles of a map grouped by category.
#[derive(Resource, Debug, Default)]
pub struct TileCatalog {
    tiles: FxHashMap<TileCategory, Vec<TileDescriptor>>,
    metrics: TileMetrics,
    /// Map size in tiles.
    map_size: (u32, u32),
}

impl TileCatalog {
    /// Build the catalog from a raw map.
    pub fn build(map: &RawMap) -> Self {
        let mut gid_positions: FxHashMap<u32, Vec<GridPos>> = FxHashMap::default();
        for layer in map.visible_layers() {
            for (x, y, gid) in layer.cells() {
                gid_positions.entry(gid).or_default().push(GridPos::new(x, y));
            }
        }

        let mut tiles: FxHashMap<TileCategory, Vec<TileDescriptor>> = FxHashMap::default();
        let mut typed: FxHashSet<u32> = FxHashSet::default();
        for tileset in &map.tilesets {
            for tile in &tileset.tiles {
                let Some(type_name) = tile.tile_type.as_deref() else {
                    continue;
                };
                let Some((category, animation_name)) = TileCategory::parse_type(type_name) else {
                    debug!("Skipping tile {} with unrecognized type '{}'", tile.id, type_name);
                    continue;
                };
                let gid = tileset.first_gid + tile.id;
                typed.insert(gid);
                let positions = gid_positions.get(&gid).cloned().unwrap_or_default();

                // Player tiles are animation tracks and need not be placed.
                let keep = !positions.is_empty()
                    || (category == TileCategory::Player && !tile.animation.is_empty());
                if !keep {
                    continue;
                }

                let Some(descriptor) = describe_tile(
                    tileset,
                    tile.id,
                    Some(tile),
                    gid,
                    category,
                    animation_name,
                    positions,
                ) else {
                    debug!("Skipping tile {} of '{}': no image", tile.id, tileset.name);
                    continue;
                };
                tiles.entry(category).or_default().push(descriptor);
            }
        }

        let mut untyped: Vec<u32> = gid_positions
            .keys()
            .copied()
            .filter(|gid| !typed.contains(gid))
            .collect();
        untyped.sort_unstable();
        for gid in untyped {
            let Some(tileset) = map.tilesets.iter().rev().find(|t| t.first_gid <= gid) else {
                debug!("Skipping gid {} outside every tileset", gid);
                continue;
            };
            let local_id = gid - tileset.first_gid;
            let positions = gid_positions.remove(&gid).unwrap_or_default();
            match describe_tile(
                tileset,
                local_id,
                tileset.tile(local_id),
                gid,
                TileCategory::Decoration,
                None,
                positions,
            ) {
                Some(descriptor) => tiles
                    .entry(TileCategory::Decoration)
                    .or_default()
                    .push(descriptor.with_collision(false, false).with_descend(false)),
                None => debug!("Skipping gid {} of '{}': no image", gid, tileset.name),
            }
        }

        let catalog = Self {
            tiles,
            metrics: TileMetrics::new(map.tile_width, map.tile_height),
            map_size: (map.width, map.height),
        };
        for category in TileCategory::ALL {
            info!(
                "Catalog: {} {} tile(s)",
                catalog.get(category).len(),
                category.name()
            );
        }
        info!(
            "Catalog: {} decoration tile(s)",
            catalog.get(TileCategory::Decoration).len()
        );
        catalog
    }

    /// Descriptors of a category; empty when the map has none.
    pub fn get(&self, category: TileCategory) -> &[TileDescriptor] {
        self.tiles.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Hand the descriptors of a category over to a new owner.
    pub fn take(&mut self, category: TileCategory) -> Vec<TileDescriptor> {
        self.tiles.remove(&category).unwrap_or_default()
    }

    pub fn metrics(&self) -> TileMetrics {
        self.metrics
    }

    pub fn map_size(&self) -> (u32, u32) {
        self.map_size
    }

    /// Every texture referenced by a frame of any descriptor.
    pub fn texture_keys(&self) -> Vec<Arc<str>> {
        let mut keys: Vec<Arc<str>> = self
            .tiles
            .values()
            .flatten()
            .flat_map(|t| t.frames.iter().map(|f| f.tex_key.clone()))
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

fn describe_tile(
    tileset: &RawTileset,
    local_id: u32,
    tile: Option<&RawTile>,
    gid: u32,
    category: TileCategory,
    animation_name: Option<String>,
    positions: Vec<GridPos>,
) -> Option<TileDescriptor> {
    let (width, height) = match tile.and_then(|t| t.image.as_ref()) {
        Some(image) => (image.width, image.height),
        None => (tileset.tile_width, tileset.tile_height),
    };
    let flag = |name: &str| tile.is_some_and(|t| t.properties.get_bool(name));

    let mut descriptor = TileDescriptor::new(gid, category, width, height)
        .with_positions(positions)
        .with_collision(
            flag("collidable") || flag("collidableHorizontal"),
            flag("collidable") || flag("collidableVertical"),
        )
        .with_descend(flag("canDescend"));
    descriptor.animation_name = animation_name;

    let animation = tile.map(|t| t.animation.as_slice()).unwrap_or_default();
    if animation.is_empty() {
        descriptor = descriptor.with_frame(frame_source(tileset, local_id, DEFAULT_FRAME_DURATION)?);
    } else {
        for frame in animation {
            let duration = frame.duration_ms as f32 / 1000.0;
            descriptor = descriptor.with_frame(frame_source(tileset, frame.tile_id, duration)?);
        }
    }
    Some(descriptor)
}

/// Locate the image of a tileset-local tile id.
fn frame_source(tileset: &RawTileset, tile_id: u32, duration: f32) -> Option<SpriteFrame> {
    if let Some(image) = tileset.tile(tile_id).and_then(|t| t.image.as_ref()) {
        return Some(SpriteFrame::new(
            texture_key(&image.source),
            Rectangle::new(0.0, 0.0, image.width as f32, image.height as f32),
            duration,
        ));
    }
    let image = tileset.image.as_ref()?;
    let columns = if tileset.columns > 0 {
        tileset.columns
    } else {
        ((image.width.saturating_sub(tileset.margin) + tileset.spacing)
            / (tileset.tile_width + tileset.spacing).max(1))
        .max(1)
    };
    let col = tile_id % columns;
    let row = tile_id / columns;
    let x = tileset.margin + col * (tileset.tile_width + tileset.spacing);
    let y = tileset.margin + row * (tileset.tile_height + tileset.spacing);
    Some(SpriteFrame::new(
        texture_key(&image.source),
        Rectangle::new(
            x as f32,
            y as f32,
            tileset.tile_width as f32,
            tileset.tile_height as f32,
        ),
        duration,
    ))
}

fn texture_key(path: &Path) -> Arc<str> {
    Arc::from(path.to_string_lossy().as_ref())
}
