//! Tile descriptors and the entity collections that own them.
//!
//! A [`TileDescriptor`] is one tile definition from the map together with
//! every grid cell it was placed on and its animation state. A [`TileSet`]
//! component owns an ordered list of descriptors sharing update/render
//! behavior: the items, platforms and terrain collections, and the player's
//! own animation tracks.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use raylib::prelude::Rectangle;
use smallvec::SmallVec;

use crate::components::boxcollider::Aabb;
use crate::resources::tilecatalog::TileMetrics;

/// Frame duration used when a frame declares none (or zero).
pub const DEFAULT_FRAME_DURATION: f32 = 0.1;

/// Gameplay category derived from a tile's type string.
///
/// `Decoration` holds placed tiles with no type or an unrecognized one. They
/// are drawn and animated but never collide, and no type string maps to it.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileCategory {
    Player,
    Item,
    Platform,
    Terrain,
    Decoration,
}

impl TileCategory {
    /// Categories a tile type can declare.
    pub const ALL: [TileCategory; 4] = [
        TileCategory::Player,
        TileCategory::Item,
        TileCategory::Platform,
        TileCategory::Terrain,
    ];

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "Player" => Some(TileCategory::Player),
            "Item" => Some(TileCategory::Item),
            "Platform" => Some(TileCategory::Platform),
            "Terrain" => Some(TileCategory::Terrain),
            _ => None,
        }
    }

    /// Split a type string such as `Player_run` into its category and the
    /// lowercased animation name after the first `_`.
    pub fn parse_type(type_name: &str) -> Option<(Self, Option<String>)> {
        let (prefix, suffix) = match type_name.split_once('_') {
            Some((prefix, suffix)) => (prefix, Some(suffix)),
            None => (type_name, None),
        };
        let category = Self::from_prefix(prefix)?;
        let animation = suffix
            .filter(|s| !s.is_empty())
            .map(|s| s.to_lowercase());
        Some((category, animation))
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileCategory::Player => "Player",
            TileCategory::Item => "Item",
            TileCategory::Platform => "Platform",
            TileCategory::Terrain => "Terrain",
            TileCategory::Decoration => "Decoration",
        }
    }
}

/// Grid cell in tile units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: u32,
    pub y: u32,
}

impl GridPos {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A single image of a tile: a region of a loaded texture shown for
/// `duration` seconds.
#[derive(Debug, Clone)]
pub struct SpriteFrame {
    /// Key in [`TextureStore`](crate::resources::texturestore::TextureStore).
    pub tex_key: Arc<str>,
    /// Source rectangle in texture pixels.
    pub source: Rectangle,
    pub duration: f32,
}

impl SpriteFrame {
    pub fn new(tex_key: impl Into<Arc<str>>, source: Rectangle, duration: f32) -> Self {
        Self {
            tex_key: tex_key.into(),
            source,
            duration,
        }
    }
}

/// Playback position inside a frame list.
///
/// `index < frames.len()` holds after every [`FrameState::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    pub index: usize,
    pub timer: f32,
}

impl FrameState {
    /// Accumulate `dt` and step through every frame whose duration elapsed.
    ///
    /// Each frame keeps its own duration, so playback speed does not depend
    /// on how the elapsed time is sliced into ticks.
    pub fn advance(&mut self, frames: &[SpriteFrame], dt: f32) {
        if frames.len() <= 1 {
            self.index = 0;
            self.timer = 0.0;
            return;
        }
        if self.index >= frames.len() {
            self.index = 0;
        }
        self.timer += dt.max(0.0);
        loop {
            let duration = frame_duration(&frames[self.index]);
            if self.timer < duration {
                break;
            }
            self.timer -= duration;
            self.index = (self.index + 1) % frames.len();
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn frame_duration(frame: &SpriteFrame) -> f32 {
    if frame.duration > 0.0 {
        frame.duration
    } else {
        DEFAULT_FRAME_DURATION
    }
}

/// One tile definition, its placements and its animation state.
#[derive(Debug, Clone)]
pub struct TileDescriptor {
    /// Global tile id in the map.
    pub id: u32,
    pub category: TileCategory,
    /// Size in pixels.
    pub width: u32,
    pub height: u32,
    pub positions: Vec<GridPos>,
    pub frames: SmallVec<[SpriteFrame; 4]>,
    pub collidable_horizontal: bool,
    pub collidable_vertical: bool,
    pub can_descend: bool,
    pub animation_name: Option<String>,
    pub frame: FrameState,
}

impl TileDescriptor {
    pub fn new(id: u32, category: TileCategory, width: u32, height: u32) -> Self {
        Self {
            id,
            category,
            width,
            height,
            positions: Vec::new(),
            frames: SmallVec::new(),
            collidable_horizontal: false,
            collidable_vertical: false,
            can_descend: false,
            animation_name: None,
            frame: FrameState::default(),
        }
    }

    pub fn with_positions(mut self, positions: impl IntoIterator<Item = GridPos>) -> Self {
        self.positions.extend(positions);
        self
    }

    pub fn with_frame(mut self, frame: SpriteFrame) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn with_collision(mut self, horizontal: bool, vertical: bool) -> Self {
        self.collidable_horizontal = horizontal;
        self.collidable_vertical = vertical;
        self
    }

    pub fn with_descend(mut self, can_descend: bool) -> Self {
        self.can_descend = can_descend;
        self
    }

    pub fn with_animation_name(mut self, name: impl Into<String>) -> Self {
        self.animation_name = Some(name.into());
        self
    }

    /// Sprite currently shown. Descriptors always carry at least one frame.
    pub fn current_frame(&self) -> &SpriteFrame {
        &self.frames[self.frame.index.min(self.frames.len() - 1)]
    }

    pub fn advance(&mut self, dt: f32) {
        self.frame.advance(&self.frames, dt);
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable_horizontal || self.collidable_vertical || self.can_descend
    }

    /// Size in tile units.
    pub fn size_in_tiles(&self, metrics: &TileMetrics) -> (f32, f32) {
        metrics.to_tiles(self.width, self.height)
    }

    /// World-space box (tile units) of a placement of this tile.
    pub fn bounds_at(&self, pos: GridPos, metrics: &TileMetrics) -> Aabb {
        let (w, h) = self.size_in_tiles(metrics);
        Aabb::new(pos.x as f32, pos.y as f32, w, h)
    }
}

/// Ordered collection of tiles sharing update and render behavior.
#[derive(Component, Debug, Clone, Default)]
pub struct TileSet {
    pub tiles: Vec<TileDescriptor>,
}

impl TileSet {
    pub fn new(tiles: Vec<TileDescriptor>) -> Self {
        Self { tiles }
    }

    /// Advance the animation of every member.
    pub fn update(&mut self, dt: f32) {
        for tile in self.tiles.iter_mut() {
            tile.advance(dt);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileDescriptor> {
        self.tiles.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Tile whose animation name matches `name`.
    pub fn animation(&self, name: &str) -> Option<&TileDescriptor> {
        self.tiles
            .iter()
            .find(|t| t.animation_name.as_deref() == Some(name))
    }

    /// Every `(descriptor, cell)` pair to draw.
    pub fn placements(&self) -> impl Iterator<Item = (&TileDescriptor, GridPos)> {
        self.tiles
            .iter()
            .flat_map(|tile| tile.positions.iter().map(move |pos| (tile, *pos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(durations: &[f32]) -> Vec<SpriteFrame> {
        durations
            .iter()
            .enumerate()
            .map(|(i, d)| {
                SpriteFrame::new(
                    "tiles",
                    Rectangle::new(i as f32 * 16.0, 0.0, 16.0, 16.0),
                    *d,
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_type_prefix_and_animation() {
        assert_eq!(
            TileCategory::parse_type("Player_run"),
            Some((TileCategory::Player, Some("run".to_string())))
        );
        assert_eq!(
            TileCategory::parse_type("Player_Idle"),
            Some((TileCategory::Player, Some("idle".to_string())))
        );
        assert_eq!(
            TileCategory::parse_type("Terrain"),
            Some((TileCategory::Terrain, None))
        );
        assert_eq!(
            TileCategory::parse_type("Item_coin_gold"),
            Some((TileCategory::Item, Some("coin_gold".to_string())))
        );
        assert_eq!(TileCategory::parse_type("Enemy_bat"), None);
        assert_eq!(TileCategory::parse_type("Decoration_flower"), None);
        assert_eq!(TileCategory::parse_type(""), None);
    }

    #[test]
    fn test_frame_advance_on_duration() {
        let frames = frames(&[0.1, 0.1, 0.1]);
        let mut state = FrameState::default();
        state.advance(&frames, 0.05);
        assert_eq!(state.index, 0);
        state.advance(&frames, 0.05);
        assert_eq!(state.index, 1);
        state.advance(&frames, 0.25);
        assert_eq!(state.index, 0, "wraps modulo frame count");
    }

    #[test]
    fn test_frame_speed_independent_of_tick_rate() {
        // 0.9 seconds of playback at 40 Hz and at 160 Hz lands on the same frame.
        let frames = frames(&[0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25]);
        let mut slow = FrameState::default();
        let mut fast = FrameState::default();
        for _ in 0..36 {
            slow.advance(&frames, 1.0 / 40.0);
        }
        for _ in 0..144 {
            fast.advance(&frames, 1.0 / 160.0);
        }
        assert_eq!(slow.index, 3);
        assert_eq!(fast.index, 3);
    }

    #[test]
    fn test_frame_uses_per_frame_duration() {
        let frames = frames(&[0.1, 0.5]);
        let mut state = FrameState::default();
        state.advance(&frames, 0.15);
        assert_eq!(state.index, 1);
        state.advance(&frames, 0.3);
        assert_eq!(state.index, 1, "second frame lasts 0.5s");
        state.advance(&frames, 0.2);
        assert_eq!(state.index, 0);
    }

    #[test]
    fn test_zero_duration_uses_default() {
        let frames = frames(&[0.0, 0.0]);
        let mut state = FrameState::default();
        state.advance(&frames, DEFAULT_FRAME_DURATION * 0.5);
        assert_eq!(state.index, 0);
        state.advance(&frames, DEFAULT_FRAME_DURATION);
        assert_eq!(state.index, 1);
    }

    #[test]
    fn test_single_frame_never_moves() {
        let frames = frames(&[0.1]);
        let mut state = FrameState::default();
        for _ in 0..100 {
            state.advance(&frames, 0.5);
            assert_eq!(state.index, 0);
        }
    }

    #[test]
    fn test_tileset_update_and_lookup() {
        let run = TileDescriptor::new(1, TileCategory::Player, 16, 16)
            .with_animation_name("run")
            .with_frame(frames(&[0.1])[0].clone())
            .with_frame(frames(&[0.1, 0.1])[1].clone());
        let idle = TileDescriptor::new(2, TileCategory::Player, 16, 16)
            .with_animation_name("idle")
            .with_frame(frames(&[0.1])[0].clone());
        let mut set = TileSet::new(vec![run, idle]);
        set.update(0.1);
        assert_eq!(set.animation("run").unwrap().frame.index, 1);
        assert_eq!(set.animation("idle").unwrap().frame.index, 0);
        assert!(set.animation("jump").is_none());
    }

    #[test]
    fn test_placements_and_bounds() {
        let metrics = TileMetrics::new(16, 16);
        let wide = TileDescriptor::new(3, TileCategory::Terrain, 32, 16)
            .with_positions([GridPos::new(2, 5), GridPos::new(4, 5)])
            .with_frame(frames(&[0.1])[0].clone());
        let set = TileSet::new(vec![wide]);
        let cells: Vec<_> = set.placements().map(|(_, p)| p).collect();
        assert_eq!(cells, vec![GridPos::new(2, 5), GridPos::new(4, 5)]);
        let b = set.tiles[0].bounds_at(GridPos::new(2, 5), &metrics);
        assert_eq!(b, Aabb::new(2.0, 5.0, 2.0, 1.0));
    }
}
