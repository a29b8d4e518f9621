use bevy_ecs::prelude::*;
use raylib::prelude::*;

use crate::components::player::{Facing, PlayerState};
use crate::components::tileset::{TileCategory, TileDescriptor, TileSet};
use crate::resources::background::{BackgroundScroll, BackgroundTexture};
use crate::resources::camera2d::Camera2DRes;
use crate::resources::texturestore::TextureStore;
use crate::resources::tilecatalog::TileMetrics;
use crate::systems::player::current_track;

/// Draw order of the collections, back to front.
const DRAW_ORDER: [TileCategory; 4] = [
    TileCategory::Decoration,
    TileCategory::Terrain,
    TileCategory::Platform,
    TileCategory::Item,
];

/// Draw one frame: background, collections, player, FPS counter.
///
/// World positions are in tiles; the camera works in level pixels and its
/// zoom is the configured scale.
#[allow(clippy::too_many_arguments)]
pub fn render_system(
    mut rl: NonSendMut<raylib::RaylibHandle>,
    th: NonSend<raylib::RaylibThread>,
    camera: Res<Camera2DRes>,
    metrics: Res<TileMetrics>,
    textures: Res<TextureStore>,
    background: Option<Res<BackgroundScroll>>,
    background_tex: Option<Res<BackgroundTexture>>,
    collections: Query<(&TileSet, &TileCategory), Without<PlayerState>>,
    players: Query<(&PlayerState, &TileSet)>,
) {
    let (tw, th_px) = (metrics.tile_width as f32, metrics.tile_height as f32);
    let mut d = rl.begin_drawing(&th);
    d.clear_background(Color::BLACK);
    {
        let mut d2 = d.begin_mode2D(camera.0);

        if let (Some(scroll), Some(tex)) = (background, background_tex) {
            let pos = scroll.draw_position();
            d2.draw_texture_v(&tex.0, pos, Color::WHITE);
            d2.draw_texture_v(
                &tex.0,
                Vector2::new(pos.x, pos.y - scroll.image_height),
                Color::WHITE,
            );
        }

        for category in DRAW_ORDER {
            for (set, _) in collections.iter().filter(|(_, c)| **c == category) {
                for (tile, cell) in set.placements() {
                    let dest = Vector2::new(cell.x as f32 * tw, cell.y as f32 * th_px);
                    draw_tile(&mut d2, &textures, tile, dest, false);
                }
            }
        }

        for (state, tracks) in players.iter() {
            if let Some(track) = current_track(state, tracks) {
                let dest = Vector2::new(state.x * tw, state.y * th_px);
                draw_tile(&mut d2, &textures, track, dest, state.facing == Facing::Left);
            }
        }
    }
    d.draw_fps(10, 10);
}

fn draw_tile<D: RaylibDraw>(
    d: &mut D,
    textures: &TextureStore,
    tile: &TileDescriptor,
    dest: Vector2,
    flip_h: bool,
) {
    let frame = tile.current_frame();
    let Some(tex) = textures.get(&frame.tex_key) else {
        return;
    };
    let mut src = frame.source;
    // Negative source width mirrors the sprite horizontally
    if flip_h {
        src.width = -src.width;
    }
    let dest = Rectangle::new(dest.x, dest.y, frame.source.width, frame.source.height);
    d.draw_texture_pro(tex, src, dest, Vector2::zero(), 0.0, Color::WHITE);
}
