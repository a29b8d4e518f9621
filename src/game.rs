//! Level setup.
//!
//! Turns a loaded map into ECS state: one [`TileSet`] entity per collection
//! (terrain, platforms, items), the player entity with its animation tracks,
//! and the texture, background and camera resources the render system reads.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use log::info;
use raylib::prelude::*;
use thiserror::Error;

use crate::components::boxcollider::BoxCollider;
use crate::components::player::{PlayerParams, PlayerState};
use crate::components::tileset::{TileCategory, TileSet};
use crate::map::{self, MapError};
use crate::resources::background::{BackgroundError, load_background};
use crate::resources::camera2d::Camera2DRes;
use crate::resources::gameconfig::GameConfig;
use crate::resources::texturestore::TextureStore;
use crate::resources::tilecatalog::TileCatalog;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("the map declares no Player tiles")]
    MissingPlayer,
    #[error("the player has no 'idle' animation track")]
    MissingIdleTrack,
    #[error("no Player tile is placed on the map")]
    NoPlayerPlacement,
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Map(#[from] MapError),
    #[error(transparent)]
    Background(#[from] BackgroundError),
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error("failed to load texture {key}: {reason}")]
    Texture { key: Arc<str>, reason: String },
}

/// Spawn the level collections and the player from a catalog.
///
/// Decoration, terrain, platforms and items each become one entity tagged
/// with their [`TileCategory`].
///
/// The player starts on the first placed Player tile and its collision box
/// is the size of the `idle` track. Inserts the catalog's
/// [`TileMetrics`](crate::resources::tilecatalog::TileMetrics) resource.
pub fn spawn_level(
    world: &mut World,
    mut catalog: TileCatalog,
    params: PlayerParams,
) -> Result<Entity, SpawnError> {
    let metrics = catalog.metrics();
    let tracks = TileSet::new(catalog.take(TileCategory::Player));
    if tracks.is_empty() {
        return Err(SpawnError::MissingPlayer);
    }
    let idle = tracks
        .animation("idle")
        .ok_or(SpawnError::MissingIdleTrack)?;
    let (width, height) = idle.size_in_tiles(&metrics);
    let start = idle
        .positions
        .first()
        .copied()
        .or_else(|| tracks.iter().find_map(|t| t.positions.first().copied()))
        .ok_or(SpawnError::NoPlayerPlacement)?;

    for category in [
        TileCategory::Decoration,
        TileCategory::Terrain,
        TileCategory::Platform,
        TileCategory::Item,
    ] {
        let tiles = catalog.take(category);
        if !tiles.is_empty() {
            world.spawn((TileSet::new(tiles), category));
        }
    }

    info!(
        "Player spawned at ({}, {}) with {} animation track(s)",
        start.x,
        start.y,
        tracks.tiles.len()
    );
    let player = world
        .spawn((
            PlayerState::at(start.x as f32, start.y as f32),
            params,
            BoxCollider::new(width, height),
            tracks,
            TileCategory::Player,
        ))
        .id();
    world.insert_resource(metrics);
    Ok(player)
}

/// Load every texture referenced by the catalog.
pub fn load_textures(
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    keys: &[Arc<str>],
) -> Result<TextureStore, SetupError> {
    let mut store = TextureStore::default();
    for key in keys {
        let texture = rl
            .load_texture(thread, key)
            .map_err(|e| SetupError::Texture {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        store.insert(key.clone(), texture);
    }
    info!("Loaded {} texture(s)", store.map.len());
    Ok(store)
}

/// Load the configured level into `world`.
pub fn setup(
    world: &mut World,
    rl: &mut RaylibHandle,
    thread: &RaylibThread,
    config: &GameConfig,
) -> Result<Entity, SetupError> {
    let raw = map::load_map(&config.map_path)?;
    let catalog = TileCatalog::build(&raw);
    let metrics = catalog.metrics();

    let textures = load_textures(rl, thread, &catalog.texture_keys())?;
    world.insert_resource(textures);

    if let Some((scroll, texture)) = load_background(rl, thread, &config.background, metrics)? {
        world.insert_resource(scroll);
        world.insert_resource(texture);
    }
    world.insert_resource(Camera2DRes::with_zoom(config.scale));

    Ok(spawn_level(world, catalog, config.player)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{PropertyValue, RawFrame, RawImage, RawLayer, RawMap, RawTile, RawTileset};
    use crate::resources::tilecatalog::TileMetrics;
    use std::path::PathBuf;

    fn map_with(tiles: Vec<RawTile>, gids: Vec<u32>) -> RawMap {
        let mut tileset = RawTileset {
            first_gid: 1,
            name: "t".into(),
            tile_width: 16,
            tile_height: 16,
            tile_count: 8,
            columns: 4,
            image: Some(RawImage {
                source: PathBuf::from("t.png"),
                width: 64,
                height: 32,
            }),
            tiles,
            ..RawTileset::default()
        };
        tileset.sort_tiles();
        RawMap {
            width: 4,
            height: 2,
            tile_width: 16,
            tile_height: 16,
            tilesets: vec![tileset],
            layers: vec![RawLayer {
                name: "main".into(),
                visible: true,
                width: 4,
                height: 2,
                gids,
            }],
        }
    }

    fn typed(id: u32, tile_type: &str, animated: bool) -> RawTile {
        RawTile {
            id,
            tile_type: Some(tile_type.into()),
            animation: if animated {
                vec![RawFrame { tile_id: id, duration_ms: 100 }]
            } else {
                vec![]
            },
            ..RawTile::default()
        }
    }

    #[test]
    fn test_spawn_level_builds_player_and_collections() {
        let mut ground = typed(4, "Terrain_ground", false);
        ground.properties.insert("collidable", PropertyValue::Bool(true));
        let map = map_with(
            vec![typed(0, "Player_idle", true), typed(1, "Player_run", true), ground],
            vec![0, 1, 0, 0, 5, 5, 5, 5],
        );
        let mut world = World::new();
        let player = spawn_level(&mut world, TileCatalog::build(&map), PlayerParams::default())
            .unwrap();

        let state = world.get::<PlayerState>(player).unwrap();
        assert_eq!((state.x, state.y), (1.0, 0.0));
        let collider = world.get::<BoxCollider>(player).unwrap();
        assert_eq!(collider.size, Vector2::new(1.0, 1.0));
        assert_eq!(world.get::<TileSet>(player).unwrap().tiles.len(), 2);
        assert_eq!(*world.resource::<TileMetrics>(), TileMetrics::new(16, 16));

        let mut q = world.query_filtered::<&TileCategory, Without<PlayerState>>();
        let categories: Vec<_> = q.iter(&world).copied().collect();
        assert_eq!(categories, vec![TileCategory::Terrain]);
    }

    #[test]
    fn test_spawn_level_keeps_decoration_apart() {
        let mut ground = typed(4, "Terrain_ground", false);
        ground.properties.insert("collidable", PropertyValue::Bool(true));
        // gid 7 has no tile entry: decoration
        let map = map_with(
            vec![typed(0, "Player_idle", true), ground],
            vec![1, 7, 7, 0, 5, 5, 5, 5],
        );
        let mut world = World::new();
        spawn_level(&mut world, TileCatalog::build(&map), PlayerParams::default()).unwrap();

        let mut q = world.query_filtered::<(&TileSet, &TileCategory), Without<PlayerState>>();
        let mut found: Vec<_> = q
            .iter(&world)
            .map(|(set, c)| (c.name(), set.placements().count()))
            .collect();
        found.sort();
        assert_eq!(found, vec![("Decoration", 2), ("Terrain", 4)]);
    }

    #[test]
    fn test_spawn_level_errors() {
        let mut world = World::new();
        let no_player = map_with(vec![typed(4, "Terrain_ground", false)], vec![5; 8]);
        assert!(matches!(
            spawn_level(&mut world, TileCatalog::build(&no_player), PlayerParams::default()),
            Err(SpawnError::MissingPlayer)
        ));

        let no_idle = map_with(vec![typed(1, "Player_run", true)], vec![2, 0, 0, 0, 0, 0, 0, 0]);
        assert!(matches!(
            spawn_level(&mut world, TileCatalog::build(&no_idle), PlayerParams::default()),
            Err(SpawnError::MissingIdleTrack)
        ));

        let unplaced = map_with(vec![typed(0, "Player_idle", true)], vec![0; 8]);
        assert!(matches!(
            spawn_level(&mut world, TileCatalog::build(&unplaced), PlayerParams::default()),
            Err(SpawnError::NoPlayerPlacement)
        ));
    }
}
