//! Map loading integration tests: levels written to disk in both Tiled
//! formats, loaded through `map::load_map`, catalogued, and spawned.

use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;

use tilehop::components::player::{PlayerParams, PlayerState};
use tilehop::components::tileset::{TileCategory, TileSet};
use tilehop::game::spawn_level;
use tilehop::map::{MapError, load_map};
use tilehop::resources::tilecatalog::{TileCatalog, TileMetrics};

const TSX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="world" tilewidth="16" tileheight="16" tilecount="8" columns="4">
 <image source="world.png" width="64" height="32"/>
 <tile id="0" type="Player_idle">
  <animation><frame tileid="0" duration="150"/><frame tileid="1" duration="150"/></animation>
 </tile>
 <tile id="2" type="Player_run">
  <animation><frame tileid="2" duration="80"/><frame tileid="3" duration="80"/></animation>
 </tile>
 <tile id="4" type="Terrain_ground">
  <properties><property name="collidable" type="bool" value="true"/></properties>
 </tile>
 <tile id="5" type="Platform_wood">
  <properties>
   <property name="collidableVertical" type="bool" value="true"/>
   <property name="canDescend" type="bool" value="true"/>
  </properties>
 </tile>
 <tile id="6" type="Item_gem"/>
</tileset>
"#;

const TSJ: &str = r#"{
 "name": "world", "tilewidth": 16, "tileheight": 16, "tilecount": 8, "columns": 4,
 "image": "world.png", "imagewidth": 64, "imageheight": 32,
 "tiles": [
  {"id": 0, "type": "Player_idle",
   "animation": [{"tileid": 0, "duration": 150}, {"tileid": 1, "duration": 150}]},
  {"id": 2, "type": "Player_run",
   "animation": [{"tileid": 2, "duration": 80}, {"tileid": 3, "duration": 80}]},
  {"id": 4, "type": "Terrain_ground",
   "properties": [{"name": "collidable", "type": "bool", "value": true}]},
  {"id": 5, "type": "Platform_wood",
   "properties": [
    {"name": "collidableVertical", "type": "bool", "value": true},
    {"name": "canDescend", "type": "bool", "value": true}]},
  {"id": 6, "type": "Item_gem"}
 ]
}"#;

// 6x4 level: a bare sheet tile, gem and platform above, player on the
// floor, a hidden layer full of terrain that must not count.
const TMX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="6" height="4" tilewidth="16" tileheight="16">
 <tileset firstgid="1" source="world.tsx"/>
 <layer id="1" name="main" width="6" height="4">
  <data encoding="csv">
8,0,0,7,0,0,
0,0,6,6,6,0,
0,1,0,0,0,0,
5,5,5,5,5,5
</data>
 </layer>
 <layer id="2" name="scratch" width="6" height="4" visible="0">
  <data encoding="csv">
5,5,5,5,5,5,
5,5,5,5,5,5,
5,5,5,5,5,5,
5,5,5,5,5,5
</data>
 </layer>
</map>
"#;

const TMJ: &str = r#"{
 "width": 6, "height": 4, "tilewidth": 16, "tileheight": 16,
 "tilesets": [{"firstgid": 1, "source": "world.tsj"}],
 "layers": [
  {"type": "tilelayer", "name": "main", "width": 6, "height": 4,
   "data": [8,0,0,7,0,0, 0,0,6,6,6,0, 0,1,0,0,0,0, 5,5,5,5,5,5]},
  {"type": "tilelayer", "name": "scratch", "width": 6, "height": 4, "visible": false,
   "data": [5,5,5,5,5,5, 5,5,5,5,5,5, 5,5,5,5,5,5, 5,5,5,5,5,5]}
 ]
}"#;

fn write_level(dir: &Path) {
    fs::write(dir.join("world.tsx"), TSX).unwrap();
    fs::write(dir.join("world.tsj"), TSJ).unwrap();
    fs::write(dir.join("level.tmx"), TMX).unwrap();
    fs::write(dir.join("level.tmj"), TMJ).unwrap();
}

/// Comparable view of a catalog category.
fn summary(catalog: &TileCatalog, category: TileCategory) -> Vec<String> {
    let mut rows: Vec<String> = catalog
        .get(category)
        .iter()
        .map(|t| {
            let frames: Vec<String> = t
                .frames
                .iter()
                .map(|f| {
                    format!(
                        "{}@{},{},{},{}/{}",
                        f.tex_key, f.source.x, f.source.y, f.source.width, f.source.height, f.duration
                    )
                })
                .collect();
            format!(
                "{} {:?} {:?} h={} v={} d={} {:?}",
                t.id,
                t.animation_name,
                t.positions,
                t.collidable_horizontal,
                t.collidable_vertical,
                t.can_descend,
                frames
            )
        })
        .collect();
    rows.sort();
    rows
}

#[test]
fn tmx_and_tmj_levels_build_the_same_catalog() {
    let dir = tempfile::tempdir().unwrap();
    write_level(dir.path());

    let from_xml = TileCatalog::build(&load_map(dir.path().join("level.tmx")).unwrap());
    let from_json = TileCatalog::build(&load_map(dir.path().join("level.tmj")).unwrap());

    for category in TileCategory::ALL.into_iter().chain([TileCategory::Decoration]) {
        assert_eq!(
            summary(&from_xml, category),
            summary(&from_json, category),
            "{} differs",
            category.name()
        );
    }
    assert_eq!(from_xml.metrics(), from_json.metrics());
    assert_eq!(from_xml.map_size(), (6, 4));
    assert_eq!(from_xml.texture_keys(), from_json.texture_keys());
    assert_eq!(from_xml.texture_keys().len(), 1);
}

#[test]
fn catalog_reads_categories_and_properties() {
    let dir = tempfile::tempdir().unwrap();
    write_level(dir.path());
    let catalog = TileCatalog::build(&load_map(dir.path().join("level.tmx")).unwrap());

    let terrain = catalog.get(TileCategory::Terrain);
    assert_eq!(terrain.len(), 1);
    assert_eq!(terrain[0].positions.len(), 6, "hidden layer is skipped");
    assert!(terrain[0].collidable_horizontal && terrain[0].collidable_vertical);

    let platform = &catalog.get(TileCategory::Platform)[0];
    assert!(!platform.collidable_horizontal);
    assert!(platform.collidable_vertical && platform.can_descend);
    assert_eq!(platform.positions.len(), 3);

    let gem = &catalog.get(TileCategory::Item)[0];
    assert_eq!(gem.frames.len(), 1);
    assert_eq!(gem.animation_name.as_deref(), Some("gem"));

    let decoration = catalog.get(TileCategory::Decoration);
    assert_eq!(decoration.len(), 1);
    assert_eq!(decoration[0].id, 8);
    assert!(!decoration[0].is_collidable());
    assert_eq!(decoration[0].frames[0].source.x, 48.0);
    assert_eq!(decoration[0].frames[0].source.y, 16.0);

    // run is never placed but animated, so it stays available as a track
    let player = catalog.get(TileCategory::Player);
    assert_eq!(player.len(), 2);
    let run = player
        .iter()
        .find(|t| t.animation_name.as_deref() == Some("run"))
        .unwrap();
    assert!(run.positions.is_empty());
    assert_eq!(run.frames.len(), 2);
    assert!((run.frames[0].duration - 0.08).abs() < 1e-6);
    assert_eq!(run.frames[1].source.x, 48.0);
}

#[test]
fn spawned_level_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_level(dir.path());
    let catalog = TileCatalog::build(&load_map(dir.path().join("level.tmj")).unwrap());

    let mut world = World::new();
    let player = spawn_level(&mut world, catalog, PlayerParams::default()).unwrap();

    let state = world.get::<PlayerState>(player).unwrap();
    assert_eq!((state.x, state.y), (1.0, 2.0));
    assert_eq!(*world.resource::<TileMetrics>(), TileMetrics::new(16, 16));

    let mut q = world.query_filtered::<(&TileSet, &TileCategory), Without<PlayerState>>();
    let mut categories: Vec<_> = q.iter(&world).map(|(_, c)| c.name()).collect();
    categories.sort();
    assert_eq!(categories, vec!["Decoration", "Item", "Platform", "Terrain"]);
}

#[test]
fn load_map_errors() {
    let dir = tempfile::tempdir().unwrap();

    let missing = load_map(dir.path().join("nowhere.tmx"));
    assert!(matches!(missing, Err(MapError::Io { .. })));

    fs::write(dir.path().join("level.txt"), "hello").unwrap();
    let unsupported = load_map(dir.path().join("level.txt"));
    assert!(matches!(unsupported, Err(MapError::UnsupportedFormat(_))));

    fs::write(dir.path().join("broken.tmj"), "{ not json").unwrap();
    let broken = load_map(dir.path().join("broken.tmj"));
    assert!(matches!(broken, Err(MapError::Json { .. })));

    // external tileset that does not exist
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/orphan.tmx"), TMX).unwrap();
    let orphan = load_map(dir.path().join("sub/orphan.tmx"));
    assert!(matches!(orphan, Err(MapError::Io { .. })));
}
