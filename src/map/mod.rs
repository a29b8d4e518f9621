//! Tiled map loading.
//!
//! Maps exported by the [Tiled](https://www.mapeditor.org/) editor are read
//! into a format-neutral [`RawMap`]: tilesets with their per-tile metadata
//! (type, properties, animation frames) and the visible tile layers as
//! row-major grids of global tile ids.
//!
//! Two on-disk formats are supported:
//! - [`tmx`] – the native XML format (`.tmx`, external tilesets as `.tsx`)
//! - [`tmj`] – the JSON export (`.tmj` / `.json`, external tilesets as `.tsj`)
//!
//! The [`TileCatalog`](crate::resources::tilecatalog::TileCatalog) consumes
//! the result; nothing in this module knows about gameplay categories.

pub mod tmj;
pub mod tmx;

use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tiled stores flip/rotation flags in the top four bits of a gid.
pub const GID_FLAGS_MASK: u32 = 0xF000_0000;

/// Appended to errors about layer data only Tiled's CSV format can replace.
pub const CSV_HINT: &str = "re-export the map with Tile Layer Format set to CSV";

/// Strip the flip/rotation flags from a raw gid.
pub fn clean_gid(raw: u32) -> u32 {
    raw & !GID_FLAGS_MASK
}

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed XML in {}: {source}", path.display())]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: <{element}> is missing attribute '{attribute}'", path.display())]
    MissingAttribute {
        path: PathBuf,
        element: String,
        attribute: String,
    },
    #[error("{}: invalid value '{value}' for '{attribute}'", path.display())]
    InvalidValue {
        path: PathBuf,
        attribute: String,
        value: String,
    },
    #[error("{}: unsupported layer data ({detail})", path.display())]
    UnsupportedData { path: PathBuf, detail: String },
    #[error("unsupported map format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Typed custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    /// Build a value from Tiled's `type` tag and its textual value.
    ///
    /// Untyped properties are strings; an unparsable typed value falls back
    /// to its string form.
    pub fn from_typed(kind: Option<&str>, raw: &str) -> Self {
        match kind {
            Some("bool") => match raw {
                "true" | "1" => PropertyValue::Bool(true),
                "false" | "0" => PropertyValue::Bool(false),
                _ => PropertyValue::Str(raw.to_string()),
            },
            Some("int") | Some("object") => raw
                .parse()
                .map(PropertyValue::Int)
                .unwrap_or_else(|_| PropertyValue::Str(raw.to_string())),
            Some("float") => raw
                .parse()
                .map(PropertyValue::Float)
                .unwrap_or_else(|_| PropertyValue::Str(raw.to_string())),
            _ => PropertyValue::Str(raw.to_string()),
        }
    }
}

/// Custom properties attached to a tile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(pub FxHashMap<String, PropertyValue>);

impl Properties {
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Boolean lookup; absent or non-boolean properties read as `false`.
    pub fn get_bool(&self, name: &str) -> bool {
        match self.0.get(name) {
            Some(PropertyValue::Bool(b)) => *b,
            Some(PropertyValue::Int(i)) => *i != 0,
            Some(PropertyValue::Str(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(PropertyValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// An image referenced by a tileset or by a single tile of an image
/// collection. `source` is already resolved against the file that declared it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// One frame of a Tiled tile animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    /// Tileset-local id of the frame's tile.
    pub tile_id: u32,
    pub duration_ms: u32,
}

/// Metadata declared for a single tile inside a tileset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTile {
    pub id: u32,
    /// `type` (Tiled < 1.9) or `class` (Tiled >= 1.9).
    pub tile_type: Option<String>,
    pub properties: Properties,
    pub animation: Vec<RawFrame>,
    /// Only present for image-collection tilesets.
    pub image: Option<RawImage>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub spacing: u32,
    pub margin: u32,
    pub image: Option<RawImage>,
    /// Sorted by id.
    pub tiles: Vec<RawTile>,
}

impl RawTileset {
    pub fn tile(&self, id: u32) -> Option<&RawTile> {
        self.tiles
            .binary_search_by_key(&id, |t| t.id)
            .ok()
            .map(|i| &self.tiles[i])
    }

    pub(crate) fn sort_tiles(&mut self) {
        self.tiles.sort_by_key(|t| t.id);
    }
}

/// A tile layer flattened to row-major gids (0 = empty cell).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLayer {
    pub name: String,
    pub visible: bool,
    pub width: u32,
    pub height: u32,
    pub gids: Vec<u32>,
}

impl RawLayer {
    /// Non-empty cells as `(x, y, gid)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        let width = self.width.max(1);
        self.gids
            .iter()
            .enumerate()
            .filter(|(_, gid)| **gid != 0)
            .map(move |(i, gid)| (i as u32 % width, i as u32 / width, *gid))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMap {
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Tile width in pixels.
    pub tile_width: u32,
    /// Tile height in pixels.
    pub tile_height: u32,
    pub tilesets: Vec<RawTileset>,
    pub layers: Vec<RawLayer>,
}

impl RawMap {
    /// Layers that contribute cells to the level.
    pub fn visible_layers(&self) -> impl Iterator<Item = &RawLayer> {
        self.layers.iter().filter(|l| l.visible)
    }
}

/// Load a map from disk, picking the parser from the file extension.
pub fn load_map(path: impl AsRef<Path>) -> Result<RawMap, MapError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let map = match extension.as_deref() {
        Some("tmx") | Some("xml") => tmx::load_map(path)?,
        Some("tmj") | Some("json") => tmj::load_map(path)?,
        _ => return Err(MapError::UnsupportedFormat(path.to_path_buf())),
    };
    log::info!(
        "Loaded map {} ({}x{} tiles of {}x{} px, {} tileset(s), {} layer(s))",
        path.display(),
        map.width,
        map.height,
        map.tile_width,
        map.tile_height,
        map.tilesets.len(),
        map.layers.len()
    );
    Ok(map)
}

pub(crate) fn read_file(path: &Path) -> Result<String, MapError> {
    std::fs::read_to_string(path).map_err(|source| MapError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory against which relative references in `path` resolve.
pub(crate) fn base_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

/// Parse Tiled's CSV layer payload.
pub(crate) fn parse_csv(path: &Path, text: &str) -> Result<Vec<u32>, MapError> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map(clean_gid)
                .map_err(|_| MapError::InvalidValue {
                    path: path.to_path_buf(),
                    attribute: "data".to_string(),
                    value: s.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_gid_strips_flip_flags() {
        assert_eq!(clean_gid(0x8000_0005), 5);
        assert_eq!(clean_gid(0x4000_0005), 5);
        assert_eq!(clean_gid(12), 12);
    }

    #[test]
    fn test_parse_csv_handles_newlines() {
        let gids = parse_csv(Path::new("m.tmx"), "\n1,0,2,\n3,0,0\n").unwrap();
        assert_eq!(gids, vec![1, 0, 2, 3, 0, 0]);
    }

    #[test]
    fn test_parse_csv_rejects_garbage() {
        let err = parse_csv(Path::new("m.tmx"), "1,x,2").unwrap_err();
        assert!(matches!(err, MapError::InvalidValue { .. }));
    }

    #[test]
    fn test_layer_cells_skip_empty() {
        let layer = RawLayer {
            name: "ground".into(),
            visible: true,
            width: 3,
            height: 2,
            gids: vec![0, 4, 0, 7, 0, 4],
        };
        let cells: Vec<_> = layer.cells().collect();
        assert_eq!(cells, vec![(1, 0, 4), (0, 1, 7), (2, 1, 4)]);
    }

    #[test]
    fn test_properties_bool_defaults_false() {
        let mut props = Properties::default();
        props.insert("collidable", PropertyValue::Bool(true));
        props.insert("name", PropertyValue::Str("crate".into()));
        assert!(props.get_bool("collidable"));
        assert!(!props.get_bool("canDescend"));
        assert!(!props.get_bool("name"));
    }

    #[test]
    fn test_property_from_typed() {
        assert_eq!(
            PropertyValue::from_typed(Some("bool"), "true"),
            PropertyValue::Bool(true)
        );
        assert_eq!(
            PropertyValue::from_typed(Some("int"), "42"),
            PropertyValue::Int(42)
        );
        assert_eq!(
            PropertyValue::from_typed(Some("float"), "0.5"),
            PropertyValue::Float(0.5)
        );
        assert_eq!(
            PropertyValue::from_typed(None, "hello"),
            PropertyValue::Str("hello".into())
        );
    }

    #[test]
    fn test_load_map_rejects_unknown_extension() {
        let err = load_map("level.png").unwrap_err();
        assert!(matches!(err, MapError::UnsupportedFormat(_)));
    }
}
