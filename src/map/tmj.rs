//! TMJ (JSON) map and TSJ tileset parser.
//!
//! The JSON export mirrors the XML structure closely; these serde types keep
//! only the fields the game reads and convert into the shared raw types.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use super::{
    MapError, Properties, PropertyValue, RawFrame, RawImage, RawLayer, RawMap, RawTile,
    RawTileset, CSV_HINT, base_dir, clean_gid, read_file,
};

#[derive(Debug, Deserialize)]
struct JsonMap {
    width: u32,
    height: u32,
    tilewidth: u32,
    tileheight: u32,
    #[serde(default)]
    tilesets: Vec<JsonTileset>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

#[derive(Debug, Deserialize)]
struct JsonTileset {
    #[serde(default)]
    firstgid: u32,
    /// External tileset reference; every other field is then absent.
    source: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    tilewidth: u32,
    #[serde(default)]
    tileheight: u32,
    #[serde(default)]
    tilecount: u32,
    #[serde(default)]
    columns: u32,
    #[serde(default)]
    spacing: u32,
    #[serde(default)]
    margin: u32,
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
    #[serde(default)]
    tiles: Vec<JsonTile>,
}

#[derive(Debug, Deserialize)]
struct JsonTile {
    id: u32,
    #[serde(rename = "type")]
    tile_type: Option<String>,
    class: Option<String>,
    #[serde(default)]
    properties: Vec<JsonProperty>,
    #[serde(default)]
    animation: Vec<JsonFrame>,
    image: Option<String>,
    #[serde(default)]
    imagewidth: u32,
    #[serde(default)]
    imageheight: u32,
}

#[derive(Debug, Deserialize)]
struct JsonProperty {
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    value: Value,
}

#[derive(Debug, Deserialize)]
struct JsonFrame {
    tileid: u32,
    #[serde(default)]
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct JsonLayer {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    /// An array of gids, or a base64 string when encoded.
    data: Option<Value>,
    encoding: Option<String>,
    #[serde(default)]
    layers: Vec<JsonLayer>,
}

fn default_visible() -> bool {
    true
}

/// Read and parse a `.tmj` file.
pub fn load_map(path: &Path) -> Result<RawMap, MapError> {
    let text = read_file(path)?;
    parse_map(&text, path)
}

/// Parse TMJ text; `path` anchors relative references.
pub fn parse_map(text: &str, path: &Path) -> Result<RawMap, MapError> {
    let json: JsonMap = serde_json::from_str(text).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = base_dir(path);

    let mut tilesets = Vec::with_capacity(json.tilesets.len());
    for tileset in json.tilesets {
        let raw = match tileset.source.clone() {
            Some(source) => {
                let external = dir.join(source);
                let is_xml = external
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("tsx") || e.eq_ignore_ascii_case("xml"));
                if is_xml {
                    super::tmx::load_tileset(&external, tileset.firstgid)?
                } else {
                    load_tileset(&external, tileset.firstgid)?
                }
            }
            None => convert_tileset(tileset.firstgid, tileset, &dir),
        };
        tilesets.push(raw);
    }
    tilesets.sort_by_key(|t| t.first_gid);

    let mut layers = Vec::new();
    for layer in json.layers {
        collect_layers(path, layer, true, &mut layers)?;
    }

    Ok(RawMap {
        width: json.width,
        height: json.height,
        tile_width: json.tilewidth,
        tile_height: json.tileheight,
        tilesets,
        layers,
    })
}

/// Read an external `.tsj` tileset.
pub fn load_tileset(path: &Path, first_gid: u32) -> Result<RawTileset, MapError> {
    let text = read_file(path)?;
    let json: JsonTileset = serde_json::from_str(&text).map_err(|source| MapError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(convert_tileset(first_gid, json, &base_dir(path)))
}

fn convert_image(dir: &Path, source: Option<String>, width: u32, height: u32) -> Option<RawImage> {
    source.map(|source| RawImage {
        source: dir.join(source),
        width,
        height,
    })
}

fn convert_tileset(first_gid: u32, json: JsonTileset, dir: &Path) -> RawTileset {
    let mut tileset = RawTileset {
        first_gid,
        name: json.name,
        tile_width: json.tilewidth,
        tile_height: json.tileheight,
        tile_count: json.tilecount,
        columns: json.columns,
        spacing: json.spacing,
        margin: json.margin,
        image: convert_image(dir, json.image, json.imagewidth, json.imageheight),
        tiles: json
            .tiles
            .into_iter()
            .map(|tile| convert_tile(tile, dir))
            .collect(),
    };
    tileset.sort_tiles();
    tileset
}

fn convert_tile(json: JsonTile, dir: &Path) -> RawTile {
    let mut properties = Properties::default();
    for property in json.properties {
        let value = match (&property.value, property.kind.as_deref()) {
            (Value::Bool(b), _) => PropertyValue::Bool(*b),
            (Value::Number(n), Some("float")) => PropertyValue::Float(n.as_f64().unwrap_or(0.0)),
            (Value::Number(n), _) => match n.as_i64() {
                Some(i) => PropertyValue::Int(i),
                None => PropertyValue::Float(n.as_f64().unwrap_or(0.0)),
            },
            (Value::String(s), kind) => PropertyValue::from_typed(kind, s),
            (other, _) => PropertyValue::Str(other.to_string()),
        };
        properties.insert(property.name, value);
    }
    RawTile {
        id: json.id,
        tile_type: json.tile_type.or(json.class).filter(|t| !t.is_empty()),
        properties,
        animation: json
            .animation
            .iter()
            .map(|f| RawFrame {
                tile_id: f.tileid,
                duration_ms: f.duration,
            })
            .collect(),
        image: convert_image(dir, json.image, json.imagewidth, json.imageheight),
    }
}

fn collect_layers(
    path: &Path,
    layer: JsonLayer,
    parent_visible: bool,
    out: &mut Vec<RawLayer>,
) -> Result<(), MapError> {
    let visible = parent_visible && layer.visible;
    match layer.kind.as_str() {
        "group" => {
            for child in layer.layers {
                collect_layers(path, child, visible, out)?;
            }
            Ok(())
        }
        "tilelayer" => {
            let gids = layer_gids(path, &layer)?;
            if gids.len() != (layer.width * layer.height) as usize {
                return Err(MapError::InvalidValue {
                    path: path.to_path_buf(),
                    attribute: "data".to_string(),
                    value: format!(
                        "{} cells for a {}x{} layer",
                        gids.len(),
                        layer.width,
                        layer.height
                    ),
                });
            }
            out.push(RawLayer {
                name: layer.name,
                visible,
                width: layer.width,
                height: layer.height,
                gids,
            });
            Ok(())
        }
        // object and image layers carry no tile cells
        _ => Ok(()),
    }
}

fn layer_gids(path: &Path, layer: &JsonLayer) -> Result<Vec<u32>, MapError> {
    let unsupported = |detail: String| MapError::UnsupportedData {
        path: PathBuf::from(path),
        detail,
    };
    if let Some(encoding) = layer.encoding.as_deref().filter(|e| *e != "csv") {
        return Err(unsupported(format!("encoding '{encoding}'; {CSV_HINT}")));
    }
    match &layer.data {
        None => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|g| u32::try_from(g).ok())
                    .map(clean_gid)
                    .ok_or_else(|| MapError::InvalidValue {
                        path: path.to_path_buf(),
                        attribute: "data".to_string(),
                        value: v.to_string(),
                    })
            })
            .collect(),
        Some(_) => Err(unsupported("non-array layer data".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL_MAP: &str = r#"{
  "width": 3, "height": 2, "tilewidth": 16, "tileheight": 16,
  "tilesets": [{
    "firstgid": 1, "name": "world", "tilewidth": 16, "tileheight": 16,
    "tilecount": 4, "columns": 2, "image": "world.png", "imagewidth": 32, "imageheight": 32,
    "tiles": [
      {"id": 3, "type": "Platform_wood", "properties": [
        {"name": "collidableVertical", "type": "bool", "value": true},
        {"name": "canDescend", "type": "bool", "value": true}
      ]},
      {"id": 1, "class": "Item_gem", "animation": [
        {"tileid": 1, "duration": 80}, {"tileid": 2, "duration": 80}
      ]}
    ]
  }],
  "layers": [
    {"type": "tilelayer", "name": "main", "width": 3, "height": 2, "visible": true,
     "data": [2, 0, 0, 4, 4, 2147483652]},
    {"type": "objectgroup", "name": "objects"},
    {"type": "group", "name": "g", "visible": false, "layers": [
      {"type": "tilelayer", "name": "hidden", "width": 3, "height": 2, "data": [0,0,0,0,0,0]}
    ]}
  ]
}"#;

    #[test]
    fn test_parse_json_map() {
        let map = parse_map(SMALL_MAP, Path::new("maps/level.tmj")).unwrap();
        assert_eq!((map.width, map.height, map.tile_width), (3, 2, 16));
        let ts = &map.tilesets[0];
        assert_eq!(ts.tiles[0].id, 1);
        assert_eq!(ts.tiles[0].tile_type.as_deref(), Some("Item_gem"));
        assert_eq!(ts.tiles[0].animation[0].duration_ms, 80);
        let platform = ts.tile(3).unwrap();
        assert!(platform.properties.get_bool("canDescend"));
        assert!(!platform.properties.get_bool("collidable"));
        assert_eq!(
            ts.image.as_ref().unwrap().source,
            Path::new("maps").join("world.png")
        );
    }

    #[test]
    fn test_json_layers_flatten_groups_and_skip_objects() {
        let map = parse_map(SMALL_MAP, Path::new("level.tmj")).unwrap();
        assert_eq!(map.layers.len(), 2);
        assert_eq!(map.layers[0].gids, vec![2, 0, 0, 4, 4, 4]);
        assert!(!map.layers[1].visible);
    }

    #[test]
    fn test_json_base64_rejected() {
        let text = r#"{"width":1,"height":1,"tilewidth":8,"tileheight":8,
            "layers":[{"type":"tilelayer","width":1,"height":1,"encoding":"base64","data":"AQAAAA=="}]}"#;
        let err = parse_map(text, Path::new("b.tmj")).unwrap_err();
        assert!(matches!(err, MapError::UnsupportedData { .. }));
        assert!(err.to_string().contains("CSV"), "{err}");
    }

    #[test]
    fn test_json_malformed() {
        let err = parse_map("{ not json", Path::new("x.tmj")).unwrap_err();
        assert!(matches!(err, MapError::Json { .. }));
    }
}
