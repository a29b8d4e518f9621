//! TMX (XML) map and TSX tileset parser built on `roxmltree`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};

use super::{
    MapError, Properties, PropertyValue, RawFrame, RawImage, RawLayer, RawMap, RawTile,
    RawTileset, CSV_HINT, base_dir, clean_gid, parse_csv, read_file,
};

/// Read and parse a `.tmx` file.
pub fn load_map(path: &Path) -> Result<RawMap, MapError> {
    let text = read_file(path)?;
    parse_map(&text, path)
}

/// Parse TMX text. `path` locates the document: relative tileset and image
/// references resolve against its directory.
pub fn parse_map(text: &str, path: &Path) -> Result<RawMap, MapError> {
    let doc = Document::parse(text).map_err(|source| MapError::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    let root = doc.root_element();
    let ctx = Ctx::new(path);
    ctx.expect_tag(root, "map")?;

    let mut map = RawMap {
        width: ctx.required(root, "width")?,
        height: ctx.required(root, "height")?,
        tile_width: ctx.required(root, "tilewidth")?,
        tile_height: ctx.required(root, "tileheight")?,
        tilesets: Vec::new(),
        layers: Vec::new(),
    };

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "tileset" => map.tilesets.push(ctx.tileset_ref(child)?),
            "layer" | "group" => ctx.collect_layers(child, true, &mut map.layers)?,
            _ => {}
        }
    }
    map.tilesets.sort_by_key(|t| t.first_gid);
    Ok(map)
}

/// Read an external `.tsx` tileset referenced with `firstgid`.
pub fn load_tileset(path: &Path, first_gid: u32) -> Result<RawTileset, MapError> {
    let text = read_file(path)?;
    let doc = Document::parse(&text).map_err(|source| MapError::Xml {
        path: path.to_path_buf(),
        source,
    })?;
    let ctx = Ctx::new(path);
    let root = doc.root_element();
    ctx.expect_tag(root, "tileset")?;
    ctx.tileset(root, first_gid)
}

struct Ctx<'p> {
    path: &'p Path,
    dir: PathBuf,
}

impl<'p> Ctx<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            path,
            dir: base_dir(path),
        }
    }

    fn expect_tag(&self, node: Node, tag: &str) -> Result<(), MapError> {
        if node.has_tag_name(tag) {
            Ok(())
        } else {
            Err(MapError::InvalidValue {
                path: self.path.to_path_buf(),
                attribute: "root element".to_string(),
                value: node.tag_name().name().to_string(),
            })
        }
    }

    fn parse<T: FromStr>(&self, attribute: &str, raw: &str) -> Result<T, MapError> {
        raw.trim().parse().map_err(|_| MapError::InvalidValue {
            path: self.path.to_path_buf(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        })
    }

    fn required<T: FromStr>(&self, node: Node, attribute: &str) -> Result<T, MapError> {
        let raw = node
            .attribute(attribute)
            .ok_or_else(|| MapError::MissingAttribute {
                path: self.path.to_path_buf(),
                element: node.tag_name().name().to_string(),
                attribute: attribute.to_string(),
            })?;
        self.parse(attribute, raw)
    }

    fn optional<T: FromStr>(&self, node: Node, attribute: &str, default: T) -> Result<T, MapError> {
        match node.attribute(attribute) {
            Some(raw) => self.parse(attribute, raw),
            None => Ok(default),
        }
    }

    fn tileset_ref(&self, node: Node) -> Result<RawTileset, MapError> {
        let first_gid: u32 = self.required(node, "firstgid")?;
        match node.attribute("source") {
            Some(source) => {
                let external = self.dir.join(source);
                let is_json = external
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("tsj") || e.eq_ignore_ascii_case("json"));
                if is_json {
                    super::tmj::load_tileset(&external, first_gid)
                } else {
                    load_tileset(&external, first_gid)
                }
            }
            None => self.tileset(node, first_gid),
        }
    }

    fn tileset(&self, node: Node, first_gid: u32) -> Result<RawTileset, MapError> {
        let mut tileset = RawTileset {
            first_gid,
            name: node.attribute("name").unwrap_or_default().to_string(),
            tile_width: self.required(node, "tilewidth")?,
            tile_height: self.required(node, "tileheight")?,
            tile_count: self.optional(node, "tilecount", 0)?,
            columns: self.optional(node, "columns", 0)?,
            spacing: self.optional(node, "spacing", 0)?,
            margin: self.optional(node, "margin", 0)?,
            image: None,
            tiles: Vec::new(),
        };
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "image" => tileset.image = Some(self.image(child)?),
                "tile" => tileset.tiles.push(self.tile(child)?),
                _ => {}
            }
        }
        tileset.sort_tiles();
        Ok(tileset)
    }

    fn image(&self, node: Node) -> Result<RawImage, MapError> {
        let source: String = self.required(node, "source")?;
        Ok(RawImage {
            source: self.dir.join(source),
            width: self.optional(node, "width", 0)?,
            height: self.optional(node, "height", 0)?,
        })
    }

    fn tile(&self, node: Node) -> Result<RawTile, MapError> {
        let tile_type = node
            .attribute("type")
            .or_else(|| node.attribute("class"))
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        let mut tile = RawTile {
            id: self.required(node, "id")?,
            tile_type,
            ..RawTile::default()
        };
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "properties" => tile.properties = self.properties(child)?,
                "animation" => {
                    for frame in child.children().filter(|n| n.has_tag_name("frame")) {
                        tile.animation.push(RawFrame {
                            tile_id: self.required(frame, "tileid")?,
                            duration_ms: self.optional(frame, "duration", 0)?,
                        });
                    }
                }
                "image" => tile.image = Some(self.image(child)?),
                _ => {}
            }
        }
        Ok(tile)
    }

    fn properties(&self, node: Node) -> Result<Properties, MapError> {
        let mut properties = Properties::default();
        for property in node.children().filter(|n| n.has_tag_name("property")) {
            let name: String = self.required(property, "name")?;
            // Multi-line strings are stored as element text instead of `value`.
            let raw = property
                .attribute("value")
                .or_else(|| property.text())
                .unwrap_or_default();
            properties.insert(
                name,
                PropertyValue::from_typed(property.attribute("type"), raw),
            );
        }
        Ok(properties)
    }

    fn collect_layers(
        &self,
        node: Node,
        parent_visible: bool,
        out: &mut Vec<RawLayer>,
    ) -> Result<(), MapError> {
        let visible = parent_visible && node.attribute("visible") != Some("0");
        if node.has_tag_name("group") {
            for child in node.children().filter(Node::is_element) {
                if child.has_tag_name("layer") || child.has_tag_name("group") {
                    self.collect_layers(child, visible, out)?;
                }
            }
            return Ok(());
        }

        let width: u32 = self.required(node, "width")?;
        let height: u32 = self.required(node, "height")?;
        let gids = match node.children().find(|n| n.has_tag_name("data")) {
            Some(data) => self.layer_data(data)?,
            None => Vec::new(),
        };
        if gids.len() != (width * height) as usize {
            return Err(MapError::InvalidValue {
                path: self.path.to_path_buf(),
                attribute: "data".to_string(),
                value: format!("{} cells for a {}x{} layer", gids.len(), width, height),
            });
        }
        out.push(RawLayer {
            name: node.attribute("name").unwrap_or_default().to_string(),
            visible,
            width,
            height,
            gids,
        });
        Ok(())
    }

    fn layer_data(&self, data: Node) -> Result<Vec<u32>, MapError> {
        if data.children().any(|n| n.has_tag_name("chunk")) {
            return Err(self.unsupported("infinite map chunks"));
        }
        if let Some(compression) = data.attribute("compression") {
            return Err(self.unsupported(&format!("compression '{compression}'; {CSV_HINT}")));
        }
        match data.attribute("encoding") {
            Some("csv") => parse_csv(self.path, data.text().unwrap_or_default()),
            None => data
                .children()
                .filter(|n| n.has_tag_name("tile"))
                .map(|tile| self.optional::<u32>(tile, "gid", 0).map(clean_gid))
                .collect(),
            Some(other) => Err(self.unsupported(&format!("encoding '{other}'; {CSV_HINT}"))),
        }
    }

    fn unsupported(&self, detail: &str) -> MapError {
        MapError::UnsupportedData {
            path: self.path.to_path_buf(),
            detail: detail.to_string(),
        }
    }
}
