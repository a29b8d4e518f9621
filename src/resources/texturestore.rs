use bevy_ecs::prelude::Resource;
use raylib::prelude::Texture2D;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Loaded tile textures keyed by their image path.
#[derive(Resource, Default)]
pub struct TextureStore {
    pub map: FxHashMap<Arc<str>, Texture2D>,
}

impl TextureStore {
    pub fn get(&self, key: &str) -> Option<&Texture2D> {
        self.map.get(key)
    }

    pub fn insert(&mut self, key: Arc<str>, texture: Texture2D) {
        self.map.insert(key, texture);
    }
}
