//! Collision queries against static level tiles.
//!
//! [`CollisionView`] borrows the descriptors of the platform and terrain
//! collections for the duration of a controller step. It never owns or
//! mutates them; the entity collections stay the sole owners.
//!
//! All boxes are in tile units and use the strict overlap test of
//! [`Aabb::overlaps`]: boxes that only share an edge do not collide.

use crate::components::boxcollider::{Aabb, BoxCollider};
use crate::components::tileset::{TileDescriptor, TileSet};
use crate::resources::tilecatalog::TileMetrics;
use raylib::prelude::Vector2;

/// Depth of the strip under the player's feet used for support and
/// descend checks.
pub const FOOT_DEPTH: f32 = 0.05;

/// Tolerance when comparing the previous foot or head position against a
/// tile edge.
pub const EDGE_EPSILON: f32 = 1e-3;

/// Read-only view over the collidable tiles of the level.
pub struct CollisionView<'a> {
    tiles: Vec<&'a TileDescriptor>,
    metrics: TileMetrics,
}

impl<'a> CollisionView<'a> {
    pub fn new(metrics: TileMetrics, sets: impl IntoIterator<Item = &'a TileSet>) -> Self {
        let tiles = sets
            .into_iter()
            .flat_map(|set| set.iter())
            .filter(|tile| tile.is_collidable())
            .collect();
        Self { tiles, metrics }
    }

    fn boxes(&self) -> impl Iterator<Item = (&'a TileDescriptor, Aabb)> + '_ {
        self.tiles.iter().copied().flat_map(move |tile| {
            tile.positions
                .iter()
                .map(move |pos| (tile, tile.bounds_at(*pos, &self.metrics)))
        })
    }

    /// Nearest edge of a horizontally solid tile that `body` would run into
    /// moving `distance` tiles along x (negative is left). Tiles already
    /// behind or overlapping the body do not stop it.
    pub fn horizontal_stop(&self, body: &Aabb, distance: f32) -> Option<f32> {
        let solid = self
            .boxes()
            .filter(|(tile, b)| tile.collidable_horizontal && b.overlaps_y(body))
            .map(|(_, b)| b);
        if distance > 0.0 {
            solid
                .filter(|b| {
                    b.left() >= body.right() - EDGE_EPSILON && b.left() < body.right() + distance
                })
                .map(|b| b.left())
                .reduce(f32::min)
        } else if distance < 0.0 {
            solid
                .filter(|b| {
                    b.right() <= body.left() + EDGE_EPSILON && b.right() > body.left() + distance
                })
                .map(|b| b.right())
                .reduce(f32::max)
        } else {
            None
        }
    }

    /// Whether the strip under `body` overlaps a descendable platform.
    pub fn descend_under(&self, body: &Aabb) -> bool {
        let foot = body.foot(FOOT_DEPTH);
        self.boxes()
            .any(|(tile, b)| tile.can_descend && b.overlaps(&foot))
    }

    /// Whether something solid is directly under `body`.
    pub fn supports(&self, body: &Aabb, ignore_descend: bool) -> bool {
        let foot = body.foot(FOOT_DEPTH);
        self.boxes()
            .any(|(tile, b)| stands_on(tile, ignore_descend) && b.overlaps(&foot))
    }

    /// Top edge of the highest tile whose top the feet crossed moving down
    /// from `previous` to `body`. The test is swept, so a long step cannot
    /// pass through a tile. Tiles whose top was above the previous foot
    /// position do not count; bodies already inside a platform fall through.
    pub fn landing(&self, previous: &Aabb, body: &Aabb, ignore_descend: bool) -> Option<f32> {
        self.boxes()
            .filter(|(tile, b)| {
                stands_on(tile, ignore_descend)
                    && b.overlaps_x(body)
                    && previous.bottom() <= b.top() + EDGE_EPSILON
                    && body.bottom() >= b.top()
            })
            .map(|(_, b)| b.top())
            .reduce(f32::min)
    }

    /// Whether the head, moving up from `previous` to `body`, crosses the
    /// underside of a solid tile. Descendable platforms are one-way and never
    /// block.
    pub fn ceiling(&self, previous: &Aabb, body: &Aabb) -> bool {
        self.boxes().any(|(tile, b)| {
            tile.collidable_vertical
                && !tile.can_descend
                && b.overlaps_x(body)
                && previous.top() >= b.bottom() - EDGE_EPSILON
                && body.top() < b.bottom()
        })
    }
}

fn stands_on(tile: &TileDescriptor, ignore_descend: bool) -> bool {
    if tile.can_descend {
        !ignore_descend
    } else {
        tile.collidable_vertical
    }
}

/// Horizontal step from `x` toward `new_x`: the proposed position, or the
/// position touching the first solid tile in the way.
pub fn resolve_horizontal(
    view: &CollisionView<'_>,
    collider: &BoxCollider,
    x: f32,
    y: f32,
    new_x: f32,
) -> f32 {
    let distance = new_x - x;
    let body = collider.aabb(Vector2::new(x, y));
    match view.horizontal_stop(&body, distance) {
        Some(edge) if distance > 0.0 => collider.x_touching_left_of(edge),
        Some(edge) => collider.x_touching_right_of(edge),
        None => new_x,
    }
}
