use bevy_ecs::prelude::Component;
use raylib::prelude::Vector2;

/// Axis-aligned box in tile units: top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Strict overlap test; boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Strict overlap of the horizontal extents only.
    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w && self.x + self.w > other.x
    }

    /// Strict overlap of the vertical extents only.
    pub fn overlaps_y(&self, other: &Aabb) -> bool {
        self.y < other.y + other.h && self.y + self.h > other.y
    }

    /// Thin strip directly under this box.
    pub fn foot(&self, depth: f32) -> Aabb {
        Aabb::new(self.x, self.bottom(), self.w, depth)
    }
}

/// Collision box of an entity, anchored at its position.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub size: Vector2,
}

impl BoxCollider {
    /// Create a BoxCollider with given size
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vector2::new(width, height),
        }
    }

    /// Box at a given entity position.
    /// Handles negative size by normalizing to proper min/max.
    pub fn aabb(&self, position: Vector2) -> Aabb {
        let p0 = position;
        let p1 = p0 + self.size;
        let min = Vector2::new(p0.x.min(p1.x), p0.y.min(p1.y));
        let max = Vector2::new(p0.x.max(p1.x), p0.y.max(p1.y));
        Aabb::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Entity y that puts the bottom of the box exactly on `surface_y`.
    pub fn y_resting_on(&self, surface_y: f32) -> f32 {
        surface_y - self.size.y.max(0.0)
    }

    /// Entity x that puts the right side of the box exactly on `edge_x`.
    pub fn x_touching_left_of(&self, edge_x: f32) -> f32 {
        edge_x - self.size.x.max(0.0)
    }

    /// Entity x that puts the left side of the box exactly on `edge_x`.
    pub fn x_touching_right_of(&self, edge_x: f32) -> f32 {
        edge_x - self.size.x.min(0.0)
    }
}
