//! Map queries consumed by the physics core
//!
//! The mesh layer owns the level geometry; physics only needs to know which
//! grid cell a point falls in and whether a footprint overlaps blocking tiles.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Bitmask of tile properties an object can be stopped by
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollisionBits(pub u32);

impl CollisionBits {
    pub const NONE: CollisionBits = CollisionBits(0);
    pub const WALL: CollisionBits = CollisionBits(1 << 0);
    pub const IMPASSABLE: CollisionBits = CollisionBits(1 << 1);
    pub const WATER: CollisionBits = CollisionBits(1 << 2);
    pub const DAMAGE: CollisionBits = CollisionBits(1 << 3);

    /// What a walking character is normally stopped by
    pub const CHARACTER: CollisionBits = CollisionBits(Self::WALL.0 | Self::IMPASSABLE.0);

    /// True if any bit is shared
    pub fn intersects(self, other: CollisionBits) -> bool {
        self.0 & other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for CollisionBits {
    type Output = CollisionBits;

    fn bitor(self, rhs: CollisionBits) -> CollisionBits {
        CollisionBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for CollisionBits {
    fn bitor_assign(&mut self, rhs: CollisionBits) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for CollisionBits {
    type Output = CollisionBits;

    fn bitand(self, rhs: CollisionBits) -> CollisionBits {
        CollisionBits(self.0 & rhs.0)
    }
}

/// Read-only view of the level geometry
pub trait MapQuery {
    /// Index of the grid cell containing `position`, or `None` off the map
    fn grid_index(&self, position: Vec3) -> Option<u32>;

    /// Whether a footprint of `radius` at `position` touches any tile whose
    /// properties intersect `bits`
    fn is_blocked(&self, position: Vec3, radius: f32, bits: CollisionBits) -> bool;
}

/// A map with no geometry: every point is on grid cell 0 and nothing blocks
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenMap;

impl MapQuery for OpenMap {
    fn grid_index(&self, _position: Vec3) -> Option<u32> {
        Some(0)
    }

    fn is_blocked(&self, _position: Vec3, _radius: f32, _bits: CollisionBits) -> bool {
        false
    }
}

/// Snap a position to the center of its tile, keeping the height
pub fn snap_to_tile_center(position: Vec3, tile_size: f32) -> Vec3 {
    Vec3::new(
        ((position.x / tile_size).floor() + 0.5) * tile_size,
        ((position.y / tile_size).floor() + 0.5) * tile_size,
        position.z,
    )
}
