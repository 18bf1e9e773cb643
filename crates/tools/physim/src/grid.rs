//! Flat tile grid standing in for a level mesh

use ember_physics::{CollisionBits, MapQuery};
use glam::Vec3;

/// Bits reported for every tile outside the grid
const OUTSIDE: CollisionBits = CollisionBits(CollisionBits::WALL.0 | CollisionBits::IMPASSABLE.0);

/// Rectangular grid of tiles, each carrying collision bits
///
/// Tile `(0, 0)` covers `[0, tile_size)` on X and Y. Everything outside the
/// grid counts as a wall.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tile_size: f32,
    tiles: Vec<CollisionBits>,
}

impl TileGrid {
    /// Open grid with no blocked tiles
    ///
    /// The tile count is not bounded here; scene validation caps it.
    pub fn new(width: u32, height: u32, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![CollisionBits::NONE; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Add bits to one tile; out-of-range tiles are ignored
    pub fn mark(&mut self, x: u32, y: u32, bits: CollisionBits) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.tiles[i] |= bits;
        }
    }

    /// Bits of the tile at integer tile coordinates
    pub fn tile_bits(&self, x: i64, y: i64) -> CollisionBits {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return OUTSIDE;
        }
        self.tiles[self.offset(x as u32, y as u32)]
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn tile_coord(&self, v: f32) -> i64 {
        (v / self.tile_size).floor() as i64
    }
}

impl MapQuery for TileGrid {
    fn grid_index(&self, position: Vec3) -> Option<u32> {
        if !position.is_finite() {
            return None;
        }
        let x = self.tile_coord(position.x);
        let y = self.tile_coord(position.y);
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        u32::try_from(self.offset(x as u32, y as u32)).ok()
    }

    /// Checks every tile touched by the square footprint of side `2 * radius`
    ///
    /// A footprint reaching past the grid edge hits the outside bits.
    fn is_blocked(&self, position: Vec3, radius: f32, bits: CollisionBits) -> bool {
        if bits.is_empty() {
            return false;
        }
        if !position.is_finite() {
            return true;
        }

        let radius = radius.max(0.0);
        let (x0, x1) = (
            self.tile_coord(position.x - radius),
            self.tile_coord(position.x + radius),
        );
        let (y0, y1) = (
            self.tile_coord(position.y - radius),
            self.tile_coord(position.y + radius),
        );

        let (width, height) = (self.width as i64, self.height as i64);
        let off_grid = x0 < 0 || y0 < 0 || x1 >= width || y1 >= height;
        if off_grid && OUTSIDE.intersects(bits) {
            return true;
        }

        let (x0, x1) = (x0.max(0), x1.min(width - 1));
        let (y0, y1) = (y0.max(0), y1.min(height - 1));
        (y0..=y1).any(|y| (x0..=x1).any(|x| self.tile_bits(x, y).intersects(bits)))
    }
}
