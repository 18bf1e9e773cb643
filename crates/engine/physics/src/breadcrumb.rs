//! Breadcrumb trail of recent safe positions
//!
//! Every object keeps a short list of places where it recently stood clear of
//! walls. When it ends up stuck inside geometry, the trail is re-checked
//! against the current map and the object is rewound to the newest crumb that
//! is still safe.
//!
//! Crumbs start *valid*, turn *stale* when [`BreadcrumbList::validate`] finds
//! them blocked, and are *evicted* either by [`BreadcrumbList::compact`] or
//! when [`BreadcrumbList::add`] needs room in a full list.

use glam::Vec3;
use tracing::trace;

use crate::map::{snap_to_tile_center, CollisionBits, MapQuery};

/// Default number of crumbs per object
pub const DEFAULT_BREADCRUMB_CAPACITY: usize = 32;

/// One recorded position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Breadcrumb {
    /// Simulation tick at which the crumb was recorded
    pub tick: u32,
    /// Grid cell of the crumb, `None` if off the map
    pub grid: Option<u32>,
    /// Position snapped to the center of its tile
    pub position: Vec3,
    /// What the owner is stopped by
    pub bits: CollisionBits,
    /// Owner's bump radius
    pub radius: f32,
    /// Tie-breaker for crumbs recorded on the same tick, assigned by the list
    pub id: u64,
    pub valid: bool,
}

impl Breadcrumb {
    /// Build a crumb for an object standing at `position`
    ///
    /// The crumb is valid only if the snapped position is clear of anything
    /// in `bits`.
    pub fn new(
        tick: u32,
        position: Vec3,
        radius: f32,
        bits: CollisionBits,
        map: &impl MapQuery,
        tile_size: f32,
    ) -> Self {
        let snapped = snap_to_tile_center(position, tile_size);
        Self {
            tick,
            grid: map.grid_index(snapped),
            position: snapped,
            bits,
            radius,
            id: 0,
            valid: !map.is_blocked(snapped, radius, bits),
        }
    }

    fn order_key(&self) -> (u32, u64) {
        (self.tick, self.id)
    }

    /// Re-check against the current map; a blocked crumb turns stale
    pub fn revalidate(&mut self, map: &impl MapQuery) -> bool {
        if self.valid && map.is_blocked(self.position, self.radius, self.bits) {
            self.valid = false;
        }
        self.valid
    }
}

/// Bounded, oldest-first list of breadcrumbs
#[derive(Clone, Debug)]
pub struct BreadcrumbList {
    crumbs: Vec<Breadcrumb>,
    capacity: usize,
    next_id: u64,
}

impl Default for BreadcrumbList {
    fn default() -> Self {
        Self::new(DEFAULT_BREADCRUMB_CAPACITY)
    }
}

impl BreadcrumbList {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            crumbs: Vec::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.crumbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crumbs.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.crumbs.len() >= self.capacity
    }

    /// Number of crumbs currently flagged valid
    pub fn valid_count(&self) -> usize {
        self.crumbs.iter().filter(|c| c.valid).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Breadcrumb> {
        self.crumbs.iter()
    }

    pub fn clear(&mut self) {
        self.crumbs.clear();
    }

    /// Insert a crumb, assigning it the next id
    ///
    /// A full list is compacted first; if it is still full, the oldest valid
    /// crumb in the new crumb's grid cell is evicted, or failing that the
    /// oldest valid crumb overall. Invalid crumbs are rejected.
    pub fn add(&mut self, mut crumb: Breadcrumb) -> bool {
        if !crumb.valid {
            return false;
        }

        if self.is_full() {
            self.compact();
        }

        if self.is_full() {
            let victim = self
                .oldest_index_where(|c| c.grid.is_some() && c.grid == crumb.grid)
                .or_else(|| self.oldest_index_where(|_| true));
            if let Some(index) = victim {
                let evicted = self.crumbs.remove(index);
                trace!(id = evicted.id, grid = ?evicted.grid, "evicted breadcrumb");
            }
        }

        crumb.id = self.next_id;
        self.next_id += 1;

        // keep oldest-first order even if the caller hands in an older tick
        let at = self
            .crumbs
            .partition_point(|c| c.order_key() <= crumb.order_key());
        self.crumbs.insert(at, crumb);
        true
    }

    /// Re-check every valid crumb against the map and restore oldest-first order
    ///
    /// Blocked crumbs become stale but stay in the list until [`compact`](Self::compact).
    pub fn validate(&mut self, map: &impl MapQuery) {
        for crumb in self.crumbs.iter_mut() {
            crumb.revalidate(map);
        }
        self.crumbs.sort_by_key(Breadcrumb::order_key);
    }

    /// Drop all stale crumbs, preserving the order of the rest
    pub fn compact(&mut self) {
        self.crumbs.retain(|c| c.valid);
    }

    /// Most recently recorded valid crumb
    pub fn newest(&self) -> Option<&Breadcrumb> {
        self.crumbs
            .iter()
            .filter(|c| c.valid)
            .max_by_key(|c| c.order_key())
    }

    /// Earliest recorded valid crumb
    pub fn oldest(&self) -> Option<&Breadcrumb> {
        self.oldest_index_where(|_| true).map(|i| &self.crumbs[i])
    }

    /// Earliest valid crumb recorded in `grid`
    pub fn oldest_for_grid(&self, grid: u32) -> Option<&Breadcrumb> {
        self.oldest_index_where(|c| c.grid == Some(grid))
            .map(|i| &self.crumbs[i])
    }

    fn oldest_index_where(&self, pred: impl Fn(&Breadcrumb) -> bool) -> Option<usize> {
        self.crumbs
            .iter()
            .enumerate()
            .filter(|(_, c)| c.valid && pred(c))
            .min_by_key(|(_, c)| c.order_key())
            .map(|(i, _)| i)
    }
}
