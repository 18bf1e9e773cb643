//! Simulated bodies and the generational arena that owns them

use glam::Vec3;
use slab::Slab;

use crate::apos::Apos;
use crate::breadcrumb::BreadcrumbList;
use crate::bumper::Bumper;
use crate::error::{Result, WorldError};
use crate::map::CollisionBits;
use crate::oct::OctBb;
use crate::swept::Motion;

/// Handle to a body in a [`BodySet`]
///
/// A handle stays bound to the body it was issued for: once that body is
/// removed, the handle is rejected even if its slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A character, particle or platform moved by the physics step
#[derive(Clone, Debug)]
pub struct Body {
    pub bumper: Bumper,
    /// Position of the body's feet
    pub position: Vec3,
    /// Displacement per tick
    pub velocity: Vec3,
    /// Share of pairwise corrections this body absorbs; 0 = immovable
    pub inverse_mass: f32,
    /// Whether other bodies may stand on this one
    pub is_platform: bool,
    /// Tile properties that block this body
    pub stopped_by: CollisionBits,
    /// Last position confirmed clear of walls
    pub safe_position: Option<Vec3>,
    pub(crate) apos: Apos,
    pub(crate) crumbs: BreadcrumbList,
    pub(crate) last_crumb_tick: Option<u32>,
}

impl Body {
    /// A movable body with unit mass, stopped by walls
    pub fn new(bumper: Bumper, position: Vec3) -> Self {
        Self {
            bumper,
            position,
            velocity: Vec3::ZERO,
            inverse_mass: 1.0,
            is_platform: false,
            stopped_by: CollisionBits::CHARACTER,
            safe_position: None,
            apos: Apos::new(),
            crumbs: BreadcrumbList::default(),
            last_crumb_tick: None,
        }
    }

    /// An immovable platform others can stand on
    pub fn platform(bumper: Bumper, position: Vec3) -> Self {
        Self {
            inverse_mass: 0.0,
            is_platform: true,
            ..Self::new(bumper, position)
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_inverse_mass(mut self, inverse_mass: f32) -> Self {
        self.inverse_mass = inverse_mass.max(0.0);
        self
    }

    pub fn with_stopped_by(mut self, bits: CollisionBits) -> Self {
        self.stopped_by = bits;
        self
    }

    /// World-space volume at the current position
    pub fn volume(&self) -> OctBb {
        OctBb::from_bumper_at(&self.bumper, self.position)
    }

    /// The body's motion over the coming tick
    pub fn motion(&self) -> Motion {
        Motion::from_bumper(&self.bumper, self.position, self.velocity)
    }

    /// Corrections accumulated so far this tick
    pub fn apos(&self) -> &Apos {
        &self.apos
    }

    pub fn breadcrumbs(&self) -> &BreadcrumbList {
        &self.crumbs
    }

    pub fn is_immovable(&self) -> bool {
        self.inverse_mass <= 0.0
    }
}

/// Arena of bodies addressed by generational handles
///
/// Slots come from a [`Slab`]; `generations` is indexed by slab key and
/// bumped on every removal so that old handles to a reused key are rejected.
#[derive(Default)]
pub struct BodySet {
    bodies: Slab<Body>,
    generations: Vec<u32>,
}

impl BodySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Store a body, reusing a freed slot when possible
    pub fn insert(&mut self, body: Body) -> BodyHandle {
        let key = self.bodies.insert(body);
        if key >= self.generations.len() {
            self.generations.resize(key + 1, 0);
        }
        BodyHandle {
            index: key as u32,
            generation: self.generations[key],
        }
    }

    /// Remove a body; its handle and every copy of it become stale
    pub fn remove(&mut self, handle: BodyHandle) -> Result<Body> {
        let key = self.check(handle)?;
        let body = self.bodies.remove(key);
        self.generations[key] = self.generations[key].wrapping_add(1);
        Ok(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&Body> {
        let key = self.check(handle)?;
        self.bodies.get(key).ok_or(WorldError::StaleHandle(handle))
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        let key = self.check(handle)?;
        self.bodies
            .get_mut(key)
            .ok_or(WorldError::StaleHandle(handle))
    }

    /// Mutable access to two distinct bodies at once
    pub fn get_pair_mut(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
    ) -> Result<(&mut Body, &mut Body)> {
        let key_a = self.check(a)?;
        let key_b = self.check(b)?;
        if key_a == key_b {
            return Err(WorldError::SelfPair(a));
        }
        self.bodies
            .get2_mut(key_a, key_b)
            .ok_or(WorldError::StaleHandle(a))
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.check(handle).is_ok()
    }

    /// Handles of all live bodies in slot order
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(h, _)| h).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        let generations = &self.generations;
        self.bodies.iter().map(move |(key, body)| {
            (
                BodyHandle {
                    index: key as u32,
                    generation: generations[key],
                },
                body,
            )
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut Body)> {
        let generations = &self.generations;
        self.bodies.iter_mut().map(move |(key, body)| {
            (
                BodyHandle {
                    index: key as u32,
                    generation: generations[key],
                },
                body,
            )
        })
    }

    /// Slab key of a live handle
    fn check(&self, handle: BodyHandle) -> Result<usize> {
        let key = handle.index as usize;
        match self.generations.get(key) {
            None => Err(WorldError::UnknownHandle(handle)),
            Some(&generation) if generation != handle.generation => {
                Err(WorldError::StaleHandle(handle))
            }
            Some(_) if !self.bodies.contains(key) => Err(WorldError::StaleHandle(handle)),
            Some(_) => Ok(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body::new(Bumper::cylinder(10.0, 20.0), Vec3::ZERO)
    }

    #[test]
    fn test_insert_and_get() {
        let mut set = BodySet::new();
        let h = set.insert(body().with_velocity(Vec3::X));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(h).unwrap().velocity, Vec3::X);
    }

    #[test]
    fn test_stale_handle_detected_after_reuse() {
        let mut set = BodySet::new();
        let old = set.insert(body());
        set.remove(old).unwrap();
        let new = set.insert(body());

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert_eq!(set.get(old).unwrap_err(), WorldError::StaleHandle(old));
        assert!(set.get(new).is_ok());
    }

    #[test]
    fn test_double_remove_fails() {
        let mut set = BodySet::new();
        let h = set.insert(body());
        set.remove(h).unwrap();
        assert!(set.remove(h).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_get_pair_mut_order() {
        let mut set = BodySet::new();
        let a = set.insert(body().with_velocity(Vec3::X));
        let b = set.insert(body().with_velocity(Vec3::Y));

        let (second, first) = set.get_pair_mut(b, a).unwrap();
        assert_eq!(second.velocity, Vec3::Y);
        assert_eq!(first.velocity, Vec3::X);
        assert!(set.get_pair_mut(a, a).is_err());
    }

    #[test]
    fn test_get_pair_mut_rejects_removed() {
        let mut set = BodySet::new();
        let a = set.insert(body());
        let b = set.insert(body());
        set.remove(b).unwrap();

        assert_eq!(
            set.get_pair_mut(a, b).unwrap_err(),
            WorldError::StaleHandle(b)
        );
        assert!(!set.contains(b));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_platform_is_immovable() {
        let p = Body::platform(Bumper::square(50.0, 10.0), Vec3::ZERO);
        assert!(p.is_immovable());
        assert!(p.is_platform);
    }

    #[test]
    fn test_iter_skips_removed() {
        let mut set = BodySet::new();
        let a = set.insert(body());
        let b = set.insert(body());
        set.remove(a).unwrap();
        assert_eq!(set.handles(), vec![b]);
    }
}
