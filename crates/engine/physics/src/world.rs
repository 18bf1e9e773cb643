//! Physics world: owns the bodies and runs the per-tick collision pipeline
//!
//! Each [`PhysicsWorld::step`] collides the candidate pairs, integrates every
//! body and rewinds bodies stuck in the map to their breadcrumb trail.

use glam::Vec3;
use tracing::{debug, debug_span, trace, warn};

use crate::body::{Body, BodyHandle, BodySet};
use crate::breadcrumb::{Breadcrumb, BreadcrumbList};
use crate::config::PhysicsConfig;
use crate::depth::{estimate_contact_normal, DepthMethod};
use crate::error::Result;
use crate::map::MapQuery;
use crate::oct::OctAxis;
use crate::swept::{intersect_oct_bb, PlatformFlags, SweptHit};

/// A pair of bodies found touching during a tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// First moment of contact within the tick
    pub tmin: f32,
    /// Last moment of contact within the tick
    pub tmax: f32,
    /// Unit normal pointing from `a` toward `b`
    pub normal: Vec3,
    /// Push-apart distance along `normal`; zero for a rider resting inside a
    /// platform's tolerance band
    pub depth: f32,
    /// Depth algorithm used, `None` for resting contacts
    pub method: Option<DepthMethod>,
}

impl Contact {
    /// True for a rider hovering within a platform's tolerance band
    pub fn is_resting(&self) -> bool {
        self.method.is_none()
    }
}

/// A body pulled back to a breadcrumb after ending up inside a wall
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recovery {
    pub body: BodyHandle,
    pub from: Vec3,
    pub to: Vec3,
}

/// What happened during one [`PhysicsWorld::step`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    /// Tick that was simulated
    pub tick: u32,
    pub contacts: Vec<Contact>,
    pub recoveries: Vec<Recovery>,
}

/// Physics simulation world
///
/// Owns every simulated body plus the settings and tick counter, so the
/// whole collision pipeline runs without global state. Broad-phase candidate
/// generation stays outside: callers hand the pairs to test into [`step`].
///
/// [`step`]: PhysicsWorld::step
pub struct PhysicsWorld {
    bodies: BodySet,
    config: PhysicsConfig,
    tick: u32,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    /// Create an empty world with the given settings
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            bodies: BodySet::new(),
            config,
            tick: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// The tick the next [`step`](Self::step) will simulate
    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    /// Add a body to the world
    ///
    /// The body's breadcrumb trail is resized to the configured capacity.
    pub fn insert(&mut self, mut body: Body) -> BodyHandle {
        body.crumbs = BreadcrumbList::new(self.config.breadcrumb_capacity);
        body.apos.clear();
        let handle = self.bodies.insert(body);
        debug!(?handle, "body added");
        handle
    }

    /// Remove a body; its handle becomes stale
    pub fn remove(&mut self, handle: BodyHandle) -> Result<Body> {
        self.bodies.remove(handle)
    }

    pub fn get(&self, handle: BodyHandle) -> Result<&Body> {
        self.bodies.get(handle)
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Result<&mut Body> {
        self.bodies.get_mut(handle)
    }

    /// Every unordered pair of live bodies
    ///
    /// A brute-force stand-in for a broad phase, fine for small scenes.
    pub fn all_pairs(&self) -> Vec<(BodyHandle, BodyHandle)> {
        let handles = self.bodies.handles();
        let mut pairs = Vec::new();
        for (i, &a) in handles.iter().enumerate() {
            for &b in &handles[i + 1..] {
                pairs.push((a, b));
            }
        }
        pairs
    }

    /// Push a correction into a body's accumulator
    pub fn accumulate(&mut self, handle: BodyHandle, correction: Vec3) -> Result<()> {
        self.bodies.get_mut(handle)?.apos.add(correction);
        Ok(())
    }

    /// Net correction accumulated for a body this tick
    pub fn resolve(&self, handle: BodyHandle) -> Result<Vec3> {
        Ok(self.bodies.get(handle)?.apos.evaluate())
    }

    /// Swept test between two bodies' motions over the coming tick
    pub fn sweep_pair(&self, a: BodyHandle, b: BodyHandle) -> Result<Option<SweptHit>> {
        let body_a = self.bodies.get(a)?;
        let body_b = self.bodies.get(b)?;
        let flags = PlatformFlags::from_pair(body_a.is_platform, body_b.is_platform);

        Ok(intersect_oct_bb(
            &body_a.motion(),
            &body_b.motion(),
            flags,
            self.config.platform_tolerance,
        ))
    }

    /// Test one pair and feed the resulting push into both accumulators
    ///
    /// The push is split by inverse mass; a pair of immovable bodies reports
    /// the contact without correcting either.
    pub fn collide_pair(&mut self, a: BodyHandle, b: BodyHandle) -> Result<Option<Contact>> {
        let Some(hit) = self.sweep_pair(a, b)? else {
            return Ok(None);
        };

        let exponent = self.config.contact_exponent;
        let (body_a, body_b) = self.bodies.get_pair_mut(a, b)?;

        let volume_a = body_a.volume().swept(body_a.velocity, hit.tmin, hit.tmax);
        let volume_b = body_b.volume().swept(body_b.velocity, hit.tmin, hit.tmax);

        let Some(estimate) = estimate_contact_normal(&volume_a, &volume_b, exponent) else {
            if body_a.is_platform || body_b.is_platform {
                // inside the tolerance band without touching
                let normal = if volume_b.mids()[OctAxis::Z] >= volume_a.mids()[OctAxis::Z] {
                    Vec3::Z
                } else {
                    Vec3::NEG_Z
                };
                trace!(?a, ?b, "resting on platform");
                return Ok(Some(Contact {
                    a,
                    b,
                    tmin: hit.tmin,
                    tmax: hit.tmax,
                    normal,
                    depth: 0.0,
                    method: None,
                }));
            }
            trace!(?a, ?b, "swept hit without resolvable depth");
            return Ok(None);
        };

        let total = body_a.inverse_mass + body_b.inverse_mass;
        if total > 0.0 {
            let push = estimate.normal * estimate.depth;
            body_a.apos.add(-push * (body_a.inverse_mass / total));
            body_b.apos.add(push * (body_b.inverse_mass / total));
        }

        debug!(
            ?a,
            ?b,
            tmin = hit.tmin,
            tmax = hit.tmax,
            depth = estimate.depth,
            method = ?estimate.method,
            "contact"
        );

        Ok(Some(Contact {
            a,
            b,
            tmin: hit.tmin,
            tmax: hit.tmax,
            normal: estimate.normal,
            depth: estimate.depth,
            method: Some(estimate.method),
        }))
    }

    /// Record a breadcrumb for a body at its current position if due
    ///
    /// A crumb is due when the body has no valid crumb yet, moved into another
    /// grid cell (or, off the map, more than a tile away from its newest
    /// crumb), or `breadcrumb_min_age` ticks passed since the last one.
    /// Returns whether a crumb was added.
    pub fn record_breadcrumb(&mut self, handle: BodyHandle, map: &impl MapQuery) -> Result<bool> {
        let tick = self.tick;
        let tile_size = self.config.tile_size;
        let min_age = self.config.breadcrumb_min_age;
        let body = self.bodies.get_mut(handle)?;

        let position = body.position;
        let due = match body.crumbs.newest() {
            None => true,
            Some(newest) => {
                let moved = match map.grid_index(position) {
                    Some(grid) => newest.grid != Some(grid),
                    None => {
                        (position.x - newest.position.x).abs() > tile_size
                            || (position.y - newest.position.y).abs() > tile_size
                    }
                };
                let aged = min_age > 0
                    && body
                        .last_crumb_tick
                        .map_or(true, |last| tick.wrapping_sub(last) >= min_age);
                moved || aged
            }
        };

        if !due {
            return Ok(false);
        }

        let crumb = Breadcrumb::new(
            tick,
            position,
            body.bumper.radius(),
            body.stopped_by,
            map,
            tile_size,
        );
        if !body.crumbs.add(crumb) {
            return Ok(false);
        }

        body.last_crumb_tick = Some(tick);
        trace!(?handle, tick, grid = ?crumb.grid, "breadcrumb recorded");
        Ok(true)
    }

    /// Newest position the body can safely be put back to
    ///
    /// Re-validates the trail against the current map first, so crumbs that
    /// became blocked are skipped. Falls back to the last safe position when
    /// that is still clear.
    pub fn last_valid_position(
        &mut self,
        handle: BodyHandle,
        map: &impl MapQuery,
    ) -> Result<Option<Vec3>> {
        let body = self.bodies.get_mut(handle)?;
        body.crumbs.validate(map);

        if let Some(crumb) = body.crumbs.newest() {
            return Ok(Some(crumb.position));
        }

        Ok(body
            .safe_position
            .filter(|&p| !map.is_blocked(p, body.bumper.radius(), body.stopped_by)))
    }

    /// Advance the simulation by one tick
    ///
    /// 1. clear every accumulator
    /// 2. test each candidate pair and accumulate the corrections
    /// 3. move every body by its velocity plus its net correction
    /// 4. rewind bodies that ended up inside walls, record breadcrumbs for the rest
    pub fn step(
        &mut self,
        pairs: &[(BodyHandle, BodyHandle)],
        map: &impl MapQuery,
    ) -> StepReport {
        let tick = self.tick;
        let _span = debug_span!("physics_step", tick).entered();

        let mut report = StepReport {
            tick,
            ..Default::default()
        };

        for (_, body) in self.bodies.iter_mut() {
            body.apos.clear();
        }

        for &(a, b) in pairs {
            match self.collide_pair(a, b) {
                Ok(Some(contact)) => report.contacts.push(contact),
                Ok(None) => {}
                Err(err) => warn!(?a, ?b, %err, "skipping candidate pair"),
            }
        }

        for (handle, body) in self.bodies.iter_mut() {
            integrate(handle, body);
        }

        for handle in self.bodies.handles() {
            match self.settle(handle, map) {
                Ok(Some(recovery)) => report.recoveries.push(recovery),
                Ok(None) => {}
                Err(err) => warn!(?handle, %err, "settle failed"),
            }
        }

        debug!(
            contacts = report.contacts.len(),
            recoveries = report.recoveries.len(),
            "tick done"
        );
        self.tick = self.tick.wrapping_add(1);
        report
    }

    /// Wall check after integration
    fn settle(&mut self, handle: BodyHandle, map: &impl MapQuery) -> Result<Option<Recovery>> {
        let body = self.bodies.get(handle)?;
        let from = body.position;

        if !map.is_blocked(from, body.bumper.radius(), body.stopped_by) {
            self.bodies.get_mut(handle)?.safe_position = Some(from);
            self.record_breadcrumb(handle, map)?;
            return Ok(None);
        }

        let Some(to) = self.last_valid_position(handle, map)? else {
            warn!(?handle, position = ?from, "stuck in wall with no breadcrumb to return to");
            return Ok(None);
        };

        let body = self.bodies.get_mut(handle)?;
        body.position = to;
        body.velocity = Vec3::ZERO;
        debug!(?handle, ?from, ?to, "rewound to breadcrumb");
        Ok(Some(Recovery {
            body: handle,
            from,
            to,
        }))
    }
}

/// Apply velocity and net correction; drop the velocity component that
/// drives back into the correction
fn integrate(handle: BodyHandle, body: &mut Body) {
    let correction = body.apos.evaluate();
    let next = body.position + body.velocity + correction;

    if !next.is_finite() {
        warn!(
            ?handle,
            position = ?body.position,
            velocity = ?body.velocity,
            "non-finite motion, body held in place"
        );
        return;
    }
    body.position = next;

    if let Some(dir) = correction.try_normalize() {
        let into = body.velocity.dot(dir);
        if into < 0.0 {
            body.velocity -= dir * into;
        }
    }
}
