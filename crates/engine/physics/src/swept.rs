//! Swept-volume intersection
//!
//! Decides whether two translating octagonal volumes touch at any time during
//! one tick, and over which part of the tick.
//!
//! Each of the five axes is handled independently as a 1-D sweep of B's
//! interval relative to A's. An axis with no relative motion adds no
//! constraint as long as the intervals already overlap; otherwise the pair can
//! never meet. The interacting interval is the intersection of all constrained
//! axes. Because the diagonal axes store positions and velocities with the
//! same `√2` factor, the times they produce are already in tick units.
//!
//! Platforms: when a pair may stand on one another, the platform's top face
//! is raised by a tolerance band on the vertical axis, so a rider hovering a
//! little above still counts as touching.

use glam::Vec3;
use std::ops::{BitOr, BitOrAssign};
use tracing::trace;

use crate::bumper::Bumper;
use crate::oct::{OctAxis, OctBb, OctVec};

/// Default vertical tolerance band for platform contacts
pub const PLATFORM_TOLERANCE: f32 = 50.0;

/// Which members of a pair may act as a platform for the other
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PlatformFlags(u8);

impl PlatformFlags {
    pub const NONE: PlatformFlags = PlatformFlags(0);
    /// The first object may carry the second
    pub const OBJ1: PlatformFlags = PlatformFlags(1);
    /// The second object may carry the first
    pub const OBJ2: PlatformFlags = PlatformFlags(2);
    pub const BOTH: PlatformFlags = PlatformFlags(3);

    /// Flags for a pair given each member's platform capability
    pub fn from_pair(first_is_platform: bool, second_is_platform: bool) -> Self {
        let mut flags = Self::NONE;
        if first_is_platform {
            flags |= Self::OBJ1;
        }
        if second_is_platform {
            flags |= Self::OBJ2;
        }
        flags
    }

    pub fn contains(self, other: PlatformFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for PlatformFlags {
    type Output = PlatformFlags;

    fn bitor(self, rhs: PlatformFlags) -> PlatformFlags {
        PlatformFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for PlatformFlags {
    fn bitor_assign(&mut self, rhs: PlatformFlags) {
        self.0 |= rhs.0;
    }
}

/// A volume moving at constant velocity for one tick
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Motion {
    /// Volume relative to `position`
    pub volume: OctBb,
    pub position: Vec3,
    pub velocity: Vec3,
}

impl Motion {
    pub fn new(volume: OctBb, position: Vec3, velocity: Vec3) -> Self {
        Self {
            volume,
            position,
            velocity,
        }
    }

    pub fn from_bumper(bumper: &Bumper, position: Vec3, velocity: Vec3) -> Self {
        Self::new(OctBb::from_bumper(bumper), position, velocity)
    }

    /// World-space volume at the start of the tick
    pub fn start(&self) -> OctBb {
        self.volume.translate(self.position)
    }

    /// World-space volume at the end of the tick
    pub fn end(&self) -> OctBb {
        self.volume.translate(self.position + self.velocity)
    }
}

/// Result of a successful swept test
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweptHit {
    /// First moment of contact, clamped to `[0, 1]`
    pub tmin: f32,
    /// Last moment of contact, clamped to `[0, 1]`
    pub tmax: f32,
    /// Overlap of both swept volumes over `[tmin, tmax]`
    pub overlap: OctBb,
}

/// Outcome of one axis of the sweep
#[derive(Clone, Copy, Debug, PartialEq)]
enum AxisSpan {
    /// No relative motion and already overlapping
    Free,
    /// Overlapping between the two times
    Interval(f32, f32),
    /// The projections never overlap
    Never,
}

/// One pair of 1-D projections to sweep, `(a_lo, a_hi, b_lo, b_hi)`
type Bounds = (f32, f32, f32, f32);

/// Sweep B's interval against A's. `vdiff` is B's velocity relative to A.
///
/// With several variants (platform roles), the widest interval wins.
fn axis_span(variants: &[Bounds], vdiff: f32) -> AxisSpan {
    let finite = variants
        .iter()
        .all(|&(a_lo, a_hi, b_lo, b_hi)| [a_lo, a_hi, b_lo, b_hi].iter().all(|v| v.is_finite()));
    if !vdiff.is_finite() || !finite {
        return AxisSpan::Never;
    }

    if vdiff == 0.0 {
        return static_span(variants);
    }

    let mut tmin = f32::INFINITY;
    let mut tmax = f32::NEG_INFINITY;
    for &(a_lo, a_hi, b_lo, b_hi) in variants {
        // every face of A against every face of B
        let times = [
            (a_lo - b_lo) / vdiff,
            (a_lo - b_hi) / vdiff,
            (a_hi - b_lo) / vdiff,
            (a_hi - b_hi) / vdiff,
        ];
        for t in times {
            // the division overflows for a vanishing vdiff
            if !t.is_finite() {
                return static_span(variants);
            }
            tmin = tmin.min(t);
            tmax = tmax.max(t);
        }
    }

    AxisSpan::Interval(tmin, tmax)
}

/// Span of an axis without relative motion
fn static_span(variants: &[Bounds]) -> AxisSpan {
    let overlapping = variants
        .iter()
        .any(|&(a_lo, a_hi, b_lo, b_hi)| a_lo < b_hi && b_lo < a_hi);
    if overlapping {
        AxisSpan::Free
    } else {
        AxisSpan::Never
    }
}

/// Platform roles that apply to the vertical axis this tick
///
/// A role applies when its flag is set and the rider's bottom is at or above
/// the platform's top at the start or the end of the tick.
fn platform_roles(
    flags: PlatformFlags,
    (a_lo, a_hi, b_lo, b_hi): Bounds,
    vdiff: f32,
) -> (bool, bool) {
    let first_carries =
        flags.contains(PlatformFlags::OBJ1) && (b_lo >= a_hi || b_lo + vdiff >= a_hi);
    let second_carries =
        flags.contains(PlatformFlags::OBJ2) && (a_lo >= b_hi || a_lo >= b_hi + vdiff);
    (first_carries, second_carries)
}

fn vertical_span(bounds: Bounds, vdiff: f32, flags: PlatformFlags, tolerance: f32) -> AxisSpan {
    let (a_lo, a_hi, b_lo, b_hi) = bounds;
    match platform_roles(flags, bounds, vdiff) {
        (false, false) => axis_span(&[bounds], vdiff),
        (true, false) => axis_span(&[(a_lo, a_hi + tolerance, b_lo, b_hi)], vdiff),
        (false, true) => axis_span(&[(a_lo, a_hi, b_lo, b_hi + tolerance)], vdiff),
        (true, true) => axis_span(
            &[
                (a_lo, a_hi + tolerance, b_lo, b_hi),
                (a_lo, a_hi, b_lo, b_hi + tolerance),
            ],
            vdiff,
        ),
    }
}

/// Fold per-axis spans into the interacting interval of the tick
fn combine(spans: impl IntoIterator<Item = AxisSpan>) -> Option<(f32, f32)> {
    let mut tmin = f32::NEG_INFINITY;
    let mut tmax = f32::INFINITY;
    let mut constrained = false;

    for span in spans {
        match span {
            AxisSpan::Never => return None,
            AxisSpan::Free => {}
            AxisSpan::Interval(lo, hi) => {
                tmin = tmin.max(lo);
                tmax = tmax.min(hi);
                constrained = true;
            }
        }
    }

    if !constrained {
        return Some((0.0, 1.0));
    }
    if tmin > tmax || tmax < 0.0 || tmin > 1.0 {
        return None;
    }
    Some((tmin.max(0.0), tmax.min(1.0)))
}

fn swept_overlap(a: &Motion, b: &Motion, tmin: f32, tmax: f32) -> OctBb {
    let swept_a = a.start().swept(a.velocity, tmin, tmax);
    let swept_b = b.start().swept(b.velocity, tmin, tmax);
    swept_a.intersection(&swept_b)
}

/// Test whether two moving volumes interact during the tick
///
/// `flags` marks which members may carry the other; `tolerance` is the
/// platform band height. Returns the clamped contact interval and the overlap
/// of both swept volumes over that interval, or `None` when the pair does not
/// interact (including degenerate volumes and non-finite inputs).
///
/// # Example
/// ```
/// use ember_physics::{intersect_oct_bb, Bumper, Motion, PlatformFlags};
/// use glam::Vec3;
///
/// let bumper = Bumper::cylinder(20.0, 40.0);
/// let a = Motion::from_bumper(&bumper, Vec3::ZERO, Vec3::new(70.0, 0.0, 0.0));
/// let b = Motion::from_bumper(&bumper, Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);
///
/// let hit = intersect_oct_bb(&a, &b, PlatformFlags::NONE, 50.0).unwrap();
/// assert!((hit.tmin - 60.0 / 70.0).abs() < 1e-4);
/// assert_eq!(hit.tmax, 1.0);
/// ```
pub fn intersect_oct_bb(
    a: &Motion,
    b: &Motion,
    flags: PlatformFlags,
    tolerance: f32,
) -> Option<SweptHit> {
    let src_a = a.start();
    let src_b = b.start();
    if src_a.is_empty() || src_b.is_empty() {
        return None;
    }

    let ovel = OctVec::from_vec3(b.velocity - a.velocity);

    let spans = OctAxis::ALL.map(|axis| {
        let bounds = (
            src_a.mins[axis],
            src_a.maxs[axis],
            src_b.mins[axis],
            src_b.maxs[axis],
        );
        if axis == OctAxis::Z {
            vertical_span(bounds, ovel[axis], flags, tolerance)
        } else {
            axis_span(&[bounds], ovel[axis])
        }
    });

    let (tmin, tmax) = combine(spans)?;
    trace!(tmin, tmax, ?flags, "swept volumes interact");

    Some(SweptHit {
        tmin,
        tmax,
        overlap: swept_overlap(a, b, tmin, tmax),
    })
}

/// Cheaper swept test for small or fast objects
///
/// Each object is reduced to the midpoint of its volume and swept against the
/// other's full volume; the pair interacts when either point enters the other
/// volume, over the union of both intervals. Platform handling matches
/// [`intersect_oct_bb`].
pub fn intersect_oct_bb_close(
    a: &Motion,
    b: &Motion,
    flags: PlatformFlags,
    tolerance: f32,
) -> Option<SweptHit> {
    let src_a = a.start();
    let src_b = b.start();
    if src_a.is_empty() || src_b.is_empty() {
        return None;
    }

    let ovel = OctVec::from_vec3(b.velocity - a.velocity);
    let mids_a = src_a.mids();
    let mids_b = src_b.mids();

    let point_a = OctAxis::ALL.map(|axis| {
        let p = mids_a[axis];
        let bounds = (p, p, src_b.mins[axis], src_b.maxs[axis]);
        if axis == OctAxis::Z {
            vertical_span(bounds, ovel[axis], flags, tolerance)
        } else {
            axis_span(&[bounds], ovel[axis])
        }
    });
    let point_b = OctAxis::ALL.map(|axis| {
        let p = mids_b[axis];
        let bounds = (src_a.mins[axis], src_a.maxs[axis], p, p);
        if axis == OctAxis::Z {
            vertical_span(bounds, ovel[axis], flags, tolerance)
        } else {
            axis_span(&[bounds], ovel[axis])
        }
    });

    let (tmin, tmax) = match (combine(point_a), combine(point_b)) {
        (Some(x), Some(y)) => (x.0.min(y.0), x.1.max(y.1)),
        (Some(x), None) | (None, Some(x)) => x,
        (None, None) => return None,
    };
    trace!(tmin, tmax, ?flags, "close sweep interacts");

    Some(SweptHit {
        tmin,
        tmax,
        overlap: swept_overlap(a, b, tmin, tmax),
    })
}
