//! Penetration depth and contact normal estimation
//!
//! Two overlapping [`OctBb`]s are reduced to a signed depth per octagonal axis,
//! then to a single contact normal and push-apart distance.
//!
//! Sign convention: depths and normals point from volume A toward volume B,
//! i.e. along the direction B has to move to get out of A.

use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_1_SQRT_2;
use tracing::trace;

use crate::oct::{OctAxis, OctBb, OctVec};

/// Tolerance on the length of a successful contact normal
const NORMAL_LENGTH_TOLERANCE: f32 = 0.01;

/// Which depth algorithm produced a contact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DepthMethod {
    /// Partial overlap, direction taken from the volume centers
    Collision,
    /// Containment or ambiguous centers, direction from the shallower side
    Pressure,
}

/// Result of contact estimation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactEstimate {
    /// Unit normal pointing from A toward B
    pub normal: Vec3,
    /// Distance B must travel along `normal` to separate
    pub depth: f32,
    pub method: DepthMethod,
}

/// Signed depth of a partial overlap
///
/// For every axis the depth is the overlap extent, signed by the direction
/// from A's midpoint to B's midpoint. Returns `None` when any axis has no
/// positive overlap or when the midpoints coincide on any axis, in which case
/// the caller falls back to [`pressure_depth`].
pub fn collision_depth(a: &OctBb, b: &OctBb) -> Option<OctVec> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let mids_a = a.mids();
    let mids_b = b.mids();

    let mut depth = OctVec::ZERO;
    for axis in OctAxis::ALL {
        let extent = a.maxs[axis].min(b.maxs[axis]) - a.mins[axis].max(b.mins[axis]);
        if !(extent > 0.0) {
            return None;
        }

        let direction = mids_b[axis] - mids_a[axis];
        if direction == 0.0 || !direction.is_finite() {
            trace!(?axis, "ambiguous contact direction");
            return None;
        }

        depth[axis] = extent.copysign(direction);
    }

    Some(depth.to_distances())
}

/// Signed depth of an overlap where one volume may contain the other
///
/// For every axis both ways out are measured: pushing B toward `+` clears A
/// after `A.max - B.min`, pushing toward `-` after `B.max - A.min`. The
/// shorter way wins. Ties are broken by the midpoint direction, then toward
/// `+`. Returns `None` only when the volumes do not overlap.
pub fn pressure_depth(a: &OctBb, b: &OctBb) -> Option<OctVec> {
    if !a.overlaps(b) {
        return None;
    }

    let mids_a = a.mids();
    let mids_b = b.mids();

    let mut depth = OctVec::ZERO;
    for axis in OctAxis::ALL {
        let up = a.maxs[axis] - b.mins[axis];
        let down = b.maxs[axis] - a.mins[axis];

        depth[axis] = if up < down {
            up
        } else if down < up {
            -down
        } else if mids_b[axis] < mids_a[axis] {
            -down
        } else {
            up
        };
    }

    Some(depth.to_distances())
}

/// Collapse a depth vector into a contact normal and push-apart distance
///
/// Two candidate normals are built by inverting the non-zero depth
/// components, one from the X/Y/Z axes and one from the XY/YX/Z axes. Each is
/// normalized and scored by the shortest distance along it that clears one
/// axis; the candidate with the smaller distance wins, the diagonal one being
/// rotated back into world XY first.
///
/// `exponent > 1` squashes the horizontal part of each candidate to model an
/// upright capsule rather than a box; `exponent == 1` leaves it untouched.
///
/// Returns `None` when no axis has a usable depth.
pub fn estimate_depth(depth: &OctVec, exponent: f32) -> Option<(Vec3, f32)> {
    let aligned = normal_candidate(
        Vec3::new(depth[OctAxis::X], depth[OctAxis::Y], depth[OctAxis::Z]),
        exponent,
    );
    let diagonal = normal_candidate(
        Vec3::new(depth[OctAxis::Xy], depth[OctAxis::Yx], depth[OctAxis::Z]),
        exponent,
    )
    .map(|(n, d)| {
        let rotated = Vec3::new(
            (n.x - n.y) * FRAC_1_SQRT_2,
            (n.x + n.y) * FRAC_1_SQRT_2,
            n.z,
        );
        (rotated, d)
    });

    let (normal, distance) = match (aligned, diagonal) {
        (Some(a), Some(d)) => {
            if a.1 <= d.1 {
                a
            } else {
                d
            }
        }
        (Some(a), None) => a,
        (None, Some(d)) => d,
        (None, None) => return None,
    };

    if (normal.length() - 1.0).abs() > NORMAL_LENGTH_TOLERANCE || !(distance > 0.0) {
        return None;
    }

    Some((normal, distance))
}

fn normal_candidate(depth: Vec3, exponent: f32) -> Option<(Vec3, f32)> {
    let invert = |d: f32| {
        if d != 0.0 && d.is_finite() {
            1.0 / d
        } else {
            0.0
        }
    };

    let raw = Vec3::new(invert(depth.x), invert(depth.y), invert(depth.z));
    let mut normal = raw.try_normalize()?;

    if exponent != 1.0 {
        let horizontal = Vec2::new(normal.x, normal.y);
        let len = horizontal.length();
        if len > 0.0 {
            let squashed = horizontal * len.powf(exponent - 1.0);
            normal = Vec3::new(squashed.x, squashed.y, normal.z).try_normalize()?;
        }
    }

    let mut distance = f32::INFINITY;
    for i in 0..3 {
        if normal[i].abs() > f32::EPSILON && depth[i] != 0.0 {
            distance = distance.min(depth[i] / normal[i]);
        }
    }

    distance.is_finite().then_some((normal, distance))
}

/// Contact normal and depth for two overlapping volumes
///
/// Partial overlaps go through [`collision_depth`]; containment, or a
/// collision depth that fails on an ambiguous direction, goes through
/// [`pressure_depth`]. The resulting normal points from `a` toward `b`.
pub fn estimate_contact_normal(a: &OctBb, b: &OctBb, exponent: f32) -> Option<ContactEstimate> {
    if a.is_empty() || b.is_empty() {
        return None;
    }

    let contained = a.contains(b) || b.contains(a);
    let (odepth, method) = match (!contained).then(|| collision_depth(a, b)).flatten() {
        Some(d) => (d, DepthMethod::Collision),
        None => (pressure_depth(a, b)?, DepthMethod::Pressure),
    };

    let (normal, depth) = estimate_depth(&odepth, exponent)?;
    trace!(?method, ?normal, depth, "contact estimated");

    Some(ContactEstimate {
        normal,
        depth,
        method,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bumper::Bumper;

    fn body(radius: f32, height: f32, pos: Vec3) -> OctBb {
        OctBb::from_bumper_at(&Bumper::cylinder(radius, height), pos)
    }

    #[test]
    fn test_collision_depth_partial_overlap() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(30.0, 5.0, 10.0));

        let depth = collision_depth(&a, &b).unwrap();
        assert!((depth[OctAxis::X] - 10.0).abs() < 1e-4);
        assert!((depth[OctAxis::Y] - 35.0).abs() < 1e-4);
        assert!((depth[OctAxis::Z] - 30.0).abs() < 1e-4);
        // B sits at -x relative to A along YX
        assert!(depth[OctAxis::Yx] < 0.0);
    }

    #[test]
    fn test_collision_depth_ambiguous_center() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(30.0, 0.0, 0.0));
        assert!(collision_depth(&a, &b).is_none());
    }

    #[test]
    fn test_collision_depth_separated() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(50.0, 5.0, 5.0));
        assert!(collision_depth(&a, &b).is_none());
    }

    #[test]
    fn test_pressure_depth_picks_shallower_side() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(5.0, 10.0, Vec3::new(12.0, -12.0, 0.0));

        let depth = pressure_depth(&a, &b).unwrap();
        // B exits A fastest through +x and -y
        assert!((depth[OctAxis::X] - 13.0).abs() < 1e-4);
        assert!((depth[OctAxis::Y] + 13.0).abs() < 1e-4);
    }

    #[test]
    fn test_pressure_depth_requires_overlap() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(100.0, 0.0, 0.0));
        assert!(pressure_depth(&a, &b).is_none());
    }

    #[test]
    fn test_estimate_depth_single_axis() {
        let mut depth = OctVec::ZERO;
        depth[OctAxis::Z] = -4.0;
        let (normal, d) = estimate_depth(&depth, 1.0).unwrap();
        assert!((normal - Vec3::NEG_Z).length() < 1e-5);
        assert!((d - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_estimate_depth_no_depth_fails() {
        assert!(estimate_depth(&OctVec::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_estimate_depth_prefers_diagonal() {
        // shallow along the XY diagonal, deep everywhere else
        let depth = OctVec([50.0, 50.0, 2.0, 0.0, 0.0]);
        let (normal, d) = estimate_depth(&depth, 1.0).unwrap();
        assert!((d - 2.0).abs() < 1e-4);
        assert!((normal.x - FRAC_1_SQRT_2).abs() < 1e-4);
        assert!((normal.y - FRAC_1_SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn test_exponent_one_is_plain_normalize() {
        let depth = OctVec([3.0, 0.0, 0.0, 0.0, 4.0]);
        let (n, _) = estimate_depth(&depth, 1.0).unwrap();
        let expected = Vec3::new(1.0 / 3.0, 0.0, 0.25).normalize();
        assert!((n - expected).length() < 1e-5);
    }

    #[test]
    fn test_exponent_squashes_horizontal() {
        let depth = OctVec([3.0, 0.0, 0.0, 0.0, 4.0]);
        let (plain, _) = estimate_depth(&depth, 1.0).unwrap();
        let (warped, _) = estimate_depth(&depth, 2.0).unwrap();
        assert!(warped.z > plain.z);
        assert!(warped.x < plain.x);
        assert!((warped.length() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_contact_normal_points_toward_b() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(30.0, 5.0, 10.0));

        let contact = estimate_contact_normal(&a, &b, 1.0).unwrap();
        assert_eq!(contact.method, DepthMethod::Collision);
        assert!(contact.normal.x > 0.5);
        assert!(contact.depth > 0.0);
    }

    #[test]
    fn test_contact_normal_falls_back_to_pressure() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(20.0, 40.0, Vec3::new(30.0, 0.0, 0.0));

        let contact = estimate_contact_normal(&a, &b, 1.0).unwrap();
        assert_eq!(contact.method, DepthMethod::Pressure);
        assert!(contact.normal.x > 0.0);
        assert!(contact.depth > 0.0);
    }

    #[test]
    fn test_contact_normal_containment() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        let b = body(5.0, 10.0, Vec3::new(-10.0, 1.0, 15.0));

        let contact = estimate_contact_normal(&a, &b, 1.0).unwrap();
        assert_eq!(contact.method, DepthMethod::Pressure);
        assert!(contact.normal.x < 0.0);
    }

    #[test]
    fn test_contact_normal_empty_volume() {
        let a = body(20.0, 40.0, Vec3::ZERO);
        assert!(estimate_contact_normal(&a, &OctBb::empty(), 1.0).is_none());
    }
}
