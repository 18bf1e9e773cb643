//! End-to-end collision scenarios: sweeping, platforms and contact normals

use ember_physics::{
    estimate_contact_normal, intersect_oct_bb, intersect_oct_bb_close, Bumper, DepthMethod, Motion,
    OctAxis, OctBb, PlatformFlags, PLATFORM_TOLERANCE,
};
use glam::Vec3;

fn character() -> Bumper {
    Bumper::cylinder(20.0, 40.0)
}

fn platform() -> Bumper {
    Bumper::square(100.0, 10.0)
}

#[test]
fn fast_mover_hits_late_in_the_tick() {
    let a = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::new(70.0, 0.0, 0.0));
    let b = Motion::from_bumper(&character(), Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);

    let hit = intersect_oct_bb(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).unwrap();
    assert!((hit.tmin - 60.0 / 70.0).abs() < 1e-4);
    assert_eq!(hit.tmax, 1.0);
    assert!(!hit.overlap.is_empty());
}

#[test]
fn slow_mover_does_not_reach() {
    let a = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
    let b = Motion::from_bumper(&character(), Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);

    assert!(intersect_oct_bb(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());
    assert!(intersect_oct_bb_close(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());
}

#[test]
fn swapping_members_keeps_the_interval() {
    let a = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::new(70.0, 0.0, 0.0));
    let b = Motion::from_bumper(&character(), Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO);

    let ab = intersect_oct_bb(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).unwrap();
    let ba = intersect_oct_bb(&b, &a, PlatformFlags::NONE, PLATFORM_TOLERANCE).unwrap();
    assert!((ab.tmin - ba.tmin).abs() < 1e-5);
    assert!((ab.tmax - ba.tmax).abs() < 1e-5);
}

#[test]
fn diagonal_approach_is_caught_by_diagonal_axes() {
    // footprints overlap on X and Y but the corners are cut off on XY
    let a = Motion::from_bumper(&Bumper::cylinder(10.0, 10.0), Vec3::ZERO, Vec3::ZERO);
    let b = Motion::from_bumper(
        &Bumper::cylinder(10.0, 10.0),
        Vec3::new(19.0, 19.0, 0.0),
        Vec3::ZERO,
    );

    assert!(a.start().maxs[OctAxis::X] > b.start().mins[OctAxis::X]);
    assert!(a.start().maxs[OctAxis::Y] > b.start().mins[OctAxis::Y]);
    assert!(intersect_oct_bb(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());
}

#[test]
fn rider_inside_tolerance_band_interacts() {
    let base = Motion::from_bumper(&platform(), Vec3::ZERO, Vec3::ZERO);
    let rider_z = 10.0 + PLATFORM_TOLERANCE - 1.0;
    let rider = Motion::from_bumper(&character(), Vec3::new(0.0, 0.0, rider_z), Vec3::ZERO);

    let hit = intersect_oct_bb(&base, &rider, PlatformFlags::OBJ1, PLATFORM_TOLERANCE).unwrap();
    assert_eq!((hit.tmin, hit.tmax), (0.0, 1.0));

    // without the platform flag the band does not exist
    assert!(intersect_oct_bb(&base, &rider, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());
    // the flag must name the lower member
    assert!(intersect_oct_bb(&base, &rider, PlatformFlags::OBJ2, PLATFORM_TOLERANCE).is_none());
}

#[test]
fn rider_above_tolerance_band_is_ignored() {
    let base = Motion::from_bumper(&platform(), Vec3::ZERO, Vec3::ZERO);
    let rider_z = 10.0 + PLATFORM_TOLERANCE + 1.0;
    let rider = Motion::from_bumper(&character(), Vec3::new(0.0, 0.0, rider_z), Vec3::ZERO);

    assert!(intersect_oct_bb(&base, &rider, PlatformFlags::OBJ1, PLATFORM_TOLERANCE).is_none());
}

#[test]
fn falling_rider_enters_band_mid_tick() {
    let base = Motion::from_bumper(&platform(), Vec3::ZERO, Vec3::ZERO);
    let rider = Motion::from_bumper(
        &character(),
        Vec3::new(0.0, 0.0, 100.0),
        Vec3::new(0.0, 0.0, -80.0),
    );

    // band top is at 60: the rider's feet cross it after 40 of 80 units
    let hit = intersect_oct_bb(&rider, &base, PlatformFlags::OBJ2, PLATFORM_TOLERANCE).unwrap();
    assert!((hit.tmin - 0.5).abs() < 1e-5);
    assert_eq!(hit.tmax, 1.0);
}

#[test]
fn both_platforms_pick_the_widest_interval() {
    // the upper platform drops through the lower one, so each rides the other
    // at one end of the tick
    let low = Motion::from_bumper(&platform(), Vec3::ZERO, Vec3::ZERO);
    let high = Motion::from_bumper(
        &platform(),
        Vec3::new(0.0, 0.0, 40.0),
        Vec3::new(0.0, 0.0, -100.0),
    );

    let both = intersect_oct_bb(&low, &high, PlatformFlags::BOTH, PLATFORM_TOLERANCE).unwrap();
    let one = intersect_oct_bb(&low, &high, PlatformFlags::OBJ1, PLATFORM_TOLERANCE).unwrap();
    assert_eq!((both.tmin, both.tmax), (0.0, 1.0));
    assert!((one.tmax - 0.5).abs() < 1e-5);
}

#[test]
fn degenerate_volume_never_collides() {
    let a = Motion::new(OctBb::empty(), Vec3::ZERO, Vec3::X);
    let b = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::ZERO);
    assert!(intersect_oct_bb(&a, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());

    let nan = Motion::from_bumper(&character(), Vec3::new(f32::NAN, 0.0, 0.0), Vec3::ZERO);
    assert!(intersect_oct_bb(&nan, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());

    let nan_velocity = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::new(0.0, f32::NAN, 0.0));
    assert!(intersect_oct_bb(&nan_velocity, &b, PlatformFlags::NONE, PLATFORM_TOLERANCE).is_none());
}

#[test]
fn close_variant_catches_tunneling_point() {
    let bullet = Motion::from_bumper(
        &Bumper::cylinder(1.0, 2.0),
        Vec3::new(-300.0, 0.0, 10.0),
        Vec3::new(600.0, 0.0, 0.0),
    );
    let target = Motion::from_bumper(&character(), Vec3::ZERO, Vec3::ZERO);

    let hit =
        intersect_oct_bb_close(&bullet, &target, PlatformFlags::NONE, PLATFORM_TOLERANCE).unwrap();
    assert!(hit.tmin > 0.4 && hit.tmin < 0.5);
    assert!(hit.tmax > 0.5 && hit.tmax < 0.6);
}

#[test]
fn contact_normal_points_from_first_to_second() {
    let a = OctBb::from_bumper_at(&character(), Vec3::ZERO);
    let b = OctBb::from_bumper_at(&character(), Vec3::new(30.0, 5.0, 10.0));

    let ab = estimate_contact_normal(&a, &b, 1.0).unwrap();
    let ba = estimate_contact_normal(&b, &a, 1.0).unwrap();
    assert_eq!(ab.method, DepthMethod::Collision);
    assert!(ab.normal.x > 0.0);
    assert!(ba.normal.x < 0.0);
    assert!((ab.normal.length() - 1.0).abs() < 0.01);
    assert!(ab.depth > 0.0);
}

#[test]
fn nested_volumes_use_pressure() {
    let outer = OctBb::from_bumper_at(&Bumper::square(100.0, 200.0), Vec3::ZERO);
    let inner = OctBb::from_bumper_at(&Bumper::cylinder(5.0, 50.0), Vec3::new(90.0, 0.0, 50.0));

    let estimate = estimate_contact_normal(&outer, &inner, 1.0).unwrap();
    assert_eq!(estimate.method, DepthMethod::Pressure);
    // shortest way out is through the +X face
    assert!(estimate.normal.x > 0.9);
    assert!(estimate.depth > 0.0);
}
