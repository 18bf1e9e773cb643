//! Collision core for Ember
//!
//! Objects are bounded by octagonal prisms ([`OctBb`]) tested over the
//! motion of a whole tick ([`intersect_oct_bb`]), with platform riders
//! detected through a tolerance band above the platform's top. Contacts are
//! turned into push-apart normals ([`estimate_contact_normal`]), summed per
//! body ([`Apos`]), and applied by [`PhysicsWorld::step`]. Bodies that still
//! end up inside walls are rewound along their [`BreadcrumbList`].
//!
//! Z is vertical; velocities are displacements per tick.

mod apos;
mod body;
mod breadcrumb;
mod bumper;
mod config;
mod depth;
mod error;
mod map;
mod oct;
mod swept;
mod world;

pub use apos::Apos;
pub use body::{Body, BodyHandle, BodySet};
pub use breadcrumb::{Breadcrumb, BreadcrumbList, DEFAULT_BREADCRUMB_CAPACITY};
pub use bumper::Bumper;
pub use config::PhysicsConfig;
pub use depth::{
    collision_depth, estimate_contact_normal, estimate_depth, pressure_depth, ContactEstimate,
    DepthMethod,
};
pub use error::{ConfigError, Result, WorldError};
pub use map::{snap_to_tile_center, CollisionBits, MapQuery, OpenMap};
pub use oct::{OctAxis, OctBb, OctVec, OCT_COUNT};
pub use swept::{
    intersect_oct_bb, intersect_oct_bb_close, Motion, PlatformFlags, SweptHit, PLATFORM_TOLERANCE,
};
pub use world::{Contact, PhysicsWorld, Recovery, StepReport};

// Re-export for convenience
pub use glam;
