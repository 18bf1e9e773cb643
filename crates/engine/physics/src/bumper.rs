//! Loose collision shape read from an object's profile

use serde::{Deserialize, Serialize};
use std::f32::consts::SQRT_2;

/// Static collision shape of an object
///
/// `size` is the half-width of the footprint along X and Y, `size_big` the
/// half-width along the (unnormalized) diagonal axes and `height` the vertical
/// extent measured up from the object's feet.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bumper {
    pub size: f32,
    pub size_big: f32,
    pub height: f32,
}

impl Bumper {
    /// Octagon approximating an upright cylinder of the given radius
    pub fn cylinder(radius: f32, height: f32) -> Self {
        Self {
            size: radius,
            size_big: radius * SQRT_2,
            height,
        }
    }

    /// Axis-aligned square footprint with half-width `half_size`
    pub fn square(half_size: f32, height: f32) -> Self {
        Self {
            size: half_size,
            size_big: half_size * 2.0,
            height,
        }
    }

    /// Radius used for wall tests and breadcrumbs
    pub fn radius(&self) -> f32 {
        self.size
    }
}

impl Default for Bumper {
    fn default() -> Self {
        Self::cylinder(0.0, 0.0)
    }
}
