//! Octagonal bounding volumes
//!
//! An [`OctBb`] is an axis-aligned box extended with two 45° diagonal clipping
//! planes in the horizontal plane. Every volume is described by a min/max pair
//! on five axes:
//!
//! | axis | projection |
//! |------|------------|
//! | X    | `x`        |
//! | Y    | `y`        |
//! | XY   | `x + y`    |
//! | YX   | `y - x`    |
//! | Z    | `z`        |
//!
//! The diagonal projections are not normalized: they are `√2` times the true
//! distance along the diagonal. Times computed from ratios of diagonal values
//! are unaffected, but any distance read back from a diagonal axis must be
//! multiplied by `1/√2` (see [`OctVec::to_distances`]).

use glam::Vec3;
use std::f32::consts::{FRAC_1_SQRT_2, SQRT_2};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub};

use crate::bumper::Bumper;

/// Number of octagonal axes
pub const OCT_COUNT: usize = 5;

/// One of the five axes of an octagonal volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OctAxis {
    X = 0,
    Y = 1,
    Xy = 2,
    Yx = 3,
    Z = 4,
}

impl OctAxis {
    /// All axes in storage order
    pub const ALL: [OctAxis; OCT_COUNT] = [
        OctAxis::X,
        OctAxis::Y,
        OctAxis::Xy,
        OctAxis::Yx,
        OctAxis::Z,
    ];

    /// Storage index of this axis
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for the two 45° axes
    pub fn is_diagonal(self) -> bool {
        matches!(self, OctAxis::Xy | OctAxis::Yx)
    }
}

/// A vector projected onto the five octagonal axes
///
/// Used for positions, velocities and signed penetration depths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OctVec(pub [f32; OCT_COUNT]);

impl OctVec {
    /// All components zero
    pub const ZERO: OctVec = OctVec([0.0; OCT_COUNT]);

    /// Project a 3D vector onto the octagonal axes
    ///
    /// # Example
    /// ```
    /// use ember_physics::{OctAxis, OctVec};
    /// use glam::Vec3;
    ///
    /// let v = OctVec::from_vec3(Vec3::new(3.0, 1.0, 2.0));
    /// assert_eq!(v[OctAxis::Xy], 4.0);
    /// assert_eq!(v[OctAxis::Yx], -2.0);
    /// assert_eq!(v[OctAxis::Z], 2.0);
    /// ```
    pub fn from_vec3(v: Vec3) -> Self {
        Self([v.x, v.y, v.x + v.y, v.y - v.x, v.z])
    }

    /// Same value on every axis
    pub fn splat(value: f32) -> Self {
        Self([value; OCT_COUNT])
    }

    /// True when no component is NaN or infinite
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Rescale the diagonal components so that every component is a true distance
    pub fn to_distances(mut self) -> Self {
        self[OctAxis::Xy] *= FRAC_1_SQRT_2;
        self[OctAxis::Yx] *= FRAC_1_SQRT_2;
        self
    }

    /// Per-component minimum
    pub fn min(self, other: Self) -> Self {
        let mut out = self;
        for i in 0..OCT_COUNT {
            out.0[i] = self.0[i].min(other.0[i]);
        }
        out
    }

    /// Per-component maximum
    pub fn max(self, other: Self) -> Self {
        let mut out = self;
        for i in 0..OCT_COUNT {
            out.0[i] = self.0[i].max(other.0[i]);
        }
        out
    }
}

impl Index<OctAxis> for OctVec {
    type Output = f32;

    fn index(&self, axis: OctAxis) -> &f32 {
        &self.0[axis.index()]
    }
}

impl IndexMut<OctAxis> for OctVec {
    fn index_mut(&mut self, axis: OctAxis) -> &mut f32 {
        &mut self.0[axis.index()]
    }
}

impl Add for OctVec {
    type Output = OctVec;

    fn add(mut self, rhs: OctVec) -> OctVec {
        self += rhs;
        self
    }
}

impl AddAssign for OctVec {
    fn add_assign(&mut self, rhs: OctVec) {
        for i in 0..OCT_COUNT {
            self.0[i] += rhs.0[i];
        }
    }
}

impl Sub for OctVec {
    type Output = OctVec;

    fn sub(self, rhs: OctVec) -> OctVec {
        self + (-rhs)
    }
}

impl Neg for OctVec {
    type Output = OctVec;

    fn neg(self) -> OctVec {
        self * -1.0
    }
}

impl Mul<f32> for OctVec {
    type Output = OctVec;

    fn mul(mut self, rhs: f32) -> OctVec {
        for v in self.0.iter_mut() {
            *v *= rhs;
        }
        self
    }
}

/// Octagonal bounding box
///
/// A value type: it is rebuilt from the owner's [`Bumper`] every tick and
/// copied freely. A volume is *empty* when any axis has `min >= max` or holds
/// a non-finite bound; empty volumes never interact with anything.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctBb {
    /// Lower bound per axis
    pub mins: OctVec,
    /// Upper bound per axis
    pub maxs: OctVec,
    empty: bool,
}

impl Default for OctBb {
    fn default() -> Self {
        Self::empty()
    }
}

impl OctBb {
    /// Create a volume from explicit bounds, computing the empty flag
    pub fn new(mins: OctVec, maxs: OctVec) -> Self {
        let mut bb = Self {
            mins,
            maxs,
            empty: false,
        };
        bb.validate();
        bb
    }

    /// The canonical empty volume
    pub fn empty() -> Self {
        Self {
            mins: OctVec::ZERO,
            maxs: OctVec::ZERO,
            empty: true,
        }
    }

    /// Convert a bumper into a volume relative to the owner's feet
    ///
    /// X and Y span `±size`, the diagonals span `±size_big` and Z spans
    /// `0..height`.
    pub fn from_bumper(bumper: &Bumper) -> Self {
        let mut mins = OctVec::ZERO;
        let mut maxs = OctVec::ZERO;

        mins[OctAxis::X] = -bumper.size;
        maxs[OctAxis::X] = bumper.size;
        mins[OctAxis::Y] = -bumper.size;
        maxs[OctAxis::Y] = bumper.size;
        mins[OctAxis::Xy] = -bumper.size_big;
        maxs[OctAxis::Xy] = bumper.size_big;
        mins[OctAxis::Yx] = -bumper.size_big;
        maxs[OctAxis::Yx] = bumper.size_big;
        mins[OctAxis::Z] = 0.0;
        maxs[OctAxis::Z] = bumper.height;

        Self::new(mins, maxs)
    }

    /// Convert a bumper into a world-space volume at `position`
    pub fn from_bumper_at(bumper: &Bumper, position: Vec3) -> Self {
        Self::from_bumper(bumper).translate(position)
    }

    /// Whether the volume is marked empty
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Recompute the empty flag from the bounds
    ///
    /// Returns `true` if the volume is non-empty.
    pub fn validate(&mut self) -> bool {
        self.empty = OctAxis::ALL.iter().any(|&axis| {
            let (lo, hi) = (self.mins[axis], self.maxs[axis]);
            !lo.is_finite() || !hi.is_finite() || lo >= hi
        });
        !self.empty
    }

    /// Smallest volume enclosing both
    pub fn union(&self, other: &OctBb) -> OctBb {
        if self.empty {
            return *other;
        }
        if other.empty {
            return *self;
        }
        OctBb::new(self.mins.min(other.mins), self.maxs.max(other.maxs))
    }

    /// Per-axis overlap of both volumes
    ///
    /// The result is empty if the volumes do not overlap on every axis.
    pub fn intersection(&self, other: &OctBb) -> OctBb {
        if self.empty || other.empty {
            return OctBb::empty();
        }
        let bb = OctBb::new(self.mins.max(other.mins), self.maxs.min(other.maxs));
        if bb.empty {
            OctBb::empty()
        } else {
            bb
        }
    }

    /// True when the volumes overlap on every axis
    pub fn overlaps(&self, other: &OctBb) -> bool {
        !self.intersection(other).is_empty()
    }

    /// True when every axis of `other` lies within this volume
    ///
    /// An empty volume is contained by anything; an empty volume contains
    /// nothing but other empty volumes.
    pub fn contains(&self, other: &OctBb) -> bool {
        if other.empty {
            return true;
        }
        if self.empty {
            return false;
        }
        OctAxis::ALL
            .iter()
            .all(|&axis| self.mins[axis] <= other.mins[axis] && other.maxs[axis] <= self.maxs[axis])
    }

    /// Translate all bounds by an octagonal displacement
    pub fn add_offset(&self, offset: OctVec) -> OctBb {
        if self.empty {
            return *self;
        }
        OctBb::new(self.mins + offset, self.maxs + offset)
    }

    /// Translate by a world-space displacement
    pub fn translate(&self, offset: Vec3) -> OctBb {
        self.add_offset(OctVec::from_vec3(offset))
    }

    /// Per-axis midpoints
    pub fn mids(&self) -> OctVec {
        (self.mins + self.maxs) * 0.5
    }

    /// Per-axis extents (`max - min`)
    pub fn extents(&self) -> OctVec {
        self.maxs - self.mins
    }

    /// Per-axis linear blend between two volumes
    ///
    /// `t = 0` yields `a`, `t = 1` yields `b`. Empty inputs yield the other
    /// volume unchanged.
    pub fn interpolate(a: &OctBb, b: &OctBb, t: f32) -> OctBb {
        if a.empty {
            return *b;
        }
        if b.empty {
            return *a;
        }
        OctBb::new(
            a.mins + (b.mins - a.mins) * t,
            a.maxs + (b.maxs - a.maxs) * t,
        )
    }

    /// Volume swept by this box moving at `velocity` between `tmin` and `tmax`
    pub fn swept(&self, velocity: Vec3, tmin: f32, tmax: f32) -> OctBb {
        let ovel = OctVec::from_vec3(velocity);
        let start = self.add_offset(ovel * tmin);
        let end = self.add_offset(ovel * tmax);
        start.union(&end)
    }

    /// Push every face outward by `amount` world units
    pub fn grow(&self, amount: f32) -> OctBb {
        if self.empty {
            return *self;
        }
        let mut delta = OctVec::splat(amount);
        delta[OctAxis::Xy] = amount * SQRT_2;
        delta[OctAxis::Yx] = amount * SQRT_2;
        OctBb::new(self.mins - delta, self.maxs + delta)
    }
}
