//! Per-object displacement accumulator
//!
//! Every pairwise collision touching an object during a tick pushes a
//! correction into the object's [`Apos`]. Corrections from opposite sides
//! cancel instead of adding up: the accumulator keeps the largest push in
//! each direction per axis and evaluates to their sum.

use glam::Vec3;
use tracing::warn;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Apos {
    /// Most negative contribution per axis, never above zero
    pub mins: Vec3,
    /// Most positive contribution per axis, never below zero
    pub maxs: Vec3,
    /// Plain running total of all contributions
    pub sum: Vec3,
    count: u32,
}

impl Apos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget all contributions
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Add one displacement contribution
    pub fn add(&mut self, correction: Vec3) {
        if !correction.is_finite() {
            warn!(?correction, "ignoring non-finite correction");
            return;
        }
        self.mins = self.mins.min(correction);
        self.maxs = self.maxs.max(correction);
        self.sum += correction;
        self.count += 1;
    }

    /// Add a contribution on a single axis (0 = x, 1 = y, 2 = z)
    pub fn add_axis(&mut self, axis: usize, amount: f32) {
        let mut correction = Vec3::ZERO;
        correction[axis] = amount;
        self.add(correction);
    }

    /// Combine two accumulators as if all contributions went into one
    pub fn merge(&mut self, other: &Apos) {
        self.mins = self.mins.min(other.mins);
        self.maxs = self.maxs.max(other.maxs);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Net correction: the largest push each way, cancelled against each other
    pub fn evaluate(&self) -> Vec3 {
        self.maxs + self.mins
    }

    /// Number of contributions received
    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
