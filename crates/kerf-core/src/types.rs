//! Toolpath value types.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// One tool position produced by a toolpath.
///
/// `a` is the rotary axis angle in degrees, about X.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolPose {
    pub position: DVec3,
    pub a: f64,
}

impl ToolPose {
    /// Create a new pose
    #[inline]
    pub const fn new(position: DVec3, a: f64) -> Self {
        Self { position, a }
    }

    /// Linear blend between two poses
    #[inline]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Distance travelled by the tool tip between two poses
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        self.position.distance(other.position)
    }
}
