//! The cutting tool: a union of primitives under one rigid pose.

use glam::DVec3;
use kerf_core::{math::rotate_x, Aabb};
use tracing::{info, warn};

use crate::part::BitPart;
use crate::shape::ToolShape;

/// A cutting tool.
///
/// The pose places the tool tip at `position` in a frame rotated about X by
/// `tilt` degrees. A world point `w` maps to the local point
/// `rotate_x(w, -tilt) - position`.
#[derive(Clone, Debug)]
pub struct Bit {
    parts: Vec<BitPart>,
    position: DVec3,
    tilt: f64,
    // sin/cos of -tilt, refreshed by set_pose
    sin: f64,
    cos: f64,
}

impl Default for Bit {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Bit {
    /// A bit at the origin, untilted.
    pub fn new(parts: Vec<BitPart>) -> Self {
        Self {
            parts,
            position: DVec3::ZERO,
            tilt: 0.0,
            sin: 0.0,
            cos: 1.0,
        }
    }

    pub fn from_shape(shape: &ToolShape) -> Self {
        Self::new(shape.parts())
    }

    #[inline]
    pub fn parts(&self) -> &[BitPart] {
        &self.parts
    }

    #[inline]
    pub const fn position(&self) -> DVec3 {
        self.position
    }

    /// Tilt about X in degrees
    #[inline]
    pub const fn tilt(&self) -> f64 {
        self.tilt
    }

    /// Move the tool. Part geometry is untouched.
    pub fn set_pose(&mut self, position: DVec3, tilt: f64) {
        let (sin, cos) = (-tilt).to_radians().sin_cos();
        self.position = position;
        self.tilt = tilt;
        self.sin = sin;
        self.cos = cos;
    }

    /// Swap in a new part list, keeping the pose.
    pub fn replace(&mut self, parts: Vec<BitPart>) {
        self.parts = parts;
    }

    /// Apply a tool shape directive. A directive that fails to parse is
    /// logged and the current parts are kept.
    pub fn apply_directive(&mut self, line: &str) -> bool {
        match line.parse::<ToolShape>() {
            Ok(shape) => {
                info!(%shape, "tool change");
                self.replace(shape.parts());
                true
            }
            Err(err) => {
                warn!(directive = line, %err, "ignoring tool directive");
                false
            }
        }
    }

    /// World point in the bit's local frame
    #[inline]
    pub fn to_local(&self, world: DVec3) -> DVec3 {
        DVec3::new(
            world.x,
            world.y * self.cos - world.z * self.sin,
            world.y * self.sin + world.z * self.cos,
        ) - self.position
    }

    /// True if any part contains the world point.
    #[inline]
    pub fn point_in(&self, world: DVec3) -> bool {
        let local = self.to_local(world);
        self.parts.iter().any(|part| part.contains_local(local))
    }

    /// World-space box around every part at the current pose. Empty for a
    /// bit without parts.
    pub fn bounding_box(&self) -> Aabb {
        self.parts.iter().fold(Aabb::empty(), |acc, part| {
            let local = part.local_bounds();
            let world = Aabb::from_points(
                local
                    .corners()
                    .into_iter()
                    .map(|c| rotate_x(c + self.position, self.tilt)),
            );
            acc.merge(&world)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ball(radius: f64) -> Bit {
        Bit::from_shape(&ToolShape::BallMill {
            length: 10.0,
            radius,
        })
    }

    #[test]
    fn union_of_parts() {
        let mut bit = ball(1.0);
        bit.set_pose(DVec3::new(5.0, 5.0, 5.0), 0.0);
        // inside the ball only
        assert!(bit.point_in(DVec3::new(5.0, 5.2, 5.0)));
        // inside the shank only
        assert!(bit.point_in(DVec3::new(5.9, 10.0, 5.0)));
        assert!(!bit.point_in(DVec3::new(5.0, 4.9, 5.0)));
        assert!(!bit.point_in(DVec3::new(7.0, 10.0, 5.0)));
    }

    #[test]
    fn pose_moves_tool_not_parts() {
        let mut bit = Bit::new(vec![BitPart::sphere(0.0, 1.0)]);
        let before = bit.parts().to_vec();
        bit.set_pose(DVec3::new(3.0, 0.0, 0.0), 30.0);
        assert_eq!(bit.parts(), &before[..]);
        assert!(!bit.point_in(DVec3::ZERO));
    }

    #[test]
    fn tilt_rotates_about_x() {
        let mut bit = Bit::new(vec![BitPart::cylinder(0.0, 4.0, 0.5)]);
        bit.set_pose(DVec3::ZERO, 90.0);
        // the local +Y axis points along world +Z
        assert!(bit.point_in(DVec3::new(0.0, 0.0, 3.0)));
        assert!(!bit.point_in(DVec3::new(0.0, 3.0, 0.0)));
        assert_relative_eq!(bit.to_local(DVec3::new(0.0, 0.0, 3.0)).y, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn bounding_box_contains_tilted_tool() {
        let mut bit = ball(1.0);
        bit.set_pose(DVec3::new(1.0, 2.0, -1.0), 35.0);
        let bbox = bit.bounding_box();
        for i in 0..=20 {
            for j in 0..=20 {
                for k in 0..=20 {
                    let p = DVec3::new(
                        -4.0 + f64::from(i) * 0.5,
                        -8.0 + f64::from(j) * 1.0,
                        -8.0 + f64::from(k) * 1.0,
                    );
                    if bit.point_in(p) {
                        assert!(bbox.contains_point(p), "{p} outside {bbox:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn untilted_box_is_tight() {
        let mut bit = Bit::new(vec![BitPart::sphere(0.0, 2.0)]);
        bit.set_pose(DVec3::new(5.0, 5.0, 5.0), 0.0);
        let bbox = bit.bounding_box();
        assert_eq!(bbox.min, DVec3::splat(3.0));
        assert_eq!(bbox.max, DVec3::splat(7.0));
    }

    #[test]
    fn empty_bit_has_empty_box() {
        assert!(Bit::default().bounding_box().is_empty());
        assert!(!Bit::default().point_in(DVec3::ZERO));
    }

    #[test]
    fn bad_directive_keeps_parts() {
        let mut bit = ball(1.0);
        let before = bit.parts().to_vec();
        assert!(!bit.apply_directive("(BallMill 10)"));
        assert_eq!(bit.parts(), &before[..]);
        assert!(bit.apply_directive("(FlatMill 5 0.5)"));
        assert_eq!(bit.parts(), &[BitPart::cylinder(0.0, 5.0, 0.5)]);
    }
}
