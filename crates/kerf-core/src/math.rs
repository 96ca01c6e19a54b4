//! Math utilities and helpers.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Rotate `v` about the X axis by `degrees`, right-handed.
#[inline]
pub fn rotate_x(v: DVec3, degrees: f64) -> DVec3 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    DVec3::new(v.x, v.y * cos - v.z * sin, v.y * sin + v.z * cos)
}

/// Axis-Aligned Bounding Box in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Aabb {
    /// Create a new AABB from min and max corners
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Inverted box that any `expand_to_include` or `merge` overrides.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            min: DVec3::INFINITY,
            max: DVec3::NEG_INFINITY,
        }
    }

    /// Smallest box holding every point.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Self {
        points.into_iter().fold(Self::empty(), |mut acc, p| {
            acc.expand_to_include(p);
            acc
        })
    }

    /// True when no point has been added yet
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// The eight corners, min corner first.
    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, b.y, a.z),
            DVec3::new(b.x, b.y, b.z),
            DVec3::new(a.x, b.y, b.z),
        ]
    }

    /// Get the center of the AABB
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the AABB
    #[inline]
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Check if a point is inside the AABB
    #[inline]
    pub fn contains_point(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Check if this AABB intersects another
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Whether the straight segment from `a` to `b` touches the box.
    ///
    /// Slab test clipped to the segment parameter range `[0, 1]`.
    pub fn intersects_segment(&self, a: DVec3, b: DVec3) -> bool {
        let dir = b - a;
        let mut t_near = 0.0_f64;
        let mut t_far = 1.0_f64;

        for axis in 0..3 {
            let (origin, d) = (a[axis], dir[axis]);
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (t1, t2) = ((lo - origin) * inv, (hi - origin) * inv);
            t_near = t_near.max(t1.min(t2));
            t_far = t_far.min(t1.max(t2));
            if t_near > t_far {
                return false;
            }
        }
        true
    }

    /// Expand AABB to include a point
    #[inline]
    pub fn expand_to_include(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Merge two AABBs
    #[inline]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rotate_x_quarter_turn() {
        let v = rotate_x(DVec3::new(1.0, 1.0, 0.0), 90.0);
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-12);
        assert_relative_eq!(v.z, 1.0);

        let back = rotate_x(v, -90.0);
        assert_relative_eq!(back.y, 1.0);
        assert_relative_eq!(back.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn aabb_contains_point() {
        let aabb = Aabb::new(DVec3::ZERO, DVec3::ONE);
        assert!(aabb.contains_point(DVec3::splat(0.5)));
        assert!(aabb.contains_point(DVec3::ZERO));
        assert!(!aabb.contains_point(DVec3::new(1.5, 0.5, 0.5)));
    }

    #[test]
    fn aabb_intersects() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::splat(0.5), DVec3::splat(1.5));
        let c = Aabb::new(DVec3::splat(2.0), DVec3::splat(3.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn empty_box_is_replaced_by_points() {
        let aabb = Aabb::from_points([DVec3::new(1.0, -2.0, 3.0), DVec3::new(-1.0, 2.0, 0.0)]);
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, DVec3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.max, DVec3::new(1.0, 2.0, 3.0));
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn segment_crossing_box() {
        let aabb = Aabb::new(DVec3::ZERO, DVec3::ONE);
        assert!(aabb.intersects_segment(DVec3::new(-1.0, 0.5, 0.5), DVec3::new(2.0, 0.5, 0.5)));
        assert!(aabb.intersects_segment(DVec3::splat(0.2), DVec3::splat(0.4)));
        assert!(!aabb.intersects_segment(DVec3::new(-1.0, 2.0, 0.5), DVec3::new(2.0, 2.0, 0.5)));
        // stops short of the box
        assert!(!aabb.intersects_segment(DVec3::new(-3.0, 0.5, 0.5), DVec3::new(-1.0, 0.5, 0.5)));
    }
}
