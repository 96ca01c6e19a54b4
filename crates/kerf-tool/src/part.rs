//! Primitive solids a bit is built from.
//!
//! Every primitive stands on the bit's local Y axis. `base` lifts it along
//! that axis away from the tool tip.

use glam::DVec3;
use kerf_core::Aabb;
use serde::{Deserialize, Serialize};

/// One primitive solid of a bit, in the bit's local frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum BitPart {
    /// Upright cylinder spanning `base..base + length`
    Cylinder { base: f64, length: f64, radius: f64 },
    /// Sphere centred at `base`
    Sphere { base: f64, radius: f64 },
    /// Truncated cone, `radius1` at `base` and `radius2` at `base + height`
    Cone {
        base: f64,
        height: f64,
        radius1: f64,
        radius2: f64,
    },
}

impl BitPart {
    #[inline]
    pub const fn cylinder(base: f64, length: f64, radius: f64) -> Self {
        Self::Cylinder {
            base,
            length,
            radius,
        }
    }

    #[inline]
    pub const fn sphere(base: f64, radius: f64) -> Self {
        Self::Sphere { base, radius }
    }

    #[inline]
    pub const fn cone(base: f64, height: f64, radius1: f64, radius2: f64) -> Self {
        Self::Cone {
            base,
            height,
            radius1,
            radius2,
        }
    }

    /// Point-in-solid test for a point already in the bit's local frame.
    #[inline]
    pub fn contains_local(&self, p: DVec3) -> bool {
        let radial = p.x * p.x + p.z * p.z;
        match *self {
            Self::Cylinder {
                base,
                length,
                radius,
            } => {
                let y = p.y - base;
                (0.0..=length).contains(&y) && radial <= radius * radius
            }
            Self::Sphere { base, radius } => {
                let y = p.y - base;
                radial + y * y <= radius * radius
            }
            Self::Cone {
                base,
                height,
                radius1,
                radius2,
            } => {
                let y = p.y - base;
                if height <= 0.0 || !(0.0..=height).contains(&y) {
                    return false;
                }
                let r = (radius2 - radius1) * y / height + radius1;
                radial <= r * r
            }
        }
    }

    /// Local-frame box enclosing the primitive.
    pub fn local_bounds(&self) -> Aabb {
        let (base, top, radius) = match *self {
            Self::Cylinder {
                base,
                length,
                radius,
            } => (base, base + length, radius),
            Self::Sphere { base, radius } => (base - radius, base + radius, radius),
            Self::Cone {
                base,
                height,
                radius1,
                radius2,
            } => (base, base + height, radius1.max(radius2)),
        };
        Aabb::new(
            DVec3::new(-radius, base, -radius),
            DVec3::new(radius, top, radius),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cylinder_respects_base_and_length() {
        let part = BitPart::cylinder(1.0, 2.0, 0.5);
        assert!(part.contains_local(DVec3::new(0.0, 1.0, 0.0)));
        assert!(part.contains_local(DVec3::new(0.3, 2.5, 0.3)));
        assert!(part.contains_local(DVec3::new(0.0, 3.0, 0.5)));
        assert!(!part.contains_local(DVec3::new(0.0, 0.9, 0.0)));
        assert!(!part.contains_local(DVec3::new(0.0, 3.1, 0.0)));
        assert!(!part.contains_local(DVec3::new(0.4, 2.0, 0.4)));
    }

    #[test]
    fn sphere_centred_on_base() {
        let part = BitPart::sphere(2.0, 1.0);
        assert!(part.contains_local(DVec3::new(0.0, 1.0, 0.0)));
        assert!(part.contains_local(DVec3::new(0.0, 2.0, 1.0)));
        assert!(!part.contains_local(DVec3::new(0.0, 0.9, 0.0)));
        assert!(!part.contains_local(DVec3::new(0.8, 2.8, 0.0)));
    }

    #[test]
    fn cone_radius_grows_with_height() {
        let part = BitPart::cone(0.0, 2.0, 0.0, 1.0);
        assert!(part.contains_local(DVec3::new(0.0, 0.0, 0.0)));
        assert!(!part.contains_local(DVec3::new(0.6, 1.0, 0.0)));
        assert!(part.contains_local(DVec3::new(0.5, 1.0, 0.0)));
        assert!(part.contains_local(DVec3::new(0.0, 2.0, 1.0)));
        assert!(!part.contains_local(DVec3::new(0.0, 2.1, 0.0)));
    }

    #[test]
    fn cone_honours_base_offset() {
        let part = BitPart::cone(1.0, 1.0, 0.5, 0.5);
        assert!(!part.contains_local(DVec3::new(0.0, 0.5, 0.0)));
        assert!(part.contains_local(DVec3::new(0.0, 1.5, 0.0)));
    }

    #[test]
    fn degenerate_cone_is_empty() {
        let part = BitPart::cone(0.0, 0.0, 1.0, 1.0);
        assert!(!part.contains_local(DVec3::ZERO));
    }

    #[test]
    fn local_bounds_enclose_parts() {
        let sphere = BitPart::sphere(1.0, 1.0).local_bounds();
        assert_eq!(sphere.min, DVec3::new(-1.0, 0.0, -1.0));
        assert_eq!(sphere.max, DVec3::new(1.0, 2.0, 1.0));

        let cone = BitPart::cone(0.5, 2.0, 0.1, 0.8).local_bounds();
        assert_eq!(cone.min, DVec3::new(-0.8, 0.5, -0.8));
        assert_eq!(cone.max, DVec3::new(0.8, 2.5, 0.8));
    }
}
