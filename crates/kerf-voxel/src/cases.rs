//! Per-configuration triangle lists with precomputed face normals.

use std::sync::OnceLock;

use glam::{DVec3, Vec3};
use kerf_core::CUBE_CORNERS;

use crate::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};

/// Triangles emitted for one cube configuration.
#[derive(Clone, Debug, Default)]
pub struct CubeCase {
    /// Vertex positions relative to the cube's minimum corner, in voxel
    /// units. Three consecutive entries form a triangle.
    pub vertices: Vec<DVec3>,
    /// One face normal per triangle
    pub normals: Vec<Vec3>,
}

impl CubeCase {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.normals.len()
    }
}

/// All 256 cube configurations.
#[derive(Debug)]
pub struct CaseTable {
    cases: Vec<CubeCase>,
}

impl CaseTable {
    fn build() -> Self {
        let midpoints: [DVec3; 12] = EDGE_CORNERS.map(|[a, b]| {
            let (a, b) = (corner(a), corner(b));
            (a + b) * 0.5
        });

        let cases = (0..256)
            .map(|config| {
                if EDGE_TABLE[config] == 0 {
                    return CubeCase::default();
                }
                let vertices: Vec<DVec3> = TRI_TABLE[config]
                    .iter()
                    .take_while(|&&edge| edge >= 0)
                    .map(|&edge| midpoints[edge as usize])
                    .collect();
                let normals = vertices
                    .chunks_exact(3)
                    .map(|tri| {
                        let n = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize();
                        n.as_vec3()
                    })
                    .collect();
                CubeCase { vertices, normals }
            })
            .collect();

        Self { cases }
    }

    /// Triangles for a configuration byte
    #[inline]
    pub fn case(&self, config: u8) -> &CubeCase {
        &self.cases[usize::from(config)]
    }
}

fn corner(n: usize) -> DVec3 {
    let [x, y, z] = CUBE_CORNERS[n];
    DVec3::new(f64::from(x), f64::from(y), f64::from(z))
}

/// The process-wide case table, built on first use.
pub fn case_table() -> &'static CaseTable {
    static TABLE: OnceLock<CaseTable> = OnceLock::new();
    TABLE.get_or_init(CaseTable::build)
}

/// Configuration byte from the solidity of the eight cube corners.
#[inline]
pub fn cube_config(solid: [bool; 8]) -> u8 {
    solid
        .iter()
        .enumerate()
        .fold(0u8, |acc, (n, &s)| if s { acc | (1 << n) } else { acc })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn uniform_cubes_emit_nothing() {
        let table = case_table();
        assert!(table.case(0).is_empty());
        assert!(table.case(255).is_empty());
    }

    #[test]
    fn table_is_built_once() {
        assert!(std::ptr::eq(case_table(), case_table()));
    }

    #[test]
    fn single_corner_cuts_its_three_edges() {
        let corners = [true, false, false, false, false, false, false, false];
        let case = case_table().case(cube_config(corners));
        assert_eq!(case.triangle_count(), 1);
        for expected in [
            DVec3::new(0.5, 0.0, 0.0),
            DVec3::new(0.0, 0.5, 0.0),
            DVec3::new(0.0, 0.0, 0.5),
        ] {
            assert!(case.vertices.contains(&expected));
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let table = case_table();
        for config in 0..=255u8 {
            let case = table.case(config);
            assert_eq!(case.vertices.len(), case.triangle_count() * 3);
            for n in &case.normals {
                assert_relative_eq!(n.length(), 1.0, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn config_bits_follow_corner_order() {
        let mut solid = [false; 8];
        solid[2] = true;
        solid[7] = true;
        assert_eq!(cube_config(solid), 0b1000_0100);
        assert_eq!(cube_config([true; 8]), 255);
    }
}
