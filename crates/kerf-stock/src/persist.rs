//! Binary grid files.
//!
//! Layout, all little-endian:
//!
//! ```text
//! f64      resolution
//! f32 x 3  start
//! f32 x 3  bounds
//! u64      voxel count (padded lattice)
//! u8 x n   deleted bits, packed MSB-first, n = ceil(count / 8)
//! ```

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use glam::Vec3;
use kerf_core::{Error, GridDims, Result, VoxelIndex};
use kerf_voxel::VoxelBits;
use tracing::info;

use crate::config::GridConfig;
use crate::grid::VoxelGrid;

impl VoxelGrid {
    /// Write the grid to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!(
            path = %path.display(),
            deleted = self.deleted_count(),
            total = self.dims().voxel_count(),
            "saved grid"
        );
        Ok(())
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        let config = self.config();
        writer.write_all(&config.resolution.to_le_bytes())?;
        for v in [config.start.as_vec3(), config.bounds.as_vec3()] {
            for c in v.to_array() {
                writer.write_all(&c.to_le_bytes())?;
            }
        }
        writer.write_all(&(self.deleted.len() as u64).to_le_bytes())?;
        writer.write_all(&self.deleted.to_packed())?;
        Ok(())
    }

    /// Load a grid from `path`. With `flip` set the stock is mirrored about
    /// its Y midplane.
    pub fn load(path: impl AsRef<Path>, flip: bool) -> Result<Self> {
        let path = path.as_ref();
        let grid = Self::read_from(BufReader::new(File::open(path)?), flip)?;
        info!(
            path = %path.display(),
            deleted = grid.deleted_count(),
            total = grid.dims().voxel_count(),
            flip,
            "loaded grid"
        );
        Ok(grid)
    }

    pub fn read_from<R: Read>(mut reader: R, flip: bool) -> Result<Self> {
        let resolution = f64::from_le_bytes(read_array(&mut reader)?);
        let start = read_vec3(&mut reader)?;
        let bounds = read_vec3(&mut reader)?;
        let count = u64::from_le_bytes(read_array(&mut reader)?);

        let config = GridConfig::new(start.as_dvec3(), bounds.as_dvec3(), resolution);
        config
            .validate()
            .map_err(|err| Error::InvalidData(format!("grid header: {err}")))?;

        let expected = GridDims::new(config.maxstep()).padded_len();
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        if count != expected {
            return Err(Error::InvalidData(format!(
                "grid holds {count} voxels but its header implies {expected}"
            )));
        }

        let len = count.div_ceil(8);
        let mut packed = Vec::new();
        reader.take(len as u64).read_to_end(&mut packed)?;
        if packed.len() != len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("grid data ends after {} of {len} bytes", packed.len()),
            )
            .into());
        }
        let mut grid = Self::new(config)?;
        let mut deleted = VoxelBits::from_packed(packed, count)?;
        seal_border(&grid, &mut deleted);
        if flip {
            deleted = mirror_y(&grid, &deleted);
        }
        grid.install_deleted(deleted);
        Ok(grid)
    }
}

fn read_array<const N: usize, R: Read>(reader: &mut R) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

fn read_vec3<R: Read>(reader: &mut R) -> Result<Vec3> {
    let x = f32::from_le_bytes(read_array(reader)?);
    let y = f32::from_le_bytes(read_array(reader)?);
    let z = f32::from_le_bytes(read_array(reader)?);
    Ok(Vec3::new(x, y, z))
}

/// Force the padding border to air.
fn seal_border(grid: &VoxelGrid, deleted: &mut VoxelBits) {
    let dims = grid.dims();
    for offset in 0..deleted.len() {
        if !dims.contains(dims.unflat(offset)) {
            deleted.set(offset, true);
        }
    }
}

/// `out[i, j, k] = bits[i, maxstep.y - 1 - j, k]` inside the stock.
fn mirror_y(grid: &VoxelGrid, bits: &VoxelBits) -> VoxelBits {
    let dims = grid.dims();
    let maxstep = dims.maxstep();
    let mut out = VoxelBits::repeat(true, bits.len());
    for i in 0..maxstep.x {
        for j in 0..maxstep.y {
            for k in 0..maxstep.z {
                let from = dims.flat(VoxelIndex::new(i, maxstep.y - 1 - j, k));
                out.set(dims.flat(VoxelIndex::new(i, j, k)), bits.get(from));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DVec3, IVec3};
    use kerf_tool::{Bit, BitPart};

    const HEADER_LEN: usize = 8 + 12 + 12 + 8;

    fn carved_grid() -> VoxelGrid {
        let mut grid = VoxelGrid::new(GridConfig::new(
            DVec3::new(0.5, -1.0, 2.0),
            DVec3::new(10.0, 10.0, 10.0),
            1.0,
        ))
        .unwrap();
        let mut bit = Bit::new(vec![BitPart::sphere(0.0, 2.0)]);
        bit.set_pose(DVec3::new(5.5, 4.0, 7.0), 0.0);
        grid.remove_intersection(&bit);
        grid
    }

    fn to_bytes(grid: &VoxelGrid) -> Vec<u8> {
        let mut bytes = Vec::new();
        grid.write_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn header_layout() {
        let grid = carved_grid();
        let bytes = to_bytes(&grid);
        let count = 12 * 12 * 12;
        assert_eq!(bytes.len(), HEADER_LEN + count / 8);
        assert_eq!(bytes[..8], 1.0f64.to_le_bytes());
        assert_eq!(bytes[8..12], 0.5f32.to_le_bytes());
        assert_eq!(bytes[20..24], 10.0f32.to_le_bytes());
        assert_eq!(bytes[32..40], (count as u64).to_le_bytes());
        // voxel (-1, -1, -1) is padding, so the first bit is set
        assert_eq!(bytes[HEADER_LEN] & 0x80, 0x80);
    }

    #[test]
    fn roundtrip_preserves_grid() {
        let grid = carved_grid();
        let loaded = VoxelGrid::read_from(to_bytes(&grid).as_slice(), false).unwrap();
        assert_eq!(loaded.resolution(), grid.resolution());
        assert_eq!(loaded.start(), grid.start());
        assert_eq!(loaded.bounds(), grid.bounds());
        assert_eq!(loaded.maxstep(), grid.maxstep());
        assert_eq!(loaded.deleted, grid.deleted);
        assert!(loaded.deleted_count() > 0);
        assert!(loaded.is_dirty());
    }

    #[test]
    fn loaded_grid_rebuilds_entrenchment() {
        let grid = carved_grid();
        let loaded = VoxelGrid::read_from(to_bytes(&grid).as_slice(), false).unwrap();
        let m = grid.maxstep();
        for x in -1..=m.x {
            for y in -1..=m.y {
                for z in -1..=m.z {
                    let v = VoxelIndex::new(x, y, z);
                    assert_eq!(loaded.is_entrenched(v), grid.is_entrenched(v), "{v:?}");
                }
            }
        }
    }

    #[test]
    fn flip_mirrors_about_y() {
        let grid = carved_grid();
        let flipped = VoxelGrid::read_from(to_bytes(&grid).as_slice(), true).unwrap();
        let m = grid.maxstep();
        for x in 0..m.x {
            for y in 0..m.y {
                for z in 0..m.z {
                    assert_eq!(
                        flipped.is_deleted(VoxelIndex::new(x, y, z)),
                        grid.is_deleted(VoxelIndex::new(x, m.y - 1 - y, z))
                    );
                }
            }
        }
        assert!(flipped.is_deleted_fast(VoxelIndex::new(0, -1, 0)));
        assert!(flipped.is_deleted_fast(VoxelIndex::new(0, m.y, 0)));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let mut bytes = to_bytes(&carved_grid());
        bytes[32..40].copy_from_slice(&999u64.to_le_bytes());
        assert!(matches!(
            VoxelGrid::read_from(bytes.as_slice(), false),
            Err(Error::InvalidData(_))
        ));
    }

    fn header(resolution: f64, bounds: f32, count: u64) -> Vec<u8> {
        let mut bytes = resolution.to_le_bytes().to_vec();
        for c in [0.0f32, 0.0, 0.0, bounds, bounds, bounds] {
            bytes.extend_from_slice(&c.to_le_bytes());
        }
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes
    }

    #[test]
    fn overflowing_header_is_invalid_data() {
        let bytes = header(1.0, 1e7, 0);
        assert_eq!(bytes.len(), HEADER_LEN);
        assert!(matches!(
            VoxelGrid::read_from(bytes.as_slice(), false),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn large_header_with_wrong_count_is_invalid_data() {
        // checked before any lattice storage is allocated
        let bytes = header(1.0, 1500.0, 999);
        assert!(matches!(
            VoxelGrid::read_from(bytes.as_slice(), false),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn large_header_without_data_is_io_error() {
        let count = 1502u64 * 1502 * 1502;
        let mut bytes = header(1.0, 1500.0, count);
        bytes.extend_from_slice(&[0xff; 64]);
        assert!(matches!(
            VoxelGrid::read_from(bytes.as_slice(), false),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn truncated_file_is_io_error() {
        let bytes = to_bytes(&carved_grid());
        for cut in [4, HEADER_LEN - 1, bytes.len() - 1] {
            assert!(matches!(
                VoxelGrid::read_from(&bytes[..cut], false),
                Err(Error::Io(_))
            ));
        }
    }

    #[test]
    fn nonsense_header_is_invalid_data() {
        let mut bytes = to_bytes(&carved_grid());
        bytes[..8].copy_from_slice(&(-1.0f64).to_le_bytes());
        assert!(matches!(
            VoxelGrid::read_from(bytes.as_slice(), false),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn padding_is_forced_to_air() {
        let grid = carved_grid();
        let mut bytes = to_bytes(&grid);
        bytes[HEADER_LEN] = 0;
        let loaded = VoxelGrid::read_from(bytes.as_slice(), false).unwrap();
        assert!(loaded.is_deleted_fast(VoxelIndex::new(-1, -1, -1)));
        assert_eq!(loaded.deleted, grid.deleted);
    }

    #[test]
    fn save_and_load_file() {
        let grid = carved_grid();
        let path = std::env::temp_dir().join(format!("kerf-grid-{}.bin", std::process::id()));
        grid.save(&path).unwrap();
        let loaded = VoxelGrid::load(&path, false);
        std::fs::remove_file(&path).unwrap();
        let loaded = loaded.unwrap();
        assert_eq!(loaded.deleted, grid.deleted);
        assert_eq!(loaded.maxstep(), IVec3::splat(10));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("kerf-grid-does-not-exist.bin");
        assert!(matches!(VoxelGrid::load(path, false), Err(Error::Io(_))));
    }
}
