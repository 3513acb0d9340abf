//! `.df3` density-grid reader (§6, §9 Open Question 3): a POVRay-style
//! voxel grid used by [`crate::volume`]'s grid variant. The on-disk header
//! is read as big-endian even though some historical writers produced it
//! little-endian — §9 resolves the ambiguity in favor of the documented
//! big-endian reading, so a `.df3` generated by a little-endian tool will
//! come out transposed here; that mismatch is the original format's, not
//! this reader's.

use std::io::Read;

use crate::error::RenderError;
use crate::Float;

pub struct DensityGrid {
    pub dim_x: usize,
    pub dim_y: usize,
    pub dim_z: usize,
    /// Row-major in `(x, y, z)` order, each value normalized to `[0, 1]`.
    density: Vec<Float>,
}

impl DensityGrid {
    pub fn read_from(mut r: impl Read, path: &str) -> Result<Self, RenderError> {
        let mut header = [0u8; 6];
        r.read_exact(&mut header)
            .map_err(|e| RenderError::MalformedDensityFile { path: path.to_string(), reason: e.to_string() })?;
        let dim_x = u16::from_be_bytes([header[0], header[1]]) as usize;
        let dim_y = u16::from_be_bytes([header[2], header[3]]) as usize;
        let dim_z = u16::from_be_bytes([header[4], header[5]]) as usize;

        let n = dim_x * dim_y * dim_z;
        let mut raw = vec![0u8; n];
        r.read_exact(&mut raw).map_err(|e| RenderError::MalformedDensityFile {
            path: path.to_string(),
            reason: format!("expected {} voxels: {}", n, e),
        })?;

        let density = raw.iter().map(|&b| b as Float / 255.0).collect();
        Ok(Self { dim_x, dim_y, dim_z, density })
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dim_y + y) * self.dim_x + x
    }

    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Float {
        self.density[self.index(x, y, z)]
    }

    /// Trilinearly interpolates density at a point in `[0,1]^3` grid space
    /// (§4.10 grid volume).
    pub fn density_at(&self, p: crate::Point3f) -> Float {
        if self.dim_x == 0 || self.dim_y == 0 || self.dim_z == 0 {
            return 0.0;
        }
        let gx = (p.x * self.dim_x as Float - 0.5).clamp(0.0, (self.dim_x - 1) as Float);
        let gy = (p.y * self.dim_y as Float - 0.5).clamp(0.0, (self.dim_y - 1) as Float);
        let gz = (p.z * self.dim_z as Float - 0.5).clamp(0.0, (self.dim_z - 1) as Float);

        let x0 = gx.floor() as usize;
        let y0 = gy.floor() as usize;
        let z0 = gz.floor() as usize;
        let x1 = (x0 + 1).min(self.dim_x - 1);
        let y1 = (y0 + 1).min(self.dim_y - 1);
        let z1 = (z0 + 1).min(self.dim_z - 1);

        let tx = gx - x0 as Float;
        let ty = gy - y0 as Float;
        let tz = gz - z0 as Float;

        let lerp = crate::lerp;
        let c00 = lerp(tx, self.voxel(x0, y0, z0), self.voxel(x1, y0, z0));
        let c10 = lerp(tx, self.voxel(x0, y1, z0), self.voxel(x1, y1, z0));
        let c01 = lerp(tx, self.voxel(x0, y0, z1), self.voxel(x1, y0, z1));
        let c11 = lerp(tx, self.voxel(x0, y1, z1), self.voxel(x1, y1, z1));
        let c0 = lerp(ty, c00, c10);
        let c1 = lerp(ty, c01, c11);
        lerp(tz, c0, c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(dim: (u16, u16, u16), voxels: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&dim.0.to_be_bytes());
        buf.extend_from_slice(&dim.1.to_be_bytes());
        buf.extend_from_slice(&dim.2.to_be_bytes());
        buf.extend_from_slice(voxels);
        buf
    }

    #[test]
    fn reads_header_as_big_endian() {
        let bytes = encode((2, 2, 1), &[0, 255, 0, 255]);
        let grid = DensityGrid::read_from(&bytes[..], "test.df3").unwrap();
        assert_eq!((grid.dim_x, grid.dim_y, grid.dim_z), (2, 2, 1));
        assert_eq!(grid.voxel(1, 0, 0), 1.0);
        assert_eq!(grid.voxel(0, 0, 0), 0.0);
    }

    #[test]
    fn truncated_voxel_data_is_an_error() {
        let bytes = encode((2, 2, 2), &[0, 255]);
        assert!(DensityGrid::read_from(&bytes[..], "bad.df3").is_err());
    }

    #[test]
    fn density_at_interpolates_between_voxels() {
        let bytes = encode((2, 1, 1), &[0, 255]);
        let grid = DensityGrid::read_from(&bytes[..], "test.df3").unwrap();
        let mid = grid.density_at(crate::Point3f::new(0.5, 0.0, 0.0));
        assert!(mid > 0.0 && mid < 1.0, "expected interpolated value, got {}", mid);
    }
}
