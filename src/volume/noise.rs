//! Noise volume (§4.10): a hand-rolled value-noise field passed through a
//! sigmoid with `sharpness`/`cover` controls, for scenes with no baked
//! `.df3` grid available. No noise crate appears anywhere in the pack this
//! engine is grounded on, so this is a minimal lattice value-noise with
//! trilinear interpolation and hashed lattice corners, not a port.

use cgmath::EuclideanSpace;

use crate::spectrum::Spectrum;
use crate::volume::{MediumSample, VolumeRegion};
use crate::{Bounds3f, Float, Point3f};

fn hash(x: i32, y: i32, z: i32) -> u32 {
    let mut h = x as u32;
    h = h.wrapping_mul(374761393).wrapping_add(y as u32);
    h = h.wrapping_mul(668265263) ^ (z as u32).wrapping_mul(2246822519);
    h = (h ^ (h >> 13)).wrapping_mul(1274126177);
    h ^ (h >> 16)
}

fn lattice_value(x: i32, y: i32, z: i32) -> Float {
    (hash(x, y, z) as Float / u32::MAX as Float) * 2.0 - 1.0
}

/// Trilinearly-interpolated value noise at `p`, in lattice units.
fn value_noise(p: Point3f) -> Float {
    let x0 = p.x.floor();
    let y0 = p.y.floor();
    let z0 = p.z.floor();
    let tx = p.x - x0;
    let ty = p.y - y0;
    let tz = p.z - z0;
    let (ix, iy, iz) = (x0 as i32, y0 as i32, z0 as i32);

    let lerp = crate::lerp;
    let c00 = lerp(tx, lattice_value(ix, iy, iz), lattice_value(ix + 1, iy, iz));
    let c10 = lerp(tx, lattice_value(ix, iy + 1, iz), lattice_value(ix + 1, iy + 1, iz));
    let c01 = lerp(tx, lattice_value(ix, iy, iz + 1), lattice_value(ix + 1, iy, iz + 1));
    let c11 = lerp(tx, lattice_value(ix, iy + 1, iz + 1), lattice_value(ix + 1, iy + 1, iz + 1));
    let c0 = lerp(ty, c00, c10);
    let c1 = lerp(ty, c01, c11);
    lerp(tz, c0, c1)
}

pub struct NoiseVolume {
    pub bound: Bounds3f,
    pub scale: Float,
    pub sharpness: Float,
    pub cover: Float,
    pub sigma_base: Spectrum,
}

impl NoiseVolume {
    /// Maps raw noise in `[-1,1]` through a sigmoid gated by `cover`, steepened
    /// by `sharpness`, and clamped to `[0,1]` density.
    fn density_at_world(&self, p: Point3f) -> Float {
        let n = value_noise(Point3f::from_vec(p.to_vec() * self.scale));
        let shaped = 1.0 / (1.0 + (-self.sharpness * (n - self.cover)).exp());
        shaped.clamp(0.0, 1.0)
    }
}

impl VolumeRegion for NoiseVolume {
    fn world_bound(&self) -> Bounds3f {
        self.bound
    }

    fn sample_at(&self, p: Point3f) -> MediumSample {
        let density = self.density_at_world(p);
        MediumSample { sigma_a: self.sigma_base * density, sigma_s: Spectrum::uniform(0.0), emission: Spectrum::uniform(0.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point3f;

    #[test]
    fn higher_cover_increases_average_density() {
        let bound = Bounds3f::with_bounds(point3f!(0.0, 0.0, 0.0), point3f!(10.0, 10.0, 10.0));
        let make = |cover: Float| NoiseVolume { bound, scale: 0.3, sharpness: 4.0, cover, sigma_base: Spectrum::uniform(1.0) };
        let low_cover = make(0.8);
        let high_cover = make(-0.8);

        let sample_pts: Vec<Point3f> = (0..20).map(|i| point3f!(i as f32 * 0.37, i as f32 * 0.21, i as f32 * 0.11)).collect();
        let avg = |v: &NoiseVolume| -> f32 {
            sample_pts.iter().map(|&p| v.density_at_world(p)).sum::<f32>() / sample_pts.len() as f32
        };
        assert!(avg(&high_cover) > avg(&low_cover));
    }
}
