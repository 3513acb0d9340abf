//! Density-grid volume (§4.10): `.df3`-backed `σ_t = ρ(x) · σ_base`.

use crate::df3::DensityGrid;
use crate::spectrum::Spectrum;
use crate::volume::{MediumSample, VolumeRegion};
use crate::{Bounds3f, Point3f};

pub struct GridVolume {
    pub bound: Bounds3f,
    pub grid: DensityGrid,
    pub sigma_base: Spectrum,
    pub emission: Spectrum,
}

impl GridVolume {
    /// Maps a world-space point inside `bound` to the grid's `[0,1]^3`
    /// parametric space.
    fn to_grid_space(&self, p: Point3f) -> Point3f {
        let d = self.bound.diagonal();
        Point3f::new(
            if d.x != 0.0 { (p.x - self.bound.min.x) / d.x } else { 0.0 },
            if d.y != 0.0 { (p.y - self.bound.min.y) / d.y } else { 0.0 },
            if d.z != 0.0 { (p.z - self.bound.min.z) / d.z } else { 0.0 },
        )
    }
}

impl VolumeRegion for GridVolume {
    fn world_bound(&self) -> Bounds3f {
        self.bound
    }

    fn sample_at(&self, p: Point3f) -> MediumSample {
        let density = self.grid.density_at(self.to_grid_space(p));
        let sigma_t = self.sigma_base * density;
        MediumSample { sigma_a: sigma_t, sigma_s: Spectrum::uniform(0.0), emission: self.emission * density }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point3f;

    #[test]
    fn density_scales_absorption() {
        let mut header = Vec::new();
        header.extend_from_slice(&2u16.to_be_bytes());
        header.extend_from_slice(&1u16.to_be_bytes());
        header.extend_from_slice(&1u16.to_be_bytes());
        header.extend_from_slice(&[0, 255]);
        let grid = DensityGrid::read_from(&header[..], "t.df3").unwrap();

        let volume = GridVolume {
            bound: Bounds3f::with_bounds(point3f!(0.0, 0.0, 0.0), point3f!(1.0, 1.0, 1.0)),
            grid,
            sigma_base: Spectrum::uniform(2.0),
            emission: Spectrum::uniform(0.0),
        };

        let dense = volume.sample_at(point3f!(0.9, 0.5, 0.5));
        let sparse = volume.sample_at(point3f!(0.1, 0.5, 0.5));
        assert!(dense.sigma_t().r > sparse.sigma_t().r);
    }
}
