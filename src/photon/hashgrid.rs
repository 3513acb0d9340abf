//! Secondary photon index (§4.7, C7): a uniform grid over cubic cells,
//! used above a configurable photon count instead of the kd-tree, per
//! `src/photon/hashgrid.cc`'s `pushPhoton`/`updateGrid`/`gather` split.

use crate::photon::kdtree::HasPosition;
use crate::photon::Photon;
use crate::{Bounds3f, Float};

/// Large odd primes mixed with the cell coordinates, as in the original's
/// three-coordinate hash.
const PRIME_X: i64 = 73_856_093;
const PRIME_Y: i64 = 19_349_663;
const PRIME_Z: i64 = 83_492_791;

pub struct HashGrid {
    cell_size: Float,
    inv_cell_size: Float,
    grid_size: usize,
    bound: Bounds3f,
    buckets: Vec<Vec<Photon>>,
    pending: Vec<Photon>,
}

impl HashGrid {
    pub fn new(cell_size: Float, grid_size: usize, bound: Bounds3f) -> Self {
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            grid_size,
            bound,
            buckets: Vec::new(),
            pending: Vec::new(),
        }
    }

    fn cell_coord(&self, p: crate::Point3f) -> (i64, i64, i64) {
        let d = p - self.bound.min;
        (
            (d.x * self.inv_cell_size) as i64,
            (d.y * self.inv_cell_size) as i64,
            (d.z * self.inv_cell_size) as i64,
        )
    }

    fn hash(&self, ix: i64, iy: i64, iz: i64) -> usize {
        let h = (ix.wrapping_mul(PRIME_X)) ^ (iy.wrapping_mul(PRIME_Y)) ^ (iz.wrapping_mul(PRIME_Z));
        (h.rem_euclid(self.grid_size as i64)) as usize
    }

    pub fn push_photon(&mut self, p: Photon) {
        self.pending.push(p);
    }

    /// Rebuilds bucket contents from every pushed photon without
    /// reallocating the outer bucket array once it exists (mirrors the
    /// original's reuse of `hash_grid_` across calls).
    pub fn update_grid(&mut self) {
        if self.buckets.is_empty() {
            self.buckets.resize_with(self.grid_size, Vec::new);
        } else {
            for bucket in &mut self.buckets {
                bucket.clear();
            }
        }
        for p in self.pending.drain(..) {
            let (ix, iy, iz) = self.cell_coord(p.position());
            let idx = self.hash(ix, iy, iz);
            self.buckets[idx].push(p);
        }
    }

    /// Scans only the cells within a `ceil(r/cell_size)` neighborhood of
    /// `p`'s cell (§4.7).
    pub fn gather(&self, p: crate::Point3f, sq_radius: Float) -> Vec<(Float, Photon)> {
        if self.buckets.is_empty() {
            return Vec::new();
        }
        let radius = sq_radius.sqrt();
        let (cx, cy, cz) = self.cell_coord(p);
        let reach = (radius * self.inv_cell_size).ceil() as i64 + 1;

        let mut found = Vec::new();
        for iz in (cz - reach)..=(cz + reach) {
            for iy in (cy - reach)..=(cy + reach) {
                for ix in (cx - reach)..=(cx + reach) {
                    let idx = self.hash(ix, iy, iz);
                    for photon in &self.buckets[idx] {
                        let d = photon.position() - p;
                        let dist2 = d.x * d.x + d.y * d.y + d.z * d.z;
                        if dist2 < sq_radius {
                            found.push((dist2, *photon));
                        }
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::Spectrum;
    use crate::{point3f, vec3f};

    #[test]
    fn gather_finds_photons_within_radius_only() {
        let bound = Bounds3f::with_bounds(point3f!(-10.0, -10.0, -10.0), point3f!(10.0, 10.0, 10.0));
        let mut grid = HashGrid::new(0.5, 4096, bound);
        grid.push_photon(Photon { pos: point3f!(0.0, 0.0, 0.0), wi: vec3f!(0.0, 0.0, 1.0), power: Spectrum::uniform(1.0) });
        grid.push_photon(Photon { pos: point3f!(5.0, 0.0, 0.0), wi: vec3f!(0.0, 0.0, 1.0), power: Spectrum::uniform(1.0) });
        grid.update_grid();

        let found = grid.gather(point3f!(0.1, 0.0, 0.0), 1.0);
        assert_eq!(found.len(), 1);
    }
}
