//! Photon map engine (§4.6-§4.8): `Photon`, `PhotonMap` save/load in the
//! persisted `"YAF_PHOTONMAPv1"` format, the balanced point kd-tree for
//! k-NN gather, a coarse hash-grid alternative, and the emission build
//! driver.

use std::io::{Read, Write};

use crate::error::{RenderError, RenderResult};
use crate::photon::kdtree::{HasPosition, PointKdTree};
use crate::spectrum::Spectrum;
use crate::{Float, Point3f, Vec3f};

pub mod builder;
pub mod hashgrid;
pub mod kdtree;

const MAGIC: &[u8] = b"YAF_PHOTONMAPv1";

/// One deposited photon: position, incidence direction (needed by the
/// caustic/diffuse density estimate's BSDF evaluation), and power.
#[derive(Clone, Copy, Debug)]
pub struct Photon {
    pub pos: Point3f,
    pub wi: Vec3f,
    pub power: Spectrum,
}

impl HasPosition for Photon {
    fn position(&self) -> Point3f {
        self.pos
    }
}

/// A built photon map: the accumulated photons plus the kd-tree over them
/// (§4.6), with `paths` recording how many emitted light paths produced
/// the set (used by the `1/(π·r²·paths)` density-estimate normalization).
pub struct PhotonMap {
    pub name: String,
    pub paths: i32,
    pub search_radius: Float,
    pub threads: i32,
    photons: Vec<Photon>,
    tree: Option<PointKdTree<Photon>>,
}

impl PhotonMap {
    pub fn new(name: impl Into<String>, search_radius: Float, threads: i32) -> Self {
        Self { name: name.into(), paths: 0, search_radius, threads, photons: Vec::new(), tree: None }
    }

    pub fn push(&mut self, photon: Photon) {
        self.photons.push(photon);
    }

    pub fn extend(&mut self, photons: impl IntoIterator<Item = Photon>) {
        self.photons.extend(photons);
    }

    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    /// Builds the k-NN tree over the accumulated photons; call once
    /// emission finishes (mirrors the source's `updateTree()`, §4.8 step 4).
    pub fn update_tree(&mut self) {
        self.tree = if self.photons.is_empty() { None } else { Some(PointKdTree::build(self.photons.clone())) };
    }

    /// k-NN gather for a density estimate at `p` (§4.6): up to `k`
    /// `(dist_squared, photon)` pairs and the final search radius squared.
    pub fn gather(&self, p: Point3f, k: usize, max_dist2: Float) -> (Vec<(Float, Photon)>, Float) {
        match &self.tree {
            Some(tree) => tree.lookup(p, k, max_dist2),
            None => (Vec::new(), max_dist2),
        }
    }

    pub fn save(&self, mut w: impl Write) -> RenderResult<()> {
        w.write_all(MAGIC)?;
        write_string(&mut w, &self.name)?;
        w.write_all(&self.paths.to_le_bytes())?;
        w.write_all(&self.search_radius.to_le_bytes())?;
        w.write_all(&self.threads.to_le_bytes())?;
        w.write_all(&(self.photons.len() as u32).to_le_bytes())?;
        for p in &self.photons {
            w.write_all(&p.pos.x.to_le_bytes())?;
            w.write_all(&p.pos.y.to_le_bytes())?;
            w.write_all(&p.pos.z.to_le_bytes())?;
            w.write_all(&p.power.r.to_le_bytes())?;
            w.write_all(&p.power.g.to_le_bytes())?;
            w.write_all(&p.power.b.to_le_bytes())?;
        }
        Ok(())
    }

    /// Loads a map previously written by `save`. The persisted format
    /// carries only position and power per photon (§6/§8), not the
    /// incidence direction `Photon::wi` needs for density-estimate BSDF
    /// evaluation — loaded photons get a zero `wi`, the same loss of
    /// directional weighting the original on-disk format has.
    pub fn load(mut r: impl Read) -> RenderResult<Self> {
        let mut magic = [0u8; 15];
        r.read_exact(&mut magic)?;
        if magic != *MAGIC {
            return Err(RenderError::PhotonMapFormat("bad magic".to_string()));
        }
        let name = read_string(&mut r)?;
        let paths = read_i32(&mut r)?;
        let search_radius = read_f32(&mut r)?;
        let threads = read_i32(&mut r)?;
        let count = read_u32(&mut r)? as usize;
        let mut photons = Vec::with_capacity(count);
        for _ in 0..count {
            let x = read_f32(&mut r)?;
            let y = read_f32(&mut r)?;
            let z = read_f32(&mut r)?;
            let rr = read_f32(&mut r)?;
            let gg = read_f32(&mut r)?;
            let bb = read_f32(&mut r)?;
            photons.push(Photon {
                pos: Point3f::new(x, y, z),
                wi: Vec3f::new(0.0, 0.0, 0.0),
                power: Spectrum::rgb(rr, gg, bb),
            });
        }
        let mut map = Self { name, paths, search_radius, threads, photons, tree: None };
        map.update_tree();
        Ok(map)
    }
}

fn write_string(w: &mut impl Write, s: &str) -> std::io::Result<()> {
    w.write_all(&(s.len() as u32).to_le_bytes())?;
    w.write_all(s.as_bytes())
}

fn read_string(r: &mut impl Read) -> std::io::Result<String> {
    let len = read_u32(r)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn read_i32(r: &mut impl Read) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32(r: &mut impl Read) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_f32(r: &mut impl Read) -> std::io::Result<Float> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(Float::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{point3f, vec3f};

    #[test]
    fn save_then_load_round_trips_position_and_power() {
        let mut map = PhotonMap::new("diffuse", 0.5, 4);
        map.paths = 1000;
        map.push(Photon { pos: point3f!(1.0, 2.0, 3.0), wi: vec3f!(0.0, 0.0, 1.0), power: Spectrum::rgb(0.5, 0.25, 0.1) });
        map.update_tree();

        let mut buf = Vec::new();
        map.save(&mut buf).unwrap();
        let loaded = PhotonMap::load(&buf[..]).unwrap();

        assert_eq!(loaded.paths, 1000);
        assert_eq!(loaded.len(), 1);
        let (found, _) = loaded.gather(point3f!(1.0, 2.0, 3.0), 1, Float::INFINITY);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.power, Spectrum::rgb(0.5, 0.25, 0.1));
    }

    #[test]
    fn load_rejects_bad_magic() {
        let bytes = b"not a photon map................".to_vec();
        assert!(PhotonMap::load(&bytes[..]).is_err());
    }
}
