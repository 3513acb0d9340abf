use bumpalo::Bump;

use crate::interaction::SurfaceInteraction;
use crate::material::{Material, TransportMode};
use crate::reflection::bsdf::Bsdf;
use crate::reflection::specular::SpecularReflection;
use crate::spectrum::Spectrum;

/// Perfect mirror: a single specular-reflection lobe.
pub struct MirrorMaterial {
    pub reflectance: Spectrum,
}

impl MirrorMaterial {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }
}

impl Material for MirrorMaterial {
    fn compute_scattering_functions<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        _mode: TransportMode,
        _allow_multiple_lobes: bool,
    ) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si.hit.n, si.shading_n, si.shading_geom.dpdu);
        if !self.reflectance.is_black() {
            let lobe = arena.alloc(SpecularReflection { r: self.reflectance });
            bsdf.add(lobe);
        }
        bsdf
    }
}
