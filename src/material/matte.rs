use bumpalo::Bump;

use crate::interaction::SurfaceInteraction;
use crate::material::{Material, TransportMode};
use crate::reflection::bsdf::Bsdf;
use crate::reflection::lambertian::LambertianReflection;
use crate::spectrum::Spectrum;

/// Purely diffuse material, the matte BSDF from the original construction
/// helpers, stripped of its texture lookup (textures are out of scope) down
/// to a constant reflectance.
pub struct MatteMaterial {
    pub reflectance: Spectrum,
}

impl MatteMaterial {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }
}

impl Material for MatteMaterial {
    fn compute_scattering_functions<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        _mode: TransportMode,
        _allow_multiple_lobes: bool,
    ) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si.hit.n, si.shading_n, si.shading_geom.dpdu);
        if !self.reflectance.is_black() {
            let lobe = arena.alloc(LambertianReflection::new(self.reflectance));
            bsdf.add(lobe);
        }
        bsdf
    }
}
