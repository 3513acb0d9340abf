use bumpalo::Bump;

use crate::interaction::SurfaceInteraction;
use crate::material::{Material, TransportMode};
use crate::reflection::bsdf::Bsdf;
use crate::reflection::specular::{FresnelSpecularReflection, SpecularTransmission};
use crate::spectrum::Spectrum;
use crate::Float;

/// Smooth dielectric: Fresnel-weighted reflection plus refraction, the
/// combination the direct-lighting integrator's specular recursion needs to
/// handle both `specular_reflect` and `specular_transmit`.
pub struct GlassMaterial {
    pub reflectance: Spectrum,
    pub transmittance: Spectrum,
    pub eta: Float,
}

impl GlassMaterial {
    pub fn new(reflectance: Spectrum, transmittance: Spectrum, eta: Float) -> Self {
        Self {
            reflectance,
            transmittance,
            eta,
        }
    }
}

impl Material for GlassMaterial {
    fn compute_scattering_functions<'a>(
        &self,
        si: &SurfaceInteraction,
        arena: &'a Bump,
        _mode: TransportMode,
        _allow_multiple_lobes: bool,
    ) -> Bsdf<'a> {
        let mut bsdf = Bsdf::new(si.hit.n, si.shading_n, si.shading_geom.dpdu);
        bsdf.set_eta(self.eta);
        if !self.reflectance.is_black() {
            let lobe = arena.alloc(FresnelSpecularReflection {
                r: self.reflectance,
                eta_i: 1.0,
                eta_t: self.eta,
            });
            bsdf.add(lobe);
        }
        if !self.transmittance.is_black() {
            let lobe = arena.alloc(SpecularTransmission {
                t: self.transmittance,
                eta_a: 1.0,
                eta_b: self.eta,
            });
            bsdf.add(lobe);
        }
        bsdf
    }
}
