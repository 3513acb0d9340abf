//! Sky volume (§4.10): analytic Rayleigh+Mie scattering coefficients over
//! an atmosphere shell, with Schlick's polynomial approximation
//! `k = 1.55g − 0.55g³` standing in for the Henyey-Greenstein Mie lobe.

use std::f32::consts::PI;

use crate::spectrum::Spectrum;
use crate::volume::{MediumSample, VolumeRegion};
use crate::{Bounds3f, Float, Point3f, Vec3f};

pub struct SkyVolume {
    pub bound: Bounds3f,
    pub sigma_rayleigh: Spectrum,
    pub sigma_mie: Float,
    /// Mie asymmetry parameter; `k` is derived from this via Schlick's fit.
    pub mie_g: Float,
}

impl SkyVolume {
    fn k(&self) -> Float {
        1.55 * self.mie_g - 0.55 * self.mie_g.powi(3)
    }
}

fn rayleigh_phase(cos_theta: Float) -> Float {
    3.0 / (16.0 * PI) * (1.0 + cos_theta * cos_theta)
}

/// Schlick's rational approximation to the Henyey-Greenstein phase
/// function, parameterized by `k` rather than `g` directly.
fn mie_phase_schlick(cos_theta: Float, k: Float) -> Float {
    let denom = 1.0 + k * cos_theta;
    (1.0 - k * k) / (4.0 * PI * denom * denom)
}

impl VolumeRegion for SkyVolume {
    fn world_bound(&self) -> Bounds3f {
        self.bound
    }

    fn sample_at(&self, _p: Point3f) -> MediumSample {
        MediumSample {
            sigma_a: Spectrum::uniform(0.0),
            sigma_s: self.sigma_rayleigh + Spectrum::uniform(self.sigma_mie),
            emission: Spectrum::uniform(0.0),
        }
    }

    fn phase(&self, _p: Point3f, wo: Vec3f, wi: Vec3f) -> Float {
        use cgmath::InnerSpace;
        let cos_theta = wo.dot(wi).clamp(-1.0, 1.0);
        rayleigh_phase(cos_theta) + mie_phase_schlick(cos_theta, self.k())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{point3f, vec3f};

    #[test]
    fn phase_integrates_to_a_positive_value_in_every_direction() {
        let sky = SkyVolume {
            bound: Bounds3f::with_bounds(point3f!(-1e4, -1e4, -1e4), point3f!(1e4, 1e4, 1e4)),
            sigma_rayleigh: Spectrum::uniform(5e-6),
            sigma_mie: 2e-6,
            mie_g: 0.76,
        };
        let wo = vec3f!(0.0, 0.0, 1.0);
        let forward = sky.phase(point3f!(0.0, 0.0, 0.0), wo, vec3f!(0.0, 0.0, 1.0));
        let backward = sky.phase(point3f!(0.0, 0.0, 0.0), wo, vec3f!(0.0, 0.0, -1.0));
        assert!(forward > 0.0 && backward > 0.0);
        assert!(forward > backward, "Mie lobe should favor forward scattering");
    }
}
