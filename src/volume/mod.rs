//! Participating-media integration (C10, §4.10): a `VolumeRegion`
//! capability set composes with the surface integrator via
//! `T(ray)·L_surface + in-scatter + emission`, estimated by ray-marching
//! the region's world-space AABB.

use crate::integrator::uniform_sample_one_light;
use crate::reflection::bsdf::Bsdf;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{Bounds3f, Float, Point3f, Ray, Vec3f};

pub mod grid;
pub mod noise;
pub mod sky;

/// One ray-marching step's local medium properties.
#[derive(Clone, Copy, Debug)]
pub struct MediumSample {
    pub sigma_a: Spectrum,
    pub sigma_s: Spectrum,
    pub emission: Spectrum,
}

impl MediumSample {
    pub fn sigma_t(&self) -> Spectrum {
        self.sigma_a + self.sigma_s
    }
}

/// A region of participating media: its world-space AABB plus local
/// absorption/scattering/emission and a phase function. `Empty` is the
/// degenerate case every surface-only scene uses implicitly.
pub trait VolumeRegion: Sync + Send {
    fn world_bound(&self) -> Bounds3f;

    fn sample_at(&self, p: Point3f) -> MediumSample;

    /// Evaluates the phase function `p(wo, wi)` at `p`, normalized so its
    /// integral over the sphere is 1 (an isotropic default of `1/4π`
    /// suffices for `Empty`/`Homogeneous`; `Sky` overrides with
    /// Rayleigh+Mie).
    fn phase(&self, p: Point3f, wo: Vec3f, wi: Vec3f) -> Float {
        let _ = (p, wo, wi);
        crate::sampling::uniform_sphere_pdf()
    }

    /// Closed-form transmittance over `ray` clipped to this region's AABB,
    /// when the medium is locally constant enough for one (homogeneous) or
    /// requires ray-marching (grid/noise/sky, handled by the default via
    /// `VolumeIntegrator::march`).
    fn homogeneous_sigma_t(&self) -> Option<Spectrum> {
        None
    }
}

pub struct EmptyVolume;

impl VolumeRegion for EmptyVolume {
    fn world_bound(&self) -> Bounds3f {
        Bounds3f::empty()
    }

    fn sample_at(&self, _p: Point3f) -> MediumSample {
        MediumSample { sigma_a: Spectrum::uniform(0.0), sigma_s: Spectrum::uniform(0.0), emission: Spectrum::uniform(0.0) }
    }

    fn homogeneous_sigma_t(&self) -> Option<Spectrum> {
        Some(Spectrum::uniform(0.0))
    }
}

pub struct HomogeneousVolume {
    pub bound: Bounds3f,
    pub sigma_a: Spectrum,
    pub sigma_s: Spectrum,
    pub emission: Spectrum,
}

impl VolumeRegion for HomogeneousVolume {
    fn world_bound(&self) -> Bounds3f {
        self.bound
    }

    fn sample_at(&self, _p: Point3f) -> MediumSample {
        MediumSample { sigma_a: self.sigma_a, sigma_s: self.sigma_s, emission: self.emission }
    }

    fn homogeneous_sigma_t(&self) -> Option<Spectrum> {
        Some(self.sigma_a + self.sigma_s)
    }
}

/// Ray-marching step size and jitter for the non-closed-form volume kinds
/// (§4.10: "ray-marching... at a configured step size, jittered by a single
/// sample to remove banding").
pub struct VolumeIntegrator {
    pub step_size: Float,
}

impl VolumeIntegrator {
    pub fn new(step_size: Float) -> Self {
        Self { step_size: step_size.max(1e-4) }
    }

    /// Transmittance of `ray` through `region`, clipped to the region's
    /// world-space AABB and `ray.t_max`.
    pub fn transmittance(&self, region: &dyn VolumeRegion, ray: &Ray) -> Spectrum {
        let (t0, t1) = match region.world_bound().intersect_test(ray) {
            Some(t) => t,
            None => return Spectrum::uniform(1.0),
        };
        let t1 = t1.min(ray.t_max);
        if t0 >= t1 {
            return Spectrum::uniform(1.0);
        }

        if let Some(sigma_t) = region.homogeneous_sigma_t() {
            let length = t1 - t0;
            return (sigma_t * length).exp_neg();
        }

        let mut optical_depth = Spectrum::uniform(0.0);
        let mut t = t0;
        while t < t1 {
            let dt = self.step_size.min(t1 - t);
            let p = ray.at(t + dt * 0.5);
            optical_depth += region.sample_at(p).sigma_t() * dt;
            t += dt;
        }
        optical_depth.exp_neg()
    }

    /// Transmittance-weighted surface radiance plus ray-marched in-scatter
    /// and emission along `ray` up to `t_hit` (§4.10's composed integral).
    /// `bsdf`/`intersect` are only needed for in-scatter's direct-light
    /// term; pass `None` region for the degenerate empty-scene case.
    #[allow(clippy::too_many_arguments)]
    pub fn incident_radiance(
        &self,
        region: Option<&dyn VolumeRegion>,
        ray: &Ray,
        t_hit: Float,
        surface_radiance: Spectrum,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        surface_bsdf: Option<(&crate::SurfaceInteraction<'_>, &Bsdf<'_>)>,
    ) -> Spectrum {
        let region = match region {
            Some(r) => r,
            None => return surface_radiance,
        };

        let bound = region.world_bound();
        let (t0, t1_raw) = match bound.intersect_test(ray) {
            Some(t) => t,
            None => return surface_radiance,
        };
        let t1 = t1_raw.min(t_hit);
        if t0 >= t1 {
            return surface_radiance;
        }

        let jitter = sampler.get_1d() * self.step_size;
        let mut transmittance = Spectrum::uniform(1.0);
        let mut in_scatter = Spectrum::uniform(0.0);

        let mut t = t0 + jitter;
        while t < t1 {
            let dt = self.step_size.min(t1 - t);
            let p = ray.at(t);
            let medium = region.sample_at(p);
            let sigma_t = medium.sigma_t();

            in_scatter += transmittance * medium.emission * dt;

            if !medium.sigma_s.is_black() {
                if let Some((intersect, bsdf)) = surface_bsdf {
                    let direct = uniform_sample_one_light(intersect, bsdf, scene, &bumpalo::Bump::new(), sampler);
                    in_scatter += transmittance * medium.sigma_s * direct * dt;
                }
            }

            transmittance = transmittance * (sigma_t * dt).exp_neg();
            t += dt;
        }

        transmittance * surface_radiance + in_scatter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{point3f, vec3f};

    #[test]
    fn homogeneous_transmittance_matches_beers_law() {
        let region = HomogeneousVolume {
            bound: Bounds3f::with_bounds(point3f!(-10.0, -10.0, -10.0), point3f!(10.0, 10.0, 10.0)),
            sigma_a: Spectrum::uniform(0.5),
            sigma_s: Spectrum::uniform(0.5),
            emission: Spectrum::uniform(0.0),
        };
        let integrator = VolumeIntegrator::new(0.1);
        let ray = Ray { origin: point3f!(0.0, 0.0, -0.5), dir: vec3f!(0.0, 0.0, 1.0), t_max: 1.0, time: 0.0 };
        let t = integrator.transmittance(&region, &ray);
        assert!((t.r - (-1.0_f32).exp()).abs() < 1e-5, "got {:?}", t);
    }

    #[test]
    fn empty_volume_is_fully_transparent() {
        let region = EmptyVolume;
        let integrator = VolumeIntegrator::new(0.1);
        let ray = Ray { origin: point3f!(0.0, 0.0, -5.0), dir: vec3f!(0.0, 0.0, 1.0), t_max: 10.0, time: 0.0 };
        let t = integrator.transmittance(&region, &ray);
        assert_eq!(t, Spectrum::uniform(1.0));
    }
}
