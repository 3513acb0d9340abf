//! Light capability set (§6): delta and area lights share one interface so
//! the direct-lighting integrator never special-cases a concrete type.

use crate::interaction::SurfaceHit;
use crate::render_context::RenderContext;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{Float, Point2f, Transform, Vec3f};

pub mod diffuse;
pub mod distant;
pub mod infinite;
pub mod point;

pub trait Light: Sync + Send {
    fn flags(&self) -> LightFlags;

    fn light_to_world(&self) -> &Transform;
    fn world_to_light(&self) -> &Transform;

    fn n_samples(&self) -> usize {
        1
    }

    /// Called once before rendering starts; infinite lights use this to
    /// cache the scene's world-space bounding sphere. Takes `&self` (not
    /// `&mut self`) since lights already live behind `Arc` inside `Scene`
    /// by the time this runs — implementations that need to cache a value
    /// use interior mutability, as `InfiniteLight` does for `world_radius`.
    fn preprocess(&self, _scene: &Scene) {}

    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> LiSample;

    /// Solid-angle pdf of sampling `wi` from `reference`, used by BSDF
    /// sampling's MIS weight against this light. Delta lights have no
    /// continuous density and always return 0.
    fn pdf_incident_radiance(&self, reference: &SurfaceHit, wi: Vec3f) -> Float;

    /// Radiance contributed by a BSDF-sampled ray that escapes the scene,
    /// nonzero only for infinite/environment lights.
    fn environment_emitted_radiance(&self, ray: &crate::RayDifferential) -> Spectrum {
        let _ = ray;
        Spectrum::uniform(0.0)
    }

    fn power(&self, ctx: &RenderContext) -> Spectrum {
        let _ = ctx;
        Spectrum::uniform(0.0)
    }

    /// Samples an emitted photon ray for the photon-map build driver (§4.8
    /// step 2): a position, an outgoing direction, their respective pdfs,
    /// and `Le` in that direction. `None` means this light doesn't
    /// participate in photon emission (the default, e.g. `InfiniteLight`'s
    /// environment contribution is only ever reached via camera/specular
    /// rays escaping the scene, never seeded as a photon source).
    fn sample_emission(&self, u_pos: Point2f, u_dir: Point2f, scene: &Scene) -> Option<EmissionSample> {
        let _ = (u_pos, u_dir, scene);
        None
    }
}

/// One emitted-photon sample (§4.8): origin, direction, area/solid-angle
/// pdfs, and the radiance leaving along that direction.
pub struct EmissionSample {
    pub ray: crate::Ray,
    pub n: Vec3f,
    pub pdf_pos: Float,
    pub pdf_dir: Float,
    pub radiance: Spectrum,
}

/// The outcome of sampling one light from one shading point.
pub struct LiSample {
    pub radiance: Spectrum,
    /// Direction *towards* the light, in world space.
    pub wi: Vec3f,
    pub pdf: Float,
    pub vis: VisibilityTester,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightFlags {
    DeltaPosition,
    DeltaDirection,
    Area,
    Infinite,
}

impl LightFlags {
    pub fn is_delta_light(&self) -> bool {
        matches!(self, LightFlags::DeltaPosition | LightFlags::DeltaDirection)
    }
}

/// A pair of surface hits whose connecting segment is tested for occlusion
/// only once MIS weighting shows the sample matters (§4.9 step 3).
pub struct VisibilityTester {
    pub p0: SurfaceHit,
    pub p1: SurfaceHit,
}

impl VisibilityTester {
    pub fn unoccluded(&self, scene: &Scene) -> bool {
        !scene.intersect_test(&self.p0.spawn_ray_to_hit(self.p1))
    }
}

/// Emissive-surface capability, implemented by [`diffuse::DiffuseAreaLight`]
/// and held alongside a geometric primitive's material.
pub trait AreaLight: Light {
    fn emitted_radiance(&self, hit: SurfaceHit, w: Vec3f) -> Spectrum;

    /// Upcast for identity comparisons (`estimate_direct`'s "did the BSDF
    /// sample land back on the light we sampled?" check).
    fn as_light(&self) -> &dyn Light;
}
