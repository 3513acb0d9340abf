use parking_lot::Mutex;

use crate::interaction::SurfaceHit;
use crate::light::{Light, LiSample, LightFlags, VisibilityTester};
use crate::sampling::{uniform_sample_sphere, uniform_sphere_pdf};
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{Float, Normal3, Point2f, Transform, Vec3f};

/// Constant-radiance environment light: every escaping ray sees the same
/// background radiance, and every direction is sampled uniformly on the
/// sphere. A textured environment map would plug into `radiance_in_dir`;
/// that lookup is the out-of-scope image-decoder boundary.
pub struct InfiniteLight {
    l2w: Transform,
    w2l: Transform,
    radiance: Spectrum,
    /// Cached world-bounding-sphere radius, set once by `preprocess`. Behind
    /// a lock rather than a field so `preprocess` can take `&self` like the
    /// rest of the `Light` trait.
    world_radius: Mutex<Float>,
}

impl InfiniteLight {
    pub fn new(light_to_world: Transform, radiance: Spectrum) -> Self {
        Self {
            w2l: light_to_world.inverse(),
            l2w: light_to_world,
            radiance,
            world_radius: Mutex::new(1e4),
        }
    }
}

impl Light for InfiniteLight {
    fn flags(&self) -> LightFlags {
        LightFlags::Infinite
    }

    fn light_to_world(&self) -> &Transform {
        &self.l2w
    }

    fn world_to_light(&self) -> &Transform {
        &self.w2l
    }

    fn preprocess(&self, scene: &Scene) {
        *self.world_radius.lock() = scene.world_bound().diagonal_length() * 0.5;
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> LiSample {
        let wi = uniform_sample_sphere(u);
        let world_radius = *self.world_radius.lock();
        let p1 = SurfaceHit {
            p: reference.p + wi * (2.0 * world_radius),
            p_err: Vec3f::new(0.0, 0.0, 0.0),
            time: reference.time,
            n: Normal3(Vec3f::new(0.0, 0.0, 0.0)),
        };
        LiSample {
            radiance: self.radiance,
            wi,
            pdf: uniform_sphere_pdf(),
            vis: VisibilityTester { p0: *reference, p1 },
        }
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, _wi: Vec3f) -> Float {
        uniform_sphere_pdf()
    }

    fn environment_emitted_radiance(&self, _ray: &crate::RayDifferential) -> Spectrum {
        self.radiance
    }
}
