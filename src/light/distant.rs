use parking_lot::Mutex;

use crate::interaction::SurfaceHit;
use crate::light::{EmissionSample, Light, LiSample, LightFlags, VisibilityTester};
use crate::render_context::RenderContext;
use crate::sampling::concentric_sample_disk;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{Float, Normal3, Point2f, Point3f, Ray, Transform, Vec3f, PI};

/// Parallel-ray emitter (a distant sun), delta-direction: every reference
/// point sees light from the same world-space direction.
pub struct DistantLight {
    l2w: Transform,
    w2l: Transform,
    world_direction: Vec3f,
    radiance: Spectrum,
    /// Cached world-bounding-sphere radius, needed to place an emission
    /// disk large enough to cover the scene (§4.8); set by `preprocess`.
    world_radius: Mutex<Float>,
}

impl DistantLight {
    pub fn new(light_to_world: Transform, direction: Vec3f, radiance: Spectrum) -> Self {
        use cgmath::InnerSpace;
        Self {
            w2l: light_to_world.inverse(),
            l2w: light_to_world,
            world_direction: direction.normalize(),
            radiance,
            world_radius: Mutex::new(1e4),
        }
    }
}

impl Light for DistantLight {
    fn flags(&self) -> LightFlags {
        LightFlags::DeltaDirection
    }

    fn light_to_world(&self) -> &Transform {
        &self.l2w
    }

    fn world_to_light(&self) -> &Transform {
        &self.w2l
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, _u: Point2f) -> LiSample {
        let wi = -self.world_direction;
        let p1 = SurfaceHit {
            p: reference.p + wi * (2.0 * 1e4),
            p_err: Vec3f::new(0.0, 0.0, 0.0),
            time: reference.time,
            n: Normal3(Vec3f::new(0.0, 0.0, 0.0)),
        };
        LiSample {
            radiance: self.radiance,
            wi,
            pdf: 1.0,
            vis: VisibilityTester { p0: *reference, p1 },
        }
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, _wi: Vec3f) -> Float {
        0.0
    }

    fn preprocess(&self, scene: &Scene) {
        *self.world_radius.lock() = scene.world_bound().diagonal_length() * 0.5;
    }

    fn power(&self, _ctx: &RenderContext) -> Spectrum {
        let r = *self.world_radius.lock();
        self.radiance * (PI * r * r)
    }

    /// Places the emission disk at the world origin rather than the actual
    /// scene centroid (unavailable here, only the radius is cached) — an
    /// approximation shared with `InfiniteLight`'s fixed-radius caching.
    fn sample_emission(&self, u_pos: Point2f, _u_dir: Point2f, _scene: &Scene) -> Option<EmissionSample> {
        let world_radius = *self.world_radius.lock();
        let (t, bt) = crate::sampling::coordinate_system(self.world_direction);
        let disk = concentric_sample_disk(u_pos);
        let origin = Point3f::new(0.0, 0.0, 0.0)
            + t * (disk.x * world_radius)
            + bt * (disk.y * world_radius)
            - self.world_direction * world_radius;
        Some(EmissionSample {
            ray: Ray::new(origin, self.world_direction),
            n: self.world_direction,
            pdf_pos: 1.0 / (PI * world_radius * world_radius),
            pdf_dir: 1.0,
            radiance: self.radiance,
        })
    }
}
