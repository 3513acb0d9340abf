use cgmath::InnerSpace;

use crate::interaction::SurfaceHit;
use crate::light::{EmissionSample, Light, LiSample, LightFlags, VisibilityTester};
use crate::render_context::RenderContext;
use crate::sampling::{uniform_sample_sphere, uniform_sphere_pdf};
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{Float, Normal3, Point2f, Point3f, Ray, Transform, Vec3f, PI};

/// Isotropic point emitter: a delta-position light with no area to sample.
pub struct PointLight {
    l2w: Transform,
    w2l: Transform,
    world_point: Point3f,
    intensity: Spectrum,
}

impl PointLight {
    pub fn new(light_to_world: Transform, intensity: Spectrum) -> Self {
        let w2l = light_to_world.inverse();
        let world_point = light_to_world.transform(Point3f::new(0.0, 0.0, 0.0));
        Self {
            l2w: light_to_world,
            w2l,
            world_point,
            intensity,
        }
    }
}

impl Light for PointLight {
    fn flags(&self) -> LightFlags {
        LightFlags::DeltaPosition
    }

    fn light_to_world(&self) -> &Transform {
        &self.l2w
    }

    fn world_to_light(&self) -> &Transform {
        &self.w2l
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, _u: Point2f) -> LiSample {
        let wi = (self.world_point - reference.p).normalize();
        let p1 = SurfaceHit {
            p: self.world_point,
            p_err: Vec3f::new(0.0, 0.0, 0.0),
            time: reference.time,
            n: Normal3(Vec3f::new(0.0, 0.0, 0.0)),
        };
        let radiance = self.intensity / (self.world_point - reference.p).magnitude2();
        LiSample {
            radiance,
            wi,
            pdf: 1.0,
            vis: VisibilityTester { p0: *reference, p1 },
        }
    }

    fn pdf_incident_radiance(&self, _reference: &SurfaceHit, _wi: Vec3f) -> Float {
        0.0
    }

    fn power(&self, _ctx: &RenderContext) -> Spectrum {
        self.intensity * (4.0 * PI)
    }

    fn sample_emission(&self, _u_pos: Point2f, u_dir: Point2f, _scene: &Scene) -> Option<EmissionSample> {
        let dir = uniform_sample_sphere(u_dir);
        Some(EmissionSample {
            ray: Ray::new(self.world_point, dir),
            n: dir,
            pdf_pos: 1.0,
            pdf_dir: uniform_sphere_pdf(),
            radiance: self.intensity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_off_as_inverse_square() {
        let light = PointLight::new(Transform::identity(), Spectrum::uniform(4.0));
        let near = SurfaceHit {
            p: Point3f::new(1.0, 0.0, 0.0),
            p_err: Vec3f::new(0.0, 0.0, 0.0),
            time: 0.0,
            n: Normal3(Vec3f::new(0.0, 0.0, 1.0)),
        };
        let far = SurfaceHit {
            p: Point3f::new(2.0, 0.0, 0.0),
            ..near
        };
        let ln = light.sample_incident_radiance(&near, Point2f::new(0.0, 0.0)).radiance;
        let lf = light.sample_incident_radiance(&far, Point2f::new(0.0, 0.0)).radiance;
        assert!((ln.r / lf.r - 4.0).abs() < 1e-4);
    }
}
