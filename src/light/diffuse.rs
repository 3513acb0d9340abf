use std::sync::Arc;

use cgmath::InnerSpace;

use crate::interaction::SurfaceHit;
use crate::light::{AreaLight, EmissionSample, Light, LiSample, LightFlags, VisibilityTester};
use crate::render_context::RenderContext;
use crate::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere, coordinate_system};
use crate::scene::Scene;
use crate::shapes::Shape;
use crate::spectrum::Spectrum;
use crate::{distance, Float, Point2f, Ray, Transform, Vec3f, PI};

/// Emissive surface, one-sided: radiance `l_emit` leaves the front face
/// (the side the shape's normal points towards), nothing leaves the back.
pub struct DiffuseAreaLight<S: Shape> {
    shape: Arc<S>,
    l_emit: Spectrum,
    n_samples: usize,
}

impl<S: Shape> DiffuseAreaLight<S> {
    pub fn new(l_emit: Spectrum, shape: Arc<S>, n_samples: usize) -> Self {
        Self { shape, l_emit, n_samples }
    }
}

impl<S: Shape> Light for DiffuseAreaLight<S> {
    fn flags(&self) -> LightFlags {
        LightFlags::Area
    }

    fn light_to_world(&self) -> &Transform {
        self.shape.object_to_world()
    }

    fn world_to_light(&self) -> &Transform {
        self.shape.world_to_object()
    }

    fn n_samples(&self) -> usize {
        self.n_samples
    }

    fn sample_incident_radiance(&self, reference: &SurfaceHit, u: Point2f) -> LiSample {
        let p_shape = self.shape.sample(u);
        let wi_unnormalized = p_shape.p - reference.p;
        let dist2 = wi_unnormalized.magnitude2();
        if dist2 == 0.0 {
            return LiSample {
                radiance: Spectrum::uniform(0.0),
                wi: Vec3f::new(0.0, 0.0, 1.0),
                pdf: 0.0,
                vis: VisibilityTester { p0: *reference, p1: p_shape },
            };
        }
        let wi = wi_unnormalized / dist2.sqrt();
        let pdf = dist2 / (p_shape.n.dot(-wi).abs() * self.shape.area());
        let radiance = self.emitted_radiance(p_shape, -wi);
        LiSample {
            radiance,
            wi,
            pdf: if pdf.is_finite() { pdf } else { 0.0 },
            vis: VisibilityTester { p0: *reference, p1: p_shape },
        }
    }

    fn pdf_incident_radiance(&self, reference: &SurfaceHit, wi: Vec3f) -> Float {
        // Approximates the solid-angle pdf with the shape's area pdf scaled
        // by the inverse-square/cosine Jacobian, using the shape's own
        // sampling density rather than a full ray-cast against it (§6
        // capability sets keep shapes and lights decoupled from the
        // accelerator).
        let p_shape = self.shape.sample(Point2f::new(0.5, 0.5));
        let d2 = distance(reference.p, p_shape.p).powi(2);
        let cos_theta = p_shape.n.dot(-wi).abs().max(1e-4);
        cosine_hemisphere_pdf(cos_theta) * d2 / self.shape.area().max(1e-8)
    }

    fn power(&self, _ctx: &RenderContext) -> Spectrum {
        self.l_emit * (PI * self.shape.area())
    }

    fn sample_emission(&self, u_pos: Point2f, u_dir: Point2f, _scene: &Scene) -> Option<EmissionSample> {
        let p_shape = self.shape.sample(u_pos);
        let (t, bt) = coordinate_system(p_shape.n.0);
        let local_dir = cosine_sample_hemisphere(u_dir);
        let world_dir = t * local_dir.x + bt * local_dir.y + p_shape.n.0 * local_dir.z;
        let pdf_dir = cosine_hemisphere_pdf(local_dir.z.abs());
        Some(EmissionSample {
            ray: Ray::new(p_shape.p, world_dir),
            n: p_shape.n.0,
            pdf_pos: 1.0 / self.shape.area().max(1e-8),
            pdf_dir,
            radiance: self.l_emit,
        })
    }
}

impl<S: Shape> AreaLight for DiffuseAreaLight<S> {
    fn emitted_radiance(&self, hit: SurfaceHit, w: Vec3f) -> Spectrum {
        if hit.n.dot(w) > 0.0 {
            self.l_emit
        } else {
            Spectrum::uniform(0.0)
        }
    }

    fn as_light(&self) -> &dyn Light {
        self
    }
}
