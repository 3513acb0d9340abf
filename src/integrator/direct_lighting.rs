//! Direct-lighting surface integrator (§4.9): at each hit, combines one
//! light sample and one BSDF sample via the power heuristic
//! ([`super::estimate_direct`]), then recurses into specular lobes. The
//! photon-map final-gather/caustic contribution (§4.9 steps 4-5) layers in
//! once a built photon map is threaded through; until then this integrator
//! is the MIS direct-lighting term on its own, matching §4.9's
//! `DirectLight` visitor state without the `Photon` state.

use bumpalo::Bump;

use crate::integrator::{uniform_sample_one_light, IntegratorRadiance};
use crate::material::TransportMode;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::RayDifferential;

pub struct DirectLightingIntegrator {
    pub max_depth: u16,
}

impl IntegratorRadiance for DirectLightingIntegrator {
    fn preprocess(&mut self, _scene: &Scene, _sampler: &mut dyn Sampler) {}

    fn incident_radiance(
        &self,
        ray: &mut RayDifferential,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        depth: u16,
    ) -> Spectrum {
        let mut radiance = Spectrum::uniform(0.0);

        let mut intersect = match scene.intersect(&mut ray.ray) {
            None => return scene.environment_emitted_radiance(ray),
            Some(si) => si,
        };

        radiance += intersect.emitted_radiance(intersect.wo);

        let bsdf = match intersect.compute_scattering_functions(ray, arena, false, TransportMode::Radiance) {
            Some(b) => b,
            None => return radiance,
        };

        if !scene.lights.is_empty() {
            radiance += uniform_sample_one_light(&intersect, &bsdf, scene, arena, sampler);
        }

        if depth + 1 < self.max_depth {
            radiance += self.specular_reflect(ray, &intersect, &bsdf, scene, sampler, arena, depth);
            radiance += self.specular_transmit(ray, &intersect, &bsdf, scene, sampler, arena, depth);
        }

        radiance
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::camera::{Camera, PerspectiveCamera};
    use crate::integrator::{IntegratorRadiance, SamplerIntegrator};
    use crate::light::point::PointLight;
    use crate::material::matte::MatteMaterial;
    use crate::primitive::GeometricPrimitive;
    use crate::sampler::random::RandomSampler;
    use crate::shapes::sphere::Sphere;
    use crate::Transform;
    use crate::{point3f, vec3f, Bounds2f, Bounds2i, Point2i};

    use super::*;
    use crate::film::Film;
    use crate::filter::BoxFilter;
    use crate::primitive::Primitive;
    use crate::scene::Scene;

    #[test]
    fn direct_lighting_illuminates_a_lit_sphere() {
        let tf = Transform::identity();
        let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
        let prim = GeometricPrimitive {
            shape: sphere,
            material: Some(Arc::new(MatteMaterial::new(Spectrum::uniform(0.8)))),
            light: None,
        };
        let prim: Arc<dyn Primitive> = Arc::new(prim);
        let light: Arc<dyn crate::light::Light> =
            Arc::new(PointLight::new(Transform::translate(vec3f!(0.0, 0.0, -5.0)), Spectrum::uniform(50.0)));
        let scene = Scene::new(vec![prim], vec![light]);

        let camera_tf = Transform::camera_look_at(
            point3f!(0.0, 0.0, -4.0),
            point3f!(0.0, 0.0, 0.0),
            vec3f!(0.0, 1.0, 0.0),
        );
        let res = Point2i::new(8, 8);
        let camera: Box<dyn Camera> =
            Box::new(PerspectiveCamera::new(camera_tf, res, Bounds2f::whole_screen(), (0.0, 1.0), 0.0, 1.0, 40.0));

        let film = Film::<BoxFilter>::with_crop_window(
            res,
            Bounds2i::with_bounds(Point2i::new(0, 0), res),
            BoxFilter::default(),
            1.0,
        );

        let mut integrator = SamplerIntegrator { camera, radiance: DirectLightingIntegrator { max_depth: 2 } };
        let sampler = RandomSampler::new_with_seed(1, 4);
        integrator.render(&scene, &film, sampler);

        let image = film.finalize();
        let centre = image.get(4, 4);
        assert!(centre.r > 0.0, "expected direct illumination on the sphere, got {:?}", centre);
    }
}
