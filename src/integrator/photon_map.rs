//! Photon-map-accelerated surface integrator (§4.9 steps 4-5): direct
//! lighting via MIS as in [`super::direct_lighting`], a caustic contribution
//! added straight from the density estimate at the primary hit, and the
//! diffuse map's indirect contribution folded in only through final gather
//! (never as a raw density estimate on top of direct lighting, to avoid the
//! acknowledged double-count).

use bumpalo::Bump;

use crate::integrator::{uniform_sample_one_light, IntegratorRadiance};
use crate::material::TransportMode;
use crate::photon::PhotonMap;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::BxDFType;
use crate::sampler::Sampler;
use crate::sampling::cosine_hemisphere_pdf;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{abs_dot, Float, Point3f, RayDifferential, SurfaceInteraction, PI};

/// How the diffuse photon map's indirect estimate reaches the image (§9
/// Open Question): direct lighting always runs; the diffuse map never adds
/// a raw density estimate on top of it, only a final-gather average.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineMode {
    DirectPlusCausticOnly,
    DirectPlusFull,
}

pub struct PhotonMapIntegrator {
    pub max_depth: u16,
    pub caustic_map: Option<PhotonMap>,
    pub diffuse_map: Option<PhotonMap>,
    pub combine_mode: CombineMode,
    pub caustic_search_count: usize,
    pub caustic_search_radius: Float,
    pub final_gather_samples: usize,
}

impl PhotonMapIntegrator {
    fn caustic_estimate(&self, bsdf: &Bsdf, intersect: &SurfaceInteraction) -> Spectrum {
        let map = match &self.caustic_map {
            Some(m) if !m.is_empty() => m,
            _ => return Spectrum::uniform(0.0),
        };
        density_estimate(map, bsdf, intersect, self.caustic_search_count, self.caustic_search_radius.powi(2))
    }

    /// Final gather (§4.9 step 5): a handful of cosine-weighted secondary
    /// rays, each resolved by a diffuse-map density estimate at its hit
    /// point rather than full recursive path tracing.
    fn diffuse_final_gather(
        &self,
        bsdf: &Bsdf,
        intersect: &SurfaceInteraction,
        scene: &Scene,
        sampler: &mut dyn Sampler,
    ) -> Spectrum {
        let map = match &self.diffuse_map {
            Some(m) if !m.is_empty() => m,
            _ => return Spectrum::uniform(0.0),
        };
        if self.final_gather_samples == 0 {
            return Spectrum::uniform(0.0);
        }

        let mut sum = Spectrum::uniform(0.0);
        let mut n_valid = 0usize;
        for _ in 0..self.final_gather_samples {
            let u = sampler.get_2d();
            let scatter = match bsdf.sample_f(intersect.wo, u, BxDFType::DIFFUSE | BxDFType::REFLECTION) {
                Some(s) if s.pdf > 0.0 && !s.f.is_black() => s,
                _ => continue,
            };
            let cos = abs_dot(scatter.wi, intersect.shading_n.0);
            if cos == 0.0 {
                continue;
            }

            let mut ray = intersect.hit.spawn_ray(scatter.wi);
            let mut secondary = match scene.intersect(&mut ray) {
                Some(si) => si,
                None => continue,
            };
            let rd = RayDifferential::new(ray);
            let gather_arena = Bump::new();
            let secondary_bsdf = match secondary.compute_scattering_functions(
                &rd,
                &gather_arena,
                false,
                TransportMode::Radiance,
            ) {
                Some(b) => b,
                None => continue,
            };

            let indirect = density_estimate(
                map,
                &secondary_bsdf,
                &secondary,
                self.caustic_search_count,
                self.caustic_search_radius.powi(2),
            );
            let pdf = cosine_hemisphere_pdf(cos).max(scatter.pdf);
            sum += scatter.f * indirect * (cos / pdf);
            n_valid += 1;
        }

        if n_valid == 0 {
            Spectrum::uniform(0.0)
        } else {
            sum / (n_valid as Float)
        }
    }
}

/// `sum_i f(wo, photon.wi) * photon.power / (pi * r^2 * paths)`, the
/// classic photon-map density estimate (§4.6/§4.9).
fn density_estimate(
    map: &PhotonMap,
    bsdf: &Bsdf,
    intersect: &SurfaceInteraction,
    k: usize,
    max_dist2: Float,
) -> Spectrum {
    let (found, used_r2) = map.gather(intersect_point(intersect), k, max_dist2);
    if found.is_empty() || used_r2 <= 0.0 {
        return Spectrum::uniform(0.0);
    }
    let mut sum = Spectrum::uniform(0.0);
    for (_, photon) in &found {
        let f = bsdf.f(intersect.wo, photon.wi, BxDFType::all() & !BxDFType::SPECULAR);
        sum += f * photon.power;
    }
    let paths = map.paths.max(1) as Float;
    sum / (PI * used_r2 * paths)
}

fn intersect_point(intersect: &SurfaceInteraction) -> Point3f {
    intersect.hit.p
}

impl IntegratorRadiance for PhotonMapIntegrator {
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

        radiance += self.caustic_estimate(&bsdf, &intersect);
        if self.combine_mode == CombineMode::DirectPlusFull {
            radiance += self.diffuse_final_gather(&bsdf, &intersect, scene, sampler);
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
    use crate::film::Film;
    use crate::filter::BoxFilter;
    use crate::integrator::SamplerIntegrator;
    use crate::light::point::PointLight;
    use crate::material::matte::MatteMaterial;
    use crate::photon::Photon;
    use crate::primitive::{GeometricPrimitive, Primitive};
    use crate::sampler::random::RandomSampler;
    use crate::shapes::sphere::Sphere;
    use crate::{point3f, vec3f, Bounds2f, Bounds2i, Point2i, Transform};

    use super::*;

    #[test]
    fn caustic_photons_near_a_lit_point_brighten_it() {
        let tf = Transform::identity();
        let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
        let prim = GeometricPrimitive {
            shape: sphere,
            material: Some(Arc::new(MatteMaterial::new(Spectrum::uniform(0.8)))),
            light: None,
        };
        let prim: Arc<dyn Primitive> = Arc::new(prim);
        let light: Arc<dyn crate::light::Light> =
            Arc::new(PointLight::new(Transform::translate(vec3f!(0.0, 0.0, -5.0)), Spectrum::uniform(5.0)));
        let scene = Scene::new(vec![prim], vec![light]);

        let camera_tf = Transform::camera_look_at(
            point3f!(0.0, 0.0, -4.0),
            point3f!(0.0, 0.0, 0.0),
            vec3f!(0.0, 1.0, 0.0),
        );
        let res = Point2i::new(4, 4);
        let camera: Box<dyn Camera> =
            Box::new(PerspectiveCamera::new(camera_tf, res, Bounds2f::whole_screen(), (0.0, 1.0), 0.0, 1.0, 40.0));
        let film = Film::<BoxFilter>::with_crop_window(
            res,
            Bounds2i::with_bounds(Point2i::new(0, 0), res),
            BoxFilter::default(),
            1.0,
        );

        let mut caustic_map = PhotonMap::new("caustic", 0.5, 1);
        caustic_map.push(Photon { pos: point3f!(0.0, 0.0, -1.0), wi: vec3f!(0.0, 0.0, -1.0), power: Spectrum::uniform(2.0) });
        caustic_map.paths = 1;
        caustic_map.update_tree();

        let radiance = PhotonMapIntegrator {
            max_depth: 2,
            caustic_map: Some(caustic_map),
            diffuse_map: None,
            combine_mode: CombineMode::DirectPlusCausticOnly,
            caustic_search_count: 8,
            caustic_search_radius: 1.0,
            final_gather_samples: 0,
        };
        let mut integrator = SamplerIntegrator { camera, radiance };
        let sampler = RandomSampler::new_with_seed(1, 4);
        integrator.render(&scene, &film, sampler);

        let image = film.finalize();
        let centre = image.get(2, 2);
        assert!(centre.r > 0.0, "expected caustic+direct illumination, got {:?}", centre);
    }
}
