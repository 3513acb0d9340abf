//! Multi-pass render orchestrator (§5): an optional photon-map pre-pass,
//! then a sequence of tile-parallel passes over the film, each followed by
//! an adaptive-threshold check that lets the driver stop early once every
//! pixel has converged. Checks the cooperative [`AbortFlag`] at every pass
//! boundary.

use crate::config::RenderConfig;
use crate::filter::Filter;
use crate::integrator::{IntegratorRadiance, SamplerIntegrator};
use crate::photon::builder::{PhotonBuildConfig, PhotonBuildResult, PhotonMapBuilder};
use crate::render_context::RenderContext;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::{film::Film, RenderError, RenderResult};

/// Runs the photon-emission pre-pass (§4.8) ahead of the tile-parallel
/// render passes. Separate from [`render_passes`] since not every
/// integrator (e.g. plain direct lighting) needs one.
pub fn build_photon_maps(scene: &Scene, config: &RenderConfig, ctx: &RenderContext) -> PhotonBuildResult {
    let photon_config = PhotonBuildConfig {
        caustic_photons: config.photon_map.caustic_photons,
        diffuse_photons: config.photon_map.diffuse_photons,
        search_radius: config.photon_map.search_radius,
        workers: config.effective_thread_count(),
        ..PhotonBuildConfig::default()
    };
    let result = PhotonMapBuilder::new(scene).build(&photon_config, ctx);
    tracing::info!(
        paths = result.paths,
        caustic_count = result.caustic.len(),
        diffuse_count = result.diffuse.len(),
        "photon map pre-pass complete"
    );
    result
}

/// Drives `film` through `config.sampling.passes` tile-parallel passes,
/// stopping early if the adaptive mask reports every pixel converged, or if
/// `ctx.abort` is set between passes.
pub fn render_passes<R: IntegratorRadiance, F: Filter>(
    integrator: &mut SamplerIntegrator<R>,
    scene: &Scene,
    film: &Film<F>,
    sampler_template: &impl Sampler,
    config: &RenderConfig,
    ctx: &RenderContext,
) -> RenderResult<()> {
    let workers = config.effective_thread_count();
    let total_passes = config.sampling.passes.max(1);

    for pass in 0..total_passes {
        if ctx.abort.is_set() {
            return Err(RenderError::Aborted);
        }

        film.begin_pass(pass, total_passes);
        integrator.render_parallel(scene, film, sampler_template, workers);

        let mask = film.adaptive_mask();
        let remaining = mask.iter().filter(|&&needs| needs).count();
        tracing::info!(pass, remaining, total = mask.len(), "render pass complete");
        ctx.diagnostics.log_summary();

        if remaining == 0 {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::camera::{Camera, PerspectiveCamera};
    use crate::filter::BoxFilter;
    use crate::integrator::direct_lighting::DirectLightingIntegrator;
    use crate::light::point::PointLight;
    use crate::material::matte::MatteMaterial;
    use crate::primitive::{GeometricPrimitive, Primitive};
    use crate::sampler::random::RandomSampler;
    use crate::shapes::sphere::Sphere;
    use crate::spectrum::Spectrum;
    use crate::{point3f, vec3f, Bounds2f, Bounds2i, Point2i, Transform};

    use super::*;

    fn test_scene_and_camera() -> (Scene, Box<dyn Camera>) {
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
        let res = Point2i::new(4, 4);
        let camera: Box<dyn Camera> =
            Box::new(PerspectiveCamera::new(camera_tf, res, Bounds2f::whole_screen(), (0.0, 1.0), 0.0, 1.0, 40.0));
        (scene, camera)
    }

    #[test]
    fn render_passes_converges_and_completes() {
        let (scene, camera) = test_scene_and_camera();
        let res = Point2i::new(4, 4);
        let film = Film::<BoxFilter>::with_crop_window(
            res,
            Bounds2i::with_bounds(Point2i::new(0, 0), res),
            BoxFilter::default(),
            1.0,
        );

        let mut integrator = SamplerIntegrator { camera, radiance: DirectLightingIntegrator { max_depth: 2 } };
        let sampler = RandomSampler::new_with_seed(7, 8);
        let mut config = RenderConfig::default();
        config.sampling.passes = 3;
        config.thread_count = Some(1);
        let ctx = RenderContext::new();

        render_passes(&mut integrator, &scene, &film, &sampler, &config, &ctx).unwrap();

        let image = film.finalize();
        assert!(image.get(2, 2).r > 0.0);
    }

    #[test]
    fn render_passes_honors_abort_flag() {
        let (scene, camera) = test_scene_and_camera();
        let res = Point2i::new(4, 4);
        let film = Film::<BoxFilter>::with_crop_window(
            res,
            Bounds2i::with_bounds(Point2i::new(0, 0), res),
            BoxFilter::default(),
            1.0,
        );

        let mut integrator = SamplerIntegrator { camera, radiance: DirectLightingIntegrator { max_depth: 2 } };
        let sampler = RandomSampler::new_with_seed(7, 8);
        let config = RenderConfig::default();
        let ctx = RenderContext::new();
        ctx.abort.set();

        let result = render_passes(&mut integrator, &scene, &film, &sampler, &config, &ctx);
        assert!(matches!(result, Err(RenderError::Aborted)));
    }
}
