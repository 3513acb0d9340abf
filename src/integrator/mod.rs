//! Sampler-driven rendering driver (§4.9 step 0, §5 concurrency model): owns
//! the camera and a pluggable [`IntegratorRadiance`] strategy, and farms
//! tiles out to worker threads via rayon. The per-pixel sample sequence
//! (C1 §4.1) is supplied by the caller and cloned-with-seed per tile, so no
//! sampler state lives on `self`.

use bumpalo::Bump;
use cgmath::InnerSpace;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::film::Film;
use crate::filter::Filter;
use crate::light::Light;
use crate::reflection::bsdf::Bsdf;
use crate::reflection::BxDFType;
use crate::sampler::Sampler;
use crate::sampling::power_heuristic;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{abs_dot, Bounds2i, Differential, Float, Point2f, RayDifferential, SurfaceInteraction};

pub mod direct_lighting;
pub mod photon_map;

pub struct SamplerIntegrator<R: IntegratorRadiance> {
    pub camera: Box<dyn Camera>,
    pub radiance: R,
}

/// The shading strategy a [`SamplerIntegrator`] drives: how much radiance
/// arrives back along a ray, including the specular recursion every
/// strategy shares (§4.9 steps 2-6).
pub trait IntegratorRadiance: Sync + Send {
    fn preprocess(&mut self, scene: &Scene, sampler: &mut dyn Sampler);

    fn incident_radiance(
        &self,
        ray: &mut RayDifferential,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        depth: u16,
    ) -> Spectrum;

    #[allow(non_snake_case)]
    fn specular_reflect(
        &self,
        ray: &mut RayDifferential,
        intersect: &SurfaceInteraction,
        bsdf: &Bsdf,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        depth: u16,
    ) -> Spectrum {
        let wo = intersect.wo;
        let bxdf_type = BxDFType::REFLECTION | BxDFType::SPECULAR;

        let scatter = match bsdf.sample_f(wo, sampler.get_2d(), bxdf_type) {
            Some(s) => s,
            None => return Spectrum::uniform(0.0),
        };
        if abs_dot(scatter.wi, intersect.shading_n.0) == 0.0 {
            return Spectrum::uniform(0.0);
        }

        let diff = ray.diff.map(|diff| {
            let tex_diff = intersect.tex_diffs.expect("ray differentials require tex differentials");
            let rx_origin = intersect.hit.p + tex_diff.dpdx;
            let ry_origin = intersect.hit.p + tex_diff.dpdy;

            let shading = intersect.shading_geom;
            let dndx = shading.dndu * tex_diff.dudx + shading.dndv * tex_diff.dvdx;
            let dndy = shading.dndu * tex_diff.dudy + shading.dndv * tex_diff.dvdy;

            let dwo_dx = -diff.rx_dir - wo;
            let dwo_dy = -diff.ry_dir - wo;

            let d_dn_dx = dwo_dx.dot(intersect.shading_n.0) + wo.dot(dndx.0);
            let d_dn_dy = dwo_dy.dot(intersect.shading_n.0) + wo.dot(dndy.0);

            let rx_dir = (scatter.wi - dwo_dx)
                + 2.0 * wo.dot(intersect.shading_n.0) * dndx.0
                + d_dn_dx * intersect.shading_n.0;
            let ry_dir = (scatter.wi - dwo_dy)
                + 2.0 * wo.dot(intersect.shading_n.0) * dndy.0
                + d_dn_dy * intersect.shading_n.0;

            Differential { rx_origin, rx_dir, ry_origin, ry_dir }
        });

        let mut ray_diff = intersect.hit.spawn_ray_with_differentials(scatter.wi, diff);
        let li = self.incident_radiance(&mut ray_diff, scene, sampler, arena, depth + 1);
        scatter.f * li * scatter.wi.dot(intersect.shading_n.0).abs() / scatter.pdf
    }

    #[allow(non_snake_case)]
    fn specular_transmit(
        &self,
        ray: &mut RayDifferential,
        intersect: &SurfaceInteraction,
        bsdf: &Bsdf,
        scene: &Scene,
        sampler: &mut dyn Sampler,
        arena: &Bump,
        depth: u16,
    ) -> Spectrum {
        let wo = intersect.wo;
        let bxdf_type = BxDFType::TRANSMISSION | BxDFType::SPECULAR;

        let scatter = match bsdf.sample_f(wo, sampler.get_2d(), bxdf_type) {
            Some(s) => s,
            None => return Spectrum::uniform(0.0),
        };
        if abs_dot(scatter.wi, intersect.shading_n.0) == 0.0 {
            return Spectrum::uniform(0.0);
        }

        let diff = ray.diff.map(|diff| {
            let tex_diff = intersect.tex_diffs.expect("ray differentials require tex differentials");
            let rx_origin = intersect.hit.p + tex_diff.dpdx;
            let ry_origin = intersect.hit.p + tex_diff.dpdy;

            let shading = intersect.shading_geom;
            let mut dndx = shading.dndu * tex_diff.dudx + shading.dndv * tex_diff.dvdx;
            let mut dndy = shading.dndu * tex_diff.dudy + shading.dndv * tex_diff.dvdy;
            let mut shading_n = intersect.shading_n;

            // Assume the ray is entering the object; swap if it's exiting.
            let mut eta = 1.0 / bsdf.eta;
            if wo.dot(intersect.shading_n.0) < 0.0 {
                eta = bsdf.eta;
                shading_n = -shading_n;
                dndx = -dndx;
                dndy = -dndy;
            }

            let dwo_dx = -diff.rx_dir - wo;
            let dwo_dy = -diff.ry_dir - wo;

            let d_dn_dx = dwo_dx.dot(intersect.shading_n.0) + wo.dot(dndx.0);
            let d_dn_dy = dwo_dy.dot(intersect.shading_n.0) + wo.dot(dndy.0);

            let mu = eta * wo.dot(shading_n.0) - abs_dot(scatter.wi, shading_n.0);
            let dmu_dx = (eta - (eta * eta * wo.dot(shading_n.0)) / scatter.wi.dot(shading_n.0)) * d_dn_dx;
            let dmu_dy = (eta - (eta * eta * wo.dot(shading_n.0)) / scatter.wi.dot(shading_n.0)) * d_dn_dy;

            let rx_dir = scatter.wi - (eta * dwo_dx) + (mu * dndx + dmu_dx * shading_n).0;
            let ry_dir = scatter.wi - (eta * dwo_dy) + (mu * dndy + dmu_dy * shading_n).0;

            Differential { rx_origin, rx_dir, ry_origin, ry_dir }
        });

        let mut ray_diff = intersect.hit.spawn_ray_with_differentials(scatter.wi, diff);
        let li = self.incident_radiance(&mut ray_diff, scene, sampler, arena, depth + 1);
        scatter.f * li * scatter.wi.dot(intersect.shading_n.0).abs() / scatter.pdf
    }
}

impl<R: IntegratorRadiance> SamplerIntegrator<R> {
    fn tile_id(tile: Bounds2i, sample_bounds: Bounds2i) -> u64 {
        let n_cols = sample_bounds.max.x;
        (tile.min.y * n_cols + tile.min.x) as u64
    }

    fn make_progress_bar(total_size: u64) -> indicatif::ProgressBar {
        let bar = indicatif::ProgressBar::new(total_size);
        bar.set_draw_delta(total_size / 100 + 1);
        bar
    }

    pub fn render_with_pool<F: Filter>(&mut self, scene: &Scene, film: &Film<F>, sampler: impl Sampler, pool: &rayon::ThreadPool) {
        pool.install(|| self.render(scene, film, sampler))
    }

    /// Drives `film`'s tile queue directly, rather than pre-splitting the
    /// sample bounds, so the render loop and the adaptive-sampling pass
    /// (§4.3) share one tile-acquisition path.
    pub fn render<F: Filter>(&mut self, scene: &Scene, film: &Film<F>, mut sampler: impl Sampler) {
        self.radiance.preprocess(scene, &mut sampler);
        film.begin_pass(0, 1);
        let sample_bounds = film.sample_bounds();
        let progress = Self::make_progress_bar(sample_bounds.area() as u64);

        while let Some(tile) = film.next_area_to_render() {
            let tile_id = Self::tile_id(tile, sample_bounds);
            let tile_sampler = sampler.clone_with_seed(tile_id);
            self.render_tile(scene, film, tile_sampler, tile, &progress);
        }
        progress.finish();
    }

    /// Same tile sequence as [`SamplerIntegrator::render`], but tiles are
    /// drained from the film's queue by every worker concurrently — the
    /// queue's own lock is the only thing serializing acquisition (§5).
    pub fn render_parallel<F: Filter>(&self, scene: &Scene, film: &Film<F>, sampler: &impl Sampler, n_workers: usize) {
        let sample_bounds = film.sample_bounds();
        let progress = Self::make_progress_bar(sample_bounds.area() as u64);
        (0..n_workers.max(1)).into_par_iter().for_each(|_| {
            while let Some(tile) = film.next_area_to_render() {
                let tile_id = Self::tile_id(tile, sample_bounds);
                let tile_sampler = sampler.clone_with_seed(tile_id);
                self.render_tile(scene, film, tile_sampler, tile, &progress);
            }
        });
        progress.finish();
    }

    fn render_tile<F: Filter>(
        &self,
        scene: &Scene,
        film: &Film<F>,
        mut tile_sampler: impl Sampler,
        tile: Bounds2i,
        progress: &indicatif::ProgressBar,
    ) {
        let mut arena = Bump::new();
        let mut film_tile = film.get_film_tile(tile);

        for pixel in tile.iter_points() {
            tile_sampler.start_pixel(pixel);

            while tile_sampler.start_next_sample() {
                let camera_sample = tile_sampler.get_camera_sample(pixel);

                let (ray_weight, mut ray_differential) = self.camera.generate_ray_differential(camera_sample);
                ray_differential.scale_differentials(1.0 / (tile_sampler.samples_per_pixel() as Float).sqrt());

                let mut radiance = Spectrum::uniform(0.0);
                let mut alpha = 0.0;
                if ray_weight > 0.0 {
                    let primary_ray = ray_differential.ray;
                    radiance = self.radiance.incident_radiance(
                        &mut ray_differential,
                        scene,
                        &mut tile_sampler,
                        &arena,
                        0,
                    );
                    check_radiance(&radiance, pixel);
                    alpha = if scene.intersect_test(&primary_ray) { 1.0 } else { 0.0 };
                }

                film.add_sample_to_tile(&mut film_tile, camera_sample.p_film, radiance, alpha, ray_weight);
                arena.reset();
            }

            progress.inc(1);
        }

        film.finish_area(film_tile);
    }
}

fn check_radiance(l: &Spectrum, pixel: crate::Point2i) {
    debug_assert!(!l.has_nans(), "NaN radiance value for pixel {:?}: {:?}", pixel, l);
}

/// Picks one light uniformly and scales its contribution by the light count
/// so the estimator stays unbiased (§4.9 step 2).
pub fn uniform_sample_one_light(
    intersect: &SurfaceInteraction,
    bsdf: &Bsdf,
    scene: &Scene,
    arena: &Bump,
    sampler: &mut dyn Sampler,
) -> Spectrum {
    let n_lights = scene.lights.len();
    if n_lights == 0 {
        return Spectrum::uniform(0.0);
    }

    let light_num = (sampler.get_1d() * n_lights as Float).min((n_lights - 1) as Float) as usize;
    let light = scene.lights[light_num].as_ref();

    let u_light = sampler.get_2d();
    let u_scattering = sampler.get_2d();
    n_lights as Float * estimate_direct(bsdf, intersect, u_scattering, light, u_light, scene, arena)
}

/// Combines light sampling and BSDF sampling for one light via the power
/// heuristic (§4.9 step 2 MIS combination).
pub fn estimate_direct(
    bsdf: &Bsdf,
    intersect: &SurfaceInteraction,
    u_scattering: Point2f,
    light: &dyn Light,
    u_light: Point2f,
    scene: &Scene,
    arena: &Bump,
) -> Spectrum {
    let _ = arena;
    let bsdf_flags = BxDFType::all() & !BxDFType::SPECULAR;
    let mut radiance = Spectrum::uniform(0.0);

    let light_sample = light.sample_incident_radiance(&intersect.hit, u_light);
    if light_sample.pdf > 0.0 && !light_sample.radiance.is_black() {
        let f = bsdf.f(intersect.wo, light_sample.wi, bsdf_flags) * abs_dot(light_sample.wi, intersect.shading_n.0);
        let scattering_pdf = bsdf.pdf(intersect.wo, light_sample.wi, bsdf_flags);

        if !f.is_black() && light_sample.vis.unoccluded(scene) {
            radiance += if light.flags().is_delta_light() {
                f * light_sample.radiance / light_sample.pdf
            } else {
                let weight = power_heuristic(1, light_sample.pdf, 1, scattering_pdf);
                f * light_sample.radiance * weight / light_sample.pdf
            };
        }
    }

    if !light.flags().is_delta_light() {
        if let Some(scatter) = bsdf.sample_f(intersect.wo, u_scattering, bsdf_flags) {
            let f = scatter.f * abs_dot(scatter.wi, intersect.shading_n.0);
            let sampled_specular = scatter.sampled_type.contains(BxDFType::SPECULAR);

            if f.is_black() {
                return radiance;
            }

            let weight = if sampled_specular {
                1.0
            } else {
                let light_pdf = light.pdf_incident_radiance(&intersect.hit, scatter.wi);
                if light_pdf == 0.0 {
                    return radiance;
                }
                power_heuristic(1, scatter.pdf, 1, light_pdf)
            };

            let mut ray = intersect.hit.spawn_ray(scatter.wi);
            let si = scene.intersect(&mut ray);

            let incident_radiance = if let Some(si) = si {
                si.primitive
                    .unwrap()
                    .area_light()
                    .filter(|l| std::ptr::eq(l.as_light(), light))
                    .map_or(Spectrum::uniform(0.0), |_| si.emitted_radiance(-scatter.wi))
            } else {
                light.environment_emitted_radiance(&RayDifferential { ray, diff: None })
            };

            if !incident_radiance.is_black() {
                radiance += f * incident_radiance * weight / scatter.pdf;
            }
        }
    }

    radiance
}
