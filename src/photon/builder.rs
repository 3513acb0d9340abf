//! Photon-map emission driver (§4.8, C8): CDF-weighted light sampling,
//! worker-parallel path tracing with caustic/diffuse deposit rules and
//! Russian roulette, thread-local batching into the shared maps.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bumpalo::Bump;
use parking_lot::Mutex;
use rayon::prelude::*;

use crate::material::TransportMode;
use crate::photon::{Photon, PhotonMap};
use crate::reflection::BxDFType;
use crate::render_context::RenderContext;
use crate::sampler::random::RandomSampler;
use crate::sampler::Sampler;
use crate::scene::Scene;
use crate::spectrum::Spectrum;
use crate::{abs_dot, offset_ray_origin, Float, Ray, RayDifferential};

pub struct PhotonBuildConfig {
    pub caustic_photons: usize,
    pub diffuse_photons: usize,
    pub max_bounces: u16,
    pub rr_start_depth: u16,
    pub power_epsilon: Float,
    pub search_radius: Float,
    pub workers: usize,
}

impl Default for PhotonBuildConfig {
    fn default() -> Self {
        Self {
            caustic_photons: 200_000,
            diffuse_photons: 500_000,
            max_bounces: 12,
            rr_start_depth: 3,
            power_epsilon: 1e-4,
            search_radius: 0.5,
            workers: rayon::current_num_threads(),
        }
    }
}

pub struct PhotonBuildResult {
    pub caustic: PhotonMap,
    pub diffuse: PhotonMap,
    pub paths: u64,
}

/// Discrete CDF over lights weighted by `power()` (§4.8 step 1).
struct LightCdf {
    cumulative: Vec<Float>,
    total_power: Float,
}

impl LightCdf {
    fn build(scene: &Scene, ctx: &RenderContext) -> Option<Self> {
        let powers: Vec<Float> = scene.lights.iter().map(|l| l.power(ctx).max_channel().max(0.0)).collect();
        let total_power: Float = powers.iter().sum();
        if total_power <= 0.0 {
            return None;
        }
        let mut cumulative = Vec::with_capacity(powers.len());
        let mut running = 0.0;
        for p in &powers {
            running += p / total_power;
            cumulative.push(running);
        }
        if let Some(last) = cumulative.last_mut() {
            *last = 1.0;
        }
        Some(Self { cumulative, total_power })
    }

    /// Returns `(light_index, pdf)` for a uniform `u` in `[0,1)`.
    fn sample(&self, u: Float) -> (usize, Float) {
        let idx = self.cumulative.partition_point(|&c| c < u).min(self.cumulative.len() - 1);
        let prev = if idx == 0 { 0.0 } else { self.cumulative[idx - 1] };
        let pdf = (self.cumulative[idx] - prev).max(1e-8);
        (idx, pdf)
    }
}

pub struct PhotonMapBuilder<'s> {
    scene: &'s Scene,
}

impl<'s> PhotonMapBuilder<'s> {
    pub fn new(scene: &'s Scene) -> Self {
        Self { scene }
    }

    pub fn build(&self, config: &PhotonBuildConfig, ctx: &RenderContext) -> PhotonBuildResult {
        let cdf = match LightCdf::build(self.scene, ctx) {
            Some(cdf) => cdf,
            None => {
                return PhotonBuildResult {
                    caustic: PhotonMap::new("caustic", config.search_radius, config.workers as i32),
                    diffuse: PhotonMap::new("diffuse", config.search_radius, config.workers as i32),
                    paths: 0,
                }
            }
        };

        let caustic_buf: Mutex<Vec<Photon>> = Mutex::new(Vec::new());
        let diffuse_buf: Mutex<Vec<Photon>> = Mutex::new(Vec::new());
        let caustic_count = AtomicUsize::new(0);
        let diffuse_count = AtomicUsize::new(0);
        let paths = AtomicU64::new(0);
        // Safety cap so a scene with no reachable diffuse surface can't spin
        // forever chasing an unreachable quota.
        let max_paths = (config.caustic_photons.max(config.diffuse_photons) as u64).saturating_mul(200).max(50_000);

        let n_workers = config.workers.max(1);
        (0..n_workers).into_par_iter().for_each(|worker_id| {
            let worker_scope = ctx.worker_scope();
            let mut local_caustic = Vec::new();
            let mut local_diffuse = Vec::new();
            let mut sampler = RandomSampler::new_with_seed(worker_id as u64 + 1, 1);
            let arena = Bump::new();

            loop {
                if caustic_count.load(Ordering::Relaxed) >= config.caustic_photons
                    && diffuse_count.load(Ordering::Relaxed) >= config.diffuse_photons
                {
                    break;
                }
                if paths.fetch_add(1, Ordering::Relaxed) >= max_paths {
                    break;
                }
                self.trace_one_path(
                    &cdf,
                    &mut sampler,
                    &arena,
                    config,
                    &caustic_count,
                    &diffuse_count,
                    &mut local_caustic,
                    &mut local_diffuse,
                    &worker_scope.local,
                );
                arena.reset();
            }

            caustic_buf.lock().extend(local_caustic);
            diffuse_buf.lock().extend(local_diffuse);
        });

        let total_paths = paths.load(Ordering::Relaxed);
        let mut caustic = PhotonMap::new("caustic", config.search_radius, config.workers as i32);
        caustic.paths = total_paths as i32;
        caustic.extend(caustic_buf.into_inner());
        caustic.update_tree();

        let mut diffuse = PhotonMap::new("diffuse", config.search_radius, config.workers as i32);
        diffuse.paths = total_paths as i32;
        diffuse.extend(diffuse_buf.into_inner());
        diffuse.update_tree();

        PhotonBuildResult { caustic, diffuse, paths: total_paths }
    }

    #[allow(clippy::too_many_arguments)]
    fn trace_one_path(
        &self,
        cdf: &LightCdf,
        sampler: &mut RandomSampler,
        arena: &Bump,
        config: &PhotonBuildConfig,
        caustic_count: &AtomicUsize,
        diffuse_count: &AtomicUsize,
        local_caustic: &mut Vec<Photon>,
        local_diffuse: &mut Vec<Photon>,
        diagnostics: &crate::render_context::Diagnostics,
    ) {
        let (light_idx, pdf_light) = cdf.sample(sampler.get_1d());
        let light = &self.scene.lights[light_idx];
        let u_pos = sampler.get_2d();
        let u_dir = sampler.get_2d();
        let emission = match light.sample_emission(u_pos, u_dir, self.scene) {
            Some(e) if e.pdf_pos > 0.0 && e.pdf_dir > 0.0 => e,
            _ => {
                diagnostics.zero_power_lights.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        let cos_theta = abs_dot(emission.n, emission.ray.dir);
        let mut throughput = emission.radiance * cos_theta / (pdf_light * emission.pdf_pos * emission.pdf_dir);
        let mut ray = emission.ray;
        let mut has_specular_bounce = false;
        let mut bounce: u16 = 0;

        loop {
            let mut r = ray;
            let mut si = match self.scene.intersect(&mut r) {
                Some(si) => si,
                None => break,
            };
            bounce += 1;

            let rd = RayDifferential::new(r);
            let bsdf = match si.compute_scattering_functions(&rd, arena, false, TransportMode::Importance) {
                Some(b) => b,
                None => break,
            };

            let is_diffuse = bsdf.num_components(BxDFType::DIFFUSE | BxDFType::GLOSSY) > 0;
            if is_diffuse {
                let photon = Photon { pos: si.hit.p, wi: -ray.dir, power: throughput };
                if has_specular_bounce {
                    if caustic_count.load(Ordering::Relaxed) < config.caustic_photons {
                        local_caustic.push(photon);
                        caustic_count.fetch_add(1, Ordering::Relaxed);
                    }
                } else if bounce > 1 && diffuse_count.load(Ordering::Relaxed) < config.diffuse_photons {
                    local_diffuse.push(photon);
                    diffuse_count.fetch_add(1, Ordering::Relaxed);
                }
            }

            if bounce >= config.max_bounces {
                break;
            }

            if bounce >= config.rr_start_depth {
                let q = (1.0 - throughput.max_channel()).max(0.0);
                if sampler.get_1d() < q {
                    break;
                }
                throughput = throughput / (1.0 - q).max(1e-4);
            }

            let u_scatter = sampler.get_2d();
            let sample = match bsdf.sample_f(-ray.dir, u_scatter, BxDFType::ALL) {
                Some(s) if s.pdf > 0.0 && !s.f.is_black() => s,
                _ => break,
            };
            has_specular_bounce = has_specular_bounce || sample.sampled_type.contains(BxDFType::SPECULAR);
            let cos = abs_dot(sample.wi, si.shading_n.0);
            throughput = throughput * sample.f * (cos / sample.pdf);

            if throughput.max_channel() < config.power_epsilon {
                diagnostics.photons_failed_to_deposit.fetch_add(1, Ordering::Relaxed);
                break;
            }

            let origin = offset_ray_origin(si.hit.p, si.hit.p_err, si.hit.n, sample.wi);
            ray = Ray::new(origin, sample.wi);
        }
    }
}
