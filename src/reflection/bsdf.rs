//! Shading-frame BSDF aggregator: transforms world-space directions into
//! the local frame `(dpdu, dpdv, n)` and sums over the material's BxDF
//! lobes, as in `compute_scattering_functions` (§6 material.evaluate /
//! material.sample).

use arrayvec::ArrayVec;
use cgmath::InnerSpace;

use crate::reflection::{BxDFSample, BxDFType, BxDF};
use crate::spectrum::Spectrum;
use crate::{Float, Normal3, Point2f, Vec3f};

const MAX_BXDFS: usize = 8;

pub struct Bsdf<'a> {
    ns: Normal3,
    ng: Normal3,
    ss: Vec3f,
    ts: Vec3f,
    bxdfs: ArrayVec<[&'a dyn BxDF; MAX_BXDFS]>,
    /// Relative index of refraction, set by dielectric materials so the
    /// integrator's `specular_transmit` can compute the ray-differential
    /// refraction Jacobian without threading it through separately.
    pub eta: Float,
}

impl<'a> Bsdf<'a> {
    pub fn new(ng: Normal3, ns: Normal3, dpdu: Vec3f) -> Self {
        let ss = (dpdu - ns.0 * ns.0.dot(dpdu)).normalize();
        let ts = ns.0.cross(ss);
        Self {
            ns,
            ng,
            ss,
            ts,
            bxdfs: ArrayVec::new(),
            eta: 1.0,
        }
    }

    pub fn set_eta(&mut self, eta: Float) {
        self.eta = eta;
    }

    pub fn add(&mut self, bxdf: &'a dyn BxDF) {
        self.bxdfs.try_push(bxdf).ok();
    }

    pub fn num_components(&self, flags: BxDFType) -> usize {
        self.bxdfs.iter().filter(|b| b.matches(flags)).count()
    }

    fn to_local(&self, v: Vec3f) -> Vec3f {
        Vec3f::new(v.dot(self.ss), v.dot(self.ts), v.dot(self.ns.0))
    }

    fn to_world(&self, v: Vec3f) -> Vec3f {
        self.ss * v.x + self.ts * v.y + self.ns.0 * v.z
    }

    /// Sums `f(wo, wi)` over lobes matching `flags`, excluding lobes whose
    /// reflect/transmit side doesn't match the geometric-normal sign (to
    /// avoid light leaking through backfacing geometry).
    pub fn f(&self, wo_w: Vec3f, wi_w: Vec3f, flags: BxDFType) -> Spectrum {
        let wo = self.to_local(wo_w);
        let wi = self.to_local(wi_w);
        if wo.z == 0.0 {
            return Spectrum::uniform(0.0);
        }
        let reflect = wi_w.dot(self.ng.0) * wo_w.dot(self.ng.0) > 0.0;
        let mut f = Spectrum::uniform(0.0);
        for b in self.bxdfs.iter().filter(|b| b.matches(flags)) {
            let is_refl = b.kind().contains(BxDFType::REFLECTION);
            let is_trans = b.kind().contains(BxDFType::TRANSMISSION);
            if (reflect && is_refl) || (!reflect && is_trans) {
                f += b.f(wo, wi);
            }
        }
        f
    }

    /// Averages `pdf(wo, wi)` over lobes matching `flags`, the same set
    /// `sample_f` draws from, so it is consistent for MIS weighting.
    pub fn pdf(&self, wo_w: Vec3f, wi_w: Vec3f, flags: BxDFType) -> Float {
        let wo = self.to_local(wo_w);
        let wi = self.to_local(wi_w);
        if wo.z == 0.0 {
            return 0.0;
        }
        let matching: ArrayVec<[&dyn BxDF; MAX_BXDFS]> =
            self.bxdfs.iter().copied().filter(|b| b.matches(flags)).collect();
        if matching.is_empty() {
            return 0.0;
        }
        let sum: Float = matching.iter().map(|b| b.pdf(wo, wi)).sum();
        sum / matching.len() as Float
    }

    /// Samples one matching BxDF uniformly, as pbrt-family integrators do;
    /// `sampled_lobe` lets the caller know which capability (specular,
    /// diffuse, ...) produced the ray for the surface-integrator state
    /// machine's capability-flag transitions (§4.9).
    pub fn sample_f(&self, wo_w: Vec3f, u: Point2f, flags: BxDFType) -> Option<BxDFSample> {
        let matching: ArrayVec<[&dyn BxDF; MAX_BXDFS]> =
            self.bxdfs.iter().copied().filter(|b| b.matches(flags)).collect();
        if matching.is_empty() {
            return None;
        }
        let idx = ((u.x * matching.len() as Float) as usize).min(matching.len() - 1);
        let chosen = matching[idx];
        let wo = self.to_local(wo_w);
        if wo.z == 0.0 {
            return None;
        }
        let sample = chosen.sample_f(wo, u)?;
        if sample.pdf == 0.0 {
            return None;
        }
        let wi_w = self.to_world(sample.wi);

        // Combine with other matching lobes' pdf/value unless specular,
        // whose support is measure-zero and thus lobe-exclusive.
        let (pdf, f) = if chosen.kind().contains(BxDFType::SPECULAR) {
            (sample.pdf / matching.len() as Float, sample.f)
        } else {
            let mut pdf = sample.pdf;
            let mut f = sample.f;
            for &other in matching.iter() {
                if std::ptr::eq(other, chosen) {
                    continue;
                }
                pdf += other.pdf(wo, sample.wi);
                f += other.f(wo, sample.wi);
            }
            (pdf / matching.len() as Float, f)
        };

        Some(BxDFSample {
            wi: wi_w,
            f,
            pdf,
            sampled_type: sample.sampled_type,
        })
    }
}
