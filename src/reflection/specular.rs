//! Specular lobes (measure-zero support): perfect mirror reflection and
//! dielectric reflection/transmission with Fresnel weighting, enough for
//! the mirror and glass materials and the integrator's specular recursion.

use crate::reflection::{BxDF, BxDFSample, BxDFType};
use crate::spectrum::Spectrum;
use crate::{Float, Point2f, Vec3f};

/// Fresnel reflectance for unpolarized light at a dielectric boundary
/// (Schlick-free exact formula, air on one side).
pub fn fresnel_dielectric(cos_theta_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let cos_theta_i = cos_theta_i.clamp(-1.0, 1.0);
    let (entering, cos_theta_i, eta_i, eta_t) = if cos_theta_i > 0.0 {
        (true, cos_theta_i, eta_i, eta_t)
    } else {
        (false, cos_theta_i.abs(), eta_t, eta_i)
    };
    let _ = entering;

    let sin_theta_i = (0.0 as Float).max(1.0 - cos_theta_i * cos_theta_i).sqrt();
    let sin_theta_t = eta_i / eta_t * sin_theta_i;
    if sin_theta_t >= 1.0 {
        return 1.0;
    }
    let cos_theta_t = (0.0 as Float).max(1.0 - sin_theta_t * sin_theta_t).sqrt();

    let r_parl = ((eta_t * cos_theta_i) - (eta_i * cos_theta_t))
        / ((eta_t * cos_theta_i) + (eta_i * cos_theta_t));
    let r_perp = ((eta_i * cos_theta_i) - (eta_t * cos_theta_t))
        / ((eta_i * cos_theta_i) + (eta_t * cos_theta_t));
    (r_parl * r_parl + r_perp * r_perp) / 2.0
}

pub struct SpecularReflection {
    pub r: Spectrum,
}

impl BxDF for SpecularReflection {
    fn kind(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::uniform(0.0)
    }

    fn sample_f(&self, wo: Vec3f, _u: Point2f) -> Option<BxDFSample> {
        let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
        let cos_theta_i = wi.z;
        Some(BxDFSample {
            wi,
            f: self.r / cos_theta_i.abs(),
            pdf: 1.0,
            sampled_type: self.kind(),
        })
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

/// Mirror lobe with Fresnel-weighted reflectance, used by the dielectric
/// glass material for its reflected component.
pub struct FresnelSpecularReflection {
    pub r: Spectrum,
    pub eta_i: Float,
    pub eta_t: Float,
}

impl BxDF for FresnelSpecularReflection {
    fn kind(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::uniform(0.0)
    }

    fn sample_f(&self, wo: Vec3f, _u: Point2f) -> Option<BxDFSample> {
        let wi = Vec3f::new(-wo.x, -wo.y, wo.z);
        let fr = fresnel_dielectric(wi.z, self.eta_i, self.eta_t);
        Some(BxDFSample {
            wi,
            f: self.r * fr / wi.z.abs(),
            pdf: 1.0,
            sampled_type: self.kind(),
        })
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

pub struct SpecularTransmission {
    pub t: Spectrum,
    pub eta_a: Float,
    pub eta_b: Float,
}

impl BxDF for SpecularTransmission {
    fn kind(&self) -> BxDFType {
        BxDFType::TRANSMISSION | BxDFType::SPECULAR
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        Spectrum::uniform(0.0)
    }

    fn sample_f(&self, wo: Vec3f, _u: Point2f) -> Option<BxDFSample> {
        let entering = wo.z > 0.0;
        let (eta_i, eta_t) = if entering {
            (self.eta_a, self.eta_b)
        } else {
            (self.eta_b, self.eta_a)
        };

        let n = Vec3f::new(0.0, 0.0, if entering { 1.0 } else { -1.0 });
        let wi = refract(wo, n, eta_i / eta_t)?;
        let ft = self.t * (1.0 - fresnel_dielectric(wi.z, self.eta_a, self.eta_b));
        let eta2 = (eta_i / eta_t) * (eta_i / eta_t);
        Some(BxDFSample {
            wi,
            f: ft / (eta2 * wi.z.abs()),
            pdf: 1.0,
            sampled_type: self.kind(),
        })
    }

    fn pdf(&self, _wo: Vec3f, _wi: Vec3f) -> Float {
        0.0
    }
}

fn refract(wi: Vec3f, n: Vec3f, eta: Float) -> Option<Vec3f> {
    use cgmath::InnerSpace;
    let cos_theta_i = n.dot(wi);
    let sin2_theta_i = (0.0 as Float).max(1.0 - cos_theta_i * cos_theta_i);
    let sin2_theta_t = eta * eta * sin2_theta_i;
    if sin2_theta_t >= 1.0 {
        return None;
    }
    let cos_theta_t = (1.0 - sin2_theta_t).sqrt();
    Some(-eta * wi + (eta * cos_theta_i - cos_theta_t) * n)
}

