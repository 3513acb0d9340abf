//! Perfectly diffuse lobe, the only BxDF the matte material needs.

use crate::reflection::{same_hemisphere, BxDF, BxDFSample, BxDFType};
use crate::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere};
use crate::spectrum::Spectrum;
use crate::{Float, Point2f, Vec3f, PI};

pub struct LambertianReflection {
    pub reflectance: Spectrum,
}

impl LambertianReflection {
    pub fn new(reflectance: Spectrum) -> Self {
        Self { reflectance }
    }
}

impl BxDF for LambertianReflection {
    fn kind(&self) -> BxDFType {
        BxDFType::REFLECTION | BxDFType::DIFFUSE
    }

    fn f(&self, _wo: Vec3f, _wi: Vec3f) -> Spectrum {
        self.reflectance / PI
    }

    fn sample_f(&self, wo: Vec3f, u: Point2f) -> Option<BxDFSample> {
        let mut wi = cosine_sample_hemisphere(u);
        if wo.z < 0.0 {
            wi.z *= -1.0;
        }
        let pdf = self.pdf(wo, wi);
        Some(BxDFSample {
            wi,
            f: self.f(wo, wi),
            pdf,
            sampled_type: self.kind(),
        })
    }

    fn pdf(&self, wo: Vec3f, wi: Vec3f) -> Float {
        if same_hemisphere(wo, wi) {
            cosine_hemisphere_pdf(wi.z.abs())
        } else {
            0.0
        }
    }
}
