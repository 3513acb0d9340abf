//! Reconstruction filter kernels for `Film::add_sample` (§4.3): a sample
//! lands in every pixel whose kernel support overlaps it, weighted by
//! `evaluate(dx, dy)`.

use crate::{Float, Vec2f};

pub trait Filter: Sync + Send {
    fn radius(&self) -> Vec2f;
    fn evaluate(&self, p: Vec2f) -> Float;
}

/// Box filter: every offset within the radius gets weight 1. The simplest
/// kernel and the teacher's default; a Gaussian/Mitchell kernel would plug
/// in behind the same trait without touching `Film`.
pub struct BoxFilter {
    pub radius: Vec2f,
}

impl Default for BoxFilter {
    fn default() -> Self {
        Self { radius: Vec2f::new(0.5, 0.5) }
    }
}

impl Filter for BoxFilter {
    fn radius(&self) -> Vec2f {
        self.radius
    }

    fn evaluate(&self, _p: Vec2f) -> Float {
        1.0
    }
}

/// Separable Gaussian, falling to zero at the filter radius (subtracting
/// the value at the radius avoids a hard discontinuity there).
pub struct GaussianFilter {
    pub radius: Vec2f,
    alpha: Float,
    exp_x: Float,
    exp_y: Float,
}

impl GaussianFilter {
    pub fn new(radius: Vec2f, alpha: Float) -> Self {
        Self {
            radius,
            alpha,
            exp_x: (-alpha * radius.x * radius.x).exp(),
            exp_y: (-alpha * radius.y * radius.y).exp(),
        }
    }

    fn gaussian(&self, d: Float, expv: Float) -> Float {
        ((-self.alpha * d * d).exp() - expv).max(0.0)
    }
}

impl Filter for GaussianFilter {
    fn radius(&self) -> Vec2f {
        self.radius
    }

    fn evaluate(&self, p: Vec2f) -> Float {
        self.gaussian(p.x, self.exp_x) * self.gaussian(p.y, self.exp_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_filter_is_constant_within_radius() {
        let f = BoxFilter::default();
        assert_eq!(f.evaluate(Vec2f::new(0.1, 0.2)), 1.0);
        assert_eq!(f.evaluate(Vec2f::new(0.49, -0.49)), 1.0);
    }

    #[test]
    fn gaussian_filter_peaks_at_center() {
        let f = GaussianFilter::new(Vec2f::new(2.0, 2.0), 0.5);
        assert!(f.evaluate(Vec2f::new(0.0, 0.0)) > f.evaluate(Vec2f::new(1.0, 1.0)));
        assert!(f.evaluate(Vec2f::new(1.99, 0.0)) >= 0.0);
    }
}
