//! Warping utilities shared by shapes, lights, and the direct-lighting
//! integrator: mapping uniform `[0,1)^2` samples onto disks, hemispheres,
//! and spheres, plus the power heuristic for multiple importance sampling.

use cgmath::{InnerSpace, Point3};

use crate::{Float, Point2f, Vec3f, PI};

/// Builds an orthonormal `(tangent, bitangent)` pair perpendicular to a unit
/// `n`, used to map a local-frame hemisphere sample (e.g. a diffuse light's
/// cosine-weighted emission direction) into world space.
pub fn coordinate_system(n: Vec3f) -> (Vec3f, Vec3f) {
    let sign = if n.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + n.z);
    let b = n.x * n.y * a;
    let t = Vec3f::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x);
    let bt = Vec3f::new(b, sign + n.y * n.y * a, -n.y);
    (t, bt)
}

pub fn concentric_sample_disk(u: Point2f) -> Point2f {
    let offset = Point2f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0);
    if offset.x == 0.0 && offset.y == 0.0 {
        return Point2f::new(0.0, 0.0);
    }
    let (theta, r) = if offset.x.abs() > offset.y.abs() {
        (PI / 4.0 * (offset.y / offset.x), offset.x)
    } else {
        (PI / 2.0 - PI / 4.0 * (offset.x / offset.y), offset.y)
    };
    Point2f::new(r * theta.cos(), r * theta.sin())
}

pub fn cosine_sample_hemisphere(u: Point2f) -> Vec3f {
    let d = concentric_sample_disk(u);
    let z = (0.0 as Float).max(1.0 - d.x * d.x - d.y * d.y).sqrt();
    Vec3f::new(d.x, d.y, z)
}

#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta / PI
}

pub fn uniform_sample_sphere(u: Point2f) -> Vec3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (0.0 as Float).max(1.0 - z * z).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_sphere_pdf() -> Float {
    1.0 / (4.0 * PI)
}

pub fn uniform_sample_hemisphere(u: Point2f) -> Vec3f {
    let z = u.x;
    let r = (0.0 as Float).max(1.0 - z * z).sqrt();
    let phi = 2.0 * PI * u.y;
    Vec3f::new(r * phi.cos(), r * phi.sin(), z)
}

#[inline]
pub fn uniform_hemisphere_pdf() -> Float {
    1.0 / (2.0 * PI)
}

pub fn uniform_sample_triangle(u: Point2f) -> (Float, Float) {
    let su0 = u.x.sqrt();
    (1.0 - su0, u.y * su0)
}

/// Used by [`crate::shapes::sphere`]'s area-sampling test to check the
/// distribution is actually uniform on the sphere without depending on the
/// shape's own sampling code.
pub fn rejection_sample_sphere(u: Point2f, v: Float) -> Point3<Float> {
    let p = uniform_sample_sphere(Point2f::new(u.x, v));
    Point3::new(p.x, p.y, p.z)
}

/// The power-heuristic MIS weight with exponent 2, as used throughout the
/// direct-lighting estimator to combine light and BSDF sampling strategies.
#[inline]
pub fn power_heuristic(nf: i32, f_pdf: Float, ng: i32, g_pdf: Float) -> Float {
    let f = nf as Float * f_pdf;
    let g = ng as Float * g_pdf;
    if f.is_infinite() {
        return 1.0;
    }
    (f * f) / (f * f + g * g)
}
