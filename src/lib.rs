//! Core Monte-Carlo rendering engine: scene acceleration, tile-parallel
//! sampling, surface/volume integration, and photon mapping.
//!
//! Scene construction (parsing, plugin loading, file I/O) lives outside this
//! crate; see the module docs on [`scene::Scene`] for the boundary.

pub mod accel;
pub mod camera;
pub mod config;
pub mod df3;
pub mod driver;
pub mod err_float;
pub mod error;
pub mod film;
pub mod filter;
pub mod geometry;
pub mod image_buffer;
pub mod integrator;
pub mod interaction;
pub mod light;
pub mod material;
pub mod math;
pub mod photon;
pub mod primitive;
pub mod ramp;
pub mod reflection;
pub mod render_context;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod shapes;
pub mod splitter;
pub mod spectrum;
pub mod volume;

pub use err_float::EFloat;
pub use error::{RenderError, RenderResult};
pub use geometry::{
    Bounds2, Bounds2f, Bounds2i, Bounds3, Bounds3f, Differential, Normal3, Ray, RayDifferential,
    Transform,
};
pub use interaction::{DiffGeom, SurfaceHit, SurfaceInteraction};
pub use spectrum::{Rgb, Rgba};

/// The engine's scalar float type. Kept as a single alias (as the teacher
/// does) so a future f64 build is a one-line change.
pub type Float = f32;

pub const INFINITY: Float = std::f32::INFINITY;
pub const NEG_INFINITY: Float = std::f32::NEG_INFINITY;
pub const PI: Float = std::f32::consts::PI;

pub type Point2i = cgmath::Point2<i32>;
pub type Point2f = cgmath::Point2<Float>;
pub type Point3f = cgmath::Point3<Float>;
pub type Vec2f = cgmath::Vector2<Float>;
pub type Vec3f = cgmath::Vector3<Float>;

#[inline]
pub fn abs_dot(a: Vec3f, b: Vec3f) -> Float {
    use cgmath::InnerSpace;
    a.dot(b).abs()
}

/// Offsets a ray origin away from a surface along its normal to dodge
/// self-intersection, per the surface-point invariant in the data model.
#[inline]
pub fn offset_ray_origin(p: Point3f, p_err: Vec3f, n: Normal3, w: Vec3f) -> Point3f {
    use cgmath::{EuclideanSpace, InnerSpace};
    let d = abs_dot(n.0, p_err.map(Float::abs)) + 1e-5;
    let offset = if n.0.dot(w) < 0.0 { -d * n.0 } else { d * n.0 };
    p + offset
}

/// Solves a 2x2 linear system `A x = b`, returning `None` if `A` is singular.
pub fn solve_linear_system_2x2(a: cgmath::Matrix2<Float>, b: Vec2f) -> Option<Vec2f> {
    let det = a.x.x * a.y.y - a.x.y * a.y.x;
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;
    Some(cgmath::Vector2::new(
        (a.y.y * b.x - a.x.y * b.y) * inv_det,
        (a.x.x * b.y - a.y.x * b.x) * inv_det,
    ))
}

#[macro_export]
macro_rules! point3f {
    ($x:expr, $y:expr, $z:expr) => {
        $crate::Point3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)
    };
}

#[macro_export]
macro_rules! vec3f {
    ($x:expr, $y:expr, $z:expr) => {
        $crate::Vec3f::new($x as $crate::Float, $y as $crate::Float, $z as $crate::Float)
    };
}

#[macro_export]
macro_rules! bounds3f {
    (($x0:expr, $y0:expr, $z0:expr), ($x1:expr, $y1:expr, $z1:expr)) => {
        $crate::Bounds3f::with_bounds(
            $crate::point3f!($x0, $y0, $z0),
            $crate::point3f!($x1, $y1, $z1),
        )
    };
}

pub trait ComponentWiseExt {
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
}

impl ComponentWiseExt for Point3f {
    fn min(self, other: Self) -> Self {
        point3f!(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z)
        )
    }
    fn max(self, other: Self) -> Self {
        point3f!(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z)
        )
    }
}

#[inline]
pub fn distance(a: Point3f, b: Point3f) -> Float {
    use cgmath::MetricSpace;
    a.distance(b)
}

pub fn lerp(t: Float, a: Float, b: Float) -> Float {
    (1.0 - t) * a + t * b
}
