//! Rays, transforms, and the shading-normal wrapper (§3 Ray / Surface point).

use std::ops::{Deref, Mul};

use cgmath::{InnerSpace, Matrix4, SquareMatrix};

use crate::{Float, Point3f, Vec3f, INFINITY};

pub mod bounds;

pub use bounds::{Bounds2, Bounds2f, Bounds2i, Bounds3, Bounds3f};

/// A ray segment: origin, unit direction, and a parametric `[tmin, tmax]`
/// window. `tmax == INFINITY` is the "no bound" sentinel (§3).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3f,
    pub dir: Vec3f,
    pub t_max: Float,
    pub time: Float,
}

impl Ray {
    pub fn new(origin: Point3f, dir: Vec3f) -> Self {
        Self {
            origin,
            dir,
            t_max: INFINITY,
            time: 0.0,
        }
    }

    #[inline]
    pub fn at(&self, t: Float) -> Point3f {
        self.origin + self.dir * t
    }
}

/// Ray differentials for texture-filter antialiasing (§3). Absent unless a
/// camera generated them, and propagated by reflection/refraction laws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Differential {
    pub rx_origin: Point3f,
    pub rx_dir: Vec3f,
    pub ry_origin: Point3f,
    pub ry_dir: Vec3f,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayDifferential {
    pub ray: Ray,
    pub diff: Option<Differential>,
}

impl RayDifferential {
    pub fn new(ray: Ray) -> Self {
        Self { ray, diff: None }
    }

    /// Scales the differential offsets by `1/sqrt(samples_per_pixel)` so
    /// supersampled rays don't overestimate the footprint (teacher's
    /// `SamplerIntegrator::render` calls this once per camera sample).
    pub fn scale_differentials(&mut self, s: Float) {
        if let Some(d) = &mut self.diff {
            d.rx_origin = self.ray.origin + (d.rx_origin - self.ray.origin) * s;
            d.ry_origin = self.ray.origin + (d.ry_origin - self.ray.origin) * s;
            d.rx_dir = self.ray.dir + (d.rx_dir - self.ray.dir) * s;
            d.ry_dir = self.ray.dir + (d.ry_dir - self.ray.dir) * s;
        }
    }
}

/// Shading/geometric normal wrapper; keeps "this is a normal, transform with
/// the inverse-transpose" distinct from a plain direction vector at the type
/// level (§9 design notes call for small, explicit wrapper types rather than
/// ad hoc conventions).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normal3(pub Vec3f);

impl Normal3 {
    pub fn dot(&self, v: Vec3f) -> Float {
        self.0.dot(v)
    }

    pub fn face_forward(self, v: Vec3f) -> Self {
        if self.0.dot(v) < 0.0 {
            Normal3(-self.0)
        } else {
            self
        }
    }
}

impl Deref for Normal3 {
    type Target = Vec3f;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::MulAssign<Float> for Normal3 {
    fn mul_assign(&mut self, s: Float) {
        self.0 *= s;
    }
}

/// An affine transform carried with its inverse precomputed, as every
/// `Shape` needs both directions for every intersection (object_to_world /
/// world_to_object) without repeated inversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub m: Matrix4<Float>,
    pub m_inv: Matrix4<Float>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            m: Matrix4::from_scale(1.0),
            m_inv: Matrix4::from_scale(1.0),
        }
    }

    pub fn from_matrix(m: Matrix4<Float>) -> Self {
        let m_inv = m.invert().expect("singular transform matrix");
        Self { m, m_inv }
    }

    pub fn translate(delta: Vec3f) -> Self {
        Self {
            m: Matrix4::from_translation(delta),
            m_inv: Matrix4::from_translation(-delta),
        }
    }

    pub fn scale(x: Float, y: Float, z: Float) -> Self {
        Self {
            m: Matrix4::from_nonuniform_scale(x, y, z),
            m_inv: Matrix4::from_nonuniform_scale(1.0 / x, 1.0 / y, 1.0 / z),
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            m: self.m_inv,
            m_inv: self.m,
        }
    }

    pub fn camera_look_at(pos: Point3f, look: Point3f, up: Vec3f) -> Self {
        let dir = (look - pos).normalize();
        let right = up.normalize().cross(dir).normalize();
        let new_up = dir.cross(right);
        let m = Matrix4::from_cols(
            right.extend(0.0),
            new_up.extend(0.0),
            dir.extend(0.0),
            pos.to_homogeneous(),
        );
        Self::from_matrix(m)
    }

    pub fn perspective(fov_deg: Float, near: Float, far: Float) -> Self {
        let inv_tan = 1.0 / (fov_deg.to_radians() / 2.0).tan();
        let persp = Matrix4::new(
            inv_tan, 0.0, 0.0, 0.0,
            0.0, inv_tan, 0.0, 0.0,
            0.0, 0.0, far / (far - near), 1.0,
            0.0, 0.0, -far * near / (far - near), 0.0,
        );
        Self::from_matrix(persp)
    }

    pub fn transform(&self, p: Point3f) -> Point3f {
        use cgmath::EuclideanSpace;
        let hp = self.m * p.to_homogeneous();
        if hp.w == 1.0 {
            Point3f::from_homogeneous(hp)
        } else {
            Point3f::from_homogeneous(hp / hp.w)
        }
    }

    pub fn transform_vec(&self, v: Vec3f) -> Vec3f {
        (self.m * v.extend(0.0)).truncate()
    }

    pub fn transform_normal(&self, n: Normal3) -> Normal3 {
        let m_inv_t = self.m_inv.transpose();
        Normal3((m_inv_t * n.0.extend(0.0)).truncate())
    }

    pub fn transform_ray_differential(&self, rd: RayDifferential) -> RayDifferential {
        RayDifferential {
            ray: self.transform_ray(rd.ray),
            diff: rd.diff.map(|d| Differential {
                rx_origin: self.transform(d.rx_origin),
                rx_dir: self.transform_vec(d.rx_dir),
                ry_origin: self.transform(d.ry_origin),
                ry_dir: self.transform_vec(d.ry_dir),
            }),
        }
    }

    pub fn transform_ray(&self, ray: Ray) -> Ray {
        Ray {
            origin: self.transform(ray.origin),
            dir: self.transform_vec(ray.dir),
            t_max: ray.t_max,
            time: ray.time,
        }
    }

    /// Transforms a point and returns the absolute rounding-error bound on
    /// the result, per the shape intersection robustness scheme (§9 notes on
    /// floating-point error propagation).
    pub fn transform_point_with_error(&self, p: Point3f) -> (Point3f, Vec3f) {
        use cgmath::EuclideanSpace;
        let m = self.m;
        let x_abs_sum = (m.x.x * p.x).abs() + (m.y.x * p.y).abs() + (m.z.x * p.z).abs() + m.w.x.abs();
        let y_abs_sum = (m.x.y * p.x).abs() + (m.y.y * p.y).abs() + (m.z.y * p.z).abs() + m.w.y.abs();
        let z_abs_sum = (m.x.z * p.x).abs() + (m.y.z * p.y).abs() + (m.z.z * p.z).abs() + m.w.z.abs();
        let err = crate::err_float::gamma(3) * Vec3f::new(x_abs_sum, y_abs_sum, z_abs_sum);
        let hp = m * p.to_homogeneous();
        let tp = if hp.w == 1.0 {
            Point3f::from_homogeneous(hp)
        } else {
            Point3f::from_homogeneous(hp / hp.w)
        };
        (tp, err)
    }

    /// Propagates an existing absolute error through the transform, combined
    /// with this transform's own rounding error.
    pub fn propagate_point_error(&self, p: Point3f, p_err: Vec3f) -> (Point3f, Vec3f) {
        use cgmath::EuclideanSpace;
        let m = self.m;
        let g = crate::err_float::gamma(3) + 1.0;
        let x_err = g * ((m.x.x.abs() * p_err.x) + (m.y.x.abs() * p_err.y) + (m.z.x.abs() * p_err.z));
        let y_err = g * ((m.x.y.abs() * p_err.x) + (m.y.y.abs() * p_err.y) + (m.z.y.abs() * p_err.z));
        let z_err = g * ((m.x.z.abs() * p_err.x) + (m.y.z.abs() * p_err.y) + (m.z.z.abs() * p_err.z));
        let (tp, rounding_err) = self.transform_point_with_error(p);
        (tp, Vec3f::new(x_err, y_err, z_err) + rounding_err)
    }

    /// Transforms a ray into this transform's space and reports the origin's
    /// absolute error and the direction's relative error bound, as
    /// `Sphere::intersect` needs before building `EFloat` coordinates.
    pub fn transform_ray_with_error(&self, ray: Ray) -> (Ray, (Vec3f, Vec3f)) {
        let (origin, origin_err) = self.transform_point_with_error(ray.origin);
        let dir = self.transform_vec(ray.dir);
        let dir_err = crate::err_float::gamma(3) * dir.map(Float::abs);
        (
            Ray {
                origin,
                dir,
                t_max: ray.t_max,
                time: ray.time,
            },
            (origin_err, dir_err),
        )
    }
}

impl Mul for Transform {
    type Output = Transform;
    fn mul(self, rhs: Transform) -> Transform {
        Transform {
            m: self.m * rhs.m,
            m_inv: rhs.m_inv * self.m_inv,
        }
    }
}
