//! Surface hit/interaction records (§3 Surface point, Ray).

use bumpalo::Bump;
use cgmath::{EuclideanSpace, InnerSpace, Matrix2, Vector2, Zero};

use crate::material::TransportMode;
use crate::primitive::Primitive;
use crate::reflection::bsdf::Bsdf;
use crate::spectrum::Spectrum;
use crate::{
    solve_linear_system_2x2, Differential, Float, Normal3, Point2f, Point3f, Ray, RayDifferential,
    Vec2f, Vec3f,
};

pub const SHADOW_EPSILON: Float = 0.0001;

/// The minimal reusable hit record: just enough to spawn new rays. Lights
/// carry this as their reference point and sample target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub p: Point3f,
    pub p_err: Vec3f,
    pub time: Float,
    pub n: Normal3,
}

impl SurfaceHit {
    pub fn spawn_ray(&self, dir: Vec3f) -> Ray {
        let o = crate::offset_ray_origin(self.p, self.p_err, self.n, dir);
        Ray {
            origin: o,
            dir,
            t_max: crate::INFINITY,
            time: self.time,
        }
    }

    pub fn spawn_ray_with_differentials(
        &self,
        dir: Vec3f,
        diff: Option<Differential>,
    ) -> RayDifferential {
        let ray = self.spawn_ray(dir);
        RayDifferential { ray, diff }
    }

    /// Shadow ray towards a point light / infinite light direction, capped
    /// just short of `t = 1` (§3 Ray invariant) to avoid self-shadowing at
    /// the target.
    pub fn spawn_ray_to(&self, to: Point3f) -> Ray {
        let origin = crate::offset_ray_origin(self.p, self.p_err, self.n, to - self.p);
        let dir = to - origin;
        Ray {
            origin,
            dir,
            t_max: 1.0 - SHADOW_EPSILON,
            time: self.time,
        }
    }

    pub fn spawn_ray_to_hit(&self, to: SurfaceHit) -> Ray {
        let origin = crate::offset_ray_origin(self.p, self.p_err, self.n, to.p - self.p);
        let target = crate::offset_ray_origin(to.p, to.p_err, to.n, origin - to.p);
        let dir = target - origin;
        Ray {
            origin,
            dir,
            t_max: 1.0 - SHADOW_EPSILON,
            time: self.time,
        }
    }
}

/// Full interaction record produced by `Shape::intersect`: geometry, shading
/// frame, texture differentials, and (once bound by the primitive) the
/// material/area-light handle (§3 Surface point).
pub struct SurfaceInteraction<'i> {
    pub hit: SurfaceHit,
    pub uv: Point2f,
    pub wo: Vec3f,
    pub geom: DiffGeom,
    pub shading_n: Normal3,
    pub shading_geom: DiffGeom,
    pub tex_diffs: Option<TextureDifferentials>,
    pub primitive: Option<&'i dyn Primitive>,
}

impl<'i> SurfaceInteraction<'i> {
    pub fn new(
        p: Point3f,
        p_err: Vec3f,
        time: Float,
        uv: Point2f,
        wo: Vec3f,
        n: Normal3,
        geom: DiffGeom,
    ) -> Self {
        Self {
            hit: SurfaceHit { p, p_err, time, n },
            uv,
            wo,
            geom,
            shading_n: n,
            shading_geom: geom,
            tex_diffs: None,
            primitive: None,
        }
    }

    pub fn compute_scattering_functions<'a>(
        &mut self,
        ray: &RayDifferential,
        arena: &'a Bump,
        allow_multiple_lobes: bool,
        mode: TransportMode,
    ) -> Option<Bsdf<'a>> {
        self.tex_diffs = self.compute_tex_differentials(ray);
        let material = self.primitive.expect("hit must have a bound primitive").material()?;
        Some(material.compute_scattering_functions(self, arena, mode, allow_multiple_lobes))
    }

    #[allow(non_snake_case)]
    fn compute_tex_differentials(&self, ray: &RayDifferential) -> Option<TextureDifferentials> {
        let n = self.hit.n;
        let diff = ray.diff?;
        let d = n.dot(self.hit.p.to_vec());

        let px = {
            let tx = -(n.dot(diff.rx_origin.to_vec()) - d) / n.dot(diff.rx_dir);
            diff.rx_origin + tx * diff.rx_dir
        };
        let py = {
            let ty = -(n.dot(diff.ry_origin.to_vec()) - d) / n.dot(diff.ry_dir);
            diff.ry_origin + ty * diff.ry_dir
        };

        let dpdx = px - self.hit.p;
        let dpdy = py - self.hit.p;

        let dim = if n.x.abs() > n.y.abs() && n.x.abs() > n.z.abs() {
            (1, 2)
        } else if n.y.abs() > n.z.abs() {
            (0, 2)
        } else {
            (0, 1)
        };

        let dpdu = self.geom.dpdu;
        let dpdv = self.geom.dpdv;
        let pick = |v: Vec3f| match dim {
            (0, 1) => Vector2::new(v.x, v.y),
            (0, 2) => Vector2::new(v.x, v.z),
            _ => Vector2::new(v.y, v.z),
        };
        let a = Matrix2::from_cols(pick(dpdu), pick(dpdv));
        let bx = pick(dpdx);
        let by = pick(dpdy);

        let (dudx, dvdx) = solve_linear_system_2x2(a, bx)?.into();
        let (dudy, dvdy) = solve_linear_system_2x2(a, by)?.into();
        Some(TextureDifferentials {
            dpdx,
            dpdy,
            dudx,
            dvdx,
            dudy,
            dvdy,
        })
    }

    pub fn emitted_radiance(&self, w: Vec3f) -> Spectrum {
        let prim = self.primitive.expect("hit must have a bound primitive");
        prim.area_light()
            .map_or(Spectrum::uniform(0.0), |light| light.emitted_radiance(self.hit, w))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffGeom {
    pub dpdu: Vec3f,
    pub dpdv: Vec3f,
    pub dndu: Normal3,
    pub dndv: Normal3,
}

impl DiffGeom {
    pub fn zero() -> Self {
        Self {
            dpdu: Vec3f::zero(),
            dpdv: Vec3f::zero(),
            dndu: Normal3(Vec3f::zero()),
            dndv: Normal3(Vec3f::zero()),
        }
    }
}

/// Partial derivatives used for texture antialiasing (§3 Ray differentials).
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TextureDifferentials {
    pub dpdx: Vec3f,
    pub dpdy: Vec3f,
    pub dudx: Float,
    pub dvdx: Float,
    pub dudy: Float,
    pub dvdy: Float,
}
