//! Robust sphere intersection via `EFloat` error-bound quadratic roots,
//! adapted directly from the shape family's reference implementation.

use std::borrow::Borrow;

use cgmath::{EuclideanSpace, InnerSpace};

use crate::err_float::gamma;
use crate::geometry::bounds::Bounds3;
use crate::geometry::{Ray, Transform};
use crate::interaction::{DiffGeom, SurfaceHit, SurfaceInteraction};
use crate::math::quadratic;
use crate::sampling::uniform_sample_sphere;
use crate::shapes::Shape;
use crate::{bounds3f, distance, point3f, vec3f, ComponentWiseExt, EFloat, Float, Normal3, Point2f, Point3f, Vec3f, PI};

#[derive(Debug, PartialEq)]
pub struct Sphere<T: Borrow<Transform> = Transform> {
    object_to_world: T,
    world_to_object: T,
    reverse_orientation: bool,

    radius: Float,
    z_min: Float,
    z_max: Float,
    theta_min: Float,
    theta_max: Float,
    phi_max: Float,
}

impl<T: Borrow<Transform>> Sphere<T> {
    pub fn new(
        object_to_world: T,
        world_to_object: T,
        reverse_orientation: bool,
        radius: Float,
        z_min: Float,
        z_max: Float,
        phi_max: Float,
    ) -> Self {
        Self {
            object_to_world,
            world_to_object,
            reverse_orientation,
            radius,
            z_min: Float::min(z_min, z_max).clamp(-radius, radius),
            z_max: Float::max(z_min, z_max).clamp(-radius, radius),
            theta_min: Float::clamp(z_min / radius, -1.0, 1.0).acos(),
            theta_max: Float::clamp(z_max / radius, -1.0, 1.0).acos(),
            phi_max: phi_max.clamp(0.0, 360.0).to_radians(),
        }
    }

    pub fn whole(object_to_world: T, world_to_object: T, radius: Float) -> Self {
        Self::new(object_to_world, world_to_object, false, radius, -radius, radius, 360.0)
    }
}

impl<T: Borrow<Transform> + Sync + Send> Shape for Sphere<T> {
    fn object_bound(&self) -> Bounds3<Float> {
        bounds3f!((-self.radius, -self.radius, self.z_min), (self.radius, self.radius, self.z_max))
    }

    fn object_to_world(&self) -> &Transform {
        self.object_to_world.borrow()
    }

    fn world_to_object(&self) -> &Transform {
        self.world_to_object.borrow()
    }

    fn reverse_orientation(&self) -> bool {
        self.reverse_orientation
    }

    fn area(&self) -> Float {
        self.phi_max * self.radius * (self.z_max - self.z_min)
    }

    #[allow(non_snake_case, clippy::many_single_char_names)]
    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let (ray, (origin_err, dir_err)) = self.world_to_object().transform_ray_with_error(*ray);

        let ox = EFloat::with_err(ray.origin.x, origin_err.x);
        let oy = EFloat::with_err(ray.origin.y, origin_err.y);
        let oz = EFloat::with_err(ray.origin.z, origin_err.z);
        let dirx = EFloat::with_err(ray.dir.x, dir_err.x);
        let diry = EFloat::with_err(ray.dir.y, dir_err.y);
        let dirz = EFloat::with_err(ray.dir.z, dir_err.z);

        let a = dirx * dirx + diry * diry + dirz * dirz;
        let b = 2.0 * (dirx * ox + diry * oy + dirz * oz);
        let c = ox * ox + oy * oy + oz * oz - EFloat::new(self.radius) * EFloat::new(self.radius);

        let (t0, t1) = quadratic(a, b, c)?;
        if t0.upper_bound() > ray.t_max || t1.lower_bound() <= 0.0 {
            return None;
        }

        let mut t_shape_hit = t0;
        if t_shape_hit.lower_bound() <= 0.0 {
            t_shape_hit = t1;
            if t_shape_hit.upper_bound() > ray.t_max {
                return None;
            }
        }

        let mut p_hit = ray.at(t_shape_hit.into());
        p_hit *= self.radius / distance(p_hit, point3f!(0, 0, 0));
        if p_hit.x == 0.0 && p_hit.y == 0.0 {
            p_hit.x = 1.0e-5 * self.radius;
        }
        let mut phi = Float::atan2(p_hit.y, p_hit.x);
        if phi < 0.0 {
            phi += 2.0 * PI;
        }

        if (self.z_min > -self.radius && p_hit.z < self.z_min)
            || (self.z_max < self.radius && p_hit.z > self.z_max)
            || phi > self.phi_max
        {
            if t_shape_hit == t1 {
                return None;
            }
            if t1.upper_bound() > ray.t_max {
                return None;
            }
            t_shape_hit = t1;

            p_hit = ray.at(t_shape_hit.into());
            p_hit *= self.radius / distance(p_hit, point3f!(0, 0, 0));
            if p_hit.x == 0.0 && p_hit.y == 0.0 {
                p_hit.x = 1.0e-5 * self.radius;
            }
            phi = Float::atan2(p_hit.y, p_hit.x);
            if phi < 0.0 {
                phi += 2.0 * PI;
            }

            if (self.z_min > -self.radius && p_hit.z < self.z_min)
                || (self.z_max < self.radius && p_hit.z > self.z_max)
                || phi > self.phi_max
            {
                return None;
            }
        }

        let u = phi / self.phi_max;
        let theta = Float::acos((p_hit.z / self.radius).clamp(-1.0, 1.0));
        let v = (theta - self.theta_min) / (self.theta_max - self.theta_min);

        let z_radius = (p_hit.x * p_hit.x + p_hit.y * p_hit.y).sqrt();
        let inv_z_radius = 1.0 / z_radius;
        let cos_phi = p_hit.x * inv_z_radius;
        let sin_phi = p_hit.y * inv_z_radius;

        let dpdu = vec3f!(-self.phi_max * p_hit.y, self.phi_max * p_hit.x, 0.0);
        let dpdv =
            (self.theta_max - self.theta_min) * vec3f!(p_hit.z * cos_phi, p_hit.z * sin_phi, -self.radius * theta.sin());

        let d2pduu = (-self.phi_max * self.phi_max) * vec3f!(p_hit.x, p_hit.y, 0.0);
        let d2pduv = (self.theta_max - self.theta_min) * p_hit.z * self.phi_max * vec3f!(-sin_phi, cos_phi, 0.0);
        let d2pdvv =
            -(self.theta_max - self.theta_min) * (self.theta_max - self.theta_min) * vec3f!(p_hit.x, p_hit.y, p_hit.z);

        let e1 = dpdu.dot(dpdu);
        let f1 = dpdu.dot(dpdv);
        let g1 = dpdv.dot(dpdv);
        let mut n = dpdu.cross(dpdv).normalize();
        let e2 = n.dot(d2pduu);
        let f2 = n.dot(d2pduv);
        let g2 = n.dot(d2pdvv);

        let inv_egf2 = 1.0 / (e1 * g1 - f1 * f1);
        let dndu = Normal3((f2 * f1 - e2 * g1) * inv_egf2 * dpdu + (e2 * f1 - f2 * e1) * inv_egf2 * dpdv);
        let dndv = Normal3((g2 * f1 - f2 * g1) * inv_egf2 * dpdu + (f2 * f1 - g2 * e1) * inv_egf2 * dpdv);

        let p_err: Vec3f = gamma(5) * p_hit.to_vec().map(Float::abs);

        if self.reverse_orientation() {
            n *= -1.0;
        }

        let obj_interact = SurfaceInteraction::new(
            p_hit,
            p_err,
            ray.time,
            Point2f::new(u, v),
            -ray.dir,
            Normal3(n),
            DiffGeom { dpdu, dpdv, dndu, dndv },
        );

        let world_interact = transform_interaction_to_world(self.object_to_world(), obj_interact);
        Some((t_shape_hit.into(), world_interact))
    }

    fn sample(&self, u: Point2f) -> SurfaceHit {
        let mut p_obj = point3f!(0, 0, 0) + self.radius * uniform_sample_sphere(u);
        let mut n = Normal3(self.object_to_world().transform_vec(p_obj.to_vec()).normalize());
        if self.reverse_orientation {
            n *= -1.0;
        }
        p_obj *= self.radius / distance(p_obj, point3f!(0, 0, 0));
        let p_obj_err = gamma(5) * p_obj.to_vec().map(Float::abs);
        let (p, p_err) = self.object_to_world().propagate_point_error(p_obj, p_obj_err);
        SurfaceHit { p, p_err, time: 0.0, n }
    }
}

/// Carries an object-space interaction into world space, propagating the
/// point's error bound and transforming the differential geometry.
fn transform_interaction_to_world<'i>(t: &Transform, si: SurfaceInteraction<'i>) -> SurfaceInteraction<'i> {
    let (p, p_err) = t.propagate_point_error(si.hit.p, si.hit.p_err);
    let n = t.transform_normal(si.hit.n).face_forward(t.transform_vec(*si.hit.n));
    SurfaceInteraction {
        hit: SurfaceHit { p, p_err, time: si.hit.time, n },
        uv: si.uv,
        wo: t.transform_vec(si.wo).normalize(),
        geom: DiffGeom {
            dpdu: t.transform_vec(si.geom.dpdu),
            dpdv: t.transform_vec(si.geom.dpdv),
            dndu: t.transform_normal(si.geom.dndu),
            dndv: t.transform_normal(si.geom.dndv),
        },
        shading_n: n,
        shading_geom: DiffGeom {
            dpdu: t.transform_vec(si.shading_geom.dpdu),
            dpdv: t.transform_vec(si.shading_geom.dpdv),
            dndu: t.transform_normal(si.shading_geom.dndu),
            dndv: t.transform_normal(si.shading_geom.dndv),
        },
        tex_diffs: si.tex_diffs,
        primitive: si.primitive,
    }
}

#[cfg(test)]
mod tests {
    use cgmath::assert_abs_diff_eq;

    use super::*;
    use crate::sampling::rejection_sample_sphere;

    fn shoot_ray(from: Point3f, to: Point3f) -> Ray {
        Ray::new(from, to - from)
    }

    #[test]
    fn whole_sphere_intersect_has_bounded_error() {
        let o2w = Transform::translate(vec3f!(0, 0, 0));
        let w2o = o2w.inverse();
        let radius = 1.0;
        let sphere = Sphere::whole(&o2w, &w2o, radius);

        let orig = point3f!(3, 3, 3);
        for i in 0..32 {
            let u = (i as Float + 0.5) / 32.0;
            let v = ((i * 7) % 32) as Float / 32.0;
            let point_in_sphere = rejection_sample_sphere(Point2f::new(u, v), v);
            let ray = shoot_ray(orig, point3f!(point_in_sphere.x, point_in_sphere.y, point_in_sphere.z));
            let isect = sphere.intersect(&ray);
            assert!(isect.is_some());
            let err = isect.unwrap().1.hit.p_err;
            assert_abs_diff_eq!(err, Vec3f::new(0.0, 0.0, 0.0), epsilon = 0.01);
        }
    }

    #[test]
    fn ray_just_missing_sphere_is_a_miss() {
        let o2w = Transform::translate(vec3f!(0, 0, 0));
        let w2o = o2w.inverse();
        let sphere = Sphere::whole(&o2w, &w2o, 1.0);
        let orig = point3f!(1, 0, -2);
        let close_miss = point3f!(1.0001, 0, 0);
        let ray = shoot_ray(orig, close_miss);
        assert!(sphere.intersect(&ray).is_none());
    }
}
