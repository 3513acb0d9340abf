//! Triangle mesh shape: the kd-tree's primary primitive. Meshes are shared
//! via `Arc` and individual `Triangle`s index into them, as in pbrt-family
//! triangle mesh layouts, so the accelerator can build one bounding/index
//! array per mesh instead of per triangle.

use std::sync::Arc;

use cgmath::{EuclideanSpace, InnerSpace};

use crate::err_float::gamma;
use crate::geometry::bounds::Bounds3;
use crate::geometry::{Ray, Transform};
use crate::interaction::{DiffGeom, SurfaceHit, SurfaceInteraction};
use crate::shapes::Shape;
use crate::{point3f, vec3f, Float, Normal3, Point2f, Point3f, Vec3f};

pub struct TriangleMesh {
    pub object_to_world: Transform,
    pub world_to_object: Transform,
    pub vertex_indices: Vec<u32>,
    pub p: Vec<Point3f>,
    pub n: Vec<Normal3>,
    pub uv: Vec<Point2f>,
}

impl TriangleMesh {
    pub fn new(
        object_to_world: Transform,
        vertex_indices: Vec<u32>,
        object_space_p: Vec<Point3f>,
        n: Vec<Normal3>,
        uv: Vec<Point2f>,
    ) -> Arc<Self> {
        let world_to_object = object_to_world.inverse();
        let p = object_space_p.iter().map(|p| object_to_world.transform(*p)).collect();
        Arc::new(Self {
            object_to_world,
            world_to_object,
            vertex_indices,
            p,
            n,
            uv,
        })
    }

    pub fn num_triangles(&self) -> usize {
        self.vertex_indices.len() / 3
    }

    pub fn triangles(self: &Arc<Self>) -> Vec<Triangle> {
        (0..self.num_triangles()).map(|i| Triangle { mesh: self.clone(), tri_index: i }).collect()
    }
}

pub struct Triangle {
    mesh: Arc<TriangleMesh>,
    tri_index: usize,
}

impl Triangle {
    fn vertex_indices(&self) -> [usize; 3] {
        let base = self.tri_index * 3;
        [
            self.mesh.vertex_indices[base] as usize,
            self.mesh.vertex_indices[base + 1] as usize,
            self.mesh.vertex_indices[base + 2] as usize,
        ]
    }

    fn positions(&self) -> [Point3f; 3] {
        let [i0, i1, i2] = self.vertex_indices();
        [self.mesh.p[i0], self.mesh.p[i1], self.mesh.p[i2]]
    }

    fn uvs(&self) -> [Point2f; 3] {
        if self.mesh.uv.is_empty() {
            [Point2f::new(0.0, 0.0), Point2f::new(1.0, 0.0), Point2f::new(1.0, 1.0)]
        } else {
            let [i0, i1, i2] = self.vertex_indices();
            [self.mesh.uv[i0], self.mesh.uv[i1], self.mesh.uv[i2]]
        }
    }
}

impl Shape for Triangle {
    fn object_bound(&self) -> Bounds3<Float> {
        let [p0, p1, p2] = self.positions();
        let p0o = self.mesh.world_to_object.transform(p0);
        let p1o = self.mesh.world_to_object.transform(p1);
        let p2o = self.mesh.world_to_object.transform(p2);
        Bounds3::with_bounds(p0o, p0o).union_point(p1o).union_point(p2o)
    }

    fn world_bound(&self) -> Bounds3<Float> {
        let [p0, p1, p2] = self.positions();
        Bounds3::with_bounds(p0, p0).union_point(p1).union_point(p2)
    }

    fn object_to_world(&self) -> &Transform {
        &self.mesh.object_to_world
    }

    fn world_to_object(&self) -> &Transform {
        &self.mesh.world_to_object
    }

    fn reverse_orientation(&self) -> bool {
        false
    }

    fn area(&self) -> Float {
        let [p0, p1, p2] = self.positions();
        0.5 * (p1 - p0).cross(p2 - p0).magnitude()
    }

    /// Moller-Trumbore-style intersection with pbrt's watertight permutation
    /// trick dropped for clarity; degenerate (zero-area) triangles are
    /// reported as misses, counted in the caller's diagnostics.
    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)> {
        let [p0, p1, p2] = self.positions();
        let e1 = p1 - p0;
        let e2 = p2 - p0;
        let pvec = ray.dir.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() < 1e-12 {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = ray.origin - p0;
        let u = tvec.dot(pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(e1);
        let v = ray.dir.dot(qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(qvec) * inv_det;
        if t <= 1e-7 || t > ray.t_max {
            return None;
        }

        let p_hit = ray.at(t);
        let b0 = 1.0 - u - v;
        let uv = self.uvs();
        let hit_uv = Point2f::new(
            b0 * uv[0].x + u * uv[1].x + v * uv[2].x,
            b0 * uv[0].y + u * uv[1].y + v * uv[2].y,
        );

        let dpdu = vec3f!(1, 0, 0);
        let dpdv = vec3f!(0, 1, 0);
        let mut n = e1.cross(e2).normalize();

        let p_err = gamma(7) * (p0.to_vec().map(Float::abs) + p1.to_vec().map(Float::abs) + p2.to_vec().map(Float::abs));

        let shading_n = if self.mesh.n.is_empty() {
            n
        } else {
            let [i0, i1, i2] = self.vertex_indices();
            let ns = (b0 * self.mesh.n[i0].0 + u * self.mesh.n[i1].0 + v * self.mesh.n[i2].0).normalize();
            if ns.dot(n) < 0.0 {
                n = -n;
            }
            ns
        };

        let si = SurfaceInteraction {
            hit: SurfaceHit {
                p: p_hit,
                p_err,
                time: ray.time,
                n: Normal3(n),
            },
            uv: hit_uv,
            wo: -ray.dir,
            geom: DiffGeom { dpdu, dpdv, dndu: Normal3(vec3f!(0, 0, 0)), dndv: Normal3(vec3f!(0, 0, 0)) },
            shading_n: Normal3(shading_n),
            shading_geom: DiffGeom { dpdu, dpdv, dndu: Normal3(vec3f!(0, 0, 0)), dndv: Normal3(vec3f!(0, 0, 0)) },
            tex_diffs: None,
            primitive: None,
        };
        Some((t, si))
    }

    fn sample(&self, u: Point2f) -> SurfaceHit {
        let [p0, p1, p2] = self.positions();
        let su0 = u.x.sqrt();
        let b0 = 1.0 - su0;
        let b1 = u.y * su0;
        let p = point3f!(0, 0, 0) + b0 * p0.to_vec() + b1 * p1.to_vec() + (1.0 - b0 - b1) * p2.to_vec();
        let n = Normal3((p1 - p0).cross(p2 - p0).normalize());
        let p_err = gamma(6) * (p0.to_vec().map(Float::abs) + p1.to_vec().map(Float::abs) + p2.to_vec().map(Float::abs));
        SurfaceHit { p, p_err, time: 0.0, n }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_triangle() -> Triangle {
        let mesh = TriangleMesh::new(
            Transform::identity(),
            vec![0, 1, 2],
            vec![point3f!(0, 0, 0), point3f!(1, 0, 0), point3f!(0, 1, 0)],
            vec![],
            vec![],
        );
        mesh.triangles().remove(0)
    }

    #[test]
    fn ray_through_centroid_hits() {
        let tri = unit_triangle();
        let ray = Ray::new(point3f!(0.2, 0.2, -1), vec3f!(0, 0, 1));
        assert!(tri.intersect(&ray).is_some());
    }

    #[test]
    fn ray_outside_triangle_misses() {
        let tri = unit_triangle();
        let ray = Ray::new(point3f!(5, 5, -1), vec3f!(0, 0, 1));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn area_matches_right_triangle_formula() {
        let tri = unit_triangle();
        assert!((tri.area() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn mesh_loaded_from_obj_file_has_expected_triangle_count() {
        let mut path = std::env::temp_dir();
        path.push("corelight_triangle_test_quad.obj");
        std::fs::write(
            &path,
            "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3\nf 1 3 4\n",
        )
        .unwrap();

        let (models, _materials) = tobj::load_obj(&path).unwrap();
        let mesh = &models[0].mesh;

        let p: Vec<Point3f> = mesh
            .positions
            .chunks(3)
            .map(|c| point3f!(c[0], c[1], c[2]))
            .collect();
        let tri_mesh = TriangleMesh::new(Transform::identity(), mesh.indices.clone(), p, vec![], vec![]);

        assert_eq!(tri_mesh.num_triangles(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
