use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use corelight::accel::KdTreeAccel;
use corelight::primitive::Primitive;
use corelight::shapes::sphere::Sphere;
use corelight::{vec3f, Ray, Transform};

struct SpherePrim(Arc<Sphere<Transform>>);

impl Primitive for SpherePrim {
    fn world_bound(&self) -> corelight::Bounds3f {
        self.0.world_bound()
    }
    fn intersect(&self, ray: &mut Ray) -> Option<corelight::SurfaceInteraction> {
        let (t, mut si) = self.0.intersect(ray)?;
        ray.t_max = t;
        si.primitive = Some(self);
        Some(si)
    }
    fn intersect_test(&self, ray: &Ray) -> bool {
        self.0.intersect_test(ray)
    }
    fn material(&self) -> Option<&dyn corelight::material::Material> {
        None
    }
    fn area_light(&self) -> Option<&dyn corelight::light::AreaLight> {
        None
    }
    fn light_arc_cloned(&self) -> Option<Arc<dyn corelight::light::Light>> {
        None
    }
}

fn grid_of_spheres(n_per_axis: i32) -> Vec<Arc<dyn Primitive>> {
    let mut prims: Vec<Arc<dyn Primitive>> = Vec::new();
    for x in 0..n_per_axis {
        for y in 0..n_per_axis {
            for z in 0..n_per_axis {
                let tf = Transform::translate(vec3f!(x as f32 * 3.0, y as f32 * 3.0, z as f32 * 3.0));
                let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
                prims.push(Arc::new(SpherePrim(sphere)));
            }
        }
    }
    prims
}

fn bench_build(c: &mut Criterion) {
    c.bench_function("kdtree_build_1000_spheres", |b| {
        b.iter(|| {
            let prims = grid_of_spheres(10);
            KdTreeAccel::build(prims)
        });
    });
}

fn bench_intersect(c: &mut Criterion) {
    let prims = grid_of_spheres(10);
    let (tree, _stats) = KdTreeAccel::build(prims);

    c.bench_function("kdtree_intersect_diagonal_rays", |b| {
        b.iter(|| {
            let mut ray = Ray::new(corelight::point3f!(-5.0, -5.0, -5.0), vec3f!(1.0, 1.0, 1.0));
            tree.intersect(&mut ray)
        });
    });
}

criterion_group!(benches, bench_build, bench_intersect);
criterion_main!(benches);
