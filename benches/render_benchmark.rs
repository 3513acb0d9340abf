use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};

use corelight::camera::{Camera, PerspectiveCamera};
use corelight::film::Film;
use corelight::filter::BoxFilter;
use corelight::integrator::direct_lighting::DirectLightingIntegrator;
use corelight::integrator::SamplerIntegrator;
use corelight::light::point::PointLight;
use corelight::light::Light;
use corelight::material::matte::MatteMaterial;
use corelight::primitive::{GeometricPrimitive, Primitive};
use corelight::sampler::random::RandomSampler;
use corelight::scene::Scene;
use corelight::shapes::sphere::Sphere;
use corelight::spectrum::Spectrum;
use corelight::{point3f, vec3f, Bounds2f, Bounds2i, Point2i, Transform};

fn build_scene() -> Scene {
    let tf = Transform::identity();
    let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
    let prim = GeometricPrimitive {
        shape: sphere,
        material: Some(Arc::new(MatteMaterial::new(Spectrum::uniform(0.8)))),
        light: None,
    };
    let prim: Arc<dyn Primitive> = Arc::new(prim);
    let light: Arc<dyn Light> =
        Arc::new(PointLight::new(Transform::translate(vec3f!(0.0, 0.0, -5.0)), Spectrum::uniform(50.0)));
    Scene::new(vec![prim], vec![light])
}

fn bench_direct_lighting_render(c: &mut Criterion) {
    let scene = build_scene();
    let camera_tf = Transform::camera_look_at(
        point3f!(0.0, 0.0, -4.0),
        point3f!(0.0, 0.0, 0.0),
        vec3f!(0.0, 1.0, 0.0),
    );
    let res = Point2i::new(32, 32);

    c.bench_function("direct_lighting_render_32x32_4spp", |b| {
        b.iter(|| {
            let camera: Box<dyn Camera> = Box::new(PerspectiveCamera::new(
                camera_tf,
                res,
                Bounds2f::whole_screen(),
                (0.0, 1.0),
                0.0,
                1.0,
                40.0,
            ));
            let film = Film::<BoxFilter>::with_crop_window(
                res,
                Bounds2i::with_bounds(Point2i::new(0, 0), res),
                BoxFilter::default(),
                1.0,
            );
            let mut integrator = SamplerIntegrator { camera, radiance: DirectLightingIntegrator { max_depth: 3 } };
            let sampler = RandomSampler::new_with_seed(1, 4);
            integrator.render(&scene, &film, sampler);
            film.finalize()
        });
    });
}

criterion_group!(benches, bench_direct_lighting_render);
criterion_main!(benches);
