//! Minimal demo binary: builds a small hard-coded scene, runs the
//! multi-pass driver, writes an HDR image. The only place command-line
//! argument parsing appears in this crate.

use std::fs::File;
use std::sync::Arc;

use clap::{App, Arg};
use rayon::ThreadPoolBuilder;

use corelight::camera::{Camera, PerspectiveCamera};
use corelight::config::RenderConfig;
use corelight::driver::{build_photon_maps, render_passes};
use corelight::film::Film;
use corelight::filter::BoxFilter;
use corelight::integrator::direct_lighting::DirectLightingIntegrator;
use corelight::integrator::photon_map::{CombineMode, PhotonMapIntegrator};
use corelight::integrator::SamplerIntegrator;
use corelight::light::distant::DistantLight;
use corelight::light::point::PointLight;
use corelight::light::Light;
use corelight::material::matte::MatteMaterial;
use corelight::material::mirror::MirrorMaterial;
use corelight::primitive::{GeometricPrimitive, Primitive};
use corelight::render_context::RenderContext;
use corelight::sampler::random::RandomSampler;
use corelight::scene::Scene;
use corelight::shapes::sphere::Sphere;
use corelight::spectrum::Spectrum;
use corelight::{point3f, vec3f, Bounds2f, Bounds2i, Point2i, Transform};

fn build_scene() -> Scene {
    let tf = Transform::translate(vec3f!(0.0, 0.0, 0.0));
    let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
    let glass_sphere = GeometricPrimitive {
        shape: sphere,
        material: Some(Arc::new(MirrorMaterial::new(Spectrum::uniform(0.9)))),
        light: None,
    };

    let ground_tf = Transform::translate(vec3f!(0.0, 0.0, -21.0));
    let ground = Arc::new(Sphere::whole(ground_tf, ground_tf.inverse(), 20.0));
    let ground_prim = GeometricPrimitive {
        shape: ground,
        material: Some(Arc::new(MatteMaterial::new(Spectrum::rgb(0.6, 0.6, 0.65)))),
        light: None,
    };

    let primitives: Vec<Arc<dyn Primitive>> = vec![Arc::new(glass_sphere), Arc::new(ground_prim)];

    let point_light: Arc<dyn Light> =
        Arc::new(PointLight::new(Transform::translate(vec3f!(3.0, -3.0, 4.0)), Spectrum::uniform(60.0)));
    let sun: Arc<dyn Light> = Arc::new(DistantLight::new(
        Transform::identity(),
        vec3f!(-1.0, -1.0, -1.0),
        Spectrum::rgb(1.2, 1.1, 0.9),
    ));

    Scene::new(primitives, vec![point_light, sun])
}

fn write_hdr(image: &corelight::image_buffer::ImageBuffer, path: &str) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let encoder = image::hdr::HDREncoder::new(file);
    let pixels: Vec<image::Rgb<f32>> = image
        .pixels()
        .iter()
        .map(|p| image::Rgb([p.r, p.g, p.b]))
        .collect();
    encoder.encode(&pixels, image.width, image.height)?;
    Ok(())
}

fn write_exr(image: &corelight::image_buffer::ImageBuffer, path: &str) -> anyhow::Result<()> {
    exr::prelude::write_rgb_file(path, image.width, image.height, |x, y| {
        let p = image.get(x, y);
        (p.r, p.g, p.b)
    })?;
    Ok(())
}

fn write_image(image: &corelight::image_buffer::ImageBuffer, path: &str) -> anyhow::Result<()> {
    if path.to_lowercase().ends_with(".exr") {
        write_exr(image, path)
    } else {
        write_hdr(image, path)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let matches = App::new("render")
        .about("Renders the built-in demo scene")
        .arg(
            Arg::with_name("output")
                .long("output")
                .takes_value(true)
                .default_value("render.hdr")
                .help("output path; .exr extension writes an EXR file, anything else writes HDR"),
        )
        .arg(Arg::with_name("config").long("config").takes_value(true))
        .arg(Arg::with_name("photons").long("photons").help("enable the photon-map integrator"))
        .get_matches();

    let config = match matches.value_of("config") {
        Some(path) => RenderConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => RenderConfig::default(),
    };

    let scene = build_scene();
    let resolution = Point2i::new(256, 256);
    let camera_tf = Transform::camera_look_at(
        point3f!(0.0, -6.0, 3.0),
        point3f!(0.0, 0.0, 0.0),
        vec3f!(0.0, 0.0, 1.0),
    );
    let camera: Box<dyn Camera> =
        Box::new(PerspectiveCamera::new(camera_tf, resolution, Bounds2f::whole_screen(), (0.0, 1.0), 0.0, 1.0e6, 45.0));

    let mut film = Film::<BoxFilter>::with_crop_window(
        resolution,
        Bounds2i::with_bounds(Point2i::new(0, 0), resolution),
        BoxFilter::default(),
        1.0,
    );
    film.set_adaptive_threshold(config.sampling.adaptive_threshold);

    let ctx = RenderContext::new();
    let pool = ThreadPoolBuilder::new().num_threads(config.effective_thread_count()).build()?;
    let sampler = RandomSampler::new_with_seed(1, config.sampling.samples_per_pixel);

    pool.install(|| -> anyhow::Result<()> {
        if matches.is_present("photons") {
            let built = build_photon_maps(&scene, &config, &ctx);
            let radiance = PhotonMapIntegrator {
                max_depth: 5,
                caustic_map: Some(built.caustic),
                diffuse_map: Some(built.diffuse),
                combine_mode: CombineMode::DirectPlusFull,
                caustic_search_count: config.photon_map.search_count,
                caustic_search_radius: config.photon_map.search_radius,
                final_gather_samples: config.photon_map.final_gather_samples,
            };
            let mut integrator = SamplerIntegrator { camera, radiance };
            render_passes(&mut integrator, &scene, &film, &sampler, &config, &ctx)?;
        } else {
            let radiance = DirectLightingIntegrator { max_depth: 5 };
            let mut integrator = SamplerIntegrator { camera, radiance };
            render_passes(&mut integrator, &scene, &film, &sampler, &config, &ctx)?;
        }
        Ok(())
    })?;

    let image = film.finalize();
    write_image(&image, matches.value_of("output").unwrap())?;
    ctx.diagnostics.log_summary();
    Ok(())
}
