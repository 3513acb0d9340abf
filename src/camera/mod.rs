//! Perspective camera (§6 capability set): film/raster <-> camera space
//! projection and depth-of-field lens sampling.

use cgmath::{EuclideanSpace, InnerSpace};

use crate::geometry::Transform;
use crate::sampling::concentric_sample_disk;
use crate::{
    lerp, vec3f, Bounds2f, Differential, Float, Point2f, Point2i, Point3f, Ray, RayDifferential,
    Vec2f, Vec3f, INFINITY,
};

#[derive(Clone, Copy, Debug)]
pub struct CameraSample {
    pub p_film: Point2f,
    pub p_lens: Point2f,
    pub time: Float,
}

pub trait Camera: Sync + Send {
    fn generate_ray(&self, sample: CameraSample) -> (Float, Ray);

    /// Default differential: finite-difference the ray against 1-pixel
    /// shifts in film space. `PerspectiveCamera` overrides this with the
    /// analytic lens-aware version.
    fn generate_ray_differential(&self, sample: CameraSample) -> (Float, RayDifferential) {
        let (mut weight, ray) = self.generate_ray(sample);

        let cs_shift_x = CameraSample {
            p_film: sample.p_film + Vec2f::new(1.0, 0.0),
            ..sample
        };
        let (wtx, rx) = self.generate_ray(cs_shift_x);

        let cs_shift_y = CameraSample {
            p_film: sample.p_film + Vec2f::new(0.0, 1.0),
            ..sample
        };
        let (wty, ry) = self.generate_ray(cs_shift_y);

        let ray_diff = RayDifferential {
            ray,
            diff: Some(Differential {
                rx_origin: rx.origin,
                rx_dir: rx.dir,
                ry_origin: ry.origin,
                ry_dir: ry.dir,
            }),
        };

        if wtx == 0.0 || wty == 0.0 {
            weight = 0.0;
        }
        (weight, ray_diff)
    }
}

struct CameraProjection {
    raster_to_camera: Transform,
}

impl CameraProjection {
    fn new(camera_to_screen: Transform, full_resolution: Point2i, screen_window: Bounds2f) -> Self {
        let screen_to_raster = Transform::scale(full_resolution.x as Float, full_resolution.y as Float, 1.0)
            * Transform::scale(
                1.0 / (screen_window.max.x - screen_window.min.x),
                1.0 / (screen_window.min.y - screen_window.max.y),
                1.0,
            )
            * Transform::translate(vec3f!(-screen_window.min.x, -screen_window.max.y, 0.0));

        let raster_to_screen = screen_to_raster.inverse();
        let raster_to_camera = camera_to_screen.inverse() * raster_to_screen;

        Self { raster_to_camera }
    }
}

pub struct PerspectiveCamera {
    camera_to_world: Transform,
    proj: CameraProjection,
    shutter_interval: (Float, Float),
    lens_radius: Float,
    focal_dist: Float,
    dx_camera: Vec3f,
    dy_camera: Vec3f,
}

impl PerspectiveCamera {
    pub fn new(
        camera_to_world: Transform,
        full_resolution: Point2i,
        screen_window: Bounds2f,
        shutter_interval: (Float, Float),
        lens_radius: Float,
        focal_dist: Float,
        fov: Float,
    ) -> Self {
        let persp = Transform::perspective(fov, 1.0e-2, 1000.0);
        let proj = CameraProjection::new(persp, full_resolution, screen_window);

        let p0 = proj.raster_to_camera.transform(Point3f::new(0.0, 0.0, 0.0));
        let dx_camera = proj.raster_to_camera.transform(Point3f::new(1.0, 0.0, 0.0)) - p0;
        let dy_camera = proj.raster_to_camera.transform(Point3f::new(0.0, 1.0, 0.0)) - p0;

        Self {
            camera_to_world,
            proj,
            shutter_interval,
            lens_radius,
            focal_dist,
            dx_camera,
            dy_camera,
        }
    }

    fn camera_space_ray(&self, sample: CameraSample) -> Ray {
        let p_film = Point3f::new(sample.p_film.x, sample.p_film.y, 0.0);
        let p_camera = self.proj.raster_to_camera.transform(p_film);
        let origin = Point3f::new(0.0, 0.0, 0.0);
        let dir = (p_camera - origin).normalize();
        let time = lerp(sample.time, self.shutter_interval.0, self.shutter_interval.1);
        Ray { origin, dir, t_max: INFINITY, time }
    }

    fn apply_lens(&self, ray: &mut Ray, p_lens_sample: Point2f) {
        if self.lens_radius <= 0.0 {
            return;
        }
        let p_lens = self.lens_radius * concentric_sample_disk(p_lens_sample);
        let ft = self.focal_dist / ray.dir.z;
        let p_focus = ray.at(ft);
        ray.origin = Point3f::new(p_lens.x, p_lens.y, 0.0);
        ray.dir = (p_focus - ray.origin).normalize();
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, sample: CameraSample) -> (Float, Ray) {
        let mut ray = self.camera_space_ray(sample);
        self.apply_lens(&mut ray, sample.p_lens);
        (1.0, self.camera_to_world.transform_ray(ray))
    }

    fn generate_ray_differential(&self, sample: CameraSample) -> (Float, RayDifferential) {
        let p_camera = {
            let p_film = Point3f::new(sample.p_film.x, sample.p_film.y, 0.0);
            self.proj.raster_to_camera.transform(p_film)
        };
        let mut ray = self.camera_space_ray(sample);

        let diff = if self.lens_radius > 0.0 {
            let p_lens = self.lens_radius * concentric_sample_disk(sample.p_lens);
            self.apply_lens(&mut ray, sample.p_lens);

            let dx = (p_camera + self.dx_camera).to_vec().normalize();
            let ft_x = self.focal_dist / dx.z;
            let p_focus_x = Point3f::new(0.0, 0.0, 0.0) + ft_x * dx;
            let rx_origin = Point3f::new(p_lens.x, p_lens.y, 0.0);
            let rx_dir = (p_focus_x - rx_origin).normalize();

            let dy = (p_camera + self.dy_camera).to_vec().normalize();
            let ft_y = self.focal_dist / dy.z;
            let p_focus_y = Point3f::new(0.0, 0.0, 0.0) + ft_y * dy;
            let ry_origin = Point3f::new(p_lens.x, p_lens.y, 0.0);
            let ry_dir = (p_focus_y - ry_origin).normalize();

            Differential { rx_origin, rx_dir, ry_origin, ry_dir }
        } else {
            let rx_dir = (p_camera.to_vec() + self.dx_camera).normalize();
            let ry_dir = (p_camera.to_vec() + self.dy_camera).normalize();
            Differential {
                rx_origin: ray.origin,
                rx_dir,
                ry_origin: ray.origin,
                ry_dir,
            }
        };

        let ray_diff = RayDifferential { ray, diff: Some(diff) };
        (1.0, self.camera_to_world.transform_ray_differential(ray_diff))
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{assert_abs_diff_eq, Deg};

    use super::*;
    use crate::sampler::random::RandomSampler;
    use crate::sampler::Sampler;
    use crate::{Bounds2i, Bounds3f, ComponentWiseExt, NEG_INFINITY};

    fn make_camera(camera_tf: Transform, res: Point2i, fov: Float) -> PerspectiveCamera {
        PerspectiveCamera::new(camera_tf, res, Bounds2f::whole_screen(), (0.0, 1.0), 0.0, 1.0, fov)
    }

    #[test]
    fn camera_looks_down_positive_z() {
        let camera_tf = Transform::camera_look_at(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Vec3f::new(0.0, 1.0, 0.0),
        );
        let res = Point2i::new(16, 16);
        let camera = make_camera(camera_tf, res, 60.0);

        let mut sampler = RandomSampler::new_with_seed(32, 1);
        for pixel in Bounds2i::with_bounds(Point2i::new(0, 0), res).iter_points() {
            sampler.start_pixel(pixel);
            while sampler.start_next_sample() {
                let camera_sample = sampler.get_camera_sample(pixel);
                let (_t, ray) = camera.generate_ray(camera_sample);
                assert!(ray.dir.z > 0.0, "{:?}", ray);
            }
        }
    }

    #[test]
    fn camera_covers_claimed_fov() {
        let pos = Point3f::new(0.0, 0.0, -1.0);
        let camera_tf = Transform::camera_look_at(pos, Point3f::new(0.0, 0.0, 0.0), Vec3f::new(0.0, 1.0, 0.0));
        let fov = 90.0 as Float;
        let res = Point2i::new(64, 64);
        let camera = make_camera(camera_tf, res, fov);

        let mut sampler = RandomSampler::new_with_seed(32, 1);
        let plane = Bounds3f::with_bounds(Point3f::new(-100.0, -100.0, 0.0), Point3f::new(100.0, 100.0, 0.01));

        let mut min = Point3f::new(INFINITY, INFINITY, INFINITY);
        let mut max = Point3f::new(NEG_INFINITY, NEG_INFINITY, NEG_INFINITY);
        for pixel in Bounds2i::with_bounds(Point2i::new(0, 0), res).iter_points() {
            sampler.start_pixel(pixel);
            while sampler.start_next_sample() {
                let camera_sample = sampler.get_camera_sample(pixel);
                let (_t, ray) = camera.generate_ray(camera_sample);
                let (t0, _t1) = plane.intersect_test(&ray).unwrap();
                let p = ray.at(t0);
                min = min.min(p);
                max = max.max(p);
            }
        }

        let top = Point3f::new(0.0, max.y, 0.0) - pos;
        let bottom = Point3f::new(0.0, min.y, 0.0) - pos;
        let angle: Deg<Float> = Vec3f::angle(top, bottom).into();
        assert_abs_diff_eq!(angle, Deg(fov), epsilon = 0.5);
    }
}
