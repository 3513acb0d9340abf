//! The top-level scene (§6): an accelerated aggregate plus lights and an
//! optional background/environment light.
//!
//! Building a `Scene` from a description format (XML, a plugin-loaded scene
//! graph) is explicitly out of scope here; callers assemble primitives and
//! lights directly — see the demo binary for the pattern — and hand them to
//! `Scene::new`.

use std::sync::Arc;

use crate::accel::KdTreeAccel;
use crate::light::{Light, LightFlags};
use crate::primitive::Primitive;
use crate::spectrum::Spectrum;
use crate::{Bounds3f, Ray, RayDifferential, SurfaceInteraction};

pub struct Scene {
    aggregate: KdTreeAccel,
    pub lights: Vec<Arc<dyn Light>>,
    /// Subset of `lights` with `LightFlags::Infinite`, checked by every ray
    /// that escapes the aggregate (§4.9 step 1, background radiance).
    infinite_lights: Vec<Arc<dyn Light>>,
    bound: Bounds3f,
}

impl Scene {
    /// Builds the kd-tree over `primitives` and runs each light's
    /// `preprocess` (infinite lights cache the world-bounding-sphere radius
    /// here, once the aggregate's bound is known).
    pub fn new(primitives: Vec<Arc<dyn Primitive>>, lights: Vec<Arc<dyn Light>>) -> Self {
        let (aggregate, stats) = KdTreeAccel::build(primitives);
        let bound = aggregate.world_bound();
        let infinite_lights = lights
            .iter()
            .filter(|l| l.flags() == LightFlags::Infinite)
            .cloned()
            .collect();
        tracing::info!(
            inodes = stats.inodes,
            leaves = stats.leaves,
            empty_leaves = stats.empty_leaves,
            bad_splits = stats.bad_splits,
            "scene aggregate built"
        );
        let scene = Self { aggregate, lights, infinite_lights, bound };
        for light in &scene.lights {
            light.preprocess(&scene);
        }
        scene
    }

    pub fn world_bound(&self) -> Bounds3f {
        self.bound
    }

    pub fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        self.aggregate.intersect(ray)
    }

    pub fn intersect_test(&self, ray: &Ray) -> bool {
        self.aggregate.intersect_test(ray)
    }

    /// Summed radiance of every infinite/environment light in a direction a
    /// camera or specular ray escaped along (§4.9 step 1).
    pub fn environment_emitted_radiance(&self, ray: &RayDifferential) -> Spectrum {
        self.infinite_lights
            .iter()
            .fold(Spectrum::uniform(0.0), |acc, l| acc + l.environment_emitted_radiance(ray))
    }
}

#[cfg(test)]
mod tests {
    use crate::light::point::PointLight;
    use crate::shapes::sphere::Sphere;
    use crate::spectrum::Spectrum;
    use crate::{point3f, vec3f, Transform};

    use super::*;

    struct SpherePrim(Arc<Sphere>);

    impl Primitive for SpherePrim {
        fn world_bound(&self) -> Bounds3f {
            self.0.world_bound()
        }
        fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
            let (t, mut si) = self.0.intersect(ray)?;
            ray.t_max = t;
            si.primitive = Some(self);
            Some(si)
        }
        fn intersect_test(&self, ray: &Ray) -> bool {
            self.0.intersect_test(ray)
        }
        fn material(&self) -> Option<&dyn crate::material::Material> {
            None
        }
        fn area_light(&self) -> Option<&dyn crate::light::AreaLight> {
            None
        }
        fn light_arc_cloned(&self) -> Option<Arc<dyn Light>> {
            None
        }
    }

    #[test]
    fn world_bound_covers_all_primitives() {
        let tf = Transform::identity();
        let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 2.0));
        let prim: Arc<dyn Primitive> = Arc::new(SpherePrim(sphere));
        let light: Arc<dyn Light> = Arc::new(PointLight::new(
            Transform::translate(vec3f!(0.0, 5.0, 0.0)),
            Spectrum::uniform(1.0),
        ));
        let scene = Scene::new(vec![prim], vec![light]);
        let bound = scene.world_bound();
        assert!(bound.inside(point3f!(0.0, 0.0, 0.0)));
        assert!(bound.inside(point3f!(1.9, 0.0, 0.0)));
    }

    #[test]
    fn intersect_test_sees_occluder() {
        let tf = Transform::identity();
        let sphere = Arc::new(Sphere::whole(tf, tf.inverse(), 1.0));
        let prim: Arc<dyn Primitive> = Arc::new(SpherePrim(sphere));
        let scene = Scene::new(vec![prim], vec![]);
        let ray = Ray::new(point3f!(0.0, 0.0, -10.0), vec3f!(0.0, 0.0, 1.0));
        assert!(scene.intersect_test(&ray));
    }
}
