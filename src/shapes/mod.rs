//! Shape capability set (§3 Surface point / Ray, §6 capability sets):
//! everything the accelerator and integrator need from a piece of geometry,
//! decoupled from how it's parameterized.

use crate::geometry::bounds::Bounds3;
use crate::geometry::{Ray, Transform};
use crate::interaction::{SurfaceHit, SurfaceInteraction};
use crate::{Float, Point2f};

pub mod sphere;
pub mod triangle;

pub trait Shape: Sync + Send {
    fn object_bound(&self) -> Bounds3<Float>;

    fn object_to_world(&self) -> &Transform;
    fn world_to_object(&self) -> &Transform;
    fn reverse_orientation(&self) -> bool;

    fn world_bound(&self) -> Bounds3<Float> {
        let b = self.object_bound();
        let t = self.object_to_world();
        let corners = [
            Point2f::new(b.min.x, b.min.y),
            Point2f::new(b.max.x, b.min.y),
            Point2f::new(b.min.x, b.max.y),
            Point2f::new(b.max.x, b.max.y),
        ];
        let mut result = Bounds3::empty();
        for xy in &corners {
            for z in [b.min.z, b.max.z] {
                let p = crate::Point3f::new(xy.x, xy.y, z);
                result = result.union_point(t.transform(p));
            }
        }
        result
    }

    fn area(&self) -> Float;

    /// Returns the ray parameter of the closest hit and the interaction at
    /// that point, both already in world space.
    fn intersect(&self, ray: &Ray) -> Option<(Float, SurfaceInteraction)>;

    fn intersect_test(&self, ray: &Ray) -> bool {
        self.intersect(ray).is_some()
    }

    /// Samples a point on the shape's surface, used by area lights.
    fn sample(&self, u: Point2f) -> SurfaceHit;

    fn pdf(&self) -> Float {
        1.0 / self.area()
    }
}
