//! Axis-aligned bounding boxes in 2 and 3 dimensions.

use cgmath::{EuclideanSpace, Point2, Point3};

use crate::geometry::{Normal3, Ray};
use crate::{ComponentWiseExt, Float, Point2f, Point2i, Point3f, Vec3f, INFINITY, NEG_INFINITY};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2<T> {
    pub min: Point2<T>,
    pub max: Point2<T>,
}

pub type Bounds2i = Bounds2<i32>;
pub type Bounds2f = Bounds2<Float>;

impl Bounds2i {
    pub fn with_bounds(min: Point2i, max: Point2i) -> Self {
        Self { min, max }
    }

    pub fn diagonal(&self) -> cgmath::Vector2<i32> {
        self.max - self.min
    }

    pub fn area(&self) -> i64 {
        let d = self.diagonal();
        d.x as i64 * d.y as i64
    }

    pub fn centre(&self) -> Point2i {
        Point2i::new((self.min.x + self.max.x) / 2, (self.min.y + self.max.y) / 2)
    }

    pub fn inside_exclusive(&self, p: Point2i) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Iterates all integer pixel coordinates in `[min, max)`, row-major.
    pub fn iter_points(&self) -> impl Iterator<Item = Point2i> + '_ {
        let (x0, x1, y0, y1) = (self.min.x, self.max.x, self.min.y, self.max.y);
        (y0..y1).flat_map(move |y| (x0..x1).map(move |x| Point2i::new(x, y)))
    }

    /// Splits this region into `tile_size × tile_size` sub-tiles in
    /// row-major scan order, clipped to this region's bounds (C2 §4.2
    /// linear ordering; the splitter module wraps this with shuffle/sort
    /// orderings and tail subdivision).
    pub fn iter_tiles(&self, tile_size: i32) -> impl Iterator<Item = Bounds2i> + '_ {
        let (x0, x1, y0, y1) = (self.min.x, self.max.x, self.min.y, self.max.y);
        let nx = ((x1 - x0) + tile_size - 1) / tile_size;
        let ny = ((y1 - y0) + tile_size - 1) / tile_size;
        (0..ny).flat_map(move |ty| {
            (0..nx).map(move |tx| {
                let tx0 = x0 + tx * tile_size;
                let ty0 = y0 + ty * tile_size;
                let tx1 = (tx0 + tile_size).min(x1);
                let ty1 = (ty0 + tile_size).min(y1);
                Bounds2i::with_bounds(Point2i::new(tx0, ty0), Point2i::new(tx1, ty1))
            })
        })
    }
}

impl Bounds2f {
    pub fn whole_screen() -> Self {
        Self {
            min: Point2f::new(-1.0, -1.0),
            max: Point2f::new(1.0, 1.0),
        }
    }

    pub fn unit() -> Self {
        Self {
            min: Point2f::new(0.0, 0.0),
            max: Point2f::new(1.0, 1.0),
        }
    }
}

/// Axis-aligned bounding box over `Point3f`, used for primitive bounds,
/// kd-tree nodes, and volume regions (§3 Kd-tree node, §4.10 Volume AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds3<T> {
    pub min: Point3<T>,
    pub max: Point3<T>,
}

pub type Bounds3f = Bounds3<Float>;

impl Bounds3f {
    pub fn empty() -> Self {
        Self {
            min: Point3f::new(INFINITY, INFINITY, INFINITY),
            max: Point3f::new(NEG_INFINITY, NEG_INFINITY, NEG_INFINITY),
        }
    }

    pub fn with_bounds(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    pub fn union(a: Self, b: Self) -> Self {
        Self {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    pub fn union_point(self, p: Point3f) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn diagonal(&self) -> Vec3f {
        self.max - self.min
    }

    pub fn diagonal_length(&self) -> Float {
        use cgmath::InnerSpace;
        self.diagonal().magnitude()
    }

    pub fn centroid(&self) -> Point3f {
        self.min + self.diagonal() * 0.5
    }

    pub fn surface_area(&self) -> Float {
        let d = self.diagonal();
        if d.x < 0.0 || d.y < 0.0 || d.z < 0.0 {
            return 0.0;
        }
        2.0 * (d.x * d.y + d.x * d.z + d.y * d.z)
    }

    pub fn maximum_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    pub fn axis(&self, i: usize) -> (Float, Float) {
        match i {
            0 => (self.min.x, self.max.x),
            1 => (self.min.y, self.max.y),
            _ => (self.min.z, self.max.z),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn inside(&self, p: Point3f) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Clips a ray against this box, returning the entering/exiting `t`
    /// values if the ray intersects within its current `[0, t_max]` window.
    /// Handles rays parallel to an axis via sign-aware infinities (§4.5 edge
    /// cases).
    pub fn intersect_test(&self, ray: &Ray) -> Option<(Float, Float)> {
        let mut t0 = 0.0_f32;
        let mut t1 = ray.t_max;
        for axis in 0..3 {
            let (lo, hi) = self.axis(axis);
            let (o, d) = match axis {
                0 => (ray.origin.x, ray.dir.x),
                1 => (ray.origin.y, ray.dir.y),
                _ => (ray.origin.z, ray.dir.z),
            };
            let inv_d = 1.0 / d;
            let mut t_near = (lo - o) * inv_d;
            let mut t_far = (hi - o) * inv_d;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t0 = if t_near > t0 { t_near } else { t0 };
            t1 = if t_far < t1 { t_far } else { t1 };
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }

    /// Sutherland–Hodgman clip of this box against another box, returning
    /// the intersection (used by the kd-tree's triangle clip-refinement,
    /// §4.5 step 6, and reused here directly since a box∩box clip is the
    /// per-face special case of the polygon clip).
    pub fn clip(&self, other: &Bounds3f) -> Bounds3f {
        Bounds3f {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        }
    }

    pub fn normal_at_face(&self, axis: usize, is_max: bool) -> Normal3 {
        let mut v = Vec3f::new(0.0, 0.0, 0.0);
        let s = if is_max { 1.0 } else { -1.0 };
        match axis {
            0 => v.x = s,
            1 => v.y = s,
            _ => v.z = s,
        }
        Normal3(v)
    }
}
