//! Per-pixel sample sequences (C1 §4.1): the `Sampler` capability plus a
//! pseudo-random and a low-discrepancy implementation.
//!
//! Tile workers each own a cloned-with-seed sampler so that render order
//! (and thread count) never changes the sequence a given pixel sees.

use cgmath::EuclideanSpace;

use crate::camera::CameraSample;
use crate::{Float, Point2f, Point2i};

pub mod low_discrepancy;
pub mod random;

/// A sequence of `[0, 1)` sample values, restartable per-pixel and
/// per-sample so that a pixel's sequence is reproducible independent of
/// scheduling order.
pub trait Sampler: Send {
    fn start_pixel(&mut self, p: Point2i);

    /// Advances to the next sample for the current pixel, returning `false`
    /// once `samples_per_pixel` samples have been drawn.
    fn start_next_sample(&mut self) -> bool;

    fn get_1d(&mut self) -> Float;

    fn get_2d(&mut self) -> Point2f;

    fn samples_per_pixel(&self) -> usize;

    /// Builds a camera sample from the current pixel: jittered film
    /// position, lens position, and shutter time, each drawn from this
    /// sampler's sequence.
    fn get_camera_sample(&mut self, p_raster: Point2i) -> CameraSample {
        let p_film = Point2f::new(p_raster.x as Float, p_raster.y as Float) + self.get_2d().to_vec();
        let p_lens = self.get_2d();
        let time = self.get_1d();
        CameraSample { p_film, p_lens, time }
    }

    /// A fresh, independent sampler for a given tile, seeded off `seed` so
    /// distinct tiles never share a sequence. `Self: Sized` keeps this out
    /// of the object-safe subset used by `dyn Sampler` integrator params.
    fn clone_with_seed(&self, seed: u64) -> Self
    where
        Self: Sized;
}
