//! Image film (§4.3): accumulates filtered samples into pixels, drives
//! adaptive sampling via a squared-delta estimator, and hands out render
//! tiles through an [`ImageSplitter`].

use parking_lot::Mutex;

use crate::filter::Filter;
use crate::image_buffer::ImageBuffer;
use crate::spectrum::{Rgba, Spectrum};
use crate::splitter::{ImageSplitter, TilesOrder};
use crate::{Bounds2f, Bounds2i, Float, Point2f, Point2i, Vec2f};

#[derive(Clone, Copy, Default)]
struct Pixel {
    color_sum: Spectrum,
    weight_sum: Float,
    /// Straight (non-premultiplied) alpha accumulator: 0 for samples whose
    /// primary ray hit nothing, 1 for samples that hit geometry, filter
    /// weighted same as `color_sum` (§4.3).
    alpha_sum: Float,
    /// Per-pass luminance accumulator feeding the squared-delta AA estimator
    /// (§4.3 invariant: must converge at least as fast as `1/N`).
    luminance_sum: Float,
    luminance_sq_sum: Float,
    pass_samples: u64,
    needs_more_samples: bool,
}

#[derive(Clone, Copy)]
pub struct FilmTilePixel {
    contrib_sum: Spectrum,
    alpha_sum: Float,
    filter_weight_sum: Float,
}

/// Per-worker scratch accumulator for one render tile; merged into the
/// film's shared pixel grid once, at tile completion, so the hot per-sample
/// path never takes a lock (§5 suspension points).
pub struct FilmTile {
    pub pixel_bounds: Bounds2i,
    filter_radius: Vec2f,
    pixels: Vec<FilmTilePixel>,
}

impl FilmTile {
    fn index(&self, p: Point2i) -> usize {
        let w = self.pixel_bounds.diagonal().x;
        ((p.y - self.pixel_bounds.min.y) * w + (p.x - self.pixel_bounds.min.x)) as usize
    }

    pub fn add_sample(&mut self, p_film: Point2f, radiance: Spectrum, alpha: Float, weight: Float, filter: &dyn Filter) {
        if weight == 0.0 {
            return;
        }
        let p_discrete = Point2f::new(p_film.x - 0.5, p_film.y - 0.5);
        let p0 = Point2i::new(
            ((p_discrete.x - self.filter_radius.x).ceil() as i32).max(self.pixel_bounds.min.x),
            ((p_discrete.y - self.filter_radius.y).ceil() as i32).max(self.pixel_bounds.min.y),
        );
        let p1 = Point2i::new(
            ((p_discrete.x + self.filter_radius.x).floor() as i32 + 1).min(self.pixel_bounds.max.x),
            ((p_discrete.y + self.filter_radius.y).floor() as i32 + 1).min(self.pixel_bounds.max.y),
        );

        for y in p0.y..p1.y {
            for x in p0.x..p1.x {
                let offset = Vec2f::new(p_discrete.x - x as Float, p_discrete.y - y as Float);
                let fw = filter.evaluate(offset);
                if fw == 0.0 {
                    continue;
                }
                let idx = self.index(Point2i::new(x, y));
                let pix = &mut self.pixels[idx];
                pix.contrib_sum += radiance * (weight * fw);
                pix.alpha_sum += alpha * (weight * fw);
                pix.filter_weight_sum += fw;
            }
        }
    }
}

struct FilmState {
    pixels: Vec<Pixel>,
    splitter: ImageSplitter,
    pass_index: u32,
}

pub struct Film<F: Filter> {
    pub full_resolution: Point2i,
    /// Raster-space pixel bounds actually rendered (a crop window).
    pub crop_window: Bounds2i,
    filter: F,
    scale: Float,
    tile_size: i32,
    adaptive_threshold: Float,
    state: Mutex<FilmState>,
}

impl<F: Filter> Film<F> {
    pub fn new(full_resolution: Point2i, screen_window: Bounds2f, filter: F, scale: Float) -> Self {
        let crop_window = Bounds2i::with_bounds(
            Point2i::new(
                (screen_window.min.x * full_resolution.x as Float) as i32,
                (screen_window.min.y * full_resolution.y as Float) as i32,
            ),
            Point2i::new(
                (screen_window.max.x * full_resolution.x as Float) as i32,
                (screen_window.max.y * full_resolution.y as Float) as i32,
            ),
        );
        Self::with_crop_window(full_resolution, crop_window, filter, scale)
    }

    pub fn with_crop_window(full_resolution: Point2i, crop_window: Bounds2i, filter: F, scale: Float) -> Self {
        let n_pixels = crop_window.area() as usize;
        let splitter = ImageSplitter::new(crop_window, 32, 1, TilesOrder::Linear);
        Self {
            full_resolution,
            crop_window,
            filter,
            scale,
            tile_size: 32,
            adaptive_threshold: 0.01,
            state: Mutex::new(FilmState {
                pixels: vec![Pixel::default(); n_pixels],
                splitter,
                pass_index: 0,
            }),
        }
    }

    pub fn set_tile_size_and_order(&mut self, tile_size: i32, workers: usize, order: TilesOrder) {
        self.tile_size = tile_size;
        self.state.lock().splitter = ImageSplitter::new(self.crop_window, tile_size, workers, order);
    }

    pub fn set_adaptive_threshold(&mut self, threshold: Float) {
        self.adaptive_threshold = threshold;
    }

    pub fn sample_bounds(&self) -> Bounds2i {
        self.crop_window
    }

    /// Resets per-pass AA accumulators; clears the resample mask only on
    /// the first pass of a render, otherwise leaves per-pixel sums in place
    /// so the estimator's denominator keeps growing (§4.3).
    pub fn begin_pass(&self, pass_index: u32, _total_passes: u32) {
        let mut state = self.state.lock();
        state.pass_index = pass_index;
        if pass_index == 0 {
            for p in &mut state.pixels {
                p.luminance_sum = 0.0;
                p.luminance_sq_sum = 0.0;
                p.pass_samples = 0;
                p.needs_more_samples = true;
            }
        }
        state.splitter.reset();
    }

    pub fn next_area_to_render(&self) -> Option<Bounds2i> {
        self.state.lock().splitter.next()
    }

    pub fn get_film_tile(&self, tile: Bounds2i) -> FilmTile {
        let radius = self.filter.radius();
        let grow = Point2i::new(radius.x.ceil() as i32, radius.y.ceil() as i32);
        let pixel_bounds = Bounds2i::with_bounds(
            Point2i::new(
                (tile.min.x - grow.x).max(self.crop_window.min.x),
                (tile.min.y - grow.y).max(self.crop_window.min.y),
            ),
            Point2i::new(
                (tile.max.x + grow.x).min(self.crop_window.max.x),
                (tile.max.y + grow.y).min(self.crop_window.max.y),
            ),
        );
        let n = pixel_bounds.area().max(0) as usize;
        FilmTile {
            pixel_bounds,
            filter_radius: radius,
            pixels: vec![
                FilmTilePixel { contrib_sum: Spectrum::uniform(0.0), alpha_sum: 0.0, filter_weight_sum: 0.0 };
                n
            ],
        }
    }

    pub fn add_sample_to_tile(
        &self,
        tile: &mut FilmTile,
        p_film: Point2f,
        radiance: Spectrum,
        alpha: Float,
        weight: Float,
    ) {
        tile.add_sample(p_film, radiance, alpha, weight, &self.filter);
    }

    /// Merges a completed tile into the shared pixel grid and feeds the
    /// squared-delta AA estimator with this tile's per-pixel radiance.
    /// Invoked by `finish_area`, the only contended lock on the hot path.
    pub fn merge_film_tile(&self, tile: FilmTile) {
        let mut state = self.state.lock();
        for ty in tile.pixel_bounds.min.y..tile.pixel_bounds.max.y {
            for tx in tile.pixel_bounds.min.x..tile.pixel_bounds.max.x {
                let p = Point2i::new(tx, ty);
                if !self.crop_window.inside_exclusive(p) {
                    continue;
                }
                let tile_pix = &tile.pixels[tile.index(p)];
                if tile_pix.filter_weight_sum == 0.0 {
                    continue;
                }
                let idx = self.pixel_index(p);
                let pix = &mut state.pixels[idx];
                pix.color_sum += tile_pix.contrib_sum;
                pix.alpha_sum += tile_pix.alpha_sum;
                pix.weight_sum += tile_pix.filter_weight_sum;

                let radiance = tile_pix.contrib_sum / tile_pix.filter_weight_sum;
                let luminance = radiance.average();
                pix.luminance_sum += luminance;
                pix.luminance_sq_sum += luminance * luminance;
                pix.pass_samples += 1;
            }
        }
    }

    pub fn finish_area(&self, tile: FilmTile) {
        self.merge_film_tile(tile);
    }

    fn pixel_index(&self, p: Point2i) -> usize {
        let w = self.crop_window.diagonal().x;
        ((p.y - self.crop_window.min.y) * w + (p.x - self.crop_window.min.x)) as usize
    }

    /// Recomputes the adaptive-sampling mask: a pixel needs more samples if
    /// its normalized squared-delta exceeds `adaptive_threshold`.
    pub fn adaptive_mask(&self) -> Vec<bool> {
        let mut state = self.state.lock();
        for pix in &mut state.pixels {
            if pix.pass_samples < 2 {
                pix.needs_more_samples = true;
                continue;
            }
            let n = pix.pass_samples as Float;
            let mean = pix.luminance_sum / n;
            let variance = (pix.luminance_sq_sum / n - mean * mean).max(0.0);
            let normalized = variance / (mean * mean + 1e-6);
            pix.needs_more_samples = normalized > self.adaptive_threshold;
        }
        state.pixels.iter().map(|p| p.needs_more_samples).collect()
    }

    pub fn needs_more_samples(&self, p: Point2i) -> bool {
        self.state.lock().pixels[self.pixel_index(p)].needs_more_samples
    }

    /// Resolves every pixel's accumulated `(color, weight)` into a single
    /// RGBA layer. Denoising, badge overlays, and file encoding live with
    /// external collaborators (§4.3).
    pub fn finalize(&self) -> ImageBuffer {
        let state = self.state.lock();
        let (w, h) = (self.crop_window.diagonal().x as usize, self.crop_window.diagonal().y as usize);
        let mut buf = ImageBuffer::new(w, h);
        for (i, pix) in state.pixels.iter().enumerate() {
            let (rgb, alpha) = if pix.weight_sum != 0.0 {
                (pix.color_sum / pix.weight_sum * self.scale, (pix.alpha_sum / pix.weight_sum).clamp(0.0, 1.0))
            } else {
                (Spectrum::uniform(0.0), 0.0)
            };
            let (rgb, _) = rgb.clamp_invalid();
            buf.set(i % w, i / w, Rgba::new(rgb.r, rgb.g, rgb.b, alpha));
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::BoxFilter;

    #[test]
    fn single_centered_sample_lands_in_one_pixel() {
        let film = Film::<BoxFilter>::with_crop_window(
            Point2i::new(4, 4),
            Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(4, 4)),
            BoxFilter::default(),
            1.0,
        );
        let tile = film.sample_bounds();
        let mut film_tile = film.get_film_tile(tile);
        film.add_sample_to_tile(&mut film_tile, Point2f::new(2.5, 2.5), Spectrum::uniform(1.0), 1.0, 1.0);
        film.merge_film_tile(film_tile);

        let img = film.finalize();
        assert_eq!(img.get(2, 2).r, 1.0);
        assert_eq!(img.get(2, 2).a, 1.0);
        assert_eq!(img.get(0, 0).r, 0.0);
        assert_eq!(img.get(0, 0).a, 0.0);
    }

    #[test]
    fn background_miss_samples_leave_alpha_at_zero() {
        let film = Film::<BoxFilter>::with_crop_window(
            Point2i::new(2, 2),
            Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(2, 2)),
            BoxFilter::default(),
            1.0,
        );
        let tile = film.sample_bounds();
        let mut film_tile = film.get_film_tile(tile);
        film.add_sample_to_tile(&mut film_tile, Point2f::new(0.5, 0.5), Spectrum::uniform(0.0), 0.0, 1.0);
        film.merge_film_tile(film_tile);

        let img = film.finalize();
        assert_eq!(img.get(0, 0).a, 0.0);
    }

    #[test]
    fn adaptive_mask_quiets_down_on_constant_radiance() {
        let film = Film::<BoxFilter>::with_crop_window(
            Point2i::new(2, 2),
            Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(2, 2)),
            BoxFilter::default(),
            1.0,
        );
        film.begin_pass(0, 4);
        let tile = film.sample_bounds();
        for _ in 0..8 {
            let mut film_tile = film.get_film_tile(tile);
            film.add_sample_to_tile(&mut film_tile, Point2f::new(0.5, 0.5), Spectrum::uniform(1.0), 1.0, 1.0);
            film.merge_film_tile(film_tile);
        }
        let mask = film.adaptive_mask();
        assert!(!mask[0], "constant radiance should converge below threshold");
    }
}
