//! Tile queue over the image (§4.2): hands work out to render-thread
//! workers, one tile at a time, never revisiting a tile within a pass.

use std::collections::VecDeque;

use rand::seq::SliceRandom;

use crate::{Bounds2i, Point2i};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TilesOrder {
    Linear,
    Random,
    CentreRandom,
}

/// Splits `region` into `tile_size`-pixel tiles, subdividing the last
/// `2 * workers` of them (halved, then quartered for the final `workers`)
/// so stragglers at the end of a pass are finer-grained, then hands them out
/// through `next()`. Never revisits a tile within the same pass; call
/// [`ImageSplitter::reset`] to start a new one.
pub struct ImageSplitter {
    region: Bounds2i,
    tile_size: i32,
    workers: usize,
    order: TilesOrder,
    queue: VecDeque<Bounds2i>,
}

impl ImageSplitter {
    pub fn new(region: Bounds2i, tile_size: i32, workers: usize, order: TilesOrder) -> Self {
        let mut splitter = Self {
            region,
            tile_size,
            workers: workers.max(1),
            order,
            queue: VecDeque::new(),
        };
        splitter.reset();
        splitter
    }

    /// Rebuilds the tile queue for a fresh pass (`Film::begin_pass` calls
    /// this so every pass re-covers the full region).
    pub fn reset(&mut self) {
        let mut tiles: Vec<Bounds2i> = self.region.iter_tiles(self.tile_size).collect();

        match self.order {
            TilesOrder::Linear => {}
            TilesOrder::Random => {
                tiles.shuffle(&mut rand::thread_rng());
            }
            TilesOrder::CentreRandom => {
                tiles.shuffle(&mut rand::thread_rng());
                let centre = self.region.centre();
                tiles.sort_by(|a, b| {
                    dist2_to_centre(*a, centre)
                        .partial_cmp(&dist2_to_centre(*b, centre))
                        .unwrap()
                });
            }
        }

        let tail_count = (2 * self.workers).min(tiles.len());
        let tail = tiles.split_off(tiles.len() - tail_count);
        let halve_count = tail_count - (self.workers.min(tail_count));

        let mut subdivided = Vec::new();
        for (i, tile) in tail.into_iter().enumerate() {
            let sub_size = if i < halve_count {
                (self.tile_size / 2).max(1)
            } else {
                (self.tile_size / 4).max(1)
            };
            subdivided.extend(tile.iter_tiles(sub_size));
        }

        tiles.extend(subdivided);
        self.queue = tiles.into();
    }

    /// Thread-safe one-at-a-time pop; callers typically wrap an
    /// `ImageSplitter` in a `Mutex` (as [`crate::film::Film`] does) and call
    /// this while holding the lock just long enough to pop.
    pub fn next(&mut self) -> Option<Bounds2i> {
        self.queue.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

fn dist2_to_centre(tile: Bounds2i, centre: Point2i) -> i64 {
    let c = tile.centre();
    let dx = (c.x - centre.x) as i64;
    let dy = (c.y - centre.y) as i64;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_covers_every_pixel_exactly_once() {
        let region = Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(40, 20));
        let mut splitter = ImageSplitter::new(region, 16, 1, TilesOrder::Linear);
        let mut seen = vec![false; 40 * 20];
        while let Some(tile) = splitter.next() {
            for p in tile.iter_points() {
                let idx = (p.y * 40 + p.x) as usize;
                assert!(!seen[idx], "pixel {:?} covered twice", p);
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn tail_tiles_are_subdivided() {
        let region = Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(64, 64));
        let mut splitter = ImageSplitter::new(region, 32, 1, TilesOrder::Linear);
        // 4 base tiles, 2*workers=2 of them subdivided (1 halved, 1 quartered).
        let mut count = 0;
        while splitter.next().is_some() {
            count += 1;
        }
        assert!(count > 4, "expected tail subdivision to add tiles, got {}", count);
    }

    #[test]
    fn reset_allows_a_second_full_pass() {
        let region = Bounds2i::with_bounds(Point2i::new(0, 0), Point2i::new(32, 32));
        let mut splitter = ImageSplitter::new(region, 16, 1, TilesOrder::Random);
        let first_pass = std::iter::from_fn(|| splitter.next()).count();
        splitter.reset();
        let second_pass = std::iter::from_fn(|| splitter.next()).count();
        assert_eq!(first_pass, second_pass);
    }
}
