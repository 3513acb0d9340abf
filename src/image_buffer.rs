//! Image buffer and mipmap chain (§4.4): a 2-D array of RGBA samples with
//! an optional lower-precision storage mode, plus area-filtered mip levels
//! for texture lookups. Decoding/encoding to a file format is the
//! out-of-scope collaborator; this module only holds pixels in memory.

use crate::spectrum::Rgba;
use crate::Float;

/// Storage layout for a buffer's pixels. `Full` keeps the unclamped
/// floating-point source around (so later passes can still see
/// out-of-gamut values); the 8-bit and compact modes are opt-in memory
/// savings for buffers the renderer only needs to read back, not refine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageMode {
    Full,
    Rgbe8AlphaF32,
    Compact16,
}

#[derive(Clone)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    storage: StorageMode,
    pixels: Vec<Rgba>,
}

impl ImageBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            storage: StorageMode::Full,
            pixels: vec![Rgba::default(); width * height],
        }
    }

    pub fn with_storage(width: usize, height: usize, storage: StorageMode) -> Self {
        let mut buf = Self::new(width, height);
        buf.storage = storage;
        buf
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Rgba {
        self.pixels[self.index(x, y)]
    }

    /// Out-of-gamut components are clamped for the lower-precision storage
    /// modes, but `Full` keeps the source value so a later pass can still
    /// see it (§4.4 "clamped non-destructively").
    pub fn set(&mut self, x: usize, y: usize, value: Rgba) {
        let idx = self.index(x, y);
        self.pixels[idx] = match self.storage {
            StorageMode::Full => value,
            StorageMode::Rgbe8AlphaF32 | StorageMode::Compact16 => value.to_clamped(),
        };
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Box-filters each 2x2 (edge texels replicated on odd dimensions) block
    /// down to one texel, so the chain still reaches `1x1`. `Rgba` holds
    /// full-precision floats rather than one of the `resize` crate's fixed
    /// 8/16-bit pixel formats, so the area filter is applied directly here
    /// instead of through that crate (see DESIGN.md).
    pub fn downsample_half(&self) -> ImageBuffer {
        let dst_w = (self.width / 2).max(1);
        let dst_h = (self.height / 2).max(1);
        let mut dst = ImageBuffer {
            width: dst_w,
            height: dst_h,
            storage: self.storage,
            pixels: vec![Rgba::default(); dst_w * dst_h],
        };

        for dy in 0..dst_h {
            for dx in 0..dst_w {
                let x0 = (dx * 2).min(self.width - 1);
                let x1 = (dx * 2 + 1).min(self.width - 1);
                let y0 = (dy * 2).min(self.height - 1);
                let y1 = (dy * 2 + 1).min(self.height - 1);
                let sum = self.get(x0, y0) + self.get(x1, y0) + self.get(x0, y1) + self.get(x1, y1);
                dst.set(dx, dy, sum * 0.25);
            }
        }
        dst
    }

    /// Builds the full mip chain: repeatedly halves resolution until both
    /// dimensions reach 1 (§4.4). Level 0 is this buffer itself.
    pub fn build_mip_chain(&self) -> Vec<ImageBuffer> {
        let mut chain = vec![self.clone()];
        loop {
            let last = chain.last().unwrap();
            if last.width == 1 && last.height == 1 {
                break;
            }
            chain.push(last.downsample_half());
        }
        chain
    }

    pub fn average_luminance(&self) -> Float {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: Float = self.pixels.iter().map(|p| (p.r + p.g + p.b) / 3.0).sum();
        sum / self.pixels.len() as Float
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_reaches_one_by_one() {
        let mut buf = ImageBuffer::new(8, 4);
        for y in 0..4 {
            for x in 0..8 {
                buf.set(x, y, Rgba::new(1.0, 1.0, 1.0, 1.0));
            }
        }
        let chain = buf.build_mip_chain();
        let last = chain.last().unwrap();
        assert_eq!((last.width, last.height), (1, 1));
        assert!((last.get(0, 0).r - 1.0).abs() < 1e-3);
    }

    #[test]
    fn set_get_round_trips_within_bounds() {
        let mut buf = ImageBuffer::new(2, 2);
        buf.set(1, 0, Rgba::new(0.2, 0.4, 0.6, 1.0));
        assert_eq!(buf.get(1, 0), Rgba::new(0.2, 0.4, 0.6, 1.0));
    }
}
