//! Color ramp (§4.4): an ordered `(color, position)` sequence with
//! configurable interpolation and color-space hue handling, used to drive
//! gradient-mapped shading inputs.

use crate::spectrum::Rgb;
use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampMode {
    Rgb,
    Hsv,
    Hsl,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RampInterpolation {
    Constant,
    Linear,
}

/// Which way around the hue circle to interpolate when the two colors'
/// hues differ, mirroring the teacher's `color_ramp.cc` hue modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HueInterpolation {
    Near,
    Far,
    Clockwise,
    CounterClockwise,
}

#[derive(Clone, Copy, Debug)]
struct RampItem {
    color: Rgb,
    position: Float,
}

pub struct ColorRamp {
    items: Vec<RampItem>,
    mode: RampMode,
    interpolation: RampInterpolation,
    hue_interpolation: HueInterpolation,
}

impl ColorRamp {
    pub fn new(mode: RampMode, interpolation: RampInterpolation, hue_interpolation: HueInterpolation) -> Self {
        Self { items: Vec::new(), mode, interpolation, hue_interpolation }
    }

    /// Items may be added out of position order; `lookup` relies on them
    /// being sorted, so this keeps the backing vector sorted on insert.
    pub fn add_item(&mut self, color: Rgb, position: Float) {
        let idx = self.items.partition_point(|it| it.position < position);
        self.items.insert(idx, RampItem { color, position });
    }

    /// Samples the ramp at `p`, clamping to the extremes outside `[0, 1]`
    /// of the configured range and otherwise bracketing by binary search
    /// (§4.4).
    pub fn lookup(&self, p: Float) -> Rgb {
        if self.items.is_empty() {
            return Rgb::uniform(0.0);
        }
        if self.items.len() == 1 || p <= self.items[0].position {
            return self.items[0].color;
        }
        let last = self.items.len() - 1;
        if p >= self.items[last].position {
            return self.items[last].color;
        }

        let upper = self.items.partition_point(|it| it.position <= p).min(last);
        let lower = upper - 1;
        let (a, b) = (self.items[lower], self.items[upper]);

        match self.interpolation {
            RampInterpolation::Constant => b.color,
            RampInterpolation::Linear => {
                let span = b.position - a.position;
                let t = if span.abs() < 1e-8 { 0.0 } else { (p - a.position) / span };
                self.lerp_color(a.color, b.color, t)
            }
        }
    }

    fn lerp_color(&self, a: Rgb, b: Rgb, t: Float) -> Rgb {
        match self.mode {
            RampMode::Rgb => Rgb::rgb(
                crate::lerp(t, a.r, b.r),
                crate::lerp(t, a.g, b.g),
                crate::lerp(t, a.b, b.b),
            ),
            RampMode::Hsv => {
                let (h0, s0, v0) = a.to_hsv();
                let (h1, s1, v1) = b.to_hsv();
                let h = self.lerp_hue(h0, h1, t);
                Rgb::from_hsv(h, crate::lerp(t, s0, s1), crate::lerp(t, v0, v1))
            }
            RampMode::Hsl => {
                let (h0, s0, l0) = a.to_hsl();
                let (h1, s1, l1) = b.to_hsl();
                let h = self.lerp_hue(h0, h1, t);
                Rgb::from_hsl(h, crate::lerp(t, s0, s1), crate::lerp(t, l0, l1))
            }
        }
    }

    /// Hues live on a `[0, 6)` circle (§spectrum hue convention); this picks
    /// the short/long, clockwise/counter-clockwise arc per the configured
    /// mode before interpolating linearly along it.
    fn lerp_hue(&self, h0: Float, h1: Float, t: Float) -> Float {
        let mut delta = h1 - h0;
        match self.hue_interpolation {
            HueInterpolation::Near => {
                if delta > 3.0 {
                    delta -= 6.0;
                } else if delta < -3.0 {
                    delta += 6.0;
                }
            }
            HueInterpolation::Far => {
                if delta.abs() < 3.0 {
                    delta -= if delta >= 0.0 { 6.0 } else { -6.0 };
                }
            }
            HueInterpolation::Clockwise => {
                if delta < 0.0 {
                    delta += 6.0;
                }
            }
            HueInterpolation::CounterClockwise => {
                if delta > 0.0 {
                    delta -= 6.0;
                }
            }
        }
        (h0 + delta * t).rem_euclid(6.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_clamps_outside_extremes() {
        let mut ramp = ColorRamp::new(RampMode::Rgb, RampInterpolation::Linear, HueInterpolation::Near);
        ramp.add_item(Rgb::uniform(0.0), 0.0);
        ramp.add_item(Rgb::uniform(1.0), 1.0);
        assert_eq!(ramp.lookup(-1.0), Rgb::uniform(0.0));
        assert_eq!(ramp.lookup(2.0), Rgb::uniform(1.0));
    }

    #[test]
    fn linear_interpolates_midpoint() {
        let mut ramp = ColorRamp::new(RampMode::Rgb, RampInterpolation::Linear, HueInterpolation::Near);
        ramp.add_item(Rgb::rgb(0.0, 0.0, 0.0), 0.0);
        ramp.add_item(Rgb::rgb(1.0, 1.0, 1.0), 1.0);
        let mid = ramp.lookup(0.5);
        assert!((mid.r - 0.5).abs() < 1e-5);
    }

    #[test]
    fn constant_returns_upper_neighbor() {
        let mut ramp = ColorRamp::new(RampMode::Rgb, RampInterpolation::Constant, HueInterpolation::Near);
        ramp.add_item(Rgb::rgb(0.0, 0.0, 0.0), 0.0);
        ramp.add_item(Rgb::rgb(1.0, 1.0, 1.0), 1.0);
        assert_eq!(ramp.lookup(0.3), Rgb::rgb(1.0, 1.0, 1.0));
    }

    #[test]
    fn near_hue_takes_short_arc() {
        let mut ramp = ColorRamp::new(RampMode::Hsv, RampInterpolation::Linear, HueInterpolation::Near);
        // hue 0.2 and hue 5.8 are close going the "wrap" way (short arc)
        ramp.add_item(Rgb::from_hsv(0.2, 1.0, 1.0), 0.0);
        ramp.add_item(Rgb::from_hsv(5.8, 1.0, 1.0), 1.0);
        let mid = ramp.lookup(0.5);
        let (h, _, _) = mid.to_hsv();
        assert!(h < 0.3 || h > 5.7, "expected short-arc hue near 0/6, got {}", h);
    }

    #[test]
    fn far_hue_takes_long_arc() {
        let ramp = ColorRamp::new(RampMode::Hsv, RampInterpolation::Linear, HueInterpolation::Far);
        let h = ramp.lerp_hue(2.1, 3.1, 0.3);
        assert!((h - 0.6).abs() < 1e-4, "expected hue near 0.6, got {}", h);
    }

    #[test]
    fn clockwise_hue_forces_upper_above_lower() {
        let ramp = ColorRamp::new(RampMode::Hsv, RampInterpolation::Linear, HueInterpolation::Clockwise);
        let h = ramp.lerp_hue(5.5, 1.0, 0.3);
        assert!((h - 5.95).abs() < 1e-4, "expected hue near 5.95, got {}", h);
    }

    #[test]
    fn counter_clockwise_hue_forces_upper_below_lower() {
        let ramp = ColorRamp::new(RampMode::Hsv, RampInterpolation::Linear, HueInterpolation::CounterClockwise);
        let h = ramp.lerp_hue(5.5, 1.0, 0.3);
        assert!((h - 4.15).abs() < 1e-4, "expected hue near 4.15, got {}", h);
    }
}
