//! Spectral samples (§3): RGB radiance/throughput and RGBA film output.
//!
//! Arithmetic is componentwise; clamping to `[0, 1]` happens only at output
//! time (see [`Rgba::to_clamped`]), never mid-integration.

use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};

use crate::Float;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgb {
    pub r: Float,
    pub g: Float,
    pub b: Float,
}

pub type Spectrum = Rgb;

impl Rgb {
    pub fn new(v: Float) -> Self {
        Self { r: v, g: v, b: v }
    }

    pub fn uniform(v: Float) -> Self {
        Self::new(v)
    }

    pub fn rgb(r: Float, g: Float, b: Float) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }

    pub fn has_nans(&self) -> bool {
        self.r.is_nan() || self.g.is_nan() || self.b.is_nan()
    }

    pub fn has_negative(&self) -> bool {
        self.r < 0.0 || self.g < 0.0 || self.b < 0.0
    }

    /// Clamps non-finite or negative components to zero, incrementing the
    /// caller's diagnostic counter (§7 Runtime recoverable errors).
    pub fn clamp_invalid(self) -> (Self, bool) {
        let fix = |c: Float| if c.is_finite() && c >= 0.0 { c } else { 0.0 };
        let clamped = Self::rgb(fix(self.r), fix(self.g), fix(self.b));
        let changed = clamped != self;
        (clamped, changed)
    }

    pub fn max_channel(&self) -> Float {
        self.r.max(self.g).max(self.b)
    }

    pub fn average(&self) -> Float {
        (self.r + self.g + self.b) / 3.0
    }

    pub fn sqrt(self) -> Self {
        Self::rgb(self.r.sqrt(), self.g.sqrt(), self.b.sqrt())
    }

    pub fn exp_neg(self) -> Self {
        Self::rgb((-self.r).exp(), (-self.g).exp(), (-self.b).exp())
    }

    /// Clamps to `[0, 1]` for output only; never used mid-integration.
    pub fn to_clamped(self) -> Self {
        let c = |v: Float| v.clamp(0.0, 1.0);
        Self::rgb(c(self.r), c(self.g), c(self.b))
    }

    pub fn to_rgba(self, alpha: Float) -> Rgba {
        Rgba {
            r: self.r,
            g: self.g,
            b: self.b,
            a: alpha,
        }
    }

    /// RGB -> HSV, hue in `[0, 6)` (YafaRay's internal 0-6 convention rather
    /// than 0-360, matching `src/color/color_ramp.cc`'s `lerpSegment` math).
    pub fn to_hsv(self) -> (Float, Float, Float) {
        let (r, g, b) = (self.r, self.g, self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let v = max;
        let delta = max - min;
        if delta.abs() < 1e-6 {
            return (0.0, 0.0, v);
        }
        let s = delta / max.max(1e-6);
        let mut h = if max == r {
            (g - b) / delta
        } else if max == g {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        if h < 0.0 {
            h += 6.0;
        }
        (h, s, v)
    }

    pub fn from_hsv(h: Float, s: Float, v: Float) -> Self {
        if s.abs() < 1e-6 {
            return Self::new(v);
        }
        let h = h.rem_euclid(6.0);
        let i = h.floor() as i32;
        let f = h - i as Float;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));
        match i {
            0 => Self::rgb(v, t, p),
            1 => Self::rgb(q, v, p),
            2 => Self::rgb(p, v, t),
            3 => Self::rgb(p, q, v),
            4 => Self::rgb(t, p, v),
            _ => Self::rgb(v, p, q),
        }
    }

    pub fn to_hsl(self) -> (Float, Float, Float) {
        let (r, g, b) = (self.r, self.g, self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let delta = max - min;
        if delta.abs() < 1e-6 {
            return (0.0, 0.0, l);
        }
        let s = if l < 0.5 {
            delta / (max + min)
        } else {
            delta / (2.0 - max - min)
        };
        let mut h = if max == r {
            (g - b) / delta
        } else if max == g {
            2.0 + (b - r) / delta
        } else {
            4.0 + (r - g) / delta
        };
        if h < 0.0 {
            h += 6.0;
        }
        (h, s, l)
    }

    pub fn from_hsl(h: Float, s: Float, l: Float) -> Self {
        if s.abs() < 1e-6 {
            return Self::new(l);
        }
        let q = if l < 0.5 {
            l * (1.0 + s)
        } else {
            l + s - l * s
        };
        let p = 2.0 * l - q;
        let hk = h / 6.0;
        let hue_to_rgb = |p: Float, q: Float, mut t: Float| {
            if t < 0.0 {
                t += 1.0;
            }
            if t > 1.0 {
                t -= 1.0;
            }
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Self::rgb(
            hue_to_rgb(p, q, hk + 1.0 / 3.0),
            hue_to_rgb(p, q, hk),
            hue_to_rgb(p, q, hk - 1.0 / 3.0),
        )
    }
}

impl Add for Rgb {
    type Output = Rgb;
    fn add(self, rhs: Rgb) -> Rgb {
        Rgb::rgb(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}
impl AddAssign for Rgb {
    fn add_assign(&mut self, rhs: Rgb) {
        *self = *self + rhs;
    }
}
impl Sub for Rgb {
    type Output = Rgb;
    fn sub(self, rhs: Rgb) -> Rgb {
        Rgb::rgb(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b)
    }
}
impl Mul for Rgb {
    type Output = Rgb;
    fn mul(self, rhs: Rgb) -> Rgb {
        Rgb::rgb(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}
impl Mul<Float> for Rgb {
    type Output = Rgb;
    fn mul(self, s: Float) -> Rgb {
        Rgb::rgb(self.r * s, self.g * s, self.b * s)
    }
}
impl Mul<Rgb> for Float {
    type Output = Rgb;
    fn mul(self, c: Rgb) -> Rgb {
        c * self
    }
}
impl MulAssign<Float> for Rgb {
    fn mul_assign(&mut self, s: Float) {
        *self = *self * s;
    }
}
impl Div<Float> for Rgb {
    type Output = Rgb;
    fn div(self, s: Float) -> Rgb {
        Rgb::rgb(self.r / s, self.g / s, self.b / s)
    }
}
impl DivAssign<Float> for Rgb {
    fn div_assign(&mut self, s: Float) {
        *self = *self / s;
    }
}

/// Film-output quadruple: straight (non-premultiplied) alpha in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rgba {
    pub r: Float,
    pub g: Float,
    pub b: Float,
    pub a: Float,
}

impl Rgba {
    pub fn new(r: Float, g: Float, b: Float, a: Float) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::rgb(self.r, self.g, self.b)
    }

    pub fn to_clamped(self) -> Self {
        let c = |v: Float| v.clamp(0.0, 1.0);
        Self::new(c(self.r), c(self.g), c(self.b), c(self.a))
    }
}

impl Add for Rgba {
    type Output = Rgba;
    fn add(self, rhs: Rgba) -> Rgba {
        Rgba::new(
            self.r + rhs.r,
            self.g + rhs.g,
            self.b + rhs.b,
            self.a + rhs.a,
        )
    }
}
impl AddAssign for Rgba {
    fn add_assign(&mut self, rhs: Rgba) {
        *self = *self + rhs;
    }
}
impl Mul<Float> for Rgba {
    type Output = Rgba;
    fn mul(self, s: Float) -> Rgba {
        Rgba::new(self.r * s, self.g * s, self.b * s, self.a * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn hsv_round_trip() {
        let c = Rgb::rgb(0.8, 0.3, 0.1);
        let (h, s, v) = c.to_hsv();
        let back = Rgb::from_hsv(h, s, v);
        assert_abs_diff_eq!(back.r, c.r, epsilon = 1e-5);
        assert_abs_diff_eq!(back.g, c.g, epsilon = 1e-5);
        assert_abs_diff_eq!(back.b, c.b, epsilon = 1e-5);
    }

    #[test]
    fn hsl_round_trip() {
        let c = Rgb::rgb(0.1, 0.6, 0.9);
        let (h, s, l) = c.to_hsl();
        let back = Rgb::from_hsl(h, s, l);
        assert_abs_diff_eq!(back.r, c.r, epsilon = 1e-5);
        assert_abs_diff_eq!(back.g, c.g, epsilon = 1e-5);
        assert_abs_diff_eq!(back.b, c.b, epsilon = 1e-5);
    }

    #[test]
    fn clamp_invalid_fixes_nan_and_negative() {
        let bad = Rgb::rgb(Float::NAN, -1.0, 0.5);
        let (fixed, changed) = bad.clamp_invalid();
        assert!(changed);
        assert_eq!(fixed, Rgb::rgb(0.0, 0.0, 0.5));
    }
}
