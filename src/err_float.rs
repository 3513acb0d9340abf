//! Running error-bound floats for robust ray-shape intersection (conservative
//! rounding bounds on quadratic root-finding, used by `shapes::sphere`).

use std::ops::{Add, Div, Mul, Sub};

use crate::Float;

const MACHINE_EPSILON: Float = Float::EPSILON * 0.5;

/// `gamma(n)` bounds the relative error after `n` floating point operations.
#[inline]
pub fn gamma(n: i32) -> Float {
    (n as Float * MACHINE_EPSILON) / (1.0 - n as Float * MACHINE_EPSILON)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EFloat {
    v: Float,
    low: Float,
    high: Float,
}

impl EFloat {
    pub fn new(v: Float) -> Self {
        Self { v, low: v, high: v }
    }

    pub fn with_err(v: Float, err: Float) -> Self {
        if err == 0.0 {
            Self { v, low: v, high: v }
        } else {
            Self {
                v,
                low: next_float_down(v - err),
                high: next_float_up(v + err),
            }
        }
    }

    pub fn lower_bound(&self) -> Float {
        self.low
    }

    pub fn upper_bound(&self) -> Float {
        self.high
    }
}

impl From<EFloat> for Float {
    fn from(e: EFloat) -> Float {
        e.v
    }
}

fn next_float_up(v: Float) -> Float {
    if v.is_infinite() && v > 0.0 {
        return v;
    }
    let v = if v == -0.0 { 0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v >= 0.0 { bits + 1 } else { bits - 1 };
    Float::from_bits(bits)
}

fn next_float_down(v: Float) -> Float {
    if v.is_infinite() && v < 0.0 {
        return v;
    }
    let v = if v == 0.0 { -0.0 } else { v };
    let bits = v.to_bits();
    let bits = if v <= 0.0 { bits + 1 } else { bits - 1 };
    Float::from_bits(bits)
}

impl Add for EFloat {
    type Output = EFloat;
    fn add(self, rhs: EFloat) -> EFloat {
        EFloat {
            v: self.v + rhs.v,
            low: next_float_down(self.low + rhs.low),
            high: next_float_up(self.high + rhs.high),
        }
    }
}

impl Sub for EFloat {
    type Output = EFloat;
    fn sub(self, rhs: EFloat) -> EFloat {
        EFloat {
            v: self.v - rhs.v,
            low: next_float_down(self.low - rhs.high),
            high: next_float_up(self.high - rhs.low),
        }
    }
}

impl Mul for EFloat {
    type Output = EFloat;
    fn mul(self, rhs: EFloat) -> EFloat {
        let prods = [
            self.low * rhs.low,
            self.high * rhs.low,
            self.low * rhs.high,
            self.high * rhs.high,
        ];
        EFloat {
            v: self.v * rhs.v,
            low: next_float_down(prods.iter().cloned().fold(Float::INFINITY, Float::min)),
            high: next_float_up(prods.iter().cloned().fold(Float::NEG_INFINITY, Float::max)),
        }
    }
}

impl Mul<EFloat> for Float {
    type Output = EFloat;
    fn mul(self, rhs: EFloat) -> EFloat {
        EFloat::new(self) * rhs
    }
}

impl Div for EFloat {
    type Output = EFloat;
    fn div(self, rhs: EFloat) -> EFloat {
        let quots = if rhs.low < 0.0 && rhs.high > 0.0 {
            [
                Float::NEG_INFINITY,
                Float::INFINITY,
                Float::NEG_INFINITY,
                Float::INFINITY,
            ]
        } else {
            [
                self.low / rhs.low,
                self.high / rhs.low,
                self.low / rhs.high,
                self.high / rhs.high,
            ]
        };
        EFloat {
            v: self.v / rhs.v,
            low: next_float_down(quots.iter().cloned().fold(Float::INFINITY, Float::min)),
            high: next_float_up(quots.iter().cloned().fold(Float::NEG_INFINITY, Float::max)),
        }
    }
}

impl PartialEq<EFloat> for Float {
    fn eq(&self, other: &EFloat) -> bool {
        *self == other.v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_contain_exact_value() {
        let a = EFloat::with_err(1.0, 1e-4);
        let b = EFloat::with_err(2.0, 1e-4);
        let sum = a + b;
        assert!(sum.lower_bound() <= 3.0 && sum.upper_bound() >= 3.0);
    }
}
