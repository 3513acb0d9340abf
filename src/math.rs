//! Small numeric helpers shared by shape intersection routines.

use crate::err_float::EFloat;
use crate::Float;

/// Solves `a*t^2 + b*t + c = 0` with error-tracking coefficients, as in the
/// sphere shape's robust intersection test. Returns `(t0, t1)` with `t0 <=
/// t1`, or `None` if there are no real roots.
pub fn quadratic(a: EFloat, b: EFloat, c: EFloat) -> Option<(EFloat, EFloat)> {
    let a_f: Float = a.into();
    let b_f: Float = b.into();
    let c_f: Float = c.into();

    let discrim = b_f as f64 * b_f as f64 - 4.0 * a_f as f64 * c_f as f64;
    if discrim < 0.0 {
        return None;
    }
    let root_discrim = discrim.sqrt() as Float;
    let float_root_discrim = EFloat::with_err(root_discrim, (Float::EPSILON as f64 * discrim.abs()) as Float);

    let q = if b_f < 0.0 {
        -0.5 * (b - float_root_discrim)
    } else {
        -0.5 * (b + float_root_discrim)
    };
    let mut t0 = q / a;
    let mut t1 = c / q;
    let t0_f: Float = t0.into();
    let t1_f: Float = t1.into();
    if t0_f > t1_f {
        std::mem::swap(&mut t0, &mut t1);
    }
    Some((t0, t1))
}
