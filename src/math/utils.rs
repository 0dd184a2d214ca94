/// Scalar helpers shared by the formula corpus.
///
/// These mirror the helpers the GPU kernel generator emits, so each one must
/// keep its exact numeric behavior.

/// Sign with zero mapped to zero (OpenCL `sign` semantics).
#[inline(always)]
pub fn sign(v: f64) -> f64 {
    if v > 0.0 { 1.0 } else if v < 0.0 { -1.0 } else { 0.0 }
}

/// Logistic step that approaches 1 when `a > b`.
#[inline(always)]
pub fn smooth_condition_a_greater_b(a: f64, b: f64, sharpness: f64) -> f64 {
    1.0 / (1.0 + (sharpness * (b - a)).exp())
}

/// Logistic step that approaches 1 when `a < b`.
#[inline(always)]
pub fn smooth_condition_a_less_b(a: f64, b: f64, sharpness: f64) -> f64 {
    1.0 / (1.0 + (sharpness * (a - b)).exp())
}

/// Per-axis box fold: `|v + l| - |v - l| - v`.
#[inline(always)]
pub fn box_fold(v: f64, limit: f64) -> f64 {
    (v + limit).abs() - (v - limit).abs() - v
}

/// Angular polyfold around one plane: folds the angle `atan2(b, a)` into a
/// wedge of `PI / order` and returns the rotated pair.
#[inline]
pub fn poly_fold(a: f64, b: f64, order: f64) -> (f64, f64) {
    let psi = std::f64::consts::PI / order;
    // `%` on f64 keeps the dividend's sign, like C fmod
    let psi = ((b.atan2(a) + psi) % (2.0 * psi) - psi).abs();
    let len = (a * a + b * b).sqrt();
    (psi.cos() * len, psi.sin() * len)
}
