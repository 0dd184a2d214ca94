/// Core value types shared by the engine and the formula corpus.
/// All types use #[repr(C)] so sample buffers can cross the WASM ↔ JS boundary.

use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// 4-component vector with f64 precision.
///
/// `w` is only touched by 4D formulas (quaternion family); every other formula
/// leaves it alone. Dot products and lengths include `w`.
#[repr(C, align(16))]
#[derive(Clone, Copy, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4 { x: 0.0, y: 0.0, z: 0.0, w: 0.0 };
    pub const ONE: Vec4 = Vec4 { x: 1.0, y: 1.0, z: 1.0, w: 1.0 };

    #[inline(always)]
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// 3D vector with `w = 0`.
    #[inline(always)]
    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, w: 0.0 }
    }

    #[inline(always)]
    pub fn dot(&self, other: &Vec4) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    #[inline(always)]
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Length ignoring `w`.
    #[inline(always)]
    pub fn length3(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline(always)]
    pub fn abs(&self) -> Vec4 {
        Vec4::new(self.x.abs(), self.y.abs(), self.z.abs(), self.w.abs())
    }

    /// Largest absolute component of x, y, z, w.
    #[inline(always)]
    pub fn max_abs(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs()).max(self.w.abs())
    }

    /// Sum of absolute components.
    #[inline(always)]
    pub fn sum_abs(&self) -> f64 {
        self.x.abs() + self.y.abs() + self.z.abs() + self.w.abs()
    }

    pub fn is_nan(&self) -> bool {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan() || self.w.is_nan()
    }
}

impl Add for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn add(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x + o.x, self.y + o.y, self.z + o.z, self.w + o.w)
    }
}

impl Sub for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn sub(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x - o.x, self.y - o.y, self.z - o.z, self.w - o.w)
    }
}

impl Mul<f64> for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn mul(self, s: f64) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl Mul<Vec4> for f64 {
    type Output = Vec4;
    #[inline(always)]
    fn mul(self, v: Vec4) -> Vec4 {
        v * self
    }
}

/// Component-wise product.
impl Mul for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn mul(self, o: Vec4) -> Vec4 {
        Vec4::new(self.x * o.x, self.y * o.y, self.z * o.z, self.w * o.w)
    }
}

impl Div<f64> for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn div(self, s: f64) -> Vec4 {
        Vec4::new(self.x / s, self.y / s, self.z / s, self.w / s)
    }
}

impl Neg for Vec4 {
    type Output = Vec4;
    #[inline(always)]
    fn neg(self) -> Vec4 {
        Vec4::new(-self.x, -self.y, -self.z, -self.w)
    }
}

impl AddAssign for Vec4 {
    #[inline(always)]
    fn add_assign(&mut self, o: Vec4) {
        *self = *self + o;
    }
}

impl SubAssign for Vec4 {
    #[inline(always)]
    fn sub_assign(&mut self, o: Vec4) {
        *self = *self - o;
    }
}

impl MulAssign<f64> for Vec4 {
    #[inline(always)]
    fn mul_assign(&mut self, s: f64) {
        *self = *self * s;
    }
}

/// 3×3 rotation matrix, row-major. Acts on x, y, z and passes `w` through.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix3 {
    pub m: [[f64; 3]; 3],
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }
}

/// One (distance, color) pair handed back to the ray marcher.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    pub distance: f64,
    pub color: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec4_dot_includes_w() {
        let v = Vec4::new(1.0, 2.0, 2.0, 4.0);
        assert_eq!(v.dot(&v), 25.0);
        assert_eq!(v.length(), 5.0);
        assert_eq!(v.length3(), 3.0);
    }

    #[test]
    fn test_vec4_norms() {
        let v = Vec4::new(-3.0, 1.0, 2.0, 0.0);
        assert_eq!(v.max_abs(), 3.0);
        assert_eq!(v.sum_abs(), 6.0);
        assert_eq!(v.abs(), Vec4::new(3.0, 1.0, 2.0, 0.0));
    }

    #[test]
    fn test_vec4_deserialize_defaults_w() {
        let v: Vec4 = serde_json::from_str(r#"{"x": 1.0, "y": 2.0, "z": 3.0}"#).unwrap();
        assert_eq!(v, Vec4::xyz(1.0, 2.0, 3.0));
    }
}
