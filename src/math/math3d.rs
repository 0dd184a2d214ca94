/// 3D/4D math used by the formula corpus.
///
/// Matrix and quaternion operations with f64 precision. Rotations act on the
/// x, y, z components of a `Vec4` and leave `w` untouched.

use serde::{Deserialize, Serialize};

use crate::engine::types::{Matrix3, Vec4};

// ─── Matrix operations ───────────────────────────────────────

/// Rotate a vector: result.xyz = M * v.xyz, result.w = v.w
#[inline]
pub fn mat3_rotate(m: &Matrix3, v: &Vec4) -> Vec4 {
    Vec4 {
        x: m.m[0][0] * v.x + m.m[0][1] * v.y + m.m[0][2] * v.z,
        y: m.m[1][0] * v.x + m.m[1][1] * v.y + m.m[1][2] * v.z,
        z: m.m[2][0] * v.x + m.m[2][1] * v.y + m.m[2][2] * v.z,
        w: v.w,
    }
}

/// Multiply two 3×3 matrices: result = A * B
pub fn mat3_mul(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut result = Matrix3 { m: [[0.0; 3]; 3] };
    for i in 0..3 {
        for j in 0..3 {
            result.m[i][j] = a.m[i][0] * b.m[0][j]
                           + a.m[i][1] * b.m[1][j]
                           + a.m[i][2] * b.m[2][j];
        }
    }
    result
}

pub fn mat3_identity() -> Matrix3 {
    Matrix3::default()
}

/// Build rotation matrix from Euler angles (in radians), X then Y then Z.
pub fn mat3_from_euler(rx: f64, ry: f64, rz: f64) -> Matrix3 {
    let (sx, cx) = rx.sin_cos();
    let (sy, cy) = ry.sin_cos();
    let (sz, cz) = rz.sin_cos();

    let mx = Matrix3 { m: [[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]] };
    let my = Matrix3 { m: [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]] };
    let mz = Matrix3 { m: [[cz, -sz, 0.0], [sz, cz, 0.0], [0.0, 0.0, 1.0]] };

    mat3_mul(&mz, &mat3_mul(&my, &mx))
}

// ─── Rotation parameter ──────────────────────────────────────

/// Rotation parameter stored as Euler angles in degrees.
///
/// The matrix is built once when the parameter record is constructed or
/// deserialized, so formulas only pay for the multiply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Rotation {
    angles_deg: [f64; 3],
    matrix: Matrix3,
}

impl Rotation {
    pub fn from_degrees(x: f64, y: f64, z: f64) -> Self {
        let matrix = mat3_from_euler(x.to_radians(), y.to_radians(), z.to_radians());
        Self { angles_deg: [x, y, z], matrix }
    }

    pub fn angles_deg(&self) -> [f64; 3] {
        self.angles_deg
    }

    #[inline]
    pub fn rotate(&self, v: &Vec4) -> Vec4 {
        mat3_rotate(&self.matrix, v)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self { angles_deg: [0.0; 3], matrix: mat3_identity() }
    }
}

impl From<[f64; 3]> for Rotation {
    fn from(a: [f64; 3]) -> Self {
        Rotation::from_degrees(a[0], a[1], a[2])
    }
}

impl From<Rotation> for [f64; 3] {
    fn from(r: Rotation) -> Self {
        r.angles_deg
    }
}

// ─── Quaternion operations ───────────────────────────────────

/// Quaternion as [w, x, y, z]
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq)]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Map a position onto a quaternion: the real part is `v.x`, the
    /// imaginary parts are `v.y`, `v.z`, `v.w`.
    #[inline]
    pub fn from_vec4(v: &Vec4) -> Self {
        Quaternion { w: v.x, x: v.y, y: v.z, z: v.w }
    }

    #[inline]
    pub fn to_vec4(&self) -> Vec4 {
        Vec4::new(self.w, self.x, self.y, self.z)
    }

    #[inline]
    pub fn length(&self) -> f64 {
        (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Quaternion multiplication
    pub fn mul(&self, other: &Quaternion) -> Quaternion {
        Quaternion {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }
}
